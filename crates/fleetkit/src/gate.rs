//! Confirmation gate between selection and mutation.
//!
//! A small state machine rather than an inline stdin read, so automated
//! tests can drive it with in-memory buffers. The protocol is a strict
//! single-line `y`/`n`: anything else aborts the action. The decision is
//! terminal for the lifetime of one action request.

use crate::error::{Error, Result};
use crate::types::PowerAction;
use std::io::{BufRead, Write};

/// Gate states. `Idle` is the initial state; `Approved`/`Rejected` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No confirmation attempted yet
    Idle,
    /// Prompt presented, waiting on an answer
    AwaitingConfirmation,
    /// Action may proceed
    Approved,
    /// Operator declined; the action is abandoned without error
    Rejected,
}

/// Outcome of a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the mutating action
    Approved,
    /// Take no action; not an error
    Rejected,
}

/// The approval checkpoint for a single action request.
#[derive(Debug)]
pub struct ActionGate {
    state: GateState,
    force: bool,
}

impl ActionGate {
    /// Create a gate. With `force` set, confirmation resolves to
    /// [`Decision::Approved`] without ever touching the input source.
    pub fn new(force: bool) -> Self {
        Self {
            state: GateState::Idle,
            force,
        }
    }

    /// Current state, for callers that want to inspect the machine.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Resolve the gate: prompt on `output`, read one line from `input`.
    ///
    /// `y` approves, `n` rejects, anything else fails with
    /// [`Error::AmbiguousAnswer`] and leaves the gate awaiting
    /// confirmation; this implementation treats that as a hard abort of
    /// the action rather than re-prompting. Once decided, subsequent
    /// calls return the same decision without reading again.
    pub fn confirm<R: BufRead, W: Write>(
        &mut self,
        action: PowerAction,
        mut input: R,
        mut output: W,
    ) -> Result<Decision> {
        match self.state {
            GateState::Approved => return Ok(Decision::Approved),
            GateState::Rejected => return Ok(Decision::Rejected),
            GateState::Idle | GateState::AwaitingConfirmation => {}
        }

        if self.force {
            self.state = GateState::Approved;
            return Ok(Decision::Approved);
        }

        self.state = GateState::AwaitingConfirmation;
        writeln!(
            output,
            "Are you sure you would like to {} the above instances (y/n)?",
            action.verb()
        )?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        let answer = answer.trim();

        match answer {
            "y" => {
                self.state = GateState::Approved;
                Ok(Decision::Approved)
            }
            "n" => {
                self.state = GateState::Rejected;
                Ok(Decision::Rejected)
            }
            other => Err(Error::AmbiguousAnswer {
                answer: other.to_string(),
            }),
        }
    }
}

//! Error types for EC2 selection and convergence operations.
//!
//! Errors are categorized to enable smart retry logic and appropriate
//! user feedback. Remote failures are classified from the aws CLI's
//! stderr so transient conditions (throttling, network) can be retried
//! while hard failures surface immediately.

use thiserror::Error;

/// Categories of errors for retry logic.
///
/// Error categories help determine whether an operation should be retried
/// and what kind of user feedback is appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// API throttling / rate limiting (transient, retryable)
    Throttled,
    /// Network-related errors (transient, retryable)
    Network,
    /// Credentials missing, expired, or not authorized
    Auth,
    /// The request itself was rejected (bad filter name, bad instance id)
    InvalidRequest,
    /// Locally detected bad filter spec
    MalformedSpec,
    /// Confirmation answer was not understood
    Confirmation,
    /// Convergence polling exhausted its bound
    Timeout,
    /// aws CLI not found or not configured
    CliNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled | Self::Network)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Throttled => "API rate limit exceeded",
            Self::Network => "Network connectivity issue",
            Self::Auth => "Credential or permission problem",
            Self::InvalidRequest => "Request rejected by the API",
            Self::MalformedSpec => "Malformed filter spec",
            Self::Confirmation => "Confirmation not understood",
            Self::Timeout => "Convergence deadline exceeded",
            Self::CliNotFound => "aws CLI not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Throttled => "Wait a moment and try again, or lower the poll rate",
            Self::Network => "Check your internet connection and try again",
            Self::Auth => "Check your AWS credentials, profile, and IAM permissions",
            Self::InvalidRequest => "Verify the filter keys and instance ids",
            Self::MalformedSpec => "Specs take the form key:value1,value2",
            Self::Timeout => "Raise --timeout or inspect the instances in the console",
            Self::CliNotFound => "Install the AWS CLI from https://aws.amazon.com/cli/",
            Self::Confirmation => "Answer y or n",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during selection and convergence operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A `--tag`/`--filter` spec could not be parsed
    #[error("malformed spec '{spec}': {reason}")]
    MalformedSpec {
        /// The raw spec as given on the command line
        spec: String,
        /// What was wrong with it
        reason: String,
    },

    /// The API throttled the request
    #[error("throttled: {message}")]
    Throttled {
        /// Detailed message from the throttled call
        message: String,
    },

    /// Network-related error (connection, timeout, DNS, etc.)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed network operation
        message: String,
    },

    /// Credentials missing, expired, or not authorized for the operation
    #[error("authentication failure: {message}")]
    AuthFailure {
        /// Details from the rejected call
        message: String,
    },

    /// The API rejected the request as invalid
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Details from the rejected call
        message: String,
    },

    /// aws CLI invocation failed in an unclassified way
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// The aws executable is not installed or not found in PATH
    #[error("aws CLI not found. Install it from https://aws.amazon.com/cli/")]
    AwsCliNotFound,

    /// Confirmation input was neither "y" nor "n"
    #[error("answer must be y or n (got '{answer}')")]
    AmbiguousAnswer {
        /// The answer that was actually read
        answer: String,
    },

    /// Instances did not reach the desired state within the poll bound
    #[error("timed out waiting for {} instance(s) to become {desired}: {}", .pending.len(), .pending.join(", "))]
    ConvergenceTimeout {
        /// The state that was being waited for
        desired: String,
        /// Ids still outside the desired state when the bound was hit
        pending: Vec<String>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedSpec { .. } => ErrorCategory::MalformedSpec,
            Error::Throttled { .. } => ErrorCategory::Throttled,
            Error::Network { .. } => ErrorCategory::Network,
            Error::AuthFailure { .. } => ErrorCategory::Auth,
            Error::InvalidRequest { .. } => ErrorCategory::InvalidRequest,
            Error::AwsCliNotFound => ErrorCategory::CliNotFound,
            Error::AmbiguousAnswer { .. } => ErrorCategory::Confirmation,
            Error::ConvergenceTimeout { .. } => ErrorCategory::Timeout,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from a failed aws CLI invocation.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_aws_stderr(stderr: &str, operation: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        // Throttling
        if stderr_lower.contains("throttling")
            || stderr_lower.contains("requestlimitexceeded")
            || stderr_lower.contains("rate exceeded")
            || stderr_lower.contains("too many requests")
        {
            return Error::Throttled {
                message: stderr.trim().to_string(),
            };
        }

        // Network errors
        if stderr_lower.contains("could not connect")
            || stderr_lower.contains("connection")
            || stderr_lower.contains("timed out")
            || stderr_lower.contains("could not resolve")
            || stderr_lower.contains("endpoint")
            || stderr_lower.contains("ssl")
            || stderr_lower.contains("certificate")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        // Credential / permission errors
        if stderr_lower.contains("unable to locate credentials")
            || stderr_lower.contains("expiredtoken")
            || stderr_lower.contains("invalidclienttokenid")
            || stderr_lower.contains("authfailure")
            || stderr_lower.contains("unauthorizedoperation")
            || stderr_lower.contains("access denied")
            || stderr_lower.contains("the config profile")
        {
            return Error::AuthFailure {
                message: stderr.trim().to_string(),
            };
        }

        // Invalid request
        if stderr_lower.contains("invalidparametervalue")
            || stderr_lower.contains("invalidinstanceid")
            || stderr_lower.contains("missingparameter")
            || stderr_lower.contains("invalidfilter")
            || stderr_lower.contains("validation error")
        {
            return Error::InvalidRequest {
                message: stderr.trim().to_string(),
            };
        }

        // Default to command failed
        Error::CommandFailed {
            message: format!("aws {operation} failed"),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for selection and convergence operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_retryable() {
        assert!(ErrorCategory::Throttled.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::MalformedSpec.is_retryable());
        assert!(!ErrorCategory::Timeout.is_retryable());
    }

    #[test]
    fn test_from_aws_stderr_throttled() {
        let err = Error::from_aws_stderr(
            "An error occurred (RequestLimitExceeded) when calling the DescribeInstances operation: Request limit exceeded.",
            "ec2 describe-instances",
        );
        assert_eq!(err.category(), ErrorCategory::Throttled);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_aws_stderr_network() {
        let err = Error::from_aws_stderr(
            "Could not connect to the endpoint URL: \"https://ec2.us-east-1.amazonaws.com/\"",
            "ec2 describe-instances",
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_aws_stderr_auth() {
        let err = Error::from_aws_stderr(
            "Unable to locate credentials. You can configure credentials by running \"aws configure\".",
            "ec2 describe-instances",
        );
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_aws_stderr_invalid_request() {
        let err = Error::from_aws_stderr(
            "An error occurred (InvalidInstanceID.Malformed) when calling the StartInstances operation",
            "ec2 start-instances",
        );
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);
    }

    #[test]
    fn test_from_aws_stderr_unclassified() {
        let err = Error::from_aws_stderr("something exploded", "ec2 stop-instances");
        assert_eq!(err.category(), ErrorCategory::Other);
        match err {
            Error::CommandFailed { message, stderr } => {
                assert!(message.contains("ec2 stop-instances"));
                assert_eq!(stderr, "something exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_convergence_timeout_display() {
        let err = Error::ConvergenceTimeout {
            desired: "stopped".to_string(),
            pending: vec!["i-1".to_string(), "i-2".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 instance(s)"));
        assert!(msg.contains("stopped"));
        assert!(msg.contains("i-1, i-2"));
    }
}

//! Filter clause accumulation and spec parsing.
//!
//! Operator-supplied `key:value1,value2` specs become filter clauses that
//! the describe call sends to the API. Clauses combine with AND semantics;
//! the values within one clause combine with OR semantics (standard cloud
//! filter behavior). Tag specs get the `tag:` key prefix the API expects;
//! attribute specs use the raw key.
//!
//! A [`FilterSet`] is a plain owned value built by the argument parser and
//! handed into the query pipeline. Nothing here is process-wide state.

use crate::error::{Error, Result};

/// A single key/value-list predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Filter name as sent to the API (`tag:Env`, `instance-type`, ...)
    pub key: String,
    /// Accepted values, in spec order; a match on any value satisfies the clause
    pub values: Vec<String>,
}

impl FilterClause {
    /// Create a clause from parts. Used by the query layer for the
    /// implicit state restriction; operator clauses come from the parsers.
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// Ordered accumulation of tag and attribute clauses.
///
/// Built by repeated `add_*` calls, one per occurrence of a repeatable
/// command-line option. Insertion order is preserved within each group so
/// the issued query is reproducible run to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    tags: Vec<FilterClause>,
    attributes: Vec<FilterClause>,
}

impl FilterSet {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag clause from a `key:value1,value2` spec.
    ///
    /// The key is prefixed with `tag:` for the API. Fails with
    /// [`Error::MalformedSpec`] on a missing separator or empty segment,
    /// leaving the set unchanged.
    pub fn add_tag(&mut self, spec: &str) -> Result<()> {
        let (key, rest) = split_spec(spec)?;
        let values = parse_values(spec, rest)?;
        self.tags.push(FilterClause::new(format!("tag:{key}"), values));
        Ok(())
    }

    /// Add an attribute clause from a `key:value1,value2` spec.
    ///
    /// Special case: a `tag:Key:value1,value2` spec behaves exactly like
    /// `add_tag("Key:value1,value2")`, so tag predicates can also be given
    /// through the attribute option.
    pub fn add_attribute(&mut self, spec: &str) -> Result<()> {
        let (key, rest) = split_spec(spec)?;
        if key == "tag" {
            return self.add_tag(rest);
        }
        let values = parse_values(spec, rest)?;
        self.attributes.push(FilterClause::new(key, values));
        Ok(())
    }

    /// The full clause list for query use: attributes first, then tags,
    /// each group in insertion order.
    pub fn clauses(&self) -> Vec<FilterClause> {
        let mut clauses = self.attributes.clone();
        clauses.extend(self.tags.iter().cloned());
        clauses
    }

    /// Whether no clauses have been added.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.attributes.is_empty()
    }

    /// Total number of clauses.
    pub fn len(&self) -> usize {
        self.tags.len() + self.attributes.len()
    }
}

fn split_spec(spec: &str) -> Result<(&str, &str)> {
    let Some((key, rest)) = spec.split_once(':') else {
        return Err(Error::MalformedSpec {
            spec: spec.to_string(),
            reason: "missing ':' separator".to_string(),
        });
    };
    if key.is_empty() {
        return Err(Error::MalformedSpec {
            spec: spec.to_string(),
            reason: "empty key".to_string(),
        });
    }
    Ok((key, rest))
}

fn parse_values(spec: &str, rest: &str) -> Result<Vec<String>> {
    let values: Vec<String> = rest.split(',').map(str::to_string).collect();
    if values.iter().any(String::is_empty) {
        return Err(Error::MalformedSpec {
            spec: spec.to_string(),
            reason: "empty value segment".to_string(),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tag() {
        let mut set = FilterSet::new();
        set.add_tag("Env:prod,staging").unwrap();
        assert_eq!(
            set.clauses(),
            vec![FilterClause::new(
                "tag:Env",
                vec!["prod".to_string(), "staging".to_string()]
            )]
        );
    }

    #[test]
    fn test_add_attribute() {
        let mut set = FilterSet::new();
        set.add_attribute("instance-type:t3.micro,t3.small").unwrap();
        assert_eq!(
            set.clauses(),
            vec![FilterClause::new(
                "instance-type",
                vec!["t3.micro".to_string(), "t3.small".to_string()]
            )]
        );
    }

    #[test]
    fn test_attribute_tag_special_case_matches_tag_parser() {
        let mut via_attribute = FilterSet::new();
        via_attribute.add_attribute("tag:Env:prod,staging").unwrap();

        let mut via_tag = FilterSet::new();
        via_tag.add_tag("Env:prod,staging").unwrap();

        assert_eq!(via_attribute, via_tag);
    }

    #[test]
    fn test_missing_separator_leaves_set_unchanged() {
        let mut set = FilterSet::new();
        set.add_tag("Env:prod").unwrap();

        let before = set.clone();
        let err = set.add_tag("noseparator").unwrap_err();
        assert!(matches!(err, Error::MalformedSpec { .. }));
        assert_eq!(set, before);

        let err = set.add_attribute("noseparator").unwrap_err();
        assert!(matches!(err, Error::MalformedSpec { .. }));
        assert_eq!(set, before);
    }

    #[test]
    fn test_empty_segments_rejected() {
        let mut set = FilterSet::new();
        assert!(set.add_tag(":prod").is_err());
        assert!(set.add_tag("Env:").is_err());
        assert!(set.add_tag("Env:prod,,staging").is_err());
        assert!(set.add_attribute("tag:Env:").is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_clause_ordering_attributes_before_tags() {
        let mut set = FilterSet::new();
        set.add_tag("Env:prod").unwrap();
        set.add_attribute("instance-type:t3.micro").unwrap();
        set.add_tag("Team:infra").unwrap();
        set.add_attribute("availability-zone:us-east-1a").unwrap();

        let clauses = set.clauses();
        let keys: Vec<&str> = clauses.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "instance-type",
                "availability-zone",
                "tag:Env",
                "tag:Team"
            ]
        );
        assert_eq!(set.len(), 4);
    }
}

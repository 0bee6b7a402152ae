//! Triple patterns for store queries.

use crate::term::{Iri, Statement, Term};
use regex::Regex;

/// Errors raised while building a subject pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid subject regex `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Constraint on the subject position.
#[derive(Debug, Clone, Default)]
pub enum SubjectPattern {
    #[default]
    Any,
    Exact(Iri),
    /// Subjects whose identifier string matches the regex.
    Matches(Regex),
}

impl SubjectPattern {
    /// Subjects whose identifier starts with `namespace`.
    ///
    /// Compiles to the anchored regex `^<namespace>` with the namespace
    /// escaped, so `.` or `#` in an IRI only ever match themselves.
    pub fn prefix(namespace: &str) -> Result<Self, PatternError> {
        Self::regex(&format!("^{}", regex::escape(namespace)))
    }

    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Regex::new(pattern)
            .map(SubjectPattern::Matches)
            .map_err(|e| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn matches(&self, subject: &Iri) -> bool {
        match self {
            SubjectPattern::Any => true,
            SubjectPattern::Exact(iri) => iri == subject,
            SubjectPattern::Matches(regex) => regex.is_match(subject.as_str()),
        }
    }
}

/// `(subject?, predicate?, object?)` with `None` as wildcard.
#[derive(Debug, Clone, Default)]
pub struct TriplePattern {
    pub subject: SubjectPattern,
    pub predicate: Option<Iri>,
    pub object: Option<Term>,
}

impl TriplePattern {
    /// Pattern matching every statement.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: SubjectPattern) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_predicate(mut self, predicate: impl Into<Iri>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn matches(&self, statement: &Statement) -> bool {
        self.subject.matches(&statement.subject)
            && self
                .predicate
                .as_ref()
                .is_none_or(|p| p == &statement.predicate)
            && self.object.as_ref().is_none_or(|o| o == &statement.object)
    }
}

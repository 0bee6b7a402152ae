//! RDF terms and statements.
//!
//! A statement is `(subject, predicate, object)` where subject and predicate
//! are always IRIs and the object is either an IRI or a literal.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Resource identifier. Equality is exact string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iri(String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier belongs to `namespace` (case-sensitive prefix).
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.0.starts_with(namespace)
    }

    pub fn to_ntriples(&self) -> String {
        format!("<{}>", self.0)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A lexical value with either a datatype or a language tag (never both).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "LiteralRecord", into = "LiteralRecord")]
pub struct Literal {
    lexical: String,
    datatype: Option<Iri>,
    language: Option<String>,
}

impl Literal {
    /// Untyped, untagged literal.
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<Iri>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// A literal with a new lexical form and the same datatype or language tag.
    pub fn with_lexical(&self, lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: self.datatype.clone(),
            language: self.language.clone(),
        }
    }

    pub fn to_ntriples(&self) -> String {
        let quoted = format!("\"{}\"", escape_lexical(&self.lexical));
        match (&self.datatype, &self.language) {
            (Some(datatype), _) => format!("{quoted}^^{}", datatype.to_ntriples()),
            (None, Some(language)) => format!("{quoted}@{language}"),
            (None, None) => quoted,
        }
    }
}

fn escape_lexical(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    for ch in lexical.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Serialize, Deserialize)]
struct LiteralRecord {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
}

impl TryFrom<LiteralRecord> for Literal {
    type Error = String;

    fn try_from(record: LiteralRecord) -> Result<Self, Self::Error> {
        match (record.datatype, record.lang) {
            (Some(_), Some(_)) => Err(format!(
                "literal {:?} carries both a datatype and a language tag",
                record.value
            )),
            (Some(datatype), None) => Ok(Literal::typed(record.value, datatype)),
            (None, Some(lang)) => Ok(Literal::lang(record.value, lang)),
            (None, None) => Ok(Literal::plain(record.value)),
        }
    }
}

impl From<Literal> for LiteralRecord {
    fn from(literal: Literal) -> Self {
        Self {
            value: literal.lexical,
            datatype: literal.datatype,
            lang: literal.language,
        }
    }
}

/// Object position of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
}

impl Term {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            Term::Iri(_) => None,
        }
    }

    pub fn to_ntriples(&self) -> String {
        match self {
            Term::Iri(iri) => iri.to_ntriples(),
            Term::Literal(literal) => literal.to_ntriples(),
        }
    }
}

impl From<Iri> for Term {
    fn from(value: Iri) -> Self {
        Term::Iri(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

/// One `(subject, predicate, object)` fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "s")]
    pub subject: Iri,
    #[serde(rename = "p")]
    pub predicate: Iri,
    #[serde(rename = "o")]
    pub object: Term,
}

impl Statement {
    pub fn new(subject: impl Into<Iri>, predicate: impl Into<Iri>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Whether `id` occupies the subject or object position.
    pub fn mentions(&self, id: &Iri) -> bool {
        &self.subject == id || self.object.as_iri() == Some(id)
    }

    /// Copy with every subject/object occurrence of `old` replaced by `new`.
    /// The predicate is never rewritten.
    pub fn renamed(&self, old: &Iri, new: &Iri) -> Self {
        let subject = if &self.subject == old {
            new.clone()
        } else {
            self.subject.clone()
        };
        let object = match &self.object {
            Term::Iri(iri) if iri == old => Term::Iri(new.clone()),
            other => other.clone(),
        };
        Self {
            subject,
            predicate: self.predicate.clone(),
            object,
        }
    }

    pub fn to_ntriples(&self) -> String {
        format!(
            "{} {} {} .",
            self.subject.to_ntriples(),
            self.predicate.to_ntriples(),
            self.object.to_ntriples()
        )
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ntriples())
    }
}

//! Relation schemas: the header line of a relation, an ordered list of
//! distinct, identifier-shaped field names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::KeySpec;
use crate::record;

/// Whether `name` matches `[A-Za-z_.][A-Za-z0-9_.]*`.
pub fn is_name(name: &[u8]) -> bool {
    match name.split_first() {
        None => false,
        Some((first, rest)) => {
            (first.is_ascii_alphabetic() || *first == b'_' || *first == b'.')
                && rest
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
        }
    }
}

/// Reject names that are not identifier-shaped or that repeat.
pub fn check_names<N: AsRef<[u8]>>(names: &[N]) -> Result<()> {
    let bad: Vec<String> = names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| !is_name(n))
        .map(|n| format!("{:?}", String::from_utf8_lossy(n)))
        .collect();
    if !bad.is_empty() {
        return Err(Error::data(format!("bad field names: {}", bad.join(" "))));
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_ref()) {
            return Err(Error::data(format!(
                "duplicate field name: {}",
                String::from_utf8_lossy(name.as_ref())
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    names: Vec<String>,
}

impl Schema {
    /// Build a schema from already split names, validating them.
    pub fn new<N: Into<String>>(names: impl IntoIterator<Item = N>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        check_names(&names)?;
        Ok(Self { names })
    }

    /// Parse a header line. An empty line is the zero-field schema.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let line = record::trim_line(line);
        if line.is_empty() {
            return Ok(Self::default());
        }
        let fields = record::split(line);
        check_names(&fields)?;
        // Names are ASCII once checked.
        let names = fields
            .into_iter()
            .map(|f| String::from_utf8_lossy(&f).into_owned())
            .collect();
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Fail unless every one of `old` is a field of this schema.
    pub fn require_old<S: AsRef<str>>(&self, old: &[S]) -> Result<()> {
        let missing: Vec<&str> = old
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| !self.contains(n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::data(format!("not in head: {}", missing.join(" "))))
        }
    }

    /// Fail if any one of `new` is already a field of this schema.
    pub fn require_new<S: AsRef<str>>(&self, new: &[S]) -> Result<()> {
        let taken: Vec<&str> = new
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| self.contains(n))
            .collect();
        if taken.is_empty() {
            Ok(())
        } else {
            Err(Error::data(format!("already in head: {}", taken.join(" "))))
        }
    }

    /// Fail unless `other` has exactly the same set of names.
    pub fn require_same_names(&self, other: &Schema) -> Result<()> {
        other.require_old(&self.names)?;
        let extra: Vec<&str> = other
            .names
            .iter()
            .map(String::as_str)
            .filter(|n| !self.contains(n))
            .collect();
        if extra.is_empty() {
            Ok(())
        } else {
            Err(Error::data(format!("not in head: {}", extra.join(" "))))
        }
    }

    /// Names of this schema that also occur in `other`, in this schema's order.
    pub fn shared_with(&self, other: &Schema) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| other.contains(n))
            .cloned()
            .collect()
    }

    /// Names of this schema that are not among `names`, in order.
    pub fn without<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| !names.iter().any(|m| m.as_ref() == n.as_str()))
            .cloned()
            .collect()
    }

    /// Positions of `names` in this schema, in the order given.
    pub fn positions<S: AsRef<str>>(&self, names: &[S]) -> Result<KeySpec> {
        self.require_old(names)?;
        Ok(KeySpec::new(
            names
                .iter()
                .filter_map(|n| self.index_of(n.as_ref()))
                .collect(),
        ))
    }

    /// Append one field name; it must be valid and new.
    pub fn with_field(&self, name: &str) -> Result<Schema> {
        if !is_name(name.as_bytes()) {
            return Err(Error::data(format!("bad field names: {name:?}")));
        }
        self.require_new(&[name])?;
        let mut names = self.names.clone();
        names.push(name.to_string());
        Ok(Schema { names })
    }

    /// The header as a record of byte values.
    pub fn to_record(&self) -> record::Record {
        self.names.iter().map(|n| n.as_bytes().to_vec()).collect()
    }
}

//! Full-signature key newtypes (spec §3 "Symbol identity").
//!
//! - Class: binary name (slash-form), e.g. `a/b/C`.
//! - Method: `owner.name+descriptor`, e.g. `a/b/C.m(I)V`.
//! - Field: `owner.name:descriptor`, e.g. `a/b/C.f:I`.
//!
//! These are the canonical keys used throughout match tables; `Ord` is
//! derived so they sort lexicographically over the full-signature string,
//! which is what spec §5 "Ordering guarantee" requires for deterministic
//! tie-breaking (source-key ascending).

use core::fmt;
use core::str::FromStr;

use crate::errors::ModelError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A class's binary name, slash-form (`java/lang/Object`).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassKey(String);

impl ClassKey {
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self(binary_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The simple (unqualified) name — the part after the last `/`.
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClassKey {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.contains(['.', ';']) {
            return Err(ModelError::MalformedClassKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for ClassKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// `owner.name+descriptor` — a method's full signature.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodKey(String);

impl MethodKey {
    pub fn build(owner: &ClassKey, name: &str, descriptor: &str) -> Self {
        Self(format!("{}.{}{}", owner.as_str(), name, descriptor))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits back into `(owner, name, descriptor)`. Owner is everything before
    /// the last `.` preceding the method name; descriptor starts at the first
    /// `(` after that point.
    pub fn parts(&self) -> Result<(&str, &str, &str), ModelError> {
        let paren = self
            .0
            .find('(')
            .ok_or_else(|| ModelError::MalformedMethodKey(self.0.clone()))?;
        let head = &self.0[..paren];
        let dot = head
            .rfind('.')
            .ok_or_else(|| ModelError::MalformedMethodKey(self.0.clone()))?;
        Ok((&self.0[..dot], &self.0[dot + 1..paren], &self.0[paren..]))
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MethodKey {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains('(') || !s.contains('.') {
            return Err(ModelError::MalformedMethodKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

/// `owner.name:descriptor` — a field's full signature.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldKey(String);

impl FieldKey {
    pub fn build(owner: &ClassKey, name: &str, descriptor: &str) -> Self {
        Self(format!("{}.{}:{}", owner.as_str(), name, descriptor))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parts(&self) -> Result<(&str, &str, &str), ModelError> {
        let colon = self
            .0
            .rfind(':')
            .ok_or_else(|| ModelError::MalformedFieldKey(self.0.clone()))?;
        let head = &self.0[..colon];
        let dot = head
            .rfind('.')
            .ok_or_else(|| ModelError::MalformedFieldKey(self.0.clone()))?;
        Ok((&self.0[..dot], &self.0[dot + 1..colon], &self.0[colon + 1..]))
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FieldKey {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') || !s.contains('.') {
            return Err(ModelError::MalformedFieldKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

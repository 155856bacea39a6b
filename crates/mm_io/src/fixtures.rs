//! In-memory archive fixtures for tests elsewhere in the workspace.
//!
//! Real `.jar`/`.class` parsing is out of scope (see `environment` module
//! docs) — this gives `mm_algo`/`mm_pipeline`/`mm_cli` tests a way to build
//! an `Environment` without a real `ArchiveReader` implementation.

use std::path::Path;

use mm_core::model::{AccessFlags, Constant, Instruction};
use mm_core::{DefaultObfuscationPredicate, Environment};

use crate::environment::{build_environment, ArchiveReader, RawClass, RawField, RawMethod};
use crate::errors::IoError;

/// An `ArchiveReader` that replays a fixed, in-memory `Vec<RawClass>`
/// regardless of the requested path. Used to exercise `load_environment`
/// without touching the filesystem.
#[derive(Clone, Debug, Default)]
pub struct FixtureArchive {
    classes: Vec<RawClass>,
}

impl FixtureArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: RawClass) -> Self {
        self.classes.push(class);
        self
    }
}

impl ArchiveReader for FixtureArchive {
    fn read(&self, _path: &Path) -> Result<Vec<RawClass>, IoError> {
        Ok(self.classes.clone())
    }
}

/// Builds a `RawClass` without a method/field list, to be filled in with
/// `with_method`/`with_field`.
pub fn raw_class(name: &str) -> RawClass {
    RawClass {
        name: name.to_string(),
        super_name: Some("java/lang/Object".to_string()),
        interfaces: Vec::new(),
        access: 0,
        methods: Vec::new(),
        fields: Vec::new(),
    }
}

pub fn raw_method(name: &str, descriptor: &str) -> RawMethod {
    RawMethod {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        access: 0,
        exceptions: None,
        instructions: Vec::new(),
        constants: Vec::new(),
    }
}

pub fn raw_field(name: &str, descriptor: &str) -> RawField {
    RawField {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        access: 0,
        initial_value: None,
    }
}

/// Builder extensions kept as free functions (rather than methods on the
/// `mm_core` raw structs, which this crate doesn't own) so call sites read
/// as `raw_class("a").method(...)`.
pub trait RawClassExt {
    fn method(self, m: RawMethod) -> Self;
    fn field(self, f: RawField) -> Self;
    fn static_flag(self) -> Self;
}

impl RawClassExt for RawClass {
    fn method(mut self, m: RawMethod) -> Self {
        self.methods.push(m);
        self
    }

    fn field(mut self, f: RawField) -> Self {
        self.fields.push(f);
        self
    }

    fn static_flag(mut self) -> Self {
        self.access |= AccessFlags::STATIC;
        self
    }
}

pub trait RawMethodExt {
    fn constant(self, c: Constant) -> Self;
    fn instruction(self, i: Instruction) -> Self;
    fn static_flag(self) -> Self;
}

impl RawMethodExt for RawMethod {
    fn constant(mut self, c: Constant) -> Self {
        self.constants.push(c);
        self
    }

    fn instruction(mut self, i: Instruction) -> Self {
        self.instructions.push(i);
        self
    }

    fn static_flag(mut self) -> Self {
        self.access |= AccessFlags::STATIC;
        self
    }
}

/// Builds an `Environment` directly from raw classes using the standard
/// obfuscation predicate, skipping the `ArchiveReader` plumbing entirely.
pub fn environment_from(classes: Vec<RawClass>) -> Environment {
    let pred = DefaultObfuscationPredicate::standard();
    build_environment(classes, &pred)
}

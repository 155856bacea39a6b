//! Assembly of a parsed archive into an immutable `mm_core::Environment`
//! (spec §6 "Input — Environment").
//!
//! `ArchiveReader` is the seam the out-of-scope bytecode reader plugs into:
//! spec §1 treats "the bytecode reader that parses archive entries into the
//! symbol model" as an external collaborator, specified only through this
//! interface. Production deployments implement `ArchiveReader` over a real
//! JVM-class-format parser; this crate only consumes the trait.

use std::path::Path;

use mm_core::model::{AccessFlags, ClassRecordBuilder, Constant, EnvironmentBuilder, Instruction, MethodRecord};
use mm_core::{ClassKey, Environment, FieldRecord, ObfuscationPredicate};

use crate::errors::IoError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A class entry as handed back by the (external) bytecode reader, before
/// obfuscation classification or full-signature-key derivation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawClass {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: u16,
    pub methods: Vec<RawMethod>,
    pub fields: Vec<RawField>,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawMethod {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
    pub exceptions: Option<Vec<String>>,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Constant>,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawField {
    pub name: String,
    pub descriptor: String,
    pub access: u16,
    pub initial_value: Option<Constant>,
}

/// The seam a real JVM-class-format reader implements. `mm_io` never parses
/// bytes itself; see module docs.
pub trait ArchiveReader {
    /// Parse every class entry out of the archive at `path`.
    fn read(&self, path: &Path) -> Result<Vec<RawClass>, IoError>;
}

/// Builds an `Environment` from an `ArchiveReader`'s raw output, applying the
/// injected obfuscation classifier and normalizing iteration order (spec §6:
/// "stable iteration order is not required but recommended... sorting at
/// load is a reasonable choice" — `EnvironmentBuilder` stores into `BTreeMap`,
/// so this falls out for free).
pub fn load_environment(
    path: &Path,
    reader: &dyn ArchiveReader,
    pred: &dyn ObfuscationPredicate,
) -> Result<Environment, IoError> {
    let raw_classes = reader.read(path)?;
    Ok(build_environment(raw_classes, pred))
}

pub fn build_environment(raw_classes: Vec<RawClass>, pred: &dyn ObfuscationPredicate) -> Environment {
    let mut builder = EnvironmentBuilder::new();

    for rc in &raw_classes {
        let mut cb = ClassRecordBuilder::new(rc.name.as_str());
        if let Some(sup) = &rc.super_name {
            cb = cb.super_name(sup.as_str());
        }
        for i in &rc.interfaces {
            cb = cb.interface(i.as_str());
        }
        cb.access = AccessFlags(rc.access);
        builder = builder.class(pred, cb);
    }

    for rc in raw_classes {
        let owner = ClassKey::new(rc.name.clone());
        for rm in rc.methods {
            builder = builder.method(
                pred,
                MethodRecord {
                    name: rm.name,
                    owner: owner.clone(),
                    descriptor: rm.descriptor,
                    access: AccessFlags(rm.access),
                    exceptions: rm.exceptions.map(|v| v.into_iter().map(ClassKey::new).collect()),
                    instructions: rm.instructions,
                    constants: rm.constants,
                    obfuscated: false,
                },
            );
        }
        for rf in rc.fields {
            builder = builder.field(
                pred,
                FieldRecord {
                    name: rf.name,
                    owner: owner.clone(),
                    descriptor: rf.descriptor,
                    access: AccessFlags(rf.access),
                    initial_value: rf.initial_value,
                    obfuscated: false,
                },
            );
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_core::DefaultObfuscationPredicate;

    #[test]
    fn builds_environment_from_raw_classes() {
        let pred = DefaultObfuscationPredicate::standard();
        let raw = vec![RawClass {
            name: "a".into(),
            super_name: Some("java/lang/Object".into()),
            interfaces: vec![],
            access: 0,
            methods: vec![RawMethod {
                name: "b".into(),
                descriptor: "()V".into(),
                access: 0,
                exceptions: None,
                instructions: vec![],
                constants: vec![],
            }],
            fields: vec![],
        }];
        let env = build_environment(raw, &pred);
        assert_eq!(env.classes.len(), 1);
        assert_eq!(env.methods.len(), 1);
        let class = env.class(&ClassKey::new("a")).unwrap();
        assert!(class.obfuscated);
    }
}

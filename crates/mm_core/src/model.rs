//! Symbol model (spec §3): class/method/field records, instruction stream,
//! and the per-archive `Environment`.
//!
//! Everything here is immutable once built — `Environment` is read-only
//! after load, per spec §5 "Shared resources".

use std::collections::BTreeMap;

use crate::keys::{ClassKey, FieldKey, MethodKey};
use crate::obfuscation::ObfuscationPredicate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// JVM access-flag bitfield. Only the bits the matching engine reads are
/// named; the rest pass through opaquely.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const STATIC: u16 = 0x0008;

    pub fn is_static(self) -> bool {
        self.0 & Self::STATIC != 0
    }
}

/// A literal constant captured from a method's load-constant opcodes, or a
/// field's initial value. Stored tagged rather than boxed-`dyn` per spec §9
/// "Constants as heterogeneous values".
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(u32),  // bit pattern; avoids `Eq`/`Hash` headaches with `f32`
    Double(u64), // bit pattern
    String(String),
    Type(ClassKey),
}

impl Constant {
    /// Significance filter used by the unique-constants pass (spec §4.4).
    pub fn is_significant(&self) -> bool {
        match self {
            Constant::String(s) => {
                s.len() >= 5 && !(s.chars().all(|c| c.is_ascii_lowercase())) && s != "true" && s != "false"
            }
            Constant::Int(v) => v.unsigned_abs() as i64 >= 3,
            Constant::Long(v) => v.unsigned_abs() as i64 >= 3,
            Constant::Float(bits) => {
                let v = f32::from_bits(*bits);
                v != 0.0 && v != 1.0
            }
            Constant::Double(bits) => {
                let v = f64::from_bits(*bits);
                v != 0.0 && v != 1.0
            }
            Constant::Type(_) => false,
        }
    }
}

/// Categorical opcode identity (spec §3 "Instruction stream"). Operand bytes,
/// local indices, and line info are discarded; this is a lossy projection.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Opcode {
    Nop,
    Load,
    Store,
    Push,
    ArrayLoad,
    ArrayStore,
    Arithmetic,
    Compare,
    Branch,
    Switch,
    Return,
    GetField,
    PutField,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    InvokeInterface,
    InvokeDynamic,
    New,
    NewArray,
    InstanceOf,
    CheckCast,
    Throw,
    MonitorEnter,
    MonitorExit,
    Other,
}

/// One element of a method's lossy instruction projection.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Instruction {
    Opcode(Opcode),
    FieldRef { owner: ClassKey, name: String },
    MethodRef { owner: ClassKey, name: String, descriptor: String },
    TypeRef(ClassKey),
}

/// A class record (spec §3 "Class record").
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassRecord {
    pub name: ClassKey,
    pub super_name: Option<ClassKey>,
    pub interfaces: Vec<ClassKey>,
    pub access: AccessFlags,
    pub methods: Vec<MethodKey>,
    pub fields: Vec<FieldKey>,
    pub obfuscated: bool,
}

impl ClassRecord {
    pub fn is_in_default_package(&self) -> bool {
        !self.name.as_str().contains('/')
    }
}

/// A method record (spec §3 "Method record").
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodRecord {
    pub name: String,
    pub owner: ClassKey,
    pub descriptor: String,
    pub access: AccessFlags,
    pub exceptions: Option<Vec<ClassKey>>,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Constant>,
    pub obfuscated: bool,
}

impl MethodRecord {
    pub fn key(&self) -> MethodKey {
        MethodKey::build(&self.owner, &self.name, &self.descriptor)
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    /// Constructors/static-initializers use the `<init>`/`<clinit>` naming
    /// convention (spec §4.2: "constructors/static-initializers must match
    /// each other, not regular methods").
    pub fn is_constructor_marker(&self) -> bool {
        self.name.starts_with('<')
    }
}

/// A field record (spec §3 "Field record").
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldRecord {
    pub name: String,
    pub owner: ClassKey,
    pub descriptor: String,
    pub access: AccessFlags,
    pub initial_value: Option<Constant>,
    pub obfuscated: bool,
}

impl FieldRecord {
    pub fn key(&self) -> FieldKey {
        FieldKey::build(&self.owner, &self.name, &self.descriptor)
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }
}

/// One archive's symbol universe (spec §3 "Environment"): three total maps
/// keyed by full signature, immutable after load.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Environment {
    pub classes: BTreeMap<ClassKey, ClassRecord>,
    pub methods: BTreeMap<MethodKey, MethodRecord>,
    pub fields: BTreeMap<FieldKey, FieldRecord>,
}

impl Environment {
    pub fn from_parts(
        classes: BTreeMap<ClassKey, ClassRecord>,
        methods: BTreeMap<MethodKey, MethodRecord>,
        fields: BTreeMap<FieldKey, FieldRecord>,
    ) -> Self {
        Self { classes, methods, fields }
    }

    pub fn class(&self, key: &ClassKey) -> Option<&ClassRecord> {
        self.classes.get(key)
    }

    pub fn method(&self, key: &MethodKey) -> Option<&MethodRecord> {
        self.methods.get(key)
    }

    pub fn field(&self, key: &FieldKey) -> Option<&FieldRecord> {
        self.fields.get(key)
    }

    /// Methods owned by `class`, in full-signature-ascending order.
    pub fn methods_of<'a>(&'a self, class: &ClassKey) -> impl Iterator<Item = &'a MethodRecord> + 'a {
        self.methods.values().filter(move |m| &m.owner == class)
    }

    /// Fields owned by `class`, in full-signature-ascending order.
    pub fn fields_of<'a>(&'a self, class: &ClassKey) -> impl Iterator<Item = &'a FieldRecord> + 'a {
        self.fields.values().filter(move |f| &f.owner == class)
    }
}

/// Test/fixture-only builder for small synthetic environments, used by unit
/// tests in `mm_algo`/`mm_pipeline` instead of going through `mm_io`'s real
/// archive reader.
#[derive(Default)]
pub struct EnvironmentBuilder {
    classes: BTreeMap<ClassKey, ClassRecord>,
    methods: BTreeMap<MethodKey, MethodRecord>,
    fields: BTreeMap<FieldKey, FieldRecord>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, pred: &dyn ObfuscationPredicate, mut rec: ClassRecordBuilder) -> Self {
        rec.obfuscated = pred.is_obfuscated(rec.name.simple_name());
        let key = rec.name.clone();
        self.classes.insert(
            key,
            ClassRecord {
                name: rec.name,
                super_name: rec.super_name,
                interfaces: rec.interfaces,
                access: rec.access,
                methods: rec.methods,
                fields: rec.fields,
                obfuscated: rec.obfuscated,
            },
        );
        self
    }

    pub fn method(mut self, pred: &dyn ObfuscationPredicate, mut rec: MethodRecord) -> Self {
        rec.obfuscated = pred.is_obfuscated(&rec.name);
        let key = rec.key();
        if let Some(c) = self.classes.get_mut(&rec.owner) {
            if !c.methods.contains(&key) {
                c.methods.push(key.clone());
            }
        }
        self.methods.insert(key, rec);
        self
    }

    pub fn field(mut self, pred: &dyn ObfuscationPredicate, mut rec: FieldRecord) -> Self {
        rec.obfuscated = pred.is_obfuscated(&rec.name);
        let key = rec.key();
        if let Some(c) = self.classes.get_mut(&rec.owner) {
            if !c.fields.contains(&key) {
                c.fields.push(key.clone());
            }
        }
        self.fields.insert(key, rec);
        self
    }

    pub fn build(self) -> Environment {
        Environment::from_parts(self.classes, self.methods, self.fields)
    }
}

/// Partially-built class record, obfuscation flag filled in by the builder.
pub struct ClassRecordBuilder {
    pub name: ClassKey,
    pub super_name: Option<ClassKey>,
    pub interfaces: Vec<ClassKey>,
    pub access: AccessFlags,
    pub methods: Vec<MethodKey>,
    pub fields: Vec<FieldKey>,
    obfuscated: bool,
}

impl ClassRecordBuilder {
    pub fn new(name: impl Into<ClassKey>) -> Self {
        Self {
            name: name.into(),
            super_name: None,
            interfaces: Vec::new(),
            access: AccessFlags::default(),
            methods: Vec::new(),
            fields: Vec::new(),
            obfuscated: false,
        }
    }

    pub fn super_name(mut self, s: impl Into<ClassKey>) -> Self {
        self.super_name = Some(s.into());
        self
    }

    pub fn interface(mut self, i: impl Into<ClassKey>) -> Self {
        self.interfaces.push(i.into());
        self
    }
}

//! TF-IDF tokenizer (spec §4.9): each method yields a bag of tokens across
//! tiered namespaces.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mm_core::model::{Constant, Instruction, MethodRecord, Opcode};
use mm_core::Environment;

fn opcode_name(op: Opcode) -> &'static str {
    match op {
        Opcode::Nop => "nop",
        Opcode::Load => "load",
        Opcode::Store => "store",
        Opcode::Push => "push",
        Opcode::ArrayLoad => "aload",
        Opcode::ArrayStore => "astore",
        Opcode::Arithmetic => "arith",
        Opcode::Compare => "cmp",
        Opcode::Branch => "branch",
        Opcode::Switch => "switch",
        Opcode::Return => "return",
        Opcode::GetField => "getfield",
        Opcode::PutField => "putfield",
        Opcode::InvokeVirtual => "invokevirtual",
        Opcode::InvokeStatic => "invokestatic",
        Opcode::InvokeSpecial => "invokespecial",
        Opcode::InvokeInterface => "invokeinterface",
        Opcode::InvokeDynamic => "invokedynamic",
        Opcode::New => "new",
        Opcode::NewArray => "newarray",
        Opcode::InstanceOf => "instanceof",
        Opcode::CheckCast => "checkcast",
        Opcode::Throw => "throw",
        Opcode::MonitorEnter => "monitorenter",
        Opcode::MonitorExit => "monitorexit",
        Opcode::Other => "other",
    }
}

fn size_bucket(instruction_count: usize) -> &'static str {
    match instruction_count {
        0..=9 => "TINY",
        10..=49 => "SMALL",
        50..=199 => "MEDIUM",
        200..=499 => "LARGE",
        _ => "HUGE",
    }
}

fn stable_hash(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

fn is_obfuscated_class(env: &Environment, owner: &mm_core::ClassKey) -> bool {
    env.class(owner).map(|c| c.obfuscated).unwrap_or(false)
}

fn normalize_ref(env: &Environment, owner: &mm_core::ClassKey, name: &str, member_obfuscated: bool) -> String {
    let owner_tok = if is_obfuscated_class(env, owner) { "OBF" } else { owner.as_str() };
    let name_tok = if member_obfuscated { "OBF" } else { name };
    format!("{owner_tok}.{name_tok}")
}

/// Token bag for one method, following spec §4.9's tiered namespaces.
pub fn tokens_for(env: &Environment, method: &MethodRecord) -> Vec<String> {
    let mut tokens = Vec::new();

    tokens.push(format!("DESC:{}", method.descriptor));
    tokens.push(format!("SIZE:{}", size_bucket(method.instructions.len())));

    for constant in &method.constants {
        match constant {
            Constant::String(s) => tokens.push(format!("USTR:{:x}", stable_hash(s))),
            Constant::Int(v) if constant.is_significant() => tokens.push(format!("UNUM:{v}")),
            Constant::Long(v) if constant.is_significant() => tokens.push(format!("UNUM:{v}")),
            Constant::Float(bits) if constant.is_significant() => tokens.push(format!("UNUM:{}", f32::from_bits(*bits))),
            Constant::Double(bits) if constant.is_significant() => tokens.push(format!("UNUM:{}", f64::from_bits(*bits))),
            _ => {}
        }
    }

    let opcode_seq: Vec<Opcode> = method
        .instructions
        .iter()
        .filter_map(|i| match i {
            Instruction::Opcode(op) => Some(*op),
            _ => None,
        })
        .collect();

    for op in &opcode_seq {
        tokens.push(format!("OPC:{}", opcode_name(*op)));
    }
    for window in opcode_seq.windows(3) {
        tokens.push(format!("NG3:{}_{}_{}", opcode_name(window[0]), opcode_name(window[1]), opcode_name(window[2])));
    }
    for window in opcode_seq.windows(4) {
        tokens.push(format!(
            "NG4:{}_{}_{}_{}",
            opcode_name(window[0]),
            opcode_name(window[1]),
            opcode_name(window[2]),
            opcode_name(window[3])
        ));
    }

    for instruction in &method.instructions {
        match instruction {
            Instruction::MethodRef { owner, name, .. } => {
                let member_obfuscated = env.methods.values().find(|m| &m.owner == owner && &m.name == name).map(|m| m.obfuscated).unwrap_or(false);
                tokens.push(format!("MCALL:{}", normalize_ref(env, owner, name, member_obfuscated)));
            }
            Instruction::FieldRef { owner, name } => {
                let member_obfuscated = env.fields.values().find(|f| &f.owner == owner && &f.name == name).map(|f| f.obfuscated).unwrap_or(false);
                tokens.push(format!("FACCS:{}", normalize_ref(env, owner, name, member_obfuscated)));
            }
            Instruction::TypeRef(t) => {
                if !is_obfuscated_class(env, t) {
                    tokens.push(format!("NEWTYPE:{}", t.as_str()));
                }
            }
            Instruction::Opcode(_) => {}
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_io::fixtures::{environment_from, raw_class, raw_method};

    #[test]
    fn empty_method_emits_only_descriptor_and_size() {
        let env = environment_from(vec![raw_class("a").method(raw_method("m", "()V"))]);
        let method = env.methods.values().next().unwrap();
        let tokens = tokens_for(&env, method);
        assert_eq!(tokens, vec!["DESC:()V".to_string(), "SIZE:TINY".to_string()]);
    }

    use mm_io::fixtures::RawClassExt;

    #[test]
    fn size_bucket_reflects_instruction_count() {
        assert_eq!(size_bucket(5), "TINY");
        assert_eq!(size_bucket(100), "MEDIUM");
        assert_eq!(size_bucket(1000), "HUGE");
    }
}

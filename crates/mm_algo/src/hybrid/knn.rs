//! KNN feature vector (spec §4.9): a fixed 33-dimension per-method vector
//! with published per-dimension importance weights, combined by weighted
//! cosine similarity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mm_core::model::{Instruction, MethodRecord, Opcode};

pub const DIMENSIONS: usize = 33;

const NAMED_OPCODES: [Opcode; 15] = [
    Opcode::Load,
    Opcode::Store,
    Opcode::Push,
    Opcode::ArrayLoad,
    Opcode::ArrayStore,
    Opcode::Arithmetic,
    Opcode::Compare,
    Opcode::Branch,
    Opcode::Switch,
    Opcode::Return,
    Opcode::GetField,
    Opcode::PutField,
    Opcode::InvokeVirtual,
    Opcode::InvokeStatic,
    Opcode::New,
];

/// Per-dimension importance (spec §4.9: "hashes 2.5-3.5, structural counters
/// 1.5-2.5, common opcodes 0.5-1.2"). Indices:
/// 0-2 structural counters, 3-6 boolean flags, 7-21 opcode histogram,
/// 22-24 hash-based summaries, 25-29 parameter/return-type ratios and
/// flags, 30-32 call/access/type-ref density.
pub const IMPORTANCE: [f64; DIMENSIONS] = [
    2.5, 2.0, 1.5, // structural counters: instructions, constants, exceptions
    1.0, 1.0, 1.0, 1.8, // flags: static, ctor marker, obfuscated, descriptor length
    0.6, 0.6, 0.6, 0.6, 0.6, 0.8, 0.8, 0.7, 0.6, 0.6, 1.0, 1.2, 0.9, 0.9, 1.2, // 15 opcode proportions
    3.5, 3.0, 2.5, // hash-based summaries: calls, field accesses, strings
    1.2, 1.2, 1.2, // parameter type ratios: primitive, object, array
    0.8, 0.8, // return-type flags: primitive, void
    1.0, 1.0, 1.0, // invoke density, field access density, type-ref density
];

fn normalize_count(count: usize, scale: f64) -> f64 {
    count as f64 / (count as f64 + scale)
}

fn hash_to_unit(tokens: &mut Vec<String>) -> f64 {
    tokens.sort();
    let joined = tokens.join("|");
    let mut hasher = DefaultHasher::new();
    joined.hash(&mut hasher);
    (hasher.finish() as f64) / (u64::MAX as f64)
}

struct ParamShape {
    primitive: usize,
    object: usize,
    array: usize,
    return_is_void: bool,
    return_is_primitive: bool,
}

fn parse_descriptor(descriptor: &str) -> ParamShape {
    let mut shape = ParamShape { primitive: 0, object: 0, array: 0, return_is_void: false, return_is_primitive: false };
    let Some(open) = descriptor.find('(') else { return shape };
    let Some(close) = descriptor.find(')') else { return shape };
    let params = &descriptor[open + 1..close];
    let ret = &descriptor[close + 1..];

    let mut chars = params.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                shape.array += 1;
                while chars.peek() == Some(&'[') {
                    chars.next();
                }
                if chars.peek() == Some(&'L') {
                    while let Some(c) = chars.next() {
                        if c == ';' {
                            break;
                        }
                    }
                } else {
                    chars.next();
                }
            }
            'L' => {
                shape.object += 1;
                while let Some(c) = chars.next() {
                    if c == ';' {
                        break;
                    }
                }
            }
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => shape.primitive += 1,
            _ => {}
        }
    }

    match ret.chars().next() {
        Some('V') => shape.return_is_void = true,
        Some('B') | Some('C') | Some('D') | Some('F') | Some('I') | Some('J') | Some('S') | Some('Z') => shape.return_is_primitive = true,
        _ => {}
    }
    shape
}

/// Builds the fixed 33-dimension feature vector for one method.
pub fn feature_vector(method: &MethodRecord) -> [f64; DIMENSIONS] {
    let mut v = [0.0; DIMENSIONS];

    v[0] = normalize_count(method.instructions.len(), 50.0);
    v[1] = normalize_count(method.constants.len(), 10.0);
    v[2] = normalize_count(method.exceptions.as_ref().map(|e| e.len()).unwrap_or(0), 3.0);

    v[3] = if method.is_static() { 1.0 } else { 0.0 };
    v[4] = if method.is_constructor_marker() { 1.0 } else { 0.0 };
    v[5] = if method.obfuscated { 1.0 } else { 0.0 };
    v[6] = normalize_count(method.descriptor.len(), 20.0);

    let opcodes: Vec<Opcode> = method
        .instructions
        .iter()
        .filter_map(|i| match i {
            Instruction::Opcode(op) => Some(*op),
            _ => None,
        })
        .collect();
    let total_ops = opcodes.len().max(1) as f64;
    for (i, named) in NAMED_OPCODES.iter().enumerate() {
        let count = opcodes.iter().filter(|op| *op == named).count();
        v[7 + i] = count as f64 / total_ops;
    }

    let mut calls: Vec<String> = Vec::new();
    let mut accesses: Vec<String> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    for instruction in &method.instructions {
        match instruction {
            Instruction::MethodRef { owner, name, .. } => calls.push(format!("{}.{}", owner.as_str(), name)),
            Instruction::FieldRef { owner, name } => accesses.push(format!("{}.{}", owner.as_str(), name)),
            _ => {}
        }
    }
    for constant in &method.constants {
        if let mm_core::model::Constant::String(s) = constant {
            strings.push(s.clone());
        }
    }
    v[22] = hash_to_unit(&mut calls);
    v[23] = hash_to_unit(&mut accesses);
    v[24] = hash_to_unit(&mut strings);

    let shape = parse_descriptor(&method.descriptor);
    let param_total = (shape.primitive + shape.object + shape.array).max(1) as f64;
    v[25] = shape.primitive as f64 / param_total;
    v[26] = shape.object as f64 / param_total;
    v[27] = shape.array as f64 / param_total;
    v[28] = if shape.return_is_primitive { 1.0 } else { 0.0 };
    v[29] = if shape.return_is_void { 1.0 } else { 0.0 };

    let invoke_count = opcodes
        .iter()
        .filter(|op| matches!(op, Opcode::InvokeVirtual | Opcode::InvokeStatic | Opcode::InvokeSpecial | Opcode::InvokeInterface | Opcode::InvokeDynamic))
        .count();
    v[30] = invoke_count as f64 / total_ops;
    v[31] = (method.instructions.iter().filter(|i| matches!(i, Instruction::FieldRef { .. })).count() as f64) / method.instructions.len().max(1) as f64;
    v[32] = (method.instructions.iter().filter(|i| matches!(i, Instruction::TypeRef(_))).count() as f64) / method.instructions.len().max(1) as f64;

    v
}

/// Weighted cosine similarity over two feature vectors (spec §4.9). `0` if
/// either weighted norm is zero, never `NaN`.
pub fn weighted_cosine(a: &[f64; DIMENSIONS], b: &[f64; DIMENSIONS]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for i in 0..DIMENSIONS {
        let w = IMPORTANCE[i];
        dot += w * a[i] * b[i];
        norm_a += w * a[i] * a[i];
        norm_b += w * b[i] * b[i];
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_io::fixtures::{environment_from, raw_class, raw_method, RawClassExt};

    #[test]
    fn identical_methods_have_cosine_one() {
        let env = environment_from(vec![raw_class("a").method(raw_method("m", "(IJ)V")).method(raw_method("n", "(IJ)V"))]);
        let mut it = env.methods.values();
        let m1 = it.next().unwrap();
        let m2 = it.next().unwrap();
        let v1 = feature_vector(m1);
        let v2 = feature_vector(m2);
        assert!((weighted_cosine(&v1, &v2) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_vector_similarity_is_zero_not_nan() {
        let zero = [0.0; DIMENSIONS];
        let sim = weighted_cosine(&zero, &zero);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }

    #[test]
    fn parameter_ratio_denominator_is_clamped() {
        let shape = parse_descriptor("()V");
        let total = (shape.primitive + shape.object + shape.array).max(1);
        assert_eq!(total, 1);
    }
}

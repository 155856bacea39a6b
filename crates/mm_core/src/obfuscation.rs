//! Obfuscation classification (spec §9, glossary "Obfuscated (symbol)").
//!
//! The source material this engine is modeled on classifies a symbol as
//! non-obfuscated iff its simple name starts with one of a fixed prefix set
//! (`class`, `method`, `field`, `client`, ...). Spec §9 flags that hardcoding
//! as an open question and asks for an injectable predicate instead, so the
//! classifier lives behind a trait here rather than a free function.

/// Decides whether a simple name looks human-authored (non-obfuscated).
///
/// Implementations are applied once, at environment-load time (spec §6:
/// "Obfuscation heuristic is applied at load time; downstream code may not
/// re-derive it"), so the derived `obfuscated` booleans on `ClassRecord`,
/// `MethodRecord`, and `FieldRecord` are frozen thereafter.
pub trait ObfuscationPredicate {
    /// Returns `true` if `simple_name` is non-obfuscated (i.e. human-readable).
    fn is_non_obfuscated(&self, simple_name: &str) -> bool;

    /// Convenience negation matching the glossary's "obfuscated" terminology.
    fn is_obfuscated(&self, simple_name: &str) -> bool {
        !self.is_non_obfuscated(simple_name)
    }
}

/// Default predicate: a configurable set of meaningful-name prefixes.
///
/// A name is considered non-obfuscated iff it starts with one of the
/// configured prefixes. This matches the corpus this engine was modeled on
/// (prefixes like `class`, `method`, `field`, `client` mark deliberately
/// human-readable names left behind by partial de-obfuscation), but the set
/// is data, not a hardcoded rule, per spec §9's open question.
#[derive(Clone, Debug)]
pub struct DefaultObfuscationPredicate {
    prefixes: Vec<String>,
}

impl DefaultObfuscationPredicate {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The prefix set used by the corpus this engine targets by default.
    pub fn standard() -> Self {
        Self::new(["class", "method", "field", "client"])
    }
}

impl Default for DefaultObfuscationPredicate {
    fn default() -> Self {
        Self::standard()
    }
}

impl ObfuscationPredicate for DefaultObfuscationPredicate {
    fn is_non_obfuscated(&self, simple_name: &str) -> bool {
        self.prefixes.iter().any(|p| simple_name.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_prefixes_mark_non_obfuscated() {
        let p = DefaultObfuscationPredicate::standard();
        assert!(p.is_non_obfuscated("classFoo"));
        assert!(p.is_non_obfuscated("methodBar"));
        assert!(!p.is_non_obfuscated("a"));
        assert!(p.is_obfuscated("a"));
    }

    #[test]
    fn custom_prefix_set() {
        let p = DefaultObfuscationPredicate::new(["com.example"]);
        assert!(p.is_non_obfuscated("com.example.Foo"));
        assert!(p.is_obfuscated("a"));
    }
}

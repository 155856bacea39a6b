//! Result Bundle (spec §4.10): the frozen three-way mapping handed to the
//! report writer once the pipeline converges. Opaque beyond the three maps
//! and the coverage summary.

use std::collections::BTreeMap;

use mm_core::{ClassKey, FieldKey, MethodKey};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-kind `(matched, total pending at run start)` ratio, a reporting
/// convenience alongside the three mapping tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coverage {
    pub matched: usize,
    pub total: usize,
}

impl Coverage {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// The frozen class/method/field mappings produced by one `MergeEngine::run`.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultBundle {
    pub classes: BTreeMap<ClassKey, ClassKey>,
    pub methods: BTreeMap<MethodKey, MethodKey>,
    pub fields: BTreeMap<FieldKey, FieldKey>,
    total_classes_seen: usize,
    total_methods_seen: usize,
    total_fields_seen: usize,
}

impl ResultBundle {
    pub fn new(
        classes: BTreeMap<ClassKey, ClassKey>,
        methods: BTreeMap<MethodKey, MethodKey>,
        fields: BTreeMap<FieldKey, FieldKey>,
        total_classes_seen: usize,
        total_methods_seen: usize,
        total_fields_seen: usize,
    ) -> Self {
        Self { classes, methods, fields, total_classes_seen, total_methods_seen, total_fields_seen }
    }

    pub fn class_coverage(&self) -> Coverage {
        Coverage { matched: self.classes.len(), total: self.total_classes_seen }
    }

    pub fn method_coverage(&self) -> Coverage {
        Coverage { matched: self.methods.len(), total: self.total_methods_seen }
    }

    pub fn field_coverage(&self) -> Coverage {
        Coverage { matched: self.fields.len(), total: self.total_fields_seen }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_ratio_handles_zero_total() {
        let c = Coverage { matched: 0, total: 0 };
        assert_eq!(c.ratio(), 1.0);
    }

    #[test]
    fn coverage_ratio_is_matched_over_total() {
        let c = Coverage { matched: 3, total: 4 };
        assert_eq!(c.ratio(), 0.75);
    }

    #[test]
    fn bundle_reports_per_kind_coverage() {
        let mut classes = BTreeMap::new();
        classes.insert(ClassKey::new("a/A"), ClassKey::new("b/B"));
        let bundle = ResultBundle::new(classes, BTreeMap::new(), BTreeMap::new(), 2, 10, 10);
        assert_eq!(bundle.class_coverage(), Coverage { matched: 1, total: 2 });
    }
}

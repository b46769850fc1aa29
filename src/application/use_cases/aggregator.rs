// ============================================================
// AGGREGATOR
// ============================================================
// Single pass over equipment records producing a Summary

use std::collections::BTreeMap;

use super::type_classifier::TypeClassifier;
use crate::domain::equipment::{EquipmentRecord, NumericField, Summary};

/// Running statistics for one numeric field
#[derive(Debug, Clone, Copy, Default)]
struct FieldAccumulator {
    sum: f64,
    /// Running mean updated as `m + v/n - m/n`, finite for any finite inputs
    scaled_mean: f64,
    present: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldAccumulator {
    fn observe(&mut self, value: Option<f64>) {
        let Some(value) = value else {
            return;
        };
        self.sum += value;
        self.present += 1;
        let n = self.present as f64;
        self.scaled_mean += value / n - self.scaled_mean / n;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Arithmetic mean over present values.
    ///
    /// `sum / present` while the sum is finite; the running mean once the sum
    /// has overflowed. Clamped to `[min, max]` against rounding drift.
    fn mean(&self) -> Option<f64> {
        let (min, max) = (self.min?, self.max?);
        if self.present == 0 {
            return None;
        }
        let mean = if self.sum.is_finite() {
            self.sum / self.present as f64
        } else {
            self.scaled_mean
        };
        Some(mean.clamp(min, max))
    }
}

/// Consume `records` exactly once and compute their summary.
///
/// Summation follows input order; reordering the same records can change
/// the mean in its last bits (well within 1e-9 relative error).
pub fn aggregate<I>(records: I) -> Summary
where
    I: IntoIterator<Item = EquipmentRecord>,
{
    let mut count = 0i64;
    let mut fields = [FieldAccumulator::default(); 3];
    let mut classifier = TypeClassifier::new();
    let mut type_distribution: BTreeMap<String, i64> = BTreeMap::new();

    for record in records {
        count += 1;

        for (acc, field) in fields.iter_mut().zip(NumericField::ALL) {
            acc.observe(record.value(field));
        }

        let label = classifier.classify(record.equipment_type.as_deref());
        match type_distribution.get_mut(label) {
            Some(n) => *n += 1,
            None => {
                type_distribution.insert(label.to_string(), 1);
            }
        }
    }

    let mut summary = Summary {
        count,
        type_distribution,
        ..Summary::empty()
    };
    for (acc, field) in fields.iter().zip(NumericField::ALL) {
        summary.averages.set(field, acc.mean());
        summary.min.set(field, acc.min);
        summary.max.set(field, acc.max);
    }

    tracing::debug!(
        count,
        types = summary.type_distribution.len(),
        "Aggregated equipment records"
    );

    summary
}

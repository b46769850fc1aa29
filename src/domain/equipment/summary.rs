// ============================================================
// SUMMARY
// ============================================================
// Aggregate statistics over an equipment dataset. This is the one
// shape shared by the HTTP API, persistence and the report renderer.

use super::NumericField;
use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Reserved label for records without a usable equipment type
pub const UNKNOWN_TYPE: &str = "Unknown";

const RELATIVE_TOLERANCE: f64 = 1e-9;

/// One optional value per numeric field.
///
/// Serialized as `{"Flowrate": .., "Pressure": .., "Temperature": ..}` with
/// `null` for absent values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    #[serde(rename = "Flowrate", default)]
    pub flowrate: Option<f64>,

    #[serde(rename = "Pressure", default)]
    pub pressure: Option<f64>,

    #[serde(rename = "Temperature", default)]
    pub temperature: Option<f64>,
}

impl FieldValues {
    pub fn get(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Flowrate => self.flowrate,
            NumericField::Pressure => self.pressure,
            NumericField::Temperature => self.temperature,
        }
    }

    pub fn set(&mut self, field: NumericField, value: Option<f64>) {
        match field {
            NumericField::Flowrate => self.flowrate = value,
            NumericField::Pressure => self.pressure = value,
            NumericField::Temperature => self.temperature = value,
        }
    }
}

/// Aggregate statistics for one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Summary {
    /// Number of records consumed
    #[validate(range(min = 0))]
    pub count: i64,

    pub averages: FieldValues,
    pub min: FieldValues,
    pub max: FieldValues,

    /// Occurrences per normalized type label, including `Unknown`
    pub type_distribution: BTreeMap<String, i64>,
}

impl Summary {
    /// Summary of a dataset with no records
    pub fn empty() -> Self {
        Self::default()
    }

    /// Type distribution ordered by count descending, then label ascending
    pub fn sorted_distribution(&self) -> Vec<(&str, i64)> {
        let mut entries: Vec<(&str, i64)> = self
            .type_distribution
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Check that this summary is internally consistent.
    ///
    /// Summaries read back from storage are plain JSON, so nothing guarantees
    /// they still satisfy the aggregation invariants.
    pub fn validate_shape(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::Render(format!("invalid summary: {}", e)))?;

        let mut total = 0i64;
        for (label, count) in &self.type_distribution {
            if *count < 0 {
                return Err(AppError::Render(format!(
                    "negative count {} for type '{}'",
                    count, label
                )));
            }
            total = total.checked_add(*count).ok_or_else(|| {
                AppError::Render("type distribution total overflows".to_string())
            })?;
        }
        if total != self.count {
            return Err(AppError::Render(format!(
                "type distribution accounts for {} records but count is {}",
                total, self.count
            )));
        }

        for field in NumericField::ALL {
            let avg = self.averages.get(field);
            let min = self.min.get(field);
            let max = self.max.get(field);

            match (avg, min, max) {
                (None, None, None) => {}
                (Some(avg), Some(min), Some(max)) => {
                    if !(avg.is_finite() && min.is_finite() && max.is_finite()) {
                        return Err(AppError::Render(format!(
                            "{} statistics contain a non-finite value",
                            field
                        )));
                    }
                    if min > max {
                        return Err(AppError::Render(format!(
                            "{} min {} is greater than max {}",
                            field, min, max
                        )));
                    }
                    let slack = RELATIVE_TOLERANCE * avg.abs().max(1.0);
                    if avg < min - slack || avg > max + slack {
                        return Err(AppError::Render(format!(
                            "{} average {} lies outside [{}, {}]",
                            field, avg, min, max
                        )));
                    }
                }
                _ => {
                    return Err(AppError::Render(format!(
                        "{} statistics are only partially present",
                        field
                    )));
                }
            }
        }

        Ok(())
    }
}

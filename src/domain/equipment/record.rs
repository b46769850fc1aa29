// ============================================================
// EQUIPMENT RECORD
// ============================================================
// One typed row of equipment operating parameters

use std::fmt;

/// Numeric readings carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Flowrate,
    Pressure,
    Temperature,
}

impl NumericField {
    /// All numeric fields in display order
    pub const ALL: [NumericField; 3] = [
        NumericField::Flowrate,
        NumericField::Pressure,
        NumericField::Temperature,
    ];

    /// Name used on the wire and in reports
    pub fn label(&self) -> &'static str {
        match self {
            NumericField::Flowrate => "Flowrate",
            NumericField::Pressure => "Pressure",
            NumericField::Temperature => "Temperature",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single parsed row.
///
/// Every field is optional: a missing column, a blank cell or an unparsable
/// number all end up as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentRecord {
    /// Equipment name, kept for tabular display only
    pub equipment_name: Option<String>,

    /// Raw equipment type as it appeared in the file
    pub equipment_type: Option<String>,

    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl EquipmentRecord {
    /// Reading for the given numeric field
    pub fn value(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Flowrate => self.flowrate,
            NumericField::Pressure => self.pressure,
            NumericField::Temperature => self.temperature,
        }
    }

    /// Set the reading for the given numeric field
    pub fn set_value(&mut self, field: NumericField, value: Option<f64>) {
        match field {
            NumericField::Flowrate => self.flowrate = value,
            NumericField::Pressure => self.pressure = value,
            NumericField::Temperature => self.temperature = value,
        }
    }
}

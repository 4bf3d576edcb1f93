//! EGE raw score to scaled score conversion table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Valid range for both sides of the conversion.
pub const EGE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// A row as returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgeRow {
    /// Row id.
    pub id: u64,
    /// Raw score.
    pub input_mark: u32,
    /// Converted score.
    pub output_mark: u32,
}

/// Body of the bulk update endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgeUpdate {
    /// Raw score (as a string key) to converted score.
    pub data: BTreeMap<String, u32>,
}

/// Editable copy of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EgeTable {
    values: BTreeMap<u32, u32>,
    errors: BTreeSet<u32>,
}

impl EgeTable {
    /// Builds the table from fetched rows.
    #[must_use]
    pub fn from_rows(rows: &[EgeRow]) -> Self {
        Self {
            values: rows.iter().map(|r| (r.input_mark, r.output_mark)).collect(),
            errors: BTreeSet::new(),
        }
    }

    /// Current converted value for a raw score.
    #[must_use]
    pub fn value(&self, input_mark: u32) -> Option<u32> {
        self.values.get(&input_mark).copied()
    }

    /// Whether the row currently holds rejected input.
    #[must_use]
    pub fn has_error(&self, input_mark: u32) -> bool {
        self.errors.contains(&input_mark)
    }

    /// Iterates rows in raw score order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Applies typed input to a row.
    ///
    /// Returns `true` when the value was accepted. Rejected input marks the
    /// row as an error and keeps the last valid value. Unknown rows are
    /// ignored.
    pub fn edit(&mut self, input_mark: u32, raw: &str) -> bool {
        if !self.values.contains_key(&input_mark) {
            return false;
        }
        match raw.trim().parse::<u32>() {
            Ok(value) if EGE_RANGE.contains(&value) => {
                self.values.insert(input_mark, value);
                self.errors.remove(&input_mark);
                true
            }
            _ => {
                self.errors.insert(input_mark);
                false
            }
        }
    }

    /// Number of rows holding rejected input.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether saving is allowed.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.errors.is_empty()
    }

    /// Builds the bulk update body.
    pub fn payload(&self) -> Result<EgeUpdate> {
        if !self.can_save() {
            return Err(CoreError::validation(
                "ege",
                "Исправьте ошибки перед сохранением",
            ));
        }
        Ok(EgeUpdate {
            data: self
                .values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        })
    }
}

//! JSON report generation.
//!
//! [`JsonGenerator`] serializes any report type of this crate, either compact
//! for piping into other tools or pretty-printed for reading.
//!
//! # Example
//!
//! ```rust
//! use quizdesk_report::{json::JsonGenerator, HistoryReport};
//!
//! let history = HistoryReport::from_stats(Some("Анна"), &[], 3);
//! let json = JsonGenerator::new(&history).generate().unwrap();
//! assert_eq!(json, r#"{"student":"Анна","works":[]}"#);
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::{ReportError, Result};

/// Generates JSON from a report.
#[derive(Debug)]
pub struct JsonGenerator<'a, T: Serialize> {
    report: &'a T,
}

impl<'a, T: Serialize> JsonGenerator<'a, T> {
    /// Creates a generator for the given report.
    #[must_use]
    pub const fn new(report: &'a T) -> Self {
        Self { report }
    }

    /// Generates compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn generate(&self) -> Result<String> {
        serde_json::to_string(self.report).map_err(ReportError::from)
    }

    /// Generates indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self.report).map_err(ReportError::from)
    }

    /// Writes the report to `path`, replacing any existing file.
    ///
    /// Parent directories must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialization`] if serialization fails and
    /// [`ReportError::Io`] if the file cannot be written.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

//! Condition model.
//!
//! # Responsibilities
//! - Normalize one tabular (field, value) pair into a typed `Condition`
//! - Reject the "not applicable" sentinel and fields outside the allowed set
//! - Split the combined `host-header + path-pattern` export field back apart
//!
//! # Design Decisions
//! - Rejection is a value, never a panic; the caller reports and skips the row
//! - Field names compare case-insensitively after trimming

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Label used by the export projector for merged host/path rows.
pub const COMBINED_FIELD: &str = "host-header + path-pattern";

/// Separator between the host and path halves of a combined value.
pub const COMBINED_SEPARATOR: &str = " + ";

/// The allowed rule condition fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionField {
    HttpHeader,
    HttpRequestMethod,
    HostHeader,
    QueryString,
    SourceIp,
    PathPattern,
}

impl ConditionField {
    pub const ALL: [ConditionField; 6] = [
        ConditionField::HttpHeader,
        ConditionField::HttpRequestMethod,
        ConditionField::HostHeader,
        ConditionField::QueryString,
        ConditionField::SourceIp,
        ConditionField::PathPattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionField::HttpHeader => "http-header",
            ConditionField::HttpRequestMethod => "http-request-method",
            ConditionField::HostHeader => "host-header",
            ConditionField::QueryString => "query-string",
            ConditionField::SourceIp => "source-ip",
            ConditionField::PathPattern => "path-pattern",
        }
    }

    /// Host-header and path-pattern are the pair merged under the default policy.
    pub fn is_host_or_path(&self) -> bool {
        matches!(self, ConditionField::HostHeader | ConditionField::PathPattern)
    }
}

impl FromStr for ConditionField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ConditionField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or(())
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single match predicate: one field with one or more values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: ConditionField,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(field: ConditionField, value: impl Into<String>) -> Self {
        Self {
            field,
            values: vec![value.into()],
        }
    }

    /// Union `values` into this condition, keeping first-seen order.
    pub fn absorb(&mut self, values: &[String]) {
        for value in values {
            if !self.values.contains(value) {
                self.values.push(value.clone());
            }
        }
    }
}

/// Normalizes raw tabular cells into conditions.
#[derive(Debug, Clone)]
pub struct ConditionNormalizer {
    not_applicable: String,
}

impl Default for ConditionNormalizer {
    fn default() -> Self {
        Self::new("N/A")
    }
}

impl ConditionNormalizer {
    pub fn new(not_applicable: impl Into<String>) -> Self {
        Self {
            not_applicable: not_applicable.into(),
        }
    }

    pub fn not_applicable(&self) -> &str {
        &self.not_applicable
    }

    /// Normalize one raw (field, value) pair.
    pub fn normalize(&self, raw_field: &str, raw_value: &str) -> Result<Condition, SyncError> {
        let field_text = raw_field.trim();
        if field_text.is_empty() || field_text == self.not_applicable {
            return Err(SyncError::Validation(format!(
                "condition field '{}' is not applicable",
                field_text
            )));
        }

        let field: ConditionField = field_text.parse().map_err(|_| {
            SyncError::Validation(format!("invalid condition field '{}'", field_text))
        })?;

        let value = raw_value.trim();
        if value.is_empty() || value == self.not_applicable {
            return Err(SyncError::Validation(format!(
                "missing value for condition field '{}'",
                field
            )));
        }

        Ok(Condition::new(field, value))
    }

    /// Normalize a row that may carry the combined host/path field.
    ///
    /// Returns one condition for ordinary fields and two (host-header, then
    /// path-pattern) for the combined field.
    pub fn normalize_row(&self, raw_field: &str, raw_value: &str) -> Result<Vec<Condition>, SyncError> {
        if !raw_field.trim().eq_ignore_ascii_case(COMBINED_FIELD) {
            return self.normalize(raw_field, raw_value).map(|c| vec![c]);
        }

        let (hosts, paths) = raw_value.split_once(COMBINED_SEPARATOR).ok_or_else(|| {
            SyncError::Validation(format!(
                "combined condition value '{}' lacks the '{}' separator",
                raw_value.trim(),
                COMBINED_SEPARATOR.trim()
            ))
        })?;

        let mut conditions = Vec::with_capacity(2);
        for (field, side) in [(ConditionField::HostHeader, hosts), (ConditionField::PathPattern, paths)] {
            let values: Vec<String> = side
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            if values.is_empty() {
                return Err(SyncError::Validation(format!(
                    "combined condition value '{}' has no {} values",
                    raw_value.trim(),
                    field
                )));
            }
            conditions.push(Condition { field, values });
        }
        Ok(conditions)
    }
}

/// Format host and path values as a single combined export value.
pub fn format_combined(hosts: &[String], paths: &[String]) -> String {
    format!("{}{}{}", hosts.join(","), COMBINED_SEPARATOR, paths.join(","))
}

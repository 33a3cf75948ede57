//! Title annotation grammar
//!
//! Parsing, formatting, and stripping of annotation tokens embedded in
//! free-text card titles. The grammar is deliberately tolerant: `?` is a
//! valid placeholder value, decimals accept both `.` and `,` as separator,
//! and anything the pattern fails to match is simply absent (malformed
//! tokens are not an error).

use crate::kinds::{AnnotationKind, KindCatalog, KindSpec};
use std::collections::BTreeMap;

/// Value extracted from a title for one annotation kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractedValue {
    /// A finite numeric value
    Number(f64),
    /// The `?` placeholder (estimated but unknown)
    Placeholder,
    /// Kind not present in the title, or deactivated
    Absent,
}

impl ExtractedValue {
    /// Contribution to an aggregate sum. Placeholder and absent both count
    /// as zero but stay distinct for display purposes.
    pub fn sanitized(&self) -> f64 {
        match self {
            ExtractedValue::Number(n) => *n,
            ExtractedValue::Placeholder | ExtractedValue::Absent => 0.0,
        }
    }

    /// String form persisted to the card attribute: full precision, `?` for
    /// the placeholder, nothing for absent. Used for the string-equality
    /// short-circuit in the extractor.
    pub fn persisted(&self) -> Option<String> {
        match self {
            ExtractedValue::Number(n) => Some(format!("{n}")),
            ExtractedValue::Placeholder => Some("?".to_string()),
            ExtractedValue::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, ExtractedValue::Absent)
    }
}

/// Parse the first token of the given kind out of a title.
///
/// A deactivated kind never matches. Only the first occurrence is used;
/// titles are not expected to carry the same kind twice.
pub fn parse(title: &str, spec: &KindSpec) -> ExtractedValue {
    if !spec.activated {
        return ExtractedValue::Absent;
    }

    let Some(captures) = spec.pattern().captures(title) else {
        return ExtractedValue::Absent;
    };

    let raw = &captures[1];
    if raw == "?" {
        return ExtractedValue::Placeholder;
    }

    match raw.replace(',', ".").parse::<f64>() {
        Ok(n) => ExtractedValue::Number(n),
        // Unreachable with the current patterns, but a pattern change must
        // not turn into a panic
        Err(_) => ExtractedValue::Absent,
    }
}

/// Format a value for badge display: one decimal place, integral results
/// without a trailing `.0`, `?` stays `?`.
pub fn format_value(value: ExtractedValue) -> String {
    match value {
        ExtractedValue::Placeholder => "?".to_string(),
        ExtractedValue::Absent => String::new(),
        ExtractedValue::Number(n) => {
            let rounded = (n * 10.0).round() / 10.0;
            if rounded.fract() == 0.0 {
                format!("{}", rounded as i64)
            } else {
                format!("{rounded}")
            }
        }
    }
}

/// Remove the first matched token of the given kind, including delimiters
/// and the whitespace run preceding it, then trim.
pub fn strip(title: &str, spec: &KindSpec) -> String {
    spec.pattern().replace(title, "").trim().to_string()
}

/// Per-kind numeric totals with zero defaults for every kind in the
/// catalog, activated or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueIndex {
    values: BTreeMap<AnnotationKind, f64>,
}

impl ValueIndex {
    /// An index holding each kind's default (zero) value.
    pub fn zeroed(catalog: &KindCatalog) -> Self {
        let values = catalog
            .specs()
            .iter()
            .map(|spec| (spec.kind, spec.default_value))
            .collect();
        Self { values }
    }

    pub fn get(&self, kind: AnnotationKind) -> f64 {
        self.values.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, kind: AnnotationKind, value: f64) {
        self.values.insert(kind, value);
    }

    /// Fold another index into this one, kind by kind.
    pub fn accumulate(&mut self, other: &ValueIndex) {
        for (kind, value) in &other.values {
            *self.values.entry(*kind).or_insert(0.0) += *value;
        }
    }
}

use serde::{Deserialize, Serialize};

/// A problem with user input, reported next to the offending control and
/// summarized at the form level.
///
/// Validation errors are collected and returned as values, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Id of the form control the error belongs to.
    pub element_id: String,
    /// Short message shown inline next to the control.
    pub inline_text: String,
    /// Full sentence shown in the form-level summary.
    pub summary_text: String,
}

impl ValidationError {
    pub fn new(
        element_id: impl Into<String>,
        inline_text: impl Into<String>,
        summary_text: impl Into<String>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            inline_text: inline_text.into(),
            summary_text: summary_text.into(),
        }
    }
}

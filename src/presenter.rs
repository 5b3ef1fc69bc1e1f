//! Per-field display formatting.
//!
//! The presenter dispatches over an explicit table: a declared formatter for
//! the field wins, then fields listed in the model's `date_fields()` go
//! through the date branch, and anything else falls back to raw attribute
//! access. No reflection or method probing.

use crate::traits::{ModelId, Transformable};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write;

/// How a date field should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// Formatted with the presenter's date format.
    #[default]
    Formatted,
    /// Seconds since the Unix epoch.
    Timestamp,
}

type Formatter = fn(&dyn Transformable) -> Option<Value>;

pub struct Presenter {
    date_format: String,
    formatters: HashMap<&'static str, Formatter>,
}

impl Presenter {
    #[must_use]
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            formatters: HashMap::new(),
        }
    }

    /// Declare a formatter for a named field. Declared entries take
    /// precedence over the date branch and raw access.
    pub fn declare(&mut self, field: &'static str, formatter: Formatter) {
        self.formatters.insert(field, formatter);
    }

    /// Present a field: declared formatter, date branch, raw fallback.
    #[must_use]
    pub fn present(&self, model: &dyn Transformable, field: &str) -> Option<Value> {
        if let Some(formatter) = self.formatters.get(field) {
            return formatter(model);
        }

        if model.date_fields().contains(&field) {
            return self
                .present_date(model, field, DateStyle::Formatted)
                .map(Value::String);
        }

        model.field(field)
    }

    /// Present a date field in the given style. Absent dates and timestamps
    /// at or before the epoch present as `None`.
    #[must_use]
    pub fn present_date(
        &self,
        model: &dyn Transformable,
        field: &str,
        style: DateStyle,
    ) -> Option<String> {
        let date = model.date_value(field)?;

        if date.timestamp() <= 0 {
            return None;
        }

        match style {
            DateStyle::Timestamp => Some(date.timestamp().to_string()),
            DateStyle::Formatted => Some(date.format(&self.date_format).to_string()),
        }
    }

    /// Epoch seconds for a date field, for the numeric wire fields.
    #[must_use]
    pub fn date_timestamp(&self, model: &dyn Transformable, field: &str) -> Option<i64> {
        let date = model.date_value(field)?;
        (date.timestamp() > 0).then(|| date.timestamp())
    }

    /// Present the model identifier. Raw byte ids are hex-encoded so they
    /// survive JSON; everything else renders canonically.
    #[must_use]
    pub fn present_id(&self, model: &dyn Transformable) -> Value {
        match model.model_id() {
            ModelId::Uuid(id) => Value::String(id.to_string()),
            ModelId::Int(id) => Value::from(id),
            ModelId::Text(id) => Value::String(id),
            ModelId::Bytes(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for byte in &bytes {
                    let _ = write!(hex, "{byte:02x}");
                }
                Value::String(hex)
            }
        }
    }
}

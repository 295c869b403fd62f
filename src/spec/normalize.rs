use serde_json::{Map, Value};

use crate::foundation::error::{ChartError, ChartResult};

/// Plot width injected into non-composite specs that do not set one.
pub const DEFAULT_WIDTH: f64 = 500.0;
/// Plot height injected into non-composite specs that do not set one.
pub const DEFAULT_HEIGHT: f64 = 350.0;

const COMPOSITION_KEYS: [&str; 3] = ["facet", "hconcat", "vconcat"];

/// A chart spec that passed syntactic validation and default-size injection.
///
/// The grammar itself is still unchecked; that is the compiler's job.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSpec(Value);

impl NormalizedSpec {
    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume into the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Parse raw spec text as a JSON object.
///
/// Only syntax is checked here: the text must be non-empty, well-formed JSON whose top-level
/// value is an object.
pub fn parse_spec_text(text: &str) -> ChartResult<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChartError::invalid_input("chart specification is required"));
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ChartError::invalid_input(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ChartError::invalid_input(
            "chart specification must be a JSON object",
        ));
    }
    Ok(value)
}

/// Inject default plot dimensions into a parsed spec.
///
/// Width and height are filled independently, and only when the chart has none of the
/// composition keys. Composite specs size their panels themselves. A `"container"` size has no
/// container to fill here, so it gets the default as well.
pub fn normalize(spec: Value) -> NormalizedSpec {
    let Value::Object(mut obj) = spec else {
        return NormalizedSpec(spec);
    };
    if !is_composite(&obj) {
        for (key, default) in [("width", DEFAULT_WIDTH), ("height", DEFAULT_HEIGHT)] {
            let fill = match obj.get(key) {
                None => true,
                Some(Value::String(k)) => k == "container",
                Some(_) => false,
            };
            if fill {
                obj.insert(key.to_string(), Value::from(default));
            }
        }
    }
    NormalizedSpec(Value::Object(obj))
}

/// Parse and normalize in one step.
pub fn normalize_text(text: &str) -> ChartResult<NormalizedSpec> {
    parse_spec_text(text).map(normalize)
}

/// Return `true` when the object carries any composition key.
pub fn is_composite(obj: &Map<String, Value>) -> bool {
    COMPOSITION_KEYS.iter().any(|k| obj.contains_key(*k))
}

#[cfg(test)]
#[path = "../../tests/unit/spec/normalize.rs"]
mod tests;

// ── Loosely-typed field maps ──
//
// Rows arrive from the source store as name → value maps. Extraction
// helpers never fail: anything that cannot be interpreted becomes `None`
// and the entity constructor substitutes its default.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single loosely-typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One row: field name → value, in projection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(IndexMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert, handy for fixtures.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Trimmed text; blank and null become `None`. Numbers and booleans
    /// are rendered to text.
    pub fn text(&self, name: &str) -> Option<String> {
        let rendered = match self.get(name)? {
            FieldValue::Null => return None,
            FieldValue::Text(s) => s.trim().to_owned(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
        };
        (!rendered.is_empty()).then_some(rendered)
    }

    /// Trimmed text, or `default` when missing or blank.
    pub fn text_or(&self, name: &str, default: &str) -> String {
        self.text(name).unwrap_or_else(|| default.to_owned())
    }

    /// Integer in the target type's range.
    ///
    /// Text is trimmed and parsed, integral floats are accepted, anything
    /// else (including out-of-range values) is `None`.
    pub fn int<T: TryFrom<i64>>(&self, name: &str) -> Option<T> {
        let wide = match self.get(name)? {
            FieldValue::Int(n) => *n,
            FieldValue::Float(f) => float_to_i64(*f)?,
            FieldValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))?
            }
            FieldValue::Null | FieldValue::Bool(_) => return None,
        };
        T::try_from(wide).ok()
    }

    /// Finite floating-point number.
    pub fn float(&self, name: &str) -> Option<f64> {
        let value = match self.get(name)? {
            FieldValue::Float(f) => *f,
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            FieldValue::Int(n) => *n as f64,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Null | FieldValue::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Boolean from a bool, a non-zero integer, or common text spellings.
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Int(n) => Some(*n != 0),
            FieldValue::Float(f) => Some(*f != 0.0),
            FieldValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
                "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
                _ => None,
            },
            FieldValue::Null => None,
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; stay strictly inside.
    let in_range = f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18;
    in_range.then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> FieldMap {
        FieldMap::new()
            .with("name", "  NYC-DC1  ")
            .with("blank", "   ")
            .with("null", FieldValue::Null)
            .with("mtu_text", " 9000 ")
            .with("mtu_float", 1500.0)
            .with("mtu_frac", "1500.5")
            .with("negative", -5_i64)
            .with("lat", "40.7128")
            .with("enabled_text", "Y")
            .with("enabled_int", 0_i64)
    }

    #[test]
    fn text_trims_and_blanks_to_none() {
        let row = row();
        assert_eq!(row.text("name").as_deref(), Some("NYC-DC1"));
        assert_eq!(row.text("blank"), None);
        assert_eq!(row.text("null"), None);
        assert_eq!(row.text("missing"), None);
        assert_eq!(row.text_or("blank", "Site"), "Site");
    }

    #[test]
    fn int_parses_gracefully() {
        let row = row();
        assert_eq!(row.int::<u32>("mtu_text"), Some(9000));
        assert_eq!(row.int::<u32>("mtu_float"), Some(1500));
        assert_eq!(row.int::<u32>("mtu_frac"), None);
        assert_eq!(row.int::<u32>("negative"), None);
        assert_eq!(row.int::<i64>("negative"), Some(-5));
        assert_eq!(row.int::<u32>("name"), None);
    }

    #[test]
    fn float_parses_text() {
        let row = row();
        assert_eq!(row.float("lat"), Some(40.7128));
        assert_eq!(row.float("name"), None);
        assert_eq!(row.float("negative"), Some(-5.0));
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let row = row();
        assert_eq!(row.bool("enabled_text"), Some(true));
        assert_eq!(row.bool("enabled_int"), Some(false));
        assert_eq!(row.bool("name"), None);
        assert_eq!(row.bool("null"), None);
    }
}

//! Lenient field access over a raw journal record.
//!
//! Field names drift between game versions (`SellShipID` vs `SellShipId`), so
//! lookups try the exact key first and then a case-insensitive match. Absent
//! optional fields take defaults; a field that is present with the wrong type is
//! an error.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::ParseError;
use crate::models::catalog::strip_localisation;
use crate::models::LocalId;

/// Borrowed view of one record (or a nested object inside it).
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    event: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// View `map`, naming `event` in any error.
    pub fn new(event: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { event, map }
    }

    /// Event tag the record was parsed for.
    pub fn event(&self) -> &'a str {
        self.event
    }

    /// The record serialised back to JSON.
    pub fn raw(&self) -> String {
        Value::Object(self.map.clone()).to_string()
    }

    /// Value for `key`, treating JSON `null` as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        let value = self.map.get(key).or_else(|| {
            self.map
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })?;
        (!value.is_null()).then_some(value)
    }

    fn missing(&self, key: &str) -> ParseError {
        ParseError::MissingField {
            event: self.event.to_string(),
            field: key.to_string(),
        }
    }

    fn invalid(&self, key: &str, expected: &'static str) -> ParseError {
        ParseError::InvalidField {
            event: self.event.to_string(),
            field: key.to_string(),
            expected,
        }
    }

    /// The record's RFC 3339 `timestamp`, required on every record.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, ParseError> {
        let raw = self.get("timestamp").ok_or_else(|| ParseError::MissingTimestamp {
            event: self.event.to_string(),
        })?;
        let text = raw.as_str().ok_or_else(|| self.invalid("timestamp", "string"))?;
        DateTime::parse_from_rfc3339(text)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|_| ParseError::InvalidTimestamp {
                event: self.event.to_string(),
                value: text.to_string(),
            })
    }

    /// Optional string field.
    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, ParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.as_str())),
            Some(_) => Err(self.invalid(key, "string")),
        }
    }

    /// Required string field.
    pub fn str(&self, key: &str) -> Result<&'a str, ParseError> {
        self.opt_str(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional string with blank values treated as absent.
    pub fn opt_string(&self, key: &str) -> Result<Option<String>, ParseError> {
        Ok(self
            .opt_str(key)?
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string))
    }

    /// Required string field, owned.
    pub fn string(&self, key: &str) -> Result<String, ParseError> {
        self.str(key).map(str::to_string)
    }

    /// String with localisation markers removed.
    pub fn edname(&self, key: &str) -> Result<String, ParseError> {
        self.str(key).map(|raw| strip_localisation(raw).to_string())
    }

    /// Like [`Fields::edname`], with blank and `Null` values treated as absent.
    pub fn opt_edname(&self, key: &str) -> Result<Option<String>, ParseError> {
        Ok(self
            .opt_str(key)?
            .map(strip_localisation)
            .filter(|text| !text.is_empty() && !text.eq_ignore_ascii_case("null"))
            .map(str::to_string))
    }

    /// Optional integer; fractional numbers are truncated.
    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>, ParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|float| float as i64))
                .map(Some)
                .ok_or_else(|| self.invalid(key, "integer")),
        }
    }

    /// Monetary and count fields default to zero when absent.
    pub fn i64_or_zero(&self, key: &str) -> Result<i64, ParseError> {
        Ok(self.opt_i64(key)?.unwrap_or(0))
    }

    /// Optional non-negative integer.
    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>, ParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "unsigned integer")),
        }
    }

    /// Required non-negative integer.
    pub fn u64(&self, key: &str) -> Result<u64, ParseError> {
        self.opt_u64(key)?.ok_or_else(|| self.missing(key))
    }

    /// Count field defaulting to zero; values past `u32::MAX` are invalid.
    pub fn u32_or_zero(&self, key: &str) -> Result<u32, ParseError> {
        let value = self.opt_u64(key)?.unwrap_or(0);
        u32::try_from(value).map_err(|_| self.invalid(key, "32-bit unsigned integer"))
    }

    /// Optional number.
    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>, ParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "number")),
        }
    }

    /// Number, or `default` when absent.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ParseError> {
        Ok(self.opt_f64(key)?.unwrap_or(default))
    }

    /// Booleans default to `false`; older records encode them as 0/1.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ParseError> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(Value::Number(number)) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
            Some(_) => Err(self.invalid(key, "boolean")),
        }
    }

    /// Boolean defaulting to `false`.
    pub fn flag(&self, key: &str) -> Result<bool, ParseError> {
        self.bool_or(key, false)
    }

    /// Optional ship id.
    pub fn opt_local_id(&self, key: &str) -> Result<Option<LocalId>, ParseError> {
        match self.opt_u64(key)? {
            None => Ok(None),
            Some(id) => u32::try_from(id)
                .map(|id| Some(LocalId(id)))
                .map_err(|_| self.invalid(key, "ship id")),
        }
    }

    /// Required ship id.
    pub fn local_id(&self, key: &str) -> Result<LocalId, ParseError> {
        self.opt_local_id(key)?.ok_or_else(|| self.missing(key))
    }

    /// Array field; absent means empty.
    pub fn array(&self, key: &str) -> Result<&'a [Value], ParseError> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(self.invalid(key, "array")),
        }
    }

    /// Nested object as another view over the same record.
    pub fn object(&self, key: &str) -> Result<Option<Fields<'a>>, ParseError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Fields::new(self.event, map))),
            Some(_) => Err(self.invalid(key, "object")),
        }
    }

    /// Each element of an array of objects.
    pub fn objects(&self, key: &str) -> Result<Vec<Fields<'a>>, ParseError> {
        self.array(key)?
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Fields::new(self.event, map)),
                _ => Err(self.invalid(key, "array of objects")),
            })
            .collect()
    }

    /// Each element of an array of strings.
    pub fn strings(&self, key: &str) -> Result<Vec<String>, ParseError> {
        self.array(key)?
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(key, "array of strings"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with<T>(value: Value, check: impl FnOnce(Fields<'_>) -> T) -> T {
        let map = value.as_object().cloned().expect("object");
        check(Fields::new("Test", &map))
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        with(json!({ "SellShipId": 4 }), |fields| {
            assert_eq!(fields.opt_local_id("SellShipID").unwrap(), Some(LocalId(4)));
        });
    }

    #[test]
    fn absent_optionals_take_defaults() {
        with(json!({ "Name": null }), |fields| {
            assert!(!fields.flag("Hot").unwrap());
            assert_eq!(fields.i64_or_zero("Cost").unwrap(), 0);
            assert_eq!(fields.opt_string("Name").unwrap(), None);
            assert!(fields.array("Items").unwrap().is_empty());
        });
    }

    #[test]
    fn wrong_types_are_errors() {
        with(json!({ "Cost": "lots", "Hot": "yes" }), |fields| {
            assert!(matches!(
                fields.opt_i64("Cost"),
                Err(ParseError::InvalidField { .. })
            ));
            assert!(fields.flag("Hot").is_err());
            assert!(matches!(
                fields.str("Missing"),
                Err(ParseError::MissingField { .. })
            ));
        });
    }

    #[test]
    fn numeric_booleans_are_accepted() {
        with(json!({ "LessIsGood": 1, "Other": 0 }), |fields| {
            assert!(fields.flag("LessIsGood").unwrap());
            assert!(!fields.flag("Other").unwrap());
        });
    }
}

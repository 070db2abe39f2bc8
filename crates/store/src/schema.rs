//! Typed field schemas and the casting rules applied before a record is
//! persisted.
//!
//! Incoming data is a loose JSON field mapping (it may come from a JSON body
//! or a url-encoded form, where everything is text). A [`Schema`] walks its
//! fields in declaration order, casts each value to the declared
//! [`FieldKind`], drops keys it does not declare and finally checks required
//! fields.

use crate::error::{FieldFailure, StoreError};
use serde_json::{Map, Number, Value};

/// Loose field mapping as supplied by callers.
pub type FieldMap = Map<String, Value>;

/// Storage type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

impl FieldKind {
    fn type_name(self) -> &'static str {
        match self {
            FieldKind::Text => "String",
            FieldKind::Integer => "Number",
        }
    }

    /// Cast `raw` into this kind. `Value::Null` means the field is unset.
    pub fn cast(self, path: &str, raw: &Value) -> Result<Value, StoreError> {
        let cast_error = || StoreError::Cast {
            path: path.to_string(),
            expected: self.type_name(),
            value: match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };

        match (self, raw) {
            (_, Value::Null) => Ok(Value::Null),

            (FieldKind::Text, Value::String(_)) => Ok(raw.clone()),
            (FieldKind::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (FieldKind::Text, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (FieldKind::Text, Value::Array(_) | Value::Object(_)) => Err(cast_error()),

            (FieldKind::Integer, Value::Number(n)) => {
                integral(n).map(Value::from).ok_or_else(cast_error)
            }
            (FieldKind::Integer, Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                parse_integral(trimmed)
                    .map(Value::from)
                    .ok_or_else(cast_error)
            }
            (FieldKind::Integer, Value::Bool(b)) => Ok(Value::from(i64::from(*b))),
            (FieldKind::Integer, Value::Array(_) | Value::Object(_)) => Err(cast_error()),
        }
    }
}

fn integral(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    if let Some(v) = n.as_u64() {
        return i64::try_from(v).ok();
    }
    n.as_f64().and_then(whole)
}

fn parse_integral(s: &str) -> Option<i64> {
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(whole))
}

// 2^63 as f64. `i64::MAX as f64` rounds up to this value, so the upper
// bound has to be exclusive.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn whole(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v >= -I64_UPPER && v < I64_UPPER {
        Some(v as i64)
    } else {
        None
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }
}

/// Ordered list of fields for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Schema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Cast and validate `data`, producing the document that will be stored.
    ///
    /// The first cast failure (in declaration order) aborts immediately.
    /// Required-field failures are collected and reported together.
    pub fn apply(&self, model: &str, data: &FieldMap) -> Result<FieldMap, StoreError> {
        let mut doc = FieldMap::new();
        let mut failures = Vec::new();

        for field in self.fields {
            let raw = data.get(field.name).unwrap_or(&Value::Null);
            let value = field.kind.cast(field.name, raw)?;
            if value.is_null() {
                if field.required {
                    failures.push(FieldFailure::required(field.name));
                }
                continue;
            }
            doc.insert(field.name.to_string(), value);
        }

        if !failures.is_empty() {
            return Err(StoreError::Validation {
                model: model.to_string(),
                failures,
            });
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::optional("count", FieldKind::Integer),
        FieldSpec::required("owner", FieldKind::Text),
    ];

    fn map(v: Value) -> FieldMap {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn text_accepts_scalars() {
        assert_eq!(FieldKind::Text.cast("a", &json!("x")).unwrap(), json!("x"));
        assert_eq!(FieldKind::Text.cast("a", &json!(12)).unwrap(), json!("12"));
        assert_eq!(FieldKind::Text.cast("a", &json!(true)).unwrap(), json!("true"));
        assert!(FieldKind::Text.cast("a", &json!(["x"])).is_err());
    }

    #[test]
    fn integer_casts_numeric_strings() {
        assert_eq!(FieldKind::Integer.cast("age", &json!(" 34 ")).unwrap(), json!(34));
        assert_eq!(FieldKind::Integer.cast("age", &json!(34.0)).unwrap(), json!(34));
        assert_eq!(FieldKind::Integer.cast("age", &json!("")).unwrap(), Value::Null);
        assert_eq!(FieldKind::Integer.cast("age", &json!(false)).unwrap(), json!(0));
    }

    #[test]
    fn integer_rejects_non_numbers() {
        let err = FieldKind::Integer
            .cast("age", &json!("not-a-number"))
            .unwrap_err();
        match err {
            StoreError::Cast {
                path,
                expected,
                value,
            } => {
                assert_eq!(path, "age");
                assert_eq!(expected, "Number");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(FieldKind::Integer.cast("age", &json!(3.5)).is_err());
        assert!(FieldKind::Integer.cast("age", &json!({"n": 1})).is_err());
    }

    #[test]
    fn integer_rejects_values_outside_i64() {
        let max = json!(i64::MAX);
        assert_eq!(FieldKind::Integer.cast("age", &max).unwrap(), max);
        assert_eq!(
            FieldKind::Integer.cast("age", &json!(i64::MIN)).unwrap(),
            json!(i64::MIN)
        );

        let just_over: Value = serde_json::from_str("9223372036854775808").unwrap();
        assert!(matches!(
            FieldKind::Integer.cast("age", &just_over),
            Err(StoreError::Cast { .. })
        ));
        assert!(FieldKind::Integer.cast("age", &json!(u64::MAX)).is_err());
        assert!(FieldKind::Integer.cast("age", &json!(9.3e18)).is_err());
        assert!(FieldKind::Integer.cast("age", &json!(-9.3e18)).is_err());
        assert!(FieldKind::Integer
            .cast("age", &json!("9223372036854775808"))
            .is_err());
        assert!(FieldKind::Integer.cast("age", &json!("1e19")).is_err());
    }

    #[test]
    fn integer_accepts_whole_floats_near_the_bounds() {
        // -2^63 is exactly representable
        assert_eq!(
            FieldKind::Integer.cast("age", &json!(-9.223372036854775808e18)).unwrap(),
            json!(i64::MIN)
        );
        assert_eq!(
            FieldKind::Integer.cast("age", &json!(4.0e18)).unwrap(),
            json!(4_000_000_000_000_000_000_i64)
        );
    }

    #[test]
    fn apply_drops_unknown_keys() {
        let schema = Schema::new(FIELDS);
        let doc = schema
            .apply(
                "Thing",
                &map(json!({"name": "a", "owner": "b", "_id": "forged", "extra": 1})),
            )
            .unwrap();
        assert_eq!(doc.len(), 2);
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn apply_reports_required_failures_in_declaration_order() {
        let schema = Schema::new(FIELDS);
        let err = schema.apply("Thing", &map(json!({"count": 2}))).unwrap_err();
        match err {
            StoreError::Validation { model, failures } => {
                assert_eq!(model, "Thing");
                let paths: Vec<_> = failures.iter().map(|f| f.path.as_str()).collect();
                assert_eq!(paths, vec!["name", "owner"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cast_failure_wins_over_validation() {
        let schema = Schema::new(FIELDS);
        let err = schema
            .apply("Thing", &map(json!({"count": "lots"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Cast { ref path, .. } if path == "count"));
    }
}

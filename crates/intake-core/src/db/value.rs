//! SQL parameter values and dynamic row decoding
//!
//! Statements are built with the runtime `sqlx::query` API, so parameters
//! travel as [`SqlValue`] and result rows are decoded by Postgres type name
//! into JSON values. `Null` binds as a text-typed null; SQL targeting
//! non-text columns with possibly-null parameters carries an explicit cast
//! (`$n::timestamptz`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo};
use uuid::Uuid;

use crate::record::Record;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// A parameter bound onto a SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl SqlValue {
    /// Map a JSON value onto the closest SQL parameter type
    ///
    /// Arrays and objects stay JSON (bound as jsonb); numbers prefer the
    /// integer representation when exact.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Json(value.clone()),
        }
    }

    pub(crate) fn bind_to<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        match self {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Json(v) => query.bind(v.clone()),
            SqlValue::Timestamp(t) => query.bind(*t),
            SqlValue::Uuid(u) => query.bind(*u),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Map a result row to a column-name-keyed record
pub(crate) fn row_to_record(row: &PgRow) -> Record {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_info().name());
        record.insert(column.name().to_string(), value);
    }
    record
}

/// Decode one column by Postgres type name; unknown types fall back to
/// text, then null
fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Value {
    match type_name {
        "BOOL" => opt(row.try_get::<Option<bool>, _>(idx)).map(Value::Bool),
        "INT2" => opt(row.try_get::<Option<i16>, _>(idx)).map(|v| Value::Number(v.into())),
        "INT4" => opt(row.try_get::<Option<i32>, _>(idx)).map(|v| Value::Number(v.into())),
        "INT8" => opt(row.try_get::<Option<i64>, _>(idx)).map(|v| Value::Number(v.into())),
        "FLOAT4" => opt(row.try_get::<Option<f32>, _>(idx))
            .and_then(|v| Number::from_f64(v as f64).map(Value::Number)),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(idx))
            .and_then(|v| Number::from_f64(v).map(Value::Number)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
            opt(row.try_get::<Option<String>, _>(idx)).map(Value::String)
        }
        "JSON" | "JSONB" => opt(row.try_get::<Option<Value>, _>(idx)),
        "TIMESTAMPTZ" => opt(row.try_get::<Option<DateTime<Utc>>, _>(idx))
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => opt(row.try_get::<Option<NaiveDateTime>, _>(idx))
            .map(|v| Value::String(v.to_string())),
        "DATE" => {
            opt(row.try_get::<Option<NaiveDate>, _>(idx)).map(|v| Value::String(v.to_string()))
        }
        "UUID" => {
            opt(row.try_get::<Option<Uuid>, _>(idx)).map(|v| Value::String(v.to_string()))
        }
        _ => opt(row.try_get::<Option<String>, _>(idx)).map(Value::String),
    }
    .unwrap_or(Value::Null)
}

fn opt<T>(result: Result<Option<T>, sqlx::Error>) -> Option<T> {
    result.ok().flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(SqlValue::from_json(&Value::Null), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&json!(7)), SqlValue::Int(7));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(
            SqlValue::from_json(&json!("hello")),
            SqlValue::Text("hello".to_string())
        );
    }

    #[test]
    fn test_from_json_nested_stays_json() {
        let nested = json!({"tags": ["a", "b"]});
        assert_eq!(SqlValue::from_json(&nested), SqlValue::Json(nested.clone()));
        assert_eq!(
            SqlValue::from_json(&json!([1, 2])),
            SqlValue::Json(json!([1, 2]))
        );
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(3i64), SqlValue::Int(3));
        assert_eq!(SqlValue::from(Option::<i64>::None), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("y")), SqlValue::Text("y".to_string()));
    }
}

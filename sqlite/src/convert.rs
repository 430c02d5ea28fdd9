//! Conversion between SQLite storage values and mapping values.
//!
//! Reading keeps values in their storage class, except where the declared
//! column type says more: `JSON` text becomes [`Value::Json`], integers in a
//! `BOOL` column become [`Value::Bool`] and `DECIMAL`/`NUMERIC` columns are
//! read as [`Value::Decimal`]. Dates and times are stored as text and stay
//! text; the temporal converters parse them against the model type.

use std::str::FromStr;

use rowbind_core::{ColumnDef, Row, TemporalTextConverter, Value, ValueType};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::error::{Result, SqliteError};

/// Maps a declared SQLite column type to a [`ValueType`].
///
/// Follows SQLite's affinity rules loosely: the first matching substring
/// wins, checked in the order below. Anything unrecognized (including
/// expression columns with no declared type) is [`ValueType::Any`].
///
/// | Declared type contains | Value type |
/// |---|---|
/// | `BOOL` | `Bool` |
/// | `DATETIME`, `TIMESTAMP` | `Timestamp` |
/// | `DATE` | `Date` |
/// | `TIME` | `Time` |
/// | `INT` | `I64` |
/// | `JSON` | `Json` |
/// | `CHAR`, `CLOB`, `TEXT` | `Text` |
/// | `BLOB` | `Bytes` |
/// | `DECIMAL`, `NUMERIC` | `Decimal` |
/// | `REAL`, `FLOA`, `DOUB` | `F64` |
pub fn declared_type(decl: Option<&str>) -> ValueType {
    let Some(decl) = decl else {
        return ValueType::Any;
    };
    let decl = decl.to_ascii_uppercase();
    let has = |needle: &str| decl.contains(needle);

    if has("BOOL") {
        ValueType::Bool
    } else if has("DATETIME") || has("TIMESTAMP") {
        ValueType::Timestamp
    } else if has("DATE") {
        ValueType::Date
    } else if has("TIME") {
        ValueType::Time
    } else if has("INT") {
        ValueType::I64
    } else if has("JSON") {
        ValueType::Json
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        ValueType::Text
    } else if has("BLOB") {
        ValueType::Bytes
    } else if has("DECIMAL") || has("NUMERIC") {
        ValueType::Decimal
    } else if has("REAL") || has("FLOA") || has("DOUB") {
        ValueType::F64
    } else {
        ValueType::Any
    }
}

/// Reads one result row into a [`Row`], naming and typing cells after
/// `columns`.
pub fn read_row(row: &rusqlite::Row<'_>, columns: &[ColumnDef]) -> Result<Row> {
    let mut out = Row::new();
    for (index, column) in columns.iter().enumerate() {
        let value = read_value(row.get_ref(index)?, &column.declared)
            .map_err(|reason| {
                SqliteError::ConversionError(format!("column '{}': {reason}", column.name))
            })?;
        out.set(&column.name, column.declared.clone(), value);
    }
    Ok(out)
}

fn read_value(raw: ValueRef<'_>, declared: &ValueType) -> std::result::Result<Value, String> {
    Ok(match (raw, declared) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(n), ValueType::Bool) => Value::Bool(n != 0),
        (ValueRef::Integer(n), ValueType::Decimal) => Value::Decimal(Decimal::from(n)),
        (ValueRef::Integer(n), _) => Value::I64(n),
        (ValueRef::Real(f), ValueType::Decimal) => Decimal::from_f64(f)
            .map(Value::Decimal)
            .ok_or_else(|| format!("{f} is not a decimal"))?,
        (ValueRef::Real(f), _) => Value::F64(f),
        (ValueRef::Text(bytes), declared) => {
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            match declared {
                ValueType::Json => Value::Json(text.to_string()),
                ValueType::Decimal => Decimal::from_str(text)
                    .map(Value::Decimal)
                    .map_err(|e| format!("'{text}': {e}"))?,
                _ => Value::Text(text.to_string()),
            }
        }
        (ValueRef::Blob(bytes), _) => Value::Bytes(bytes.to_vec()),
    })
}

/// Converts a row value into something SQLite can bind.
///
/// Temporal values are written as text in the formats the temporal
/// converters parse; lists and documents as JSON text; decimals as their
/// exact decimal string.
pub fn to_sql_value(value: &Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::I32(n) => SqlValue::Integer(i64::from(*n)),
        Value::I64(n) => SqlValue::Integer(*n),
        Value::F32(f) => SqlValue::Real(f64::from(*f)),
        Value::F64(f) => SqlValue::Real(*f),
        Value::Decimal(d) => SqlValue::Text(d.to_string()),
        Value::Text(s) | Value::Json(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Date(d) => {
            SqlValue::Text(d.format(TemporalTextConverter::DATE_FORMAT).to_string())
        }
        Value::Time(t) => {
            SqlValue::Text(t.format(TemporalTextConverter::TIME_FORMAT).to_string())
        }
        Value::Timestamp(ts) => {
            SqlValue::Text(ts.format(TemporalTextConverter::TIMESTAMP_FORMAT).to_string())
        }
        Value::List(_) | Value::Document(_) => SqlValue::Text(
            serde_json::to_string(&value.to_json())
                .map_err(|e| SqliteError::ConversionError(e.to_string()))?,
        ),
    })
}

/// Checks that a table or column name is safe to splice into SQL.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidIdentifier`] if the name is empty or
/// contains anything besides alphanumerics and underscores.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_affinity() {
        let cases = [
            (Some("INTEGER"), ValueType::I64),
            (Some("bigint"), ValueType::I64),
            (Some("BOOLEAN"), ValueType::Bool),
            (Some("DATETIME"), ValueType::Timestamp),
            (Some("TIMESTAMP"), ValueType::Timestamp),
            (Some("DATE"), ValueType::Date),
            (Some("TIME"), ValueType::Time),
            (Some("VARCHAR(40)"), ValueType::Text),
            (Some("TEXT"), ValueType::Text),
            (Some("JSON"), ValueType::Json),
            (Some("BLOB"), ValueType::Bytes),
            (Some("DECIMAL(10,2)"), ValueType::Decimal),
            (Some("DOUBLE PRECISION"), ValueType::F64),
            (Some("REAL"), ValueType::F64),
            (Some("WHATEVER"), ValueType::Any),
            (None, ValueType::Any),
        ];
        for (decl, expected) in cases {
            assert_eq!(declared_type(decl), expected, "{decl:?}");
        }
    }

    #[test]
    fn test_read_value_uses_declared_type() {
        assert_eq!(
            read_value(ValueRef::Integer(1), &ValueType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            read_value(ValueRef::Text(b"[1]"), &ValueType::Json).unwrap(),
            Value::Json("[1]".into())
        );
        assert_eq!(
            read_value(ValueRef::Text(b"12.50"), &ValueType::Decimal).unwrap(),
            Value::Decimal(Decimal::new(1250, 2))
        );
        assert_eq!(
            read_value(ValueRef::Text(b"2020-01-02"), &ValueType::Date).unwrap(),
            Value::Text("2020-01-02".into())
        );
        assert!(read_value(ValueRef::Text(b"abc"), &ValueType::Decimal).is_err());
    }

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value(&Value::Bool(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(
            to_sql_value(&Value::List(vec![Value::I64(1), Value::I64(2)])).unwrap(),
            SqlValue::Text("[1,2]".into())
        );
        assert_eq!(
            to_sql_value(&Value::Decimal(Decimal::new(1250, 2))).unwrap(),
            SqlValue::Text("12.50".into())
        );
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("user_2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("a-b").is_err());
    }
}

// fixtures/value.rs - Typed cell values for fixture rows
//
// A value is rendered two ways:
// - as a SQL literal, for INSERT based loading
// - as a field of PostgreSQL's COPY text format, for bulk loading

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single row of fixture data, one value per column.
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value as a SQL literal.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) if v.is_finite() => format!("{v:?}"),
            Value::Float(v) => format!("'{v}'"),
            Value::Decimal(v) => v.to_string(),
            Value::Text(v) => quote_literal(v),
            Value::Date(v) => format!("DATE '{}'", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => format!("TIMESTAMP '{}'", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Uuid(v) => format!("'{v}'"),
        }
    }

    /// Renders the value as one field of COPY text format.
    ///
    /// NULL is `\N`; backslash, tab, newline and carriage return are escaped.
    pub fn to_copy_text(&self) -> String {
        match self {
            Value::Null => "\\N".to_string(),
            Value::Bool(true) => "t".to_string(),
            Value::Bool(false) => "f".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) if v.is_nan() => "NaN".to_string(),
            Value::Float(v) if v.is_infinite() && *v > 0.0 => "Infinity".to_string(),
            Value::Float(v) if v.is_infinite() => "-Infinity".to_string(),
            Value::Float(v) => format!("{v:?}"),
            Value::Decimal(v) => v.to_string(),
            Value::Text(v) => escape_copy_text(v),
            Value::Date(v) => v.format("%Y-%m-%d").to_string(),
            Value::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::Uuid(v) => v.to_string(),
        }
    }
}

fn quote_literal(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn escape_copy_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders rows as a COPY text payload: tab separated fields, one line per row.
pub fn copy_text_payload<'a>(rows: impl IntoIterator<Item = &'a Row>) -> String {
    let mut payload = String::new();
    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if index > 0 {
                payload.push('\t');
            }
            payload.push_str(&value.to_copy_text());
        }
        payload.push('\n');
    }
    payload
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_literal_doubles_quotes() {
        assert_eq!(Value::from("O'Brien").to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn sql_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(Value::Int(-7).to_sql_literal(), "-7");
        assert_eq!(Value::Float(1.5).to_sql_literal(), "1.5");
        assert_eq!(Value::Float(f64::NAN).to_sql_literal(), "'NaN'");
        assert_eq!(Value::Decimal(Decimal::new(7999, 2)).to_sql_literal(), "79.99");

        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_sql_literal(), "DATE '2024-02-29'");
        let ts = date.and_hms_opt(13, 5, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_sql_literal(), "TIMESTAMP '2024-02-29 13:05:00'");
    }

    #[test]
    fn copy_text_escapes_control_characters() {
        let value = Value::from("a\tb\nc\\d");
        assert_eq!(value.to_copy_text(), "a\\tb\\nc\\\\d");
        assert_eq!(Value::Null.to_copy_text(), "\\N");
    }

    #[test]
    fn copy_payload_is_tab_separated() {
        let rows = vec![
            vec![Value::Int(1), Value::from("x"), Value::Bool(true)],
            vec![Value::Int(2), Value::Null, Value::Bool(false)],
        ];
        assert_eq!(copy_text_payload(&rows), "1\tx\tt\n2\t\\N\tf\n");
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }
}

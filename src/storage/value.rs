//! Field values
//!
//! `Value` is the dynamic form of a field used at the runtime's seams:
//! filters, `validate_field`, row decoding and SQL parameters. Generated
//! record structs hold typed fields and convert through [`FromValue`] and
//! `From<T> for Value`.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::schema::FieldType;

/// Storage format of date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format of date-time fields
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// =============================================================================
// Decimal storage
// =============================================================================

/// Digits before the point: enough for `Decimal::MAX`
const DECIMAL_INT_DIGITS: usize = 29;

/// Digits after the point: `Decimal`'s largest scale
const DECIMAL_FRAC_DIGITS: usize = 28;

/// Stored decimals are fixed-width text whose byte order is numeric order
///
/// `P` + 29 integer digits + `.` + 28 fraction digits for zero and up;
/// negative values start with `N` and carry the nines' complement of
/// every digit. SQLite compares, sorts and takes MIN/MAX on the raw
/// text without ever going through a float.
pub fn encode_decimal(value: Decimal) -> String {
    let negative = value.is_sign_negative() && !value.is_zero();
    let scale = value.scale();
    let magnitude = value.mantissa().unsigned_abs();
    let unit = 10u128.pow(scale);

    let fraction = if scale == 0 {
        String::new()
    } else {
        format!("{:0width$}", magnitude % unit, width = scale as usize)
    };
    let digits = format!(
        "{:0int$}{:0<frac$}",
        magnitude / unit,
        fraction,
        int = DECIMAL_INT_DIGITS,
        frac = DECIMAL_FRAC_DIGITS
    );

    let mut out = String::with_capacity(DECIMAL_INT_DIGITS + DECIMAL_FRAC_DIGITS + 2);
    out.push(if negative { 'N' } else { 'P' });
    for (i, c) in digits.chars().enumerate() {
        if i == DECIMAL_INT_DIGITS {
            out.push('.');
        }
        out.push(if negative { complement(c) } else { c });
    }
    out
}

/// Inverse of [`encode_decimal`]; None for any other text
pub fn decode_decimal(text: &str) -> Option<Decimal> {
    let (negative, body) = if let Some(body) = text.strip_prefix('P') {
        (false, body)
    } else if let Some(body) = text.strip_prefix('N') {
        (true, body)
    } else {
        return None;
    };
    let (int, frac) = body.split_once('.')?;
    if int.len() != DECIMAL_INT_DIGITS
        || frac.len() != DECIMAL_FRAC_DIGITS
        || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let restore = |part: &str| -> String {
        if negative {
            part.chars().map(complement).collect()
        } else {
            part.to_string()
        }
    };
    let int = restore(int);
    let frac = restore(frac);
    let frac = frac.trim_end_matches('0');

    let mantissa: i128 = format!("{}{}", int, frac).parse().ok()?;
    let mantissa = if negative { -mantissa } else { mantissa };
    Decimal::try_from_i128_with_scale(mantissa, frac.len() as u32).ok()
}

fn complement(digit: char) -> char {
    match digit.to_digit(10) {
        Some(d) => char::from(b'0' + (9 - d) as u8),
        None => digit,
    }
}

// =============================================================================
// Code
// =============================================================================

/// Identifier text: always trimmed and uppercased
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Code(String);

impl Code {
    pub fn new(value: impl AsRef<str>) -> Self {
        Code(value.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Code::new(s)
    }
}

impl From<String> for Code {
    fn from(s: String) -> Self {
        Code::new(s)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Code {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Code {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Value
// =============================================================================

/// A field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Code(Code),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Blob(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Code(_) => "code",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Blob(_) => "blob",
        }
    }

    /// Blank in the "required field" sense
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Code(c) => c.is_empty(),
            Value::Blob(b) => b.is_empty(),
            _ => false,
        }
    }

    /// The zero value of a type: what a FlowField holds over no rows
    pub fn zero(field_type: FieldType) -> Value {
        match field_type {
            FieldType::Text => Value::Text(String::new()),
            FieldType::Code => Value::Code(Code::default()),
            FieldType::Decimal => Value::Decimal(Decimal::ZERO),
            FieldType::Date => Value::Date(NaiveDate::default()),
            FieldType::DateTime => Value::DateTime(NaiveDateTime::default()),
            FieldType::Boolean => Value::Bool(false),
            FieldType::Integer | FieldType::Option => Value::Int(0),
            FieldType::Blob => Value::Blob(Vec::new()),
        }
    }

    /// Form written to a column
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Int(i) => SqlValue::Integer(*i),
            Value::Decimal(d) => SqlValue::Text(encode_decimal(*d)),
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Code(c) => SqlValue::Text(c.as_str().to_string()),
            Value::Date(d) => SqlValue::Text(d.format(DATE_FORMAT).to_string()),
            Value::DateTime(dt) => SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()),
            Value::Blob(b) => SqlValue::Blob(b.clone()),
        }
    }

    /// Decode a column read from storage
    pub fn from_sql(field: &str, field_type: FieldType, raw: ValueRef<'_>) -> Result<Value> {
        let value = match (field_type, raw) {
            (_, ValueRef::Null) => Value::zero(field_type),
            (FieldType::Boolean, ValueRef::Integer(i)) => Value::Bool(i != 0),
            (FieldType::Integer | FieldType::Option, ValueRef::Integer(i)) => Value::Int(i),
            (FieldType::Integer | FieldType::Option, ValueRef::Real(r)) => Value::Int(r as i64),
            (FieldType::Decimal, ValueRef::Integer(i)) => Value::Decimal(Decimal::from(i)),
            (FieldType::Decimal, ValueRef::Real(r)) => {
                Value::Decimal(Decimal::from_f64(r).unwrap_or_default())
            }
            (FieldType::Blob, ValueRef::Blob(b)) => Value::Blob(b.to_vec()),
            (FieldType::Decimal, ValueRef::Text(bytes)) if matches!(bytes.first(), Some(b'P' | b'N')) => {
                std::str::from_utf8(bytes)
                    .ok()
                    .and_then(decode_decimal)
                    .map(Value::Decimal)
                    .ok_or_else(|| Error::InvalidValue {
                        field: field.to_string(),
                        value: String::from_utf8_lossy(bytes).into_owned(),
                        reason: "not a stored decimal".to_string(),
                    })?
            }
            (_, ValueRef::Text(bytes)) => {
                let text = std::str::from_utf8(bytes).map_err(|e| Error::InvalidValue {
                    field: field.to_string(),
                    value: String::from_utf8_lossy(bytes).into_owned(),
                    reason: e.to_string(),
                })?;
                Value::parse_literal(field, field_type, &[], text)?
            }
            (_, other) => {
                return Err(Error::TypeMismatch {
                    field: field.to_string(),
                    expected: field_type.to_string(),
                    actual: format!("{:?}", other.data_type()),
                })
            }
        };
        Ok(value)
    }

    /// Parse text written by a user (filters, defaults, stored text) as `field_type`
    ///
    /// Option values accept a label (case-insensitive) or an index.
    pub fn parse_literal(
        field: &str,
        field_type: FieldType,
        options: &[&str],
        text: &str,
    ) -> Result<Value> {
        let invalid = |reason: &str| Error::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
            reason: reason.to_string(),
        };

        let value = match field_type {
            FieldType::Text => Value::Text(text.to_string()),
            FieldType::Code => Value::Code(Code::new(text)),
            FieldType::Decimal => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Value::Decimal(Decimal::ZERO)
                } else {
                    Decimal::from_str(trimmed)
                        .or_else(|_| Decimal::from_scientific(trimmed))
                        .map(Value::Decimal)
                        .map_err(|_| invalid("not a decimal number"))?
                }
            }
            FieldType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid("not an integer"))?,
            FieldType::Boolean => match text.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Bool(true),
                "false" | "no" | "0" | "" => Value::Bool(false),
                _ => return Err(invalid("not a boolean")),
            },
            FieldType::Date => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| invalid("expected YYYY-MM-DD"))?,
            FieldType::DateTime => parse_datetime(text.trim())
                .map(Value::DateTime)
                .ok_or_else(|| invalid("expected YYYY-MM-DD HH:MM:SS"))?,
            FieldType::Option => {
                let trimmed = text.trim();
                if let Ok(index) = trimmed.parse::<i64>() {
                    Value::Int(index)
                } else if let Some(index) = options
                    .iter()
                    .position(|o| o.trim().eq_ignore_ascii_case(trimmed))
                {
                    Value::Int(index as i64)
                } else {
                    return Err(invalid("not one of the field's options"));
                }
            }
            FieldType::Blob => Value::Blob(text.as_bytes().to_vec()),
        };
        Ok(value)
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Code(c) => f.write_str(c.as_str()),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Code> for Value {
    fn from(c: Code) -> Self {
        Value::Code(c)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

// =============================================================================
// Typed conversion
// =============================================================================

/// Conversion from a dynamic value into a typed record field
///
/// `Null` converts to the type's blank value; anything else of the wrong
/// shape is a `TypeMismatch`.
pub trait FromValue: Sized {
    fn from_value(field: &str, value: Value) -> Result<Self>;
}

fn mismatch(field: &str, expected: &str, value: &Value) -> Error {
    Error::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: value.type_name().to_string(),
    }
}

impl FromValue for String {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s),
            Value::Code(c) => Ok(c.into_string()),
            other => Err(mismatch(field, "text", &other)),
        }
    }
}

impl FromValue for Code {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Code::default()),
            Value::Text(s) => Ok(Code::new(s)),
            Value::Code(c) => Ok(c),
            other => Err(mismatch(field, "code", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Decimal::ZERO),
            Value::Decimal(d) => Ok(d),
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Text(s) => match Value::parse_literal(field, FieldType::Decimal, &[], &s)? {
                Value::Decimal(d) => Ok(d),
                other => Err(mismatch(field, "decimal", &other)),
            },
            other => Err(mismatch(field, "decimal", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(0),
            Value::Int(i) => Ok(i),
            other => Err(mismatch(field, "integer", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(field, "boolean", &other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(NaiveDate::default()),
            Value::Date(d) => Ok(d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::Text(s) => match Value::parse_literal(field, FieldType::Date, &[], &s)? {
                Value::Date(d) => Ok(d),
                other => Err(mismatch(field, "date", &other)),
            },
            other => Err(mismatch(field, "date", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(NaiveDateTime::default()),
            Value::DateTime(dt) => Ok(dt),
            Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default()),
            Value::Text(s) => match Value::parse_literal(field, FieldType::DateTime, &[], &s)? {
                Value::DateTime(dt) => Ok(dt),
                other => Err(mismatch(field, "datetime", &other)),
            },
            other => Err(mismatch(field, "datetime", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Blob(b) => Ok(b),
            other => Err(mismatch(field, "blob", &other)),
        }
    }
}

// =============================================================================
// Option fields
// =============================================================================

/// A generated option enum: labels in index order
pub trait OptionField: Copy + Default + 'static {
    const OPTIONS: &'static [&'static str];

    fn from_index(index: i64) -> Option<Self>;

    fn index(self) -> i64;

    fn label(self) -> &'static str {
        usize::try_from(self.index())
            .ok()
            .and_then(|i| Self::OPTIONS.get(i))
            .copied()
            .unwrap_or("")
    }

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::OPTIONS
            .iter()
            .position(|o| o.trim().eq_ignore_ascii_case(label))
            .and_then(|i| Self::from_index(i as i64))
    }
}

/// `FromValue` body shared by every generated option enum
pub fn option_from_value<E: OptionField>(field: &str, value: Value) -> Result<E> {
    let invalid = |value: String| Error::InvalidValue {
        field: field.to_string(),
        value,
        reason: format!("expected one of {:?}", E::OPTIONS),
    };
    match value {
        Value::Null => Ok(E::default()),
        Value::Int(i) => E::from_index(i).ok_or_else(|| invalid(i.to_string())),
        Value::Text(s) => E::from_label(&s).ok_or_else(|| invalid(s)),
        Value::Code(c) => E::from_label(c.as_str()).ok_or_else(|| invalid(c.into_string())),
        other => Err(mismatch(field, "option", &other)),
    }
}

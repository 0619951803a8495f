//! Validators coerce raw configuration values into typed values.
//!
//! A validator is a pure function `&Value -> Result<T, ValidationError>`
//! paired with a name. The name shows up in help output and is part of the
//! identity used to dedupe proxies, so two validators that behave
//! differently must not share a name.
//!
//! `null` handling is a per-validator decision: the built-ins reject it,
//! [`optional`] turns any validator into one that passes `null` through as
//! `None`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::errors::ValidationError;

type ValidateFn<T> = dyn Fn(&Value) -> Result<T, ValidationError> + Send + Sync;

/// A named coercion from a raw value to `T`.
pub struct Validator<T> {
    name: Arc<str>,
    func: Arc<ValidateFn<T>>,
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

impl<T> Validator<T> {
    /// Build a validator from a name and a coercion function.
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<T, ValidationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name shown in help output (`list_of_int` stays as is).
    pub fn type_name(&self) -> &str {
        self.name.strip_prefix("validate_").unwrap_or(&self.name)
    }

    pub fn validate(&self, raw: &Value) -> Result<T, ValidationError> {
        (self.func)(raw)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn validate_any(value: &Value) -> Result<Value, ValidationError> {
    Ok(value.clone())
}

pub fn validate_string(value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::Null => Err(ValidationError::new("Invalid string: null")),
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

/// Booleans, numbers (non-zero is true) and the usual string spellings.
pub fn validate_bool(value: &Value) -> Result<bool, ValidationError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(ValidationError::new(format!("Invalid bool: {s}"))),
        },
        Value::Array(items) => Ok(!items.is_empty()),
        Value::Object(map) => Ok(!map.is_empty()),
        Value::Null => Err(ValidationError::new("Invalid bool: null")),
    }
}

/// Integers, floats (truncated toward zero), booleans and numeric strings.
pub fn validate_int(value: &Value) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::new(format!("Invalid int: {}", describe(value)));
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(f.trunc() as i64)
                }
                _ => Err(invalid()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(invalid()),
    }
}

pub fn validate_float(value: &Value) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::new(format!("Invalid float: {}", describe(value)));
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => Err(invalid()),
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %I:%M:%S %p"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M", "%I:%M %p", "%H:%M:%S", "%I:%M:%S %p"];

fn expect_str<'a>(value: &'a Value, kind: &str) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .map(str::trim)
        .ok_or_else(|| ValidationError::new(format!("Invalid {kind} format: {}", describe(value))))
}

pub fn validate_datetime(value: &Value) -> Result<NaiveDateTime, ValidationError> {
    let s = expect_str(value, "date")?;
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(ValidationError::new(format!("Invalid date format: {s}")))
}

pub fn validate_date(value: &Value) -> Result<NaiveDate, ValidationError> {
    validate_datetime(value).map(|dt| dt.date())
}

pub fn validate_time(value: &Value) -> Result<NaiveTime, ValidationError> {
    let s = expect_str(value, "time")?;
    // "5 PM": chrono needs a minute field, so give it one.
    if let Some((hour, meridiem)) = s.split_once(char::is_whitespace) {
        if !hour.is_empty() && hour.chars().all(|c| c.is_ascii_digit()) {
            let padded = format!("{hour}:00 {}", meridiem.trim());
            if let Ok(t) = NaiveTime::parse_from_str(&padded, "%I:%M %p") {
                return Ok(t);
            }
        }
    }
    for format in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    Err(ValidationError::new(format!("Invalid time format: {s}")))
}

/// Arrays only; a string is not treated as a sequence of characters.
pub fn validate_list(value: &Value) -> Result<Vec<Value>, ValidationError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => Err(ValidationError::new(format!(
            "Invalid iterable of type(str): {s}"
        ))),
        other => Err(ValidationError::new(format!("Invalid iterable: {other}"))),
    }
}

pub fn validate_regex(value: &Value) -> Result<::regex::Regex, ValidationError> {
    let pattern = value
        .as_str()
        .ok_or_else(|| ValidationError::new(format!("Invalid regex: {}", describe(value))))?;
    ::regex::Regex::new(pattern)
        .map_err(|e| ValidationError::new(format!("Invalid regex: {e}, {pattern}")))
}

/// Accepts both `tracing` names and the classic `WARNING`/`CRITICAL` spellings.
pub fn validate_log_level(value: &Value) -> Result<tracing::Level, ValidationError> {
    let unknown = || ValidationError::new(format!("Unknown log level: {}", describe(value)));
    let name = value.as_str().ok_or_else(unknown)?;
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" | "WARNING" => Ok(tracing::Level::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(tracing::Level::ERROR),
        _ => Err(unknown()),
    }
}

pub fn any() -> Validator<Value> {
    Validator::new("validate_any", validate_any)
}

pub fn string() -> Validator<String> {
    Validator::new("validate_string", validate_string)
}

pub fn boolean() -> Validator<bool> {
    Validator::new("validate_bool", validate_bool)
}

pub fn int() -> Validator<i64> {
    Validator::new("validate_int", validate_int)
}

pub fn float() -> Validator<f64> {
    Validator::new("validate_float", validate_float)
}

pub fn date() -> Validator<NaiveDate> {
    Validator::new("validate_date", validate_date)
}

pub fn datetime() -> Validator<NaiveDateTime> {
    Validator::new("validate_datetime", validate_datetime)
}

pub fn time() -> Validator<NaiveTime> {
    Validator::new("validate_time", validate_time)
}

pub fn list() -> Validator<Vec<Value>> {
    Validator::new("validate_list", validate_list)
}

pub fn regex() -> Validator<::regex::Regex> {
    Validator::new("validate_regex", validate_regex)
}

pub fn log_level() -> Validator<tracing::Level> {
    Validator::new("validate_log_level", validate_log_level)
}

/// A list whose items are each validated with `item`.
pub fn list_of<T: 'static>(item: Validator<T>) -> Validator<Vec<T>> {
    let name = format!("list_of_{}", item.type_name());
    Validator::new(name, move |value| {
        validate_list(value)?
            .iter()
            .map(|raw| item.validate(raw))
            .collect()
    })
}

/// Like [`list_of`], collapsing duplicates.
pub fn set_of<T: Ord + 'static>(item: Validator<T>) -> Validator<BTreeSet<T>> {
    let name = format!("set_of_{}", item.type_name());
    Validator::new(name, move |value| {
        validate_list(value)?
            .iter()
            .map(|raw| item.validate(raw))
            .collect()
    })
}

/// A mapping from an object, or from a list of `[key, value]` pairs.
pub fn map_of<T: 'static>(item: Validator<T>) -> Validator<BTreeMap<String, T>> {
    let name = format!("map_of_{}", item.type_name());
    Validator::new(name, move |value| match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| -> Result<(String, T), ValidationError> {
                Ok((k.clone(), item.validate(v)?))
            })
            .collect(),
        Value::Array(pairs) => pairs
            .iter()
            .map(|pair| -> Result<(String, T), ValidationError> {
                match pair.as_array().map(Vec::as_slice) {
                    Some([k, v]) => Ok((validate_string(k)?, item.validate(v)?)),
                    _ => Err(ValidationError::new(format!("Invalid mapping pair: {pair}"))),
                }
            })
            .collect(),
        other => Err(ValidationError::new(format!("Invalid mapping: {other}"))),
    })
}

/// Pass `null` through as `None`, validate anything else with `inner`.
pub fn optional<T: 'static>(inner: Validator<T>) -> Validator<Option<T>> {
    let name = format!("optional_{}", inner.type_name());
    Validator::new(name, move |value| match value {
        Value::Null => Ok(None),
        other => inner.validate(other).map(Some),
    })
}

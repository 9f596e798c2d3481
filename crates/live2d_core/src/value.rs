//! Method-call values crossing the host channel
//!
//! The host's message codec decodes call arguments into a string-keyed map
//! of dynamic values. Platform glue hands that map over as JSON; this module
//! turns it into typed accessors that produce `InvalidArgument` errors
//! naming the offending field.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::router::Ack;

/// Dynamic argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Explicit null (treated like an absent argument)
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (host ints arrive as 64-bit)
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Lists and maps, kept as encoded JSON
    Json(String),
}

impl ArgValue {
    /// Extract as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as float, widening integers
    ///
    /// Hosts often send `2` rather than `2.0` for whole numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Float(v) => Some(*v),
            ArgValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Extract as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "Null",
            ArgValue::Bool(_) => "Bool",
            ArgValue::Int(_) => "Int",
            ArgValue::Float(_) => "Float",
            ArgValue::String(_) => "String",
            ArgValue::Json(_) => "Json",
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ArgValue::Int(i),
                None => ArgValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ArgValue::String(s),
            other => ArgValue::Json(other.to_string()),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::String(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::String(v)
    }
}

/// Named arguments of one method call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodArgs {
    values: HashMap<String, ArgValue>,
}

impl MethodArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: &str, value: impl Into<ArgValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<ArgValue>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Decode the JSON the platform glue forwards
    ///
    /// An empty string or `null` means "no arguments". Anything other than an
    /// object is rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| BridgeError::invalid("arguments", format!("malformed JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Convert an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self {
                values: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            }),
            other => Err(BridgeError::invalid(
                "arguments",
                format!("expected a map, got {}", ArgValue::from(other).type_name()),
            )),
        }
    }

    /// Look up an argument; explicit null counts as absent
    pub fn get(&self, field: &str) -> Option<&ArgValue> {
        self.values.get(field).filter(|v| **v != ArgValue::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn required_str(&self, field: &'static str) -> Result<&str> {
        let value = self.get(field).ok_or_else(|| BridgeError::missing(field))?;
        value.as_str().ok_or_else(|| mismatch(field, "String", value))
    }

    /// Required string that must not be empty
    pub fn required_non_empty_str(&self, field: &'static str) -> Result<&str> {
        let s = self.required_str(field)?;
        if s.is_empty() {
            return Err(BridgeError::invalid(field, "must not be empty"));
        }
        Ok(s)
    }

    pub fn required_f64(&self, field: &'static str) -> Result<f64> {
        let value = self.get(field).ok_or_else(|| BridgeError::missing(field))?;
        value.as_f64().ok_or_else(|| mismatch(field, "Float", value))
    }

    pub fn required_i64(&self, field: &'static str) -> Result<i64> {
        let value = self.get(field).ok_or_else(|| BridgeError::missing(field))?;
        value.as_i64().ok_or_else(|| mismatch(field, "Int", value))
    }

    /// Optional integer; present-but-mistyped is still an error
    pub fn optional_i64(&self, field: &'static str) -> Result<Option<i64>> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| mismatch(field, "Int", value)),
        }
    }
}

fn mismatch(field: &'static str, expected: &str, actual: &ArgValue) -> BridgeError {
    BridgeError::invalid(
        field,
        format!("expected {}, got {}", expected, actual.type_name()),
    )
}

/// A control-plane call: method name plus arguments
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub args: MethodArgs,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, args: MethodArgs) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Build from a method name and JSON-encoded arguments
    pub fn from_json(method: impl Into<String>, args_json: &str) -> Result<Self> {
        Ok(Self::new(method, MethodArgs::from_json(args_json)?))
    }
}

/// Outcome reported back through the host channel
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    /// `result.success(null)`
    Success,
    /// `result.error(code, message, null)`
    Error { code: String, message: String },
    /// `result.notImplemented()`
    NotImplemented,
}

impl MethodResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success)
    }

    /// Encode for the platform glue
    ///
    /// ```json
    /// { "success": true, "value": null }
    /// { "success": false, "errorType": "...", "errorMessage": "..." }
    /// { "success": false, "notImplemented": true }
    /// ```
    pub fn to_json(&self) -> String {
        let value = match self {
            MethodResult::Success => json!({ "success": true, "value": null }),
            MethodResult::Error { code, message } => json!({
                "success": false,
                "errorType": code,
                "errorMessage": message,
            }),
            MethodResult::NotImplemented => json!({ "success": false, "notImplemented": true }),
        };
        value.to_string()
    }
}

impl From<Result<Ack>> for MethodResult {
    fn from(result: Result<Ack>) -> Self {
        match result {
            Ok(_) => MethodResult::Success,
            Err(BridgeError::NotImplemented(_)) => MethodResult::NotImplemented,
            Err(e) => MethodResult::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

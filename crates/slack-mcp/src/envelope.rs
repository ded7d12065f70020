//! Uniform result envelope and raw Slack response handling.
//!
//! Every gateway operation returns an [`Envelope`], which serializes as either
//! `{"success": true, ...fields}` or `{"success": false, "error": ..., "details": ...}`.
//! Raw Slack responses arrive as a [`RemoteResult`], a loosely typed JSON object
//! that is normalized once via [`RemoteResult::into_payload`] and then decoded
//! into typed records.

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Failure half of an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Error code or description. Slack error codes are forwarded verbatim.
    pub error: String,

    /// Raw remote response, attached for diagnosis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Failure {
    /// Create a failure without details.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Attach diagnostic details.
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Result of a public gateway operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The operation succeeded.
    Ok(T),
    /// The operation failed; no partial result is returned.
    Fail(Failure),
}

impl<T> Envelope<T> {
    /// Whether this is the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Ok(_))
    }

    /// Borrow the success payload.
    pub fn ok(&self) -> Option<&T> {
        match self {
            Envelope::Ok(value) => Some(value),
            Envelope::Fail(_) => None,
        }
    }

    /// Borrow the failure.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Envelope::Ok(_) => None,
            Envelope::Fail(failure) => Some(failure),
        }
    }

    /// Convert into a `Result` for `?`-style composition.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Envelope::Ok(value) => Ok(value),
            Envelope::Fail(failure) => Err(failure),
        }
    }

    /// Map the success payload.
    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Envelope::Ok(value) => Envelope::Ok(f(value)),
            Envelope::Fail(failure) => Envelope::Fail(failure),
        }
    }
}

impl<T> From<Result<T, Failure>> for Envelope<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Envelope::Ok(value),
            Err(failure) => Envelope::Fail(failure),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Tagged<'a, B: Serialize> {
            success: bool,
            #[serde(flatten)]
            body: &'a B,
        }

        match self {
            Envelope::Ok(body) => Tagged {
                success: true,
                body,
            }
            .serialize(serializer),
            Envelope::Fail(body) => Tagged {
                success: false,
                body,
            }
            .serialize(serializer),
        }
    }
}

/// One decoded Slack Web API response, shaped at least as `{ok, error?, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RemoteResult(Map<String, Value>);

impl RemoteResult {
    /// Wrap a decoded response body.
    ///
    /// Slack always answers with a JSON object; anything else is recorded as
    /// an `invalid_response` failure carrying the original body.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("ok".to_string(), Value::Bool(false));
                map.insert(
                    "error".to_string(),
                    Value::String("invalid_response".to_string()),
                );
                map.insert("body".to_string(), other);
                Self(map)
            }
        }
    }

    /// Build the `{ok: false, error}` shape used for local and transport failures.
    pub fn failure(error: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("ok".to_string(), Value::Bool(false));
        map.insert("error".to_string(), Value::String(error.into()));
        Self(map)
    }

    /// Whether Slack reported `ok: true`. A missing flag counts as failure.
    pub fn is_ok(&self) -> bool {
        self.0.get("ok").and_then(Value::as_bool).unwrap_or(false)
    }

    /// The `error` string, if any.
    pub fn error(&self) -> Option<&str> {
        self.str_field("error")
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a top-level string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Unwrap into the raw JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Normalize: `ok: true` passes the payload through, anything else becomes
    /// a [`Failure`] whose error is Slack's error (or `fallback`) and whose
    /// details are the full response.
    pub fn into_payload(self, fallback: &str) -> Result<Self, Failure> {
        if self.is_ok() {
            return Ok(self);
        }

        let error = self.error().unwrap_or(fallback).to_string();
        Err(Failure::new(error).with_details(self.into_value()))
    }

    /// Decode the payload into a typed shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Failure> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            Failure::new(format!("invalid_response: {}", e))
                .with_details(Value::Object(self.0.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Posted {
        timestamp: String,
    }

    #[test]
    fn test_ok_envelope_flattens_fields() {
        let envelope = Envelope::Ok(Posted {
            timestamp: "1700000000.000100".to_string(),
        });

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "timestamp": "1700000000.000100"})
        );
    }

    #[test]
    fn test_fail_envelope_shape() {
        let envelope: Envelope<Posted> = Envelope::Fail(
            Failure::new("channel_not_found").with_details(json!({"ok": false})),
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "channel_not_found", "details": {"ok": false}})
        );
    }

    #[test]
    fn test_fail_envelope_omits_missing_details() {
        let envelope: Envelope<Posted> = Envelope::Fail(Failure::new("boom"));
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("details").is_none());
    }

    #[test]
    fn test_into_payload_forwards_remote_error() {
        let remote = RemoteResult::from_value(json!({"ok": false, "error": "not_in_channel"}));
        let failure = remote.into_payload("fallback").unwrap_err();

        assert_eq!(failure.error, "not_in_channel");
        assert_eq!(
            failure.details,
            Some(json!({"ok": false, "error": "not_in_channel"}))
        );
    }

    #[test]
    fn test_into_payload_uses_fallback() {
        let remote = RemoteResult::from_value(json!({"ok": false}));
        let failure = remote.into_payload("Could not list users").unwrap_err();
        assert_eq!(failure.error, "Could not list users");
    }

    #[test]
    fn test_missing_ok_flag_is_failure() {
        let remote = RemoteResult::from_value(json!({"channels": []}));
        assert!(!remote.is_ok());
    }

    #[test]
    fn test_non_object_body() {
        let remote = RemoteResult::from_value(json!("upstream said hi"));
        assert!(!remote.is_ok());
        assert_eq!(remote.error(), Some("invalid_response"));
    }

    #[test]
    fn test_decode_mismatch_is_failure() {
        #[derive(Debug, Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            channel: String,
        }

        let remote = RemoteResult::from_value(json!({"ok": true, "channel": 42}));
        let failure = remote.decode::<Shape>().unwrap_err();
        assert!(failure.error.starts_with("invalid_response"));
        assert!(failure.details.is_some());
    }

    #[test]
    fn test_envelope_from_result() {
        let envelope: Envelope<u32> = Err(Failure::new("nope")).into();
        assert!(!envelope.is_success());
        assert_eq!(envelope.failure().map(|f| f.error.as_str()), Some("nope"));

        let envelope: Envelope<u32> = Ok(3).into();
        assert_eq!(envelope.map(|n| n * 2).ok(), Some(&6));
    }
}

//! Best-effort decoding of planner responses.
//!
//! The backend is untrusted: its body may be empty, not JSON at all, a bare
//! payload object, or a payload nested in a workflow envelope. Everything is
//! resolved here, once, into [`BackendResponse`] so nothing downstream pokes
//! at optional fields of an unknown shape.
use serde_json::{Map, Value};

/// Outcome of decoding one body. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    /// The body was not JSON; keep what arrived and why it failed.
    Raw { raw: String, parse_error: String },
}

/// Decode a response body that has already been read (once) as text.
///
/// The declared content type is not consulted: an empty body is `{}`,
/// anything else is tried as JSON, and a failure yields [`Decoded::Raw`].
///
/// ```
/// use wayfinder_planner::decode::{decode_body, Decoded};
///
/// assert_eq!(decode_body(""), Decoded::Json(serde_json::json!({})));
/// assert!(matches!(decode_body("not json"), Decoded::Raw { .. }));
/// ```
pub fn decode_body(text: &str) -> Decoded {
    if text.is_empty() {
        return Decoded::Json(Value::Object(Map::new()));
    }
    match serde_json::from_str::<Value>(text) {
        Ok(v) => Decoded::Json(v),
        Err(e) => Decoded::Raw {
            raw: text.to_string(),
            parse_error: e.to_string(),
        },
    }
}

/// The planner's answer, discriminated once.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    /// A payload used as-is.
    Direct(Value),
    /// A payload lifted out of `[0].response.body`.
    Wrapped(Value),
    /// The body could not be parsed as JSON.
    RawText { raw: String, parse_error: String },
    /// Transport failure, or a body whose `error` field is set.
    Error(String),
}

impl BackendResponse {
    /// Classify a decoded body.
    ///
    /// A top-level truthy `error` field wins over everything else. Only the
    /// `[0].response.body` envelope is unwrapped, and only when that body is
    /// truthy; any other array is passed through as a direct payload.
    pub fn from_decoded(decoded: Decoded) -> Self {
        let value = match decoded {
            Decoded::Raw { raw, parse_error } => {
                return BackendResponse::RawText { raw, parse_error };
            }
            Decoded::Json(v) => v,
        };

        if let Some(err) = value.get("error").filter(|e| truthy(e)) {
            let message = match err {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return BackendResponse::Error(message);
        }

        let envelope_body = value
            .get(0)
            .and_then(|first| first.get("response"))
            .and_then(|resp| resp.get("body"))
            .filter(|body| truthy(body));
        match envelope_body {
            Some(body) => BackendResponse::Wrapped(body.clone()),
            None => BackendResponse::Direct(value),
        }
    }

    pub fn transport_error(message: impl Into<String>) -> Self {
        BackendResponse::Error(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BackendResponse::Direct(_) => "direct",
            BackendResponse::Wrapped(_) => "wrapped",
            BackendResponse::RawText { .. } => "raw_text",
            BackendResponse::Error(_) => "error",
        }
    }
}

/// JavaScript-style truthiness, which is what the webhook contract was written against.
pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(decode_body(""), Decoded::Json(json!({})));
    }

    #[test]
    fn non_json_keeps_raw_text_and_reason() {
        match decode_body("not json") {
            Decoded::Raw { raw, parse_error } => {
                assert_eq!(raw, "not json");
                assert!(!parse_error.is_empty());
            }
            other => panic!("expected raw, got {other:?}"),
        }
    }

    #[test]
    fn json_is_parsed_regardless_of_shape() {
        assert_eq!(decode_body("[1,2]"), Decoded::Json(json!([1, 2])));
        assert_eq!(decode_body("\"hi\""), Decoded::Json(json!("hi")));
    }

    #[test]
    fn envelope_is_unwrapped_one_level() {
        let body = json!({ "itinerary": [], "time_of_day": "Evening" });
        let wrapped = json!([{ "response": { "body": body.clone(), "headers": {} } }]);
        assert_eq!(
            BackendResponse::from_decoded(Decoded::Json(wrapped)),
            BackendResponse::Wrapped(body)
        );
    }

    #[test]
    fn falsy_envelope_body_falls_back_to_the_whole_value() {
        let v = json!([{ "response": { "body": "" } }]);
        assert_eq!(
            BackendResponse::from_decoded(Decoded::Json(v.clone())),
            BackendResponse::Direct(v)
        );
    }

    #[test]
    fn error_field_marks_an_error() {
        let r = BackendResponse::from_decoded(Decoded::Json(json!({ "error": "quota" })));
        assert_eq!(r, BackendResponse::Error("quota".into()));

        let ok = BackendResponse::from_decoded(Decoded::Json(json!({ "error": null, "itinerary": [] })));
        assert!(matches!(ok, BackendResponse::Direct(_)));
    }

    #[test]
    fn raw_text_carries_through() {
        let r = BackendResponse::from_decoded(decode_body("<html>502</html>"));
        assert_eq!(r.kind(), "raw_text");
        assert!(matches!(r, BackendResponse::RawText { ref raw, .. } if raw == "<html>502</html>"));
    }
}

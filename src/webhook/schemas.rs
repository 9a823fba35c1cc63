//! # Webhook Schemas
//!
//! Wire format of the inbound webhook body and its validation into a
//! [`NewMessage`](crate::models::message::NewMessage).
//!
//! ```json
//! {"message_id": "m1", "from": "+919876543210", "to": "+14155550100",
//!  "ts": "2025-01-15T10:00:00Z", "text": "Hello"}
//! ```

use crate::{consts, models};
use derive_more::{Display, Error};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// `+` followed by ASCII digits only
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+[0-9]+$").unwrap());

/// Raw webhook body. Every field is optional here so that a missing field
/// is reported as such instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub message_id: Option<String>,
    #[serde(rename = "from")]
    pub from_msisdn: Option<String>,
    #[serde(rename = "to")]
    pub to_msisdn: Option<String>,
    pub ts: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[display("malformed body: {_0}")]
    MalformedBody(#[error(not(source))] String),
    #[display("body exceeds {max} bytes")]
    BodyTooLarge { max: usize },
    #[display("field '{_0}' is required")]
    MissingField(#[error(not(source))] &'static str),
    #[display("field '{_0}' must not be empty")]
    EmptyField(#[error(not(source))] &'static str),
    #[display("field '{field}' exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[display("field '{_0}' must match ^\\+\\d+$")]
    InvalidPhoneFormat(#[error(not(source))] &'static str),
}

impl ValidationError {
    /// Name of the offending field, if the error is about a single field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MalformedBody(_) | Self::BodyTooLarge { .. } => None,
            Self::MissingField(field)
            | Self::EmptyField(field)
            | Self::InvalidPhoneFormat(field) => Some(field),
            Self::FieldTooLong { field, .. } => Some(field),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

fn phone(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = required(value, field)?;
    if !PHONE_RE.is_match(&value) {
        return Err(ValidationError::InvalidPhoneFormat(field));
    }
    Ok(value)
}

impl WebhookPayload {
    /// Checks field presence, formats and lengths
    pub fn into_new_message(self) -> Result<models::message::NewMessage, ValidationError> {
        let message_id = required(self.message_id, "message_id")?;
        if message_id.is_empty() {
            return Err(ValidationError::EmptyField("message_id"));
        }

        let from_msisdn = phone(self.from_msisdn, "from")?;
        let to_msisdn = phone(self.to_msisdn, "to")?;
        let ts = required(self.ts, "ts")?;

        // characters, not bytes
        if self
            .text
            .as_ref()
            .is_some_and(|text| text.chars().count() > consts::TEXT_MAX_CHARS)
        {
            return Err(ValidationError::FieldTooLong {
                field: "text",
                max: consts::TEXT_MAX_CHARS,
            });
        }

        Ok(models::message::NewMessage {
            message_id,
            from_msisdn,
            to_msisdn,
            ts,
            text: self.text,
        })
    }
}

/// Parses and validates a raw webhook body
pub fn validate(raw_body: &[u8]) -> Result<models::message::NewMessage, ValidationError> {
    serde_json::from_slice::<WebhookPayload>(raw_body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?
        .into_new_message()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn valid_payload() -> serde_json::Value {
        json!({
            "message_id": "m_test_1",
            "from": "+919876543210",
            "to": "+14155550100",
            "ts": "2025-01-15T10:00:00Z",
            "text": "Hello Test"
        })
    }

    #[test]
    fn test_validate_valid_payload() {
        let message = validate(&body(valid_payload())).unwrap();

        assert_eq!(message.message_id, "m_test_1");
        assert_eq!(message.from_msisdn, "+919876543210");
        assert_eq!(message.to_msisdn, "+14155550100");
        assert_eq!(message.ts, "2025-01-15T10:00:00Z");
        assert_eq!(message.text.as_deref(), Some("Hello Test"));
    }

    #[test]
    fn test_validate_text_is_optional() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("text");
        assert!(validate(&body(payload)).unwrap().text.is_none());

        let mut payload = valid_payload();
        payload["text"] = serde_json::Value::Null;
        assert!(validate(&body(payload)).unwrap().text.is_none());
    }

    #[test]
    fn test_validate_malformed_body() {
        assert!(matches!(
            validate(b"not json"),
            Err(ValidationError::MalformedBody(_))
        ));
        assert!(matches!(
            validate(b"[1,2,3]"),
            Err(ValidationError::MalformedBody(_))
        ));

        let mut payload = valid_payload();
        payload["message_id"] = json!(42);
        assert!(matches!(
            validate(&body(payload)),
            Err(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_validate_missing_fields() {
        for field in ["message_id", "from", "to", "ts"] {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(field);

            let err = validate(&body(payload)).unwrap_err();
            assert_eq!(err, ValidationError::MissingField(field));
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_validate_empty_message_id() {
        let mut payload = valid_payload();
        payload["message_id"] = json!("");

        assert_eq!(
            validate(&body(payload)),
            Err(ValidationError::EmptyField("message_id"))
        );
    }

    #[test]
    fn test_validate_invalid_phone_format() {
        for bad in ["919876543210", "+", "+91 98765", "+91-987", "abc", "+٣٤٥", "+123\n"] {
            let mut payload = valid_payload();
            payload["from"] = json!(bad);
            assert_eq!(
                validate(&body(payload)),
                Err(ValidationError::InvalidPhoneFormat("from")),
                "from={bad:?}"
            );

            let mut payload = valid_payload();
            payload["to"] = json!(bad);
            assert_eq!(
                validate(&body(payload)),
                Err(ValidationError::InvalidPhoneFormat("to")),
                "to={bad:?}"
            );
        }
    }

    #[test]
    fn test_validate_text_length_boundary() {
        let mut payload = valid_payload();
        payload["text"] = json!("a".repeat(4096));
        assert!(validate(&body(payload)).is_ok());

        let mut payload = valid_payload();
        payload["text"] = json!("a".repeat(4097));
        assert_eq!(
            validate(&body(payload)),
            Err(ValidationError::FieldTooLong {
                field: "text",
                max: 4096
            })
        );
    }

    #[test]
    fn test_validate_text_length_counts_characters() {
        let mut payload = valid_payload();
        payload["text"] = json!("é".repeat(4096));

        assert!(validate(&body(payload)).is_ok());
    }
}

use serde::{Deserialize, Serialize};

use crate::constants::EventKind;

/// Errors raised while building or reading a [`Frame`].
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("event {0} requires a payload")]
    MissingPayload(EventKind),

    #[error("unexpected event: {0}")]
    UnexpectedEvent(EventKind),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Envelope for every message on the distribution channel.
///
/// The `data` field uses `serde_json::value::RawValue` so the payload is only
/// decoded once the event name says what it should contain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<serde_json::value::RawValue>>,
}

impl Frame {
    /// Creates a frame for the given event and optional payload.
    pub fn new<T: Serialize>(kind: EventKind, data: Option<&T>) -> Result<Self, FrameError> {
        let raw = match data {
            Some(d) => {
                let json = serde_json::to_string(d)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            event: kind.as_str().to_string(),
            data: raw,
        })
    }

    /// Resolves the event name.
    pub fn kind(&self) -> Result<EventKind, FrameError> {
        EventKind::from_name(&self.event).ok_or_else(|| FrameError::UnknownEvent(self.event.clone()))
    }

    /// Deserializes the payload into the given type.
    pub fn parse_data<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, FrameError> {
        match &self.data {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Like [`parse_data`](Self::parse_data), but a missing payload is an error.
    pub fn require_data<T: for<'de> Deserialize<'de>>(&self) -> Result<T, FrameError> {
        let kind = self.kind()?;
        self.parse_data()?.ok_or(FrameError::MissingPayload(kind))
    }

    /// Serializes the frame to its JSON text form.
    pub fn to_text(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ConfigChange, ErrorPayload};

    #[test]
    fn frame_new_with_payload() {
        let frame = Frame::new(EventKind::Auth, Some(&"s3cret")).unwrap();
        assert_eq!(frame.event, "auth");
        assert_eq!(frame.data.as_ref().unwrap().get(), "\"s3cret\"");
    }

    #[test]
    fn frame_without_payload_omits_data() {
        let frame = Frame::new::<()>(EventKind::Accept, None).unwrap();
        let json = frame.to_text().unwrap();
        assert_eq!(json, r#"{"event":"accept"}"#);
    }

    #[test]
    fn parse_error_payload() {
        let frame: Frame =
            serde_json::from_str(r#"{"event":"error","data":{"message":"boom"}}"#).unwrap();
        assert_eq!(frame.kind().unwrap(), EventKind::Error);
        let payload: ErrorPayload = frame.require_data().unwrap();
        assert_eq!(payload.message, "boom");
    }

    #[test]
    fn parse_change_payload() {
        let frame: Frame = serde_json::from_str(
            r#"{"event":"change","data":{"key":"theme","value":"light"}}"#,
        )
        .unwrap();
        let change: ConfigChange = frame.require_data().unwrap();
        assert_eq!(change.key, "theme");
        assert_eq!(change.value, serde_json::json!("light"));
    }

    #[test]
    fn unknown_event_is_reported() {
        let frame: Frame = serde_json::from_str(r#"{"event":"hello"}"#).unwrap();
        assert!(matches!(frame.kind(), Err(FrameError::UnknownEvent(name)) if name == "hello"));
    }

    #[test]
    fn missing_payload_is_reported() {
        let frame: Frame = serde_json::from_str(r#"{"event":"config"}"#).unwrap();
        let err = frame
            .require_data::<serde_json::Map<String, serde_json::Value>>()
            .unwrap_err();
        assert_eq!(err.to_string(), "event config requires a payload");
    }

    #[test]
    fn token_is_forwarded_verbatim() {
        let token = serde_json::json!({"user": "root", "hash": [1, 2, 3]});
        let frame = Frame::new(EventKind::Auth, Some(&token)).unwrap();
        let back: serde_json::Value = frame.require_data().unwrap();
        assert_eq!(back, token);
    }
}

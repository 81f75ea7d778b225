//! Wire message types shared by the server and its clients

use crate::error::ProtocolViolation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host the server binds and clients dial
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the server binds and clients dial
pub const DEFAULT_PORT: u16 = 5555;

/// Request/response selector carried in every message header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    LogMeIn = 0,
    LogOut = 1,
    GetRaport = 2,
    ForceCleaning = 3,
    GetRecommendations = 4,
}

impl MessageKind {
    pub const ALL: [MessageKind; 5] = [
        MessageKind::LogMeIn,
        MessageKind::LogOut,
        MessageKind::GetRaport,
        MessageKind::ForceCleaning,
        MessageKind::GetRecommendations,
    ];

    /// Numeric header used on the wire
    pub fn header(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::LogMeIn => "LOG_ME_IN",
            MessageKind::LogOut => "LOG_OUT",
            MessageKind::GetRaport => "GET_RAPORT",
            MessageKind::ForceCleaning => "FORCE_CLEANING",
            MessageKind::GetRecommendations => "GET_RECOMMENDATIONS",
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolViolation;

    fn try_from(header: u8) -> Result<Self, Self::Error> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.header() == header)
            .ok_or(ProtocolViolation::UnknownHeader(header))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request or response frame
///
/// The header stays a raw byte so that frames with unknown headers still
/// decode and can be answered with an error before the session closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub header: u8,
    #[serde(default)]
    pub text: String,
}

impl Message {
    pub fn new(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            header: kind.header(),
            text: text.into(),
        }
    }

    /// Decode the header into a known kind
    pub fn kind(&self) -> Result<MessageKind, ProtocolViolation> {
        MessageKind::try_from(self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_distinct_and_decode() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::try_from(kind.header()), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_header_rejected() {
        assert_eq!(
            MessageKind::try_from(99),
            Err(ProtocolViolation::UnknownHeader(99))
        );
    }

    #[test]
    fn test_message_json_shape() {
        let message = Message::new("hello", MessageKind::ForceCleaning);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["header"], 3);
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_message_missing_text_defaults_empty() {
        let message: Message = serde_json::from_str(r#"{"header": 2}"#).unwrap();
        assert_eq!(message.kind(), Ok(MessageKind::GetRaport));
        assert!(message.text.is_empty());
    }

    #[test]
    fn test_display_uses_wire_names() {
        assert_eq!(MessageKind::GetRecommendations.to_string(), "GET_RECOMMENDATIONS");
        assert_eq!(MessageKind::LogMeIn.to_string(), "LOG_ME_IN");
    }
}

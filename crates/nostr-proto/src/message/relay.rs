// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Messages sent by relays, received by clients

use serde_json::{json, Value};

use super::{MessageError, SubscriptionId};
use crate::{Event, EventId};

/// Messages sent by relays, received by clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event>]` (NIP-01)
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// `["OK", <event_id>, <true|false>, <message>]` (NIP-01)
    Ok {
        /// Event ID
        event_id: EventId,
        /// Status
        status: bool,
        /// Message
        message: String,
    },
    /// `["EOSE", <subscription_id>]` (NIP-01): end of stored events
    EndOfStoredEvents(SubscriptionId),
    /// `["COUNT", <subscription_id>, {"count": <integer>}]` (NIP-45)
    Count {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Number of matching events
        count: usize,
    },
    /// `["NOTICE", <message>]` (NIP-01)
    Notice(String),
}

impl RelayMessage {
    /// Compose `EVENT` message
    #[inline]
    pub fn event(subscription_id: SubscriptionId, event: Event) -> Self {
        Self::Event {
            subscription_id,
            event: Box::new(event),
        }
    }

    /// Compose `OK` message
    #[inline]
    pub fn ok<S>(event_id: EventId, status: bool, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Ok {
            event_id,
            status,
            message: message.into(),
        }
    }

    /// Compose `EOSE` message
    #[inline]
    pub fn eose(subscription_id: SubscriptionId) -> Self {
        Self::EndOfStoredEvents(subscription_id)
    }

    /// Compose `COUNT` message
    #[inline]
    pub fn count(subscription_id: SubscriptionId, count: usize) -> Self {
        Self::Count {
            subscription_id,
            count,
        }
    }

    /// Compose `NOTICE` message
    #[inline]
    pub fn notice<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Notice(message.into())
    }

    /// Serialize as JSON array
    pub fn as_json(&self) -> String {
        match self {
            Self::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]).to_string(),
            Self::Ok {
                event_id,
                status,
                message,
            } => json!(["OK", event_id, status, message]).to_string(),
            Self::EndOfStoredEvents(subscription_id) => {
                json!(["EOSE", subscription_id]).to_string()
            }
            Self::Count {
                subscription_id,
                count,
            } => json!(["COUNT", subscription_id, {"count": count}]).to_string(),
            Self::Notice(message) => json!(["NOTICE", message]).to_string(),
        }
    }

    /// Deserialize from JSON string
    pub fn from_json<S>(json: S) -> Result<Self, MessageError>
    where
        S: AsRef<[u8]>,
    {
        let value: Value = serde_json::from_slice(json.as_ref())?;
        Self::from_value(value)
    }

    /// Deserialize from JSON [`Value`]
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let array: &Vec<Value> = match &value {
            Value::Array(array) => array,
            _ => return Err(MessageError::InvalidMessageFormat),
        };

        let tag: &str = array
            .first()
            .and_then(|v| v.as_str())
            .ok_or(MessageError::InvalidMessageFormat)?;

        match tag {
            // ["EVENT", <subscription_id>, <event>]
            "EVENT" => {
                if array.len() != 3 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                let event: Event = serde_json::from_value(array[2].clone())?;
                Ok(Self::event(subscription_id, event))
            }
            // ["OK", <event_id>, <true|false>, <message>]
            "OK" => {
                if array.len() != 4 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let event_id: EventId = serde_json::from_value(array[1].clone())?;
                let status: bool = array[2].as_bool().ok_or(MessageError::InvalidMessageFormat)?;
                let message: String = serde_json::from_value(array[3].clone())?;
                Ok(Self::Ok {
                    event_id,
                    status,
                    message,
                })
            }
            // ["EOSE", <subscription_id>]
            "EOSE" => {
                if array.len() != 2 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                Ok(Self::eose(subscription_id))
            }
            // ["COUNT", <subscription_id>, {"count": <integer>}]
            "COUNT" => {
                if array.len() != 3 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                let count: usize = array[2]
                    .get("count")
                    .and_then(|v| v.as_u64())
                    .ok_or(MessageError::InvalidMessageFormat)? as usize;
                Ok(Self::Count {
                    subscription_id,
                    count,
                })
            }
            // ["NOTICE", <message>]
            "NOTICE" => {
                if array.len() != 2 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let message: String = serde_json::from_value(array[1].clone())?;
                Ok(Self::Notice(message))
            }
            other => Err(MessageError::UnknownMessageType(other.to_string())),
        }
    }
}

// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Messages sent by clients, received by relays

use serde_json::{json, Value};

use super::{MessageError, SubscriptionId};
use crate::{Event, Filter};

/// Messages sent by clients, received by relays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `["EVENT", <event>]` (NIP-01): publish
    Event(Box<Event>),
    /// `["REQ", <subscription_id>, <filter>, ...]` (NIP-01): subscribe
    Req {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters (OR semantics)
        filters: Vec<Filter>,
    },
    /// `["COUNT", <subscription_id>, <filter>, ...]` (NIP-45)
    Count {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters
        filters: Vec<Filter>,
    },
    /// `["CLOSE", <subscription_id>]` (NIP-01): unsubscribe
    Close(SubscriptionId),
}

impl ClientMessage {
    /// Compose `EVENT` message
    #[inline]
    pub fn event(event: Event) -> Self {
        Self::Event(Box::new(event))
    }

    /// Compose `REQ` message
    #[inline]
    pub fn req(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Req {
            subscription_id,
            filters,
        }
    }

    /// Compose `COUNT` message
    #[inline]
    pub fn count(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Count {
            subscription_id,
            filters,
        }
    }

    /// Compose `CLOSE` message
    #[inline]
    pub fn close(subscription_id: SubscriptionId) -> Self {
        Self::Close(subscription_id)
    }

    /// Serialize as JSON array
    pub fn as_json(&self) -> String {
        self.as_value().to_string()
    }

    fn as_value(&self) -> Value {
        match self {
            Self::Event(event) => json!(["EVENT", event]),
            Self::Req {
                subscription_id,
                filters,
            } => {
                let mut array = vec![json!("REQ"), json!(subscription_id)];
                array.extend(filters.iter().map(|f| json!(f)));
                Value::Array(array)
            }
            Self::Count {
                subscription_id,
                filters,
            } => {
                let mut array = vec![json!("COUNT"), json!(subscription_id)];
                array.extend(filters.iter().map(|f| json!(f)));
                Value::Array(array)
            }
            Self::Close(subscription_id) => json!(["CLOSE", subscription_id]),
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
            // ["EVENT", <event>]
            "EVENT" => {
                if array.len() != 2 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let event: Event = serde_json::from_value(array[1].clone())?;
                Ok(Self::event(event))
            }
            // ["REQ", <subscription_id>, <filter>, ...]
            "REQ" => {
                if array.len() < 3 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                let filters: Vec<Filter> = array[2..]
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()))
                    .collect::<Result<_, _>>()?;
                Ok(Self::Req {
                    subscription_id,
                    filters,
                })
            }
            // ["COUNT", <subscription_id>, <filter>, ...]
            "COUNT" => {
                if array.len() < 3 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                let filters: Vec<Filter> = array[2..]
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()))
                    .collect::<Result<_, _>>()?;
                Ok(Self::Count {
                    subscription_id,
                    filters,
                })
            }
            // ["CLOSE", <subscription_id>]
            "CLOSE" => {
                if array.len() != 2 {
                    return Err(MessageError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(array[1].clone())?;
                Ok(Self::Close(subscription_id))
            }
            other => Err(MessageError::UnknownMessageType(other.to_string())),
        }
    }
}

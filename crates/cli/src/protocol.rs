//! The line-delimited JSON request/response protocol spoken over TCP.
//!
//! One JSON object per line in each direction. A request's `command`
//! field selects the variant; a response always carries `status` plus
//! whichever payload field applies.

use serde::{Deserialize, Serialize};

fn default_top_k() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Set {
        key: String,
        value: String,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    BulkSet {
        items: Vec<(String, String)>,
    },
    SearchText {
        query: String,
    },
    SearchSimilar {
        query: String,
        #[serde(default = "default_top_k")]
        top_k: i64,
    },
    GetAllKeys,
}

#[derive(Debug, Serialize, Default)]
pub struct Response {
    pub status: &'static str,
    // Nested Option: the outer layer is omitted for commands that never
    // carry a `value`; the inner layer serializes as `null` for `get` on
    // an absent key, matching the original server's `{'status': 'ok',
    // 'value': value}` (value is `None` -> JSON `null`, never omitted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            ..Default::default()
        }
    }

    /// The `get` response: always carries `value`, even `null` for an
    /// absent key.
    pub fn get_ok(value: Option<String>) -> Self {
        Self {
            status: "ok",
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

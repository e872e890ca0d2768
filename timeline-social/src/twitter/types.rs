use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A v1.1 status object as returned by `statuses/user_timeline`.
///
/// Only `id` is mandatory at the wire level; everything else is optional so a
/// sparse or older payload still decodes. Fields we do not model are kept in
/// `extra` and survive an archive round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_str: Option<String>,
    /// `Wed Oct 10 20:19:24 +0000 2018`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Present when the request asked for `tweet_mode=extended`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default)]
    pub truncated: bool,
    /// Client used to post, as an HTML anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_user_id_str: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,

    #[serde(default)]
    pub is_quote_status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_status: Option<Box<RawPost>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweeted_status: Option<Box<RawPost>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<RawUser>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawPost {
    /// String form of the id, preferring the server-provided `id_str`.
    pub fn id_string(&self) -> String {
        self.id_str.clone().unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,
    /// Accounts this user follows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friends_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favourites_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statuses_count: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawUser {
    pub fn id_string(&self) -> Option<String> {
        self.id_str
            .clone()
            .or_else(|| self.id.map(|id| id.to_string()))
    }
}

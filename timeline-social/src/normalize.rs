//! Flattens a [`RawPost`] into one row-shaped [`NormalizedRecord`].
//!
//! Field resolution order:
//!
//! 1. identity, timestamp, client and truncation flag from the post itself
//! 2. `text`: the short `text` when the post is flagged truncated, otherwise
//!    `full_text` when present, otherwise `text`
//! 3. `coordinates` collapsed to a presence flag
//! 4. the reply triple, copied as-is
//! 5. author fields under `auth_*`; `auth_following_count` reads `friends_count`
//! 6. secondary post: an embedded retweet sets `rt` and takes the slot; a quoted
//!    post sets `quoted_rt` and takes the slot only when there is no retweet
//! 7. the secondary post's fields under `rt_*`
//!
//! Retweets and quotes are not distinguished beyond the two flags.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SocialError};
use crate::twitter::types::RawPost;

/// `Wed Oct 10 20:19:24 +0000 2018`
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub screen_name: Option<String>,
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source: Option<String>,
    pub truncated: bool,
    pub text: String,
    pub coordinates: bool,

    pub in_reply_to_screen_name: Option<String>,
    pub in_reply_to_tweet_id: Option<String>,
    pub in_reply_user_id: Option<String>,

    pub auth_id: Option<String>,
    pub auth_screen_name: Option<String>,
    pub auth_verified: bool,
    pub auth_followers_count: Option<u64>,
    pub auth_following_count: Option<u64>,
    pub auth_favs_count: Option<u64>,
    pub auth_tweet_count: Option<u64>,

    pub rt: bool,
    pub quoted_rt: bool,
    #[serde(flatten)]
    pub secondary: Option<SecondaryFields>,
}

/// The retweeted or quoted post, serialized under `rt_*` keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryFields {
    pub rt_tweet_id: String,
    pub rt_auth_screen_name: Option<String>,
    pub rt_auth_id: Option<String>,
    pub rt_auth_verified: bool,
    pub rt_created_at: DateTime<Utc>,
    pub rt_source: Option<String>,
    pub rt_truncated: bool,
    pub rt_text: String,
}

/// A single cell of a flattened record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(u64),
    Str(String),
    Timestamp(DateTime<Utc>),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Str)
    }
}

impl From<Option<u64>> for FieldValue {
    fn from(v: Option<u64>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Int)
    }
}

impl NormalizedRecord {
    /// Columns in a stable order; `rt_*` columns only when a secondary post exists.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut out: Vec<(&'static str, FieldValue)> = vec![
            ("screen_name", self.screen_name.clone().into()),
            ("id", self.id.clone().into()),
            ("created_at", self.created_at.into()),
            ("source", self.source.clone().into()),
            ("truncated", self.truncated.into()),
            ("text", self.text.clone().into()),
            ("coordinates", self.coordinates.into()),
            (
                "in_reply_to_screen_name",
                self.in_reply_to_screen_name.clone().into(),
            ),
            ("in_reply_to_tweet_id", self.in_reply_to_tweet_id.clone().into()),
            ("in_reply_user_id", self.in_reply_user_id.clone().into()),
            ("auth_id", self.auth_id.clone().into()),
            ("auth_screen_name", self.auth_screen_name.clone().into()),
            ("auth_verified", self.auth_verified.into()),
            ("auth_followers_count", self.auth_followers_count.into()),
            ("auth_following_count", self.auth_following_count.into()),
            ("auth_favs_count", self.auth_favs_count.into()),
            ("auth_tweet_count", self.auth_tweet_count.into()),
            ("rt", self.rt.into()),
            ("quoted_rt", self.quoted_rt.into()),
        ];
        if let Some(s) = &self.secondary {
            out.extend([
                ("rt_tweet_id", s.rt_tweet_id.clone().into()),
                ("rt_auth_screen_name", s.rt_auth_screen_name.clone().into()),
                ("rt_auth_id", s.rt_auth_id.clone().into()),
                ("rt_auth_verified", s.rt_auth_verified.into()),
                ("rt_created_at", s.rt_created_at.into()),
                ("rt_source", s.rt_source.clone().into()),
                ("rt_truncated", s.rt_truncated.into()),
                ("rt_text", s.rt_text.clone().into()),
            ]);
        }
        out
    }

    /// Look up one column by name; `None` when the column is absent from this record.
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Owned column map, ready to be merged with other rows or extra columns.
    pub fn to_row(&self) -> BTreeMap<String, FieldValue> {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Normalize one post. Missing mandatory pieces (author, timestamp, body) fail the
/// whole record rather than producing a partial one.
pub fn normalize(post: &RawPost) -> Result<NormalizedRecord> {
    let id = post.id_string();
    let user = post.user.as_ref().ok_or_else(|| malformed(&id, "user"))?;
    let created_at = parse_created_at(post, &id)?;
    let text = resolve_text(post).ok_or_else(|| malformed(&id, "text"))?;

    let rt = post.retweeted_status.is_some();
    let quoted = post
        .quoted_status
        .as_deref()
        .filter(|_| post.is_quote_status);
    let quoted_rt = !rt && quoted.is_some();

    let secondary_post = post.retweeted_status.as_deref().or(quoted);
    let secondary = secondary_post.map(secondary_fields).transpose()?;

    Ok(NormalizedRecord {
        screen_name: user.screen_name.clone(),
        id,
        created_at,
        source: post.source.clone(),
        truncated: post.truncated,
        text: text.to_string(),
        coordinates: post.coordinates.is_some(),

        in_reply_to_screen_name: post.in_reply_to_screen_name.clone(),
        in_reply_to_tweet_id: post.in_reply_to_status_id_str.clone(),
        in_reply_user_id: post.in_reply_to_user_id_str.clone(),

        auth_id: user.id_string(),
        auth_screen_name: user.screen_name.clone(),
        auth_verified: user.verified,
        auth_followers_count: user.followers_count,
        auth_following_count: user.friends_count,
        auth_favs_count: user.favourites_count,
        auth_tweet_count: user.statuses_count,

        rt,
        quoted_rt,
        secondary,
    })
}

/// Normalize a batch, stopping at the first malformed post.
pub fn normalize_all(posts: &[RawPost]) -> Result<Vec<NormalizedRecord>> {
    posts.iter().map(normalize).collect()
}

fn secondary_fields(post: &RawPost) -> Result<SecondaryFields> {
    let id = post.id_string();
    let author = post.user.as_ref().ok_or_else(|| malformed(&id, "user"))?;
    let created_at = parse_created_at(post, &id)?;
    let text = resolve_text(post).ok_or_else(|| malformed(&id, "text"))?;

    Ok(SecondaryFields {
        rt_tweet_id: id,
        rt_auth_screen_name: author.screen_name.clone(),
        rt_auth_id: author.id_string(),
        rt_auth_verified: author.verified,
        rt_created_at: created_at,
        rt_source: post.source.clone(),
        rt_truncated: post.truncated,
        rt_text: text.to_string(),
    })
}

fn resolve_text(post: &RawPost) -> Option<&str> {
    if post.truncated {
        post.text.as_deref()
    } else {
        post.full_text.as_deref().or(post.text.as_deref())
    }
}

fn parse_created_at(post: &RawPost, id: &str) -> Result<DateTime<Utc>> {
    let raw = post
        .created_at
        .as_deref()
        .ok_or_else(|| malformed(id, "created_at"))?;
    parse_timestamp(raw)
        .ok_or_else(|| malformed(id, &format!("created_at {raw:?} is not a timestamp")))
}

/// Twitter's classic date format, or RFC 3339 for re-exported archives.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn malformed(id: &str, field: &str) -> SocialError {
    SocialError::MalformedRecord {
        id: id.to_string(),
        field: field.to_string(),
    }
}

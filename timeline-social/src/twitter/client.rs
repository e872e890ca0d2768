//! Thin wrapper around the v1.1 user timeline endpoint.
//!
//! Signs every request with the user-context OAuth credentials and always asks
//! for `tweet_mode=extended` so `full_text` is populated. Rate-limit waits and
//! retries are delegated to the shared HTTP client's [`RetryPolicy`].
use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use timeline_http::{Auth, HttpClient, OAuthCredentials, RequestOpts, RetryPolicy};

use crate::error::Result;
use crate::paginate::TimelineSource;
use crate::twitter::types::RawPost;

const USER_TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    credentials: OAuthCredentials,
}

impl TwitterApi {
    /// `base_url` is normally `https://api.twitter.com`; tests point it at a mock server.
    pub fn new(base_url: &str, credentials: OAuthCredentials) -> Result<Self> {
        let http = HttpClient::new(base_url)?;
        Ok(Self { http, credentials })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.http = self.http.with_retry_policy(policy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl TimelineSource for TwitterApi {
    async fn fetch_page(
        &self,
        handle: &str,
        count: u32,
        max_id: Option<u64>,
    ) -> Result<Vec<RawPost>> {
        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("screen_name", handle.into()),
            ("count", count.to_string().into()),
            ("tweet_mode", "extended".into()),
        ];
        if let Some(max_id) = max_id {
            params.push(("max_id", max_id.to_string().into()));
        }

        let page: Vec<RawPost> = self
            .http
            .get_json(
                USER_TIMELINE_PATH,
                RequestOpts {
                    auth: Some(Auth::OAuth1(&self.credentials)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(handle, count, ?max_id, fetched = page.len(), "user timeline page");
        Ok(page)
    }
}

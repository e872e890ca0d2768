//! Walks a user's timeline backwards one page at a time.
//!
//! The first request carries no `max_id`; every later request asks for ids at or
//! below `oldest_seen - 1`, so no id is requested twice and the walk ends on the
//! first empty page. Pages are appended in the order the API returns them
//! (newest first), which keeps the whole result reverse-chronological.
//!
//! Retries and rate-limit waits belong to the [`TimelineSource`]; errors from it
//! end the walk and are returned as-is.
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SocialError};
use crate::twitter::types::RawPost;

/// Largest `count` the user timeline endpoint honours.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Anything that can hand out one page of a user's posts, newest first.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Up to `count` posts by `handle` with ids `<= max_id` (no bound when `None`).
    async fn fetch_page(
        &self,
        handle: &str,
        count: u32,
        max_id: Option<u64>,
    ) -> Result<Vec<RawPost>>;
}

/// Fetch every post the source will return for `handle`.
pub async fn fetch_all<S>(source: &S, handle: &str, page_size: u32) -> Result<Vec<RawPost>>
where
    S: TimelineSource + ?Sized,
{
    let count = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut posts: Vec<RawPost> = Vec::new();

    let first = source.fetch_page(handle, count, None).await?;
    tracing::info!(handle, fetched = first.len(), "initial page downloaded");
    posts.extend(first);

    let mut page = 1usize;
    loop {
        let Some(oldest) = posts.last().map(|p| p.id) else {
            return Ok(posts);
        };
        let Some(max_id) = oldest.checked_sub(1) else {
            // id 0 was the oldest; nothing can precede it
            return Ok(posts);
        };

        page += 1;
        tracing::info!(handle, page, max_id, "requesting older posts");
        let next = source.fetch_page(handle, count, Some(max_id)).await?;
        if next.is_empty() {
            tracing::info!(handle, pages = page, total = posts.len(), "timeline exhausted");
            return Ok(posts);
        }

        // Ids above the bound are already collected.
        if let Some(offending) = next.iter().map(|p| p.id).filter(|id| *id > max_id).max() {
            return Err(SocialError::Pagination {
                handle: handle.to_string(),
                max_id,
                offending,
            });
        }

        posts.extend(next);
        tracing::info!(handle, page, total = posts.len(), "posts downloaded so far");
    }
}

/// [`fetch_all`] bounded by a wall-clock deadline.
pub async fn fetch_all_with_deadline<S>(
    source: &S,
    handle: &str,
    page_size: u32,
    deadline: Duration,
) -> Result<Vec<RawPost>>
where
    S: TimelineSource + ?Sized,
{
    match tokio::time::timeout(deadline, fetch_all(source, handle, page_size)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                handle,
                deadline_ms = deadline.as_millis() as u64,
                "timeline fetch deadline elapsed"
            );
            Err(SocialError::Timeout {
                handle: handle.to_string(),
                deadline,
            })
        }
    }
}

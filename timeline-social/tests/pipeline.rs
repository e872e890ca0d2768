mod common;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use timeline_social::archive::{load_batch, save_batch};
use timeline_social::twitter::RawPost;
use timeline_social::{
    FieldValue, Result, TimelineSource, fetch_all, normalize_all, to_table,
};

/// Newest-first in-memory timeline that honours `count` and `max_id`.
struct InMemoryTimeline {
    posts: Vec<RawPost>,
    calls: Mutex<usize>,
}

#[async_trait]
impl TimelineSource for InMemoryTimeline {
    async fn fetch_page(&self, _: &str, count: u32, max_id: Option<u64>) -> Result<Vec<RawPost>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .posts
            .iter()
            .filter(|p| max_id.is_none_or(|m| p.id <= m))
            .take(count as usize)
            .cloned()
            .collect())
    }
}

fn timeline(n: u64) -> InMemoryTimeline {
    // one post every two hours walking back from 2024-01-01 22:30Z
    let posts = (0..n)
        .map(|i| {
            let minutes = (22 * 60 + 30) - (i as u32 * 120);
            serde_json::from_value(common::status(10_000 - i, "alice", minutes)).unwrap()
        })
        .collect();
    InMemoryTimeline {
        posts,
        calls: Mutex::new(0),
    }
}

#[tokio::test]
async fn fetch_normalize_archive_and_tabulate() {
    common::init_test_tracing();
    let source = timeline(12);

    let posts = fetch_all(&source, "alice", 5).await.unwrap();
    assert_eq!(posts.len(), 12);
    // pages of 5, 5, 2, then the empty page
    assert_eq!(*source.calls.lock().unwrap(), 4);

    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("alice.json");
    save_batch(&path, &posts).unwrap();
    let reloaded = load_batch(&path).unwrap();
    assert_eq!(reloaded, posts);

    let records = normalize_all(&reloaded).unwrap();
    assert!(records.iter().all(|r| r.get("rt") == Some(FieldValue::Bool(false))));
    assert_eq!(records[0].id, "10000");

    // All twelve are Jan 1 in UTC (22:30Z down to 00:30Z). New York is UTC-5, so
    // the three posted before 05:00Z land on Sunday Dec 31 locally.
    let table = to_table(records, "America/New_York").unwrap();
    let counts = table.per_day_counts();
    let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    assert_eq!(counts.values().sum::<usize>(), 12);
    assert_eq!(counts.get(&jan1), Some(&9));
    assert_eq!(counts.get(&dec31), Some(&3));
    assert_eq!(table.on_weekday("Sunday").unwrap().len(), 3);
}

#![allow(dead_code)]

use std::sync::OnceLock;

use serde_json::{Value, json};
use timeline_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "timeline-tests",
            log_dir: Some(std::env::temp_dir().join("timeline-tests")),
            emit_stderr: true,
            format: if std::env::var("TIMELINE_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
        };

        timeline_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// A v1.1 extended-mode status by `screen_name`, created `minutes` after 2024-01-01T00:00Z.
pub fn status(id: u64, screen_name: &str, minutes: u32) -> Value {
    let created_at = format!(
        "Mon Jan 01 {:02}:{:02}:00 +0000 2024",
        (minutes / 60) % 24,
        minutes % 60
    );
    json!({
        "id": id,
        "id_str": id.to_string(),
        "created_at": created_at,
        "full_text": format!("status {id}"),
        "truncated": false,
        "source": "<a href=\"https://mobile.twitter.com\" rel=\"nofollow\">Twitter Web App</a>",
        "is_quote_status": false,
        "coordinates": null,
        "user": {
            "id": 783214,
            "id_str": "783214",
            "screen_name": screen_name,
            "verified": true,
            "followers_count": 100,
            "friends_count": 50,
            "favourites_count": 5,
            "statuses_count": 1000
        }
    })
}

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use timeline_config::TimelineConfig;
use timeline_social::archive::{load_batch, load_timelines, save_batch};
use timeline_social::twitter::TwitterApi;
use timeline_social::{fetch_all, fetch_all_with_deadline, normalize_all, to_table};

pub async fn fetch(
    cfg: &TimelineConfig,
    handle: &str,
    out: &Path,
    page_size: Option<u32>,
    deadline_secs: Option<u64>,
) -> Result<()> {
    // Secrets are checked before anything touches the network.
    let credentials = cfg
        .twitter
        .credentials()
        .context("twitter credentials are not configured")?;

    let api = TwitterApi::new(&cfg.twitter.base_url, credentials)?
        .with_retry_policy(cfg.twitter.retry_policy())
        .with_timeout(cfg.twitter.timeout());

    let page_size = page_size.unwrap_or(cfg.timeline.page_size);
    let handle = handle.trim_start_matches('@');

    tracing::info!(handle, page_size, ?deadline_secs, "fetching timeline");
    let posts = match deadline_secs {
        Some(secs) => {
            fetch_all_with_deadline(&api, handle, page_size, Duration::from_secs(secs)).await?
        }
        None => fetch_all(&api, handle, page_size).await?,
    };

    save_batch(out, &posts).with_context(|| format!("failed to write {}", out.display()))?;
    println!("{} posts by @{handle} -> {}", posts.len(), out.display());
    Ok(())
}

pub fn summary(
    files: &[PathBuf],
    tz: &str,
    weekday: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let tables = load_timelines(files, tz)?;

    for (path, table) in files.iter().zip(&tables) {
        writeln!(out, "== {} ({} posts, {})", path.display(), table.len(), table.timezone())?;
        for (day, count) in table.per_day_counts() {
            writeln!(out, "{day}  {count}")?;
        }

        if let Some(day) = weekday {
            let rows = table.on_weekday(day)?;
            writeln!(out, "-- {} posts on {day}", rows.len())?;
            for row in rows {
                writeln!(
                    out,
                    "{}  {}  {}",
                    row.local_time.format("%Y-%m-%d %H:%M"),
                    row.record.id,
                    first_line(&row.record.text)
                )?;
            }
        }
    }
    Ok(())
}

pub fn records(file: &Path, tz: &str, out: &mut impl Write) -> Result<()> {
    let posts = load_batch(file)?;
    let table = to_table(normalize_all(&posts)?, tz)?;

    for row in table.rows() {
        let mut value = serde_json::to_value(&row.record)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("local_time".into(), row.local_time.to_rfc3339().into());
            obj.insert("day".into(), row.day.clone().into());
        }
        writeln!(out, "{}", serde_json::to_string(&value)?)?;
    }
    Ok(())
}

fn first_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut shown: String = line.chars().take(80).collect();
    if shown.len() < line.len() {
        shown.push('…');
    }
    shown
}

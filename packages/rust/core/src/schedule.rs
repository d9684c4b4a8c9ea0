//! Weekly rewrite trigger.
//!
//! Slots are computed in UTC. The default (Sunday 07:00 UTC) matches 02:00
//! in New York during standard time.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use tracing::{error, info};

use soulseed_shared::{Result, ScheduleConfig, SoulseedError};
use soulseed_storage::Storage;

use crate::rewriter::{BlogRewriter, RewriteSummary};

/// Parse a weekday such as `sun` or `Sunday`.
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| SoulseedError::config(format!("invalid schedule weekday: {s:?}")))
}

/// The first `weekday` at `hour:00` UTC strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> Result<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| SoulseedError::config(format!("invalid schedule hour: {hour}")))?;

    let days_ahead = (weekday.num_days_from_monday() + 7
        - now.weekday().num_days_from_monday())
        % 7;
    let candidate = (now.date_naive() + Duration::days(days_ahead as i64))
        .and_time(time)
        .and_utc();

    Ok(if candidate > now {
        candidate
    } else {
        candidate + Duration::days(7)
    })
}

/// Whether any post with `status` has fewer than `min_names` stored names.
pub async fn should_rewrite(storage: &Storage, status: &str, min_names: usize) -> Result<bool> {
    Ok(storage.count_blogs_below(status, min_names).await? > 0)
}

/// One scheduled firing: skip when nothing needs work, else run the batch.
pub async fn run_scheduled_once(rewriter: &BlogRewriter) -> Result<Option<RewriteSummary>> {
    let config = rewriter.config();
    if !should_rewrite(rewriter.storage(), &config.collection_status, config.min_names).await? {
        info!(minimum = config.min_names, "all posts meet the name minimum, skipping");
        return Ok(None);
    }

    info!("scheduled rewrite starting");
    rewriter.rewrite_all().await.map(Some)
}

/// Sleep until each slot and fire. Only returns on invalid schedule config.
pub async fn run_weekly(rewriter: BlogRewriter, schedule: ScheduleConfig) -> Result<()> {
    let weekday = parse_weekday(&schedule.weekday)?;
    loop {
        let now = Utc::now();
        let next = next_run_after(now, weekday, schedule.hour_utc)?;
        info!(next_run = %next, "scheduled rewrite armed");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        if let Err(e) = run_scheduled_once(&rewriter).await {
            error!(error = %e, "scheduled rewrite failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use soulseed_shared::{BlogPost, BlogStats, RewriteConfig};
    use std::sync::Arc;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn weekday_parsing() {
        assert_eq!(parse_weekday("sun").unwrap(), Weekday::Sun);
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn next_slot_later_this_week() {
        // 2026-10-14 is a Wednesday.
        let next = next_run_after(at(2026, 10, 14, 12, 0), Weekday::Sun, 7).unwrap();
        assert_eq!(next, at(2026, 10, 18, 7, 0));
    }

    #[test]
    fn same_day_before_and_after_slot() {
        let sunday_early = at(2026, 10, 18, 6, 59);
        assert_eq!(
            next_run_after(sunday_early, Weekday::Sun, 7).unwrap(),
            at(2026, 10, 18, 7, 0)
        );
        let sunday_exact = at(2026, 10, 18, 7, 0);
        assert_eq!(
            next_run_after(sunday_exact, Weekday::Sun, 7).unwrap(),
            at(2026, 10, 25, 7, 0)
        );
    }

    #[test]
    fn invalid_hour_is_config_error() {
        let err = next_run_after(at(2026, 10, 14, 0, 0), Weekday::Sun, 24).unwrap_err();
        assert!(matches!(err, SoulseedError::Config { .. }));
    }

    fn post(id: &str, names: usize) -> BlogPost {
        BlogPost {
            id: id.into(),
            slug: id.into(),
            title: id.into(),
            category: String::new(),
            status: "published".into(),
            content: String::new(),
            stats: BlogStats {
                names_count: names,
                ..Default::default()
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn scheduled_run_skips_when_every_post_is_complete() {
        let path = std::env::temp_dir().join(format!("ss_sched_{}.db", uuid::Uuid::now_v7()));
        let storage = Arc::new(Storage::open(&path).await.unwrap());
        storage.upsert_blog(&post("full", 60)).await.unwrap();

        assert!(!should_rewrite(&storage, "published", 50).await.unwrap());
        storage.upsert_blog(&post("thin", 10)).await.unwrap();
        assert!(should_rewrite(&storage, "published", 50).await.unwrap());
        assert!(!should_rewrite(&storage, "draft", 50).await.unwrap());

        storage.upsert_blog(&post("thin", 55)).await.unwrap();
        let model = Arc::new(soulseed_llm::OpenAiClient::new(
            "http://127.0.0.1:9",
            "unused",
            std::time::Duration::from_millis(10),
        )
        .unwrap());
        let rewriter = BlogRewriter::with_default_validator(
            model,
            storage.clone(),
            RewriteConfig {
                model: "gpt-4o".into(),
                temperature: 0.8,
                max_tokens: 5000,
                collection_status: "published".into(),
                min_names: 50,
                max_attempts: 3,
                retry_delay_ms: 0,
                item_delay_ms: 0,
                words_per_minute: 200,
            },
        );
        assert!(run_scheduled_once(&rewriter).await.unwrap().is_none());
        let _ = std::fs::remove_file(path);
    }
}

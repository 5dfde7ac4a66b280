//! View-model rows handed to the askama templates.

use chrono::{DateTime, Utc};
use common::types::HelpRecord;
use engine::ranker::{Medal, RankedEntry};

/// One leaderboard table row. `medal_icon` is empty for ranks past bronze;
/// `label` is empty when a medal icon is shown.
pub struct RankRow {
    pub medal_icon: &'static str,
    pub label: String,
    pub address: String,
    pub address_short: String,
    pub score: String,
}

pub fn rank_rows(entries: &[RankedEntry]) -> Vec<RankRow> {
    entries
        .iter()
        .map(|entry| {
            let (medal_icon, label) = match entry.medal {
                Medal::Gold => ("\u{1f947}", String::new()),
                Medal::Silver => ("\u{1f948}", String::new()),
                Medal::Bronze => ("\u{1f949}", String::new()),
                Medal::Rank(_) => ("", entry.medal.label()),
            };
            RankRow {
                medal_icon,
                label,
                address: entry.address.to_string(),
                address_short: entry.address.short(),
                score: entry.score.normalize().to_string(),
            }
        })
        .collect()
}

/// One help-board feed row.
pub struct RecordRow {
    pub helper: String,
    pub helper_short: String,
    pub recipient: String,
    pub recipient_short: String,
    pub message: String,
    pub time_ago: String,
}

/// Feed rows, newest record first.
pub fn record_rows(records: &[HelpRecord], now: DateTime<Utc>) -> Vec<RecordRow> {
    records
        .iter()
        .rev()
        .map(|record| RecordRow {
            helper: record.helper.to_string(),
            helper_short: record.helper.short(),
            recipient: record.recipient.to_string(),
            recipient_short: record.recipient.short(),
            message: record.message.clone(),
            time_ago: time_ago(record.timestamp, now),
        })
        .collect()
}

pub fn time_ago(timestamp: Option<i64>, now: DateTime<Utc>) -> String {
    let Some(ts) = timestamp else {
        return "\u{2014}".to_string();
    };
    let Some(then) = DateTime::from_timestamp(ts, 0) else {
        return "\u{2014}".to_string();
    };
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

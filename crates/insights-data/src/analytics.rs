//! Derived analytics computed from the finished event collections.
//!
//! Everything here is a pure function of the collections, the totals and the
//! [`TimestampResolver`] (for its timezone and processing instant).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use insights_core::formatting::{format_hour_12, percentage};
use insights_core::models::{MatchEvent, MessageEvent, Timestamped};
use insights_core::time_utils::TimestampResolver;
use serde::{Deserialize, Serialize};

use crate::aggregator::{
    adaptive_date_counts, count_by_hour, count_by_month, count_by_season, hour_histogram,
    DateCount, Granularity, HourCount, MonthCount, SeasonCount,
};
use crate::collector::{EventCollections, Totals};
use crate::emoji::find_emojis;

/// Lowercase phrases that signal the conversation is moving off the app.
pub const NUMBER_EXCHANGE_KEYWORDS: &[&str] =
    &["text me", "my number", "your number", "phone", "call me"];

/// How many entries [`Analytics::most_used_emojis`] keeps.
pub const TOP_EMOJI_LIMIT: usize = 10;

/// Inclusive character-count bands; the last one is open-ended.
const LENGTH_BANDS: &[(&str, usize, Option<usize>)] = &[
    ("0-20", 0, Some(20)),
    ("21-50", 21, Some(50)),
    ("51-100", 51, Some(100)),
    ("101-200", 101, Some(200)),
    ("201+", 201, None),
];

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBand {
    pub range: String,
    pub min: usize,
    /// `None` for the open-ended top band.
    pub max: Option<usize>,
    pub count: usize,
}

impl LengthBand {
    pub fn contains(&self, length: usize) -> bool {
        length >= self.min && self.max.map_or(true, |max| length <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiCount {
    pub emoji: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    /// Mean characters per message, rounded.
    pub avg: u64,
    /// Number of messages.
    pub total: usize,
    /// Sum of all message lengths.
    pub total_length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// Percentage of liked profiles that matched.
    pub rate: f64,
    pub matched: usize,
    /// Liked profiles without a match. Negative when the export holds more
    /// matches than liked profiles (matches that began with a received like).
    pub unmatched: i64,
    pub total_likes: usize,
    pub total_people_liked: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStats {
    pub with_comments: usize,
    pub without_comments: usize,
    pub percentage: f64,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHour {
    pub hour: u32,
    pub count: usize,
    /// 12-hour label, e.g. `"9 pm"`.
    pub formatted: String,
}

/// Whole days since the latest event of each kind; `None` when there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysAgoStats {
    pub last_like: Option<i64>,
    pub last_match: Option<i64>,
    pub last_message: Option<i64>,
    pub last_date: Option<i64>,
}

/// All derived figures for one processed export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub matches_by_day: Vec<DateCount>,
    pub matches_by_day_granularity: Granularity,
    pub matches_by_hour: Vec<HourCount>,
    pub messages_by_hour: Vec<HourCount>,
    pub matches_by_season: Vec<SeasonCount>,
    pub messages_by_season: Vec<SeasonCount>,
    pub message_length_distribution: Vec<LengthBand>,
    /// Mean hours from a match to its first message.
    pub avg_time_between_match_and_message: f64,
    pub messages_before_number_exchange: usize,
    pub most_used_emojis: Vec<EmojiCount>,
    pub average_messages: f64,
    pub message_stats: MessageStats,
    pub likes_by_month: Vec<MonthCount>,
    pub likes_by_hour: Vec<HourCount>,
    pub likes_to_match_conversion: Conversion,
    pub likes_with_comments: CommentStats,
    pub peak_activity_hour: PeakHour,
    pub days_ago_stats: DaysAgoStats,
}

impl Analytics {
    pub fn compute(
        events: &EventCollections,
        totals: &Totals,
        resolver: &TimestampResolver,
    ) -> Self {
        let tz = resolver.timezone();
        let (matches_by_day_granularity, matches_by_day) =
            adaptive_date_counts(&events.matches, tz);

        Self {
            matches_by_day,
            matches_by_day_granularity,
            matches_by_hour: count_by_hour(&events.matches, tz),
            messages_by_hour: count_by_hour(&events.messages, tz),
            matches_by_season: count_by_season(&events.matches, tz),
            messages_by_season: count_by_season(&events.messages, tz),
            message_length_distribution: message_length_distribution(&events.messages),
            avg_time_between_match_and_message: avg_hours_to_first_message(
                &events.matches,
                resolver,
            ),
            messages_before_number_exchange: messages_before_number_exchange(&events.messages),
            most_used_emojis: most_used_emojis(&events.messages),
            average_messages: average_messages(totals.total_messages, totals.total_matches),
            message_stats: message_stats(&events.messages),
            likes_by_month: count_by_month(&events.likes, tz),
            likes_by_hour: count_by_hour(&events.likes, tz),
            likes_to_match_conversion: likes_to_match_conversion(
                events.likes.len(),
                totals.total_matches,
                totals.total_people_liked,
            ),
            likes_with_comments: likes_with_comments(
                events.likes.iter().filter(|like| like.has_comment).count(),
                events.likes.len(),
            ),
            peak_activity_hour: peak_activity_hour(&hour_histogram(&events.likes, tz)),
            days_ago_stats: DaysAgoStats {
                last_like: days_since_latest(&events.likes, resolver.now()),
                last_match: days_since_latest(&events.matches, resolver.now()),
                last_message: days_since_latest(&events.messages, resolver.now()),
                last_date: days_since_latest(&events.meetups, resolver.now()),
            },
        }
    }
}

// ── Metric functions ──────────────────────────────────────────────────────────

/// Bucket counts sum to `messages.len()`; bands never overlap.
pub fn message_length_distribution(messages: &[MessageEvent]) -> Vec<LengthBand> {
    let mut bands: Vec<LengthBand> = LENGTH_BANDS
        .iter()
        .map(|&(range, min, max)| LengthBand {
            range: range.to_string(),
            min,
            max,
            count: 0,
        })
        .collect();

    for message in messages {
        if let Some(band) = bands.iter_mut().find(|b| b.contains(message.length)) {
            band.count += 1;
        }
    }
    bands
}

/// Mean hours between each match and its profile's first chat message.
///
/// Matches without messages are skipped, and so are negative gaps (a message
/// stamped before its match). Returns `0.0` when nothing qualifies.
pub fn avg_hours_to_first_message(matches: &[MatchEvent], resolver: &TimestampResolver) -> f64 {
    let samples: Vec<f64> = matches
        .iter()
        .filter_map(|m| {
            let first = m.messages.first()?;
            let sent = resolver.resolve_opt(first.timestamp.as_deref());
            let hours = (sent - m.date).num_milliseconds() as f64 / 3_600_000.0;
            (hours >= 0.0).then_some(hours)
        })
        .collect();

    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Index of the first message mentioning a number exchange, or the message
/// count when no message does.
pub fn messages_before_number_exchange(messages: &[MessageEvent]) -> usize {
    messages
        .iter()
        .position(|message| {
            let body = message.body.to_lowercase();
            NUMBER_EXCHANGE_KEYWORDS.iter().any(|kw| body.contains(kw))
        })
        .unwrap_or(messages.len())
}

/// Top emojis by count, descending; ties keep first-seen order.
pub fn most_used_emojis(messages: &[MessageEvent]) -> Vec<EmojiCount> {
    let mut tally: Vec<EmojiCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for message in messages {
        for glyph in find_emojis(&message.body) {
            match index.get(glyph) {
                Some(&i) => tally[i].count += 1,
                None => {
                    index.insert(glyph, tally.len());
                    tally.push(EmojiCount {
                        emoji: glyph.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    // Stable sort keeps encounter order among equal counts.
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally.truncate(TOP_EMOJI_LIMIT);
    tally
}

/// `messages / max(matches, 1)`.
pub fn average_messages(total_messages: usize, total_matches: usize) -> f64 {
    total_messages as f64 / total_matches.max(1) as f64
}

pub fn message_stats(messages: &[MessageEvent]) -> MessageStats {
    if messages.is_empty() {
        return MessageStats::default();
    }
    let total_length: usize = messages.iter().map(|m| m.length).sum();
    MessageStats {
        avg: (total_length as f64 / messages.len() as f64).round() as u64,
        total: messages.len(),
        total_length,
    }
}

pub fn likes_to_match_conversion(
    total_likes: usize,
    total_matches: usize,
    total_people_liked: usize,
) -> Conversion {
    if total_people_liked == 0 {
        return Conversion {
            rate: 0.0,
            matched: total_matches,
            unmatched: 0,
            total_likes,
            total_people_liked,
        };
    }
    Conversion {
        rate: percentage(total_matches as f64, total_people_liked as f64),
        matched: total_matches,
        unmatched: total_people_liked as i64 - total_matches as i64,
        total_likes,
        total_people_liked,
    }
}

pub fn likes_with_comments(with_comments: usize, total: usize) -> CommentStats {
    CommentStats {
        with_comments,
        without_comments: total - with_comments,
        percentage: percentage(with_comments as f64, total as f64),
        total,
    }
}

/// Busiest hour; the earliest hour wins a tie, hour 0 when all are empty.
pub fn peak_activity_hour(histogram: &[usize]) -> PeakHour {
    let mut peak = 0usize;
    let mut max_count = 0usize;
    for (hour, &count) in histogram.iter().enumerate() {
        if count > max_count {
            max_count = count;
            peak = hour;
        }
    }
    PeakHour {
        hour: peak as u32,
        count: max_count,
        formatted: format_hour_12(peak as u32),
    }
}

/// Whole days from the most recent event to `now`.
pub fn days_since_latest<E: Timestamped>(events: &[E], now: DateTime<Utc>) -> Option<i64> {
    let latest = events.iter().map(Timestamped::instant).max()?;
    Some((now - latest).num_days())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

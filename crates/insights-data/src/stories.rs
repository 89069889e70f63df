//! Story deck and insight figures derived from a [`ProcessedDataset`].
//!
//! Slides only read these payloads; no styling lives here.

use chrono::NaiveDate;
use insights_core::formatting::percentage;
use serde::Serialize;

use crate::aggregator::{HourCount, MonthCount, SeasonCount};
use crate::analytics::{EmojiCount, LengthBand};
use crate::engine::ProcessedDataset;

/// Round `value` to `decimals` fractional digits.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

// ── Classification labels ─────────────────────────────────────────────────────

/// How quickly the first message follows a match.
pub fn responder_label(avg_hours: f64) -> &'static str {
    if avg_hours < 1.0 {
        "Lightning Fast"
    } else if avg_hours < 6.0 {
        "Quick Responder"
    } else if avg_hours < 24.0 {
        "Steady Pace"
    } else if avg_hours < 72.0 {
        "Thoughtful"
    } else {
        "Takes Their Time"
    }
}

/// Communication style from the mean message length.
pub fn message_style_label(avg_length: u64) -> &'static str {
    match avg_length {
        0..=29 => "Short & Sweet",
        30..=79 => "Just Right",
        80..=149 => "Detailed",
        _ => "Novelist",
    }
}

/// Match-to-date success level from a percentage.
pub fn conversion_level(rate: f64) -> &'static str {
    if rate > 20.0 {
        "Date Master"
    } else if rate > 10.0 {
        "Great Success"
    } else if rate > 5.0 {
        "Good Progress"
    } else {
        "Room to Grow"
    }
}

// ── Story payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewData {
    pub total_matches: usize,
    pub total_likes: usize,
    pub total_messages: usize,
    pub total_dates: usize,
    pub total_conversations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakActivityData {
    pub hour: String,
    pub count: usize,
    pub activity: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEmojiData {
    pub emoji: String,
    pub count: usize,
    pub top_three: Vec<EmojiCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeData {
    pub avg_hours: f64,
    /// Average messages per match.
    pub message_count: f64,
    #[serde(rename = "type")]
    pub responder: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSeasonData {
    pub season: &'static str,
    pub count: usize,
    /// Share of all matches, whole percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStyleData {
    pub avg_length: u64,
    pub total_messages: usize,
    pub style: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionData {
    /// Dates per match, percent.
    pub rate: f64,
    pub dates: usize,
    pub matches: usize,
    pub level: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPatternData {
    pub hourly_data: Vec<HourCount>,
    pub peak_hour: String,
    pub peak_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendData {
    pub monthly_data: Vec<MonthCount>,
    /// e.g. `"March 2023"`.
    pub best_month: String,
    pub best_month_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalData {
    pub seasonal_data: Vec<SeasonCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthData {
    pub length_data: Vec<LengthBand>,
    pub max_count: usize,
    pub most_common: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchProgressData {
    pub total_likes: usize,
    pub total_matches: usize,
    pub total_conversations: usize,
    pub total_dates: usize,
    /// Dates per like sent, percent.
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiBreakdownData {
    pub top_emojis: Vec<EmojiCount>,
    pub total_emojis: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoryData {
    Overview(OverviewData),
    PeakActivity(PeakActivityData),
    TopEmoji(TopEmojiData),
    ResponseTime(ResponseTimeData),
    TopSeason(TopSeasonData),
    MessageStyle(MessageStyleData),
    Conversion(ConversionData),
    MatchesByHour(HourlyPatternData),
    LikesByMonth(MonthlyTrendData),
    SeasonalActivity(SeasonalData),
    MessageLength(LengthData),
    MatchProgress(MatchProgressData),
    TopEmojis(EmojiBreakdownData),
}

impl StoryData {
    /// Slide template the payload is meant for.
    pub fn kind(&self) -> &'static str {
        match self {
            StoryData::Overview(_) => "overview",
            StoryData::PeakActivity(_) => "peak-activity",
            StoryData::TopEmoji(_) => "emoji",
            StoryData::ResponseTime(_) => "response-time",
            StoryData::TopSeason(_) => "season",
            StoryData::MessageStyle(_) => "message-style",
            StoryData::Conversion(_) => "conversion",
            StoryData::MatchesByHour(_) => "matches-by-hour",
            StoryData::LikesByMonth(_) => "likes-by-month",
            StoryData::SeasonalActivity(_) => "seasonal-activity",
            StoryData::MessageLength(_) => "message-length",
            StoryData::MatchProgress(_) => "match-progress",
            StoryData::TopEmojis(_) => "top-emojis",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub data: StoryData,
}

impl Story {
    fn new(id: &'static str, title: &'static str, data: StoryData) -> Self {
        Self {
            id,
            kind: data.kind(),
            title,
            data,
        }
    }
}

// ── Deck generation ───────────────────────────────────────────────────────────

/// Build the story deck in presentation order.
///
/// Stories whose subject is empty (no emoji, no likes, no matches for the
/// season share) are left out.
pub fn generate_stories(data: &ProcessedDataset) -> Vec<Story> {
    let totals = &data.totals;
    let a = &data.analytics;
    let mut stories = Vec::new();

    stories.push(Story::new(
        "overview",
        "My Hinge Data",
        StoryData::Overview(OverviewData {
            total_matches: totals.total_matches,
            total_likes: totals.total_likes,
            total_messages: totals.total_messages,
            total_dates: totals.total_dates,
            total_conversations: totals.total_conversations,
        }),
    ));

    stories.push(Story::new(
        "peak-activity",
        "Peak Activity Time",
        StoryData::PeakActivity(PeakActivityData {
            hour: a.peak_activity_hour.formatted.clone(),
            count: a.peak_activity_hour.count,
            activity: "likes",
        }),
    ));

    if let Some(top) = a.most_used_emojis.first() {
        stories.push(Story::new(
            "top-emoji",
            "Most Used Emoji",
            StoryData::TopEmoji(TopEmojiData {
                emoji: top.emoji.clone(),
                count: top.count,
                top_three: a.most_used_emojis.iter().take(3).cloned().collect(),
            }),
        ));
    }

    stories.push(Story::new(
        "response-time",
        "Response Time",
        StoryData::ResponseTime(ResponseTimeData {
            avg_hours: round_to(a.avg_time_between_match_and_message, 1),
            message_count: round_to(a.average_messages, 1),
            responder: responder_label(a.avg_time_between_match_and_message),
        }),
    ));

    if totals.total_matches > 0 {
        if let Some(top) = first_max_by_count(&a.matches_by_season, |s| s.count) {
            stories.push(Story::new(
                "top-season",
                "Peak Season",
                StoryData::TopSeason(TopSeasonData {
                    season: top.season.name(),
                    count: top.count,
                    percentage: round_to(
                        percentage(top.count as f64, totals.total_matches as f64),
                        0,
                    ),
                }),
            ));
        }
    }

    stories.push(Story::new(
        "message-style",
        "Communication Style",
        StoryData::MessageStyle(MessageStyleData {
            avg_length: a.message_stats.avg,
            total_messages: a.message_stats.total,
            style: message_style_label(a.message_stats.avg),
        }),
    ));

    let date_rate = round_to(
        percentage(totals.total_dates as f64, totals.total_matches as f64),
        1,
    );
    stories.push(Story::new(
        "conversion",
        "Match to Date Rate",
        StoryData::Conversion(ConversionData {
            rate: date_rate,
            dates: totals.total_dates,
            matches: totals.total_matches,
            level: conversion_level(date_rate),
        }),
    ));

    if let Some(peak) = first_max_by_count(&a.matches_by_hour, |h| h.count) {
        stories.push(Story::new(
            "matches-by-hour",
            "Hourly Match Pattern",
            StoryData::MatchesByHour(HourlyPatternData {
                hourly_data: a.matches_by_hour.clone(),
                peak_hour: peak.hour.clone(),
                peak_count: peak.count,
            }),
        ));
    }

    if let Some(best) = first_max_by_count(&a.likes_by_month, |m| m.count) {
        stories.push(Story::new(
            "likes-by-month",
            "Monthly Activity Trend",
            StoryData::LikesByMonth(MonthlyTrendData {
                monthly_data: a.likes_by_month.clone(),
                best_month: month_label(&best.date),
                best_month_count: best.count,
            }),
        ));
    }

    stories.push(Story::new(
        "seasonal-activity",
        "Seasonal Breakdown",
        StoryData::SeasonalActivity(SeasonalData {
            seasonal_data: a.matches_by_season.clone(),
        }),
    ));

    if let Some(common) = first_max_by_count(&a.message_length_distribution, |b| b.count) {
        stories.push(Story::new(
            "message-length",
            "Message Length Distribution",
            StoryData::MessageLength(LengthData {
                length_data: a.message_length_distribution.clone(),
                max_count: common.count,
                most_common: common.range.clone(),
            }),
        ));
    }

    stories.push(Story::new(
        "match-progress",
        "Match Journey",
        StoryData::MatchProgress(MatchProgressData {
            total_likes: totals.total_likes,
            total_matches: totals.total_matches,
            total_conversations: totals.total_conversations,
            total_dates: totals.total_dates,
            success_rate: round_to(
                percentage(totals.total_dates as f64, totals.total_likes as f64),
                1,
            ),
        }),
    ));

    if !a.most_used_emojis.is_empty() {
        stories.push(Story::new(
            "top-emojis",
            "Emoji Breakdown",
            StoryData::TopEmojis(EmojiBreakdownData {
                top_emojis: a.most_used_emojis.clone(),
                total_emojis: a.most_used_emojis.iter().map(|e| e.count).sum(),
            }),
        ));
    }

    stories
}

/// First element holding the maximum count.
fn first_max_by_count<T>(items: &[T], count: impl Fn(&T) -> usize) -> Option<&T> {
    items
        .iter()
        .fold(None, |best: Option<&T>, item| match best {
            Some(b) if count(item) <= count(b) => Some(b),
            _ => Some(item),
        })
}

/// `"yyyy-MM-dd"` → `"<Month> <yyyy>"`; unparsable keys pass through.
fn month_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

// ── Insights ──────────────────────────────────────────────────────────────────

/// Figures shown on the insight cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub conversion_rate: f64,
    pub reciprocated: usize,
    pub not_reciprocated: i64,
    pub not_reciprocated_percentage: f64,
    pub peak_hour: String,
    pub comment_percentage: f64,
    pub likes_with_comments: usize,
    /// Share of matches that turned into a conversation, percent.
    pub conversation_rate: f64,
    pub average_messages: f64,
}

impl Insights {
    pub fn from_dataset(data: &ProcessedDataset) -> Self {
        let a = &data.analytics;
        let conversion = &a.likes_to_match_conversion;
        Self {
            conversion_rate: conversion.rate,
            reciprocated: conversion.matched,
            not_reciprocated: conversion.unmatched,
            not_reciprocated_percentage: 100.0 - conversion.rate,
            peak_hour: a.peak_activity_hour.formatted.clone(),
            comment_percentage: a.likes_with_comments.percentage,
            likes_with_comments: a.likes_with_comments.with_comments,
            conversation_rate: percentage(
                data.totals.total_conversations as f64,
                data.totals.total_matches as f64,
            ),
            average_messages: a.average_messages,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Plain-text summary of a processed export.

use insights_core::formatting::{format_count, format_fixed, format_last_activity};
use insights_data::engine::ProcessedDataset;
use insights_data::stories::Insights;
use unicode_width::UnicodeWidthStr;

const LABEL_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 10;

/// Pad `text` to `width` terminal columns.
fn pad_right(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    let mut out = text.to_string();
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn pad_left(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{}{}", " ".repeat(width.saturating_sub(used)), text)
}

fn heading(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"─".repeat(UnicodeWidthStr::width(title)));
    out.push('\n');
}

fn row(out: &mut String, label: &str, value: &str) {
    out.push_str("  ");
    out.push_str(&pad_right(label, LABEL_WIDTH));
    out.push_str(&pad_left(value, VALUE_WIDTH));
    out.push('\n');
}

/// Render the overview cards and insight figures.
pub fn render_summary(data: &ProcessedDataset) -> String {
    let totals = &data.totals;
    let recency = &data.analytics.days_ago_stats;
    let insights = Insights::from_dataset(data);

    let mut out = format!("Hinge Insights ({})\n", data.timezone);

    heading(&mut out, "Overview");
    let cards: [(&str, usize, Option<Option<i64>>); 6] = [
        ("💘 Matches", totals.total_matches, Some(recency.last_match)),
        ("💬 Messages", totals.total_messages, Some(recency.last_message)),
        ("❤️ Likes sent", totals.total_likes, Some(recency.last_like)),
        ("☕ Dates", totals.total_dates, Some(recency.last_date)),
        ("🗨️ Conversations", totals.total_conversations, None),
        ("👋 Unmatches", totals.total_unmatches, None),
    ];
    for (label, value, last) in cards {
        out.push_str("  ");
        out.push_str(&pad_right(label, LABEL_WIDTH));
        out.push_str(&pad_left(&format_count(value as u64), VALUE_WIDTH));
        if let Some(last) = last {
            out.push_str("   last: ");
            out.push_str(&format_last_activity(last));
        }
        out.push('\n');
    }

    heading(&mut out, "Insights");
    row(
        &mut out,
        "Like → match rate",
        &format!("{}%", format_fixed(insights.conversion_rate, 1)),
    );
    row(&mut out, "Reciprocated", &format_count(insights.reciprocated as u64));
    row(
        &mut out,
        "Not reciprocated",
        &format!(
            "{} ({}%)",
            insights.not_reciprocated,
            format_fixed(insights.not_reciprocated_percentage, 1)
        ),
    );
    row(&mut out, "Peak like hour", &insights.peak_hour);
    row(
        &mut out,
        "Likes with comments",
        &format!(
            "{} ({}%)",
            format_count(insights.likes_with_comments as u64),
            format_fixed(insights.comment_percentage, 1)
        ),
    );
    row(
        &mut out,
        "Conversation rate",
        &format!("{}%", format_fixed(insights.conversation_rate, 1)),
    );
    row(
        &mut out,
        "Messages per match",
        &format_fixed(insights.average_messages, 1),
    );

    let analytics = &data.analytics;
    heading(&mut out, "Messaging");
    row(
        &mut out,
        "Hours to first message",
        &format_fixed(analytics.avg_time_between_match_and_message, 1),
    );
    row(
        &mut out,
        "Avg message length",
        &format_count(analytics.message_stats.avg),
    );
    if let Some(top) = analytics.most_used_emojis.first() {
        row(
            &mut out,
            "Top emoji",
            &format!("{} ×{}", top.emoji, format_count(top.count as u64)),
        );
    }

    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────

//! Top-level processing pipeline.
//!
//! `raw export → profiles → event collections + totals → analytics`, in one
//! synchronous call with no state carried between calls.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use insights_core::models::{
    LikeEvent, MatchEvent, MeetupEvent, MessageEvent, ProfileRecord, UnmatchEvent,
};
use insights_core::time_utils::{get_system_timezone, parse_timezone, TimestampResolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::analytics::Analytics;
use crate::collector::{EventCollector, Totals};

// ── ProcessedDataset ──────────────────────────────────────────────────────────

/// The complete output handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDataset {
    pub matches: Vec<MatchEvent>,
    pub messages: Vec<MessageEvent>,
    pub likes: Vec<LikeEvent>,
    #[serde(rename = "weMet")]
    pub meetups: Vec<MeetupEvent>,
    #[serde(rename = "blocks")]
    pub unmatches: Vec<UnmatchEvent>,
    #[serde(flatten)]
    pub totals: Totals,
    pub analytics: Analytics,
    /// When this dataset was computed; also the fallback for bad timestamps.
    pub processed_at: DateTime<Utc>,
    /// IANA name of the timezone used for naive timestamps and buckets.
    pub timezone: String,
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Turns a raw export into a [`ProcessedDataset`].
///
/// Holds configuration only, so one engine may serve any number of exports,
/// from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    tz: Tz,
}

impl Default for AggregationEngine {
    /// Engine bound to the system timezone.
    fn default() -> Self {
        Self::from_timezone_name(&get_system_timezone())
    }
}

impl AggregationEngine {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Unknown names fall back to UTC with a warning.
    pub fn from_timezone_name(tz_name: &str) -> Self {
        Self::new(parse_timezone(tz_name))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Process `raw` using the current wall-clock time as processing instant.
    ///
    /// Returns `None` when `raw` is not a JSON array.
    pub fn process(&self, raw: &Value) -> Option<ProcessedDataset> {
        self.process_at(raw, Utc::now())
    }

    /// Process `raw` with an explicit processing instant.
    pub fn process_at(&self, raw: &Value, now: DateTime<Utc>) -> Option<ProcessedDataset> {
        let entries = raw.as_array()?;
        let profiles: Vec<ProfileRecord> = entries.iter().map(ProfileRecord::from_value).collect();
        Some(self.process_profiles(&profiles, now))
    }

    /// Process already-typed profile records.
    pub fn process_profiles(
        &self,
        profiles: &[ProfileRecord],
        now: DateTime<Utc>,
    ) -> ProcessedDataset {
        let resolver = TimestampResolver::new(self.tz, now);

        let mut collector = EventCollector::new(&resolver);
        for profile in profiles {
            collector.add_profile(profile);
        }
        let (events, totals) = collector.finish();

        debug!(
            "Processed {} profiles: {} likes, {} matches, {} messages, {} dates, {} unmatches",
            profiles.len(),
            totals.total_likes,
            totals.total_matches,
            totals.total_messages,
            totals.total_dates,
            totals.total_unmatches,
        );

        let analytics = Analytics::compute(&events, &totals, &resolver);

        ProcessedDataset {
            matches: events.matches,
            messages: events.messages,
            likes: events.likes,
            meetups: events.meetups,
            unmatches: events.unmatches,
            totals,
            analytics,
            processed_at: now,
            timezone: self.tz.name().to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 11, 10, 0, 0).unwrap()
    }

    fn engine() -> AggregationEngine {
        AggregationEngine::new(Tz::UTC)
    }

    fn basic_export() -> Value {
        json!([{
            "like": [{"timestamp": "2023-01-01 10:00:00"}],
            "match": [{"timestamp": "2023-01-01 10:05:00"}],
            "chats": [{"body": "hey 😀", "timestamp": "2023-01-01 10:10:00"}]
        }])
    }

    // ── process ───────────────────────────────────────────────────────────────

    #[test]
    fn test_non_array_input_is_none() {
        assert!(engine().process_at(&Value::Null, now()).is_none());
        assert!(engine().process_at(&json!({"like": []}), now()).is_none());
        assert!(engine().process_at(&json!("matches"), now()).is_none());
    }

    #[test]
    fn test_empty_array_yields_zeroed_dataset() {
        let data = engine().process_at(&json!([]), now()).unwrap();
        assert_eq!(data.totals, Totals::default());
        assert_eq!(data.analytics.average_messages, 0.0);
        assert_eq!(data.analytics.matches_by_hour.len(), 24);
        assert_eq!(data.analytics.likes_by_hour.len(), 24);
        assert!(data.analytics.days_ago_stats.last_like.is_none());
        assert_eq!(data.analytics.peak_activity_hour.formatted, "12 am");
        assert_eq!(data.analytics.likes_to_match_conversion.rate, 0.0);
    }

    #[test]
    fn test_basic_scenario() {
        let data = engine().process_at(&basic_export(), now()).unwrap();

        assert_eq!(data.totals.total_likes, 1);
        assert_eq!(data.totals.total_people_liked, 1);
        assert_eq!(data.totals.total_matches, 1);
        assert_eq!(data.totals.total_messages, 1);
        assert_eq!(data.totals.total_conversations, 1);

        let a = &data.analytics;
        assert_eq!(a.message_length_distribution[0].range, "0-20");
        assert_eq!(a.message_length_distribution[0].count, 1);
        assert_eq!(a.most_used_emojis.len(), 1);
        assert_eq!(a.most_used_emojis[0].emoji, "😀");
        assert_eq!(a.most_used_emojis[0].count, 1);
        assert!((a.avg_time_between_match_and_message - 0.083).abs() < 0.001);
        assert_eq!(a.messages_by_hour[10].count, 1);
        assert_eq!(a.peak_activity_hour.formatted, "10 am");
        assert_eq!(a.days_ago_stats.last_match, Some(9));
        assert_eq!(a.likes_to_match_conversion.rate, 100.0);
        assert_eq!(a.matches_by_day[0].date, "2023-01-01");
    }

    #[test]
    fn test_block_subtype_scenario() {
        let data = engine()
            .process_at(
                &json!([
                    {"block": [{"timestamp": "2023-01-01 10:00:00", "block_type": "remove"}]},
                    {"block": [{"timestamp": "2023-01-01 10:00:00", "block_type": "hide"}]}
                ]),
                now(),
            )
            .unwrap();
        assert_eq!(data.totals.total_unmatches, 1);
        assert_eq!(data.unmatches.len(), 1);
    }

    #[test]
    fn test_we_met_subject_scenario() {
        let data = engine()
            .process_at(
                &json!([{"we_met": [
                    {"timestamp": "2023-01-01 20:00:00", "did_meet_subject": "No"},
                    {
                        "timestamp": "2023-01-01 20:00:00",
                        "did_meet_subject": "Yes",
                        "was_my_type": false
                    }
                ]}]),
                now(),
            )
            .unwrap();
        assert_eq!(data.totals.total_dates, 1);
        assert_eq!(data.meetups.len(), 1);
        assert_eq!(data.analytics.days_ago_stats.last_date, Some(9));
    }

    #[test]
    fn test_invariants_hold_on_mixed_export() {
        let raw = json!([
            {"like": [{"timestamp": "2023-01-01 10:00:00"}, {"timestamp": "2023-01-02 10:00:00"}]},
            {"match": [{"timestamp": "2023-01-03 10:00:00"}, {"timestamp": "2023-01-04 10:00:00"}],
             "chats": [{"body": "x", "timestamp": "2023-01-03 11:00:00"}]},
            {"chats": [{"body": "y", "timestamp": "2023-01-03 11:00:00"}]},
            {"match": [{"timestamp": "2023-01-05 10:00:00"}]}
        ]);
        let data = engine().process_at(&raw, now()).unwrap();
        let t = &data.totals;
        assert!(t.total_conversations <= t.total_matches);
        assert!(t.total_likes >= t.total_people_liked);
        assert_eq!(t.total_matches, data.matches.len());
        assert_eq!(t.total_messages, data.messages.len());
        assert_eq!(
            data.analytics.average_messages,
            t.total_messages as f64 / t.total_matches.max(1) as f64
        );
        let hour_sum: usize = data.analytics.matches_by_hour.iter().map(|h| h.count).sum();
        assert_eq!(hour_sum, data.matches.len());
    }

    #[test]
    fn test_repeat_calls_do_not_share_state() {
        let engine = engine();
        let first = engine.process_at(&basic_export(), now()).unwrap();
        let second = engine.process_at(&basic_export(), now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unparsable_timestamp_uses_processing_instant() {
        let data = engine()
            .process_at(&json!([{"match": [{"timestamp": "yesterday-ish"}]}]), now())
            .unwrap();
        assert_eq!(data.matches[0].date, now());
        assert_eq!(data.analytics.days_ago_stats.last_match, Some(0));
    }

    #[test]
    fn test_timezone_shifts_hour_buckets() {
        let raw = json!([{"match": [{"timestamp": "2023-01-01T03:00:00Z"}]}]);
        let data = AggregationEngine::new(Tz::America__New_York)
            .process_at(&raw, now())
            .unwrap();
        assert_eq!(data.analytics.matches_by_hour[22].count, 1);
        // 22:00 on Dec 31 in New York: winter, and the day bucket is local.
        assert_eq!(data.analytics.matches_by_day[0].date, "2022-12-31");
        assert_eq!(data.timezone, "America/New_York");
    }

    #[test]
    fn test_spring_forward_gap_keeps_real_dates() {
        let raw = json!([{
            "match": [{"timestamp": "2024-03-10 01:50:00"}],
            "chats": [{"body": "hi", "timestamp": "2024-03-10 02:30:00"}]
        }]);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let data = AggregationEngine::new(Tz::America__New_York)
            .process_at(&raw, now)
            .unwrap();

        assert_eq!(
            data.messages[0].date,
            Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap()
        );
        let a = &data.analytics;
        assert!((a.avg_time_between_match_and_message - 40.0 / 60.0).abs() < 1e-9);
        assert_eq!(a.messages_by_season[0].season.name(), "Spring");
        assert_eq!(a.messages_by_season[0].count, 1);
        assert_eq!(a.days_ago_stats.last_message, Some(83));
    }

    #[test]
    fn test_serialized_shape() {
        let data = engine().process_at(&basic_export(), now()).unwrap();
        let value = serde_json::to_value(&data).unwrap();
        for key in [
            "matches",
            "messages",
            "likes",
            "weMet",
            "blocks",
            "totalMatches",
            "totalMessages",
            "totalLikes",
            "totalDates",
            "totalConversations",
            "totalUnmatches",
            "totalPeopleLiked",
            "analytics",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        let analytics = &value["analytics"];
        assert_eq!(analytics["matchesByDayGranularity"], json!("daily"));
        assert_eq!(analytics["matchesBySeason"][3]["season"], json!("Winter"));
        assert_eq!(analytics["messageLengthDistribution"][4]["max"], Value::Null);
        assert_eq!(analytics["peakActivityHour"]["formatted"], json!("10 am"));
    }
}

//! Profile to event flattening.
//!
//! One [`EventCollector`] lives for exactly one processing run. Each profile
//! is fed through five independent extraction rules and the resulting
//! events and running totals accumulate until [`EventCollector::finish`].

use insights_core::models::{
    LikeEvent, MatchEvent, MeetupEvent, MessageEvent, ProfileRecord, UnmatchEvent,
};
use insights_core::time_utils::TimestampResolver;
use serde::{Deserialize, Serialize};

use crate::emoji::find_emojis;

// ── Totals ────────────────────────────────────────────────────────────────────

/// Scalar totals accumulated during the extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_matches: usize,
    pub total_messages: usize,
    /// Like actions; one profile may receive several.
    pub total_likes: usize,
    /// Confirmed in-person meetings.
    pub total_dates: usize,
    /// Profiles with at least one match and at least one message.
    pub total_conversations: usize,
    pub total_unmatches: usize,
    /// Profiles with at least one like action, counted once each.
    pub total_people_liked: usize,
}

// ── EventCollections ──────────────────────────────────────────────────────────

/// The five typed event streams, in export encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCollections {
    pub likes: Vec<LikeEvent>,
    pub matches: Vec<MatchEvent>,
    pub messages: Vec<MessageEvent>,
    pub meetups: Vec<MeetupEvent>,
    pub unmatches: Vec<UnmatchEvent>,
}

// ── EventCollector ────────────────────────────────────────────────────────────

pub struct EventCollector<'r> {
    resolver: &'r TimestampResolver,
    events: EventCollections,
    totals: Totals,
}

impl<'r> EventCollector<'r> {
    pub fn new(resolver: &'r TimestampResolver) -> Self {
        Self {
            resolver,
            events: EventCollections::default(),
            totals: Totals::default(),
        }
    }

    /// Extract every event a single profile contributes.
    pub fn add_profile(&mut self, profile: &ProfileRecord) {
        self.collect_likes(profile);
        let matched = self.collect_matches(profile);
        let messaged = self.collect_messages(profile);
        self.collect_meetups(profile);
        self.collect_unmatches(profile);

        if matched > 0 && messaged > 0 {
            self.totals.total_conversations += 1;
        }
    }

    pub fn finish(self) -> (EventCollections, Totals) {
        (self.events, self.totals)
    }

    // ── Extraction rules ──────────────────────────────────────────────────────

    fn collect_likes(&mut self, profile: &ProfileRecord) {
        if profile.likes.is_empty() {
            return;
        }
        self.totals.total_people_liked += 1;

        for record in &profile.likes {
            let comment = record.first_comment().map(str::to_string);
            self.events.likes.push(LikeEvent {
                timestamp: record.timestamp.clone(),
                date: self.resolver.resolve_opt(record.timestamp.as_deref()),
                has_comment: comment.is_some(),
                comment,
            });
            self.totals.total_likes += 1;
        }
    }

    fn collect_matches(&mut self, profile: &ProfileRecord) -> usize {
        for record in &profile.matches {
            self.events.matches.push(MatchEvent {
                timestamp: record.timestamp.clone(),
                date: self.resolver.resolve_opt(record.timestamp.as_deref()),
                has_messages: !profile.chats.is_empty(),
                message_count: profile.chats.len(),
                messages: profile.chats.clone(),
            });
        }
        self.totals.total_matches += profile.matches.len();
        profile.matches.len()
    }

    fn collect_messages(&mut self, profile: &ProfileRecord) -> usize {
        // Re-matches are not distinguished; the first match anchors every message.
        let match_timestamp = profile
            .matches
            .first()
            .and_then(|record| record.timestamp.clone());

        for chat in &profile.chats {
            self.events.messages.push(MessageEvent {
                body: chat.body.clone(),
                timestamp: chat.timestamp.clone(),
                date: self.resolver.resolve_opt(chat.timestamp.as_deref()),
                length: chat.body.chars().count(),
                word_count: chat.body.split(' ').count(),
                has_emoji: !find_emojis(&chat.body).is_empty(),
                match_timestamp: match_timestamp.clone(),
            });
        }
        self.totals.total_messages += profile.chats.len();
        profile.chats.len()
    }

    fn collect_meetups(&mut self, profile: &ProfileRecord) {
        for meeting in profile.meetings.iter().filter(|m| m.did_meet()) {
            self.events.meetups.push(MeetupEvent {
                timestamp: meeting.timestamp.clone(),
                date: self.resolver.resolve_opt(meeting.timestamp.as_deref()),
                was_my_type: meeting.was_my_type,
            });
            self.totals.total_dates += 1;
        }
    }

    fn collect_unmatches(&mut self, profile: &ProfileRecord) {
        for block in profile.blocks.iter().filter(|b| b.is_removal()) {
            self.events.unmatches.push(UnmatchEvent {
                timestamp: block.timestamp.clone(),
                date: self.resolver.resolve_opt(block.timestamp.as_deref()),
                block_type: block.block_type.clone().unwrap_or_default(),
            });
            self.totals.total_unmatches += 1;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn collect(records: serde_json::Value) -> (EventCollections, Totals) {
        let resolver = TimestampResolver::new(Tz::UTC, now());
        let mut collector = EventCollector::new(&resolver);
        for record in records.as_array().unwrap() {
            collector.add_profile(&ProfileRecord::from_value(record));
        }
        collector.finish()
    }

    #[test]
    fn test_multiple_likes_same_profile_count_one_person() {
        let (events, totals) = collect(json!([{
            "like": [
                {"timestamp": "2023-01-01 10:00:00", "like": [{"comment": "hi"}]},
                {"timestamp": "2023-01-02 10:00:00"}
            ]
        }]));
        assert_eq!(totals.total_likes, 2);
        assert_eq!(totals.total_people_liked, 1);
        assert!(events.likes[0].has_comment);
        assert_eq!(events.likes[0].comment.as_deref(), Some("hi"));
        assert!(!events.likes[1].has_comment);
        assert!(events.likes[1].comment.is_none());
    }

    #[test]
    fn test_match_carries_full_chat_list() {
        let (events, _) = collect(json!([{
            "match": [{"timestamp": "2023-01-01 10:05:00"}],
            "chats": [
                {"body": "a", "timestamp": "2023-01-01 10:10:00"},
                {"body": "b", "timestamp": "2023-01-01 10:11:00"},
                {"body": "c", "timestamp": "2023-01-01 10:12:00"}
            ]
        }]));
        let m = &events.matches[0];
        assert!(m.has_messages);
        assert_eq!(m.message_count, 3);
        assert_eq!(m.messages.len(), 3);
        assert_eq!(m.messages[0].body, "a");
    }

    #[test]
    fn test_match_without_chats() {
        let (events, totals) = collect(json!([{"match": [{"timestamp": "2023-01-01 10:05:00"}]}]));
        assert!(!events.matches[0].has_messages);
        assert_eq!(events.matches[0].message_count, 0);
        assert_eq!(totals.total_conversations, 0);
    }

    #[test]
    fn test_message_fields() {
        let (events, _) = collect(json!([{
            "match": [{"timestamp": "first"}, {"timestamp": "second"}],
            "chats": [{"body": "hey you 😀", "timestamp": "2023-01-01 10:10:00"}]
        }]));
        let msg = &events.messages[0];
        assert_eq!(msg.length, 9);
        assert_eq!(msg.word_count, 3);
        assert!(msg.has_emoji);
        assert_eq!(msg.match_timestamp.as_deref(), Some("first"));
        assert_eq!(msg.date, Utc.with_ymd_and_hms(2023, 1, 1, 10, 10, 0).unwrap());
    }

    #[test]
    fn test_message_without_match_has_null_match_timestamp() {
        let (events, totals) = collect(json!([{"chats": [{"body": "", "timestamp": "x"}]}]));
        let msg = &events.messages[0];
        assert!(msg.match_timestamp.is_none());
        assert_eq!(msg.length, 0);
        assert_eq!(msg.word_count, 1);
        assert!(!msg.has_emoji);
        // Unparsable timestamp resolves to the processing instant.
        assert_eq!(msg.date, now());
        assert_eq!(totals.total_conversations, 0);
    }

    #[test]
    fn test_meetups_require_literal_yes() {
        let (events, totals) = collect(json!([{
            "we_met": [
                {
                    "timestamp": "2023-02-01 19:00:00",
                    "did_meet_subject": "Yes",
                    "was_my_type": true
                },
                {"timestamp": "2023-02-02 19:00:00", "did_meet_subject": "No"},
                {"timestamp": "2023-02-03 19:00:00", "did_meet_subject": "yes"},
                {"timestamp": "2023-02-04 19:00:00"}
            ]
        }]));
        assert_eq!(totals.total_dates, 1);
        assert_eq!(events.meetups.len(), 1);
        assert!(events.meetups[0].was_my_type);
    }

    #[test]
    fn test_only_remove_blocks_are_unmatches() {
        let (events, totals) = collect(json!([
            {"block": [{"timestamp": "2023-03-01 12:00:00", "block_type": "remove"}]},
            {"block": [{"timestamp": "2023-03-02 12:00:00", "block_type": "report"}]},
            {"block": [{"timestamp": "2023-03-03 12:00:00"}]}
        ]));
        assert_eq!(totals.total_unmatches, 1);
        assert_eq!(events.unmatches.len(), 1);
        assert_eq!(events.unmatches[0].block_type, "remove");
    }

    #[test]
    fn test_conversation_needs_match_and_message_on_same_profile() {
        let (_, totals) = collect(json!([
            {"match": [{"timestamp": "2023-01-01 10:00:00"}]},
            {"chats": [{"body": "orphan", "timestamp": "2023-01-01 10:00:00"}]},
            {
                "match": [
                    {"timestamp": "2023-01-01 10:00:00"},
                    {"timestamp": "2023-01-05 10:00:00"}
                ],
                "chats": [{"body": "hi", "timestamp": "2023-01-01 11:00:00"}]
            }
        ]));
        assert_eq!(totals.total_matches, 3);
        assert_eq!(totals.total_messages, 2);
        assert_eq!(totals.total_conversations, 1);
    }

    #[test]
    fn test_empty_profile_contributes_nothing() {
        let (events, totals) = collect(json!([{}, null, 5]));
        assert_eq!(events, EventCollections::default());
        assert_eq!(totals, Totals::default());
    }
}

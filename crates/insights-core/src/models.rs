use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Input records ─────────────────────────────────────────────────────────────

/// One nested entry inside a like action. Only the comment is of interest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeDetail {
    pub comment: Option<String>,
}

/// A single like sent to a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub timestamp: Option<String>,
    /// Nested like payloads; the export wraps the comment one level deeper.
    #[serde(default)]
    pub like: Vec<LikeDetail>,
}

impl LikeRecord {
    /// Comment attached to the first nested entry, if it is non-empty.
    ///
    /// Later nested entries are never examined.
    pub fn first_comment(&self) -> Option<&str> {
        self.like
            .first()
            .and_then(|detail| detail.comment.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// A match confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub timestamp: Option<String>,
}

/// A single chat message as it appears in the export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(default)]
    pub body: String,
    pub timestamp: Option<String>,
}

/// A "we met" confirmation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetRecord {
    pub timestamp: Option<String>,
    pub did_meet_subject: Option<String>,
    #[serde(default)]
    pub was_my_type: bool,
}

impl MeetRecord {
    /// Literal value of `did_meet_subject` that marks an in-person meeting.
    pub const MET_VALUE: &'static str = "Yes";

    pub fn did_meet(&self) -> bool {
        self.did_meet_subject.as_deref() == Some(Self::MET_VALUE)
    }
}

/// A block action. Only the `remove` subtype is an unmatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub timestamp: Option<String>,
    pub block_type: Option<String>,
}

impl BlockRecord {
    pub const REMOVE_TYPE: &'static str = "remove";

    pub fn is_removal(&self) -> bool {
        self.block_type.as_deref() == Some(Self::REMOVE_TYPE)
    }
}

/// Everything the export holds about one person.
///
/// Every sub-array is optional in the export; absence, `null` and values of
/// the wrong type all collapse to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRecord {
    pub likes: Vec<LikeRecord>,
    pub matches: Vec<MatchRecord>,
    pub chats: Vec<ChatRecord>,
    pub meetings: Vec<MeetRecord>,
    pub blocks: Vec<BlockRecord>,
}

impl ProfileRecord {
    /// Build a profile from one element of the export array.
    ///
    /// Permissive by construction: a non-object element yields an empty
    /// profile and unknown keys are ignored.
    pub fn from_value(data: &Value) -> Self {
        Self {
            likes: items(data, "like")
                .map(|item| LikeRecord {
                    timestamp: timestamp_of(item),
                    like: items(item, "like")
                        .map(|detail| LikeDetail {
                            comment: string_of(detail, "comment"),
                        })
                        .collect(),
                })
                .collect(),
            matches: items(data, "match")
                .map(|item| MatchRecord {
                    timestamp: timestamp_of(item),
                })
                .collect(),
            chats: items(data, "chats")
                .map(|item| ChatRecord {
                    body: string_of(item, "body").unwrap_or_default(),
                    timestamp: timestamp_of(item),
                })
                .collect(),
            meetings: items(data, "we_met")
                .map(|item| MeetRecord {
                    timestamp: timestamp_of(item),
                    did_meet_subject: string_of(item, "did_meet_subject"),
                    was_my_type: flag_of(item, "was_my_type"),
                })
                .collect(),
            blocks: items(data, "block")
                .map(|item| BlockRecord {
                    timestamp: timestamp_of(item),
                    block_type: string_of(item, "block_type"),
                })
                .collect(),
        }
    }
}

/// Iterate the array stored under `key`, or nothing when it is absent.
fn items<'a>(data: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter())
        .into_iter()
        .flatten()
}

fn string_of(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Timestamps are normally strings; numbers are kept as their textual form
/// so the resolver can report them.
fn timestamp_of(data: &Value) -> Option<String> {
    match data.get("timestamp")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag_of(data: &Value, key: &str) -> bool {
    match data.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// A like sent by the export owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeEvent {
    /// Raw timestamp string from the export.
    pub timestamp: Option<String>,
    /// Resolved instant.
    pub date: DateTime<Utc>,
    pub has_comment: bool,
    pub comment: Option<String>,
}

/// A mutual match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    pub timestamp: Option<String>,
    pub date: DateTime<Utc>,
    /// `true` when the owning profile has at least one chat message.
    pub has_messages: bool,
    pub message_count: usize,
    /// The owning profile's entire chat list, in export order.
    pub messages: Vec<ChatRecord>,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub body: String,
    pub timestamp: Option<String>,
    pub date: DateTime<Utc>,
    /// Length in Unicode scalar values.
    pub length: usize,
    /// Number of space-separated segments (an empty body counts as one).
    pub word_count: usize,
    pub has_emoji: bool,
    /// Raw timestamp of the owning profile's first match, if any.
    pub match_timestamp: Option<String>,
}

/// A confirmed in-person meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupEvent {
    pub timestamp: Option<String>,
    pub date: DateTime<Utc>,
    pub was_my_type: bool,
}

/// A removal (unmatch) action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchEvent {
    pub timestamp: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub block_type: String,
}

/// Implemented by every event so recency and bucketing code can stay generic.
pub trait Timestamped {
    fn instant(&self) -> DateTime<Utc>;
}

macro_rules! impl_timestamped {
    ($($ty:ty),* $(,)?) => {
        $(impl Timestamped for $ty {
            fn instant(&self) -> DateTime<Utc> {
                self.date
            }
        })*
    };
}

impl_timestamped!(LikeEvent, MatchEvent, MessageEvent, MeetupEvent, UnmatchEvent);

// ── Tests ─────────────────────────────────────────────────────────────────────

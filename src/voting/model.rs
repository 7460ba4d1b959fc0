//! Vote Model
//!
//! The two-video pair, immutable votes, and the derived tally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two videos shown to the visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Video {
    Video1,
    Video2,
}

impl Video {
    /// Both videos in display order
    pub const ALL: [Video; 2] = [Video::Video1, Video::Video2];

    /// The other video of the pair
    pub fn other(self) -> Self {
        match self {
            Video::Video1 => Video::Video2,
            Video::Video2 => Video::Video1,
        }
    }

    /// Wire identifier (`video1` / `video2`)
    pub fn as_str(self) -> &'static str {
        match self {
            Video::Video1 => "video1",
            Video::Video2 => "video2",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Video::Video1 => "Video 1",
            Video::Video2 => "Video 2",
        }
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Video {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "video1" => Ok(Video::Video1),
            "video2" => Ok(Video::Video2),
            other => Err(format!("unknown video '{}'", other)),
        }
    }
}

/// A single recorded vote.
///
/// Locally built votes come from [`Vote::cast`]; votes read off the wire go
/// through [`RawVote`], which rejects a truth choice that is not the
/// complement of the liar choice. Votes are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVote")]
pub struct Vote {
    /// Store-assigned identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    selected_liar: Video,
    selected_truth: Video,
    is_correct: bool,
    #[serde(rename = "timestamp")]
    submitted_at: DateTime<Utc>,
    #[serde(rename = "userType")]
    user_type: String,
}

/// Wire shape of a vote before the pair is checked
#[derive(Deserialize)]
struct RawVote {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    id: Option<String>,
    selected_liar: Video,
    selected_truth: Video,
    is_correct: bool,
    timestamp: DateTime<Utc>,
    #[serde(rename = "userType", default = "default_user_type")]
    user_type: String,
}

impl TryFrom<RawVote> for Vote {
    type Error = String;

    fn try_from(raw: RawVote) -> Result<Self, Self::Error> {
        if raw.selected_truth != raw.selected_liar.other() {
            return Err(format!(
                "selected_truth must be {} when selected_liar is {}",
                raw.selected_liar.other(),
                raw.selected_liar
            ));
        }
        Ok(Self {
            id: raw.id,
            selected_liar: raw.selected_liar,
            selected_truth: raw.selected_truth,
            is_correct: raw.is_correct,
            submitted_at: raw.timestamp,
            user_type: raw.user_type,
        })
    }
}

fn default_user_type() -> String {
    "voter".to_string()
}

impl Vote {
    /// Build the vote for a visitor who picked `choice` as the liar
    pub fn cast(choice: Video, designated_liar: Video, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            selected_liar: choice,
            selected_truth: choice.other(),
            is_correct: choice == designated_liar,
            submitted_at,
            user_type: default_user_type(),
        }
    }

    /// Copy of this vote carrying the identifier assigned by a store.
    /// Any identifier the vote already had is replaced.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self.clone()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn selected_liar(&self) -> Video {
        self.selected_liar
    }

    pub fn selected_truth(&self) -> Video {
        self.selected_truth
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn user_type(&self) -> &str {
        &self.user_type
    }
}

// Managed backends hand back integer keys, the REST store uses uuids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}

/// Aggregate correct/wrong counts, recomputed from the full vote list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u64,
    pub wrong: u64,
}

impl Tally {
    /// Count votes by correctness
    pub fn from_votes(votes: &[Vote]) -> Self {
        let correct = votes.iter().filter(|v| v.is_correct()).count() as u64;
        Self {
            correct,
            wrong: votes.len() as u64 - correct,
        }
    }

    pub fn total(&self) -> u64 {
        self.correct + self.wrong
    }

    /// Share of correct votes, rounded to a whole percent. Zero when nobody voted.
    pub fn success_percentage(&self) -> u32 {
        let total = self.total().max(1) as f64;
        (self.correct as f64 / total * 100.0).round() as u32
    }
}

/// Audit trail entry written by the widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Diagnostic record for a failed store interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub context: String,
    pub message: String,
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

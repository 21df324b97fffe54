//! Rows of the `session_feedback` table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How the user felt about a session, given when they close it early.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Feeling {
    Happy,
    Sad,
}

impl Feeling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feeling::Happy => "happy",
            Feeling::Sad => "sad",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "happy" => Some(Feeling::Happy),
            "sad" => Some(Feeling::Sad),
            _ => None,
        }
    }
}

/// One Focus interval. `end_time` is `None` while the session is open, and
/// stays `None` forever for sessions abandoned by a reset or a crash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub feeling: Option<Feeling>,
}

impl SessionRecord {
    pub fn open(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            end_time: None,
            feeling: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_minutes())
    }
}

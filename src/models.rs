use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub client_id: Option<u64>,
    pub client_name: Option<String>,
}

impl Project {
    /// `client/project` when the billing client is known, else the bare name.
    pub fn full_name(&self) -> String {
        match self.client_name.as_deref() {
            Some(client) if !client.is_empty() => format!("{client}/{}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub project_id: Option<u64>,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedTimer {
    pub project_id: Option<u64>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub project: String,
    pub duration: Duration,
}

// v9 payloads still carry the v8 short keys (`cid`, `pid`) next to the long
// ones, so both are read and the long key wins.

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectPayload {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub client_id: Option<u64>,
    #[serde(default)]
    pub cid: Option<u64>,
}

impl From<ProjectPayload> for Project {
    fn from(payload: ProjectPayload) -> Self {
        Project {
            id: payload.id,
            name: payload.name,
            client_id: payload.client_id.or(payload.cid),
            client_name: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimerPayload {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub pid: Option<u64>,
    pub start: DateTime<Utc>,
}

impl From<TimerPayload> for Timer {
    fn from(payload: TimerPayload) -> Self {
        Timer {
            id: payload.id,
            project_id: payload.project_id.or(payload.pid),
            start: payload.start,
        }
    }
}

/// The current-entry endpoint answers with either the entry itself or the
/// older `{"data": ...}` envelope; both may carry `null`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CurrentEntryReply {
    Bare(TimerPayload),
    Envelope { data: Option<TimerPayload> },
}

impl CurrentEntryReply {
    pub fn into_timer(self) -> Option<Timer> {
        match self {
            CurrentEntryReply::Bare(payload) => Some(payload.into()),
            CurrentEntryReply::Envelope { data } => data.map(Timer::from),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoppedEntryReply {
    Envelope { data: StoppedEntry },
    Bare(StoppedEntry),
}

impl StoppedEntryReply {
    pub fn into_entry(self) -> StoppedEntry {
        match self {
            StoppedEntryReply::Envelope { data } | StoppedEntryReply::Bare(data) => data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoppedEntry {
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub pid: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewTimeEntry<'a> {
    pub created_with: &'a str,
    pub description: &'a str,
    pub workspace_id: u64,
    pub project_id: u64,
    pub start: String,
    pub duration: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryReport {
    #[serde(default)]
    pub data: Option<Vec<SummaryItem>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryItem {
    pub title: SummaryTitle,
    #[serde(default)]
    pub time: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryTitle {
    pub project: Option<String>,
}

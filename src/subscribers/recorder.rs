//! # Run-history recorder.
//!
//! [`Recorder`] is a [`Subscribe`] implementation that keeps, for every routine it hears
//! about, enough history to back an admin listing:
//!
//! - the static [`RoutineInfo`] (from `RoutineRegistered`);
//! - last start / stop timestamps;
//! - the most recent runs ([`RunRecord`]);
//! - per-day aggregate [`RunStats`] for the last `retention_days` days.
//!
//! ```text
//! Bus ──► SubscriberSet ──► Recorder::update(&Event)
//!                                  │
//!                                  ▼
//!                     HashMap<String, RoutineHistory>
//!                       ├─ info, last_start, last_stop
//!                       ├─ recent_runs   (bounded, newest last)
//!                       └─ daily stats   (NaiveDate → RunStats)
//! ```
//!
//! Recording happens on the subscriber's worker task, so a slow or failing recorder never
//! delays an invocation.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::core::RoutineInfo;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Limits for the recorder.
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// How many recent runs to keep per routine (`0` keeps none).
    pub recent_runs: usize,
    /// How many distinct days of aggregate stats to keep per routine (at least 1).
    pub retention_days: usize,
}

impl Default for RecorderConfig {
    /// `recent_runs = 5`, `retention_days = 7`.
    fn default() -> Self {
        Self {
            recent_runs: 5,
            retention_days: 7,
        }
    }
}

/// One handler invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRecord {
    /// When the invocation started.
    pub at: DateTime<Utc>,
    /// How long it took.
    pub duration: Duration,
    /// Business error, if any.
    pub error: Option<String>,
}

/// Aggregate statistics over a set of runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Number of runs.
    pub run_count: u64,
    /// Number of runs that returned a business error.
    pub error_count: u64,
    /// Shortest run.
    pub min_duration: Option<Duration>,
    /// Longest run.
    pub max_duration: Option<Duration>,
    /// Sum of all run durations.
    pub total_duration: Duration,
}

impl RunStats {
    /// Adds one run.
    pub fn record(&mut self, duration: Duration, failed: bool) {
        self.run_count += 1;
        if failed {
            self.error_count += 1;
        }
        self.total_duration = self.total_duration.saturating_add(duration);
        self.min_duration = Some(self.min_duration.map_or(duration, |d| d.min(duration)));
        self.max_duration = Some(self.max_duration.map_or(duration, |d| d.max(duration)));
    }

    /// Folds another set of stats into this one.
    pub fn merge(&mut self, other: &RunStats) {
        self.run_count += other.run_count;
        self.error_count += other.error_count;
        self.total_duration = self.total_duration.saturating_add(other.total_duration);
        self.min_duration = match (self.min_duration, other.min_duration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_duration = match (self.max_duration, other.max_duration) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Mean run duration, `None` without runs.
    pub fn avg_duration(&self) -> Option<Duration> {
        let count = u32::try_from(self.run_count).ok().filter(|c| *c > 0)?;
        Some(self.total_duration / count)
    }
}

/// Everything known about one routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutineHistory {
    /// Routine name.
    pub name: String,
    /// Static metadata, once registered.
    pub info: Option<RoutineInfo>,
    /// Last time the routine started.
    pub last_start: Option<DateTime<Utc>>,
    /// Last time the routine stopped.
    pub last_stop: Option<DateTime<Utc>>,
    /// Most recent runs, oldest first.
    pub recent_runs: VecDeque<RunRecord>,
    /// Per-day stats, keyed by the UTC day the run started.
    pub daily: BTreeMap<NaiveDate, RunStats>,
}

impl RoutineHistory {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            info: None,
            last_start: None,
            last_stop: None,
            recent_runs: VecDeque::new(),
            daily: BTreeMap::new(),
        }
    }

    /// Stats summed over every retained day.
    pub fn stats(&self) -> RunStats {
        self.daily.values().fold(RunStats::default(), |mut acc, day| {
            acc.merge(day);
            acc
        })
    }

    fn record_run(&mut self, run: RunRecord, cfg: &RecorderConfig) {
        self.daily
            .entry(run.at.date_naive())
            .or_default()
            .record(run.duration, run.error.is_some());
        while self.daily.len() > cfg.retention_days.max(1) {
            self.daily.pop_first();
        }

        if cfg.recent_runs == 0 {
            return;
        }
        self.recent_runs.push_back(run);
        while self.recent_runs.len() > cfg.recent_runs {
            self.recent_runs.pop_front();
        }
    }
}

/// In-memory run-history store fed by runtime events.
pub struct Recorder {
    cfg: RecorderConfig,
    state: RwLock<HashMap<String, RoutineHistory>>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new(cfg: RecorderConfig) -> Self {
        Self {
            cfg,
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Applies one event. Returns `true` if it changed the recorded history.
    pub async fn update(&self, ev: &Event) -> bool {
        if ev.is_subscriber_report() {
            return false;
        }
        let Some(name) = ev.routine.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state
            .entry(name.to_string())
            .or_insert_with(|| RoutineHistory::new(name));

        match ev.kind {
            EventKind::RoutineRegistered => match &ev.info {
                Some(info) => {
                    entry.info = Some(info.as_ref().clone());
                    true
                }
                None => false,
            },
            EventKind::RoutineStarted => {
                entry.last_start = Some(ev.at);
                true
            }
            EventKind::RoutineStopped => {
                entry.last_stop = Some(ev.at);
                true
            }
            EventKind::RunCompleted | EventKind::RunFailed => {
                let run = RunRecord {
                    at: ev.at,
                    duration: ev.duration.unwrap_or_default(),
                    error: ev.error.as_deref().map(str::to_string),
                };
                entry.record_run(run, &self.cfg);
                true
            }
            _ => false,
        }
    }

    /// History of one routine.
    pub async fn history(&self, name: &str) -> Option<RoutineHistory> {
        self.state.read().await.get(name).cloned()
    }

    /// History of every known routine, sorted by name.
    pub async fn snapshot(&self) -> Vec<RoutineHistory> {
        let state = self.state.read().await;
        let mut all: Vec<RoutineHistory> = state.values().cloned().collect();
        all.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.update(ev).await;
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

//! In-memory diagnostics for resolution and hook lifecycle events.
//!
//! Keeps a bounded history so a misbehaving build can be diagnosed after the
//! fact without trawling the host's log stream. With probe mode off only
//! failures are retained; probe mode additionally records successes.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use strum::{Display, IntoStaticStr};
use tracing::info;

const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ProbeKind {
    #[strum(serialize = "type-lookup")]
    TypeLookup,
    #[strum(serialize = "routine-lookup")]
    RoutineLookup,
    #[strum(serialize = "hook-install")]
    HookInstall,
    #[strum(serialize = "hook-remove")]
    HookRemove,
    #[strum(serialize = "callback-fault")]
    CallbackFault,
}

#[derive(Debug, Clone)]
pub struct ProbeEntry {
    pub at: DateTime<Local>,
    pub kind: ProbeKind,
    pub owner: String,
    pub detail: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Shared, thread-safe probe history. Cloning is cheap and all clones feed
/// the same buffer, so the resolver and the registry can share one log.
#[derive(Clone)]
pub struct ProbeLog {
    shared: Arc<ProbeShared>,
}

struct ProbeShared {
    probe_mode: AtomicBool,
    history: Mutex<VecDeque<ProbeEntry>>,
}

impl ProbeLog {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ProbeShared {
                probe_mode: AtomicBool::new(false),
                history: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn set_probe_mode(&self, enabled: bool) {
        self.shared.probe_mode.store(enabled, Ordering::SeqCst);
        info!(
            "Probe mode {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn is_probe_mode(&self) -> bool {
        self.shared.probe_mode.load(Ordering::SeqCst)
    }

    pub fn record(
        &self,
        kind: ProbeKind,
        owner: &str,
        detail: &str,
        success: bool,
        error: Option<String>,
    ) {
        if success && !self.is_probe_mode() {
            return;
        }

        let entry = ProbeEntry {
            at: Local::now(),
            kind,
            owner: owner.to_string(),
            detail: detail.to_string(),
            success,
            error,
        };

        let mut history = self
            .shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        history.push_back(entry);
        while history.len() > MAX_HISTORY_SIZE {
            history.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<ProbeEntry> {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Render a short report: totals plus the most recent failures.
    pub fn summary(&self) -> String {
        let entries = self.entries();
        let failures: Vec<&ProbeEntry> = entries.iter().filter(|e| !e.success).collect();

        let mut out = String::new();
        out.push_str("=== Probe History Summary ===\n");
        out.push_str(&format!("Total entries: {}\n", entries.len()));
        out.push_str(&format!(
            "Successes: {}\n",
            entries.len() - failures.len()
        ));
        out.push_str(&format!("Failures: {}\n", failures.len()));

        if !failures.is_empty() {
            out.push_str("\nRecent failures:\n");
            for entry in failures.iter().rev().take(10).rev() {
                out.push_str(&format!(
                    "  [{}] {} {}: {}\n",
                    entry.at.format("%H:%M:%S"),
                    entry.kind,
                    entry.owner,
                    entry.detail
                ));
                if let Some(error) = &entry.error {
                    out.push_str(&format!("    Error: {}\n", error));
                }
            }
        }
        out.push_str("=============================");
        out
    }
}

impl Default for ProbeLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successes_skipped_without_probe_mode() {
        let log = ProbeLog::new();
        log.record(ProbeKind::RoutineLookup, "a.b.C", "powerPress", true, None);
        assert!(log.is_empty());

        log.record(
            ProbeKind::RoutineLookup,
            "a.b.C",
            "powerPress",
            false,
            Some("no match".to_string()),
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_probe_mode_records_successes() {
        let log = ProbeLog::new();
        log.set_probe_mode(true);
        log.record(ProbeKind::HookInstall, "a.b.C", "powerPress", true, None);
        assert_eq!(log.len(), 1);
        assert!(log.entries()[0].success);
    }

    #[test]
    fn test_history_is_bounded() {
        let log = ProbeLog::new();
        for i in 0..(MAX_HISTORY_SIZE + 25) {
            log.record(
                ProbeKind::TypeLookup,
                &format!("type{}", i),
                "",
                false,
                None,
            );
        }
        assert_eq!(log.len(), MAX_HISTORY_SIZE);
        // Oldest entries were dropped
        assert_eq!(log.entries()[0].owner, "type25");
    }

    #[test]
    fn test_summary_lists_failures() {
        let log = ProbeLog::new();
        log.record(
            ProbeKind::RoutineLookup,
            "a.b.C",
            "powerPress",
            false,
            Some("ambiguous".to_string()),
        );
        let summary = log.summary();
        assert!(summary.contains("Failures: 1"));
        assert!(summary.contains("routine-lookup a.b.C"));
        assert!(summary.contains("ambiguous"));
    }

    #[test]
    fn test_clones_share_history() {
        let log = ProbeLog::new();
        let clone = log.clone();
        clone.record(ProbeKind::HookRemove, "a.b.C", "", false, None);
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(clone.is_empty());
    }
}

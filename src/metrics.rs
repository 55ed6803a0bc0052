//! Process-wide action counters, reported by the server's `health` op.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use serde::Serialize;

use crate::pet::ActionKind;

static PETS_ADOPTED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_SERVED: AtomicU64 = AtomicU64::new(0);
static REQUESTS_FAILED: AtomicU64 = AtomicU64::new(0);

static ACTION_COUNTERS: OnceLock<Mutex<BTreeMap<ActionKind, ActionCounter>>> = OnceLock::new();

pub fn inc_pets_adopted() {
    PETS_ADOPTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_requests_served() {
    REQUESTS_SERVED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_requests_failed() {
    REQUESTS_FAILED.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionCounter {
    pub applied: u64,
    pub refused: u64,
}

fn action_counter_lock() -> MutexGuard<'static, BTreeMap<ActionKind, ActionCounter>> {
    ACTION_COUNTERS
        .get_or_init(|| Mutex::new(BTreeMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn record_action(kind: ActionKind, applied: bool) -> ActionCounter {
    let mut guard = action_counter_lock();
    let counter = guard.entry(kind).or_default();
    if applied {
        counter.applied = counter.applied.saturating_add(1);
    } else {
        counter.refused = counter.refused.saturating_add(1);
    }
    *counter
}

pub fn action_counters_snapshot() -> BTreeMap<ActionKind, ActionCounter> {
    action_counter_lock().clone()
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Snapshot {
    pub pets_adopted: u64,
    pub requests_served: u64,
    pub requests_failed: u64,
    pub actions: BTreeMap<String, ActionCounter>,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        pets_adopted: PETS_ADOPTED.load(Ordering::Relaxed),
        requests_served: REQUESTS_SERVED.load(Ordering::Relaxed),
        requests_failed: REQUESTS_FAILED.load(Ordering::Relaxed),
        actions: action_counters_snapshot()
            .into_iter()
            .map(|(kind, counter)| (kind.as_str().to_string(), counter))
            .collect(),
    }
}

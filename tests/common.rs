//! Shared fixtures for integration tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use petsim::pet::{ManualClock, Rules};
use petsim::service::PetService;
use petsim::storage::{MemoryPetStore, PetStore, SledPetStoreBuilder};

/// Midday UTC, safely outside the default night window.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Late evening UTC, inside the default night window.
#[allow(dead_code)]
pub fn late_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 22, 30, 0).unwrap()
}

/// Service over an in-memory store with a hand-driven clock.
#[allow(dead_code)]
pub fn memory_service(start: DateTime<Utc>) -> (Arc<PetService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let store: Arc<dyn PetStore> = Arc::new(MemoryPetStore::new());
    let service = PetService::new(store, clock.clone(), Rules::default());
    (Arc::new(service), clock)
}

/// Service over a sled store in `dir`.
#[allow(dead_code)]
pub fn sled_service(dir: &std::path::Path, clock: Arc<ManualClock>) -> PetService {
    let store = SledPetStoreBuilder::new(dir).open().expect("sled store");
    PetService::new(Arc::new(store), clock, Rules::default())
}

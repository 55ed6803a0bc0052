//! Persistence for pet records.
//!
//! The engine never touches storage. Callers go through [`PetStore`]:
//! load a record, mutate it, save it back. Two backends ship with the crate:
//!
//! - [`MemoryPetStore`]: a process-local map, used by tests and the
//!   `memory` backend.
//! - [`SledPetStore`]: an embedded sled database with bincode-encoded,
//!   schema-versioned records.
//!
//! Implementations are synchronous. Async callers should run them on a
//! blocking thread.

mod sled_store;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::pet::{PetError, PetState, PET_SCHEMA_VERSION};

pub use sled_store::{SledPetStore, SledPetStoreBuilder};

/// Record storage keyed by normalized user id.
pub trait PetStore: Send + Sync {
    /// Fetch the pet for `user_id`, or `None` if the user has none.
    fn load(&self, user_id: &str) -> Result<Option<PetState>, PetError>;

    /// Insert or replace the pet keyed by `state.user_id`.
    fn save(&self, state: &PetState) -> Result<(), PetError>;

    /// Every stored pet, ordered by user id.
    fn list(&self) -> Result<Vec<PetState>, PetError>;
}

/// In-memory store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryPetStore {
    pets: RwLock<HashMap<String, PetState>>,
}

impl MemoryPetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pets.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> PetError {
    PetError::Internal("pet store lock poisoned".to_string())
}

impl PetStore for MemoryPetStore {
    fn load(&self, user_id: &str) -> Result<Option<PetState>, PetError> {
        let pets = self.pets.read().map_err(poisoned)?;
        Ok(pets.get(user_id).cloned())
    }

    fn save(&self, state: &PetState) -> Result<(), PetError> {
        let mut record = state.clone();
        record.schema_version = PET_SCHEMA_VERSION;
        let mut pets = self.pets.write().map_err(poisoned)?;
        pets.insert(record.user_id.clone(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<PetState>, PetError> {
        let pets = self.pets.read().map_err(poisoned)?;
        let mut all: Vec<PetState> = pets.values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{PetType, Rules};
    use chrono::Utc;

    fn pet(user: &str) -> PetState {
        PetState::new(user, PetType::Dog, &Rules::default(), Utc::now())
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryPetStore::new();
        assert!(store.load("alice").unwrap().is_none());

        let mut alice = pet("alice");
        alice.level = 4;
        store.save(&alice).unwrap();

        let loaded = store.load("alice").unwrap().expect("stored");
        assert_eq!(loaded.level, 4);
        assert_eq!(loaded.pet_type, PetType::Dog);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_lists_in_user_order() {
        let store = MemoryPetStore::new();
        for user in ["carol", "alice", "bob"] {
            store.save(&pet(user)).unwrap();
        }
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }
}

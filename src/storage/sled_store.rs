use std::path::{Path, PathBuf};

use sled::IVec;

use crate::pet::{PetError, PetState, PET_SCHEMA_VERSION};
use crate::storage::PetStore;

const TREE_PETS: &str = "pets";
const KEY_PREFIX: &str = "pets:";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledPetStoreBuilder {
    path: PathBuf,
    flush_on_save: bool,
}

impl SledPetStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_save: true,
        }
    }

    /// Skip the fsync after each save. Sled still flushes in the background.
    pub fn without_flush(mut self) -> Self {
        self.flush_on_save = false;
        self
    }

    pub fn open(self) -> Result<SledPetStore, PetError> {
        SledPetStore::open_with_options(self.path, self.flush_on_save)
    }
}

/// Sled-backed pet records, one bincode value per user under `pets:<user>`.
pub struct SledPetStore {
    _db: sled::Db,
    pets: sled::Tree,
    flush_on_save: bool,
}

impl SledPetStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PetError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_on_save: bool) -> Result<Self, PetError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let pets = db.open_tree(TREE_PETS)?;
        Ok(Self {
            _db: db,
            pets,
            flush_on_save,
        })
    }

    fn pet_key(user_id: &str) -> Vec<u8> {
        format!("{}{}", KEY_PREFIX, user_id.to_ascii_lowercase()).into_bytes()
    }

    fn decode(bytes: IVec) -> Result<PetState, PetError> {
        let record: PetState = bincode::deserialize(&bytes)?;
        if record.schema_version != PET_SCHEMA_VERSION {
            return Err(PetError::SchemaMismatch {
                entity: "pet",
                expected: PET_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Write raw bytes under a user's key. Lets tests plant legacy or corrupt records.
    #[doc(hidden)]
    pub fn put_raw(&self, user_id: &str, bytes: &[u8]) -> Result<(), PetError> {
        self.pets.insert(Self::pet_key(user_id), bytes)?;
        self.pets.flush()?;
        Ok(())
    }
}

impl PetStore for SledPetStore {
    fn load(&self, user_id: &str) -> Result<Option<PetState>, PetError> {
        let Some(bytes) = self.pets.get(Self::pet_key(user_id))? else {
            return Ok(None);
        };
        Self::decode(bytes).map(Some)
    }

    fn save(&self, state: &PetState) -> Result<(), PetError> {
        let mut record = state.clone();
        record.schema_version = PET_SCHEMA_VERSION;
        let bytes = bincode::serialize(&record)?;
        self.pets.insert(Self::pet_key(&record.user_id), bytes)?;
        if self.flush_on_save {
            self.pets.flush()?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<PetState>, PetError> {
        let mut all = Vec::new();
        for entry in self.pets.scan_prefix(KEY_PREFIX.as_bytes()) {
            let (_, bytes) = entry?;
            all.push(Self::decode(bytes)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::{PetType, Rules};
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_pet() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledPetStoreBuilder::new(dir.path()).open().expect("store");
        let mut pet = PetState::new("alice", PetType::Rabbit, &Rules::default(), Utc::now());
        pet.stats.hunger = 12.345;
        pet.counters.feed_count = 7;
        store.save(&pet).expect("save");

        let fetched = store.load("alice").expect("load").expect("present");
        assert_eq!(fetched.pet_type, PetType::Rabbit);
        assert_eq!(fetched.stats.hunger, 12.345);
        assert_eq!(fetched.counters.feed_count, 7);
        assert_eq!(fetched.schema_version, PET_SCHEMA_VERSION);
        assert!(store.load("bob").expect("load").is_none());
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let store = SledPetStoreBuilder::new(dir.path()).open().expect("store");
        let mut pet = PetState::new("alice", PetType::Cat, &Rules::default(), Utc::now());
        pet.schema_version = PET_SCHEMA_VERSION + 1;
        store
            .put_raw("alice", &bincode::serialize(&pet).expect("encode"))
            .expect("put raw");

        match store.load("alice") {
            Err(PetError::SchemaMismatch { entity, found, .. }) => {
                assert_eq!(entity, "pet");
                assert_eq!(found, PET_SCHEMA_VERSION + 1);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }
}

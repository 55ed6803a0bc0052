//! Per-user pet operations on top of a [`PetStore`].
//!
//! Every operation follows the same shape: normalize the user id, take that
//! user's lock, load the pet, bring decay up to the clock's `now`, apply the
//! action, save. The per-user lock is what keeps two concurrent feeds from
//! losing an increment; different users never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::{Config, StorageBackend};
use crate::metrics;
use crate::pet::{
    ActionKind, ActionOutcome, Clock, DayCycle, PetError, PetState, PetStateEngine, PetStatus,
    PetType, Rules, SystemClock,
};
use crate::storage::{MemoryPetStore, PetStore, SledPetStore};
use crate::validation::normalize_user_id;

type CareAction = fn(&PetStateEngine, &mut PetState, DateTime<Utc>) -> ActionOutcome;

/// Result of one action, with the pet as saved afterwards.
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub kind: ActionKind,
    pub outcome: ActionOutcome,
    /// The action happened at night and was also counted as a night interaction.
    pub night_interaction: bool,
    pub state: PetState,
}

#[derive(Debug, Clone)]
pub struct AdoptReport {
    pub created: bool,
    pub state: PetState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub level: u32,
    pub happiness: u8,
    pub total_interactions: u32,
    pub play_time_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_pets: usize,
    pub average_level: f64,
    pub total_interactions: u64,
    pub most_popular_type: PetType,
    pub most_popular_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub level: u32,
    pub total_interactions: u32,
    pub play_time_minutes: u64,
    pub feed_count: u32,
    pub play_count: u32,
    pub sleep_count: u32,
    pub night_interactions: u32,
    pub achievements: usize,
}

pub struct PetService {
    store: Arc<dyn PetStore>,
    clock: Arc<dyn Clock>,
    engine: PetStateEngine,
    day_cycle: DayCycle,
    default_limit: usize,
    max_limit: usize,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PetService {
    pub fn new(store: Arc<dyn PetStore>, clock: Arc<dyn Clock>, rules: Rules) -> Self {
        Self {
            store,
            clock,
            engine: PetStateEngine::new(rules),
            day_cycle: DayCycle::default(),
            default_limit: 10,
            max_limit: 100,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_day_cycle(mut self, day_cycle: DayCycle) -> Self {
        self.day_cycle = day_cycle;
        self
    }

    pub fn with_leaderboard_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    /// Build a service with the configured backend and the system clock.
    pub fn from_config(config: &Config) -> Result<Self, PetError> {
        let store: Arc<dyn PetStore> = match config.storage.backend {
            StorageBackend::Sled => Arc::new(SledPetStore::open(config.storage.pets_path())?),
            StorageBackend::Memory => Arc::new(MemoryPetStore::new()),
        };
        Ok(Self::new(store, Arc::new(SystemClock), config.rules.clone())
            .with_day_cycle(config.day_cycle.clone())
            .with_leaderboard_limits(
                config.leaderboard.default_limit,
                config.leaderboard.max_limit,
            ))
    }

    pub fn rules(&self) -> &Rules {
        self.engine.rules()
    }

    pub fn day_cycle(&self) -> &DayCycle {
        &self.day_cycle
    }

    pub fn status(&self, state: &PetState) -> PetStatus {
        state.status(self.engine.rules())
    }

    /// Create the user's pet, or return the existing one with decay applied.
    /// `pet_type` only matters when a pet is created.
    pub fn adopt(&self, raw_user: &str, pet_type: Option<&str>) -> Result<AdoptReport, PetError> {
        let user_id = normalize_user_id(raw_user)?;
        let pet_type = match pet_type {
            Some(name) => name.parse::<PetType>()?,
            None => PetType::default(),
        };
        let (state, created) = self.locked(&user_id, || {
            let now = self.clock.now();
            let (mut state, created) = match self.store.load(&user_id)? {
                Some(mut existing) => {
                    self.engine.apply_decay(&mut existing, now);
                    (existing, false)
                }
                None => (self.engine.create(&user_id, pet_type, now), true),
            };
            state.updated_at = now;
            self.store.save(&state)?;
            Ok((state, created))
        })?;

        if created {
            metrics::inc_pets_adopted();
            info!("{} adopted a {}", user_id, state.pet_type);
        }
        Ok(AdoptReport { created, state })
    }

    /// The user's pet with decay brought up to now.
    pub fn get(&self, raw_user: &str) -> Result<PetState, PetError> {
        let ((), state) = self.with_pet(raw_user, |_, _, _| Ok(()))?;
        Ok(state)
    }

    pub fn feed(&self, raw_user: &str) -> Result<ActionReport, PetError> {
        self.care(raw_user, ActionKind::Feed, PetStateEngine::feed)
    }

    pub fn play(&self, raw_user: &str) -> Result<ActionReport, PetError> {
        self.care(raw_user, ActionKind::Play, PetStateEngine::play)
    }

    pub fn sleep(&self, raw_user: &str) -> Result<ActionReport, PetError> {
        self.care(raw_user, ActionKind::Sleep, PetStateEngine::sleep)
    }

    pub fn clean(&self, raw_user: &str) -> Result<ActionReport, PetError> {
        self.care(raw_user, ActionKind::Clean, PetStateEngine::clean)
    }

    /// Record a night interaction regardless of the day cycle.
    pub fn night_interaction(&self, raw_user: &str) -> Result<ActionReport, PetError> {
        let (outcome, state) = self.with_pet(raw_user, |engine, state, now| {
            Ok(engine.record_night_interaction(state, now))
        })?;
        metrics::record_action(ActionKind::NightInteraction, outcome.is_applied());
        Ok(ActionReport {
            kind: ActionKind::NightInteraction,
            outcome,
            night_interaction: true,
            state,
        })
    }

    pub fn change_type(&self, raw_user: &str, new_type: &str) -> Result<PetState, PetError> {
        let (_, state) = self.with_pet(raw_user, |engine, state, _| engine.change_type(state, new_type))?;
        metrics::record_action(ActionKind::ChangeType, true);
        Ok(state)
    }

    /// Pets ranked by level, then happiness. `limit` of `None` or zero means
    /// the default; anything above the maximum is capped.
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, PetError> {
        let limit = match limit {
            Some(n) if n > 0 => n.min(self.max_limit),
            _ => self.default_limit,
        };
        let mut pets = self.store.list()?;
        pets.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| b.stats.happiness.total_cmp(&a.stats.happiness))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        let rules = self.engine.rules();
        Ok(pets
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, pet)| {
                let status = pet.status(rules);
                LeaderboardEntry {
                    rank: i + 1,
                    user_id: status.user_id,
                    pet_type: status.pet_type,
                    level: status.level,
                    happiness: status.happiness,
                    total_interactions: status.total_interactions,
                    play_time_minutes: status.play_time_minutes,
                }
            })
            .collect())
    }

    pub fn global_stats(&self) -> Result<GlobalStats, PetError> {
        let pets = self.store.list()?;
        let total_pets = pets.len();
        let level_sum: u64 = pets.iter().map(|p| u64::from(p.level)).sum();
        let average_level = if total_pets == 0 {
            0.0
        } else {
            level_sum as f64 / total_pets as f64
        };
        let total_interactions: u64 = pets
            .iter()
            .map(|p| u64::from(p.counters.total_interactions))
            .sum();

        // Ties go to the species declared first.
        let mut most_popular_type = PetType::default();
        let mut most_popular_count = 0;
        for pet_type in PetType::ALL {
            let count = pets.iter().filter(|p| p.pet_type == pet_type).count();
            if count > most_popular_count {
                most_popular_type = pet_type;
                most_popular_count = count;
            }
        }

        Ok(GlobalStats {
            total_pets,
            average_level,
            total_interactions,
            most_popular_type,
            most_popular_count,
        })
    }

    pub fn user_stats(&self, raw_user: &str) -> Result<UserStats, PetError> {
        let state = self.get(raw_user)?;
        Ok(UserStats {
            user_id: state.user_id.clone(),
            pet_type: state.pet_type,
            level: state.level,
            total_interactions: state.counters.total_interactions,
            play_time_minutes: state.play_time_minutes,
            feed_count: state.counters.feed_count,
            play_count: state.counters.play_count,
            sleep_count: state.counters.sleep_count,
            night_interactions: state.counters.night_interactions,
            achievements: state.achievements.count(),
        })
    }

    fn care(&self, raw_user: &str, kind: ActionKind, action: CareAction) -> Result<ActionReport, PetError> {
        let ((outcome, night_interaction), state) = self.with_pet(raw_user, |engine, state, now| {
            let mut outcome = action(engine, state, now);
            let mut night = false;
            if let ActionOutcome::Applied(effects) = &mut outcome {
                if self.day_cycle.is_night(now) {
                    if let ActionOutcome::Applied(extra) = engine.record_night_interaction(state, now) {
                        effects.unlocked.extend(extra.unlocked);
                    }
                    night = true;
                }
            }
            Ok((outcome, night))
        })?;
        metrics::record_action(kind, outcome.is_applied());
        Ok(ActionReport {
            kind,
            outcome,
            night_interaction,
            state,
        })
    }

    /// Load, decay, run `f`, save. Nothing is saved when `f` fails.
    fn with_pet<R>(
        &self,
        raw_user: &str,
        f: impl FnOnce(&PetStateEngine, &mut PetState, DateTime<Utc>) -> Result<R, PetError>,
    ) -> Result<(R, PetState), PetError> {
        let user_id = normalize_user_id(raw_user)?;
        self.locked(&user_id, || {
            let mut state = self
                .store
                .load(&user_id)?
                .ok_or_else(|| PetError::NotFound(user_id.clone()))?;
            let now = self.clock.now();
            self.engine.apply_decay(&mut state, now);
            let result = f(&self.engine, &mut state, now)?;
            state.updated_at = now;
            self.store.save(&state)?;
            Ok((result, state))
        })
    }

    /// Run `f` holding this user's lock. The table entry is dropped again once
    /// no other caller holds or waits on it, so ids without pets leave nothing behind.
    fn locked<R>(&self, user_id: &str, f: impl FnOnce() -> Result<R, PetError>) -> Result<R, PetError> {
        let lock = self.user_lock(user_id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(PetError::Internal(format!("lock poisoned for {}", user_id))),
        };
        self.release_lock(user_id, lock)?;
        result
    }

    fn user_lock(&self, user_id: &str) -> Result<Arc<Mutex<()>>, PetError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| PetError::Internal("user lock table poisoned".to_string()))?;
        Ok(locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    fn release_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) -> Result<(), PetError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| PetError::Internal("user lock table poisoned".to_string()))?;
        // Two references left: the table's and ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
        Ok(())
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

//! The pet state machine.
//!
//! Two clocks drive a pet: discrete actions (feed, play, sleep, clean, night
//! interactions, type changes) and passive decay over elapsed wall-clock
//! time. Decay never acts, and actions only decay in one case: `sleep`
//! settles an earlier window that decay has not consumed yet. Callers that
//! want both bring decay up to `now` first and then apply the action; that
//! ordering is what keeps an interval from being counted twice.
//!
//! All stat arithmetic clamps into `[0, 100]` instead of failing. The only
//! failure is an unknown pet type; a refused action (playing with a sleeping
//! pet, putting an already sleeping pet to bed) is reported through
//! [`ActionOutcome::Refused`] and leaves the state untouched.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pet::achievement::{check_unlocks, Achievement};
use crate::pet::errors::PetError;
use crate::pet::rules::{ActionDeltas, Rules};
use crate::pet::types::{clamp_stat, duration_secs, PetState, PetType, SleepWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Feed,
    Play,
    Sleep,
    Clean,
    NightInteraction,
    ChangeType,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Feed => "feed",
            ActionKind::Play => "play",
            ActionKind::Sleep => "sleep",
            ActionKind::Clean => "clean",
            ActionKind::NightInteraction => "night_interaction",
            ActionKind::ChangeType => "change_type",
        }
    }

    /// Whether performing this action at night also counts as a night interaction.
    pub fn is_care(self) -> bool {
        matches!(
            self,
            ActionKind::Feed | ActionKind::Play | ActionKind::Sleep | ActionKind::Clean
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalReason {
    /// The pet is asleep and cannot play.
    Sleeping,
    /// The pet is already asleep.
    AlreadySleeping,
}

impl RefusalReason {
    pub fn message(self) -> &'static str {
        match self {
            RefusalReason::Sleeping => "Shhh... your pet is sleeping!",
            RefusalReason::AlreadySleeping => "Your pet is already asleep.",
        }
    }
}

/// What an applied action changed beyond the stats themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEffects {
    pub leveled_up: bool,
    pub unlocked: Vec<Achievement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(ActionEffects),
    Refused(RefusalReason),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }

    pub fn effects(&self) -> Option<&ActionEffects> {
        match self {
            ActionOutcome::Applied(effects) => Some(effects),
            ActionOutcome::Refused(_) => None,
        }
    }
}

/// Applies actions and decay to a single [`PetState`].
///
/// The engine holds only its [`Rules`]; it owns no pets, so one engine can
/// serve any number of them as long as each pet's calls are serialized.
#[derive(Debug, Clone, Default)]
pub struct PetStateEngine {
    rules: Rules,
}

impl PetStateEngine {
    pub fn new(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// A fresh level-1 pet with the configured initial stats.
    pub fn create(&self, user_id: &str, pet_type: PetType, now: DateTime<Utc>) -> PetState {
        PetState::new(user_id, pet_type, &self.rules, now)
    }

    pub fn feed(&self, state: &mut PetState, now: DateTime<Utc>) -> ActionOutcome {
        self.settle_sleep(state, now);
        state.stats.apply(&self.rules.feed);
        state.counters.feed_count = state.counters.feed_count.saturating_add(1);
        ActionOutcome::Applied(self.finish_interaction(state, &self.rules.feed, now))
    }

    pub fn play(&self, state: &mut PetState, now: DateTime<Utc>) -> ActionOutcome {
        self.settle_sleep(state, now);
        if state.is_sleeping {
            return ActionOutcome::Refused(RefusalReason::Sleeping);
        }
        state.stats.apply(&self.rules.play);
        state.counters.play_count = state.counters.play_count.saturating_add(1);
        ActionOutcome::Applied(self.finish_interaction(state, &self.rules.play, now))
    }

    /// Puts the pet to bed for `sleep_cooldown_secs`. The pet wakes on its
    /// own: the window is stored on the state and expires lazily.
    ///
    /// An earlier window that decay has not yet consumed is settled first by
    /// bringing decay up to `now`, so the slept seconds are not lost.
    pub fn sleep(&self, state: &mut PetState, now: DateTime<Utc>) -> ActionOutcome {
        if state.sleep.is_some_and(|w| state.last_update < w.until && now >= w.until) {
            self.apply_decay(state, now);
        }
        self.settle_sleep(state, now);
        if state.is_sleeping {
            return ActionOutcome::Refused(RefusalReason::AlreadySleeping);
        }
        state.stats.apply(&self.rules.sleep);
        state.counters.sleep_count = state.counters.sleep_count.saturating_add(1);
        state.sleep = Some(SleepWindow {
            started_at: now,
            until: now + Duration::seconds(i64::from(self.rules.sleep_cooldown_secs)),
        });
        state.is_sleeping = self.rules.sleep_cooldown_secs > 0;
        ActionOutcome::Applied(self.finish_interaction(state, &self.rules.sleep, now))
    }

    pub fn clean(&self, state: &mut PetState, now: DateTime<Utc>) -> ActionOutcome {
        self.settle_sleep(state, now);
        state.stats.apply(&self.rules.clean);
        ActionOutcome::Applied(self.finish_interaction(state, &self.rules.clean, now))
    }

    /// Counts a night interaction. Deciding whether it is night is the
    /// caller's job; this never touches experience or total interactions.
    pub fn record_night_interaction(&self, state: &mut PetState, now: DateTime<Utc>) -> ActionOutcome {
        self.settle_sleep(state, now);
        state.counters.night_interactions = state.counters.night_interactions.saturating_add(1);
        let unlocked = check_unlocks(state, &self.rules, now);
        ActionOutcome::Applied(ActionEffects {
            leveled_up: false,
            unlocked,
        })
    }

    /// Switch species. Unknown names fail with [`PetError::InvalidPetType`]
    /// and leave the state unchanged.
    pub fn change_type(&self, state: &mut PetState, new_type: &str) -> Result<PetType, PetError> {
        let pet_type: PetType = new_type.parse()?;
        state.pet_type = pet_type;
        Ok(pet_type)
    }

    /// Bring passive decay up to `now`.
    ///
    /// Decay is rate × awake seconds, where awake seconds are the elapsed
    /// interval minus its overlap with the sleep window. Calls may come at
    /// any cadence: one call over N seconds and N one-second calls land on
    /// the same stats up to clamping, and repeating a call with the same
    /// `now` is a no-op. A `now` before the last update counts as zero
    /// elapsed time.
    pub fn apply_decay(&self, state: &mut PetState, now: DateTime<Utc>) {
        if now > state.last_update {
            let elapsed = seconds_between(state.last_update, now);
            let asleep = state
                .sleep
                .map_or(0.0, |w| w.overlap_secs(state.last_update, now));
            let awake = (elapsed - asleep).max(0.0);
            if awake > 0.0 {
                let rates = self.rules.decay;
                state.stats.hunger = clamp_stat(state.stats.hunger - awake * rates.hunger);
                state.stats.happiness = clamp_stat(state.stats.happiness - awake * rates.happiness);
                state.stats.energy = clamp_stat(state.stats.energy - awake * rates.energy);
            }
            state.last_update = now;
        }

        let minutes = (now - state.created_at).num_seconds().max(0) / 60;
        state.play_time_minutes = state.play_time_minutes.max(minutes as u64);

        self.settle_sleep(state, now);
    }

    /// Refresh `is_sleeping` from the stored window. The window itself is
    /// dropped only once decay has moved past it, since decay still needs it
    /// to exclude the slept interval.
    fn settle_sleep(&self, state: &mut PetState, now: DateTime<Utc>) {
        state.is_sleeping = state.sleeping_at(now);
        if let Some(window) = state.sleep {
            if now >= window.until && state.last_update >= window.until {
                state.sleep = None;
            }
        }
    }

    fn finish_interaction(
        &self,
        state: &mut PetState,
        deltas: &ActionDeltas,
        now: DateTime<Utc>,
    ) -> ActionEffects {
        state.counters.total_interactions = state.counters.total_interactions.saturating_add(1);
        let leveled_up = self.grant_experience(state, deltas.experience);
        let unlocked = check_unlocks(state, &self.rules, now);
        ActionEffects {
            leveled_up,
            unlocked,
        }
    }

    /// One level-up at most per grant; experience restarts from zero on the new level.
    fn grant_experience(&self, state: &mut PetState, amount: u32) -> bool {
        state.experience = state.experience.saturating_add(amount);
        if u64::from(state.experience) >= self.rules.exp_needed(state.level) {
            state.level = state.level.saturating_add(1);
            state.experience = 0;
            debug!("{} reached level {}", state.user_id, state.level);
            return true;
        }
        false
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    duration_secs(to - from)
}

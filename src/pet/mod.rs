//! Pet data model and state machine.
//!
//! [`PetStateEngine`] owns the rules; [`PetState`] is the plain record it
//! mutates. Everything here is synchronous and storage-agnostic: callers load
//! a state, hand it to the engine together with a timestamp, and persist the
//! result themselves.

pub mod achievement;
pub mod clock;
pub mod cycle;
pub mod engine;
pub mod errors;
pub mod rules;
pub mod types;

pub use achievement::{check_unlocks, Achievement, AchievementTrigger, PetAchievements};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cycle::{DayCycle, DayPhase};
pub use engine::{ActionEffects, ActionKind, ActionOutcome, PetStateEngine, RefusalReason};
pub use errors::PetError;
pub use rules::{ActionDeltas, DecayRates, Rules};
pub use types::*;

//! Achievement catalogue and unlock rules.
//!
//! Every achievement is a threshold on one monotone counter. Unlocks are
//! recorded with a timestamp and never removed, so a flag that turned true
//! stays true for the life of the pet.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::pet::rules::Rules;
use crate::pet::types::{Counters, PetState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    FirstMeal,
    Playful,
    GoodNight,
    NightOwl,
}

/// Counter condition that earns an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementTrigger {
    FeedCount { required: u32 },
    PlayCount { required: u32 },
    SleepCount { required: u32 },
    NightInteractions { required: u32 },
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FirstMeal,
        Achievement::Playful,
        Achievement::GoodNight,
        Achievement::NightOwl,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Achievement::FirstMeal => "firstMeal",
            Achievement::Playful => "playful",
            Achievement::GoodNight => "goodNight",
            Achievement::NightOwl => "nightOwl",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstMeal => "First Meal",
            Achievement::Playful => "Playful",
            Achievement::GoodNight => "Good Night",
            Achievement::NightOwl => "Night Owl",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstMeal => "Feed your pet for the first time",
            Achievement::Playful => "Play with your pet several times",
            Achievement::GoodNight => "Put your pet to bed a few times",
            Achievement::NightOwl => "Keep your pet company at night",
        }
    }

    pub fn trigger(self, rules: &Rules) -> AchievementTrigger {
        match self {
            Achievement::FirstMeal => AchievementTrigger::FeedCount { required: 1 },
            Achievement::Playful => AchievementTrigger::PlayCount {
                required: rules.playful_plays,
            },
            Achievement::GoodNight => AchievementTrigger::SleepCount {
                required: rules.good_night_sleeps,
            },
            Achievement::NightOwl => AchievementTrigger::NightInteractions {
                required: rules.night_owl_interactions,
            },
        }
    }
}

/// Check if a trigger's requirement is met by the current counters
fn is_achievement_earned(trigger: AchievementTrigger, counters: &Counters) -> bool {
    use AchievementTrigger::*;

    match trigger {
        FeedCount { required } => counters.feed_count >= required,
        PlayCount { required } => counters.play_count >= required,
        SleepCount { required } => counters.sleep_count >= required,
        NightInteractions { required } => counters.night_interactions >= required,
    }
}

/// Unlocked achievements with the time each was earned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PetAchievements {
    earned: BTreeMap<Achievement, DateTime<Utc>>,
}

impl PetAchievements {
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.earned.contains_key(&achievement)
    }

    /// Record an unlock. Returns false if it was already unlocked, in which
    /// case the first timestamp is kept.
    pub fn unlock(&mut self, achievement: Achievement, at: DateTime<Utc>) -> bool {
        if self.earned.contains_key(&achievement) {
            return false;
        }
        self.earned.insert(achievement, at);
        true
    }

    pub fn earned_at(&self, achievement: Achievement) -> Option<DateTime<Utc>> {
        self.earned.get(&achievement).copied()
    }

    /// Unlocked achievements in catalogue order.
    pub fn unlocked(&self) -> Vec<Achievement> {
        self.earned.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.earned.len()
    }
}

/// Unlock every achievement whose trigger the pet's counters now satisfy.
/// Returns only the achievements newly unlocked by this call.
pub fn check_unlocks(state: &mut PetState, rules: &Rules, now: DateTime<Utc>) -> Vec<Achievement> {
    let mut awarded = Vec::new();

    for achievement in Achievement::ALL {
        if state.achievements.is_unlocked(achievement) {
            continue;
        }
        if is_achievement_earned(achievement.trigger(rules), &state.counters)
            && state.achievements.unlock(achievement, now)
        {
            debug!("{} unlocked {}", state.user_id, achievement.id());
            awarded.push(achievement);
        }
    }

    awarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::types::PetType;
    use chrono::{Duration, TimeZone};

    fn setup_pet() -> (PetState, Rules, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let rules = Rules::default();
        (PetState::new("testuser", PetType::Cat, &rules, now), rules, now)
    }

    #[test]
    fn test_nothing_unlocked_for_new_pet() {
        let (mut pet, rules, now) = setup_pet();
        assert!(check_unlocks(&mut pet, &rules, now).is_empty());
        assert_eq!(pet.achievements.count(), 0);
    }

    #[test]
    fn test_thresholds() {
        let (mut pet, rules, now) = setup_pet();

        pet.counters.play_count = 4;
        pet.counters.sleep_count = 2;
        assert!(check_unlocks(&mut pet, &rules, now).is_empty());

        pet.counters.play_count = 5;
        pet.counters.sleep_count = 3;
        let awarded = check_unlocks(&mut pet, &rules, now);
        assert_eq!(awarded, vec![Achievement::Playful, Achievement::GoodNight]);
    }

    #[test]
    fn test_unlock_happens_once() {
        let (mut pet, rules, now) = setup_pet();
        pet.counters.feed_count = 1;
        assert_eq!(check_unlocks(&mut pet, &rules, now), vec![Achievement::FirstMeal]);

        pet.counters.feed_count = 2;
        let later = now + Duration::minutes(3);
        assert!(check_unlocks(&mut pet, &rules, later).is_empty());
        assert_eq!(pet.achievements.earned_at(Achievement::FirstMeal), Some(now));
    }

    #[test]
    fn test_manual_unlock_is_idempotent() {
        let mut book = PetAchievements::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(book.unlock(Achievement::NightOwl, at));
        assert!(!book.unlock(Achievement::NightOwl, at + Duration::days(1)));
        assert_eq!(book.unlocked(), vec![Achievement::NightOwl]);
    }

    #[test]
    fn test_serializes_with_camel_case_ids() {
        let mut book = PetAchievements::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        book.unlock(Achievement::FirstMeal, at);
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.contains("\"firstMeal\""));
        let back: PetAchievements = serde_json::from_str(&json).unwrap();
        assert_eq!(back, book);
    }
}

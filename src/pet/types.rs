use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pet::achievement::{Achievement, PetAchievements};
use crate::pet::errors::PetError;
use crate::pet::rules::{ActionDeltas, Rules};

pub const PET_SCHEMA_VERSION: u8 = 1;

pub const STAT_MIN: f64 = 0.0;
pub const STAT_MAX: f64 = 100.0;

/// Species a pet can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    #[default]
    Cat,
    Dog,
    Rabbit,
    Fox,
}

impl PetType {
    pub const ALL: [PetType; 4] = [PetType::Cat, PetType::Dog, PetType::Rabbit, PetType::Fox];

    pub fn as_str(self) -> &'static str {
        match self {
            PetType::Cat => "cat",
            PetType::Dog => "dog",
            PetType::Rabbit => "rabbit",
            PetType::Fox => "fox",
        }
    }

    /// Favourite treat, shown when the pet is very happy.
    pub fn accessory(self) -> &'static str {
        match self {
            PetType::Cat => "🐟",
            PetType::Dog => "🦴",
            PetType::Rabbit => "🥕",
            PetType::Fox => "🍇",
        }
    }
}

impl fmt::Display for PetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetType {
    type Err = PetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PetError::InvalidPetType(s.to_string()))
    }
}

/// The three bounded needs, kept at full precision so slow decay accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
}

pub(crate) fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

impl Stats {
    pub fn new(hunger: f64, happiness: f64, energy: f64) -> Self {
        Self {
            hunger: clamp_stat(hunger),
            happiness: clamp_stat(happiness),
            energy: clamp_stat(energy),
        }
    }

    pub(crate) fn apply(&mut self, deltas: &ActionDeltas) {
        self.hunger = clamp_stat(self.hunger + deltas.hunger);
        self.happiness = clamp_stat(self.happiness + deltas.happiness);
        self.energy = clamp_stat(self.energy + deltas.energy);
    }

    pub fn in_bounds(&self) -> bool {
        [self.hunger, self.happiness, self.energy]
            .iter()
            .all(|v| (STAT_MIN..=STAT_MAX).contains(v))
    }
}

/// Monotone interaction counters. Clean has no counter of its own; it only
/// shows up in `total_interactions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub feed_count: u32,
    pub play_count: u32,
    pub sleep_count: u32,
    pub night_interactions: u32,
    pub total_interactions: u32,
}

/// A sleep action's cooldown window, `[started_at, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepWindow {
    pub started_at: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl SleepWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.started_at <= at && at < self.until
    }

    /// Seconds of `[from, to)` spent inside this window.
    pub fn overlap_secs(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        let start = from.max(self.started_at);
        let end = to.min(self.until);
        if end <= start {
            return 0.0;
        }
        duration_secs(end - start)
    }
}

/// Fractional seconds at nanosecond resolution, falling back to
/// milliseconds for spans too long for an `i64` of nanoseconds.
pub(crate) fn duration_secs(span: chrono::Duration) -> f64 {
    match span.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => span.num_milliseconds() as f64 / 1e3,
    }
}

/// One user's pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetState {
    pub user_id: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub stats: Stats,
    pub level: u32,
    pub experience: u32,
    /// Refreshed from `sleep` by every engine call.
    pub is_sleeping: bool,
    pub sleep: Option<SleepWindow>,
    pub counters: Counters,
    pub play_time_minutes: u64,
    pub achievements: PetAchievements,
    pub created_at: DateTime<Utc>,
    /// Last time passive decay was applied.
    pub last_update: DateTime<Utc>,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PetState {
    pub fn new(user_id: &str, pet_type: PetType, rules: &Rules, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            pet_type,
            stats: Stats::new(
                rules.initial_hunger,
                rules.initial_happiness,
                rules.initial_energy,
            ),
            level: 1,
            experience: 0,
            is_sleeping: false,
            sleep: None,
            counters: Counters::default(),
            play_time_minutes: 0,
            achievements: PetAchievements::default(),
            created_at: now,
            last_update: now,
            updated_at: now,
            schema_version: PET_SCHEMA_VERSION,
        }
    }

    /// Whether the pet is asleep at `at`, independent of the cached flag.
    pub fn sleeping_at(&self, at: DateTime<Utc>) -> bool {
        self.sleep.is_some_and(|w| w.contains(at))
    }

    /// Whole-number projection for display.
    pub fn status(&self, rules: &Rules) -> PetStatus {
        let hunger = round_stat(self.stats.hunger);
        let happiness = round_stat(self.stats.happiness);
        let energy = round_stat(self.stats.energy);
        PetStatus {
            user_id: self.user_id.clone(),
            pet_type: self.pet_type,
            hunger,
            happiness,
            energy,
            level: self.level,
            experience: self.experience,
            experience_to_next: rules
                .exp_needed(self.level)
                .saturating_sub(u64::from(self.experience)),
            is_sleeping: self.is_sleeping,
            mood: Mood::derive(hunger, happiness, self.is_sleeping),
            eyes: Eyes::derive(energy),
            feed_count: self.counters.feed_count,
            play_count: self.counters.play_count,
            sleep_count: self.counters.sleep_count,
            night_interactions: self.counters.night_interactions,
            total_interactions: self.counters.total_interactions,
            play_time_minutes: self.play_time_minutes,
            achievements: self.achievements.unlocked(),
        }
    }
}

fn round_stat(v: f64) -> u8 {
    clamp_stat(v).round() as u8
}

/// How the pet looks right now, derived from the rounded stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Sleeping,
    Hungry,
    Happy,
    Content,
    Sad,
}

impl Mood {
    pub fn derive(hunger: u8, happiness: u8, sleeping: bool) -> Mood {
        if sleeping {
            return Mood::Sleeping;
        }
        if hunger <= 30 {
            return Mood::Hungry;
        }
        if happiness >= 70 {
            return Mood::Happy;
        }
        if happiness >= 40 {
            return Mood::Content;
        }
        Mood::Sad
    }
}

/// Eye style by energy: bright at 70 and above, sleepy below 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eyes {
    Bright,
    Normal,
    Sleepy,
}

impl Eyes {
    pub fn derive(energy: u8) -> Eyes {
        match energy {
            70.. => Eyes::Bright,
            30..=69 => Eyes::Normal,
            _ => Eyes::Sleepy,
        }
    }
}

/// Read-only view handed to renderers. Stats are whole percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetStatus {
    pub user_id: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub hunger: u8,
    pub happiness: u8,
    pub energy: u8,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u64,
    pub is_sleeping: bool,
    pub mood: Mood,
    pub eyes: Eyes,
    pub feed_count: u32,
    pub play_count: u32,
    pub sleep_count: u32,
    pub night_interactions: u32,
    pub total_interactions: u32,
    pub play_time_minutes: u64,
    pub achievements: Vec<Achievement>,
}

/// Format a status panel for terminal display
pub fn format_pet_status(status: &PetStatus) -> String {
    let bar = |v: u8| {
        let filled = usize::from(v / 10);
        format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
    };
    let sleeping = if status.is_sleeping { " [ASLEEP]" } else { "" };

    let mut output = format!(
        "=== {}'s {} ==={}\nLevel {} ({} xp, {} to next)  Mood: {:?}  Eyes: {:?}\n",
        status.user_id,
        status.pet_type,
        sleeping,
        status.level,
        status.experience,
        status.experience_to_next,
        status.mood,
        status.eyes
    );
    output.push_str(&format!("Hunger:    {:>3}% {}\n", status.hunger, bar(status.hunger)));
    output.push_str(&format!(
        "Happiness: {:>3}% {}\n",
        status.happiness,
        bar(status.happiness)
    ));
    output.push_str(&format!("Energy:    {:>3}% {}\n", status.energy, bar(status.energy)));
    if status.happiness >= 80 && !status.is_sleeping {
        output.push_str(&format!("Holding a treat {}\n", status.pet_type.accessory()));
    }
    output.push_str(&format!(
        "\nPlay time: {}m  Interactions: {} (feed {}, play {}, sleep {}, night {})\n",
        status.play_time_minutes,
        status.total_interactions,
        status.feed_count,
        status.play_count,
        status.sleep_count,
        status.night_interactions
    ));

    if status.achievements.is_empty() {
        output.push_str("Achievements: none yet\n");
    } else {
        let titles: Vec<&str> = status.achievements.iter().map(|a| a.title()).collect();
        output.push_str(&format!("Achievements: {}\n", titles.join(", ")));
    }

    output
}

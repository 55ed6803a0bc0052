use serde::{Deserialize, Serialize};

/// Stat changes applied by one action. Positive raises, negative lowers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionDeltas {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
    pub experience: u32,
}

/// Passive decay rates, in stat points per awake second.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecayRates {
    pub hunger: f64,
    pub happiness: f64,
    pub energy: f64,
}

/// Every tunable number the engine uses. `Rules::default()` is the canonical
/// balance; the `[rules]` config section can override any field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub initial_hunger: f64,
    pub initial_happiness: f64,
    pub initial_energy: f64,
    pub feed: ActionDeltas,
    pub play: ActionDeltas,
    pub sleep: ActionDeltas,
    pub clean: ActionDeltas,
    pub decay: DecayRates,
    pub sleep_cooldown_secs: u32,
    /// Experience needed per level: level N needs `N * exp_per_level`.
    pub exp_per_level: u32,
    pub playful_plays: u32,
    pub good_night_sleeps: u32,
    pub night_owl_interactions: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            initial_hunger: 50.0,
            initial_happiness: 70.0,
            initial_energy: 60.0,
            feed: ActionDeltas {
                hunger: 15.0,
                happiness: 5.0,
                energy: 5.0,
                experience: 5,
            },
            play: ActionDeltas {
                hunger: -5.0,
                happiness: 15.0,
                energy: -10.0,
                experience: 8,
            },
            sleep: ActionDeltas {
                hunger: -10.0,
                happiness: 0.0,
                energy: 20.0,
                experience: 3,
            },
            clean: ActionDeltas {
                hunger: 0.0,
                happiness: 10.0,
                energy: 0.0,
                experience: 2,
            },
            decay: DecayRates {
                hunger: 0.1,
                happiness: 0.05,
                energy: 0.07,
            },
            sleep_cooldown_secs: 5,
            exp_per_level: 50,
            playful_plays: 5,
            good_night_sleeps: 3,
            night_owl_interactions: 1,
        }
    }
}

impl Rules {
    /// Experience required to leave `level`.
    pub fn exp_needed(&self, level: u32) -> u64 {
        u64::from(level) * u64::from(self.exp_per_level)
    }

    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.exp_per_level == 0 {
            return Err("rules.exp_per_level must be greater than zero".to_string());
        }
        for (name, rate) in [
            ("hunger", self.decay.hunger),
            ("happiness", self.decay.happiness),
            ("energy", self.decay.energy),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(format!("rules.decay.{name} must be a non-negative number"));
            }
        }
        for (name, value) in [
            ("initial_hunger", self.initial_hunger),
            ("initial_happiness", self.initial_happiness),
            ("initial_energy", self.initial_energy),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("rules.{name} must lie in [0, 100]"));
            }
        }
        for (name, threshold) in [
            ("playful_plays", self.playful_plays),
            ("good_night_sleeps", self.good_night_sleeps),
            ("night_owl_interactions", self.night_owl_interactions),
        ] {
            if threshold == 0 {
                return Err(format!("rules.{name} must be greater than zero"));
            }
        }
        Ok(())
    }
}

//! Opponent personalities - archetype table, validation, score-biased selection

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Named parameter bundle governing AI timing and accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    /// Reaction delay after the go signal (seconds)
    pub reaction_min: f32,
    pub reaction_max: f32,
    /// Seconds per draw step
    pub draw_speed: f32,
    /// Aim delay between finishing the draw and firing (seconds)
    pub aim_min: f32,
    pub aim_max: f32,
    /// Base probability that a shot is meant to hit
    pub accuracy: f32,
    /// False starts per second of standoff
    pub false_start_chance: f32,
    /// Probability of flinching at the go signal
    pub flinch_chance: f32,
    /// Weighted in more often while the human leads the match
    #[serde(default)]
    pub tough: bool,
}

/// Personality validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersonalityError {
    #[error("personality {name}: {field} range has max < min ({min} > {max})")]
    InvertedRange {
        name: String,
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("personality {name}: {field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        name: String,
        field: &'static str,
        value: f32,
    },

    #[error("personality {name}: {field} must be finite and non-negative, got {value}")]
    Negative {
        name: String,
        field: &'static str,
        value: f32,
    },

    #[error("personality {name}: draw speed must be positive, got {value}")]
    DrawSpeed { name: String, value: f32 },

    #[error("personality pool is empty")]
    EmptyPool,
}

impl Personality {
    /// Reject inconsistent parameters before they ever reach a round
    pub fn validate(&self) -> Result<(), PersonalityError> {
        for (field, min, max) in [
            ("reaction", self.reaction_min, self.reaction_max),
            ("aim", self.aim_min, self.aim_max),
        ] {
            if !(min.is_finite() && min >= 0.0) {
                return Err(PersonalityError::Negative {
                    name: self.name.clone(),
                    field,
                    value: min,
                });
            }
            if !max.is_finite() || max < min {
                return Err(PersonalityError::InvertedRange {
                    name: self.name.clone(),
                    field,
                    min,
                    max,
                });
            }
        }

        for (field, value) in [
            ("accuracy", self.accuracy),
            ("flinch_chance", self.flinch_chance),
            ("false_start_chance", self.false_start_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PersonalityError::OutOfUnitRange {
                    name: self.name.clone(),
                    field,
                    value,
                });
            }
        }

        if !(self.draw_speed.is_finite() && self.draw_speed > 0.0) {
            return Err(PersonalityError::DrawSpeed {
                name: self.name.clone(),
                value: self.draw_speed,
            });
        }

        Ok(())
    }

    /// Tighten timing and accuracy as the match goes on
    pub fn ramped(&self, rounds_played: u32) -> Personality {
        let ramp = (rounds_played as f32 * 0.008).min(0.10);
        let reaction_min = (self.reaction_min - ramp).max(0.0);
        Personality {
            reaction_min,
            reaction_max: (self.reaction_max - ramp).max(reaction_min),
            accuracy: (self.accuracy + ramp * 0.5).clamp(0.10, 0.92),
            ..self.clone()
        }
    }
}

/// Built-in opponent archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Jumpy, flinches often
    Nervous,
    /// Middle of the road
    Steady,
    /// Patient and accurate
    Veteran,
    /// Fast hands, short aim
    Quickdraw,
    /// Unpredictable, false-starts a lot
    Wild,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::Nervous,
        Archetype::Steady,
        Archetype::Veteran,
        Archetype::Quickdraw,
        Archetype::Wild,
    ];

    pub fn personality(self) -> Personality {
        let (name, r, draw_speed, a, accuracy, false_start_chance, flinch_chance, tough) = match self {
            Archetype::Nervous => ("Nervous", (0.16, 0.46), 0.055, (0.10, 0.30), 0.50, 0.030, 0.25, false),
            Archetype::Steady => ("Steady", (0.18, 0.46), 0.050, (0.14, 0.36), 0.62, 0.010, 0.08, false),
            Archetype::Veteran => ("Veteran", (0.10, 0.30), 0.045, (0.22, 0.50), 0.78, 0.000, 0.00, true),
            Archetype::Quickdraw => ("Quickdraw", (0.06, 0.20), 0.040, (0.06, 0.18), 0.66, 0.012, 0.02, true),
            Archetype::Wild => ("Wild", (0.00, 0.36), 0.050, (0.00, 0.16), 0.45, 0.080, 0.12, true),
        };
        Personality {
            name: name.to_string(),
            reaction_min: r.0,
            reaction_max: r.1,
            draw_speed,
            aim_min: a.0,
            aim_max: a.1,
            accuracy,
            false_start_chance,
            flinch_chance,
            tough,
        }
    }
}

/// Validated set of personalities drawn from every round
#[derive(Debug, Clone)]
pub struct PersonalityPool {
    entries: Vec<Personality>,
}

impl PersonalityPool {
    pub fn new(entries: Vec<Personality>) -> Result<Self, PersonalityError> {
        if entries.is_empty() {
            return Err(PersonalityError::EmptyPool);
        }
        for p in &entries {
            p.validate()?;
        }
        Ok(Self { entries })
    }

    /// Parse and validate a JSON array of personalities
    pub fn from_json(json: &str) -> Result<Self, PersonalityPoolLoadError> {
        let entries: Vec<Personality> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    pub fn entries(&self) -> &[Personality] {
        &self.entries
    }

    /// Selection weights: tough entries count double while the human leads
    pub fn weights(&self, player_score: u32, enemy_score: u32) -> Vec<u32> {
        let player_leads = player_score > enemy_score;
        self.entries
            .iter()
            .map(|p| if player_leads && p.tough { 2 } else { 1 })
            .collect()
    }

    /// Pick this round's opponent, ramped by rounds already played
    pub fn pick<R: Rng + ?Sized>(
        &self,
        player_score: u32,
        enemy_score: u32,
        rounds_played: u32,
        rng: &mut R,
    ) -> Personality {
        let weights = self.weights(player_score, enemy_score);
        let idx = match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => 0,
        };
        self.entries[idx].ramped(rounds_played)
    }
}

impl Default for PersonalityPool {
    fn default() -> Self {
        Self {
            entries: Archetype::ALL.iter().map(|a| a.personality()).collect(),
        }
    }
}

/// Errors loading a personality pool from JSON
#[derive(Debug, thiserror::Error)]
pub enum PersonalityPoolLoadError {
    #[error("malformed personality JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] PersonalityError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_builtin_archetypes_validate() {
        for a in Archetype::ALL {
            a.personality().validate().unwrap();
        }
        assert!(PersonalityPool::new(Archetype::ALL.iter().map(|a| a.personality()).collect()).is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut p = Archetype::Steady.personality();
        p.aim_max = p.aim_min - 0.01;
        assert!(matches!(
            p.validate(),
            Err(PersonalityError::InvertedRange { field: "aim", .. })
        ));
        assert!(PersonalityPool::new(vec![p]).is_err());
    }

    #[test]
    fn test_accuracy_out_of_range_rejected() {
        let mut p = Archetype::Wild.personality();
        p.accuracy = 1.5;
        assert!(matches!(
            p.validate(),
            Err(PersonalityError::OutOfUnitRange { field: "accuracy", .. })
        ));
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            PersonalityPool::new(Vec::new()),
            Err(PersonalityError::EmptyPool)
        ));
    }

    #[test]
    fn test_weights_favour_tough_only_when_leading() {
        let pool = PersonalityPool::default();
        assert_eq!(pool.weights(0, 0), vec![1, 1, 1, 1, 1]);
        assert_eq!(pool.weights(1, 2), vec![1, 1, 1, 1, 1]);
        assert_eq!(pool.weights(2, 1), vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_ramp_is_bounded_and_keeps_order() {
        let base = Archetype::Wild.personality();
        let early = base.ramped(0);
        assert_eq!(early, base);

        let late = base.ramped(1000);
        assert_eq!(late.reaction_min, 0.0);
        assert!(late.reaction_max >= late.reaction_min);
        assert!((late.reaction_max - (base.reaction_max - 0.10)).abs() < 1e-6);
        assert!((late.accuracy - 0.50).abs() < 1e-6);
        late.validate().unwrap();
    }

    #[test]
    fn test_ramp_never_inverts_narrow_range() {
        let mut p = Archetype::Steady.personality();
        p.reaction_min = 0.05;
        p.reaction_max = 0.06;
        let r = p.ramped(12);
        assert!(r.reaction_max >= r.reaction_min);
    }

    #[test]
    fn test_pick_is_deterministic_for_seed() {
        let pool = PersonalityPool::default();
        let a = pool.pick(0, 0, 3, &mut ChaCha8Rng::seed_from_u64(99));
        let b = pool.pick(0, 0, 3, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_pick_leading_draws_more_tough() {
        let pool = PersonalityPool::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let trials = 5000;
        let tough_even = (0..trials).filter(|_| pool.pick(1, 1, 0, &mut rng).tough).count();
        let tough_lead = (0..trials).filter(|_| pool.pick(2, 1, 0, &mut rng).tough).count();
        // expected 60% vs 75%
        assert!(tough_lead > tough_even + trials / 20);
    }

    #[test]
    fn test_pool_from_json() {
        let json = r#"[{"name":"Slow","reaction_min":0.3,"reaction_max":0.5,"draw_speed":0.06,
            "aim_min":0.2,"aim_max":0.4,"accuracy":0.4,"false_start_chance":0.0,"flinch_chance":0.1}]"#;
        let pool = PersonalityPool::from_json(json).unwrap();
        assert_eq!(pool.entries().len(), 1);
        assert!(!pool.entries()[0].tough);

        let bad = r#"[{"name":"Bad","reaction_min":0.5,"reaction_max":0.3,"draw_speed":0.06,
            "aim_min":0.2,"aim_max":0.4,"accuracy":0.4,"false_start_chance":0.0,"flinch_chance":0.1}]"#;
        assert!(matches!(
            PersonalityPool::from_json(bad),
            Err(PersonalityPoolLoadError::Invalid(_))
        ));
    }
}

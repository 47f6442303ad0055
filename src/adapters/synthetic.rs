//! Synthetic adapter: seeded generator of plausible mission rows.
//!
//! Used when no historical table is available. The label follows
//! `max(24, N(200, 50) - 2(age - 35) + 15 missions + 0.3 space_time
//! + 100 complexity + role bonus + weather bonus)`.

use std::convert::Infallible;

use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::RawRecord;
use crate::ports::DatasetSource;

/// Default generator seed.
pub const DEFAULT_SYNTHETIC_SEED: u64 = 42;
/// Default number of generated rows.
pub const DEFAULT_SYNTHETIC_ROWS: usize = 200;
/// Shortest mission the generator will label.
pub const MIN_DURATION_HOURS: f64 = 24.0;

const NATIONALITIES: &[&str] = &["USA", "Russia", "Japan", "ESA", "Canada", "China"];
const MISSION_TYPES: &[&str] = &["ISS Expedition", "Space Shuttle", "Commercial Crew", "Lunar Mission"];
const ROLES: &[&str] = &["commander", "pilot", "mission_specialist", "flight_engineer"];
const WEATHER: &[&str] = &["Clear", "Partly Cloudy", "Overcast", "Poor"];
const MANUFACTURERS: &[&str] = &["SpaceX", "Boeing", "Roscosmos", "Other"];

/// Seeded synthetic dataset source.
#[derive(Debug, Clone)]
pub struct SyntheticDatasetSource {
    seed: u64,
    rows: usize,
}

impl Default for SyntheticDatasetSource {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHETIC_SEED, DEFAULT_SYNTHETIC_ROWS)
    }
}

impl SyntheticDatasetSource {
    #[must_use]
    pub fn new(seed: u64, rows: usize) -> Self {
        Self { seed, rows }
    }

    /// Standard normal draw (Box-Muller).
    fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn pick<'a>(rng: &mut ChaCha8Rng, options: &[&'a str]) -> &'a str {
        options.choose(rng).copied().unwrap_or("Other")
    }

    fn row(index: usize, rng: &mut ChaCha8Rng) -> RawRecord {
        let age: u32 = rng.gen_range(25..60);
        let nationality = Self::pick(rng, NATIONALITIES);
        let missions: u32 = rng.gen_range(1..8);
        let space_time = f64::from(rng.gen_range(50u32..1000));
        let mission_type = Self::pick(rng, MISSION_TYPES);
        let role = Self::pick(rng, ROLES);
        let weather = Self::pick(rng, WEATHER);
        let manufacturer = Self::pick(rng, MANUFACTURERS);
        let complexity: f64 = rng.gen_range(0.1..1.0);
        let success: f64 = rng.gen_range(0.7..0.99);
        let military: bool = rng.gen();

        let role_bonus = match role {
            "commander" => 20.0,
            "pilot" => 10.0,
            _ => 0.0,
        };
        let weather_bonus = match weather {
            "Poor" => 10.0,
            "Overcast" => 5.0,
            _ => 0.0,
        };
        let base = 200.0 + 50.0 * Self::standard_normal(rng);
        let duration = (base - 2.0 * (f64::from(age) - 35.0)
            + 15.0 * f64::from(missions)
            + 0.3 * space_time
            + 100.0 * complexity
            + role_bonus
            + weather_bonus)
            .max(MIN_DURATION_HOURS);

        RawRecord {
            name: Some(format!("Astronaut_{index}")),
            age: Some(age.to_string()),
            nationality: Some(nationality.to_string()),
            missions: Some(missions.to_string()),
            space_time: Some(space_time.to_string()),
            mission_type: Some(mission_type.to_string()),
            role: Some(role.to_string()),
            launch_weather: Some(weather.to_string()),
            manufacturer: Some(manufacturer.to_string()),
            mission_complexity: Some(complexity.to_string()),
            success_probability: Some(success.to_string()),
            military: Some(military.to_string()),
            duration_hours: Some(duration.to_string()),
        }
    }
}

impl DatasetSource for SyntheticDatasetSource {
    type Error = Infallible;

    fn describe(&self) -> String {
        format!("synthetic(seed={}, rows={})", self.seed, self.rows)
    }

    fn load(&self) -> Result<Vec<RawRecord>, Self::Error> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let rows = (0..self.rows).map(|i| Self::row(i, &mut rng)).collect();
        tracing::info!("Generated {} synthetic mission rows (seed {})", self.rows, self.seed);
        Ok(rows)
    }
}

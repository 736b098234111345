//! Job board generation
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{JOBS_PER_CITY, LIGHT_RATE, MED_RATE};
use crate::distance::DistanceIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    #[default]
    Med,
    Light,
}

impl WeightClass {
    /// Trailer weight as shown on the board.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Med => "30k",
            Self::Light => "20k",
        }
    }

    /// Dollars paid per mile.
    #[must_use]
    pub const fn rate(self) -> f64 {
        match self {
            Self::Med => MED_RATE,
            Self::Light => LIGHT_RATE,
        }
    }

    const fn for_slot(index: usize) -> Self {
        if index % 2 == 0 { Self::Med } else { Self::Light }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An offered haul.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub dest_id: usize,
    pub distance_total: u32,
    pub weight_class: WeightClass,
    pub weight: String,
    pub payout: i64,
}

impl Job {
    fn offer(dest_id: usize, distance_total: u32, weight_class: WeightClass) -> Self {
        Self {
            dest_id,
            distance_total,
            weight_class,
            weight: weight_class.label().to_string(),
            payout: payout_for(distance_total, weight_class),
        }
    }
}

/// The haul currently on the road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
    #[serde(flatten)]
    pub job: Job,
    /// Set when a DOT stop writes up a violation during this trip.
    #[serde(default)]
    pub violation: bool,
}

impl From<Job> for ActiveJob {
    fn from(job: Job) -> Self {
        Self {
            job,
            violation: false,
        }
    }
}

pub type JobBoard = SmallVec<[Job; JOBS_PER_CITY]>;

#[must_use]
pub fn payout_for(miles: u32, weight_class: WeightClass) -> i64 {
    let raw = (f64::from(miles) * weight_class.rate()).round();
    #[allow(clippy::cast_possible_truncation)]
    let payout = raw as i64;
    payout
}

/// Offer the next four cities in id order, alternating medium and light loads.
#[must_use]
pub fn make_jobs_for_city(city_id: usize, distances: &DistanceIndex) -> JobBoard {
    let count = distances.city_count().max(1);
    (0..JOBS_PER_CITY)
        .map(|slot| {
            let dest_id = (city_id + 1 + slot) % count;
            let miles = distances.distance_miles(city_id, dest_id);
            Job::offer(dest_id, miles, WeightClass::for_slot(slot))
        })
        .collect()
}

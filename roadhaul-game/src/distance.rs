//! City-to-city road distance table.
use crate::constants::{
    EARTH_RADIUS_MILES, FALLBACK_DISTANCE_MILES, MIN_LEG_MILES, ROAD_MULT_BASE, ROAD_MULT_CYCLE,
    ROAD_MULT_STEP,
};
use crate::data::City;

/// Great-circle distance between two coordinates in miles.
#[must_use]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Road winding factor between two indices. Derived from the index gap so
/// the table is reproducible without any stored randomness.
#[must_use]
pub fn road_multiplier(i: usize, j: usize) -> f64 {
    let gap = i.abs_diff(j) % ROAD_MULT_CYCLE;
    #[allow(clippy::cast_precision_loss)]
    let gap = gap as f64;
    ROAD_MULT_BASE + gap * ROAD_MULT_STEP
}

/// Precomputed, read-only mileage matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceIndex {
    count: usize,
    miles: Vec<u32>,
}

impl DistanceIndex {
    /// Build the table once from city coordinates.
    #[must_use]
    pub fn build(cities: &[City]) -> Self {
        let count = cities.len();
        let mut miles = vec![0; count * count];
        for (i, from) in cities.iter().enumerate() {
            for (j, to) in cities.iter().enumerate() {
                if i == j {
                    continue;
                }
                let road =
                    haversine_miles(from.lat, from.lon, to.lat, to.lon) * road_multiplier(i, j);
                let floored = road.max(MIN_LEG_MILES).round();
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let leg = floored as u32;
                miles[i * count + j] = leg;
            }
        }
        Self { count, miles }
    }

    /// Road miles between two cities. Ids outside the table fall back to a
    /// fixed leg so malformed save data still yields a playable job.
    #[must_use]
    pub fn distance_miles(&self, from: usize, to: usize) -> u32 {
        if from >= self.count || to >= self.count {
            return FALLBACK_DISTANCE_MILES;
        }
        self.miles[from * self.count + to]
    }

    #[must_use]
    pub const fn city_count(&self) -> usize {
        self.count
    }
}

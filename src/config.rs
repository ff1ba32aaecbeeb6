use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::PositiveDuration;

pub const DEFAULT_MAX_WALK_RADIUS_METERS: f64 = 1_000.0;
pub const DEFAULT_WALK_SPEED_METERS_PER_SECOND: f64 = 5_000.0 / 3_600.0; // 5 km/h
pub const DEFAULT_WALK_PENALTY: f64 = 2.0;
pub const DEFAULT_MAX_NB_OF_LEGS: &str = "7";
pub const DEFAULT_SAME_STOP_TRANSFER_DURATION: &str = "00:00:00";
pub const DEFAULT_PROFILE_WINDOW: &str = "01:00:00";
pub const DEFAULT_PROFILE_MIN_GAP: &str = "00:10:00";

/// Parameters used when building a timetable snapshot : they fix the
/// foot-path graph, and hence are baked into the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    /// maximum crow-fly distance of a foot-path between two stops
    #[serde(default = "default_max_walk_radius_meters")]
    pub max_walk_radius_meters: f64,

    #[serde(default = "default_walk_speed_meters_per_second")]
    pub walk_speed_meters_per_second: f64,

    /// multiplier applied to the crow-fly walking time, to account for
    /// street layout and waiting at crossings
    #[serde(default = "default_walk_penalty")]
    pub walk_penalty: f64,
}

/// Parameters of one search request. Walking parameters apply to the
/// access/egress legs only : foot-paths between stops are fixed at
/// snapshot build time by `ModelParams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default = "default_max_walk_radius_meters")]
    pub max_walk_radius_meters: f64,

    #[serde(default = "default_walk_speed_meters_per_second")]
    pub walk_speed_meters_per_second: f64,

    #[serde(default = "default_walk_penalty")]
    pub walk_penalty: f64,

    /// maximum number of vehicle legs in a journey
    #[serde(default = "default_max_nb_of_legs")]
    pub max_nb_of_legs: u8,

    /// minimum interchange time when boarding at the stop where the
    /// previous vehicle dropped us
    #[serde(default = "default_same_stop_transfer_duration")]
    pub same_stop_transfer_duration: PositiveDuration,

    /// wall-clock budget of the request ; exceeding it aborts the
    /// computation with a Timeout outcome
    #[serde(default = "default_timeout_milliseconds")]
    pub timeout_milliseconds: Option<u64>,
}

/// Parameters of a profile search : how far ahead to look for candidate
/// departures, and how close together two candidates may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileParams {
    #[serde(default = "default_profile_window")]
    pub window: PositiveDuration,

    #[serde(default = "default_profile_min_gap")]
    pub min_gap: PositiveDuration,
}

pub fn default_max_walk_radius_meters() -> f64 {
    DEFAULT_MAX_WALK_RADIUS_METERS
}

pub fn default_walk_speed_meters_per_second() -> f64 {
    DEFAULT_WALK_SPEED_METERS_PER_SECOND
}

pub fn default_walk_penalty() -> f64 {
    DEFAULT_WALK_PENALTY
}

pub fn default_max_nb_of_legs() -> u8 {
    u8::from_str(DEFAULT_MAX_NB_OF_LEGS).unwrap()
}

pub fn default_same_stop_transfer_duration() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_SAME_STOP_TRANSFER_DURATION).unwrap()
}

pub fn default_timeout_milliseconds() -> Option<u64> {
    None
}

pub fn default_profile_window() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_PROFILE_WINDOW).unwrap()
}

pub fn default_profile_min_gap() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_PROFILE_MIN_GAP).unwrap()
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            max_walk_radius_meters: default_max_walk_radius_meters(),
            walk_speed_meters_per_second: default_walk_speed_meters_per_second(),
            walk_penalty: default_walk_penalty(),
        }
    }
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            max_walk_radius_meters: default_max_walk_radius_meters(),
            walk_speed_meters_per_second: default_walk_speed_meters_per_second(),
            walk_penalty: default_walk_penalty(),
            max_nb_of_legs: default_max_nb_of_legs(),
            same_stop_transfer_duration: default_same_stop_transfer_duration(),
            timeout_milliseconds: default_timeout_milliseconds(),
        }
    }
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self {
            window: default_profile_window(),
            min_gap: default_profile_min_gap(),
        }
    }
}

/// Effective walking time over a crow-fly distance.
pub fn walk_duration(
    distance_meters: f64,
    walk_speed_meters_per_second: f64,
    walk_penalty: f64,
) -> PositiveDuration {
    let seconds = distance_meters / walk_speed_meters_per_second * walk_penalty;
    // ceil : never under-estimate an interchange
    PositiveDuration::from_seconds(seconds.ceil() as i64).unwrap_or_else(PositiveDuration::zero)
}

impl ModelParams {
    /// Upper bound on foot-path durations, derived once from the radius.
    pub fn max_walk_duration(&self) -> PositiveDuration {
        walk_duration(
            self.max_walk_radius_meters,
            self.walk_speed_meters_per_second,
            self.walk_penalty,
        )
    }

    pub fn walk_duration(&self, distance_meters: f64) -> PositiveDuration {
        walk_duration(
            distance_meters,
            self.walk_speed_meters_per_second,
            self.walk_penalty,
        )
    }
}

impl RequestParams {
    pub fn walk_duration(&self, distance_meters: f64) -> PositiveDuration {
        walk_duration(
            distance_meters,
            self.walk_speed_meters_per_second,
            self.walk_penalty,
        )
    }
}

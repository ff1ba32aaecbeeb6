use serde::Serialize;

use crate::time::{PositiveDuration, SecondsSinceDayStart};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopInfo {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_code: Option<String>,
}

/// A walking leg. `from_stop` is `None` when the walk starts at the
/// origin of the query, `to_stop` is `None` when it ends at the
/// destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkLeg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_stop: Option<StopInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_stop: Option<StopInfo>,
    pub from_time: SecondsSinceDayStart,
    pub to_time: SecondsSinceDayStart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideLeg {
    pub from_stop: StopInfo,
    pub to_stop: StopInfo,
    /// departure time of the vehicle at `from_stop`
    pub from_time: SecondsSinceDayStart,
    /// arrival time of the vehicle at `to_stop`
    pub to_time: SecondsSinceDayStart,
    pub route_name: String,
    pub trip_id: String,
    pub board_position: usize,
    pub alight_position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Leg {
    Walk(WalkLeg),
    Ride(RideLeg),
}

impl Leg {
    pub fn from_time(&self) -> SecondsSinceDayStart {
        match self {
            Leg::Walk(leg) => leg.from_time,
            Leg::Ride(leg) => leg.from_time,
        }
    }

    pub fn to_time(&self) -> SecondsSinceDayStart {
        match self {
            Leg::Walk(leg) => leg.to_time,
            Leg::Ride(leg) => leg.to_time,
        }
    }
}

/// One journey of the response : an access walk, one or more rides
/// possibly separated by foot-paths, and an egress walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Journey {
    /// time at which the traveler leaves the origin. This is the latest
    /// possible start : access walk arrives exactly at the first departure
    pub departure_time: SecondsSinceDayStart,
    /// time at which the traveler reaches the destination
    pub arrival_time: SecondsSinceDayStart,
    pub nb_of_transfers: usize,
    pub legs: Vec<Leg>,
}

impl Journey {
    pub fn nb_of_rides(&self) -> usize {
        self.legs
            .iter()
            .filter(|leg| matches!(leg, Leg::Ride(_)))
            .count()
    }

    pub fn total_duration(&self) -> PositiveDuration {
        // arrival is never before departure, by construction
        self.arrival_time
            .duration_since(&self.departure_time)
            .unwrap_or_else(PositiveDuration::zero)
    }

    pub fn total_walk_duration(&self) -> PositiveDuration {
        self.legs
            .iter()
            .filter_map(|leg| match leg {
                Leg::Walk(walk_leg) => walk_leg.to_time.duration_since(&walk_leg.from_time),
                Leg::Ride(_) => None,
            })
            .fold(PositiveDuration::zero(), |total, walk| total + walk)
    }

    /// Departure time of the first vehicle boarded.
    pub fn first_ride_departure(&self) -> Option<SecondsSinceDayStart> {
        self.legs.iter().find_map(|leg| match leg {
            Leg::Ride(ride_leg) => Some(ride_leg.from_time),
            Leg::Walk(_) => None,
        })
    }
}

use crate::geometry::Coord;
use crate::time::{PositiveDuration, SecondsSinceDayStart};

/// A stop of the feed snapshot, identified by its stable `id`.
#[derive(Debug, Clone)]
pub struct StopRecord {
    pub id: String,
    pub name: String,
    pub platform_code: Option<String>,
    pub coord: Coord,
}

#[derive(Debug, Clone)]
pub struct StopTimeRecord {
    pub stop_id: String,
    pub arrival: SecondsSinceDayStart,
    pub departure: SecondsSinceDayStart,
}

/// One trip of the feed snapshot, with its ordered stop times.
/// `route_name` is the name travelers know the line by ; it plays no role
/// in routing, since trips are re-grouped by stop sequence at load time.
#[derive(Debug, Clone)]
pub struct TripRecord {
    pub id: String,
    pub route_name: String,
    pub stop_times: Vec<StopTimeRecord>,
}

/// A feed-supplied minimum transfer time between two stops.
/// Takes precedence over the walking time estimated from the distance.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub duration: PositiveDuration,
}

/// Source of a timetable snapshot. The loader delivers gtfs-like data ;
/// re-grouping trips into stop-sequence routes happens in the store,
/// not in the loader.
pub trait Feed {
    fn stops(&self) -> &[StopRecord];

    fn trips(&self) -> &[TripRecord];

    fn transfers(&self) -> &[TransferRecord] {
        &[]
    }
}

pub mod init;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::ModelParams;
use crate::footpaths::FootPaths;
use crate::geometry::{Coord, StopGrid};
use crate::time::SecondsSinceDayStart;

/// A point where a vehicle can be boarded or alighted from.
/// The inner index is dense : it is used for all per-stop array lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stop {
    pub(crate) idx: usize,
}

/// A group of trips sharing the exact same ordered sequence of stops.
/// Routes are synthetic : they are rebuilt from the trips at load time
/// and do not match the route ids of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub(crate) idx: usize,
}

/// A trip is identified by its route and by its rank among the trips of
/// this route, which are ordered by departure time at the first position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trip {
    pub(crate) route: Route,
    pub(crate) idx: usize,
}

#[derive(Debug)]
pub(crate) struct StopData {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) platform_code: Option<String>,
    pub(crate) coord: Coord,
    /// every (route, position) at which this stop appears, including
    /// repeated appearances within the same route
    pub(crate) routes: Vec<(Route, usize)>,
}

#[derive(Debug)]
pub(crate) struct RouteData {
    /// the stop at each position
    pub(crate) stops: Vec<Stop>,

    /// `departure_times_by_position[position][trip]`
    /// Trips are ordered by departure time at position 0, and do not
    /// overtake each other : for every `position` the inner vector is
    /// sorted by increasing time.
    pub(crate) departure_times_by_position: Vec<Vec<SecondsSinceDayStart>>,

    /// `arrival_times_by_position[position][trip]`, same ordering
    pub(crate) arrival_times_by_position: Vec<Vec<SecondsSinceDayStart>>,

    /// feed id of each trip, by rank
    pub(crate) trip_ids: Vec<String>,

    /// feed route name of each trip, by rank. Kept per trip : a synthetic
    /// route may group trips of different commercial lines.
    pub(crate) trip_route_names: Vec<String>,
}

/// The timetable snapshot : read-only after construction. Queries running
/// against a snapshot never observe any mutation ; refreshing the data means
/// building a new snapshot and swapping pointers.
pub struct TransitData {
    pub(crate) stop_datas: Vec<StopData>,
    pub(crate) route_datas: Vec<RouteData>,
    pub(crate) stop_id_to_stop: HashMap<String, Stop>,
    pub(crate) footpaths: FootPaths,
    pub(crate) grid: StopGrid,
    pub(crate) params: ModelParams,
    pub(crate) service_day: NaiveDate,
    pub(crate) timezone: chrono_tz::Tz,
}

impl TransitData {
    pub fn nb_of_stops(&self) -> usize {
        self.stop_datas.len()
    }

    pub fn nb_of_routes(&self) -> usize {
        self.route_datas.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.route_datas
            .iter()
            .map(|route_data| route_data.trip_ids.len())
            .sum()
    }

    pub fn stop_from_id(&self, id: &str) -> Option<Stop> {
        self.stop_id_to_stop.get(id).copied()
    }

    pub fn stop_id(&self, stop: &Stop) -> &str {
        &self.stop_datas[stop.idx].id
    }

    pub fn stop_name(&self, stop: &Stop) -> &str {
        &self.stop_datas[stop.idx].name
    }

    pub fn stop_platform_code(&self, stop: &Stop) -> Option<&str> {
        self.stop_datas[stop.idx].platform_code.as_deref()
    }

    pub fn stop_coord(&self, stop: &Stop) -> Coord {
        self.stop_datas[stop.idx].coord
    }

    /// Every `(route, position)` serving `stop`, repeats included.
    pub fn routes_of(&self, stop: &Stop) -> &[(Route, usize)] {
        &self.stop_datas[stop.idx].routes
    }

    pub fn nb_of_positions(&self, route: &Route) -> usize {
        self.route_datas[route.idx].stops.len()
    }

    pub fn stop_at(&self, route: &Route, position: usize) -> Stop {
        self.route_datas[route.idx].stops[position]
    }

    pub fn nb_of_trips_of_route(&self, route: &Route) -> usize {
        self.route_datas[route.idx].trip_ids.len()
    }

    pub fn trip_at_rank(&self, route: &Route, idx: usize) -> Trip {
        assert!(idx < self.nb_of_trips_of_route(route));
        Trip { route: *route, idx }
    }

    pub fn trip_id(&self, trip: &Trip) -> &str {
        &self.route_datas[trip.route.idx].trip_ids[trip.idx]
    }

    pub fn trip_route_name(&self, trip: &Trip) -> &str {
        &self.route_datas[trip.route.idx].trip_route_names[trip.idx]
    }

    pub fn arrival_time(&self, trip: &Trip, position: usize) -> SecondsSinceDayStart {
        self.route_datas[trip.route.idx].arrival_times_by_position[position][trip.idx]
    }

    pub fn departure_time(&self, trip: &Trip, position: usize) -> SecondsSinceDayStart {
        self.route_datas[trip.route.idx].departure_times_by_position[position][trip.idx]
    }

    /// The earliest trip of `route` departing from `position` at or after
    /// `waiting_time`, if any. O(log nb_of_trips) : trips do not overtake
    /// each other, so departure times at any position are sorted.
    pub fn earliest_trip_to_board(
        &self,
        route: &Route,
        position: usize,
        waiting_time: &SecondsSinceDayStart,
    ) -> Option<Trip> {
        let route_data = &self.route_datas[route.idx];
        // boarding at the last position would go nowhere
        debug_assert!(position + 1 < route_data.stops.len());
        let departures = &route_data.departure_times_by_position[position];

        let search_result = departures.binary_search(waiting_time);
        let first_boardable = match search_result {
            // waiting_time < departures[idx] and waiting_time > departures[idx - 1],
            // so idx is the first trip that can be boarded
            Err(idx) => idx,
            // maybe idx is not the smallest idx such that departures[idx] == waiting_time
            Ok(idx) => {
                let mut first_idx = idx;
                while first_idx > 0 && departures[first_idx - 1] == *waiting_time {
                    first_idx -= 1;
                }
                first_idx
            }
        };

        if first_boardable < departures.len() {
            Some(Trip {
                route: *route,
                idx: first_boardable,
            })
        } else {
            None
        }
    }

    pub fn foot_neighbours(&self, stop: &Stop) -> &[(Stop, crate::time::PositiveDuration)] {
        self.footpaths.neighbours(stop)
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn service_day(&self) -> NaiveDate {
        self.service_day
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone
    }

    /// Converts a unix timestamp into seconds since the start of the
    /// service day, in the timezone of the snapshot.
    pub fn day_seconds_from_epoch(&self, epoch_seconds: i64) -> Option<SecondsSinceDayStart> {
        use chrono::TimeZone;
        let midnight = self.service_day.and_hms_opt(0, 0, 0)?;
        let day_start = self
            .timezone
            .from_local_datetime(&midnight)
            .single()?
            .timestamp();
        SecondsSinceDayStart::from_seconds(epoch_seconds - day_start)
    }
}

impl std::fmt::Debug for TransitData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitData")
            .field("nb_of_stops", &self.nb_of_stops())
            .field("nb_of_routes", &self.nb_of_routes())
            .field("nb_of_trips", &self.nb_of_trips())
            .field("service_day", &self.service_day)
            .finish()
    }
}

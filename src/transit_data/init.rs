use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use log::debug;

use crate::config::ModelParams;
use crate::feed::{Feed, TripRecord};
use crate::footpaths::FootPaths;
use crate::geometry::StopGrid;
use crate::time::SecondsSinceDayStart;

use super::{Route, RouteData, Stop, StopData, TransitData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPair {
    pub upstream: usize,
    pub downstream: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripTimesError {
    // departure_time[position] < arrival_time[position]
    DepartureBeforeArrival(usize),
    // arrival_time[downstream] < departure_time[upstream]
    ArrivalBeforeUpstreamDeparture(PositionPair),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    NoStop,
    DuplicateStop(String),
    BadStopCoord(String),
    UnknownStop { trip_id: String, stop_id: String },
    TooFewStopTimes { trip_id: String, nb_of_stop_times: usize },
    BadTripTimes { trip_id: String, error: TripTimesError },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NoStop => {
                write!(f, "The feed does not contain any stop")
            }
            ModelError::DuplicateStop(stop_id) => {
                write!(f, "The feed contains the stop `{}` twice", stop_id)
            }
            ModelError::BadStopCoord(stop_id) => {
                write!(f, "The stop `{}` has invalid coordinates", stop_id)
            }
            ModelError::UnknownStop { trip_id, stop_id } => {
                write!(
                    f,
                    "The trip `{}` serves the stop `{}` which is not in the feed",
                    trip_id, stop_id
                )
            }
            ModelError::TooFewStopTimes {
                trip_id,
                nb_of_stop_times,
            } => {
                write!(
                    f,
                    "The trip `{}` has {} stop times, expected at least 2",
                    trip_id, nb_of_stop_times
                )
            }
            ModelError::BadTripTimes { trip_id, error } => match error {
                TripTimesError::DepartureBeforeArrival(position) => {
                    write!(
                        f,
                        "The trip `{}` departs before it arrives at position {}",
                        trip_id, position
                    )
                }
                TripTimesError::ArrivalBeforeUpstreamDeparture(pair) => {
                    write!(
                        f,
                        "The trip `{}` arrives at position {} before departing from position {}",
                        trip_id, pair.downstream, pair.upstream
                    )
                }
            },
        }
    }
}

impl std::error::Error for ModelError {}

impl TransitData {
    /// Builds a timetable snapshot from a feed.
    ///
    /// Trips are re-grouped into synthetic routes keyed by their exact
    /// sequence of stops. Within such a group, a trip joins an existing
    /// route only if it is pointwise comparable with every trip already
    /// there ; otherwise a new route is opened for it. This guarantees
    /// that trips of a route never overtake each other, which the route
    /// scan of the engine relies on.
    pub fn new<F: Feed>(
        feed: &F,
        params: ModelParams,
        service_day: NaiveDate,
        timezone: chrono_tz::Tz,
    ) -> Result<TransitData, ModelError> {
        let mut stop_datas: Vec<StopData> = Vec::with_capacity(feed.stops().len());
        let mut stop_id_to_stop: HashMap<String, Stop> = HashMap::new();
        for record in feed.stops() {
            if !record.coord.is_valid() {
                return Err(ModelError::BadStopCoord(record.id.clone()));
            }
            let stop = Stop {
                idx: stop_datas.len(),
            };
            if stop_id_to_stop.insert(record.id.clone(), stop).is_some() {
                return Err(ModelError::DuplicateStop(record.id.clone()));
            }
            stop_datas.push(StopData {
                id: record.id.clone(),
                name: record.name.clone(),
                platform_code: record.platform_code.clone(),
                coord: record.coord,
                routes: Vec::new(),
            });
        }
        if stop_datas.is_empty() {
            return Err(ModelError::NoStop);
        }

        let mut route_datas: Vec<RouteData> = Vec::new();
        let mut stop_seq_to_routes: BTreeMap<Vec<Stop>, Vec<usize>> = BTreeMap::new();

        for record in feed.trips() {
            if record.stop_times.len() < 2 {
                return Err(ModelError::TooFewStopTimes {
                    trip_id: record.id.clone(),
                    nb_of_stop_times: record.stop_times.len(),
                });
            }
            inspect(record).map_err(|error| ModelError::BadTripTimes {
                trip_id: record.id.clone(),
                error,
            })?;

            let mut stops = Vec::with_capacity(record.stop_times.len());
            let mut departures = Vec::with_capacity(record.stop_times.len());
            let mut arrivals = Vec::with_capacity(record.stop_times.len());
            for stop_time in &record.stop_times {
                let stop = stop_id_to_stop.get(&stop_time.stop_id).ok_or_else(|| {
                    ModelError::UnknownStop {
                        trip_id: record.id.clone(),
                        stop_id: stop_time.stop_id.clone(),
                    }
                })?;
                stops.push(*stop);
                departures.push(stop_time.departure);
                arrivals.push(stop_time.arrival);
            }

            let candidate_routes = stop_seq_to_routes.entry(stops.clone()).or_default();
            let mut inserted = false;
            for route_idx in candidate_routes.iter() {
                if route_datas[*route_idx].try_insert(
                    &departures,
                    &arrivals,
                    record.id.clone(),
                    record.route_name.clone(),
                ) {
                    inserted = true;
                    break;
                }
            }
            if !inserted {
                let mut route_data = RouteData::new(stops);
                let is_inserted = route_data.try_insert(
                    &departures,
                    &arrivals,
                    record.id.clone(),
                    record.route_name.clone(),
                );
                debug_assert!(is_inserted);
                candidate_routes.push(route_datas.len());
                route_datas.push(route_data);
            }
        }

        for (route_idx, route_data) in route_datas.iter().enumerate() {
            for (position, stop) in route_data.stops.iter().enumerate() {
                stop_datas[stop.idx]
                    .routes
                    .push((Route { idx: route_idx }, position));
            }
        }

        let grid = StopGrid::new(
            stop_datas
                .iter()
                .enumerate()
                .map(|(idx, stop_data)| (Stop { idx }, stop_data.coord)),
            params.max_walk_radius_meters,
        );
        let footpaths = FootPaths::new(
            &stop_datas,
            &grid,
            feed.transfers(),
            &stop_id_to_stop,
            &params,
        );

        debug!(
            "Timetable loaded : {} stops, {} synthetic routes, {} trips, {} foot-paths",
            stop_datas.len(),
            route_datas.len(),
            route_datas
                .iter()
                .map(|route_data| route_data.trip_ids.len())
                .sum::<usize>(),
            footpaths.nb_of_footpaths(),
        );

        Ok(TransitData {
            stop_datas,
            route_datas,
            stop_id_to_stop,
            footpaths,
            grid,
            params,
            service_day,
            timezone,
        })
    }
}

impl RouteData {
    fn new(stops: Vec<Stop>) -> Self {
        let nb_of_positions = stops.len();
        Self {
            stops,
            departure_times_by_position: vec![Vec::new(); nb_of_positions],
            arrival_times_by_position: vec![Vec::new(); nb_of_positions],
            trip_ids: Vec::new(),
            trip_route_names: Vec::new(),
        }
    }

    pub(crate) fn nb_of_positions(&self) -> usize {
        self.stops.len()
    }

    pub(crate) fn nb_of_trips(&self) -> usize {
        self.trip_ids.len()
    }

    // Try to insert the trip in this route.
    // Returns `true` if insertion was successful, `false` otherwise.
    fn try_insert(
        &mut self,
        departures: &[SecondsSinceDayStart],
        arrivals: &[SecondsSinceDayStart],
        trip_id: String,
        route_name: String,
    ) -> bool {
        assert!(departures.len() == self.nb_of_positions());
        assert!(arrivals.len() == self.nb_of_positions());
        if let Some(insert_idx) = self.find_insert_idx(departures, arrivals) {
            self.do_insert(departures, arrivals, trip_id, route_name, insert_idx);
            true
        } else {
            false
        }
    }

    fn find_insert_idx(
        &self,
        departures: &[SecondsSinceDayStart],
        arrivals: &[SecondsSinceDayStart],
    ) -> Option<usize> {
        let nb_of_trips = self.nb_of_trips();
        if nb_of_trips == 0 {
            return Some(0);
        }

        let first_departure = departures[0];
        let search_result = self.departure_times_by_position[0].binary_search(&first_departure);
        match search_result {
            // here, first_departure is not among the departures at position 0,
            // and insert_idx is where it should be inserted to keep
            // departure_times_by_position[0] sorted. The candidate can be
            // inserted there only if it is pointwise below the trip at
            // insert_idx and pointwise above the trip at insert_idx - 1.
            Err(insert_idx) => {
                if insert_idx < nb_of_trips {
                    match self.partial_cmp_with_trip(departures, arrivals, insert_idx) {
                        None => {
                            return None;
                        }
                        Some(Ordering::Equal) | Some(Ordering::Greater) => {
                            unreachable!();
                        }
                        Some(Ordering::Less) => (),
                    }
                }
                if insert_idx > 0 {
                    match self.partial_cmp_with_trip(departures, arrivals, insert_idx - 1) {
                        None => {
                            return None;
                        }
                        Some(Ordering::Equal) | Some(Ordering::Less) => {
                            unreachable!();
                        }
                        Some(Ordering::Greater) => (),
                    }
                }
                Some(insert_idx)
            }
            // here, some trip departs at first_departure from position 0,
            // but maybe idx is not the smallest rank with this departure
            Ok(idx) => {
                let mut refined_idx = idx;
                while refined_idx > 0
                    && self.departure_times_by_position[0][refined_idx - 1] == first_departure
                {
                    refined_idx -= 1;
                }
                if refined_idx > 0 {
                    match self.partial_cmp_with_trip(departures, arrivals, refined_idx - 1) {
                        None => {
                            return None;
                        }
                        Some(Ordering::Equal) | Some(Ordering::Less) => {
                            unreachable!();
                        }
                        Some(Ordering::Greater) => (),
                    }
                }
                self.find_insert_idx_after(departures, arrivals, refined_idx)
            }
        }
    }

    fn find_insert_idx_after(
        &self,
        departures: &[SecondsSinceDayStart],
        arrivals: &[SecondsSinceDayStart],
        start_search_idx: usize,
    ) -> Option<usize> {
        let nb_of_trips = self.nb_of_trips();
        assert!(start_search_idx < nb_of_trips);

        // we look for the first trip that is pointwise above the candidate ;
        // an incomparable trip on the way means the candidate cannot
        // belong to this route
        for trip_idx in start_search_idx..nb_of_trips {
            let cmp = self.partial_cmp_with_trip(departures, arrivals, trip_idx)?;
            match cmp {
                Ordering::Less | Ordering::Equal => {
                    return Some(trip_idx);
                }
                Ordering::Greater => (),
            }
        }
        // the candidate is pointwise above every trip
        Some(nb_of_trips)
    }

    fn partial_cmp_with_trip(
        &self,
        departures: &[SecondsSinceDayStart],
        arrivals: &[SecondsSinceDayStart],
        trip_idx: usize,
    ) -> Option<Ordering> {
        let departure_cmp = partial_cmp_times(
            departures.iter(),
            self.departure_times_by_position
                .iter()
                .map(|times| &times[trip_idx]),
        )?;
        let arrival_cmp = partial_cmp_times(
            arrivals.iter(),
            self.arrival_times_by_position
                .iter()
                .map(|times| &times[trip_idx]),
        )?;
        combine(departure_cmp, arrival_cmp)
    }

    fn do_insert(
        &mut self,
        departures: &[SecondsSinceDayStart],
        arrivals: &[SecondsSinceDayStart],
        trip_id: String,
        route_name: String,
        insert_idx: usize,
    ) {
        for (position, (departure, arrival)) in departures.iter().zip(arrivals.iter()).enumerate()
        {
            self.departure_times_by_position[position].insert(insert_idx, *departure);
            self.arrival_times_by_position[position].insert(insert_idx, *arrival);
        }
        self.trip_ids.insert(insert_idx, trip_id);
        self.trip_route_names.insert(insert_idx, route_name);
    }
}

fn combine(a: Ordering, b: Ordering) -> Option<Ordering> {
    use Ordering::{Equal, Greater, Less};
    match (a, b) {
        (Less, Less) | (Less, Equal) | (Equal, Less) => Some(Less),
        (Equal, Equal) => Some(Equal),
        (Greater, Greater) | (Greater, Equal) | (Equal, Greater) => Some(Greater),
        _ => None,
    }
}

// Returns
//    - Some(Equal)   if lower[i] == upper[i] for all i
//    - Some(Less)    if lower[i] <= upper[i] for all i
//    - Some(Greater) if lower[i] >= upper[i] for all i
//    - None otherwise (the two sequences are not comparable)
fn partial_cmp_times<'a, Lower, Upper>(lower: Lower, upper: Upper) -> Option<Ordering>
where
    Lower: Iterator<Item = &'a SecondsSinceDayStart> + Clone,
    Upper: Iterator<Item = &'a SecondsSinceDayStart> + Clone,
{
    debug_assert!(lower.clone().count() == upper.clone().count());
    let zip_iter = lower.zip(upper);
    let mut first_not_equal_iter =
        zip_iter.skip_while(|(lower_val, upper_val)| lower_val == upper_val);
    let has_first_not_equal = first_not_equal_iter.next();
    if let Some((lower_val, upper_val)) = has_first_not_equal {
        let ordering = lower_val.cmp(upper_val);
        debug_assert!(ordering != Ordering::Equal);
        // let's see if there is a position where the ordering is not the
        // same as at the first not-equal position
        let found = first_not_equal_iter.find(|(lower_val, upper_val)| {
            let cmp = lower_val.cmp(upper_val);
            cmp != ordering && cmp != Ordering::Equal
        });
        if found.is_some() {
            return None;
        }
        return Some(ordering);
    }
    Some(Ordering::Equal)
}

fn inspect(record: &TripRecord) -> Result<(), TripTimesError> {
    for (position, stop_time) in record.stop_times.iter().enumerate() {
        if stop_time.departure < stop_time.arrival {
            return Err(TripTimesError::DepartureBeforeArrival(position));
        }
    }
    for (upstream, pair) in record.stop_times.windows(2).enumerate() {
        if pair[1].arrival < pair[0].departure {
            return Err(TripTimesError::ArrivalBeforeUpstreamDeparture(PositionPair {
                upstream,
                downstream: upstream + 1,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{StopRecord, StopTimeRecord, TransferRecord, TripRecord};
    use crate::geometry::Coord;

    struct TestFeed {
        stops: Vec<StopRecord>,
        trips: Vec<TripRecord>,
        transfers: Vec<TransferRecord>,
    }

    impl Feed for TestFeed {
        fn stops(&self) -> &[StopRecord] {
            &self.stops
        }

        fn trips(&self) -> &[TripRecord] {
            &self.trips
        }

        fn transfers(&self) -> &[TransferRecord] {
            &self.transfers
        }
    }

    fn stop(id: &str, lat: f64, lon: f64) -> StopRecord {
        StopRecord {
            id: id.to_string(),
            name: id.to_string(),
            platform_code: None,
            coord: Coord::new(lat, lon),
        }
    }

    fn trip(id: &str, stop_times: &[(&str, i64, i64)]) -> TripRecord {
        TripRecord {
            id: id.to_string(),
            route_name: "test".to_string(),
            stop_times: stop_times
                .iter()
                .map(|(stop_id, arrival, departure)| StopTimeRecord {
                    stop_id: stop_id.to_string(),
                    arrival: SecondsSinceDayStart::from_seconds(*arrival).unwrap(),
                    departure: SecondsSinceDayStart::from_seconds(*departure).unwrap(),
                })
                .collect(),
        }
    }

    fn build(feed: &TestFeed) -> TransitData {
        TransitData::new(
            feed,
            ModelParams::default(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            chrono_tz::UTC,
        )
        .unwrap()
    }

    #[test]
    fn trips_with_same_stop_sequence_share_a_route() {
        let feed = TestFeed {
            stops: vec![stop("A", 55.60, 13.00), stop("B", 55.61, 13.00)],
            trips: vec![
                trip("t1", &[("A", 600, 600), ("B", 900, 900)]),
                trip("t2", &[("A", 1200, 1200), ("B", 1500, 1500)]),
            ],
            transfers: vec![],
        };
        let data = build(&feed);
        assert_eq!(data.nb_of_routes(), 1);
        assert_eq!(data.nb_of_trips(), 2);
    }

    #[test]
    fn trips_with_different_stop_sequences_get_different_routes() {
        // same upstream route id in a real feed, but the second trip skips B
        let feed = TestFeed {
            stops: vec![
                stop("A", 55.60, 13.00),
                stop("B", 55.61, 13.00),
                stop("C", 55.62, 13.00),
            ],
            trips: vec![
                trip("t1", &[("A", 600, 600), ("B", 900, 900), ("C", 1200, 1200)]),
                trip("t2", &[("A", 1300, 1300), ("C", 1600, 1600)]),
            ],
            transfers: vec![],
        };
        let data = build(&feed);
        assert_eq!(data.nb_of_routes(), 2);
    }

    #[test]
    fn overtaking_trip_opens_a_new_route() {
        // t2 departs after t1 but arrives before it : not pointwise comparable
        let feed = TestFeed {
            stops: vec![stop("A", 55.60, 13.00), stop("B", 55.61, 13.00)],
            trips: vec![
                trip("t1", &[("A", 600, 600), ("B", 1800, 1800)]),
                trip("t2", &[("A", 700, 700), ("B", 1000, 1000)]),
            ],
            transfers: vec![],
        };
        let data = build(&feed);
        assert_eq!(data.nb_of_routes(), 2);
        for route_idx in 0..data.nb_of_routes() {
            let route = Route { idx: route_idx };
            assert_eq!(data.nb_of_trips_of_route(&route), 1);
        }
    }

    #[test]
    fn trips_are_ordered_by_departure() {
        let feed = TestFeed {
            stops: vec![stop("A", 55.60, 13.00), stop("B", 55.61, 13.00)],
            trips: vec![
                trip("late", &[("A", 1200, 1200), ("B", 1500, 1500)]),
                trip("early", &[("A", 600, 600), ("B", 900, 900)]),
            ],
            transfers: vec![],
        };
        let data = build(&feed);
        assert_eq!(data.nb_of_routes(), 1);
        let route = Route { idx: 0 };
        let first = data.trip_at_rank(&route, 0);
        assert_eq!(data.trip_id(&first), "early");
    }

    #[test]
    fn earliest_trip_to_board_picks_first_feasible() {
        let feed = TestFeed {
            stops: vec![stop("A", 55.60, 13.00), stop("B", 55.61, 13.00)],
            trips: vec![
                trip("t1", &[("A", 600, 600), ("B", 900, 900)]),
                trip("t2", &[("A", 1200, 1200), ("B", 1500, 1500)]),
                trip("t3", &[("A", 1800, 1800), ("B", 2100, 2100)]),
            ],
            transfers: vec![],
        };
        let data = build(&feed);
        let route = Route { idx: 0 };

        let waiting = SecondsSinceDayStart::from_seconds(601).unwrap();
        let trip = data.earliest_trip_to_board(&route, 0, &waiting).unwrap();
        assert_eq!(data.trip_id(&trip), "t2");

        // boarding exactly at departure time is allowed
        let waiting = SecondsSinceDayStart::from_seconds(600).unwrap();
        let trip = data.earliest_trip_to_board(&route, 0, &waiting).unwrap();
        assert_eq!(data.trip_id(&trip), "t1");

        let waiting = SecondsSinceDayStart::from_seconds(2101).unwrap();
        assert!(data.earliest_trip_to_board(&route, 0, &waiting).is_none());
    }

    #[test]
    fn bad_trip_times_are_rejected() {
        let feed = TestFeed {
            stops: vec![stop("A", 55.60, 13.00), stop("B", 55.61, 13.00)],
            trips: vec![trip("t1", &[("A", 600, 600), ("B", 500, 500)])],
            transfers: vec![],
        };
        let result = TransitData::new(
            &feed,
            ModelParams::default(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            chrono_tz::UTC,
        );
        assert!(matches!(
            result,
            Err(ModelError::BadTripTimes { .. })
        ));
    }
}

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime};

use log::{debug, trace};
use serde::Serialize;

use crate::config::{ProfileParams, RequestParams};
use crate::engine::journeys::build_journeys;
use crate::engine::pareto_front::JourneysFront;
use crate::engine::raptor::RaptorState;
use crate::engine::{Interruption, QueryGuard};
use crate::geometry::Coord;
use crate::places_nearby::{places_nearby, BadPlacesNearby};
use crate::response::Journey;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Stop, TransitData};

#[derive(Debug, Clone)]
pub enum BadInput {
    Origin(BadPlacesNearby),
    Destination(BadPlacesNearby),
    /// the departure time does not fall within the service day of the
    /// timetable snapshot
    DepartureTime(i64),
}

#[derive(Debug, Clone)]
pub enum SearchError {
    InvalidInput(BadInput),
    /// no stop within walking radius of the origin
    NoAccessStops,
    /// no stop within walking radius of the destination
    NoEgressStops,
    /// access and egress stops exist, but no trip links them within the
    /// allowed number of legs
    NoJourneyFound,
    Cancelled,
    Timeout,
    /// a data-model invariant was violated at runtime. This indicates a
    /// bug : it should never occur against a validated timetable.
    InternalInvariant(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::InvalidInput(bad_input) => match bad_input {
                BadInput::Origin(err) => write!(f, "Bad origin : {}", err),
                BadInput::Destination(err) => write!(f, "Bad destination : {}", err),
                BadInput::DepartureTime(epoch) => {
                    write!(
                        f,
                        "The departure time {} does not fall within the service day",
                        epoch
                    )
                }
            },
            SearchError::NoAccessStops => {
                write!(f, "No stop within walking radius of the origin")
            }
            SearchError::NoEgressStops => {
                write!(f, "No stop within walking radius of the destination")
            }
            SearchError::NoJourneyFound => {
                write!(f, "No journey found")
            }
            SearchError::Cancelled => {
                write!(f, "The query was cancelled")
            }
            SearchError::Timeout => {
                write!(f, "The query exceeded its wall-clock budget")
            }
            SearchError::InternalInvariant(details) => {
                write!(f, "Internal invariant violated : {}", details)
            }
        }
    }
}

impl std::error::Error for SearchError {}

/// One search request, with the departure expressed in seconds since the
/// start of the service day of the snapshot.
#[derive(Debug, Clone)]
pub struct RequestInput {
    pub origin: Coord,
    pub destination: Coord,
    pub departure_time: SecondsSinceDayStart,
    pub params: RequestParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMeta {
    pub nb_of_access_stops: usize,
    pub nb_of_egress_stops: usize,
    pub nb_of_rounds: usize,
    pub compute_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub journeys: Vec<Journey>,
    pub meta: SearchMeta,
}

/// The query orchestrator. Owns the engine scratch state, which is reused
/// from one query to the next ; one `Solver` serves one query at a time,
/// concurrent queries each use their own `Solver` over the shared
/// snapshot.
pub struct Solver {
    state: RaptorState,
}

impl Solver {
    pub fn new(nb_of_stops: usize) -> Self {
        Self {
            state: RaptorState::new(nb_of_stops),
        }
    }

    /// Earliest-arrival search : access, rounds, egress, reconstruction,
    /// pareto filtering.
    pub fn solve_request(
        &mut self,
        data: &TransitData,
        request: &RequestInput,
        guard: &QueryGuard,
    ) -> Result<SearchResponse, SearchError> {
        let guard = guard.tightened(
            request
                .params
                .timeout_milliseconds
                .map(Duration::from_millis),
        );
        let start_time = SystemTime::now();

        let (access, egress) = self.resolve_access_egress(data, request)?;
        debug!(
            "Start computing journeys : {} access stops, {} egress stops",
            access.len(),
            egress.len()
        );

        let nb_of_rounds = self
            .state
            .compute(
                data,
                &access,
                &request.departure_time,
                &request.params,
                &guard,
            )
            .map_err(interruption_to_error)?;

        let candidates =
            build_journeys(data, &self.state, &egress).map_err(|broken_journey| {
                SearchError::InternalInvariant(broken_journey.to_string())
            })?;
        trace!("{} candidate journeys before filtering", candidates.len());

        let mut front = JourneysFront::new();
        for journey in candidates {
            front.add(journey);
        }
        if front.is_empty() {
            return Err(SearchError::NoJourneyFound);
        }
        let mut journeys = front.into_journeys();
        journeys.sort_by_key(|journey| (journey.arrival_time, journey.nb_of_transfers));

        let compute_duration_ms = elapsed_ms(&start_time);
        debug!(
            "Journeys computed in {} ms with {} rounds : {} journeys",
            compute_duration_ms,
            nb_of_rounds,
            journeys.len()
        );

        Ok(SearchResponse {
            journeys,
            meta: SearchMeta {
                nb_of_access_stops: access.len(),
                nb_of_egress_stops: egress.len(),
                nb_of_rounds,
                compute_duration_ms,
            },
        })
    }

    /// Profile search : gathers candidate departures from the access stops
    /// within `profile.window`, thins them so that two candidates are at
    /// least `profile.min_gap` apart, and runs one earliest-arrival
    /// computation per candidate. Journeys are filtered per departure
    /// time and returned ordered by departure time.
    pub fn solve_profile(
        &mut self,
        data: &TransitData,
        request: &RequestInput,
        profile: &ProfileParams,
        guard: &QueryGuard,
    ) -> Result<SearchResponse, SearchError> {
        let guard = guard.tightened(
            request
                .params
                .timeout_milliseconds
                .map(Duration::from_millis),
        );
        let start_time = SystemTime::now();

        let (access, egress) = self.resolve_access_egress(data, request)?;

        let departures =
            candidate_departures(data, &access, &request.departure_time, profile);
        debug!(
            "Profile search : {} candidate departures within {}",
            departures.len(),
            profile.window
        );

        let mut nb_of_rounds = 0;
        let mut candidates: Vec<Journey> = Vec::new();
        for departure_time in &departures {
            if let Some(interruption) = guard.interruption() {
                return Err(interruption_to_error(interruption));
            }
            let rounds = self
                .state
                .compute(data, &access, departure_time, &request.params, &guard)
                .map_err(interruption_to_error)?;
            nb_of_rounds = nb_of_rounds.max(rounds);
            let journeys =
                build_journeys(data, &self.state, &egress).map_err(|broken_journey| {
                    SearchError::InternalInvariant(broken_journey.to_string())
                })?;
            for journey in journeys {
                if !candidates.contains(&journey) {
                    candidates.push(journey);
                }
            }
        }

        // filter per departure time : pareto-filtering across departures
        // would discard every journey leaving later than the first one
        let mut fronts: BTreeMap<SecondsSinceDayStart, JourneysFront> = BTreeMap::new();
        for journey in candidates {
            fronts
                .entry(journey.departure_time)
                .or_insert_with(JourneysFront::new)
                .add(journey);
        }
        let journeys: Vec<Journey> = fronts
            .into_values()
            .flat_map(JourneysFront::into_journeys)
            .collect();
        if journeys.is_empty() {
            return Err(SearchError::NoJourneyFound);
        }

        Ok(SearchResponse {
            meta: SearchMeta {
                nb_of_access_stops: access.len(),
                nb_of_egress_stops: egress.len(),
                nb_of_rounds,
                compute_duration_ms: elapsed_ms(&start_time),
            },
            journeys,
        })
    }

    fn resolve_access_egress(
        &self,
        data: &TransitData,
        request: &RequestInput,
    ) -> Result<
        (
            Vec<(Stop, PositiveDuration)>,
            Vec<(Stop, PositiveDuration)>,
        ),
        SearchError,
    > {
        let params = &request.params;
        let access = places_nearby(data, &request.origin, params.max_walk_radius_meters)
            .map_err(|err| SearchError::InvalidInput(BadInput::Origin(err)))?;
        if access.is_empty() {
            return Err(SearchError::NoAccessStops);
        }
        let egress = places_nearby(data, &request.destination, params.max_walk_radius_meters)
            .map_err(|err| SearchError::InvalidInput(BadInput::Destination(err)))?;
        if egress.is_empty() {
            return Err(SearchError::NoEgressStops);
        }
        let to_walk = |(stop, distance): (Stop, f64)| (stop, params.walk_duration(distance));
        Ok((
            access.into_iter().map(to_walk).collect(),
            egress.into_iter().map(to_walk).collect(),
        ))
    }
}

/// The single public operation : journeys from `origin` to `destination`,
/// leaving at `departure_time_epoch_seconds` at the earliest.
pub fn search(
    data: &TransitData,
    solver: &mut Solver,
    origin: Coord,
    destination: Coord,
    departure_time_epoch_seconds: i64,
    params: RequestParams,
    guard: &QueryGuard,
) -> Result<SearchResponse, SearchError> {
    let departure_time = data
        .day_seconds_from_epoch(departure_time_epoch_seconds)
        .ok_or(SearchError::InvalidInput(BadInput::DepartureTime(
            departure_time_epoch_seconds,
        )))?;
    let request = RequestInput {
        origin,
        destination,
        departure_time,
        params,
    };
    solver.solve_request(data, &request, guard)
}

fn interruption_to_error(interruption: Interruption) -> SearchError {
    match interruption {
        Interruption::Cancelled => SearchError::Cancelled,
        Interruption::Timeout => SearchError::Timeout,
    }
}

fn elapsed_ms(start_time: &SystemTime) -> u64 {
    start_time
        .elapsed()
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// Trip departures reachable from the access stops within the window,
// expressed as departure times from the origin (walking time deducted),
// thinned so that consecutive candidates are at least `min_gap` apart.
fn candidate_departures(
    data: &TransitData,
    access: &[(Stop, PositiveDuration)],
    departure_time: &SecondsSinceDayStart,
    profile: &ProfileParams,
) -> Vec<SecondsSinceDayStart> {
    let mut all_departures: Vec<SecondsSinceDayStart> = Vec::new();
    for (stop, walk) in access {
        let earliest = *departure_time + *walk;
        let latest = earliest + profile.window;
        for (route, position) in data.routes_of(stop) {
            if position + 1 == data.nb_of_positions(route) {
                continue;
            }
            let mut has_trip = data.earliest_trip_to_board(route, *position, &earliest);
            while let Some(trip) = has_trip {
                let trip_departure = data.departure_time(&trip, *position);
                if trip_departure > latest {
                    break;
                }
                // the walk is deducted : leaving the origin at this time
                // still catches the trip
                let origin_departure = trip_departure.total_seconds() - walk.total_seconds();
                if let Some(origin_departure) =
                    SecondsSinceDayStart::from_seconds(origin_departure)
                {
                    all_departures.push(origin_departure);
                }
                has_trip = if trip.idx + 1 < data.nb_of_trips_of_route(route) {
                    Some(data.trip_at_rank(route, trip.idx + 1))
                } else {
                    None
                };
            }
        }
    }
    all_departures.sort();
    all_departures.dedup();

    let mut thinned: Vec<SecondsSinceDayStart> = Vec::new();
    for departure in all_departures {
        match thinned.last() {
            None => thinned.push(departure),
            Some(last) => {
                // keep a candidate only if it is at least min_gap after
                // the previous kept one
                let gap = departure.total_seconds() - last.total_seconds();
                if gap >= profile.min_gap.total_seconds() {
                    thinned.push(departure);
                }
            }
        }
    }
    thinned
}

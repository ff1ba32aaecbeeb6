use std::collections::HashMap;

use log::trace;

use crate::config::RequestParams;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::{Route, Stop, Trip, TransitData};

use super::{Interruption, QueryGuard};

// how many routes are scanned between two looks at the query guard
const GUARD_CHECK_PERIOD: usize = 64;

/// One boarded-and-alighted vehicle. Positions, not stops : a route may
/// serve the same stop twice, and each appearance is a distinct boarding
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideLabel {
    pub trip: Trip,
    pub board_position: usize,
    pub alight_position: usize,
}

/// How a label was obtained. This is the trail followed backwards by
/// journey reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLink {
    None,
    /// walked from the origin of the query
    Access { walk: PositiveDuration },
    Ride(RideLabel),
    /// took the foot-path from `from_stop`, right after alighting `ride`
    /// there. The ride is embedded : the label of `from_stop` may have
    /// been overwritten by a better walk of the same round, so the trail
    /// cannot rely on it.
    Walk {
        from_stop: Stop,
        walk: PositiveDuration,
        ride: RideLabel,
    },
}

/// The per-query scratch state of the round-based engine.
///
/// All vectors are sized once against the number of stops and reused from
/// one query to the next : `clear` resets only the entries touched by the
/// previous query.
pub struct RaptorState {
    nb_of_stops: usize,

    /// best arrival time at each stop, all rounds mixed.
    /// Meaningful only where `reached` is set.
    best_arrival: Vec<SecondsSinceDayStart>,
    reached: Vec<bool>,

    /// `round_arrivals[k][stop]` : best arrival at `stop` using at most
    /// `k` trips. Meaningful only where `parents[k][stop]` is not `None`.
    round_arrivals: Vec<Vec<SecondsSinceDayStart>>,
    parents: Vec<Vec<ParentLink>>,

    /// stops improved during the current round
    marked: Vec<bool>,
    marked_stops: Vec<Stop>,

    /// routes serving a stop marked in the previous round, each with the
    /// smallest position at which such a stop appears
    routes_to_scan: HashMap<Route, usize>,

    /// stops improved by a ride in the current round : the only sources
    /// of foot-path relaxation
    ride_improved: Vec<bool>,
    ride_improved_stops: Vec<Stop>,

    /// ride labels frozen at the start of the relaxation pass, so that a
    /// walk improving a ride-improved stop does not change what later
    /// relaxations start from
    ride_snapshot: Vec<(Stop, SecondsSinceDayStart, RideLabel)>,

    /// every stop labelled since the last `clear`
    touched: Vec<bool>,
    touched_stops: Vec<Stop>,

    nb_of_rounds: usize,
}

impl RaptorState {
    pub fn new(nb_of_stops: usize) -> Self {
        Self {
            nb_of_stops,
            best_arrival: vec![SecondsSinceDayStart::zero(); nb_of_stops],
            reached: vec![false; nb_of_stops],
            round_arrivals: Vec::new(),
            parents: Vec::new(),
            marked: vec![false; nb_of_stops],
            marked_stops: Vec::new(),
            routes_to_scan: HashMap::new(),
            ride_improved: vec![false; nb_of_stops],
            ride_improved_stops: Vec::new(),
            ride_snapshot: Vec::new(),
            touched: vec![false; nb_of_stops],
            touched_stops: Vec::new(),
            nb_of_rounds: 0,
        }
    }

    /// Number of rounds of the last computation that improved some label.
    /// Journeys with `k` trips exist only for `k <= nb_of_rounds()`.
    pub fn nb_of_rounds(&self) -> usize {
        self.nb_of_rounds
    }

    pub fn parent(&self, round: usize, stop: &Stop) -> ParentLink {
        self.parents[round][stop.idx]
    }

    /// Panics if `stop` has no label at `round` ; check `parent` first.
    pub fn arrival(&self, round: usize, stop: &Stop) -> SecondsSinceDayStart {
        debug_assert!(self.parents[round][stop.idx] != ParentLink::None);
        self.round_arrivals[round][stop.idx]
    }

    pub fn best_arrival(&self, stop: &Stop) -> Option<SecondsSinceDayStart> {
        if self.reached[stop.idx] {
            Some(self.best_arrival[stop.idx])
        } else {
            None
        }
    }

    /// Runs the rounds until no label improves, the round budget is
    /// exhausted, or the guard interrupts the query.
    ///
    /// `departures` are the access stops with their walking duration from
    /// the origin. Returns the number of rounds that improved something.
    pub fn compute(
        &mut self,
        data: &TransitData,
        departures: &[(Stop, PositiveDuration)],
        departure_time: &SecondsSinceDayStart,
        params: &RequestParams,
        guard: &QueryGuard,
    ) -> Result<usize, Interruption> {
        assert!(data.nb_of_stops() == self.nb_of_stops);
        let max_nb_of_rounds = usize::from(params.max_nb_of_legs);
        self.ensure_rounds(max_nb_of_rounds);
        self.clear();

        for (stop, walk) in departures {
            let arrival = *departure_time + *walk;
            if self.reached[stop.idx] && self.best_arrival[stop.idx] <= arrival {
                continue;
            }
            self.set_label(0, *stop, arrival, ParentLink::Access { walk: *walk });
        }

        for round in 1..=max_nb_of_rounds {
            if self.marked_stops.is_empty() {
                break;
            }
            if let Some(interruption) = guard.interruption() {
                return Err(interruption);
            }

            self.collect_routes(data);

            self.ride_improved_stops.clear();
            let routes_to_scan = std::mem::take(&mut self.routes_to_scan);
            let mut scanned = 0usize;
            for (route, start_position) in routes_to_scan.iter() {
                scanned += 1;
                if scanned % GUARD_CHECK_PERIOD == 0 {
                    if let Some(interruption) = guard.interruption() {
                        return Err(interruption);
                    }
                }
                self.scan_route(data, round, route, *start_position, params);
            }
            // keep the allocation for the next round
            self.routes_to_scan = routes_to_scan;

            self.relax_footpaths(data, round);

            if !self.marked_stops.is_empty() {
                self.nb_of_rounds = round;
            }
            trace!(
                "Round {} improved {} stops",
                round,
                self.marked_stops.len()
            );
        }

        Ok(self.nb_of_rounds)
    }

    // Gather the routes serving the stops marked in the previous round,
    // keeping for each route the smallest position at which a marked stop
    // appears. Unmarks everything.
    fn collect_routes(&mut self, data: &TransitData) {
        debug_assert!(self.routes_to_scan.is_empty());
        for stop in &self.marked_stops {
            self.marked[stop.idx] = false;
            for (route, position) in data.routes_of(stop) {
                use std::collections::hash_map::Entry;
                match self.routes_to_scan.entry(*route) {
                    Entry::Vacant(entry) => {
                        entry.insert(*position);
                    }
                    Entry::Occupied(mut entry) => {
                        if position < entry.get() {
                            *entry.get_mut() = *position;
                        }
                    }
                }
            }
        }
        self.marked_stops.clear();
    }

    // Walk the route from `start_position`, riding the currently boarded
    // trip and improving labels, while trying at each position to catch an
    // earlier feasible trip using the labels of the previous round.
    fn scan_route(
        &mut self,
        data: &TransitData,
        round: usize,
        route: &Route,
        start_position: usize,
        params: &RequestParams,
    ) {
        let nb_of_positions = data.nb_of_positions(route);
        // the trip we are on, along with the position we boarded it at
        let mut boarded: Option<(Trip, usize)> = None;

        for position in start_position..nb_of_positions {
            let stop = data.stop_at(route, position);

            if let Some((trip, board_position)) = boarded {
                let arrival = data.arrival_time(&trip, position);
                // local pruning : an arrival no better than the best known
                // one at this stop, whatever the number of trips, is useless
                if !self.reached[stop.idx] || arrival < self.best_arrival[stop.idx] {
                    self.set_label(
                        round,
                        stop,
                        arrival,
                        ParentLink::Ride(RideLabel {
                            trip,
                            board_position,
                            alight_position: position,
                        }),
                    );
                    if !self.ride_improved[stop.idx] {
                        self.ride_improved[stop.idx] = true;
                        self.ride_improved_stops.push(stop);
                    }
                }
            }

            // boarding at the last position would go nowhere
            if position + 1 == nb_of_positions {
                continue;
            }

            // can we catch an earlier trip at this position ?
            let previous_parent = self.parents[round - 1][stop.idx];
            if previous_parent == ParentLink::None {
                continue;
            }
            let mut waiting_time = self.round_arrivals[round - 1][stop.idx];
            if let ParentLink::Ride(_) = previous_parent {
                // minimum interchange time, applied only when the previous
                // round reached this stop on board a vehicle
                waiting_time = waiting_time + params.same_stop_transfer_duration;
            }
            let can_catch = match &boarded {
                None => true,
                Some((trip, _)) => waiting_time <= data.departure_time(trip, position),
            };
            if can_catch {
                if let Some(earlier) = data.earliest_trip_to_board(route, position, &waiting_time)
                {
                    let is_earlier = match &boarded {
                        None => true,
                        Some((trip, _)) => earlier.idx < trip.idx,
                    };
                    if is_earlier {
                        boarded = Some((earlier, position));
                    }
                }
            }
        }
    }

    // Relax the foot-paths going out of every stop improved by a ride in
    // this round. Walks are never chained : only the frozen ride labels
    // are relaxation sources, never a walk label. A walk may overwrite
    // the label of a ride-improved stop when it is strictly better ; the
    // sources are frozen beforehand, so later relaxations still start
    // from the ride arrival.
    fn relax_footpaths(&mut self, data: &TransitData, round: usize) {
        self.ride_snapshot.clear();
        for stop in &self.ride_improved_stops {
            self.ride_improved[stop.idx] = false;
            if let ParentLink::Ride(ride) = self.parents[round][stop.idx] {
                self.ride_snapshot
                    .push((*stop, self.round_arrivals[round][stop.idx], ride));
            }
        }
        self.ride_improved_stops.clear();

        let ride_snapshot = std::mem::take(&mut self.ride_snapshot);
        for (stop, arrival, ride) in &ride_snapshot {
            for (neighbour, walk) in data.foot_neighbours(stop) {
                let candidate = *arrival + *walk;
                if self.reached[neighbour.idx] && self.best_arrival[neighbour.idx] <= candidate {
                    continue;
                }
                self.set_label(
                    round,
                    *neighbour,
                    candidate,
                    ParentLink::Walk {
                        from_stop: *stop,
                        walk: *walk,
                        ride: *ride,
                    },
                );
            }
        }
        self.ride_snapshot = ride_snapshot;
    }

    fn set_label(
        &mut self,
        round: usize,
        stop: Stop,
        arrival: SecondsSinceDayStart,
        parent: ParentLink,
    ) {
        debug_assert!(parent != ParentLink::None);
        self.round_arrivals[round][stop.idx] = arrival;
        self.parents[round][stop.idx] = parent;
        self.best_arrival[stop.idx] = arrival;
        self.reached[stop.idx] = true;
        if !self.marked[stop.idx] {
            self.marked[stop.idx] = true;
            self.marked_stops.push(stop);
        }
        if !self.touched[stop.idx] {
            self.touched[stop.idx] = true;
            self.touched_stops.push(stop);
        }
    }

    fn ensure_rounds(&mut self, max_nb_of_rounds: usize) {
        while self.round_arrivals.len() < max_nb_of_rounds + 1 {
            self.round_arrivals
                .push(vec![SecondsSinceDayStart::zero(); self.nb_of_stops]);
            self.parents.push(vec![ParentLink::None; self.nb_of_stops]);
        }
    }

    // Reset the entries touched by the previous query, leaving the
    // untouched bulk of the arrays alone.
    fn clear(&mut self) {
        for idx in 0..self.touched_stops.len() {
            let stop = self.touched_stops[idx];
            self.reached[stop.idx] = false;
            self.marked[stop.idx] = false;
            self.ride_improved[stop.idx] = false;
            self.touched[stop.idx] = false;
            for parents in self.parents.iter_mut() {
                parents[stop.idx] = ParentLink::None;
            }
        }
        self.touched_stops.clear();
        self.marked_stops.clear();
        self.ride_improved_stops.clear();
        self.ride_snapshot.clear();
        self.routes_to_scan.clear();
        self.nb_of_rounds = 0;
    }
}

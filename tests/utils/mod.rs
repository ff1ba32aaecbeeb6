#![allow(dead_code)]

use restid::response::{Journey, Leg, RideLeg, WalkLeg};
use restid::{
    Coord, QueryGuard, RequestInput, RequestParams, SearchError, SearchResponse,
    SecondsSinceDayStart, Solver, TransitData,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(seconds: i64) -> SecondsSinceDayStart {
    SecondsSinceDayStart::from_seconds(seconds).unwrap()
}

pub fn request(origin: Coord, destination: Coord, departure_seconds: i64) -> RequestInput {
    RequestInput {
        origin,
        destination,
        departure_time: at(departure_seconds),
        params: RequestParams::default(),
    }
}

pub fn solve(
    data: &TransitData,
    origin: Coord,
    destination: Coord,
    departure_seconds: i64,
) -> Result<SearchResponse, SearchError> {
    let mut solver = Solver::new(data.nb_of_stops());
    solver.solve_request(
        data,
        &request(origin, destination, departure_seconds),
        &QueryGuard::new(),
    )
}

pub fn ride_legs(journey: &Journey) -> Vec<&RideLeg> {
    journey
        .legs
        .iter()
        .filter_map(|leg| match leg {
            Leg::Ride(ride_leg) => Some(ride_leg),
            Leg::Walk(_) => None,
        })
        .collect()
}

pub fn walk_legs(journey: &Journey) -> Vec<&WalkLeg> {
    journey
        .legs
        .iter()
        .filter_map(|leg| match leg {
            Leg::Walk(walk_leg) => Some(walk_leg),
            Leg::Ride(_) => None,
        })
        .collect()
}

/// Checks the structural soundness of a journey : an access walk first,
/// an egress walk last, legs that never go back in time, and coherent
/// journey-level times and transfer count.
pub fn assert_journey_sound(journey: &Journey) {
    assert!(!journey.legs.is_empty());

    match journey.legs.first() {
        Some(Leg::Walk(walk_leg)) => {
            assert!(walk_leg.from_stop.is_none());
            assert_eq!(walk_leg.from_time, journey.departure_time);
        }
        other => panic!("journey does not start with an access walk : {:?}", other),
    }
    match journey.legs.last() {
        Some(Leg::Walk(walk_leg)) => {
            assert!(walk_leg.to_stop.is_none());
            assert_eq!(walk_leg.to_time, journey.arrival_time);
        }
        other => panic!("journey does not end with an egress walk : {:?}", other),
    }

    for pair in journey.legs.windows(2) {
        assert!(
            pair[1].from_time() >= pair[0].to_time(),
            "legs go back in time : {:?} then {:?}",
            pair[0],
            pair[1]
        );
    }

    let nb_of_rides = ride_legs(journey).len();
    assert!(nb_of_rides >= 1);
    assert_eq!(journey.nb_of_transfers, nb_of_rides - 1);
}

use std::fmt::{Display, Formatter};

use crate::response::{Journey, Leg, RideLeg, StopInfo, WalkLeg};
use crate::time::PositiveDuration;
use crate::transit_data::{Stop, TransitData, Trip};

use super::raptor::{ParentLink, RaptorState, RideLabel};

/// A broken parent trail. This cannot happen against a validated
/// timetable ; reporting it instead of panicking lets the caller surface
/// the bug without taking the process down.
#[derive(Debug, Clone)]
pub struct BrokenJourney {
    details: String,
}

impl Display for BrokenJourney {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Broken parent trail : {}", self.details)
    }
}

impl std::error::Error for BrokenJourney {}

/// Walks the parent trails backwards and assembles one journey per
/// (egress stop, round) pair that reached the destination.
///
/// The journeys returned are raw candidates : deduplication and pareto
/// filtering happen downstream.
pub fn build_journeys(
    data: &TransitData,
    state: &RaptorState,
    egress: &[(Stop, PositiveDuration)],
) -> Result<Vec<Journey>, BrokenJourney> {
    let mut candidates = Vec::new();
    for (egress_stop, egress_walk) in egress {
        for round in 1..=state.nb_of_rounds() {
            match state.parent(round, egress_stop) {
                ParentLink::None | ParentLink::Access { .. } => continue,
                ParentLink::Ride(_) | ParentLink::Walk { .. } => (),
            }
            let journey = extract_journey(data, state, round, egress_stop, egress_walk)?;
            if !candidates.contains(&journey) {
                candidates.push(journey);
            }
        }
    }
    Ok(candidates)
}

fn extract_journey(
    data: &TransitData,
    state: &RaptorState,
    round: usize,
    egress_stop: &Stop,
    egress_walk: &PositiveDuration,
) -> Result<Journey, BrokenJourney> {
    let mut rev_legs: Vec<Leg> = Vec::new();
    let mut current_round = round;
    let mut current_stop = *egress_stop;
    let access_walk;

    loop {
        match state.parent(current_round, &current_stop) {
            ParentLink::None => {
                return Err(BrokenJourney {
                    details: format!(
                        "no label for stop `{}` at round {}",
                        data.stop_id(&current_stop),
                        current_round
                    ),
                });
            }
            ParentLink::Access { walk } => {
                if !rev_legs.iter().any(|leg| matches!(leg, Leg::Ride(_))) {
                    return Err(BrokenJourney {
                        details: format!(
                            "reached the origin from stop `{}` without any ride",
                            data.stop_id(egress_stop)
                        ),
                    });
                }
                access_walk = walk;
                break;
            }
            ParentLink::Ride(ride) => {
                current_stop = unwind_ride(data, &mut rev_legs, &ride)?;
                if current_round == 0 {
                    return Err(BrokenJourney {
                        details: format!("a ride at round 0 into `{}`", data.stop_id(egress_stop)),
                    });
                }
                current_round -= 1;
            }
            ParentLink::Walk {
                from_stop,
                walk,
                ride,
            } => {
                // the foot-path was taken right after alighting `ride` at
                // `from_stop` ; the trail carries the ride itself, since a
                // better walk of the same round may have overwritten the
                // label of `from_stop`
                let alight_stop = data.stop_at(&ride.trip.route, ride.alight_position);
                if alight_stop != from_stop {
                    return Err(BrokenJourney {
                        details: format!(
                            "a foot-path from stop `{}` after a ride alighting at stop `{}`",
                            data.stop_id(&from_stop),
                            data.stop_id(&alight_stop)
                        ),
                    });
                }
                let ride_arrival = data.arrival_time(&ride.trip, ride.alight_position);
                rev_legs.push(Leg::Walk(WalkLeg {
                    from_stop: Some(stop_info(data, &from_stop)),
                    to_stop: Some(stop_info(data, &current_stop)),
                    from_time: ride_arrival,
                    to_time: ride_arrival + walk,
                }));
                current_stop = unwind_ride(data, &mut rev_legs, &ride)?;
                if current_round == 0 {
                    return Err(BrokenJourney {
                        details: format!("a ride at round 0 into `{}`", data.stop_id(egress_stop)),
                    });
                }
                current_round -= 1;
            }
        }
    }

    rev_legs.reverse();
    let mut legs = rev_legs;

    // the access walk is timed to arrive exactly at the first departure :
    // leaving the origin any earlier would only add waiting
    let first_ride_departure = match legs.first() {
        Some(Leg::Ride(ride_leg)) => ride_leg.from_time,
        _ => {
            return Err(BrokenJourney {
                details: "a journey not starting with a ride".to_string(),
            });
        }
    };
    let departure_time = crate::time::SecondsSinceDayStart::from_seconds(
        first_ride_departure.total_seconds() - access_walk.total_seconds(),
    )
    .ok_or_else(|| BrokenJourney {
        details: "an access walk longer than the time before the first departure".to_string(),
    })?;
    let first_board_stop = match legs.first() {
        Some(Leg::Ride(ride_leg)) => ride_leg.from_stop.clone(),
        _ => unreachable!(),
    };
    legs.insert(
        0,
        Leg::Walk(WalkLeg {
            from_stop: None,
            to_stop: Some(first_board_stop),
            from_time: departure_time,
            to_time: first_ride_departure,
        }),
    );

    let last_arrival = state.arrival(round, egress_stop);
    let arrival_time = last_arrival + *egress_walk;
    legs.push(Leg::Walk(WalkLeg {
        from_stop: Some(stop_info(data, egress_stop)),
        to_stop: None,
        from_time: last_arrival,
        to_time: arrival_time,
    }));

    // times must flow : each leg starts no earlier than the previous ends
    for pair in legs.windows(2) {
        if pair[1].from_time() < pair[0].to_time() {
            return Err(BrokenJourney {
                details: "legs going back in time".to_string(),
            });
        }
    }

    let nb_of_rides = legs
        .iter()
        .filter(|leg| matches!(leg, Leg::Ride(_)))
        .count();

    Ok(Journey {
        departure_time,
        arrival_time,
        nb_of_transfers: nb_of_rides - 1,
        legs,
    })
}

// Emits the ride leg and returns the stop it was boarded at.
fn unwind_ride(
    data: &TransitData,
    rev_legs: &mut Vec<Leg>,
    ride: &RideLabel,
) -> Result<Stop, BrokenJourney> {
    if ride.alight_position <= ride.board_position {
        return Err(BrokenJourney {
            details: format!(
                "trip `{}` alights at position {} but boards at position {}",
                data.trip_id(&ride.trip),
                ride.alight_position,
                ride.board_position
            ),
        });
    }
    rev_legs.push(make_ride_leg(
        data,
        &ride.trip,
        ride.board_position,
        ride.alight_position,
    ));
    Ok(data.stop_at(&ride.trip.route, ride.board_position))
}

fn make_ride_leg(
    data: &TransitData,
    trip: &Trip,
    board_position: usize,
    alight_position: usize,
) -> Leg {
    let board_stop = data.stop_at(&trip.route, board_position);
    let alight_stop = data.stop_at(&trip.route, alight_position);
    Leg::Ride(RideLeg {
        from_stop: stop_info(data, &board_stop),
        to_stop: stop_info(data, &alight_stop),
        from_time: data.departure_time(trip, board_position),
        to_time: data.arrival_time(trip, alight_position),
        route_name: data.trip_route_name(trip).to_string(),
        trip_id: data.trip_id(trip).to_string(),
        board_position,
        alight_position,
    })
}

fn stop_info(data: &TransitData, stop: &Stop) -> StopInfo {
    StopInfo {
        id: data.stop_id(stop).to_string(),
        name: data.stop_name(stop).to_string(),
        platform_code: data.stop_platform_code(stop).map(|code| code.to_string()),
    }
}

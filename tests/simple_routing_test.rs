mod utils;

use anyhow::Error;
use restid::modelbuilder::TimetableBuilder;
use restid::Coord;
use utils::{assert_journey_sound, init_logger, ride_legs, solve};

#[test]
fn test_direct_ride() -> Result<(), Error> {
    init_logger();

    let data = TimetableBuilder::default()
        .stop("X", 0.0, 0.0)
        .stop("Y", 0.0, 0.01)
        .vj("toto", |vj| {
            vj.route("line 1").st_at("X", 600, 600).st_at("Y", 900, 900);
        })
        .build()?;

    let response = solve(&data, Coord::new(0.0, 0.0), Coord::new(0.0, 0.01), 500)?;

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_journey_sound(journey);
    assert_eq!(journey.arrival_time.total_seconds(), 900);
    assert_eq!(journey.departure_time.total_seconds(), 600);
    assert_eq!(journey.nb_of_transfers, 0);

    let rides = ride_legs(journey);
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].trip_id, "toto");
    assert_eq!(rides[0].from_stop.id, "X");
    assert_eq!(rides[0].to_stop.id, "Y");
    assert_eq!(rides[0].from_time.total_seconds(), 600);
    assert_eq!(rides[0].to_time.total_seconds(), 900);

    Ok(())
}

#[test]
fn test_one_transfer() -> Result<(), Error> {
    init_logger();

    let data = TimetableBuilder::default()
        .stop("X", 0.0, 0.0)
        .stop("M", 0.0, 0.02)
        .stop("Y", 0.0, 0.04)
        .vj("first", |vj| {
            vj.route("line 1").st_at("X", 600, 600).st_at("M", 900, 900);
        })
        .vj("second", |vj| {
            vj.route("line 2")
                .st_at("M", 900, 900)
                .st_at("Y", 1200, 1200);
        })
        .build()?;

    let response = solve(&data, Coord::new(0.0, 0.0), Coord::new(0.0, 0.04), 500)?;

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_journey_sound(journey);
    assert_eq!(journey.arrival_time.total_seconds(), 1200);
    assert_eq!(journey.nb_of_transfers, 1);

    let rides = ride_legs(journey);
    assert_eq!(rides.len(), 2);
    assert_eq!(rides[0].trip_id, "first");
    assert_eq!(rides[1].trip_id, "second");
    // the interchange happens at M, without walking
    assert_eq!(rides[0].to_stop.id, "M");
    assert_eq!(rides[1].from_stop.id, "M");

    Ok(())
}

#[test]
fn test_same_stop_transfer_duration_makes_tight_connection_miss() -> Result<(), Error> {
    init_logger();

    let data = TimetableBuilder::default()
        .stop("X", 0.0, 0.0)
        .stop("M", 0.0, 0.02)
        .stop("Y", 0.0, 0.04)
        .vj("first", |vj| {
            vj.route("line 1").st_at("X", 600, 600).st_at("M", 900, 900);
        })
        .vj("tight", |vj| {
            vj.route("line 2")
                .st_at("M", 900, 900)
                .st_at("Y", 1200, 1200);
        })
        .vj("loose", |vj| {
            vj.route("line 2")
                .st_at("M", 1100, 1100)
                .st_at("Y", 1400, 1400);
        })
        .build()?;

    let mut request = utils::request(Coord::new(0.0, 0.0), Coord::new(0.0, 0.04), 500);
    request.params.same_stop_transfer_duration =
        restid::PositiveDuration::from_hms(0, 1, 0);
    let mut solver = restid::Solver::new(data.nb_of_stops());
    let response = solver.solve_request(&data, &request, &restid::QueryGuard::new())?;

    // arriving at M at 900, the 900 departure cannot be caught with a
    // one-minute interchange : the next trip of the line is taken
    let journey = &response.journeys[0];
    assert_journey_sound(journey);
    assert_eq!(journey.arrival_time.total_seconds(), 1400);
    let rides = ride_legs(journey);
    assert_eq!(rides[1].trip_id, "loose");

    Ok(())
}

#[test]
fn test_loop_route_alights_at_later_position() -> Result<(), Error> {
    init_logger();

    // the route serves A twice : positions 0 and 2 are distinct boarding
    // points of the same stop
    let data = TimetableBuilder::default()
        .stop("A", 0.0, 0.0)
        .stop("B", 0.0, 0.02)
        .stop("C", 0.0, 0.04)
        .vj("loop", |vj| {
            vj.route("ring")
                .st_at("A", 0, 0)
                .st_at("B", 100, 100)
                .st_at("A", 200, 200)
                .st_at("C", 300, 300);
        })
        .build()?;

    let response = solve(&data, Coord::new(0.0, 0.0), Coord::new(0.0, 0.04), 0)?;

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_journey_sound(journey);
    assert_eq!(journey.arrival_time.total_seconds(), 300);
    assert_eq!(journey.nb_of_transfers, 0);

    let rides = ride_legs(journey);
    assert_eq!(rides.len(), 1);
    // boarding at the first appearance of A beats re-boarding at position 2
    assert_eq!(rides[0].board_position, 0);
    assert_eq!(rides[0].alight_position, 3);
    assert_eq!(rides[0].to_stop.id, "C");

    Ok(())
}

#[test]
fn test_round_trip_on_mirrored_timetable() -> Result<(), Error> {
    init_logger();

    let data = TimetableBuilder::default()
        .stop("A", 0.0, 0.0)
        .stop("B", 0.0, 0.02)
        .vj("outbound", |vj| {
            vj.route("line 1").st_at("A", 600, 600).st_at("B", 900, 900);
        })
        .vj("inbound", |vj| {
            vj.route("line 1")
                .st_at("B", 1000, 1000)
                .st_at("A", 1300, 1300);
        })
        .build()?;

    let origin = Coord::new(0.0, 0.0);
    let destination = Coord::new(0.0, 0.02);

    let outbound = solve(&data, origin, destination, 500)?;
    let arrival = outbound.journeys[0].arrival_time.total_seconds();
    assert_eq!(arrival, 900);

    // the trip back takes as long as the trip out took
    let inbound = solve(&data, destination, origin, arrival)?;
    let journey = &inbound.journeys[0];
    assert_journey_sound(journey);
    assert_eq!(journey.arrival_time.total_seconds(), 1300);

    Ok(())
}

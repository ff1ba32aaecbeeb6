mod utils;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Error;
use restid::modelbuilder::TimetableBuilder;
use restid::{Coord, QueryGuard, SearchError, Solver, TransitData};
use utils::{init_logger, request, solve};

fn small_timetable() -> Result<TransitData, Error> {
    let data = TimetableBuilder::default()
        .stop("X", 0.0, 0.0)
        .stop("Y", 0.0, 0.02)
        .vj("toto", |vj| {
            vj.route("line 1").st_at("X", 600, 600).st_at("Y", 900, 900);
        })
        .build()?;
    Ok(data)
}

#[test]
fn test_no_access_stops() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    // ~100 km away from every stop
    let result = solve(&data, Coord::new(1.0, 1.0), Coord::new(0.0, 0.02), 500);
    assert!(matches!(result, Err(SearchError::NoAccessStops)));

    Ok(())
}

#[test]
fn test_no_egress_stops() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    let result = solve(&data, Coord::new(0.0, 0.0), Coord::new(1.0, 1.0), 500);
    assert!(matches!(result, Err(SearchError::NoEgressStops)));

    Ok(())
}

#[test]
fn test_invalid_coordinates() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    let result = solve(&data, Coord::new(91.0, 0.0), Coord::new(0.0, 0.02), 500);
    assert!(matches!(result, Err(SearchError::InvalidInput(_))));

    Ok(())
}

#[test]
fn test_no_journey_found_when_every_trip_departed() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    // the only trip leaves at 600
    let result = solve(&data, Coord::new(0.0, 0.0), Coord::new(0.0, 0.02), 700);
    assert!(matches!(result, Err(SearchError::NoJourneyFound)));

    Ok(())
}

#[test]
fn test_cancelled_query() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    let token = Arc::new(AtomicBool::new(false));
    token.store(true, Ordering::Relaxed);
    let guard = QueryGuard::new().with_cancel_token(Arc::clone(&token));

    let mut solver = Solver::new(data.nb_of_stops());
    let result = solver.solve_request(
        &data,
        &request(Coord::new(0.0, 0.0), Coord::new(0.0, 0.02), 500),
        &guard,
    );
    assert!(matches!(result, Err(SearchError::Cancelled)));

    Ok(())
}

#[test]
fn test_timeout() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    let mut query = request(Coord::new(0.0, 0.0), Coord::new(0.0, 0.02), 500);
    query.params.timeout_milliseconds = Some(0);

    let mut solver = Solver::new(data.nb_of_stops());
    let result = solver.solve_request(&data, &query, &QueryGuard::new());
    assert!(matches!(result, Err(SearchError::Timeout)));

    Ok(())
}

#[test]
fn test_bad_departure_epoch() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    let mut solver = Solver::new(data.nb_of_stops());
    // several years before the service day of the snapshot
    let result = restid::search(
        &data,
        &mut solver,
        Coord::new(0.0, 0.0),
        Coord::new(0.0, 0.02),
        0,
        Default::default(),
        &QueryGuard::new(),
    );
    assert!(matches!(result, Err(SearchError::InvalidInput(_))));

    Ok(())
}

#[test]
fn test_search_with_epoch_departure() -> Result<(), Error> {
    init_logger();
    let data = small_timetable()?;

    // 2020-01-01T00:00:00 UTC
    let day_start_epoch = 1_577_836_800;
    let mut solver = Solver::new(data.nb_of_stops());
    let response = restid::search(
        &data,
        &mut solver,
        Coord::new(0.0, 0.0),
        Coord::new(0.0, 0.02),
        day_start_epoch + 500,
        Default::default(),
        &QueryGuard::new(),
    )?;
    assert_eq!(response.journeys[0].arrival_time.total_seconds(), 900);

    Ok(())
}

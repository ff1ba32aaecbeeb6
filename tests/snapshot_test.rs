mod utils;

use anyhow::Error;
use restid::modelbuilder::TimetableBuilder;
use restid::snapshot::SnapshotPublisher;
use restid::{Coord, QueryGuard, Solver, TransitData};
use utils::{init_logger, request};

fn timetable_with_trips(nb_of_trips: i64) -> Result<TransitData, Error> {
    let mut builder = TimetableBuilder::default()
        .stop("X", 0.0, 0.0)
        .stop("Y", 0.0, 0.02);
    for trip_idx in 0..nb_of_trips {
        let departure = 600 + trip_idx * 1200;
        builder = builder.vj(&format!("trip_{}", trip_idx), |vj| {
            vj.route("line 1")
                .st_at("X", departure, departure)
                .st_at("Y", departure + 300, departure + 300);
        });
    }
    Ok(builder.build()?)
}

#[test]
fn test_snapshot_swap_does_not_disturb_captured_snapshot() -> Result<(), Error> {
    init_logger();

    let publisher = SnapshotPublisher::new(timetable_with_trips(1)?);
    let reader = publisher.reader();

    // a query captures the snapshot once and keeps it
    let captured = reader.snapshot();
    assert_eq!(captured.nb_of_trips(), 1);

    publisher.publish(timetable_with_trips(2)?);

    // the capture still answers against the old timetable
    assert_eq!(captured.nb_of_trips(), 1);
    let mut solver = Solver::new(captured.nb_of_stops());
    let query = request(Coord::new(0.0, 0.0), Coord::new(0.0, 0.02), 1000);
    assert!(solver
        .solve_request(&captured, &query, &QueryGuard::new())
        .is_err());

    // a fresh capture sees the published timetable, whose second trip
    // leaves after the requested departure time
    let fresh = reader.snapshot();
    assert_eq!(fresh.nb_of_trips(), 2);
    let response = solver.solve_request(&fresh, &query, &QueryGuard::new())?;
    assert_eq!(response.journeys[0].arrival_time.total_seconds(), 2100);

    Ok(())
}

mod utils;

use anyhow::Error;
use restid::modelbuilder::TimetableBuilder;
use restid::Coord;
use utils::{init_logger, solve};

#[test]
fn test_journey_serialization_schema() -> Result<(), Error> {
    init_logger();

    let data = TimetableBuilder::default()
        .stop_full("X", "Malmö C", Some("3"), 0.0, 0.0)
        .stop("Y", 0.0, 0.02)
        .vj("toto", |vj| {
            vj.route("line 1").st_at("X", 600, 600).st_at("Y", 900, 900);
        })
        .build()?;

    let response = solve(&data, Coord::new(0.0, 0.0), Coord::new(0.0, 0.02), 500)?;
    let json = serde_json::to_value(&response.journeys)?;

    let journey = &json[0];
    assert_eq!(journey["departure_time"], 600);
    assert_eq!(journey["arrival_time"], 900);
    assert_eq!(journey["nb_of_transfers"], 0);

    let legs = journey["legs"].as_array().unwrap();
    assert_eq!(legs.len(), 3);
    assert_eq!(legs[0]["kind"], "walk");
    assert_eq!(legs[1]["kind"], "ride");
    assert_eq!(legs[2]["kind"], "walk");

    // the access walk has no from_stop : it starts at the origin
    assert!(legs[0].get("from_stop").is_none());
    assert_eq!(legs[1]["from_stop"]["id"], "X");
    assert_eq!(legs[1]["from_stop"]["name"], "Malmö C");
    assert_eq!(legs[1]["from_stop"]["platform_code"], "3");
    assert_eq!(legs[1]["trip_id"], "toto");
    assert_eq!(legs[1]["route_name"], "line 1");
    assert_eq!(legs[1]["board_position"], 0);
    assert_eq!(legs[1]["alight_position"], 1);

    Ok(())
}

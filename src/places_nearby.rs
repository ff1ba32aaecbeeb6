use std::fmt::{Display, Formatter};

use crate::geometry::{distance_coord_to_coord, Coord};
use crate::transit_data::{Stop, TransitData};

#[derive(Debug, Clone, PartialEq)]
pub enum BadPlacesNearby {
    InvalidRangeCoord(Coord),
    InvalidRadius(f64),
}

impl Display for BadPlacesNearby {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BadPlacesNearby::InvalidRangeCoord(coord) => {
                write!(
                    f,
                    "Invalid coord : ({};{}). Coordinates must be between [-90;90] for latitude and [-180;180] for longitude",
                    coord.lat, coord.lon
                )
            }
            BadPlacesNearby::InvalidRadius(radius) => {
                write!(f, "Invalid radius : {}. Radius must be positive", radius)
            }
        }
    }
}

impl std::error::Error for BadPlacesNearby {}

/// All stops within `radius` meters of `coord`, with their distance,
/// ordered by increasing distance.
///
/// Uses the grid built for the foot-path construction : only the cells
/// around `coord` are inspected, never the whole stop collection.
pub fn places_nearby(
    data: &TransitData,
    coord: &Coord,
    radius: f64,
) -> Result<Vec<(Stop, f64)>, BadPlacesNearby> {
    if !coord.is_valid() {
        return Err(BadPlacesNearby::InvalidRangeCoord(*coord));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(BadPlacesNearby::InvalidRadius(radius));
    }

    let mut result: Vec<(Stop, f64)> = data
        .grid
        .candidates_within(coord, radius)
        .filter_map(|stop| {
            let distance = distance_coord_to_coord(coord, &data.stop_coord(&stop));
            if distance <= radius {
                Some((stop, distance))
            } else {
                None
            }
        })
        .collect();
    result.sort_by(|(_, lhs), (_, rhs)| lhs.partial_cmp(rhs).unwrap_or(std::cmp::Ordering::Equal));
    Ok(result)
}

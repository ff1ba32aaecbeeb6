use serde::{Deserialize, Serialize};

use crate::transit_data::Stop;

const N_DEG_TO_RAD: f64 = 0.017_453_292_38;
const EARTH_RADIUS_IN_METERS: f64 = 6_372_797.560856;

// meters spanned by one degree of latitude, everywhere on the globe
const METERS_PER_LAT_DEGREE: f64 = EARTH_RADIUS_IN_METERS * N_DEG_TO_RAD;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
            && self.lat.is_finite()
            && self.lon.is_finite()
    }
}

pub fn distance_coord_to_coord(from: &Coord, to: &Coord) -> f64 {
    let longitude_arc = (from.lon - to.lon) * N_DEG_TO_RAD;
    let latitude_arc = (from.lat - to.lat) * N_DEG_TO_RAD;
    let latitude_h = (latitude_arc * 0.5).sin();
    let latitude_h = latitude_h * latitude_h;
    let longitude_h = (longitude_arc * 0.5).sin();
    let longitude_h = longitude_h * longitude_h;
    let tmp = (from.lat * N_DEG_TO_RAD).cos() * (to.lat * N_DEG_TO_RAD).cos();
    EARTH_RADIUS_IN_METERS * 2.0 * (latitude_h + tmp * longitude_h).sqrt().asin()
}

/// Buckets stops into fixed-size geographic cells, so that
/// radius queries inspect a handful of cells instead of every stop.
/// The cell size is chosen close to the foot-path radius : a query with
/// that radius never looks beyond the 3x3 block around its own cell.
#[derive(Debug)]
pub struct StopGrid {
    cell_size_meters: f64,
    // meters spanned by one degree of longitude, at the mean latitude
    // of the stops. Good enough for a regional timetable.
    meters_per_lon_degree: f64,
    cells: std::collections::HashMap<(i32, i32), Vec<Stop>>,
}

impl StopGrid {
    pub fn new<Stops>(stops: Stops, cell_size_meters: f64) -> Self
    where
        Stops: Iterator<Item = (Stop, Coord)> + Clone,
    {
        let nb_of_stops = stops.clone().count();
        let mean_lat = if nb_of_stops == 0 {
            0.0
        } else {
            stops.clone().map(|(_, coord)| coord.lat).sum::<f64>() / nb_of_stops as f64
        };
        let meters_per_lon_degree = METERS_PER_LAT_DEGREE * (mean_lat * N_DEG_TO_RAD).cos();

        let mut result = Self {
            cell_size_meters,
            // guard against a timetable whose stops are all near a pole
            meters_per_lon_degree: meters_per_lon_degree.max(1.0),
            cells: std::collections::HashMap::new(),
        };
        for (stop, coord) in stops {
            let key = result.cell_of(&coord);
            result.cells.entry(key).or_insert_with(Vec::new).push(stop);
        }
        result
    }

    fn cell_of(&self, coord: &Coord) -> (i32, i32) {
        let x = (coord.lat * METERS_PER_LAT_DEGREE / self.cell_size_meters).floor();
        let y = (coord.lon * self.meters_per_lon_degree / self.cell_size_meters).floor();
        (x as i32, y as i32)
    }

    /// All stops whose cell may contain a point within `radius` of `coord`.
    /// Candidates must still be checked against the exact haversine distance.
    pub fn candidates_within<'grid>(
        &'grid self,
        coord: &Coord,
        radius: f64,
    ) -> impl Iterator<Item = Stop> + 'grid {
        let (cell_x, cell_y) = self.cell_of(coord);
        let span = (radius / self.cell_size_meters).ceil() as i32;
        (cell_x - span..=cell_x + span)
            .flat_map(move |x| (cell_y - span..=cell_y + span).map(move |y| (x, y)))
            .filter_map(move |key| self.cells.get(&key))
            .flatten()
            .copied()
    }
}

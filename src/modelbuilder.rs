use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::config::ModelParams;
use crate::feed::{Feed, StopRecord, StopTimeRecord, TransferRecord, TripRecord};
use crate::geometry::Coord;
use crate::time::{PositiveDuration, SecondsSinceDayStart};
use crate::transit_data::init::ModelError;
use crate::transit_data::TransitData;

pub const DEFAULT_TIMEZONE: chrono_tz::Tz = chrono_tz::UTC;

/// Builder used to easily create a timetable snapshot.
///
/// ```
/// # use restid::modelbuilder::TimetableBuilder;
///
/// # fn main() {
/// let data = TimetableBuilder::default()
///     .stop("A", 55.60, 13.00)
///     .stop("B", 55.61, 13.01)
///     .vj("toto", |vj| {
///         vj.route("line 1")
///             .st("A", "10:00:00", "10:00:01")
///             .st("B", "11:00:00", "11:00:01");
///     })
///     .build()
///     .unwrap();
/// # }
/// ```
pub struct TimetableBuilder {
    stops: BTreeMap<String, StopRecord>,
    trips: Vec<TripRecord>,
    transfers: Vec<TransferRecord>,
    params: ModelParams,
    service_day: NaiveDate,
    timezone: chrono_tz::Tz,
}

/// Builder of one trip ; panics on malformed time strings, as a test
/// helper should.
pub struct VehicleJourneyBuilder {
    record: TripRecord,
}

impl Default for TimetableBuilder {
    fn default() -> Self {
        Self {
            stops: BTreeMap::new(),
            trips: Vec::new(),
            transfers: Vec::new(),
            params: ModelParams::default(),
            service_day: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl TimetableBuilder {
    pub fn stop(self, id: &str, lat: f64, lon: f64) -> Self {
        self.stop_full(id, id, None, lat, lon)
    }

    pub fn stop_full(
        mut self,
        id: &str,
        name: &str,
        platform_code: Option<&str>,
        lat: f64,
        lon: f64,
    ) -> Self {
        self.stops.insert(
            id.to_string(),
            StopRecord {
                id: id.to_string(),
                name: name.to_string(),
                platform_code: platform_code.map(|code| code.to_string()),
                coord: Coord::new(lat, lon),
            },
        );
        self
    }

    /// Add a new trip, configured by the closure.
    pub fn vj<F>(mut self, trip_id: &str, mut vj_initer: F) -> Self
    where
        F: FnMut(&mut VehicleJourneyBuilder),
    {
        let mut vj_builder = VehicleJourneyBuilder {
            record: TripRecord {
                id: trip_id.to_string(),
                route_name: trip_id.to_string(),
                stop_times: Vec::new(),
            },
        };
        vj_initer(&mut vj_builder);
        self.trips.push(vj_builder.record);
        self
    }

    pub fn transfer(mut self, from_stop_id: &str, to_stop_id: &str, duration: &str) -> Self {
        self.transfers.push(TransferRecord {
            from_stop_id: from_stop_id.to_string(),
            to_stop_id: to_stop_id.to_string(),
            duration: PositiveDuration::from_str(duration)
                .expect("invalid transfer duration string"),
        });
        self
    }

    pub fn params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    pub fn service_day(mut self, service_day: NaiveDate) -> Self {
        self.service_day = service_day;
        self
    }

    pub fn timezone(mut self, timezone: chrono_tz::Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn build(self) -> Result<TransitData, ModelError> {
        let feed = BuiltFeed {
            stops: self.stops.into_values().collect(),
            trips: self.trips,
            transfers: self.transfers,
        };
        TransitData::new(&feed, self.params, self.service_day, self.timezone)
    }
}

impl VehicleJourneyBuilder {
    pub fn route(&mut self, route_name: &str) -> &mut Self {
        self.record.route_name = route_name.to_string();
        self
    }

    /// Add a stop time at `stop_id`, with arrival and departure given as
    /// "hh:mm:ss" strings.
    pub fn st(&mut self, stop_id: &str, arrival: &str, departure: &str) -> &mut Self {
        self.st_at(
            stop_id,
            SecondsSinceDayStart::from_str(arrival)
                .expect("invalid arrival time string")
                .total_seconds(),
            SecondsSinceDayStart::from_str(departure)
                .expect("invalid departure time string")
                .total_seconds(),
        )
    }

    /// Same as `st`, with times in seconds since the service day start.
    pub fn st_at(&mut self, stop_id: &str, arrival: i64, departure: i64) -> &mut Self {
        self.record.stop_times.push(StopTimeRecord {
            stop_id: stop_id.to_string(),
            arrival: SecondsSinceDayStart::from_seconds(arrival)
                .expect("arrival out of the service day range"),
            departure: SecondsSinceDayStart::from_seconds(departure)
                .expect("departure out of the service day range"),
        });
        self
    }
}

struct BuiltFeed {
    stops: Vec<StopRecord>,
    trips: Vec<TripRecord>,
    transfers: Vec<TransferRecord>,
}

impl Feed for BuiltFeed {
    fn stops(&self) -> &[StopRecord] {
        &self.stops
    }

    fn trips(&self) -> &[TripRecord] {
        &self.trips
    }

    fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }
}

mod engine;

pub mod config;
pub mod feed;
pub mod footpaths;
pub mod geometry;
pub mod modelbuilder;
pub mod places_nearby;
pub mod response;
pub mod snapshot;
pub mod solver;
pub mod time;
pub mod transit_data;

pub use chrono;
pub use chrono_tz;
pub use log;

pub use config::{ModelParams, ProfileParams, RequestParams};
pub use engine::QueryGuard;
pub use geometry::Coord;
pub use response::Journey;
pub use solver::{search, RequestInput, SearchError, SearchResponse, Solver};
pub use time::{PositiveDuration, SecondsSinceDayStart};
pub use transit_data::TransitData;

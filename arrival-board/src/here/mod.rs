//! HERE Transit API v8 client.
//!
//! This module provides an HTTP client for the HERE public transit API,
//! which serves both the live departures board and the station proximity
//! search used when building the crosswalk.
//!
//! Key characteristics of HERE:
//! - Station ids are opaque strings such as `10327_73`
//! - Departure times are ISO 8601 with the local UTC offset
//! - Fields are omitted rather than sent as null, and a departure may lack
//!   a line name entirely

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{HereClient, HereConfig};
pub use convert::{convert_departures, convert_stations, minutes_until};
pub use error::HereError;
pub use mock::MockArrivalSource;
pub use types::{
    Board, Departure, DeparturesResponse, Location, Place, StationItem, StationsResponse,
    Transport,
};

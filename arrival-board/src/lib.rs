//! Live arrival boards for transit stations and station complexes.
//!
//! Answers: "what is arriving here in the next few minutes?" A logical
//! station id is resolved through a crosswalk to the external stops that
//! serve it, those stops are queried concurrently, and the merged board is
//! sorted and filtered. When the live source is silent, the station's
//! static line list stands in.

pub mod aggregator;
pub mod builder;
pub mod cache;
pub mod config;
pub mod crosswalk;
pub mod domain;
pub mod here;

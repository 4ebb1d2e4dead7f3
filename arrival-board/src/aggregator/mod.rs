//! Arrival aggregation.
//!
//! Answers "what is arriving at this station in the next few minutes?" for
//! a plain station or a complex: resolve the logical id to its external
//! stops, query them concurrently, then merge, sort and filter.

mod aggregate;
mod config;
mod merge;
mod source;

pub use aggregate::{Aggregator, ArrivalError, ArrivalQuery, ArrivalResult, PlatformFailure};
pub use config::AggregatorConfig;
pub use merge::{apply_line_filter, apply_window, merge_boards, observed_lines, sort_arrivals};
pub use source::{ArrivalSource, SourceError};

//! Logs module — log file discovery, decompression, and identifier
//! extraction.

pub mod aggregate;
pub mod day;
pub mod extract;
pub mod gzip;
pub mod locate;
pub mod source;

pub use day::CalendarDay;
pub use source::LogSource;

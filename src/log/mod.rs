//! Parsing for benchmark stdout logs and the bar-chart summary files.

pub mod parse;
pub mod record;
pub mod summary;

pub use parse::{parse_log_file, parse_log_files};
pub use record::{LogRecord, Summary, SummaryRow};
pub use summary::parse_summary_file;

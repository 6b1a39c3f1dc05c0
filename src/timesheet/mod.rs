//! Timesheet views over stored tasks: date filtering, summaries, CSV
//! export and merging.

mod export;
mod filter;
mod merge;
mod summary;

pub use export::{CSV_HEADERS, default_filename, to_csv};
pub use filter::DateRange;
pub use merge::{merge_stored_tasks, merge_tasks};
pub use summary::{TimeSummary, hours};

mod library;
mod session;
mod stats;
mod word;

pub use library::{Library, LibraryName, LibraryNameError, SelectionError, WordSelection};
pub use session::{SessionPhase, SessionSummary, SessionSummaryError};
pub use stats::{AttemptStats, LibraryStats, StatsError};
pub use word::{Word, WordError, WordKey, normalize_spelling};

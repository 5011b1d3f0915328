use thiserror::Error;

use crate::model::{LibraryNameError, SelectionError, SessionSummaryError, StatsError, WordError};

/// Any validation failure raised by the domain model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    LibraryName(#[from] LibraryNameError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    SessionSummary(#[from] SessionSummaryError),
}

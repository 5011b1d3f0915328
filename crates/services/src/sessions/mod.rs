mod plan;
mod progress;
mod queries;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::WordPool;
pub use progress::SessionProgress;
pub use service::{AnswerFeedback, DictationSession, SessionStep};
pub use workflow::{DEFAULT_REPEAT, SessionAnswerResult, SessionLoopService};

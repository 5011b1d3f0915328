#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod library_service;
pub mod sessions;
pub mod speech;
pub mod stats_service;

pub use dictation_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, LibraryServiceError, SessionError, SpeechError, StatsServiceError,
};
pub use library_service::LibraryService;
pub use speech::{SilentSpeech, SpeechDispatcher, SpeechOutput, SpeechReport};
pub use stats_service::{LibraryReport, StatsService, WordReport};

pub use sessions::{
    AnswerFeedback, DictationSession, SessionAnswerResult, SessionLoopService, SessionProgress,
    SessionStep,
};

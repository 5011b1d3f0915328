use std::sync::{Arc, Mutex};

use dictation_core::model::{LibraryName, Word, WordSelection};
use dictation_core::time::fixed_now;
use services::{
    AppServices, Clock, SessionError, SessionStep, SpeechDispatcher, SpeechError, SpeechOutput,
};

struct MutedEngine;

impl SpeechOutput for MutedEngine {
    fn say(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::EngineUnavailable("muted".into()))
    }
}

#[derive(Default)]
struct RecordingEngine {
    said: Mutex<Vec<String>>,
}

impl SpeechOutput for RecordingEngine {
    fn say(&self, text: &str) -> Result<(), SpeechError> {
        self.said.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

fn animals() -> LibraryName {
    LibraryName::new("animals").unwrap()
}

async fn services_with_animals(db_name: &str) -> (AppServices, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:file:{db_name}?mode=memory&cache=shared");
    let services = AppServices::new_sqlite(
        &url,
        dir.path().join("Libraries"),
        Clock::fixed(fixed_now()),
    )
    .await
    .unwrap();
    services
        .libraries()
        .create_library(
            "animals",
            vec![
                Word::new("cat", "猫").unwrap(),
                Word::new("dog", "狗").unwrap(),
                Word::new("fox", "狐狸").unwrap(),
            ],
            false,
        )
        .await
        .unwrap();
    (services, dir)
}

#[tokio::test]
async fn session_loop_records_every_answer() {
    let (services, _dir) = services_with_animals("smoke_records").await;
    let loop_svc = services.session_loop();

    let mut session = loop_svc
        .start_session(&animals(), &WordSelection::All)
        .await
        .unwrap();

    let mut answered = 0;
    let summary = loop {
        let word = session.current_word().unwrap().word().to_owned();
        // Misspell the fox, get everything else right.
        let answer = if word == "fox" {
            "focks".to_owned()
        } else {
            word.to_uppercase()
        };
        let result = loop_svc.answer_current(&mut session, &answer).await.unwrap();
        answered += 1;
        assert_eq!(result.feedback.is_correct, word != "fox");
        assert_eq!(result.progress.attempts, answered);

        match loop_svc.advance(&mut session).unwrap() {
            SessionStep::Next(_) => {}
            SessionStep::Finished(summary) => break summary,
        }
    };

    assert_eq!(summary.score(), 2);
    assert_eq!(summary.attempts(), 3);
    assert_eq!(summary.words_total(), 3);

    let report = services.stats().library_report(&animals()).await.unwrap();
    assert_eq!(report.total_correct, 2);
    assert_eq!(report.total_attempts, 3);
    let fox = report.words.iter().find(|w| w.word == "fox").unwrap();
    assert_eq!((fox.correct, fox.total), (0, 1));

    services.shutdown().await;
}

#[tokio::test]
async fn selection_limits_the_working_set() {
    let (services, _dir) = services_with_animals("smoke_selection").await;
    let loop_svc = services.session_loop();

    let mut session = loop_svc
        .start_session(&animals(), &WordSelection::Indices(vec![1]))
        .await
        .unwrap();
    assert_eq!(session.current_word().unwrap().word(), "dog");
    loop_svc.answer_current(&mut session, " dog ").await.unwrap();
    assert!(matches!(
        loop_svc.advance(&mut session).unwrap(),
        SessionStep::Finished(_)
    ));

    let err = loop_svc
        .start_session(&animals(), &WordSelection::Indices(vec![7]))
        .await
        .unwrap_err();
    assert!(err.is_user_input());

    services.shutdown().await;
}

#[tokio::test]
async fn speech_failures_do_not_block_answering() {
    let (services, _dir) = services_with_animals("smoke_speech").await;
    let (speech, mut reports) = SpeechDispatcher::new(Arc::new(MutedEngine));
    let services = services.with_speech(speech, 1);
    let loop_svc = services.session_loop();

    let mut session = loop_svc
        .start_session(&animals(), &WordSelection::All)
        .await
        .unwrap();
    let word = session.current_word().unwrap().word().to_owned();

    let report = reports.recv().await.unwrap();
    assert_eq!(report.text, word);

    let result = loop_svc.answer_current(&mut session, &word).await.unwrap();
    assert!(result.feedback.is_correct);

    services.shutdown().await;
}

#[tokio::test]
async fn preview_speaks_selected_words_once_in_order() {
    let (services, _dir) = services_with_animals("smoke_preview").await;

    let words = services
        .session_loop()
        .preview(&animals(), &WordSelection::All)
        .await
        .unwrap();
    assert_eq!(words.len(), 3);
    assert!(!services.session_loop().has_speech());

    let engine = Arc::new(RecordingEngine::default());
    let (speech, _reports) = SpeechDispatcher::new(Arc::clone(&engine) as Arc<dyn SpeechOutput>);
    let services = services.with_speech(speech, 3);
    assert!(services.session_loop().has_speech());

    let words = services
        .session_loop()
        .preview(&animals(), &WordSelection::Indices(vec![2, 0]))
        .await
        .unwrap();
    let spellings: Vec<&str> = words.iter().map(Word::word).collect();
    assert_eq!(spellings, ["fox", "cat"]);
    assert_eq!(*engine.said.lock().unwrap(), vec!["fox", "cat"]);

    let err = services
        .session_loop()
        .preview(&animals(), &WordSelection::Indices(vec![7]))
        .await
        .unwrap_err();
    assert!(err.is_user_input());

    services.shutdown().await;
}

#[tokio::test]
async fn answers_fail_after_shutdown() {
    let (services, _dir) = services_with_animals("smoke_shutdown").await;
    let loop_svc = services.session_loop();
    let mut session = loop_svc
        .start_session(&animals(), &WordSelection::All)
        .await
        .unwrap();

    services.shutdown().await;

    let word = session.current_word().unwrap().word().to_owned();
    let err = loop_svc.answer_current(&mut session, &word).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(session.attempts(), 0);
}

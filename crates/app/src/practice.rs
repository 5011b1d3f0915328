use std::io::Write;

use dictation_core::model::{LibraryName, SessionSummary, WordSelection};
use services::{AnswerFeedback, DictationSession, SessionLoopService, SessionStep};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of user input during practice.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Replay,
    Skip,
    Quit,
    Answer(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            ":r" => Self::Replay,
            ":s" => Self::Skip,
            ":q" => Self::Quit,
            _ => Self::Answer(line),
        }
    }
}

/// Run an interactive session on stdin/stdout until it finishes, the user quits or input ends.
pub async fn run(
    session_loop: &SessionLoopService,
    library: &LibraryName,
    selection: &WordSelection,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session_loop.start_session(library, selection).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Practicing {library}. Type the word you hear; :r replays, :s skips, :q quits.");

    loop {
        let progress = session.progress();
        let Some(word) = session.current_word() else {
            break;
        };
        print!("[{}/{}] {} > ", progress.drawn, progress.total, word.meaning());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            print_partial(&session);
            return Ok(());
        };

        match Input::parse(&line) {
            Input::Replay => {
                session_loop.replay(&session);
                continue;
            }
            Input::Quit => {
                print_partial(&session);
                return Ok(());
            }
            Input::Skip => {
                println!("  skipped: {}", word.word());
            }
            Input::Answer(answer) => {
                match session_loop.answer_current(&mut session, answer).await {
                    Ok(result) => print_feedback(&result.feedback),
                    Err(err) if err.is_user_input() => {
                        println!("  {err}");
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        if let SessionStep::Finished(summary) = session_loop.advance(&mut session)? {
            print_summary(&summary);
            break;
        }
    }

    Ok(())
}

fn print_feedback(feedback: &AnswerFeedback) {
    if feedback.is_correct {
        println!("  correct: {}", feedback.correct_word);
    } else {
        println!(
            "  wrong, it is \"{}\" ({})",
            feedback.correct_word, feedback.meaning
        );
    }
    println!(
        "  lifetime {}/{} ({:.0}%)",
        feedback.attempt_correct_count,
        feedback.attempt_total_count,
        feedback.accuracy() * 100.0
    );
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "Done: {}/{} correct over {} words ({:.0}%).",
        summary.score(),
        summary.attempts(),
        summary.words_total(),
        summary.accuracy() * 100.0
    );
}

fn print_partial(session: &DictationSession) {
    println!(
        "Stopped: {}/{} correct so far.",
        session.score(),
        session.attempts()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognized_with_whitespace() {
        assert_eq!(Input::parse(" :r "), Input::Replay);
        assert_eq!(Input::parse(":s"), Input::Skip);
        assert_eq!(Input::parse(":q\n"), Input::Quit);
        assert_eq!(Input::parse(" Cat "), Input::Answer(" Cat "));
    }
}

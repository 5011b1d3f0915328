use std::sync::Arc;

use dictation_core::model::{LibraryName, Word};
use services::{AppServices, Clock, LibraryServiceError, SpeechDispatcher};
use tracing_subscriber::EnvFilter;

mod args;
mod practice;
mod speech;

use args::{Args, Command, Config, Parsed, prepare_sqlite_file, print_usage};
use speech::CommandSpeech;

const SAMPLE_LIBRARY: &str = "sample";

fn sample_words() -> Result<Vec<Word>, dictation_core::model::WordError> {
    [
        ("apple", "苹果"),
        ("library", "图书馆"),
        ("necessary", "必要的"),
        ("rhythm", "节奏"),
        ("weather", "天气"),
    ]
    .into_iter()
    .map(|(word, meaning)| Word::new(word, meaning))
    .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Wire speech into the services when a speech command is configured.
fn attach_speech(services: AppServices, config: &Config) -> AppServices {
    let Some(speech) = config.speech_cmd.as_deref().and_then(CommandSpeech::parse) else {
        return services;
    };
    let (dispatcher, mut reports) = SpeechDispatcher::new(Arc::new(speech));
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            eprintln!("(could not speak \"{}\": {})", report.text, report.error);
        }
    });
    services.with_speech(dispatcher, config.repeat)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    let Parsed::Run(Args { config, command }) = parsed else {
        print_usage();
        return Ok(());
    };

    // Open + migrate SQLite at startup.
    prepare_sqlite_file(&config.db_url)?;
    tracing::debug!(
        db = %config.db_url,
        libraries = %config.libraries_dir.display(),
        "opening storage"
    );
    let services =
        AppServices::new_sqlite(&config.db_url, &config.libraries_dir, Clock::system()).await?;
    let services = attach_speech(services, &config);

    let result = dispatch(&services, command).await;
    services.shutdown().await;
    result
}

async fn dispatch(
    services: &AppServices,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::List => {
            let names = services.libraries().list_libraries().await?;
            if names.is_empty() {
                println!("No libraries yet. Try `dictation seed` or `dictation import <file.json>`.");
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Show { library } => {
            let library = services
                .libraries()
                .load_library(&LibraryName::new(library)?)
                .await?;
            for (position, word) in library.words().iter().enumerate() {
                println!("{:>3}. {}  {}", position + 1, word.word(), word.meaning());
            }
        }
        Command::Stats { library, json } => {
            let report = services
                .stats()
                .library_report(&LibraryName::new(library)?)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_empty() {
                println!("No attempts recorded for {}.", report.library);
            } else {
                for word in &report.words {
                    println!(
                        "{:<20} {:>4}/{:<4} {:>5.1}%",
                        word.word,
                        word.correct,
                        word.total,
                        word.accuracy * 100.0
                    );
                }
                println!(
                    "{:<20} {:>4}/{:<4} {:>5.1}%",
                    "total",
                    report.total_correct,
                    report.total_attempts,
                    report.accuracy * 100.0
                );
            }
        }
        Command::Practice { library, selection } => {
            let library = LibraryName::new(library)?;
            practice::run(services.session_loop().as_ref(), &library, &selection).await?;
        }
        Command::Play { library, selection } => {
            let library = LibraryName::new(library)?;
            let session_loop = services.session_loop();
            if !session_loop.has_speech() {
                println!("No speech command configured; listing words only.");
            }
            let words = session_loop.preview(&library, &selection).await?;
            for word in &words {
                println!("{}  {}", word.word(), word.meaning());
            }
        }
        Command::Create {
            library,
            words,
            overwrite,
        } => {
            let count = words.len();
            let name = services
                .libraries()
                .create_library(&library, words, overwrite)
                .await?;
            println!("Created library {name} with {count} words.");
        }
        Command::AddWords { library, words } => {
            let name = LibraryName::new(library)?;
            let library = services.libraries().add_words(&name, words).await?;
            println!("{name} now has {} words.", library.len());
        }
        Command::RemoveWords { library, positions } => {
            let name = LibraryName::new(library)?;
            let library = services.libraries().remove_words(&name, &positions).await?;
            println!("{name} now has {} words.", library.len());
        }
        Command::Import { path } => {
            let name = services.libraries().import_file(&path).await?;
            println!("Imported {} as {name}.", path.display());
        }
        Command::Export { library, dest } => {
            let library = LibraryName::new(library)?;
            services.libraries().export_library(&library, &dest).await?;
            println!("Exported {library} to {}.", dest.display());
        }
        Command::Seed => {
            match services
                .libraries()
                .create_library(SAMPLE_LIBRARY, sample_words()?, false)
                .await
            {
                Ok(name) => println!("Created library {name}."),
                Err(LibraryServiceError::AlreadyExists(name)) => {
                    println!("Library {name} already exists; left unchanged.");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::fmt;
use std::path::{Path, PathBuf};

use dictation_core::model::{Word, WordSelection};
use services::session::DEFAULT_REPEAT;

const DEFAULT_DB_URL: &str = "sqlite://stats.db";
const DEFAULT_LIBRARIES_DIR: &str = "Libraries";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidRepeat { raw: String },
    InvalidWords { raw: String },
    InvalidEntry { raw: String },
    InvalidPosition { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing argument: {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRepeat { raw } => write!(f, "invalid --repeat value: {raw}"),
            ArgsError::InvalidWords { raw } => {
                write!(f, "invalid --words value: {raw} (expected 1-based positions like 1,3,5)")
            }
            ArgsError::InvalidEntry { raw } => {
                write!(f, "invalid word entry: {raw} (expected word:meaning)")
            }
            ArgsError::InvalidPosition { raw } => {
                write!(f, "invalid word position: {raw} (expected a number from 1)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_positional(
    positional: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<String, ArgsError> {
    positional.next().ok_or(ArgsError::MissingArgument { what })
}

/// Every remaining positional, at least one.
fn require_rest(
    positional: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<Vec<String>, ArgsError> {
    let rest: Vec<String> = positional.collect();
    if rest.is_empty() {
        return Err(ArgsError::MissingArgument { what });
    }
    Ok(rest)
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  dictation list");
    eprintln!("  dictation show <library>");
    eprintln!("  dictation stats <library> [--json]");
    eprintln!("  dictation practice <library> [--words 1,3,5]");
    eprintln!("  dictation play <library> [--words 1,3,5]");
    eprintln!("  dictation create <library> <word:meaning>... [--overwrite]");
    eprintln!("  dictation add-word <library> <word:meaning>...");
    eprintln!("  dictation remove-word <library> <position>...");
    eprintln!("  dictation import <file.json>");
    eprintln!("  dictation export <library> <file.json>");
    eprintln!("  dictation seed");
    eprintln!();
    eprintln!("Options (any subcommand):");
    eprintln!("  --db <sqlite_url>       default {DEFAULT_DB_URL}");
    eprintln!("  --libraries <dir>       default {DEFAULT_LIBRARIES_DIR}");
    eprintln!("  --speech-cmd <program>  speaks each word, e.g. \"espeak\"; silent when unset");
    eprintln!("  --repeat <n>            times each word is spoken, default {DEFAULT_REPEAT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DICTATION_DB_URL, DICTATION_LIBRARIES_DIR, DICTATION_SPEECH_CMD, DICTATION_REPEAT");
    eprintln!("  RUST_LOG (default info)");
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub libraries_dir: PathBuf,
    pub speech_cmd: Option<String>,
    pub repeat: u32,
}

impl Config {
    /// Defaults overridden by environment variables read through `env`.
    fn from_env(env: impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let db_url = env("DICTATION_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        let libraries_dir = env("DICTATION_LIBRARIES_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_LIBRARIES_DIR), PathBuf::from);
        let speech_cmd = env("DICTATION_SPEECH_CMD").filter(|v| !v.trim().is_empty());
        let repeat = match env("DICTATION_REPEAT") {
            Some(raw) => parse_repeat(raw)?,
            None => DEFAULT_REPEAT,
        };
        Ok(Self {
            db_url,
            libraries_dir,
            speech_cmd,
            repeat,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show { library: String },
    Stats { library: String, json: bool },
    Practice { library: String, selection: WordSelection },
    Play { library: String, selection: WordSelection },
    Create { library: String, words: Vec<Word>, overwrite: bool },
    AddWords { library: String, words: Vec<Word> },
    /// Zero-based positions.
    RemoveWords { library: String, positions: Vec<usize> },
    Import { path: PathBuf },
    Export { library: String, dest: PathBuf },
    Seed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Config,
    pub command: Command,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Parsed {
    Help,
    Run(Args),
}

impl Args {
    /// Parse `argv` (without the program name), falling back to `env` for unset options.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, ArgsError> {
        let mut args = argv.into_iter();
        let Some(name) = args.next() else {
            return Ok(Parsed::Help);
        };
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(Parsed::Help);
        }

        let mut config = Config::from_env(env)?;
        let mut json = false;
        let mut overwrite = false;
        let mut selection = WordSelection::All;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = value;
                }
                "--libraries" => {
                    config.libraries_dir = PathBuf::from(require_value(&mut args, "--libraries")?);
                }
                "--speech-cmd" => {
                    let value = require_value(&mut args, "--speech-cmd")?;
                    config.speech_cmd = Some(value).filter(|v| !v.trim().is_empty());
                }
                "--repeat" => {
                    config.repeat = parse_repeat(require_value(&mut args, "--repeat")?)?;
                }
                "--words" if matches!(name.as_str(), "practice" | "play") => {
                    selection = parse_positions(&require_value(&mut args, "--words")?)?;
                }
                "--json" if name == "stats" => json = true,
                "--overwrite" if name == "create" => overwrite = true,
                "--help" | "-h" => return Ok(Parsed::Help),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }
        config.db_url = normalize_sqlite_url(config.db_url);

        let mut positional = positional.into_iter();
        let command = match name.as_str() {
            "list" => Command::List,
            "seed" => Command::Seed,
            "show" => Command::Show {
                library: require_positional(&mut positional, "<library>")?,
            },
            "stats" => Command::Stats {
                library: require_positional(&mut positional, "<library>")?,
                json,
            },
            "practice" => Command::Practice {
                library: require_positional(&mut positional, "<library>")?,
                selection,
            },
            "import" => Command::Import {
                path: PathBuf::from(require_positional(&mut positional, "<file.json>")?),
            },
            "play" => Command::Play {
                library: require_positional(&mut positional, "<library>")?,
                selection,
            },
            "create" => Command::Create {
                library: require_positional(&mut positional, "<library>")?,
                words: parse_entries(require_rest(&mut positional, "<word:meaning>")?)?,
                overwrite,
            },
            "add-word" => Command::AddWords {
                library: require_positional(&mut positional, "<library>")?,
                words: parse_entries(require_rest(&mut positional, "<word:meaning>")?)?,
            },
            "remove-word" => Command::RemoveWords {
                library: require_positional(&mut positional, "<library>")?,
                positions: require_rest(&mut positional, "<position>")?
                    .into_iter()
                    .map(|raw| one_based(&raw).ok_or(ArgsError::InvalidPosition { raw }))
                    .collect::<Result<_, _>>()?,
            },
            "export" => Command::Export {
                library: require_positional(&mut positional, "<library>")?,
                dest: PathBuf::from(require_positional(&mut positional, "<file.json>")?),
            },
            _ => return Err(ArgsError::UnknownCommand(name)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Parsed::Run(Args { config, command }))
    }
}

fn parse_repeat(raw: String) -> Result<u32, ArgsError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ArgsError::InvalidRepeat { raw }),
    }
}

/// A 1-based position as a zero-based index.
fn one_based(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()?.checked_sub(1)
}

/// `1,3,5` (1-based) into zero-based indices.
fn parse_positions(raw: &str) -> Result<WordSelection, ArgsError> {
    let indices = raw
        .split(',')
        .map(|part| {
            one_based(part).ok_or_else(|| ArgsError::InvalidWords {
                raw: raw.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WordSelection::Indices(indices))
}

/// `word:meaning` entries. The meaning may itself contain colons.
fn parse_entries(raw: Vec<String>) -> Result<Vec<Word>, ArgsError> {
    raw.into_iter()
        .map(|entry| {
            entry
                .split_once(':')
                .and_then(|(word, meaning)| Word::new(word, meaning).ok())
                .ok_or_else(|| ArgsError::InvalidEntry { raw: entry.clone() })
        })
        .collect()
}

/// Make file-backed URLs absolute so the database does not move with the working directory.
pub fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.contains("mode=memory") {
        return trimmed.to_string();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Create the database file and its directory if missing.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

use chrono::{DateTime, Utc};
use srs_core::model::{
    ComprehensionLevel, ReviewRecord, UserId, VocabularyItem, VocabularyItemId,
};
use storage::{Storage, StorageConfig};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_WORDS: u32 = 8;

/// (word, translation, language)
const SAMPLE_WORDS: [(&str, &str, &str); 8] = [
    ("Hallo", "Hello", "de"),
    ("Danke", "Thank you", "de"),
    ("Bitte", "Please / You are welcome", "de"),
    ("gato", "cat", "es"),
    ("biblioteca", "library", "es"),
    ("merci", "thank you", "fr"),
    ("fenêtre", "window", "fr"),
    ("Guten Morgen", "Good morning", "de"),
];

#[derive(Debug, Error)]
enum ArgsError {
    #[error("{0} requires a value")]
    MissingValue(&'static str),
    #[error("unknown argument: {0}")]
    Unknown(String),
    #[error("invalid {flag} value: {raw}")]
    Invalid { flag: &'static str, raw: String },
}

#[derive(Debug, Clone)]
struct SeedArgs {
    config: StorageConfig,
    user_id: UserId,
    words: u32,
    now: Option<DateTime<Utc>>,
    help: bool,
}

impl SeedArgs {
    /// Flags win over `VOCAB_USER_ID` / `VOCAB_WORDS`, which win over defaults.
    fn parse(
        config: StorageConfig,
        env: impl Fn(&str) -> Option<String>,
        mut argv: impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            config,
            user_id: match env("VOCAB_USER_ID") {
                Some(raw) => parse_user(raw)?,
                None => UserId::random(),
            },
            words: env("VOCAB_WORDS")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_WORDS),
            now: None,
            help: false,
        };

        while let Some(flag) = argv.next() {
            let mut value = |name: &'static str| argv.next().ok_or(ArgsError::MissingValue(name));
            match flag.as_str() {
                "--db" => {
                    let url = value("--db")?;
                    if url.trim().is_empty() {
                        return Err(ArgsError::Invalid { flag: "--db", raw: url });
                    }
                    parsed.config.database_url = url;
                }
                "--user" => parsed.user_id = parse_user(value("--user")?)?,
                "--words" => {
                    let raw = value("--words")?;
                    parsed.words = raw
                        .parse()
                        .map_err(|_| ArgsError::Invalid { flag: "--words", raw })?;
                }
                "--now" => {
                    let raw = value("--now")?;
                    let at = DateTime::parse_from_rfc3339(&raw)
                        .map_err(|_| ArgsError::Invalid { flag: "--now", raw })?;
                    parsed.now = Some(at.with_timezone(&Utc));
                }
                "-h" | "--help" => parsed.help = true,
                _ => return Err(ArgsError::Unknown(flag)),
            }
        }

        Ok(parsed)
    }
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::Invalid { flag: "--user", raw })
}

fn usage() -> &'static str {
    "\
Seed sample vocabulary and review records for one user.

Usage: seed [--db <sqlite_url>] [--user <uuid>] [--words <n>] [--now <rfc3339>]

  --db      SQLite URL (default: sqlite:vocab.sqlite3)
  --user    owner of the seeded words (default: random)
  --words   number of words to upsert, cycling the samples (default: 8)
  --now     fixed current time, for deterministic review dates

Environment: VOCAB_DB_URL, VOCAB_DB_MAX_CONNECTIONS, VOCAB_DB_ACQUIRE_TIMEOUT_SECS,
VOCAB_USER_ID, VOCAB_WORDS, RUST_LOG"
}

async fn seed(args: &SeedArgs) -> Result<u32, Box<dyn std::error::Error>> {
    let storage = Storage::sqlite_with(&args.config).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut initialized = 0_u32;
    for (n, (word, translation, language)) in
        (1..=args.words).zip(SAMPLE_WORDS.iter().cycle())
    {
        let item = VocabularyItem::new(
            VocabularyItemId::new(u64::from(n)),
            args.user_id,
            *word,
            *translation,
            *language,
            ComprehensionLevel::default(),
        )?;
        storage.vocabulary.upsert_vocabulary_item(&item).await?;

        let existing = storage
            .reviews
            .get_review_record(item.id(), args.user_id)
            .await?;
        if existing.is_none() {
            let record = ReviewRecord::initial(item.id(), args.user_id, now);
            storage.reviews.upsert_review_record(&record).await?;
            initialized += 1;
        }
    }

    Ok(initialized)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = match SeedArgs::parse(
        StorageConfig::from_env(),
        |key| std::env::var(key).ok(),
        std::env::args().skip(1),
    ) {
        Ok(args) if args.help => {
            println!("{}", usage());
            return;
        }
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n\n{}", usage());
            std::process::exit(2);
        }
    };

    match seed(&args).await {
        Ok(initialized) => {
            tracing::info!(
                user_id = %args.user_id,
                words = args.words,
                initialized,
                database_url = %args.config.database_url,
                "seed complete"
            );
            println!("{} {}", args.user_id, args.config.database_url);
        }
        Err(err) => {
            tracing::error!(error = %err, "seed failed");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(env: &[(&str, &str)], argv: &[&str]) -> Result<SeedArgs, ArgsError> {
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SeedArgs::parse(
            StorageConfig::default(),
            |key| env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
            argv.iter().map(|s| (*s).to_string()),
        )
    }

    #[test]
    fn flags_override_environment() {
        let user = "6f1c2b2e-3f3a-4f7e-9d55-0b6c3f2f8a10";
        let args = parse(
            &[("VOCAB_WORDS", "3")],
            &["--words", "12", "--user", user, "--now", "2024-01-02T03:04:05Z"],
        )
        .unwrap();

        assert_eq!(args.words, 12);
        assert_eq!(args.user_id.to_string(), user);
        assert_eq!(args.now.unwrap().to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(!args.help);
    }

    #[test]
    fn environment_fills_defaults() {
        let args = parse(&[("VOCAB_WORDS", "3")], &[]).unwrap();
        assert_eq!(args.words, 3);
        assert_eq!(args.config.database_url, StorageConfig::default().database_url);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(
            parse(&[], &["--words"]),
            Err(ArgsError::MissingValue("--words"))
        ));
        assert!(matches!(
            parse(&[], &["--user", "nope"]),
            Err(ArgsError::Invalid { flag: "--user", .. })
        ));
        assert!(matches!(
            parse(&[], &["--db", "  "]),
            Err(ArgsError::Invalid { flag: "--db", .. })
        ));
        assert!(matches!(parse(&[], &["--bogus"]), Err(ArgsError::Unknown(_))));
    }
}

use std::fmt;

use clap::{Parser, Subcommand};
use services::{ActivitySubmission, AppServices, Clock};
use tracing_subscriber::EnvFilter;
use tracker_core::model::{DEFAULT_DEDUP_WINDOW_SECS, SectionId, TrackerSettings, UnitId, UserId};

mod render;

const DEFAULT_LOG_FILTER: &str = "tracker_app=info,services=info,storage=warn";

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser, Debug)]
#[command(name = "tracker-app")]
#[command(about = "Track learner activity and report course progress")]
struct Cli {
    /// `SQLite` database URL or path
    #[arg(
        long = "db",
        env = "TRACKER_DB_URL",
        default_value = "sqlite://progress.sqlite3",
        global = true
    )]
    db_url: String,

    /// Seconds within which an identical event is ignored
    #[arg(
        long,
        env = "TRACKER_DEDUP_WINDOW_SECS",
        default_value_t = DEFAULT_DEDUP_WINDOW_SECS,
        global = true
    )]
    dedup_window_secs: i64,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one learner activity
    Track {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: u64,
        #[arg(long)]
        section: String,
        #[arg(long = "type")]
        activity_type: String,
        /// JSON object stored with the event
        #[arg(long)]
        payload: Option<String>,
    },
    /// Confirm a task section by hand
    Check {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: u64,
        #[arg(long)]
        section: String,
    },
    /// Unit percentage with its category breakdown
    Summary {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: u64,
    },
    /// Summaries for every unit the learner has started
    Course {
        #[arg(long)]
        user: u64,
    },
    /// Every learner against every unit
    Cohort,
    /// Per-section drill-down for one learner
    Details {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: u64,
    },
    /// Where the learner left off
    Resume {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: Option<u64>,
    },
    /// Remember the section the learner is on
    Position {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        unit: u64,
        #[arg(long)]
        section: String,
    },
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

    let path = std::path::Path::new(path);
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.db_url.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: cli.db_url }.into());
    }
    let settings = TrackerSettings::new(cli.dedup_window_secs)?;
    let db_url = normalize_sqlite_url(cli.db_url);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), settings).await?;
    tracing::debug!(db = %db_url, "storage ready");

    let out = render::Output::new(cli.json);
    match cli.command {
        Command::Track {
            user,
            unit,
            section,
            activity_type,
            payload,
        } => {
            let submission =
                ActivitySubmission::parse(user, unit, &section, &activity_type, payload.as_deref())?;
            let outcome = app.tracking().track_activity(submission).await?;
            out.track(&outcome)?;
        }
        Command::Check {
            user,
            unit,
            section,
        } => {
            let outcome = app
                .tracking()
                .confirm_manual_check(
                    UserId::try_new(user)?,
                    UnitId::try_new(unit)?,
                    SectionId::new(section)?,
                )
                .await?;
            out.track(&outcome)?;
        }
        Command::Summary { user, unit } => {
            let summary = app
                .progress()
                .unit_summary(UserId::try_new(user)?, UnitId::try_new(unit)?)
                .await?;
            out.summary(&summary)?;
        }
        Command::Course { user } => {
            let summaries = app.progress().course_overview(UserId::try_new(user)?).await?;
            out.course(&summaries)?;
        }
        Command::Cohort => {
            let rows = app.progress().cohort_overview().await?;
            out.cohort(&rows)?;
        }
        Command::Details { user, unit } => {
            let details = app
                .progress()
                .unit_details(UserId::try_new(user)?, UnitId::try_new(unit)?)
                .await?;
            out.details(&details)?;
        }
        Command::Resume { user, unit } => {
            let user = UserId::try_new(user)?;
            let position = match unit {
                Some(unit) => app.positions().resume_unit(user, UnitId::try_new(unit)?).await?,
                None => app.positions().resume_course(user).await?,
            };
            out.position(position.as_ref())?;
        }
        Command::Position {
            user,
            unit,
            section,
        } => {
            let position = app
                .positions()
                .save_position(
                    UserId::try_new(user)?,
                    UnitId::try_new(unit)?,
                    SectionId::new(section)?,
                )
                .await?;
            out.position(Some(&position))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite://data/progress.sqlite3".into()),
            "sqlite://data/progress.sqlite3"
        );
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("/tmp/progress.sqlite3".into());
        assert_eq!(url, "sqlite:///tmp/progress.sqlite3");

        let relative = normalize_sqlite_url("sqlite:progress.sqlite3".into());
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("/progress.sqlite3"));
    }

    #[test]
    fn cli_parses_track_with_defaults() {
        let cli = Cli::try_parse_from([
            "tracker-app",
            "track",
            "--user",
            "1",
            "--unit",
            "2",
            "--section",
            "overview",
            "--type",
            "video_watch",
        ])
        .unwrap();
        assert!(!cli.json);
        assert!(matches!(
            cli.command,
            Command::Track { user: 1, unit: 2, ref section, .. } if section == "overview"
        ));
    }

    #[test]
    fn cli_parses_cohort_with_global_flags() {
        let cli = Cli::try_parse_from(["tracker-app", "cohort", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Cohort));
    }

    #[test]
    fn prepare_rejects_non_sqlite_urls() {
        assert!(prepare_sqlite_file("postgres://localhost/db").is_err());
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}

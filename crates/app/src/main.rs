use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::config::parse_base_url;
use services::{AppServices, Clock, GatewayConfig, TestSetTakingService};
use storage::{SessionStore, SqliteStore};
use testset_core::format_remaining;
use testset_core::model::{SubmissionId, TestSetId};
use tracing_subscriber::EnvFilter;
use ui::{App, LaunchTarget, UiApp, build_app_context};
use url::Url;

const DEFAULT_DB_URL: &str = "sqlite://testset.sqlite3";
const DEFAULT_APP_BASE_URL: &str = "app://localhost/";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingSubmissionId { command: &'static str },
    UnknownArg(String),
    ConflictingTargets,
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidUrl { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingSubmissionId { command } => {
                write!(f, "{command} requires a submission id")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::ConflictingTargets => {
                write!(f, "--test-set and --submission cannot be used together")
            }
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUrl { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

struct DesktopApp {
    services: AppServices,
    launch_target: LaunchTarget,
}

impl UiApp for DesktopApp {
    fn taking(&self) -> Arc<TestSetTakingService> {
        self.services.taking()
    }

    fn launch_target(&self) -> LaunchTarget {
        self.launch_target.clone()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui      [--db <sqlite_url>] [--api <url>] [--test-set <id> | --submission <id>]");
    eprintln!("  cargo run -p app -- inspect <submission_id> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- clear   <submission_id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db  {DEFAULT_DB_URL}");
    eprintln!("  --api http://localhost:5000/api");
    eprintln!();
    eprintln!("Environment (a .env file is read if present):");
    eprintln!("  TESTSET_DB_URL, TESTSET_API_BASE_URL, TESTSET_API_TOKEN,");
    eprintln!("  TESTSET_APP_BASE_URL, TESTSET_HTTP_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Inspect,
    Clear,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "inspect" => Some(Self::Inspect),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::Inspect => "inspect",
            Self::Clear => "clear",
        }
    }
}

#[derive(Debug)]
struct UiArgs {
    db_url: String,
    api_base: Option<Url>,
    launch_target: LaunchTarget,
}

#[derive(Debug)]
struct RecordArgs {
    db_url: String,
    submission_id: SubmissionId,
}

fn default_db_url() -> String {
    std::env::var("TESTSET_DB_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url)
}

fn parse_db_flag(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

impl UiArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut api_base = None;
        let mut test_set: Option<TestSetId> = None;
        let mut submission: Option<SubmissionId> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db_flag(args)?,
                "--api" => {
                    let value = require_value(args, "--api")?;
                    let url = parse_base_url(&value).map_err(|_| ArgsError::InvalidUrl {
                        flag: "--api",
                        raw: value.clone(),
                    })?;
                    api_base = Some(url);
                }
                "--test-set" => {
                    test_set = Some(parse_id("--test-set", require_value(args, "--test-set")?)?);
                }
                "--submission" => {
                    submission = Some(parse_id(
                        "--submission",
                        require_value(args, "--submission")?,
                    )?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let launch_target = match (test_set, submission) {
            (Some(_), Some(_)) => return Err(ArgsError::ConflictingTargets),
            (Some(id), None) => LaunchTarget::StartTestSet(id),
            (None, Some(id)) => LaunchTarget::Resume(id),
            (None, None) => LaunchTarget::Idle,
        };

        Ok(Self {
            db_url,
            api_base,
            launch_target,
        })
    }
}

impl RecordArgs {
    fn parse(command: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut submission_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db_flag(args)?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if submission_id.is_none() => {
                    submission_id = Some(parse_id("submission id", arg)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let submission_id = submission_id.ok_or(ArgsError::MissingSubmissionId {
            command: command.name(),
        })?;
        Ok(Self {
            db_url,
            submission_id,
        })
    }
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

fn app_base_url() -> Result<Url, ArgsError> {
    let raw = std::env::var("TESTSET_APP_BASE_URL").unwrap_or_else(|_| DEFAULT_APP_BASE_URL.into());
    Url::parse(&raw).map_err(|_| ArgsError::InvalidUrl {
        flag: "TESTSET_APP_BASE_URL",
        raw,
    })
}

async fn run_ui(args: UiArgs) -> Result<(), Box<dyn std::error::Error>> {
    prepare_sqlite_file(&args.db_url)?;

    let mut gateway = GatewayConfig::from_env()?;
    if let Some(api_base) = args.api_base {
        gateway.base_url = api_base;
    }
    let services =
        AppServices::new_sqlite(&args.db_url, Clock::default_clock(), gateway, app_base_url()?).await?;

    tracing::info!(launch = ?args.launch_target, "launching desktop window");
    let app = DesktopApp {
        services,
        launch_target: args.launch_target,
    };
    let context = build_app_context(Arc::new(app));

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Assessment")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

async fn open_sessions(db_url: &str) -> Result<SessionStore, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    let store = SqliteStore::open(db_url).await?;
    Ok(SessionStore::new(Arc::new(store)))
}

async fn run_inspect(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = open_sessions(&args.db_url).await?;
    let Some(raw) = sessions.load_raw(&args.submission_id).await? else {
        println!("no cached attempt for {}", args.submission_id);
        return Ok(());
    };

    match SessionStore::decode(&raw) {
        Ok(stored) => {
            let now_ms = Clock::default_clock().now_millis();
            let remaining = stored
                .timing()
                .map(|timing| timing.remaining_seconds(now_ms));
            let submission = stored.submission();
            println!("submission:  {}", stored.id());
            println!("test set:    {}", submission.test_set_id);
            println!("remaining:   {}", format_remaining(remaining));
            println!("quizzes:     {} completed", submission.completed_quiz_ids.len());
            println!("problems:    {} completed", submission.completed_problem_ids.len());
            println!("submitted:   {}", submission.submitted);
        }
        Err(err) => {
            tracing::warn!(submission = %args.submission_id, error = %err, "cached attempt is unreadable");
            println!("unreadable record for {}: {raw}", args.submission_id);
        }
    }
    Ok(())
}

async fn run_clear(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = open_sessions(&args.db_url).await?;
    sessions.clear(&args.submission_id).await?;
    tracing::info!(submission = %args.submission_id, "cached attempt removed");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand launches the UI.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Ui => run_ui(UiArgs::parse(&mut iter).map_err(report)?).await,
        Command::Inspect => run_inspect(RecordArgs::parse(cmd, &mut iter).map_err(report)?).await,
        Command::Clear => run_clear(RecordArgs::parse(cmd, &mut iter).map_err(report)?).await,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

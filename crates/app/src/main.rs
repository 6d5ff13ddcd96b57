mod auth;
mod server;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::OffsetTime;
use turf_config::Config;
use turf_engine::{DirectoryStore, Engine, PaymentSettings, SqliteStore};
use turf_models::{Actor, Role, VenueFilter};
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("TURFBOOK_GIT_HASH");

pub(crate) fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH})")
}

// --- CLI definition ---

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Player,
    Vendor,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Player => Role::Player,
            RoleArg::Vendor => Role::Vendor,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Parser)]
#[command(name = "turfbook")]
#[command(about = "Turf booking marketplace: venues, slot availability and bookings")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TURFBOOK_GIT_HASH"), ")"))]
struct Cli {
    /// Log level (overrides config)
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,

    /// Display log timestamps in UTC (default: local time)
    #[arg(long, global = true)]
    utc: bool,

    /// Database URL (overrides config)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply database migrations and exit
    Migrate,
    /// List active venues
    ListVenues {
        /// Substring of the venue name or description
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// e.g. "Football", "Cricket"
        #[arg(long)]
        game_type: Option<String>,
    },
    /// Show a venue's slots for one day
    Availability {
        #[arg(long)]
        venue: Uuid,
        /// Date as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Platform totals
    Stats,
    /// Give a user a role (the only way to create admins)
    GrantRole {
        /// User id, the `sub` of their access token
        #[arg(long)]
        user: Uuid,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
}

/// Layers CLI arguments over the loaded config.
fn resolve_config(cli: &Cli) -> Config {
    let mut config = Config::load();
    if let Some(level) = &cli.log_level {
        config.log_level = level.to_string();
    }
    if cli.utc {
        config.utc = true;
    }
    if let Some(url) = &cli.db_url {
        config.db_url = url.clone();
    }
    if let Commands::Serve { port: Some(port) } = cli.command {
        config.port = port;
    }
    config
}

/// Refuses to serve with the placeholder token secret; anyone could mint tokens.
fn check_serve_config(config: &Config) -> anyhow::Result<()> {
    if config.uses_default_jwt_secret() {
        anyhow::bail!(
            "no JWT secret configured: set TURFBOOK_JWT_SECRET or jwt_secret in {}",
            Config::file_path().display()
        );
    }
    Ok(())
}

// --- Logging ---

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.utc {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(OffsetTime::new(
                time::UtcOffset::UTC,
                time::macros::format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                ),
            ))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(LocalTimer)
            .init();
    }
}

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

// --- Main ---

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli);
    init_logging(&config);

    if matches!(cli.command, Commands::Serve { .. }) {
        check_serve_config(&config)?;
    }

    let pool = turf_db::connect(&config.db_url).await?;
    turf_db::migrate(&pool).await?;

    let payments = PaymentSettings {
        payee_vpa: config.payee_vpa.clone(),
        payee_name: config.payee_name.clone(),
        currency: config.currency.clone(),
    };
    let engine = Engine::new(Arc::new(SqliteStore::new(pool)), payments);

    match cli.command {
        Commands::Serve { .. } => {
            server::run(&config, engine).await?;
        }
        Commands::Migrate => {
            info!("Database {} is up to date", config.db_url);
        }
        Commands::ListVenues { search, city, game_type } => {
            let filter = VenueFilter {
                active: None,
                search,
                city,
                game_type,
            };
            let venues = engine.list_venues(&Actor::Anonymous, &filter).await?;
            if venues.is_empty() {
                println!("No venues found.");
            } else {
                println!(
                    "{:<36} {:<24} {:<12} {:<12} {:>9} {:>6}",
                    "ID", "Name", "City", "Game", "Price/hr", "Rating"
                );
                println!("{}", "-".repeat(105));
                for v in &venues {
                    println!(
                        "{:<36} {:<24} {:<12} {:<12} {:>9.2} {:>6.1}",
                        v.id, v.name, v.city, v.game_type, v.price_per_hour, v.rating
                    );
                }
                println!("\n{} venue(s) total", venues.len());
            }
        }
        Commands::Availability { venue, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let slots = engine.availability(&Actor::Anonymous, venue, date).await?;
            if slots.is_empty() {
                println!("Venue {venue} has no slots.");
            } else {
                println!("Slots on {date}:");
                for s in &slots {
                    let state = if s.bookable { "available" } else { "booked" };
                    println!("  {}-{}  {state}", s.start_time.format("%H:%M"), s.end_time.format("%H:%M"));
                }
                let open = slots.iter().filter(|s| s.bookable).count();
                println!("\n{open} of {} slot(s) available", slots.len());
            }
        }
        Commands::Stats => {
            let stats = engine.store().platform_stats().await?;
            println!("Users:     {}", stats.total_users);
            println!("Vendors:   {}", stats.total_vendors);
            println!("Turfs:     {}", stats.total_turfs);
            println!("Bookings:  {}", stats.total_bookings);
            println!("Revenue:   {:.2} {}", stats.total_revenue, config.currency);
        }
        Commands::GrantRole { user, role } => {
            let actor = engine.grant_role(user, role.into()).await?;
            println!("{user} now resolves to {:?}", engine.home(&actor));
        }
    }

    Ok(())
}

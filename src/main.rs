use std::{error::Error, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use log::warn;
use serde::Serialize;
use serde_json::{Value, json};

use pitwall::{
    AnalyticsConfig, AnalyticsSettings, CachedSessionProvider, FileSessionProvider,
    PitwallError, SessionAnalytics, SessionType,
    session::lap_table::QuickLapReference,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding exported sessions, overrides the config file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SessionArgs {
    #[arg(short, long)]
    year: u16,
    #[arg(short, long)]
    round: u8,
    /// FP1, FP2, FP3, Q, SQ, S or R
    #[arg(short, long)]
    session: SessionType,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classified results of a session
    Results {
        #[command(flatten)]
        session: SessionArgs,
        /// Compare practice laps against the session best instead of each driver's best
        #[arg(long)]
        session_best: bool,
    },
    /// Telemetry of a driver's fastest lap
    Telemetry {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(short, long)]
        driver: String,
        #[arg(long)]
        stride: Option<usize>,
    },
    /// Track outline from a driver's fastest lap
    Map {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(short, long)]
        driver: String,
        #[arg(long)]
        stride: Option<usize>,
    },
    /// Corners detected on a driver's fastest lap
    Corners {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(short, long)]
        driver: String,
    },
    /// Tyre stints of a driver
    Strategy {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(short, long)]
        driver: String,
    },
    /// Time delta of driver2 against driver1 over their fastest laps
    Delta {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        driver1: String,
        #[arg(long)]
        driver2: String,
    },
}

fn to_json<T: Serialize>(value: T) -> Result<Value, PitwallError> {
    serde_json::to_value(value).map_err(|e| PitwallError::OutputSerializeError { source: e })
}

fn run(args: &Cli, config: &AnalyticsConfig) -> Result<Value, PitwallError> {
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => config.resolved_data_dir()?,
    };
    let provider = CachedSessionProvider::new(FileSessionProvider::new(data_dir));
    let mut settings = AnalyticsSettings::from(config);

    match &args.command {
        Commands::Results {
            session,
            session_best,
        } => {
            if *session_best {
                settings = settings.with_quick_lap_reference(QuickLapReference::SessionBest);
            }
            let analytics = SessionAnalytics::new(provider, settings);
            let results =
                analytics.session_results(session.year, session.round, session.session)?;
            Ok(json!({
                "round": session.round,
                "session": session.session,
                "results": to_json(results)?,
            }))
        }
        Commands::Telemetry {
            session,
            driver,
            stride,
        } => {
            settings.telemetry_stride = stride.unwrap_or(settings.telemetry_stride);
            let analytics = SessionAnalytics::new(provider, settings);
            let telemetry =
                analytics.telemetry(session.year, session.round, session.session, driver)?;
            Ok(json!({
                "driver": driver,
                "lap_number": telemetry.lap_number,
                "telemetry": to_json(telemetry.samples)?,
            }))
        }
        Commands::Map {
            session,
            driver,
            stride,
        } => {
            settings.map_stride = stride.unwrap_or(settings.map_stride);
            let analytics = SessionAnalytics::new(provider, settings);
            let track_data =
                analytics.track_map(session.year, session.round, session.session, driver)?;
            Ok(json!({ "driver": driver, "track_data": to_json(track_data)? }))
        }
        Commands::Corners { session, driver } => {
            let analytics = SessionAnalytics::new(provider, settings);
            let corners =
                analytics.corners(session.year, session.round, session.session, driver)?;
            Ok(json!({ "driver": driver, "corners": to_json(corners)? }))
        }
        Commands::Strategy { session, driver } => {
            let analytics = SessionAnalytics::new(provider, settings);
            let stints =
                analytics.strategy(session.year, session.round, session.session, driver)?;
            Ok(json!({ "driver": driver, "strategy": to_json(stints)? }))
        }
        Commands::Delta {
            session,
            driver1,
            driver2,
        } => {
            let analytics = SessionAnalytics::new(provider, settings);
            let delta_data = analytics.delta(
                session.year,
                session.round,
                session.session,
                driver1,
                driver2,
            )?;
            Ok(json!({
                "driver1": driver1,
                "driver2": driver2,
                "delta_data": to_json(delta_data)?,
            }))
        }
    }
}

/// Error message including its causes, for display only
fn describe(error: &PitwallError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    message
}

fn main() {
    colog::init();

    let args = Cli::parse();
    let config = AnalyticsConfig::from_local_file()
        .unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", describe(&e));
            None
        })
        .unwrap_or_default();

    match run(&args, &config) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                println!("{}", json!({ "error": e.to_string() }));
                std::process::exit(1);
            }
        },
        Err(e) => {
            println!("{}", json!({ "error": describe(&e) }));
            std::process::exit(1);
        }
    }
}

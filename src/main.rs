mod api;
mod cache;
mod clipboard;
mod config;
mod controller;
mod events;
mod export;
mod filters;
mod model;
mod render;
mod session;
mod status;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{ApiClient, DEFAULT_API_URL};
use crate::config::DashboardConfig;
use crate::controller::Dashboard;
use crate::filters::{read_and_validate, FilterInputs};
use crate::model::{DateRange, MapSelection, SsidFilter};
use crate::render::{TextChart, TextMap};
use crate::session::Session;

#[derive(Parser)]
#[command(name = "wifi-coverage-dashboard")]
#[command(about = "WiFi coverage dashboard for the patio and tmut facility maps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Base URL of the aggregation API
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Facility map (patio or tmut)
    #[arg(short, long, default_value = "patio")]
    map: MapSelection,

    /// Network category: all, main_network, disconnected, other_networks
    #[arg(long, default_value = "main_network")]
    ssid: SsidFilter,

    /// First day of the range (YYYY-MM-DD); defaults to yesterday
    #[arg(long)]
    start: Option<chrono::NaiveDate>,

    /// Last day of the range (YYYY-MM-DD); defaults to yesterday
    #[arg(long)]
    end: Option<chrono::NaiveDate>,

    /// Show every available day instead of a range
    #[arg(long, conflicts_with_all = ["start", "end"])]
    all_dates: bool,

    /// Only measurements from this tablet
    #[arg(short, long)]
    tablet: Option<String>,

    /// Directory for exported spreadsheets
    #[arg(long, default_value = "exports")]
    export_dir: PathBuf,
}

impl FilterArgs {
    fn into_config(self) -> DashboardConfig {
        let dates = if self.all_dates {
            Some(DateRange::default())
        } else if self.start.is_some() || self.end.is_some() {
            Some(DateRange::new(self.start, self.end))
        } else {
            None
        };

        DashboardConfig {
            api_url: self.api_url,
            export_dir: self.export_dir,
            map: self.map,
            ssid: self.ssid,
            dates,
            device_id: self.tablet,
            ..DashboardConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard with auto-refresh
    Watch {
        #[command(flatten)]
        filters: FilterArgs,

        /// Seconds between automatic refreshes
        #[arg(short, long, default_value = "60")]
        refresh_secs: u64,

        /// Path to store log files
        #[arg(short, long, default_value = "logs")]
        log_dir: PathBuf,
    },
    /// Load the dashboard once and print it
    Snapshot {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Download the Excel export for the given filters
    Export {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            filters,
            refresh_secs,
            log_dir,
        } => {
            // Set up logging; stdout belongs to the dashboard
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, &log_dir, "wifi-dashboard.log");
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();

            let mut config = filters.into_config();
            config.refresh_interval = Duration::from_secs(refresh_secs.max(1));

            info!("Starting WiFi coverage dashboard");
            info!("API: {}", config.api_url);
            info!("Auto-refresh interval: {}s", config.refresh_interval.as_secs());

            let api = Arc::new(ApiClient::new(&config.api_url));
            let dashboard = Dashboard::new(
                api,
                TextMap::new(std::io::stdout()),
                TextChart::new(std::io::stdout()),
                &config,
            );

            println!("{}", events::HELP);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut session = Session::new(dashboard, config.refresh_interval);
            session.run(stdin).await
        }
        Commands::Snapshot { filters } => {
            init_stderr_logging();

            let config = filters.into_config();
            let api = Arc::new(ApiClient::new(&config.api_url));
            let mut dashboard = Dashboard::new(
                api,
                TextMap::new(std::io::stdout()),
                TextChart::new(std::io::stdout()),
                &config,
            );

            dashboard.reconcile(false).await;
            print!("{}", dashboard.status().render());
            if !dashboard.cache().is_populated() {
                anyhow::bail!("{}", dashboard.status().date_info);
            }
            Ok(())
        }
        Commands::Export { filters } => {
            init_stderr_logging();

            let config = filters.into_config();
            let mut inputs = FilterInputs {
                dates: config.dates.unwrap_or_else(DateRange::yesterday),
                ssid: config.ssid,
                device_id: config.device_id.clone().unwrap_or_default(),
                map: config.map,
                dates_invalid: false,
            };
            let mut last_valid = DateRange::default();
            let validated = read_and_validate(&mut inputs, &mut last_valid)?;

            let api = ApiClient::new(&config.api_url);
            match export::export_spreadsheet(&api, &validated, &config.export_dir).await {
                Ok(path) => {
                    println!("Exported spreadsheet to {:?}", path);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{}", e.alert_message());
                    Err(e.into())
                }
            }
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

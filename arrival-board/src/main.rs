use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use arrival_board::aggregator::{Aggregator, AggregatorConfig, ArrivalSource, SourceError};
use arrival_board::builder::{BuilderConfig, CrosswalkBuilder, load_overrides};
use arrival_board::cache::{CacheConfig, CachedArrivalSource};
use arrival_board::config::Settings;
use arrival_board::crosswalk::{CrosswalkFile, SharedCrosswalk};
use arrival_board::domain::{BoardEntry, ExternalId, StationId, TimeWindow};
use arrival_board::here::{HereClient, MockArrivalSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often `watch` refreshes the board.
const WATCH_INTERVAL: Duration = Duration::from_secs(30);

const USAGE: &str = "usage:
  arrival-board board <station-id> [min-minutes] [max-minutes]
  arrival-board watch <station-id> [min-minutes] [max-minutes]
  arrival-board lines <station-id>
  arrival-board stations [query]
  arrival-board build <catalog.json> <overrides.json> <out-crosswalk.json> <out-audit.json>";

/// Live HERE boards or recorded ones.
enum Source {
    Here(HereClient),
    Mock(MockArrivalSource),
}

impl ArrivalSource for Source {
    async fn fetch_board(&self, external_id: &ExternalId) -> Result<Vec<BoardEntry>, SourceError> {
        match self {
            Source::Here(client) => client.fetch_board(external_id).await,
            Source::Mock(mock) => mock.fetch_board(external_id).await,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env()?;
    let command = args.first().map(String::as_str);

    match command {
        Some("board") | Some("watch") => {
            let id = station_arg(args)?;
            let aggregator = aggregator(&settings)?;
            let window = window_args(args, aggregator.config())?;

            if command == Some("watch") {
                spawn_reload(&settings, aggregator.crosswalk().clone());
                let mut interval = tokio::time::interval(WATCH_INTERVAL);
                loop {
                    interval.tick().await;
                    print_board(&aggregator, &id, window).await;
                }
            }

            let result = aggregator.get_arrivals(&id, window).await?;
            let lines = aggregator.lines_for_display(&id, &result).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            println!("lines: {}", join_lines(&lines));
            Ok(())
        }
        Some("lines") => {
            let id = station_arg(args)?;
            let crosswalk = SharedCrosswalk::load(&settings.crosswalk_path)?;
            let lines = crosswalk.snapshot().await.static_lines(&id)?;
            println!("{}", join_lines(&lines));
            Ok(())
        }
        Some("stations") => {
            let crosswalk = SharedCrosswalk::load(&settings.crosswalk_path)?;
            let store = crosswalk.snapshot().await;
            let rows = match args.get(1) {
                Some(query) => store.search(query, 20),
                None => store.list(),
            };
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
        Some("build") => {
            let [catalog, overrides, out, audit] = match &args[1..] {
                [a, b, c, d] => [a, b, c, d],
                _ => return Err(USAGE.into()),
            };
            let client = HereClient::new(settings.here_config()?)?;
            let builder = CrosswalkBuilder::new(client, BuilderConfig::default())?;

            let catalog = CrosswalkFile::load(catalog)?;
            let overrides = load_overrides(overrides)?;
            let (file, report) = builder.build_file(catalog, &overrides).await?;

            file.save(out)?;
            report.save(audit)?;
            info!(
                crosswalk = %out,
                audit = %audit,
                review = report.review.len(),
                "Wrote crosswalk"
            );
            Ok(())
        }
        _ => Err(USAGE.into()),
    }
}

fn aggregator(
    settings: &Settings,
) -> Result<Aggregator<CachedArrivalSource<Source>>, Box<dyn Error>> {
    let crosswalk = SharedCrosswalk::load(&settings.crosswalk_path)?;

    let source = match &settings.mock_boards_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using mock boards");
            let mut mock = MockArrivalSource::new(dir)?;
            if let Some(now) = settings.mock_reference_time {
                mock = mock.with_reference_time(now);
            }
            Source::Mock(mock)
        }
        None => Source::Here(HereClient::new(settings.here_config()?)?),
    };
    let source = CachedArrivalSource::new(source, &CacheConfig::default());

    Ok(Aggregator::new(source, crosswalk, settings.aggregator_config()))
}

/// Reload the crosswalk in the background so edits to the file are
/// picked up without a restart.
fn spawn_reload(settings: &Settings, crosswalk: SharedCrosswalk) {
    let Some(period) = settings.reload_interval else {
        return;
    };
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match crosswalk.reload().await {
                Ok(count) => info!(stations = count, "Reloaded crosswalk"),
                Err(e) => warn!(error = %e, "Failed to reload crosswalk, keeping previous"),
            }
        }
    });
}

async fn print_board(
    aggregator: &Aggregator<CachedArrivalSource<Source>>,
    id: &StationId,
    window: TimeWindow,
) {
    match aggregator.get_arrivals(id, window).await {
        Ok(result) => {
            for record in &result.records {
                println!(
                    "{:>4}  {:<30} {:>3} min",
                    record.line.as_str(),
                    record.destination,
                    record.minutes_until_arrival
                );
            }
            if result.records.is_empty() {
                println!(
                    "(no arrivals between {} and {} min)",
                    window.min_minutes, window.max_minutes
                );
            }
            println!();
        }
        Err(e) => warn!(station = %id, error = %e, "Board refresh failed"),
    }
}

fn station_arg(args: &[String]) -> Result<StationId, Box<dyn Error>> {
    let raw = args.get(1).ok_or(USAGE)?;
    Ok(StationId::parse(raw)?)
}

fn window_args(args: &[String], config: &AggregatorConfig) -> Result<TimeWindow, Box<dyn Error>> {
    let min = args.get(2).map(|v| v.parse::<u32>()).transpose()?;
    let max = args.get(3).map(|v| v.parse::<u32>()).transpose()?;
    Ok(config.window(min, max))
}

fn join_lines(lines: &arrival_board::domain::LineSet) -> String {
    lines
        .display_order()
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

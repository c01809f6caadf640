use std::path::Path;
use std::sync::Arc;

use covid_tracker::database::MemoryDatasource;
use covid_tracker::repository::Repository;
use covid_tracker::screen::{WorldRender, WorldScreen};
use covid_tracker::state::ScreenState;
use covid_tracker::wire::CovidTrackerDto;
use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::sync::mpsc;

mod config;
mod error;
mod logger;

use error::{ApplicationError, IngestSnafu, ParseSnapshotSnafu, ReadSnapshotSnafu};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config)?;
    logger::install_panic_hook();

    let snapshot = read_snapshot(&config.snapshot).await?;
    let repository = Arc::new(Repository::new(MemoryDatasource::new()));
    let tracker = repository.ingest(snapshot).await.context(IngestSnafu)?;
    tracing::info!(
        date = tracker.date(),
        countries = tracker.countries_stats.len(),
        "loaded the snapshot `{}`",
        config.snapshot.display()
    );

    let (tx, mut states) = mpsc::unbounded_channel();
    let screen = WorldScreen::new(repository, config.top_places, move |state| {
        let _ = tx.send(state);
    });
    screen.all_stats().await;

    let mut pending = WorldScreen::<MemoryDatasource>::VIEW_COUNT;
    while pending > 0 {
        let Some(state) = states.recv().await else {
            break;
        };

        if state.is_terminal() {
            pending -= 1;
        }
        log_state(&state);
    }

    screen.close().await;
    Ok(())
}

async fn read_snapshot(path: &Path) -> Result<CovidTrackerDto, ApplicationError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .context(ReadSnapshotSnafu { path })?;

    serde_json::from_str(&content).context(ParseSnapshotSnafu { path })
}

fn log_state(state: &ScreenState<WorldRender>) {
    match state {
        ScreenState::Loading => tracing::debug!("loading"),
        ScreenState::Error(error) if error.is_empty_data() => tracing::info!("view has no data"),
        ScreenState::Error(error) => tracing::warn!(error = %error, "view failed"),
        ScreenState::Render(WorldRender::CovidTracker(tracker)) => tracing::info!(
            date = tracker.date(),
            confirmed = tracker.world_stats.stats.confirmed,
            deaths = tracker.world_stats.stats.deaths,
            "world list"
        ),
        ScreenState::Render(WorldRender::CountriesStatsPieChart(shares)) => {
            for share in shares {
                tracing::info!(
                    country = %share.place.name,
                    share = share.share,
                    "pie chart slice"
                );
            }
        }
        ScreenState::Render(WorldRender::WorldStatsBarChart(series)) => {
            tracing::info!(dates = series.len(), "world bar chart")
        }
        ScreenState::Render(WorldRender::CountriesStatsBarChart(countries)) => {
            tracing::info!(countries = countries.len(), "countries bar chart")
        }
        ScreenState::Render(WorldRender::CountriesStatsLineChart { metric, countries }) => {
            let names: Vec<&str> = countries.iter().map(|c| c.country.name.as_str()).collect();
            tracing::info!(metric = %metric, countries = ?names, "countries line chart")
        }
    }
}

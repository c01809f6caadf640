use std::sync::Arc;
use std::time::Duration;

use covid_tracker::database::MemoryDatasource;
use covid_tracker::model::{Metric, PlaceSeries};
use covid_tracker::pipeline::DomainError;
use covid_tracker::repository::Repository;
use covid_tracker::screen::{PlaceRender, PlaceScreen, WorldRender, WorldScreen};
use covid_tracker::state::{observe, ScreenState};
use covid_tracker::wire::CovidTrackerDto;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

const SNAPSHOT: &str = include_str!("data/snapshot.json");

fn fixture() -> CovidTrackerDto {
    serde_json::from_str(SNAPSHOT).unwrap()
}

async fn repository() -> Arc<Repository<MemoryDatasource>> {
    let repository = Repository::new(MemoryDatasource::new());
    repository.ingest(fixture()).await.unwrap();
    Arc::new(repository)
}

fn recorder<R: Send + 'static>() -> (
    impl Fn(ScreenState<R>) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<ScreenState<R>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let deliver = move |state: ScreenState<R>| {
        let _ = tx.send(state);
    };
    (deliver, rx)
}

async fn receive<R>(
    rx: &mut mpsc::UnboundedReceiver<ScreenState<R>>, count: usize,
) -> Vec<ScreenState<R>> {
    let mut states = Vec::with_capacity(count);
    for _ in 0..count {
        let state = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a screen state")
            .expect("screen stopped delivering");
        states.push(state);
    }
    states
}

fn renders<R>(states: Vec<ScreenState<R>>) -> Vec<R> {
    states
        .into_iter()
        .filter_map(|state| match state {
            ScreenState::Render(render) => Some(render),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn wire_snapshot_renders_after_loading() {
    let metrics = |confirmed: u64, deaths: u64| {
        json!({
            "today_confirmed": confirmed,
            "today_deaths": deaths,
            "today_new_confirmed": 0,
            "today_new_deaths": 0,
            "today_new_open_cases": 0,
            "today_new_recovered": 0,
            "today_open_cases": 0,
            "today_recovered": 0,
            "today_vs_yesterday_confirmed": 0.0,
            "today_vs_yesterday_deaths": 0.0,
            "today_vs_yesterday_open_cases": 0.0,
            "today_vs_yesterday_recovered": 0.0
        })
    };
    let mut spain = metrics(200_000, 20_000);
    spain["id"] = json!("ES");
    spain["name"] = json!("Spain");
    spain["name_es"] = json!("España");

    let dto: CovidTrackerDto = serde_json::from_value(json!({
        "updated_at": "2020-04-22 08:00 UTC",
        "dates": { "2020-04-21": { "countries": { "Spain": spain } } },
        "total": metrics(2_500_000, 170_000),
    }))
    .unwrap();

    let repository = Repository::new(MemoryDatasource::new());
    repository.ingest(dto).await.unwrap();

    let states: Vec<_> = observe(repository.covid_tracker_by_date("2020-04-21"), |t| t)
        .take(2)
        .collect()
        .await;

    assert_eq!(states[0], ScreenState::Loading);
    let ScreenState::Render(tracker) = &states[1] else {
        panic!("expected a render, got {:?}", states[1]);
    };
    assert_eq!(tracker.world_stats.date, "2020-04-21");
    assert_eq!(tracker.countries_stats.len(), 1);
    assert_eq!(tracker.countries_stats[0].country.id, "ES");
    assert_eq!(tracker.countries_stats[0].stats.confirmed, 200_000);
    assert_eq!(tracker.countries_stats[0].stats.source, "");
}

#[tokio::test]
async fn missing_date_renders_empty_data_error() {
    let repository = repository().await;

    let states: Vec<_> = observe(repository.covid_tracker_by_date("2020-05-01"), |t| t)
        .take(2)
        .collect()
        .await;

    assert_eq!(
        states,
        vec![
            ScreenState::Loading,
            ScreenState::Error(DomainError::DatabaseEmptyData)
        ]
    );
}

#[tokio::test]
async fn world_screen_renders_every_view_independently() {
    let repository = repository().await;
    let (deliver, mut rx) = recorder::<WorldRender>();
    let screen = WorldScreen::new(repository, 5, deliver);

    screen.all_stats().await;
    let states = receive(&mut rx, 2 * WorldScreen::<MemoryDatasource>::VIEW_COUNT).await;

    let loading = states.iter().filter(|state| !state.is_terminal()).count();
    assert_eq!(loading, WorldScreen::<MemoryDatasource>::VIEW_COUNT);

    let renders = renders(states);
    assert_eq!(renders.len(), WorldScreen::<MemoryDatasource>::VIEW_COUNT);

    let mut line_metrics = Vec::new();
    for render in renders {
        match render {
            WorldRender::CovidTracker(tracker) => assert_eq!(tracker.date(), "2020-04-21"),
            WorldRender::CountriesStatsPieChart(shares) => {
                assert_eq!(shares[0].place.id, "spain");
                assert!(shares[0].share > 0.0 && shares[0].share < 1.0);
            }
            WorldRender::WorldStatsBarChart(world) => assert_eq!(world.len(), 1),
            WorldRender::CountriesStatsBarChart(countries) => {
                let ids: Vec<&str> = countries.iter().map(|c| c.country.id.as_str()).collect();
                assert_eq!(ids, vec!["spain", "italy"]);
            }
            WorldRender::CountriesStatsLineChart { metric, countries } => {
                assert_eq!(countries.len(), 2);
                line_metrics.push(metric);
            }
        }
    }

    line_metrics.sort_by_key(|metric| metric.to_string());
    let mut expected = Metric::ALL.to_vec();
    expected.sort_by_key(|metric| metric.to_string());
    assert_eq!(line_metrics, expected);

    screen.close().await;
}

#[tokio::test]
async fn live_views_render_again_after_new_snapshot() {
    let repository = repository().await;
    let (deliver, mut rx) = recorder::<WorldRender>();
    let screen = WorldScreen::new(repository.clone(), 5, deliver);

    screen.list_stats().await;
    let first = renders(receive(&mut rx, 2).await);
    assert!(matches!(
        &first[..],
        [WorldRender::CovidTracker(tracker)] if tracker.date() == "2020-04-21"
    ));

    let next_day = SNAPSHOT.replace("2020-04-21", "2020-04-22");
    let next_day: CovidTrackerDto = serde_json::from_str(&next_day).unwrap();
    repository.ingest(next_day).await.unwrap();

    let second = renders(receive(&mut rx, 1).await);
    assert!(matches!(
        &second[..],
        [WorldRender::CovidTracker(tracker)] if tracker.date() == "2020-04-22"
    ));

    screen.close().await;
}

#[tokio::test]
async fn place_screen_follows_the_selected_place() {
    let repository = repository().await;
    let (deliver, mut rx) = recorder::<PlaceRender>();
    let screen = PlaceScreen::new(repository, 5, deliver);

    screen.countries().await;
    screen.regions("spain").await;
    screen.place_stats("spain", None).await;

    let mut seen = 0;
    for render in renders(receive(&mut rx, 8).await) {
        match render {
            PlaceRender::Countries(countries) => {
                let names: Vec<&str> = countries.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["Italy", "Spain"]);
            }
            PlaceRender::Regions(regions) => {
                let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
                assert_eq!(names, vec!["Andalucía", "Madrid"]);
            }
            PlaceRender::CountryStats(spain) => {
                assert_eq!(spain.latest_metric(Metric::Deaths), 20_000);
            }
            PlaceRender::RegionsStats(regions) => {
                let ids: Vec<&str> = regions.iter().map(|r| r.region.id.as_str()).collect();
                assert_eq!(ids, vec!["madrid", "andalucia"]);
            }
            other => panic!("unexpected render {other:?}"),
        }
        seen += 1;
    }
    assert_eq!(seen, 4);

    screen.line_chart_stats("spain", Some("andalucia")).await;
    for render in renders(receive(&mut rx, 8).await) {
        let PlaceRender::SubRegionsStatsLineChart { sub_regions, .. } = render else {
            panic!("expected a sub-region line chart");
        };
        assert_eq!(sub_regions[0].sub_region.id, "sevilla");
    }

    screen.close().await;
}

#[tokio::test]
async fn place_charts_split_the_parent_total() {
    let repository = repository().await;
    let (deliver, mut rx) = recorder::<PlaceRender>();
    let screen = PlaceScreen::new(repository, 5, deliver);

    screen.pie_chart_stats("spain", None).await;
    screen.bar_chart_stats("spain", None).await;

    let mut seen = 0;
    for render in renders(receive(&mut rx, 8).await) {
        match render {
            PlaceRender::PlaceTotalStatsPieChart(total) => assert_eq!(total.confirmed, 200_000),
            PlaceRender::RegionsStatsPieChart(shares) => {
                let shares: Vec<(&str, f64)> = shares
                    .iter()
                    .map(|share| (share.place.id.as_str(), share.share))
                    .collect();
                assert_eq!(shares, vec![("madrid", 0.275), ("andalucia", 0.055)]);
            }
            PlaceRender::CountryStatsBarChart(spain) => {
                assert_eq!(spain.country.id, "spain");
                assert_eq!(spain.stats.len(), 1);
            }
            PlaceRender::RegionsStatsBarChart(regions) => {
                let ids: Vec<&str> = regions.iter().map(|r| r.region.id.as_str()).collect();
                assert_eq!(ids, vec!["madrid", "andalucia"]);
            }
            other => panic!("unexpected render {other:?}"),
        }
        seen += 1;
    }
    assert_eq!(seen, 4);

    screen.pie_chart_stats("spain", Some("andalucia")).await;
    for render in renders(receive(&mut rx, 4).await) {
        match render {
            PlaceRender::PlaceTotalStatsPieChart(total) => assert_eq!(total.confirmed, 11_000),
            PlaceRender::SubRegionsStatsPieChart(shares) => {
                assert_eq!(shares.len(), 1);
                assert_eq!(shares[0].place.id, "sevilla");
                assert_eq!(shares[0].share, 2_000.0 / 11_000.0);
            }
            other => panic!("unexpected render {other:?}"),
        }
    }

    screen.close().await;
}

#[tokio::test]
async fn country_without_regions_reports_empty_data() {
    let repository = repository().await;
    let (deliver, mut rx) = recorder::<PlaceRender>();
    let screen = PlaceScreen::new(repository, 5, deliver);

    screen.regions("italy").await;

    assert_eq!(
        receive(&mut rx, 2).await,
        vec![
            ScreenState::Loading,
            ScreenState::Error(DomainError::DatabaseEmptyData)
        ]
    );

    screen.close().await;
}

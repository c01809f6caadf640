//! Query operations offered to screens.
//!
//! Each operation reads rows from the [Datasource], maps them into the domain, groups and
//! orders them, and hands the result through the pipeline. What an operation considers
//! "no data" is decided by its validator.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use snafu::{ensure, OptionExt as _, ResultExt as _, Snafu};
use tracing::instrument;

use crate::aggregate;
use crate::database::{
    CountryAndStats, CountryEntity, Datasource, DatasourceError, RegionAndStats, RegionEntity,
    RowStream, Rows, SubRegionAndStats, WorldAndCountriesStats, WorldStatsEntity,
};
use crate::model::{
    is_canonical_date, most_by_latest, order_by_latest, Country, CountryOneDayStats,
    CountryWithStats, CovidTracker, Metric, PlaceSeries, PlaceShare, Region, RegionOneDayStats,
    RegionWithStats, Stats, SubRegion, SubRegionWithStats, WorldStats,
};
use crate::pipeline::{non_empty, wrap, DomainError, QueryStream};
use crate::state::{with_loading, StateStream};
use crate::wire::CovidTrackerDto;

#[derive(Debug, Snafu)]
pub enum QueryError {
    #[snafu(transparent)]
    Datasource { source: DatasourceError },

    #[snafu(display("`{date}` is not a date of the form YYYY-MM-DD"))]
    InvalidDate { date: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestError {
    #[snafu(display("the snapshot carries no date"))]
    NoDates,

    #[snafu(display("the snapshot date `{date}` is not of the form YYYY-MM-DD"))]
    InvalidSnapshotDate { date: String },

    #[snafu(display("failed to store the snapshot of {date}"))]
    Store {
        date: String,
        source: DatasourceError,
    },
}

type Source<T> = BoxStream<'static, Result<T, QueryError>>;

fn lift<T: Send + 'static>(rows: RowStream<T>) -> Source<T> {
    rows.map_err(QueryError::from).boxed()
}

fn rejected<T: Send + 'static>(date: &str) -> Source<T> {
    tracing::warn!("rejecting a query for the malformed date `{}`", date);
    stream::once(future::ready(InvalidDateSnafu { date }.fail())).boxed()
}

/// Unwrap single-place results, treating a missing place as empty data.
fn single<T: Send + 'static>(results: QueryStream<Option<T>>) -> QueryStream<T> {
    results
        .map(|result| result.and_then(|value| value.ok_or(DomainError::DatabaseEmptyData)))
        .boxed()
}

fn first<T>(values: Vec<T>) -> (bool, Option<T>) {
    let first = values.into_iter().next();
    (first.is_some(), first)
}

fn snapshot(rows: WorldAndCountriesStats) -> (bool, CovidTracker) {
    let tracker = rows.into_domain();
    (!tracker.countries_stats.is_empty(), tracker)
}

fn last_country(rows: WorldAndCountriesStats, id_country: &str) -> Option<CountryOneDayStats> {
    rows.into_domain()
        .countries_stats
        .into_iter()
        .find(|country| country.country.id == id_country)
}

fn last_region(
    rows: WorldAndCountriesStats, id_country: &str, id_region: &str,
) -> Option<RegionOneDayStats> {
    last_country(rows, id_country)?
        .regions_stats
        .into_iter()
        .find(|region| region.region.id == id_region)
}

/// Group rows into series, order them by `metric` and keep at most `limit` of them.
fn ranked<T>(
    rows: impl IntoIterator<Item = (T::Place, Stats)>, metric: Metric, limit: Option<usize>,
) -> (bool, Vec<T>)
where
    T: PlaceSeries + From<(<T as PlaceSeries>::Place, Vec<Stats>)>,
{
    let places = aggregate::series::<T>(rows);
    let places = match limit {
        Some(limit) => most_by_latest(places, metric, limit),
        None => {
            let mut places = places;
            order_by_latest(&mut places, metric);
            places
        }
    };

    non_empty(places)
}

#[derive(Debug, Clone)]
pub struct Repository<D> {
    datasource: D,
}

impl<D: Datasource> Repository<D> {
    pub fn new(datasource: D) -> Self {
        Self { datasource }
    }

    pub fn datasource(&self) -> &D {
        &self.datasource
    }

    /// Map a wire snapshot into the domain and store it.
    #[instrument(skip_all)]
    pub async fn ingest(&self, dto: CovidTrackerDto) -> Result<CovidTracker, IngestError> {
        let tracker = dto.into_domain().context(NoDatesSnafu)?;
        let date = tracker.date().to_string();
        ensure!(is_canonical_date(&date), InvalidSnapshotDateSnafu { date });

        let rows = Rows::from_domain(&tracker);
        self.datasource
            .insert(rows)
            .await
            .context(StoreSnafu { date: &date })?;

        tracing::info!(
            date = %date,
            countries = tracker.countries_stats.len(),
            "ingested the snapshot of {}",
            date
        );
        Ok(tracker)
    }

    #[instrument(skip(self))]
    pub fn covid_tracker_by_date(&self, date: &str) -> StateStream<CovidTracker> {
        let source = if is_canonical_date(date) {
            lift(self.datasource.world_and_countries_by_date(date))
        } else {
            rejected(date)
        };

        with_loading(wrap(source, snapshot))
    }

    #[instrument(skip(self))]
    pub fn covid_tracker_last(&self) -> StateStream<CovidTracker> {
        let source = lift(self.datasource.world_and_countries_last());
        with_loading(wrap(source, snapshot))
    }

    /// World totals of every stored date, oldest first.
    #[instrument(skip(self))]
    pub fn world_all_stats(&self) -> StateStream<Vec<WorldStats>> {
        let source = lift(self.datasource.world_all_stats()).map_ok(Some);

        with_loading(wrap(source, |rows: Vec<WorldStatsEntity>| {
            non_empty(rows.into_iter().map(WorldStatsEntity::into_domain).collect())
        }))
    }

    #[instrument(skip(self))]
    pub fn countries_stats_ordered_by(&self, metric: Metric) -> StateStream<Vec<CountryWithStats>> {
        self.countries_ranked(metric, None)
    }

    #[instrument(skip(self))]
    pub fn countries_with_most(
        &self, metric: Metric, limit: usize,
    ) -> StateStream<Vec<CountryWithStats>> {
        self.countries_ranked(metric, Some(limit))
    }

    fn countries_ranked(
        &self, metric: Metric, limit: Option<usize>,
    ) -> StateStream<Vec<CountryWithStats>> {
        let source = lift(self.datasource.countries_and_stats()).map_ok(Some);

        with_loading(wrap(source, move |rows: Vec<CountryAndStats>| {
            let rows = rows.into_iter().map(CountryAndStats::into_domain);
            ranked::<CountryWithStats>(rows, metric, limit)
        }))
    }

    #[instrument(skip(self))]
    pub fn country_all_stats(&self, id_country: &str) -> StateStream<CountryWithStats> {
        let source = lift(self.datasource.country_and_stats(id_country)).map_ok(Some);

        with_loading(single(wrap(source, |rows: Vec<CountryAndStats>| {
            first(aggregate::series::<CountryWithStats>(
                rows.into_iter().map(CountryAndStats::into_domain),
            ))
        })))
    }

    #[instrument(skip(self))]
    pub fn region_all_stats(
        &self, id_country: &str, id_region: &str,
    ) -> StateStream<RegionWithStats> {
        let source = lift(self.datasource.region_and_stats(id_country, id_region)).map_ok(Some);

        with_loading(single(wrap(source, |rows: Vec<RegionAndStats>| {
            first(aggregate::series::<RegionWithStats>(
                rows.into_iter().map(RegionAndStats::into_domain),
            ))
        })))
    }

    #[instrument(skip(self))]
    pub fn regions_stats_ordered_by(
        &self, id_country: &str, metric: Metric,
    ) -> StateStream<Vec<RegionWithStats>> {
        self.regions_ranked(id_country, metric, None)
    }

    #[instrument(skip(self))]
    pub fn regions_with_most(
        &self, id_country: &str, metric: Metric, limit: usize,
    ) -> StateStream<Vec<RegionWithStats>> {
        self.regions_ranked(id_country, metric, Some(limit))
    }

    fn regions_ranked(
        &self, id_country: &str, metric: Metric, limit: Option<usize>,
    ) -> StateStream<Vec<RegionWithStats>> {
        let source = lift(self.datasource.regions_and_stats(id_country)).map_ok(Some);

        with_loading(wrap(source, move |rows: Vec<RegionAndStats>| {
            let rows = rows.into_iter().map(RegionAndStats::into_domain);
            ranked::<RegionWithStats>(rows, metric, limit)
        }))
    }

    #[instrument(skip(self))]
    pub fn sub_regions_stats_ordered_by(
        &self, id_country: &str, id_region: &str, metric: Metric,
    ) -> StateStream<Vec<SubRegionWithStats>> {
        self.sub_regions_ranked(id_country, id_region, metric, None)
    }

    #[instrument(skip(self))]
    pub fn sub_regions_with_most(
        &self, id_country: &str, id_region: &str, metric: Metric, limit: usize,
    ) -> StateStream<Vec<SubRegionWithStats>> {
        self.sub_regions_ranked(id_country, id_region, metric, Some(limit))
    }

    fn sub_regions_ranked(
        &self, id_country: &str, id_region: &str, metric: Metric, limit: Option<usize>,
    ) -> StateStream<Vec<SubRegionWithStats>> {
        let source =
            lift(self.datasource.sub_regions_and_stats(id_country, id_region)).map_ok(Some);

        with_loading(wrap(source, move |rows: Vec<SubRegionAndStats>| {
            let rows = rows.into_iter().map(SubRegionAndStats::into_domain);
            ranked::<SubRegionWithStats>(rows, metric, limit)
        }))
    }

    /// A country on the most recent date, with its regions.
    #[instrument(skip(self))]
    pub fn country_last_stats(&self, id_country: &str) -> StateStream<CountryOneDayStats> {
        let id_country = id_country.to_string();
        let source = lift(self.datasource.world_and_countries_last());

        with_loading(single(wrap(source, move |rows: WorldAndCountriesStats| {
            let country = last_country(rows, &id_country);
            (country.is_some(), country)
        })))
    }

    /// A region on the most recent date, with its sub-regions.
    #[instrument(skip(self))]
    pub fn region_last_stats(
        &self, id_country: &str, id_region: &str,
    ) -> StateStream<RegionOneDayStats> {
        let (id_country, id_region) = (id_country.to_string(), id_region.to_string());
        let source = lift(self.datasource.world_and_countries_last());

        with_loading(single(wrap(source, move |rows: WorldAndCountriesStats| {
            let region = last_region(rows, &id_country, &id_region);
            (region.is_some(), region)
        })))
    }

    /// Share of the country's confirmed cases held by each of its regions on the most recent
    /// date, largest first.
    #[instrument(skip(self))]
    pub fn regions_shares(&self, id_country: &str) -> StateStream<Vec<PlaceShare<Region>>> {
        let id_country = id_country.to_string();
        let source = lift(self.datasource.world_and_countries_last());

        with_loading(wrap(source, move |rows: WorldAndCountriesStats| {
            let shares = last_country(rows, &id_country)
                .map(|country| {
                    let regions = country
                        .regions_stats
                        .into_iter()
                        .map(|region| (region.region, region.stats));
                    PlaceShare::of(&country.stats, regions)
                })
                .unwrap_or_default();

            non_empty(shares)
        }))
    }

    /// Same as [Repository::regions_shares] for the sub-regions of a region.
    #[instrument(skip(self))]
    pub fn sub_regions_shares(
        &self, id_country: &str, id_region: &str,
    ) -> StateStream<Vec<PlaceShare<SubRegion>>> {
        let (id_country, id_region) = (id_country.to_string(), id_region.to_string());
        let source = lift(self.datasource.world_and_countries_last());

        with_loading(wrap(source, move |rows: WorldAndCountriesStats| {
            let shares = last_region(rows, &id_country, &id_region)
                .map(|region| {
                    let sub_regions = region
                        .sub_regions_stats
                        .into_iter()
                        .map(|sub_region| (sub_region.sub_region, sub_region.stats));
                    PlaceShare::of(&region.stats, sub_regions)
                })
                .unwrap_or_default();

            non_empty(shares)
        }))
    }

    /// Every stored country, by name.
    #[instrument(skip(self))]
    pub fn countries(&self) -> StateStream<Vec<Country>> {
        let source = lift(self.datasource.countries()).map_ok(Some);

        with_loading(wrap(source, |rows: Vec<CountryEntity>| {
            non_empty(rows.into_iter().map(CountryEntity::into_domain).collect())
        }))
    }

    /// Regions of a country, by name. A country without regions yields empty data.
    #[instrument(skip(self))]
    pub fn regions(&self, id_country: &str) -> StateStream<Vec<Region>> {
        let source = lift(self.datasource.regions(id_country)).map_ok(Some);

        with_loading(wrap(source, |rows: Vec<RegionEntity>| {
            non_empty(rows.into_iter().map(RegionEntity::into_domain).collect())
        }))
    }
}

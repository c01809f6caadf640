use std::future::Future;

use futures::stream::BoxStream;
use snafu::Snafu;

pub use memory::MemoryDatasource;
pub use record::*;

/// In-memory relational tables with live queries.
pub mod memory;

/// Row types of the relational schema and their mapping to and from the domain.
pub mod record;

pub type Result<T, E = DatasourceError> = std::result::Result<T, E>;

/// A live query: yields the current result, then a fresh one after every write that could
/// change it.
pub type RowStream<T> = BoxStream<'static, Result<T>>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum DatasourceError {
    #[snafu(display("failed to query the `{table}` table: {message}"))]
    Query { table: String, message: String },

    #[snafu(display("failed to write the snapshot of `{date}`: {message}"))]
    Write { date: String, message: String },
}

/// The persistence collaborator.
///
/// Join queries return rows exactly as a relational engine would: one row per `(place, stats)`
/// pair in the engine's enumeration order. Grouping and ordering happen further up.
pub trait Datasource: Send + Sync + 'static {
    /// The world row for `date` together with every country (and its regions) of that date.
    /// Yields `None` while no world row exists for the date.
    fn world_and_countries_by_date(&self, date: &str) -> RowStream<Option<WorldAndCountriesStats>>;

    /// Same as [Datasource::world_and_countries_by_date] for the most recent date.
    fn world_and_countries_last(&self) -> RowStream<Option<WorldAndCountriesStats>>;

    /// Every world row, oldest first.
    fn world_all_stats(&self) -> RowStream<Vec<WorldStatsEntity>>;

    fn countries_and_stats(&self) -> RowStream<Vec<CountryAndStats>>;

    fn country_and_stats(&self, id_country: &str) -> RowStream<Vec<CountryAndStats>>;

    fn regions_and_stats(&self, id_country: &str) -> RowStream<Vec<RegionAndStats>>;

    fn region_and_stats(&self, id_country: &str, id_region: &str)
        -> RowStream<Vec<RegionAndStats>>;

    fn sub_regions_and_stats(
        &self, id_country: &str, id_region: &str,
    ) -> RowStream<Vec<SubRegionAndStats>>;

    /// Every country, ordered by name.
    fn countries(&self) -> RowStream<Vec<CountryEntity>>;

    /// Regions of a country, ordered by name.
    fn regions(&self, id_country: &str) -> RowStream<Vec<RegionEntity>>;

    /// Insert or replace every row of a snapshot, keyed by place id and `(place, date)`.
    fn insert(&self, rows: Rows) -> impl Future<Output = Result<()>> + Send;
}

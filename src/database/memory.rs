use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use super::*;

/// Rows in insertion order, indexed by their key.
#[derive(Debug, Clone)]
struct Table<K, T> {
    index: HashMap<K, usize>,
    rows: Vec<T>,
}

impl<K, T> Default for Table<K, T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<K: Eq + Hash, T> Table<K, T> {
    /// Insert `row`, replacing in place the row already stored under `key`.
    fn upsert(&mut self, key: K, row: T) {
        match self.index.get(&key) {
            Some(&position) => self.rows[position] = row,
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
            }
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).map(|&position| &self.rows[position])
    }

    fn rows(&self) -> &[T] {
        &self.rows
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    world_stats: Table<String, WorldStatsEntity>,
    countries: Table<String, CountryEntity>,
    countries_stats: Table<(String, String), CountryStatsEntity>,
    regions: Table<(String, String), RegionEntity>,
    regions_stats: Table<(String, String, String), RegionStatsEntity>,
    sub_regions: Table<(String, String, String), SubRegionEntity>,
    sub_regions_stats: Table<(String, String, String, String), SubRegionStatsEntity>,
}

/// Relational tables kept in memory.
///
/// The tables live inside a [watch] channel: a write replaces them and wakes every live query,
/// which then re-runs against the new contents. Rows keep insertion order, and a row whose key
/// already exists is replaced in place.
#[derive(Debug, Clone)]
pub struct MemoryDatasource {
    tables: Arc<watch::Sender<Tables>>,
}

impl Default for MemoryDatasource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatasource {
    pub fn new() -> Self {
        let (tables, _) = watch::channel(Tables::default());
        Self {
            tables: Arc::new(tables),
        }
    }

    /// Run `query` now and again after each write, until the stream is dropped.
    fn live<T, F>(&self, query: F) -> RowStream<T>
    where
        T: Send + 'static,
        F: Fn(&Tables) -> T + Send + 'static,
    {
        let tables = self.tables.subscribe();

        stream::unfold(
            (tables, query, true),
            |(mut tables, query, first)| async move {
                if !first && tables.changed().await.is_err() {
                    return None;
                }

                let rows = query(&tables.borrow_and_update());
                Some((Ok(rows), (tables, query, false)))
            },
        )
        .boxed()
    }
}

/// Rows of `table` ordered by date, keeping insertion order within a date.
fn by_date<'a, T>(table: &'a [T], date: impl Fn(&T) -> &str) -> Vec<&'a T> {
    let mut rows: Vec<&T> = table.iter().collect();
    rows.sort_by(|a, b| date(a).cmp(date(b)));
    rows
}

impl Tables {
    fn country(&self, id: &str) -> Option<CountryEntity> {
        self.countries.get(id).cloned()
    }

    fn region(&self, id_country: &str, id: &str) -> Option<RegionEntity> {
        let key = (id_country.to_string(), id.to_string());
        self.regions.get(&key).cloned()
    }

    fn sub_region(&self, id_country: &str, id_region: &str, id: &str) -> Option<SubRegionEntity> {
        let key = (id_country.to_string(), id_region.to_string(), id.to_string());
        self.sub_regions.get(&key).cloned()
    }

    fn last_date(&self) -> Option<String> {
        self.world_stats.iter().map(|row| row.date.as_str()).max().map(str::to_owned)
    }

    fn countries_and_stats(&self, id_country: Option<&str>) -> Vec<CountryAndStats> {
        by_date(self.countries_stats.rows(), |row| row.date.as_str())
            .into_iter()
            .filter(|row| id_country.map_or(true, |id| row.id_country_fk == id))
            .map(|row| CountryAndStats::new(self.country(&row.id_country_fk), Some(row.clone())))
            .collect()
    }

    fn regions_and_stats(&self, id_country: &str, id_region: Option<&str>) -> Vec<RegionAndStats> {
        by_date(self.regions_stats.rows(), |row| row.date.as_str())
            .into_iter()
            .filter(|row| row.id_country_fk == id_country)
            .filter(|row| id_region.map_or(true, |id| row.id_region_fk == id))
            .map(|row| {
                let region = self.region(&row.id_country_fk, &row.id_region_fk);
                RegionAndStats::new(region, Some(row.clone()))
            })
            .collect()
    }

    fn sub_regions_and_stats(&self, id_country: &str, id_region: &str) -> Vec<SubRegionAndStats> {
        by_date(self.sub_regions_stats.rows(), |row| row.date.as_str())
            .into_iter()
            .filter(|row| row.id_country_fk == id_country && row.id_region_fk == id_region)
            .map(|row| self.sub_region_and_stats(row))
            .collect()
    }

    fn sub_region_and_stats(&self, row: &SubRegionStatsEntity) -> SubRegionAndStats {
        let sub_region =
            self.sub_region(&row.id_country_fk, &row.id_region_fk, &row.id_sub_region_fk);
        SubRegionAndStats::new(sub_region, Some(row.clone()))
    }

    /// Every table is read once; children are grouped under their parent key before joining.
    fn world_and_countries(&self, date: &str) -> Option<WorldAndCountriesStats> {
        let world_stats = self.world_stats.get(date).cloned()?;

        let mut sub_regions: HashMap<(&str, &str), Vec<SubRegionAndStats>> = HashMap::new();
        for row in self.sub_regions_stats.iter().filter(|row| row.date == date) {
            sub_regions
                .entry((row.id_country_fk.as_str(), row.id_region_fk.as_str()))
                .or_default()
                .push(self.sub_region_and_stats(row));
        }

        let mut regions: HashMap<&str, Vec<RegionAndOneDayStats>> = HashMap::new();
        for row in self.regions_stats.iter().filter(|row| row.date == date) {
            let sub_regions_stats = sub_regions
                .remove(&(row.id_country_fk.as_str(), row.id_region_fk.as_str()))
                .unwrap_or_default();

            regions
                .entry(row.id_country_fk.as_str())
                .or_default()
                .push(RegionAndOneDayStats::new(
                    self.region(&row.id_country_fk, &row.id_region_fk),
                    Some(row.clone()),
                    sub_regions_stats,
                ));
        }

        let countries_stats = self
            .countries_stats
            .iter()
            .filter(|row| row.date == date)
            .map(|row| {
                let regions_stats = regions
                    .remove(row.id_country_fk.as_str())
                    .unwrap_or_default();

                CountryAndOneDayStats::new(
                    self.country(&row.id_country_fk),
                    Some(row.clone()),
                    regions_stats,
                )
            })
            .collect();

        Some(WorldAndCountriesStats::new(world_stats, countries_stats))
    }

    fn insert(&mut self, rows: Rows) {
        let Rows {
            world_stats,
            countries,
            countries_stats,
            regions,
            regions_stats,
            sub_regions,
            sub_regions_stats,
        } = rows;

        for row in world_stats {
            self.world_stats.upsert(row.date.clone(), row);
        }
        for row in countries {
            self.countries.upsert(row.id.clone(), row);
        }
        for row in countries_stats {
            let key = (row.id_country_fk.clone(), row.date.clone());
            self.countries_stats.upsert(key, row);
        }
        for row in regions {
            let key = (row.id_country_fk.clone(), row.id.clone());
            self.regions.upsert(key, row);
        }
        for row in regions_stats {
            let key = (
                row.id_country_fk.clone(),
                row.id_region_fk.clone(),
                row.date.clone(),
            );
            self.regions_stats.upsert(key, row);
        }
        for row in sub_regions {
            let key = (
                row.id_country_fk.clone(),
                row.id_region_fk.clone(),
                row.id.clone(),
            );
            self.sub_regions.upsert(key, row);
        }
        for row in sub_regions_stats {
            let key = (
                row.id_country_fk.clone(),
                row.id_region_fk.clone(),
                row.id_sub_region_fk.clone(),
                row.date.clone(),
            );
            self.sub_regions_stats.upsert(key, row);
        }
    }
}

impl Datasource for MemoryDatasource {
    fn world_and_countries_by_date(&self, date: &str) -> RowStream<Option<WorldAndCountriesStats>> {
        let date = date.to_string();
        self.live(move |tables| tables.world_and_countries(&date))
    }

    fn world_and_countries_last(&self) -> RowStream<Option<WorldAndCountriesStats>> {
        self.live(|tables| {
            let date = tables.last_date()?;
            tables.world_and_countries(&date)
        })
    }

    fn world_all_stats(&self) -> RowStream<Vec<WorldStatsEntity>> {
        self.live(|tables| {
            by_date(tables.world_stats.rows(), |row| row.date.as_str())
                .into_iter()
                .cloned()
                .collect()
        })
    }

    fn countries_and_stats(&self) -> RowStream<Vec<CountryAndStats>> {
        self.live(|tables| tables.countries_and_stats(None))
    }

    fn country_and_stats(&self, id_country: &str) -> RowStream<Vec<CountryAndStats>> {
        let id_country = id_country.to_string();
        self.live(move |tables| tables.countries_and_stats(Some(&id_country)))
    }

    fn regions_and_stats(&self, id_country: &str) -> RowStream<Vec<RegionAndStats>> {
        let id_country = id_country.to_string();
        self.live(move |tables| tables.regions_and_stats(&id_country, None))
    }

    fn region_and_stats(
        &self, id_country: &str, id_region: &str,
    ) -> RowStream<Vec<RegionAndStats>> {
        let id_country = id_country.to_string();
        let id_region = id_region.to_string();
        self.live(move |tables| tables.regions_and_stats(&id_country, Some(&id_region)))
    }

    fn sub_regions_and_stats(
        &self, id_country: &str, id_region: &str,
    ) -> RowStream<Vec<SubRegionAndStats>> {
        let id_country = id_country.to_string();
        let id_region = id_region.to_string();
        self.live(move |tables| tables.sub_regions_and_stats(&id_country, &id_region))
    }

    fn countries(&self) -> RowStream<Vec<CountryEntity>> {
        self.live(|tables| {
            let mut countries = tables.countries.rows().to_vec();
            countries.sort_by(|a, b| a.name.cmp(&b.name));
            countries
        })
    }

    fn regions(&self, id_country: &str) -> RowStream<Vec<RegionEntity>> {
        let id_country = id_country.to_string();
        self.live(move |tables| {
            let mut regions: Vec<RegionEntity> = tables
                .regions
                .iter()
                .filter(|row| row.id_country_fk == id_country)
                .cloned()
                .collect();
            regions.sort_by(|a, b| a.name.cmp(&b.name));
            regions
        })
    }

    async fn insert(&self, rows: Rows) -> Result<()> {
        tracing::debug!(
            date = rows.date(),
            countries = rows.countries.len(),
            regions = rows.regions.len(),
            sub_regions = rows.sub_regions.len(),
            "inserting snapshot rows"
        );

        self.tables.send_modify(|tables| tables.insert(rows));
        Ok(())
    }
}

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::model::{
    Country, CountryOneDayStats, CovidTracker, Region, RegionOneDayStats, Stats, SubRegion,
    SubRegionOneDayStats, WorldStats,
};

/// Metrics embedded in every stats table. The date lives on the owning row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsEmbedded {
    pub source: String,
    pub confirmed: u64,
    pub deaths: u64,
    pub new_confirmed: u64,
    pub new_deaths: u64,
    pub new_open_cases: u64,
    pub new_recovered: u64,
    pub open_cases: u64,
    pub recovered: u64,
    pub vs_yesterday_confirmed: f64,
    pub vs_yesterday_deaths: f64,
    pub vs_yesterday_open_cases: f64,
    pub vs_yesterday_recovered: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct CountryEntity {
    pub id: String,
    pub name: String,
    pub localized_name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct CountryStatsEntity {
    pub date: String,
    pub id_country_fk: String,
    pub stats: StatsEmbedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct RegionEntity {
    pub id: String,
    pub name: String,
    pub localized_name: String,
    pub id_country_fk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RegionStatsEntity {
    pub date: String,
    pub id_region_fk: String,
    pub id_country_fk: String,
    pub stats: StatsEmbedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct SubRegionEntity {
    pub id: String,
    pub name: String,
    pub localized_name: String,
    pub id_region_fk: String,
    pub id_country_fk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct SubRegionStatsEntity {
    pub date: String,
    pub id_sub_region_fk: String,
    pub id_region_fk: String,
    pub id_country_fk: String,
    pub stats: StatsEmbedded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct WorldStatsEntity {
    pub date: String,
    pub updated_at: String,
    pub stats: StatsEmbedded,
}

// Join rows. Either side of a join may be structurally absent in the result set, but the
// schema forbids it, so mapping one that is absent is a defect.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct CountryAndStats {
    pub country: Option<CountryEntity>,
    pub stats: Option<CountryStatsEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RegionAndStats {
    pub region: Option<RegionEntity>,
    pub stats: Option<RegionStatsEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct SubRegionAndStats {
    pub sub_region: Option<SubRegionEntity>,
    pub stats: Option<SubRegionStatsEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RegionAndOneDayStats {
    pub region: Option<RegionEntity>,
    pub stats: Option<RegionStatsEntity>,
    pub sub_regions_stats: Vec<SubRegionAndStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct CountryAndOneDayStats {
    pub country: Option<CountryEntity>,
    pub stats: Option<CountryStatsEntity>,
    pub regions_stats: Vec<RegionAndOneDayStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct WorldAndCountriesStats {
    pub world_stats: WorldStatsEntity,
    pub countries_stats: Vec<CountryAndOneDayStats>,
}

/// Every row produced by persisting one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub world_stats: Vec<WorldStatsEntity>,
    pub countries: Vec<CountryEntity>,
    pub countries_stats: Vec<CountryStatsEntity>,
    pub regions: Vec<RegionEntity>,
    pub regions_stats: Vec<RegionStatsEntity>,
    pub sub_regions: Vec<SubRegionEntity>,
    pub sub_regions_stats: Vec<SubRegionStatsEntity>,
}

/// # Panics
///
/// When a join row lacks one of its sides, which the schema rules out.
fn required<T>(value: Option<T>, relation: &str) -> T {
    match value {
        Some(value) => value,
        None => panic!("schema invariant violated: join row without its {relation}"),
    }
}

impl From<&Stats> for StatsEmbedded {
    fn from(stats: &Stats) -> Self {
        Self {
            source: stats.source.clone(),
            confirmed: stats.confirmed,
            deaths: stats.deaths,
            new_confirmed: stats.new_confirmed,
            new_deaths: stats.new_deaths,
            new_open_cases: stats.new_open_cases,
            new_recovered: stats.new_recovered,
            open_cases: stats.open_cases,
            recovered: stats.recovered,
            vs_yesterday_confirmed: stats.vs_yesterday_confirmed,
            vs_yesterday_deaths: stats.vs_yesterday_deaths,
            vs_yesterday_open_cases: stats.vs_yesterday_open_cases,
            vs_yesterday_recovered: stats.vs_yesterday_recovered,
        }
    }
}

impl StatsEmbedded {
    pub fn into_domain(self, date: String) -> Stats {
        Stats {
            date,
            source: self.source,
            confirmed: self.confirmed,
            deaths: self.deaths,
            new_confirmed: self.new_confirmed,
            new_deaths: self.new_deaths,
            new_open_cases: self.new_open_cases,
            new_recovered: self.new_recovered,
            open_cases: self.open_cases,
            recovered: self.recovered,
            vs_yesterday_confirmed: self.vs_yesterday_confirmed,
            vs_yesterday_deaths: self.vs_yesterday_deaths,
            vs_yesterday_open_cases: self.vs_yesterday_open_cases,
            vs_yesterday_recovered: self.vs_yesterday_recovered,
        }
    }
}

impl From<&Country> for CountryEntity {
    fn from(country: &Country) -> Self {
        Self::new(
            country.id.clone(),
            country.name.clone(),
            country.localized_name.clone(),
            country.code.clone(),
        )
    }
}

impl CountryEntity {
    pub fn into_domain(self) -> Country {
        Country::new(self.id, self.name, self.localized_name, self.code)
    }
}

impl CountryStatsEntity {
    pub fn from_domain(stats: &Stats, id_country_fk: &str) -> Self {
        Self::new(stats.date.clone(), id_country_fk.to_string(), stats.into())
    }

    pub fn into_domain(self) -> Stats {
        self.stats.into_domain(self.date)
    }
}

impl RegionEntity {
    pub fn from_domain(region: &Region, id_country_fk: &str) -> Self {
        Self::new(
            region.id.clone(),
            region.name.clone(),
            region.localized_name.clone(),
            id_country_fk.to_string(),
        )
    }

    pub fn into_domain(self) -> Region {
        Region::new(self.id, self.name, self.localized_name)
    }
}

impl RegionStatsEntity {
    pub fn from_domain(stats: &Stats, id_region_fk: &str, id_country_fk: &str) -> Self {
        Self::new(
            stats.date.clone(),
            id_region_fk.to_string(),
            id_country_fk.to_string(),
            stats.into(),
        )
    }

    pub fn into_domain(self) -> Stats {
        self.stats.into_domain(self.date)
    }
}

impl SubRegionEntity {
    pub fn from_domain(sub_region: &SubRegion, id_region_fk: &str, id_country_fk: &str) -> Self {
        Self::new(
            sub_region.id.clone(),
            sub_region.name.clone(),
            sub_region.localized_name.clone(),
            id_region_fk.to_string(),
            id_country_fk.to_string(),
        )
    }

    pub fn into_domain(self) -> SubRegion {
        SubRegion::new(self.id, self.name, self.localized_name)
    }
}

impl SubRegionStatsEntity {
    pub fn from_domain(
        stats: &Stats, id_sub_region_fk: &str, id_region_fk: &str, id_country_fk: &str,
    ) -> Self {
        Self::new(
            stats.date.clone(),
            id_sub_region_fk.to_string(),
            id_region_fk.to_string(),
            id_country_fk.to_string(),
            stats.into(),
        )
    }

    pub fn into_domain(self) -> Stats {
        self.stats.into_domain(self.date)
    }
}

impl From<&WorldStats> for WorldStatsEntity {
    fn from(world: &WorldStats) -> Self {
        Self::new(
            world.date.clone(),
            world.updated_at.clone(),
            (&world.stats).into(),
        )
    }
}

impl WorldStatsEntity {
    pub fn into_domain(self) -> WorldStats {
        let stats = self.stats.into_domain(self.date.clone());
        WorldStats::new(self.date, self.updated_at, stats)
    }
}

impl CountryAndStats {
    pub fn into_domain(self) -> (Country, Stats) {
        let country = required(self.country, "country");
        let stats = required(self.stats, "country stats");
        (country.into_domain(), stats.into_domain())
    }
}

impl RegionAndStats {
    pub fn into_domain(self) -> (Region, Stats) {
        let region = required(self.region, "region");
        let stats = required(self.stats, "region stats");
        (region.into_domain(), stats.into_domain())
    }
}

impl SubRegionAndStats {
    pub fn into_domain(self) -> (SubRegion, Stats) {
        let sub_region = required(self.sub_region, "sub-region");
        let stats = required(self.stats, "sub-region stats");
        (sub_region.into_domain(), stats.into_domain())
    }

    fn into_one_day(self) -> SubRegionOneDayStats {
        let (sub_region, stats) = self.into_domain();
        SubRegionOneDayStats::new(sub_region, stats)
    }
}

impl RegionAndOneDayStats {
    pub fn into_domain(self) -> RegionOneDayStats {
        let region = required(self.region, "region");
        let stats = required(self.stats, "region stats");
        let sub_regions_stats = self
            .sub_regions_stats
            .into_iter()
            .map(SubRegionAndStats::into_one_day)
            .collect();

        RegionOneDayStats::new(region.into_domain(), stats.into_domain(), sub_regions_stats)
    }
}

impl CountryAndOneDayStats {
    pub fn into_domain(self) -> CountryOneDayStats {
        let country = required(self.country, "country");
        let stats = required(self.stats, "country stats");
        let regions_stats = self
            .regions_stats
            .into_iter()
            .map(RegionAndOneDayStats::into_domain)
            .collect();

        CountryOneDayStats::new(country.into_domain(), stats.into_domain(), regions_stats)
    }
}

impl WorldAndCountriesStats {
    pub fn into_domain(self) -> CovidTracker {
        let countries_stats = self
            .countries_stats
            .into_iter()
            .map(CountryAndOneDayStats::into_domain)
            .collect();

        CovidTracker::new(countries_stats, self.world_stats.into_domain())
    }
}

impl Rows {
    /// Flatten a snapshot into one row per place and one row per `(place, date)`, each stats
    /// row carrying the foreign keys of its ancestors.
    pub fn from_domain(tracker: &CovidTracker) -> Self {
        let mut rows = Rows {
            world_stats: vec![(&tracker.world_stats).into()],
            ..Default::default()
        };

        for country in &tracker.countries_stats {
            let id_country = country.country.id.as_str();
            rows.countries.push((&country.country).into());
            rows.countries_stats
                .push(CountryStatsEntity::from_domain(&country.stats, id_country));

            for region in &country.regions_stats {
                let id_region = region.region.id.as_str();
                rows.regions
                    .push(RegionEntity::from_domain(&region.region, id_country));
                rows.regions_stats.push(RegionStatsEntity::from_domain(
                    &region.stats,
                    id_region,
                    id_country,
                ));

                for sub_region in &region.sub_regions_stats {
                    let id_sub_region = sub_region.sub_region.id.as_str();
                    rows.sub_regions.push(SubRegionEntity::from_domain(
                        &sub_region.sub_region,
                        id_region,
                        id_country,
                    ));
                    rows.sub_regions_stats.push(SubRegionStatsEntity::from_domain(
                        &sub_region.stats,
                        id_sub_region,
                        id_region,
                        id_country,
                    ));
                }
            }
        }

        rows
    }

    /// Date of the snapshot, taken from its world row.
    pub fn date(&self) -> Option<&str> {
        self.world_stats.first().map(|world| world.date.as_str())
    }
}

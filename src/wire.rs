//! Records as they arrive from the remote feed, and their mapping into the domain.
//!
//! Field names follow the public feed (`snake_case`, localized names under `name_es`).
//!
//! Counts are unsigned. The feed occasionally reports a negative daily delta (for example
//! `today_new_open_cases` when cases close faster than they open); such a snapshot is rejected
//! while it is deserialized, before anything is stored.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{
    Country, CountryOneDayStats, CovidTracker, Region, RegionOneDayStats, Stats, SubRegion,
    SubRegionOneDayStats, WorldStats,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovidTrackerDto {
    pub updated_at: String,
    #[serde(default)]
    pub dates: BTreeMap<String, CovidTrackerDateDto>,
    pub total: CovidTrackerTotalDto,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovidTrackerDateDto {
    /// Countries keyed by their feed name, in the order the feed lists them.
    #[serde(
        default,
        serialize_with = "CovidTrackerDateDto::serializer",
        deserialize_with = "CovidTrackerDateDto::deserializer"
    )]
    pub countries: Vec<(String, CountryDto)>,
}

/// The per-metric counters shared by every level of the feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsDto {
    #[serde(default)]
    pub source: Option<String>,
    pub today_confirmed: u64,
    pub today_deaths: u64,
    pub today_new_confirmed: u64,
    pub today_new_deaths: u64,
    pub today_new_open_cases: u64,
    pub today_new_recovered: u64,
    pub today_open_cases: u64,
    pub today_recovered: u64,
    pub today_vs_yesterday_confirmed: f64,
    pub today_vs_yesterday_deaths: f64,
    pub today_vs_yesterday_open_cases: f64,
    pub today_vs_yesterday_recovered: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovidTrackerTotalDto {
    #[serde(flatten)]
    pub metrics: MetricsDto,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CountryDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "name_es")]
    pub localized_name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(flatten)]
    pub metrics: MetricsDto,
    #[serde(default)]
    pub regions: Option<Vec<RegionDto>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RegionDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "name_es")]
    pub localized_name: String,
    #[serde(flatten)]
    pub metrics: MetricsDto,
    #[serde(default)]
    pub sub_regions: Option<Vec<SubRegionDto>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubRegionDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "name_es")]
    pub localized_name: String,
    #[serde(flatten)]
    pub metrics: MetricsDto,
}

impl CovidTrackerDto {
    /// Map the first date of the payload into a snapshot.
    ///
    /// Returns `None` when the payload carries no date at all, since a snapshot cannot exist
    /// without one.
    pub fn into_domain(self) -> Option<CovidTracker> {
        let Self {
            updated_at,
            dates,
            total,
        } = self;

        let (date, day) = dates.into_iter().next()?;
        let countries_stats = day.into_domain(&date);
        let world_stats = total.into_domain(date, updated_at);

        Some(CovidTracker::new(countries_stats, world_stats))
    }
}

impl CovidTrackerDateDto {
    pub fn into_domain(self, date: &str) -> Vec<CountryOneDayStats> {
        self.countries
            .into_iter()
            .map(|(_, country)| country.into_domain(date))
            .collect()
    }

    fn serializer<S>(countries: &[(String, CountryDto)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(countries.iter().map(|(key, country)| (key, country)))
    }

    fn deserializer<'de, D>(deserializer: D) -> Result<Vec<(String, CountryDto)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InFeedOrder;

        impl<'de> Visitor<'de> for InFeedOrder {
            type Value = Vec<(String, CountryDto)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of countries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut countries: Self::Value = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    countries.push(entry);
                }
                Ok(countries)
            }
        }

        deserializer.deserialize_map(InFeedOrder)
    }
}

impl CovidTrackerTotalDto {
    pub fn into_domain(self, date: String, updated_at: String) -> WorldStats {
        let stats = self.metrics.into_domain(&date);
        WorldStats::new(date, updated_at, stats)
    }
}

impl MetricsDto {
    pub fn into_domain(self, date: &str) -> Stats {
        Stats {
            date: date.to_string(),
            source: self.source.unwrap_or_default(),
            confirmed: self.today_confirmed,
            deaths: self.today_deaths,
            new_confirmed: self.today_new_confirmed,
            new_deaths: self.today_new_deaths,
            new_open_cases: self.today_new_open_cases,
            new_recovered: self.today_new_recovered,
            open_cases: self.today_open_cases,
            recovered: self.today_recovered,
            vs_yesterday_confirmed: self.today_vs_yesterday_confirmed,
            vs_yesterday_deaths: self.today_vs_yesterday_deaths,
            vs_yesterday_open_cases: self.today_vs_yesterday_open_cases,
            vs_yesterday_recovered: self.today_vs_yesterday_recovered,
        }
    }
}

impl CountryDto {
    pub fn into_domain(self, date: &str) -> CountryOneDayStats {
        let country = Country::new(
            self.id,
            self.name,
            self.localized_name,
            self.code.unwrap_or_default(),
        );

        let regions_stats = self
            .regions
            .unwrap_or_default()
            .into_iter()
            .map(|region| region.into_domain(date))
            .collect();

        CountryOneDayStats::new(country, self.metrics.into_domain(date), regions_stats)
    }
}

impl RegionDto {
    pub fn into_domain(self, date: &str) -> RegionOneDayStats {
        let region = Region::new(self.id, self.name, self.localized_name);

        let sub_regions_stats = self
            .sub_regions
            .unwrap_or_default()
            .into_iter()
            .map(|sub_region| sub_region.into_domain(date))
            .collect();

        RegionOneDayStats::new(region, self.metrics.into_domain(date), sub_regions_stats)
    }
}

impl SubRegionDto {
    pub fn into_domain(self, date: &str) -> SubRegionOneDayStats {
        let sub_region = SubRegion::new(self.id, self.name, self.localized_name);
        SubRegionOneDayStats::new(sub_region, self.metrics.into_domain(date))
    }
}

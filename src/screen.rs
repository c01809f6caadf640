//! Screens of the application. Every view of a screen is one logical query, run under its own
//! key in the screen's [Scope], so views load and fail independently of each other.

use std::sync::Arc;

use tracing::instrument;

use crate::database::Datasource;
use crate::model::{
    Country, CountryOneDayStats, CountryWithStats, CovidTracker, Metric, PlaceShare, Region,
    RegionOneDayStats, RegionWithStats, Stats, SubRegion, SubRegionWithStats, WorldStats,
};
use crate::repository::Repository;
use crate::state::{observe, Scope, ScreenState};

pub use place::{PlaceRender, PlaceScreen};
pub use world::{CountryShare, WorldRender, WorldScreen};

mod place;
mod world;

fn line_chart_key(metric: Metric) -> String {
    format!("line_chart/{metric}")
}

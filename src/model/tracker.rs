use super::*;

/// Totals for the whole world on one date. `updated_at` is the wall-clock time of the refresh
/// that produced the row and is unrelated to `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct WorldStats {
    pub date: String,
    pub updated_at: String,
    pub stats: Stats,
}

/// Snapshot of one date: every country (with its regions and sub-regions) plus the world total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct CovidTracker {
    pub countries_stats: Vec<CountryOneDayStats>,
    pub world_stats: WorldStats,
}

impl CovidTracker {
    pub fn date(&self) -> &str {
        &self.world_stats.date
    }

    pub fn country(&self, id: &str) -> Option<&CountryOneDayStats> {
        self.countries_stats
            .iter()
            .find(|country| country.country.id == id)
    }
}

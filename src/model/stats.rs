use std::fmt;

use chrono::NaiveDate;

use super::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether `date` is a real calendar date written exactly as `YYYY-MM-DD`.
pub fn is_canonical_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .is_ok_and(|parsed| parsed.format(DATE_FORMAT).to_string() == date)
}

/// One date-stamped metrics record for a place or for the whole world.
///
/// `date` is always in the canonical `YYYY-MM-DD` form, which makes the lexical order of two
/// dates equal to their chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, new)]
pub struct Stats {
    pub date: String,
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

impl Stats {
    pub fn metric(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::OpenCases => self.open_cases,
            Metric::Recovered => self.recovered,
        }
    }

    /// Relative change against the previous day for the given metric.
    pub fn vs_yesterday(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Confirmed => self.vs_yesterday_confirmed,
            Metric::Deaths => self.vs_yesterday_deaths,
            Metric::OpenCases => self.vs_yesterday_open_cases,
            Metric::Recovered => self.vs_yesterday_recovered,
        }
    }
}

/// The cumulative counters a place can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Confirmed,
    Deaths,
    OpenCases,
    Recovered,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::OpenCases,
        Metric::Recovered,
    ];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
            Metric::OpenCases => "open_cases",
            Metric::Recovered => "recovered",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_selects_matching_counter() {
        let stats = Stats {
            confirmed: 1,
            deaths: 2,
            open_cases: 3,
            recovered: 4,
            vs_yesterday_deaths: -0.5,
            ..Default::default()
        };

        let values = Metric::ALL.map(|metric| stats.metric(metric));
        assert_eq!(values, [1, 2, 3, 4]);
        assert_eq!(stats.vs_yesterday(Metric::Deaths), -0.5);
    }

    #[test]
    fn only_padded_calendar_dates_are_canonical() {
        assert!(is_canonical_date("2020-04-21"));
        assert!(!is_canonical_date("2020-4-21"));
        assert!(!is_canonical_date("2020-02-30"));
        assert!(!is_canonical_date("21/04/2020"));
    }
}

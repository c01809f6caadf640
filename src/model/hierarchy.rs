use super::*;

/// A place together with its time series.
///
/// The order of [PlaceSeries::series] is the display order and is never re-sorted here.
pub trait PlaceSeries {
    type Place: Place;

    fn place(&self) -> &Self::Place;

    fn series(&self) -> &[Stats];

    /// The entry with the greatest date.
    fn latest(&self) -> Option<&Stats> {
        self.series().iter().max_by(|a, b| a.date.cmp(&b.date))
    }

    fn latest_metric(&self, metric: Metric) -> u64 {
        self.latest().map_or(0, |stats| stats.metric(metric))
    }
}

macro_rules! define_series {
    ($series:ident { $field:ident : $place:ty }) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
        pub struct $series {
            pub $field: $place,
            pub stats: Vec<Stats>,
        }

        impl PlaceSeries for $series {
            type Place = $place;

            fn place(&self) -> &$place {
                &self.$field
            }

            fn series(&self) -> &[Stats] {
                &self.stats
            }
        }

        impl From<($place, Vec<Stats>)> for $series {
            fn from(($field, stats): ($place, Vec<Stats>)) -> Self {
                Self { $field, stats }
            }
        }
    };
}

define_series!(CountryWithStats { country: Country });
define_series!(RegionWithStats { region: Region });
define_series!(SubRegionWithStats { sub_region: SubRegion });

/// Sort places by the latest value of `metric`, highest first. Ties keep their current order.
pub fn order_by_latest<T: PlaceSeries>(places: &mut [T], metric: Metric) {
    places.sort_by(|a, b| b.latest_metric(metric).cmp(&a.latest_metric(metric)));
}

/// The `limit` places with the highest latest `metric`.
pub fn most_by_latest<T: PlaceSeries>(mut places: Vec<T>, metric: Metric, limit: usize) -> Vec<T> {
    order_by_latest(&mut places, metric);
    places.truncate(limit);
    places
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct SubRegionOneDayStats {
    pub sub_region: SubRegion,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RegionOneDayStats {
    pub region: Region,
    pub stats: Stats,
    #[serde(default)]
    pub sub_regions_stats: Vec<SubRegionOneDayStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct CountryOneDayStats {
    pub country: Country,
    pub stats: Stats,
    #[serde(default)]
    pub regions_stats: Vec<RegionOneDayStats>,
}

/// Part of a parent place's confirmed cases held by one of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct PlaceShare<P> {
    pub place: P,
    pub stats: Stats,
    /// Fraction of the parent's confirmed cases, between 0 and 1.
    pub share: f64,
}

impl<P> PlaceShare<P> {
    /// Shares of `children` in the confirmed cases of `parent`, largest first.
    ///
    /// Every share is 0 when the parent has no confirmed case.
    pub fn of(parent: &Stats, children: impl IntoIterator<Item = (P, Stats)>) -> Vec<Self> {
        let whole = parent.confirmed;

        let mut shares: Vec<Self> = children
            .into_iter()
            .map(|(place, stats)| {
                let share = match whole {
                    0 => 0.0,
                    whole => stats.confirmed as f64 / whole as f64,
                };
                Self::new(place, stats, share)
            })
            .collect();

        shares.sort_by(|a, b| b.stats.confirmed.cmp(&a.stats.confirmed));
        shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(id: &str, series: &[(&str, u64)]) -> CountryWithStats {
        let stats = series
            .iter()
            .map(|(date, confirmed)| Stats {
                date: date.to_string(),
                confirmed: *confirmed,
                ..Default::default()
            })
            .collect();

        CountryWithStats::new(Country::new(id.into(), id.into(), id.into(), id.into()), stats)
    }

    fn ids(places: &[CountryWithStats]) -> Vec<&str> {
        places.iter().map(|place| place.country.id.as_str()).collect()
    }

    #[test]
    fn latest_is_greatest_date_not_last_entry() {
        let place = country("ES", &[("2020-04-21", 30), ("2020-04-19", 10)]);
        assert_eq!(place.latest_metric(Metric::Confirmed), 30);
    }

    #[test]
    fn ordering_is_descending_by_latest_value() {
        let mut places = vec![
            country("A", &[("2020-04-21", 50)]),
            country("B", &[("2020-04-21", 100)]),
        ];

        order_by_latest(&mut places, Metric::Confirmed);
        assert_eq!(ids(&places), vec!["B", "A"]);
    }

    #[test]
    fn ordering_keeps_ties_in_place() {
        let mut places = vec![
            country("C", &[("2020-04-21", 7)]),
            country("A", &[("2020-04-21", 7)]),
            country("B", &[("2020-04-21", 9)]),
        ];

        order_by_latest(&mut places, Metric::Confirmed);
        assert_eq!(ids(&places), vec!["B", "C", "A"]);
    }

    #[test]
    fn most_truncates_after_ordering() {
        let places = vec![
            country("A", &[("2020-04-21", 1)]),
            country("B", &[("2020-04-21", 3)]),
            country("C", &[("2020-04-21", 2)]),
        ];

        let top = most_by_latest(places, Metric::Confirmed, 2);
        assert_eq!(ids(&top), vec!["B", "C"]);
    }

    #[test]
    fn region_shares_are_taken_against_the_parent() {
        let parent = Stats {
            confirmed: 40,
            ..Default::default()
        };
        let region = |id: &str, confirmed: u64| {
            let stats = Stats {
                confirmed,
                ..Default::default()
            };
            (Region::new(id.into(), id.into(), id.into()), stats)
        };

        let shares = PlaceShare::of(&parent, vec![region("madrid", 10), region("andalucia", 30)]);

        let places: Vec<(&str, f64)> = shares
            .iter()
            .map(|share| (share.place.id.as_str(), share.share))
            .collect();
        assert_eq!(places, vec![("andalucia", 0.75), ("madrid", 0.25)]);
    }

    #[test]
    fn shares_of_an_empty_parent_are_zero() {
        let child = (Region::new("a".into(), "a".into(), "a".into()), Stats::default());

        let shares = PlaceShare::of(&Stats::default(), vec![child]);
        assert_eq!(shares[0].share, 0.0);
    }
}

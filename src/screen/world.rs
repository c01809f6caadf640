use super::*;

/// Part of the world's confirmed cases held by one country.
pub type CountryShare = PlaceShare<Country>;

fn country_shares(tracker: CovidTracker) -> Vec<CountryShare> {
    let countries = tracker
        .countries_stats
        .into_iter()
        .map(|country| (country.country, country.stats));

    PlaceShare::of(&tracker.world_stats.stats, countries)
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldRender {
    CovidTracker(CovidTracker),
    CountriesStatsPieChart(Vec<CountryShare>),
    WorldStatsBarChart(Vec<WorldStats>),
    CountriesStatsBarChart(Vec<CountryWithStats>),
    CountriesStatsLineChart {
        metric: Metric,
        countries: Vec<CountryWithStats>,
    },
}

pub struct WorldScreen<D> {
    repository: Arc<Repository<D>>,
    scope: Scope<WorldRender>,
    top: usize,
}

impl<D: Datasource> WorldScreen<D> {
    /// Number of views run by [WorldScreen::all_stats].
    pub const VIEW_COUNT: usize = 8;

    /// `top` is the number of countries drawn by each line chart.
    pub fn new(
        repository: Arc<Repository<D>>, top: usize,
        deliver: impl Fn(ScreenState<WorldRender>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            repository,
            scope: Scope::new(deliver),
            top,
        }
    }

    pub fn scope(&self) -> &Scope<WorldRender> {
        &self.scope
    }

    #[instrument(skip(self))]
    pub async fn list_stats(&self) {
        let states = observe(
            self.repository.covid_tracker_last(),
            WorldRender::CovidTracker,
        );
        self.scope.launch("list", states).await;
    }

    #[instrument(skip(self))]
    pub async fn pie_chart_stats(&self) {
        let states = observe(self.repository.covid_tracker_last(), |tracker| {
            WorldRender::CountriesStatsPieChart(country_shares(tracker))
        });
        self.scope.launch("pie_chart", states).await;
    }

    /// The world series and the countries ordered by confirmed cases, as two separate views.
    #[instrument(skip(self))]
    pub async fn bar_chart_stats(&self) {
        let world = observe(
            self.repository.world_all_stats(),
            WorldRender::WorldStatsBarChart,
        );
        self.scope.launch("bar_chart/world", world).await;

        let countries = observe(
            self.repository.countries_stats_ordered_by(Metric::Confirmed),
            WorldRender::CountriesStatsBarChart,
        );
        self.scope.launch("bar_chart/countries", countries).await;
    }

    /// One line chart per metric, each with the countries that have the most of it.
    #[instrument(skip(self))]
    pub async fn line_chart_stats(&self) {
        for metric in Metric::ALL {
            let states = observe(
                self.repository.countries_with_most(metric, self.top),
                move |countries| WorldRender::CountriesStatsLineChart { metric, countries },
            );
            self.scope.launch(&line_chart_key(metric), states).await;
        }
    }

    /// Run every view of the screen.
    pub async fn all_stats(&self) {
        self.list_stats().await;
        self.pie_chart_stats().await;
        self.bar_chart_stats().await;
        self.line_chart_stats().await;
    }

    pub async fn close(&self) {
        tracing::info!("closing the world screen");
        self.scope.cancel_all().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Country, CountryOneDayStats};

    use super::*;

    fn stats(confirmed: u64) -> Stats {
        Stats {
            date: "2020-04-21".into(),
            confirmed,
            ..Default::default()
        }
    }

    fn country(id: &str, confirmed: u64) -> CountryOneDayStats {
        let country = Country::new(id.into(), id.into(), id.into(), id.into());
        CountryOneDayStats::new(country, stats(confirmed), vec![])
    }

    #[test]
    fn shares_are_largest_first() {
        let world = WorldStats::new("2020-04-21".into(), "now".into(), stats(200));
        let tracker = CovidTracker::new(vec![country("A", 50), country("B", 150)], world);

        let shares = country_shares(tracker);

        assert_eq!(shares[0].place.id, "B");
        assert_eq!(shares[0].share, 0.75);
        assert_eq!(shares[1].share, 0.25);
    }

    #[test]
    fn empty_world_total_gives_zero_shares() {
        let world = WorldStats::new("2020-04-21".into(), "now".into(), stats(0));
        let tracker = CovidTracker::new(vec![country("A", 0)], world);

        assert_eq!(country_shares(tracker)[0].share, 0.0);
    }
}

use super::*;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaceRender {
    Countries(Vec<Country>),
    Regions(Vec<Region>),
    CountryStats(CountryWithStats),
    RegionStats(RegionWithStats),
    RegionsStats(Vec<RegionWithStats>),
    SubRegionsStats(Vec<SubRegionWithStats>),
    /// The place's own series, drawn next to the bars of its children.
    CountryStatsBarChart(CountryWithStats),
    RegionStatsBarChart(RegionWithStats),
    RegionsStatsBarChart(Vec<RegionWithStats>),
    SubRegionsStatsBarChart(Vec<SubRegionWithStats>),
    /// Totals of the place on the most recent date.
    PlaceTotalStatsPieChart(Stats),
    RegionsStatsPieChart(Vec<PlaceShare<Region>>),
    SubRegionsStatsPieChart(Vec<PlaceShare<SubRegion>>),
    RegionsStatsLineChart {
        metric: Metric,
        regions: Vec<RegionWithStats>,
    },
    SubRegionsStatsLineChart {
        metric: Metric,
        sub_regions: Vec<SubRegionWithStats>,
    },
}

/// Screen of a single country, or of a region when one is selected.
///
/// The views of a country show its regions; the views of a region show its sub-regions.
/// Selecting another place replaces the views of the previous one.
pub struct PlaceScreen<D> {
    repository: Arc<Repository<D>>,
    scope: Scope<PlaceRender>,
    top: usize,
}

impl<D: Datasource> PlaceScreen<D> {
    pub fn new(
        repository: Arc<Repository<D>>, top: usize,
        deliver: impl Fn(ScreenState<PlaceRender>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            repository,
            scope: Scope::new(deliver),
            top,
        }
    }

    pub fn scope(&self) -> &Scope<PlaceRender> {
        &self.scope
    }

    #[instrument(skip(self))]
    pub async fn countries(&self) {
        let states = observe(self.repository.countries(), PlaceRender::Countries);
        self.scope.launch("countries", states).await;
    }

    #[instrument(skip(self))]
    pub async fn regions(&self, id_country: &str) {
        let states = observe(self.repository.regions(id_country), PlaceRender::Regions);
        self.scope.launch("regions", states).await;
    }

    /// The series of the place and of its children ordered by confirmed cases.
    #[instrument(skip(self))]
    pub async fn place_stats(&self, id_country: &str, id_region: Option<&str>) {
        let (place, children) = match id_region {
            None => (
                observe(
                    self.repository.country_all_stats(id_country),
                    PlaceRender::CountryStats,
                ),
                observe(
                    self.repository
                        .regions_stats_ordered_by(id_country, Metric::Confirmed),
                    PlaceRender::RegionsStats,
                ),
            ),
            Some(id_region) => (
                observe(
                    self.repository.region_all_stats(id_country, id_region),
                    PlaceRender::RegionStats,
                ),
                observe(
                    self.repository.sub_regions_stats_ordered_by(
                        id_country,
                        id_region,
                        Metric::Confirmed,
                    ),
                    PlaceRender::SubRegionsStats,
                ),
            ),
        };

        self.scope.launch("list/place", place).await;
        self.scope.launch("list/children", children).await;
    }

    /// Bars of the place's own series, then bars of its children by confirmed cases.
    #[instrument(skip(self))]
    pub async fn bar_chart_stats(&self, id_country: &str, id_region: Option<&str>) {
        let (place, children) = match id_region {
            None => (
                observe(
                    self.repository.country_all_stats(id_country),
                    PlaceRender::CountryStatsBarChart,
                ),
                observe(
                    self.repository
                        .regions_stats_ordered_by(id_country, Metric::Confirmed),
                    PlaceRender::RegionsStatsBarChart,
                ),
            ),
            Some(id_region) => (
                observe(
                    self.repository.region_all_stats(id_country, id_region),
                    PlaceRender::RegionStatsBarChart,
                ),
                observe(
                    self.repository.sub_regions_stats_ordered_by(
                        id_country,
                        id_region,
                        Metric::Confirmed,
                    ),
                    PlaceRender::SubRegionsStatsBarChart,
                ),
            ),
        };

        self.scope.launch("bar_chart/place", place).await;
        self.scope.launch("bar_chart/children", children).await;
    }

    /// Totals of the place on the most recent date, and the share of them each child holds.
    #[instrument(skip(self))]
    pub async fn pie_chart_stats(&self, id_country: &str, id_region: Option<&str>) {
        let (place, children) = match id_region {
            None => (
                observe(
                    self.repository.country_last_stats(id_country),
                    |country: CountryOneDayStats| {
                        PlaceRender::PlaceTotalStatsPieChart(country.stats)
                    },
                ),
                observe(
                    self.repository.regions_shares(id_country),
                    PlaceRender::RegionsStatsPieChart,
                ),
            ),
            Some(id_region) => (
                observe(
                    self.repository.region_last_stats(id_country, id_region),
                    |region: RegionOneDayStats| PlaceRender::PlaceTotalStatsPieChart(region.stats),
                ),
                observe(
                    self.repository.sub_regions_shares(id_country, id_region),
                    PlaceRender::SubRegionsStatsPieChart,
                ),
            ),
        };

        self.scope.launch("pie_chart/place", place).await;
        self.scope.launch("pie_chart/children", children).await;
    }

    /// One line chart per metric with the children that have the most of it.
    #[instrument(skip(self))]
    pub async fn line_chart_stats(&self, id_country: &str, id_region: Option<&str>) {
        for metric in Metric::ALL {
            let states = match id_region {
                None => observe(
                    self.repository.regions_with_most(id_country, metric, self.top),
                    move |regions| PlaceRender::RegionsStatsLineChart { metric, regions },
                ),
                Some(id_region) => observe(
                    self.repository
                        .sub_regions_with_most(id_country, id_region, metric, self.top),
                    move |sub_regions| PlaceRender::SubRegionsStatsLineChart {
                        metric,
                        sub_regions,
                    },
                ),
            };

            self.scope.launch(&line_chart_key(metric), states).await;
        }
    }

    pub async fn close(&self) {
        tracing::info!("closing the place screen");
        self.scope.cancel_all().await;
    }
}

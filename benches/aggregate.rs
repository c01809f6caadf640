use std::hint::black_box;

use covid_tracker::aggregate;
use covid_tracker::model::{order_by_latest, Country, CountryWithStats, Metric, Stats};
use criterion::{criterion_group, criterion_main, Criterion};

/// Join rows as the datasource returns them: ordered by date, every country once per date.
fn join_rows(countries: usize, days: usize) -> Vec<(Country, Stats)> {
    let mut rows = Vec::with_capacity(countries * days);
    for day in 0..days {
        for index in 0..countries {
            let id = format!("C{index:03}");
            let country = Country::new(id.clone(), id.clone(), id.clone(), id);
            let stats = Stats {
                date: format!("2020-{:02}-{:02}", day / 28 + 1, day % 28 + 1),
                confirmed: (index * 31 + day * 7) as u64,
                ..Default::default()
            };
            rows.push((country, stats));
        }
    }
    rows
}

fn bench_aggregate(c: &mut Criterion) {
    let rows = join_rows(200, 120);

    c.bench_function("aggregate/series_200x120", |b| {
        b.iter(|| {
            let series: Vec<CountryWithStats> = aggregate::series(black_box(rows.clone()));
            black_box(series)
        })
    });

    c.bench_function("aggregate/ordered_by_confirmed_200x120", |b| {
        b.iter(|| {
            let mut series: Vec<CountryWithStats> = aggregate::series(black_box(rows.clone()));
            order_by_latest(&mut series, Metric::Confirmed);
            black_box(series)
        })
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weather_summary_processor::models::StationLocation;
use weather_summary_processor::processors::{FormatNormalizer, StationResolver, TableParser};
use weather_summary_processor::settings::{ResolverSettings, TableLayout};

// Synthetic daily table with the default layout
fn create_table_text(station_count: usize) -> String {
    let mut text = String::from(
        "Selected UK readings at (L) 0000 and (R) 1200 UTC\n\
         Daily Weather Summary for 15 January 2020\n\
         NO    SITE    WIND DIR    WIND SPEED    VISIBILITY    CLOUD    TEMP\n\
         (L) 0000 UTC    (R) 1200 UTC\n",
    );
    for i in 0..station_count {
        text.push_str(&format!(
            "{}  Test Station {}  SW  {}  25000  {}  {:.1}  W  {}  30000  {}  {:.1}\n",
            3000 + i,
            i,
            i % 30,
            i % 9,
            5.0 + i as f64 * 0.1,
            (i + 3) % 30,
            (i + 1) % 9,
            7.0 + i as f64 * 0.1
        ));
    }
    text.push_str("Met Office\n");
    text
}

fn create_locations(count: usize) -> Vec<StationLocation> {
    (0..count)
        .map(|i| {
            StationLocation::new(
                format!("Test Station {}", i),
                "England".to_string(),
                if i % 4 == 0 { "Manual" } else { "Automatic" }.to_string(),
                50.0 + (i as f64) * 0.01,
                -5.0 + (i as f64) * 0.01,
            )
        })
        .collect()
}

fn benchmark_table_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_parsing");
    let parser = TableParser::new(TableLayout::default()).unwrap();
    let normalizer = FormatNormalizer::new();

    for station_count in [20, 100, 500].iter() {
        let text = create_table_text(*station_count);

        group.bench_with_input(
            BenchmarkId::new("parse_and_normalize", station_count),
            &text,
            |b, text| {
                b.iter(|| {
                    let table = parser.parse(black_box(text)).unwrap();
                    normalizer
                        .normalize(&table, "Daily Weather Summary for 15 January 2020")
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn benchmark_station_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("station_resolution");

    for location_count in [100, 1000].iter() {
        let locations = create_locations(*location_count);
        let resolver = StationResolver::new(&locations, &ResolverSettings::default());
        let names: Vec<String> = (0..50)
            .map(|i| match i % 3 {
                0 => format!("Test Station {}", i),
                1 => format!("TEST STATION {}.", i),
                _ => format!("Test Station {} Airfield", i),
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("resolve_all", location_count),
            &names,
            |b, names| b.iter(|| resolver.resolve_all(black_box(names))),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_table_parsing, benchmark_station_resolution);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dwd_weather::{
    Dataset, DatasetEntry, GeoPoint, InterpolationConfig, Interpolator, Kernel, Modality, Source,
};

/// A grid of synthetic stations over Germany with a smooth temperature field.
fn grid(n: usize) -> Dataset {
    let timestamp = chrono::Utc::now();
    let side = (n as f64).sqrt().ceil() as usize;
    let entries = (0..n)
        .map(|i| {
            let lat = 47.5 + 7.0 * (i / side) as f64 / side as f64;
            let lon = 6.0 + 9.0 * (i % side) as f64 / side as f64;
            let alt = 50.0 + 1500.0 * ((lat * 3.0).sin() * (lon * 2.0).cos()).abs();
            DatasetEntry {
                station_id: i as u32,
                position: GeoPoint::new(lat, lon, alt),
                value: 15.0 - 0.0065 * alt + (lat - 51.0),
                timestamp,
                source: Source::Domestic,
            }
        })
        .collect();
    Dataset::new(Modality::Temperature, entries)
}

fn bench_interpolation(c: &mut Criterion) {
    let query = GeoPoint::new(50.11, 8.68, 112.0);
    let linear = Interpolator::default();
    let gaussian = Interpolator::new(
        InterpolationConfig::builder()
            .kernel(Kernel::Gaussian { epsilon: None })
            .build(),
    );

    for n in [100, 400] {
        let dataset = grid(n);
        c.bench_function(&format!("fit_linear_{}", n), |b| {
            b.iter(|| linear.fit(black_box(&dataset)))
        });
        let model = linear.fit(&dataset).unwrap();
        c.bench_function(&format!("evaluate_linear_{}", n), |b| {
            b.iter(|| model.evaluate(black_box(&query)))
        });
        c.bench_function(&format!("fit_gaussian_{}", n), |b| {
            b.iter(|| gaussian.fit(black_box(&dataset)))
        });
    }
}

criterion_group!(benches, bench_interpolation);
criterion_main!(benches);

use {
    criterion::{black_box, criterion_group, criterion_main, Benchmark, Criterion},
    ndarray::Array2,
    std::{collections::BTreeMap, fmt::Write, fs},
    surge_gauges::{
        gauge::{GaugeRecord, GeoLocation},
        landfall::{LandfallReference, SourceClock},
        reconcile::{reconcile, ReconcileOptions},
        series::{TimeSeries, TimeUnit},
        simulated::load_simulated_gauges,
    },
    tempdir::TempDir,
};

const SAMPLES: usize = 10_000;
const GAUGES: u32 = 4;

fn sources() -> (
    BTreeMap<String, GaugeRecord>,
    BTreeMap<u32, TimeSeries>,
    BTreeMap<usize, Array2<f64>>,
) {
    let mut observed = BTreeMap::new();
    let mut simulated = BTreeMap::new();
    let mut reference = BTreeMap::new();

    for g in 1..=GAUGES {
        let station_id = ((b'V' + g as u8) as char).to_string();
        let days = (0..SAMPLES)
            .map(|k| 250.0 + k as f64 / 1_000.0)
            .collect::<Vec<f64>>();
        let seconds = days.iter().map(|d| d * 86_400.0).collect::<Vec<f64>>();
        let level = days.iter().map(|d| (d - 257.0).sin()).collect::<Vec<f64>>();

        observed.insert(
            station_id.clone(),
            GaugeRecord {
                station_id,
                gauge_no: g,
                location: GeoLocation {
                    latitude: 29.0 + g as f64 / 10.0,
                    longitude: 94.5,
                },
                depth: 1.0,
                series: TimeSeries::from_vecs(days, level.clone()).unwrap(),
                line: 5 + g as usize,
            },
        );
        simulated.insert(g, TimeSeries::from_vecs(seconds.clone(), level.clone()).unwrap());

        let mut table = Array2::<f64>::zeros((SAMPLES, 2));
        for (k, (t, v)) in seconds.iter().zip(level.iter()).enumerate() {
            table[[k, 0]] = *t;
            table[[k, 1]] = *v;
        }
        reference.insert(g as usize, table);
    }

    (observed, simulated, reference)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench(
        "reconcile",
        Benchmark::new("4_gauges_10k", |b| {
            let (observed, simulated, reference) = sources();
            let landfall = LandfallReference {
                observed: SourceClock::new(257.0 * 86_400.0, TimeUnit::Days),
                simulated: SourceClock::new(257.0 * 86_400.0, TimeUnit::Seconds),
                reference: SourceClock::new(257.0 * 86_400.0, TimeUnit::Seconds),
            };
            let options = ReconcileOptions::default();

            b.iter(|| {
                reconcile(
                    black_box(&observed),
                    black_box(&simulated),
                    black_box(&reference),
                    &landfall,
                    &options,
                )
                .unwrap()
            })
        })
        .sample_size(20),
    );

    c.bench(
        "load",
        Benchmark::new("fort_gauge_4x10k", |b| {
            let tempdir = TempDir::new("surge-gauges").unwrap();
            let path = tempdir.path().join("fort.gauge");

            let mut text = String::new();
            for k in 0..SAMPLES {
                for g in 1..=GAUGES {
                    writeln!(
                        text,
                        "{} 1 {:.3} 10.0 0.0 0.0 {:.6} 200.0",
                        g,
                        k as f64 * 10.0,
                        (k as f64 / 100.0).sin()
                    )
                    .unwrap();
                }
            }
            fs::write(&path, text).unwrap();

            b.iter(|| load_simulated_gauges(black_box(&path), 3).unwrap())
        })
        .sample_size(10),
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use std::f64::consts::PI;

use criterion::{Criterion, criterion_group, criterion_main};
use neuroinsights::analysis::connectivity::{
    BandSelection, ConnectivityParams, extract_coherence_features, extract_plv_features,
};
use neuroinsights::analysis::hjorth::extract_hjorth_features;
use neuroinsights::analysis::morlet::{MorletParams, extract_morlet_features};
use neuroinsights::analysis::psd::extract_psd_features;
use neuroinsights::analysis::statistics::{StatisticalParams, extract_statistical_features};
use neuroinsights::analysis::welch::WelchParams;
use neuroinsights::bands::{CONNECTIVITY_BANDS, STANDARD_BANDS};
use neuroinsights::recording::Recording;

const SAMPLE_RATE: f64 = 256.0;
const SECONDS: usize = 10;
const CHANNELS: usize = 8;

fn synthetic_recording() -> Recording {
    let n = SECONDS * SAMPLE_RATE as usize;
    let data = (0..CHANNELS)
        .map(|c| {
            (0..n)
                .map(|t| {
                    let time = t as f64 / SAMPLE_RATE;
                    (2.0 * PI * (6.0 + c as f64) * time).sin()
                        + 0.3 * (2.0 * PI * 21.0 * time + c as f64).cos()
                })
                .collect()
        })
        .collect();
    let names = (0..CHANNELS).map(|c| format!("E{c}")).collect();
    Recording::new(names, SAMPLE_RATE, data).expect("valid recording")
}

fn bench_extractors(c: &mut Criterion) {
    let recording = synthetic_recording();
    let welch = WelchParams::default();
    let connectivity = ConnectivityParams::default();

    c.bench_function("statistical", |b| {
        b.iter(|| extract_statistical_features(&recording, &StatisticalParams::default()))
    });
    c.bench_function("psd_welch", |b| {
        b.iter(|| extract_psd_features(&recording, &STANDARD_BANDS, &welch).expect("psd"))
    });
    c.bench_function("hjorth", |b| {
        b.iter(|| extract_hjorth_features(&recording, &welch, 64).expect("hjorth"))
    });
    c.bench_function("morlet_1_50hz", |b| {
        b.iter(|| {
            extract_morlet_features(&recording, &STANDARD_BANDS, &MorletParams::default())
                .expect("morlet")
        })
    });
    c.bench_function("plv_all_bands", |b| {
        b.iter(|| {
            extract_plv_features(&recording, BandSelection::All(&CONNECTIVITY_BANDS), &connectivity)
                .expect("plv")
        })
    });
    c.bench_function("coherence_all_bands", |b| {
        b.iter(|| {
            extract_coherence_features(
                &recording,
                BandSelection::All(&CONNECTIVITY_BANDS),
                &connectivity,
            )
            .expect("coherence")
        })
    });
}

criterion_group!(benches, bench_extractors);
criterion_main!(benches);

use std::f64::consts::PI;

use neuroinsights::recording::Recording;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SAMPLE_RATE: f64 = 256.0;

pub fn sine(freq: f64, amplitude: f64, n_samples: usize) -> Vec<f64> {
    (0..n_samples)
        .map(|t| amplitude * (2.0 * PI * freq * t as f64 / SAMPLE_RATE).sin())
        .collect()
}

/// Uniform white noise in `[-amplitude, amplitude]`.
pub fn noise(rng: &mut StdRng, amplitude: f64, n_samples: usize) -> Vec<f64> {
    (0..n_samples)
        .map(|_| amplitude * (2.0 * rng.random::<f64>() - 1.0))
        .collect()
}

pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Four channels, two seconds: a 10 Hz sine on `Fp1`, noise elsewhere.
pub fn alpha_recording(seed: u64) -> Recording {
    let n = 2 * SAMPLE_RATE as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![add(&sine(10.0, 1.0, n), &noise(&mut rng, 0.05, n))];
    for _ in 1..4 {
        data.push(noise(&mut rng, 0.5, n));
    }
    let names = ["Fp1", "Fp2", "C3", "C4"].map(String::from).to_vec();
    Recording::new(names, SAMPLE_RATE, data).unwrap()
}

/// Two channels; POST sessions carry a stronger 20 Hz rhythm.
pub fn session_recording(seed: u64, post: bool) -> Recording {
    let n = 2 * SAMPLE_RATE as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let beta = if post { 2.0 } else { 0.2 };
    let data = (0..2)
        .map(|_| add(&sine(20.0, beta, n), &noise(&mut rng, 0.3, n)))
        .collect();
    Recording::new(vec!["Cz".to_string(), "Pz".to_string()], SAMPLE_RATE, data).unwrap()
}

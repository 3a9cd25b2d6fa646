mod support;

use neuroinsights::dataset::{DatasetLoader, LoadOptions};
use neuroinsights::features::SessionTag;
use neuroinsights::ml::artifact::ModelArtifact;
use neuroinsights::ml::metrics::BinaryMetrics;
use neuroinsights::ml::registry::{ModelKind, ModelOptions};
use neuroinsights::pipeline::{ExtractionSettings, ExtractionStep, extract_session};
use neuroinsights::store::{FeatureStore, NewSession};
use tempfile::tempdir;

use support::signals::session_recording;

fn settings() -> ExtractionSettings {
    ExtractionSettings {
        steps: vec![
            ExtractionStep::Statistical,
            ExtractionStep::Temporal,
            ExtractionStep::Hjorth,
            ExtractionStep::Psd,
            ExtractionStep::BandPower,
            ExtractionStep::Plv,
            ExtractionStep::Coherence,
        ],
        ..ExtractionSettings::default()
    }
}

/// Four PRE and four POST sessions, extracted and stored.
fn populated_store(path: &std::path::Path) -> FeatureStore {
    let store = FeatureStore::open(path).unwrap();
    for idx in 0..8u64 {
        let post = idx % 2 == 1;
        let filename = format!("p{idx}.json");
        let session_id = store
            .register_session(&NewSession {
                participant_id: Some(idx as i64),
                session_number: Some(1),
                recording_filename: filename.clone(),
                eyes_state: Some("C".to_string()),
                cognitive_load_status: Some(if post { "POST" } else { "PRE" }.to_string()),
            })
            .unwrap();
        let tag = SessionTag::new(session_id, filename);
        let features = extract_session(&tag, &session_recording(idx, post), &settings()).unwrap();
        store
            .replace_session_features(
                session_id,
                &features.statistical,
                &features.tfr,
                &features.connectivity,
            )
            .unwrap();
    }
    store
}

#[test]
fn extracted_rows_round_trip_through_the_store() {
    let dir = tempdir().unwrap();
    let store = populated_store(&dir.path().join("features.db"));
    let sessions = store.list_sessions().unwrap();
    assert_eq!(sessions.len(), 8);

    let first = sessions[0].session_id;
    assert_eq!(store.statistical_rows(first).unwrap().len(), 2);
    assert_eq!(store.tfr_rows(first).unwrap().len(), 2 * 6);
    let connectivity = store.connectivity_rows(first).unwrap();
    assert_eq!(connectivity.len(), 5);
    assert!(connectivity.iter().all(|row| row.channel_1 == "Cz" && row.channel_2 == "Pz"));
    // Morlet was not run, so its NaN sentinel comes back as NaN
    assert!(store.tfr_rows(first).unwrap()[0].power_tfr_morlet.is_nan());
}

#[test]
fn re_extraction_replaces_rows_instead_of_duplicating() {
    let dir = tempdir().unwrap();
    let store = populated_store(&dir.path().join("features.db"));
    let session = store.list_sessions().unwrap()[0].clone();
    let tag = SessionTag::new(session.session_id, session.recording_filename.clone());
    let features = extract_session(&tag, &session_recording(0, false), &settings()).unwrap();
    store
        .replace_session_features(
            session.session_id,
            &features.statistical,
            &features.tfr,
            &features.connectivity,
        )
        .unwrap();
    assert_eq!(store.tfr_rows(session.session_id).unwrap().len(), 12);
}

#[test]
fn loader_split_trains_a_model_that_reloads() {
    let dir = tempdir().unwrap();
    let store = populated_store(&dir.path().join("features.db"));
    let options = LoadOptions::default();
    let split = DatasetLoader::new(&store).load_features(&options).unwrap();

    // 8 sessions × 2 channels × 6 bands joined rows
    let total = 96;
    assert_eq!(split.y_test.len(), (total as f64 * options.test_size).ceil() as usize);
    assert_eq!(split.x_train.n_rows() + split.x_test.n_rows(), total);
    assert_eq!(split.x_train.n_rows(), split.y_train.len());
    for column in ["session_id", "channel", "band", "recording_filename", "cognitive_load_status"] {
        assert!(split.x_train.column_index(column).is_none(), "{column} leaked into features");
    }
    let mean = split.x_train.column("band_power").unwrap().iter().sum::<f64>();
    assert!(mean.is_finite());

    let model = ModelKind::LogisticRegression
        .train(&split.x_train, &split.y_train, &ModelOptions::default())
        .unwrap();
    let metrics = BinaryMetrics::evaluate(&split.y_test, &model.predict_matrix(&split.x_test));
    assert_eq!(metrics.n_samples, split.y_test.len());
    assert!((0.0..=1.0).contains(&metrics.accuracy));

    let path = dir.path().join("model.json");
    let artifact = ModelArtifact::new(split.x_train.columns.clone(), split.scaler.clone(), model)
        .unwrap()
        .with_metrics(metrics);
    artifact.save_json(&path).unwrap();
    let loaded = ModelArtifact::load_json(&path).unwrap();
    assert_eq!(loaded.feature_columns, split.x_train.columns);
    assert_eq!(loaded.kind(), ModelKind::LogisticRegression);
}

#[test]
fn identical_seeds_give_identical_splits() {
    let dir = tempdir().unwrap();
    let store = populated_store(&dir.path().join("features.db"));
    let loader = DatasetLoader::new(&store);
    let a = loader.load_features(&LoadOptions::default()).unwrap();
    let b = loader.load_features(&LoadOptions::default()).unwrap();
    assert_eq!(a.y_test, b.y_test);
    assert_eq!(a.x_test.values.shape(), b.x_test.values.shape());
}

#[test]
fn unlabeled_session_fails_the_load() {
    let dir = tempdir().unwrap();
    let store = populated_store(&dir.path().join("features.db"));
    let session_id = store
        .register_session(&NewSession {
            recording_filename: "unlabeled.json".to_string(),
            cognitive_load_status: Some("MID".to_string()),
            ..NewSession::default()
        })
        .unwrap();
    let tag = SessionTag::new(session_id, "unlabeled.json");
    let features = extract_session(&tag, &session_recording(99, false), &settings()).unwrap();
    store
        .replace_session_features(
            session_id,
            &features.statistical,
            &features.tfr,
            &features.connectivity,
        )
        .unwrap();
    assert!(DatasetLoader::new(&store).load_features(&LoadOptions::default()).is_err());
}

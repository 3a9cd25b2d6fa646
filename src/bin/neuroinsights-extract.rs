//! Extract features from JSON recordings and store them per session.

use std::path::{Path, PathBuf};

use neuroinsights::config::{self, Settings};
use neuroinsights::features::SessionTag;
use neuroinsights::logging;
use neuroinsights::pipeline::{
    ExtractionStep, JsonRecordingLoader, SessionJob, TracingReporter, process_batch,
};
use neuroinsights::store::{FeatureStore, NewSession};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(steps) = &options.steps {
        settings.extraction.steps =
            ExtractionStep::parse_list(steps).map_err(|err| err.to_string())?;
    }
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let recordings = collect_recordings(&options.recordings, options.manifest.as_deref())?;
    if recordings.is_empty() {
        return Err(format!("No .json recordings found at {}", options.recordings.display()));
    }
    let manifest = match &options.manifest {
        Some(path) => read_manifest(path)?,
        None => Vec::new(),
    };

    let db_path = resolve_db_path(&options, &settings)?;
    let store = FeatureStore::open(&db_path).map_err(|err| err.to_string())?;
    let mut jobs = Vec::with_capacity(recordings.len());
    for path in recordings {
        let session = session_for(&path, &manifest);
        let session_id = store.register_session(&session).map_err(|err| err.to_string())?;
        jobs.push(SessionJob {
            tag: SessionTag::new(session_id, session.recording_filename),
            path,
        });
    }

    let summary = process_batch(
        &jobs,
        &JsonRecordingLoader,
        &settings.extraction,
        &TracingReporter,
    );
    for features in &summary.results {
        store
            .replace_session_features(
                features.tag.session_id,
                &features.statistical,
                &features.tfr,
                &features.connectivity,
            )
            .map_err(|err| err.to_string())?;
    }

    println!(
        "extracted {} of {} recordings into {}",
        summary.results.len(),
        jobs.len(),
        db_path.display()
    );
    for failure in &summary.failures {
        println!("  failed {}: {}", failure.tag.recording_filename, failure.error);
    }
    if summary.results.is_empty() {
        return Err("Every recording failed".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    recordings: PathBuf,
    db: Option<PathBuf>,
    config: Option<PathBuf>,
    steps: Option<String>,
    manifest: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut recordings: Option<PathBuf> = None;
    let mut db = None;
    let mut config = None;
    let mut steps = None;
    let mut manifest = None;

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--recordings" | "--db" | "--config" | "--steps" | "--manifest" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--recordings" => recordings = Some(PathBuf::from(value)),
                    "--db" => db = Some(PathBuf::from(value)),
                    "--config" => config = Some(PathBuf::from(value)),
                    "--steps" => steps = Some(value.clone()),
                    _ => manifest = Some(PathBuf::from(value)),
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        recordings: recordings.ok_or_else(help_text)?,
        db,
        config,
        steps,
        manifest,
    })
}

fn help_text() -> String {
    [
        "neuroinsights-extract",
        "",
        "Extract EEG features from JSON recordings into the feature database.",
        "",
        "Usage:",
        "  neuroinsights-extract --recordings <file-or-dir> [--db <path>] [--config <path>]",
        "                        [--steps statistical,psd,...] [--manifest <sessions.json>]",
        "",
        "Options:",
        "  --recordings  A recording file or a directory of *.json recordings.",
        "  --db          Feature database (default: from config, else the app directory).",
        "  --config      Settings file (default: config.toml in the app directory).",
        "  --steps       Comma separated steps: statistical, temporal, hjorth, psd,",
        "                band_power, morlet, plv, coherence.",
        "  --manifest    JSON list of session metadata keyed by recording_filename.",
    ]
    .join("\n")
}

fn resolve_db_path(options: &CliOptions, settings: &Settings) -> Result<PathBuf, String> {
    match &options.db {
        Some(path) => Ok(path.clone()),
        None => settings.database_path().map_err(|err| err.to_string()),
    }
}

fn collect_recordings(path: &Path, manifest: Option<&Path>) -> Result<Vec<PathBuf>, String> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries = std::fs::read_dir(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|file| {
            file.is_file() && file.extension().and_then(|ext| ext.to_str()) == Some("json")
        })
        .filter(|file| manifest.is_none_or(|manifest| !same_file(file, manifest)))
        .collect();
    files.sort();
    Ok(files)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn read_manifest(path: &Path) -> Result<Vec<NewSession>, String> {
    let bytes =
        std::fs::read(path).map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| format!("Invalid manifest {}: {err}", path.display()))
}

fn session_for(path: &Path, manifest: &[NewSession]) -> NewSession {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    manifest
        .iter()
        .find(|session| session.recording_filename == filename)
        .cloned()
        .unwrap_or_else(|| NewSession {
            recording_filename: filename,
            ..NewSession::default()
        })
}

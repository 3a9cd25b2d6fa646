//! Train a baseline PRE/POST classifier on stored features and export it.

use std::path::PathBuf;

use neuroinsights::config;
use neuroinsights::dataset::DatasetLoader;
use neuroinsights::logging;
use neuroinsights::ml::BINARY_CLASSES;
use neuroinsights::ml::artifact::ModelArtifact;
use neuroinsights::ml::metrics::BinaryMetrics;
use neuroinsights::ml::registry::ModelKind;
use neuroinsights::store::FeatureStore;

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
    if let Some(kind) = options.model {
        settings.model.kind = kind;
    }
    if let Some(label_column) = &options.label_column {
        settings.dataset.label_column = label_column.clone();
    }
    if let Some(test_size) = options.test_size {
        settings.dataset.test_size = test_size;
    }
    if let Some(seed) = options.seed {
        settings.dataset.random_state = seed;
        settings.model.options.logistic_regression.seed = seed;
    }
    if let Err(err) = logging::init(&settings.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let db_path = match &options.db {
        Some(path) => path.clone(),
        None => settings.database_path().map_err(|err| err.to_string())?,
    };
    let store = FeatureStore::open(&db_path).map_err(|err| err.to_string())?;
    let split = DatasetLoader::new(&store)
        .load_features(&settings.dataset)
        .map_err(|err| err.to_string())?;

    let kind = settings.model.kind;
    let model = kind
        .train(&split.x_train, &split.y_train, &settings.model.options)
        .map_err(|err| err.to_string())?;
    let proba = model.predict_matrix(&split.x_test);
    let metrics = BinaryMetrics::evaluate(&split.y_test, &proba);

    let artifact = ModelArtifact::new(split.x_train.columns.clone(), split.scaler, model)
        .map_err(|err| err.to_string())?
        .with_metrics(metrics.clone());
    artifact.save_json(&options.out).map_err(|err| err.to_string())?;
    if let Some(report) = &options.report {
        let json = serde_json::to_vec_pretty(&metrics).map_err(|err| err.to_string())?;
        std::fs::write(report, json)
            .map_err(|err| format!("Failed to write {}: {err}", report.display()))?;
    }

    print_metrics(kind, split.y_train.len(), &metrics);
    println!("model written to {}", options.out.display());
    Ok(())
}

fn print_metrics(kind: ModelKind, n_train: usize, metrics: &BinaryMetrics) {
    println!("model: {kind}  train rows: {n_train}  test rows: {}", metrics.n_samples);
    println!("test accuracy: {:.4}", metrics.accuracy);
    match metrics.roc_auc {
        Some(auc) => println!("roc auc: {auc:.4}"),
        None => println!("roc auc: n/a (single class in test set)"),
    }
    println!("log loss: {:.4}", metrics.log_loss);
    for (name, stats) in BINARY_CLASSES.iter().zip(&metrics.per_class) {
        println!(
            "class {:<5} precision={:.3}  recall={:.3}  f1={:.3}  support={}",
            name, stats.precision, stats.recall, stats.f1, stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for row in &metrics.confusion {
        let line: String = row.iter().map(|count| format!("{count:6}")).collect();
        println!("{line}");
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    db: Option<PathBuf>,
    config: Option<PathBuf>,
    out: PathBuf,
    report: Option<PathBuf>,
    model: Option<ModelKind>,
    label_column: Option<String>,
    test_size: Option<f64>,
    seed: Option<u64>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        db: None,
        config: None,
        out: PathBuf::from("model.json"),
        report: None,
        model: None,
        label_column: None,
        test_size: None,
        seed: None,
    };

    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if matches!(flag, "-h" | "--help") {
            return Err(help_text());
        }
        idx += 1;
        let value = args.get(idx).ok_or_else(|| format!("{flag} requires a value"))?;
        match flag {
            "--db" => options.db = Some(PathBuf::from(value)),
            "--config" => options.config = Some(PathBuf::from(value)),
            "--out" => options.out = PathBuf::from(value),
            "--report" => options.report = Some(PathBuf::from(value)),
            "--model" => {
                options.model = Some(value.parse::<ModelKind>().map_err(|err| err.to_string())?)
            }
            "--label-column" => options.label_column = Some(value.clone()),
            "--test-size" => {
                options.test_size = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --test-size value: {value}"))?,
                )
            }
            "--seed" => {
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                )
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "neuroinsights-train",
        "",
        "Train a PRE/POST classifier on the stored features and export a model artifact.",
        "",
        "Usage:",
        "  neuroinsights-train [--db <path>] [--config <path>] [--model <kind>]",
        "                      [--out <model.json>] [--report <metrics.json>]",
        "                      [--label-column <name>] [--test-size <0..1>] [--seed <n>]",
        "",
        "Models: logistic_regression (default), gradient_boosting.",
    ]
    .join("\n")
}

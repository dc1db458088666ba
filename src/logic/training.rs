//! Training Pipeline - CSV to Artifact Bundle
//!
//! ## Steps (order matters)
//! 1. Pick the target column and split features from labels
//! 2. Seeded split, `ceil(n * test_size)` rows held out
//! 3. Fit encoders on train ∪ held-out categorical values, encode both splits
//! 4. Fit the scaler on the encoded train split, scale both splits
//! 5. Fit the classifier, score it on the held-out split
//!
//! `train` persists the result as a bundle; `compare` scores several model families on
//! the same preprocessing and writes nothing.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::{error, info, warn};

use crate::constants::{DEFAULT_ARTIFACT_PATH, DEFAULT_TARGET_COLUMN, DEFAULT_TEST_SIZE, DEFAULT_TRAIN_DATA};
use crate::error::{DetectError, DetectResult};
use crate::logic::bundle::{ArtifactBundle, BundleHeader};
use crate::logic::dataset::{load_csv, train_test_split, Table};
use crate::logic::features::{encode_table, fit_encoders, EncoderRegistry, FeatureLayout, StandardScaler};
use crate::logic::model::{ClassificationReport, ModelConfig, ModelKind, TrainedModel};

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub model: ModelKind,
    pub test_size: f64,
    pub model_config: ModelConfig,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_TRAIN_DATA),
            output: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            model: ModelKind::RandomForest,
            test_size: DEFAULT_TEST_SIZE,
            model_config: ModelConfig::default(),
        }
    }
}

// ============================================================================
// PREPARATION
// ============================================================================

/// Encoded and scaled splits plus the fitted preprocessing state
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub layout: FeatureLayout,
    pub encoders: EncoderRegistry,
    pub scaler: StandardScaler,
    pub x_train: Array2<f64>,
    pub y_train: Vec<String>,
    pub x_test: Array2<f64>,
    pub y_test: Vec<String>,
}

/// Run steps 1-4 on a loaded table
pub fn prepare(table: Table, test_size: f64, seed: u64) -> DetectResult<PreparedData> {
    let target = table
        .target_column()
        .ok_or_else(|| DetectError::ColumnNotFound(DEFAULT_TARGET_COLUMN.to_string()))?;
    let (features, labels) = table.split_target(&target)?;

    if features.n_cols() == 0 {
        return Err(DetectError::Model("dataset has no feature columns".to_string()));
    }
    if features.n_rows() < 2 {
        return Err(DetectError::Model(format!(
            "need at least 2 rows to train, got {}",
            features.n_rows()
        )));
    }

    let split = train_test_split(features.n_rows(), test_size, seed);
    let train = features.take_rows(&split.train);
    let held_out = features.take_rows(&split.test);
    let y_train: Vec<String> = split.train.iter().map(|&i| labels[i].clone()).collect();
    let y_test: Vec<String> = split.test.iter().map(|&i| labels[i].clone()).collect();

    let layout = FeatureLayout::new(features.column_names(), features.categorical_columns());
    info!(
        target = %target,
        features = layout.feature_count(),
        categorical = ?layout.categorical_cols,
        train_rows = train.n_rows(),
        held_out_rows = held_out.n_rows(),
        "Prepared training data"
    );

    let encoders = fit_encoders(&train, &held_out, &layout)?;
    let encoded_train = encode_table(&train, &layout, &encoders)?;
    let encoded_test = encode_table(&held_out, &layout, &encoders)?;

    let (scaler, x_train) = StandardScaler::fit_transform(&encoded_train)?;
    let x_test = scaler.transform(&encoded_test)?;

    Ok(PreparedData {
        layout,
        encoders,
        scaler,
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

// ============================================================================
// TRAIN
// ============================================================================

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub header: BundleHeader,
    pub model: ModelKind,
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub held_out_rows: usize,
}

/// Fit `kind` on prepared data and package it with the preprocessing state
pub fn fit_bundle(
    prepared: &PreparedData,
    kind: ModelKind,
    config: &ModelConfig,
) -> DetectResult<(ArtifactBundle, ClassificationReport)> {
    let model = TrainedModel::fit(kind, config, &prepared.x_train, &prepared.y_train)?;
    let predicted = model.predict(&prepared.x_test)?;
    let report = ClassificationReport::new(&prepared.y_test, &predicted);

    let bundle = ArtifactBundle::new(
        model,
        prepared.scaler.clone(),
        prepared.encoders.clone(),
        prepared.layout.clone(),
        report.accuracy,
    );
    Ok((bundle, report))
}

/// Load, prepare, fit, evaluate and save
pub fn train(options: &TrainingOptions) -> DetectResult<TrainingSummary> {
    let table = load_csv(&options.input)?;
    let prepared = prepare(table, options.test_size, options.model_config.seed)?;

    info!(model = %options.model, "Training model");
    let (bundle, report) = fit_bundle(&prepared, options.model, &options.model_config)?;
    info!(accuracy = report.accuracy, "Model accuracy: {:.4}", report.accuracy);
    info!("Classification report\n{}", report);

    let header = bundle.save(&options.output)?;

    Ok(TrainingSummary {
        header,
        model: options.model,
        accuracy: report.accuracy,
        report,
        train_rows: prepared.x_train.nrows(),
        held_out_rows: prepared.x_test.nrows(),
    })
}

// ============================================================================
// COMPARE
// ============================================================================

/// Held-out accuracy of one model family
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    pub model: ModelKind,
    pub accuracy: f64,
}

/// Fit and score each model; failures are logged and skipped
pub fn evaluate_models(prepared: &PreparedData, kinds: &[ModelKind], config: &ModelConfig) -> Vec<ModelScore> {
    let mut scores = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        info!(model = %kind, "Training model");
        let result = TrainedModel::fit(kind, config, &prepared.x_train, &prepared.y_train)
            .and_then(|model| model.predict(&prepared.x_test));

        match result {
            Ok(predicted) => {
                let report = ClassificationReport::new(&prepared.y_test, &predicted);
                info!(model = %kind, accuracy = report.accuracy, "{} Accuracy: {:.4}", kind, report.accuracy);
                scores.push(ModelScore { model: kind, accuracy: report.accuracy });
            }
            Err(e) => {
                error!(model = %kind, "Error training {}: {}", kind, e);
            }
        }
    }

    if scores.is_empty() {
        warn!("No model completed training");
    }
    scores
}

/// Score the comparison models on `input`
pub fn compare(input: &Path, test_size: f64, config: &ModelConfig) -> DetectResult<Vec<ModelScore>> {
    let table = load_csv(input)?;
    let prepared = prepare(table, test_size, config.seed)?;
    Ok(evaluate_models(&prepared, &ModelKind::COMPARISON, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::Column;
    use tempfile::tempdir;

    /// Two well separated traffic profiles
    fn traffic_table(n: usize) -> Table {
        let mut duration = Vec::with_capacity(n);
        let mut src_bytes = Vec::with_capacity(n);
        let mut protocol = Vec::with_capacity(n);
        let mut class = Vec::with_capacity(n);
        for i in 0..n {
            let jitter = (i % 5) as f64 * 0.1;
            if i % 2 == 0 {
                duration.push(1.0 + jitter);
                src_bytes.push(200.0 + jitter * 10.0);
                protocol.push("tcp");
                class.push("normal");
            } else {
                duration.push(0.0 + jitter * 0.5);
                src_bytes.push(5000.0 + jitter * 300.0);
                protocol.push(if i % 3 == 0 { "udp" } else { "icmp" });
                class.push("neptune");
            }
        }

        Table::new(vec![
            Column::numeric("duration", duration),
            Column::text("protocol_type", &protocol),
            Column::numeric("src_bytes", src_bytes),
            Column::text("class", &class),
        ])
        .unwrap()
    }

    fn write_csv(path: &Path, n: usize) {
        let mut text = String::from("duration,protocol_type,src_bytes,class\n");
        let table = traffic_table(n);
        for row in 0..n {
            let record = table.record(row).unwrap();
            text.push_str(&format!(
                "{},{},{},{}\n",
                record["duration"], record["protocol_type"], record["src_bytes"], record["class"]
            ));
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_prepare_shapes_and_layout() {
        let prepared = prepare(traffic_table(20), 0.2, 42).unwrap();

        assert_eq!(prepared.layout.feature_names, vec!["duration", "protocol_type", "src_bytes"]);
        assert_eq!(prepared.layout.categorical_cols, vec!["protocol_type"]);
        assert_eq!(prepared.x_train.shape(), &[16, 3]);
        assert_eq!(prepared.x_test.shape(), &[4, 3]);
        assert_eq!(prepared.y_train.len(), 16);
        assert_eq!(prepared.encoders.get("protocol_type").unwrap().classes(), &["icmp", "tcp", "udp"]);

        // Scaled training columns are centered
        for col in prepared.x_train.columns() {
            assert!(col.mean().unwrap().abs() < 1e-9);
        }
    }

    #[test]
    fn test_prepare_is_reproducible() {
        let a = prepare(traffic_table(30), 0.2, 7).unwrap();
        let b = prepare(traffic_table(30), 0.2, 7).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.x_test, b.x_test);
    }

    #[test]
    fn test_fit_bundle_scores_held_out() {
        let prepared = prepare(traffic_table(40), 0.2, 42).unwrap();
        let config = ModelConfig { seed: 42, n_estimators: 10, ..ModelConfig::default() };
        let (bundle, report) = fit_bundle(&prepared, ModelKind::RandomForest, &config).unwrap();

        assert_eq!(report.support, 8);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(bundle.accuracy, report.accuracy);
        assert_eq!(bundle.layout(), prepared.layout);
    }

    #[test]
    fn test_train_writes_bundle() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("train.csv");
        let output = dir.path().join("out").join("model_artifacts.json");
        write_csv(&input, 30);

        let options = TrainingOptions {
            input,
            output: output.clone(),
            model_config: ModelConfig { seed: 42, n_estimators: 5, ..ModelConfig::default() },
            ..TrainingOptions::default()
        };
        let summary = train(&options).unwrap();

        assert!(output.exists());
        assert_eq!(summary.train_rows + summary.held_out_rows, 30);
        let (_, bundle) = ArtifactBundle::load(&output).unwrap();
        assert_eq!(bundle.accuracy, summary.accuracy);
    }

    #[test]
    fn test_train_missing_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("model_artifacts.json");
        let options = TrainingOptions {
            input: dir.path().join("Train_data.csv"),
            output: output.clone(),
            ..TrainingOptions::default()
        };

        let err = train(&options).unwrap_err();
        assert!(matches!(err, DetectError::InputNotFound(_)));
        assert!(err.to_string().ends_with("Train_data.csv not found."));
        assert!(!output.exists());
    }

    #[test]
    fn test_train_rejects_empty_numeric_cell() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("train.csv");
        let output = dir.path().join("model_artifacts.json");
        let mut text = String::from("duration,protocol_type,src_bytes,class\n");
        for i in 0..12 {
            let src_bytes = if i == 5 { String::new() } else { (100 + i).to_string() };
            let class = if i % 2 == 0 { "normal" } else { "neptune" };
            text.push_str(&format!("{},tcp,{},{}\n", i, src_bytes, class));
        }
        std::fs::write(&input, text).unwrap();

        let options = TrainingOptions {
            input,
            output: output.clone(),
            model_config: ModelConfig { seed: 42, n_estimators: 5, ..ModelConfig::default() },
            ..TrainingOptions::default()
        };
        let err = train(&options).unwrap_err();

        assert!(matches!(err, DetectError::InvalidFeature { ref feature, .. } if feature == "src_bytes"));
        assert!(!output.exists());
    }

    #[test]
    fn test_evaluate_models_skips_failures() {
        // Constant column makes every class covariance singular, so QDA fails
        let n = 20;
        let table = Table::new(vec![
            Column::numeric("duration", (0..n).map(|i| (i % 2) as f64 * 10.0 + (i % 7) as f64 * 0.1).collect()),
            Column::numeric("num_outbound_cmds", vec![0.0; n]),
            Column::text(
                "class",
                &(0..n).map(|i| if i % 2 == 0 { "normal" } else { "anomaly" }).collect::<Vec<_>>(),
            ),
        ])
        .unwrap();
        let prepared = prepare(table, 0.2, 42).unwrap();

        let kinds = [ModelKind::NaiveBayes, ModelKind::Qda];
        let unregularized = ModelConfig { reg_param: 0.0, ..ModelConfig::default() };

        let scores = evaluate_models(&prepared, &kinds, &unregularized);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].model, ModelKind::NaiveBayes);
        assert_eq!(scores[0].accuracy, 1.0);

        // Default shrinkage keeps QDA in the comparison
        let scores = evaluate_models(&prepared, &kinds, &ModelConfig::default());
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[1].model, ModelKind::Qda);
        assert_eq!(scores[1].accuracy, 1.0);
    }
}

//! Central Configuration Constants
//!
//! Single source of truth for defaults shared by the trainer and the server.

/// Target column used when the training CSV carries one
pub const DEFAULT_TARGET_COLUMN: &str = "class";

/// Text stored for an empty cell, and the category a `null` value is looked up as
pub const MISSING_TEXT: &str = "nan";

/// Labeled training data
pub const DEFAULT_TRAIN_DATA: &str = "Train_data.csv";

/// Unlabeled traffic replayed by `/simulate`
pub const DEFAULT_SIMULATION_DATA: &str = "Test_data.csv";

/// Where the trainer writes and the server reads the artifact bundle
pub const DEFAULT_ARTIFACT_PATH: &str = "artifacts/model_artifacts.json";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Fraction of rows held out for evaluation
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Seed for splits and estimators
pub const DEFAULT_SEED: u64 = 42;

/// Trees in the default random forest
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Diagonal shrinkage for QDA covariances; keeps constant columns from making them singular
pub const DEFAULT_QDA_REG_PARAM: f64 = 1e-6;

/// Training label of benign traffic.
///
/// Status is derived by exact string equality with this value, so it only works when
/// the training data spells the benign class exactly this way.
pub const BENIGN_LABEL: &str = "normal";

/// Status reported for benign predictions
pub const STATUS_SAFE: &str = "Safe";

/// Status reported for every other label
pub const STATUS_THREAT: &str = "Threat Detected";

/// Liveness reported by `GET /`
pub const SERVICE_ACTIVE: &str = "active";

/// Reported in place of the accuracy when no bundle is loaded
pub const ACCURACY_UNAVAILABLE: &str = "unavailable";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

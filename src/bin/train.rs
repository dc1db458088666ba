//! Threat Detect trainer
//!
//! `train` fits one model and writes the artifact bundle; `compare` scores the
//! comparison models on the same preprocessing and writes nothing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use threat_detect::constants::{
    DEFAULT_ARTIFACT_PATH, DEFAULT_N_ESTIMATORS, DEFAULT_QDA_REG_PARAM, DEFAULT_SEED, DEFAULT_TEST_SIZE,
    DEFAULT_TRAIN_DATA,
};
use threat_detect::logging;
use threat_detect::logic::model::{ModelConfig, ModelKind};
use threat_detect::logic::training::{self, TrainingOptions};

#[derive(Parser)]
#[command(name = "threat-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and compare network intrusion classifiers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and write the artifact bundle
    Train {
        /// Labeled training CSV
        #[arg(short, long, default_value = DEFAULT_TRAIN_DATA)]
        input: PathBuf,

        /// Bundle output path
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
        output: PathBuf,

        /// Classifier family
        #[arg(short, long, value_enum, default_value_t = ModelKind::RandomForest)]
        model: ModelKind,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
        test_size: f64,

        /// Seed for the split and the estimator
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Trees in the random forest
        #[arg(long, default_value_t = DEFAULT_N_ESTIMATORS)]
        trees: usize,

        /// Depth limit for forest trees
        #[arg(long)]
        max_depth: Option<usize>,

        /// QDA covariance shrinkage in [0, 1]
        #[arg(long, default_value_t = DEFAULT_QDA_REG_PARAM)]
        reg_param: f64,
    },

    /// Score naive Bayes, QDA and MLP on the held-out split
    Compare {
        /// Labeled training CSV
        #[arg(short, long, default_value = DEFAULT_TRAIN_DATA)]
        input: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
        test_size: f64,

        /// Seed for the split and the estimators
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// QDA covariance shrinkage in [0, 1]; 0 fails on collinear features
        #[arg(long, default_value_t = DEFAULT_QDA_REG_PARAM)]
        reg_param: f64,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init("threat_detect=info");

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Commands>) -> anyhow::Result<()> {
    let command = command.unwrap_or(Commands::Train {
        input: PathBuf::from(DEFAULT_TRAIN_DATA),
        output: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        model: ModelKind::RandomForest,
        test_size: DEFAULT_TEST_SIZE,
        seed: DEFAULT_SEED,
        trees: DEFAULT_N_ESTIMATORS,
        max_depth: None,
        reg_param: DEFAULT_QDA_REG_PARAM,
    });

    match command {
        Commands::Train { input, output, model, test_size, seed, trees, max_depth, reg_param } => {
            let options = TrainingOptions {
                input,
                output,
                model,
                test_size,
                model_config: ModelConfig { seed, n_estimators: trees, max_depth, reg_param },
            };
            let summary = training::train(&options)?;

            println!("Model: {}", summary.model);
            println!("Rows: {} train / {} held out", summary.train_rows, summary.held_out_rows);
            println!("Model Accuracy: {:.4}", summary.accuracy);
            println!();
            println!("{}", summary.report);
            println!();
            println!("Bundle {} saved to {}", summary.header.bundle_id, options.output.display());
        }
        Commands::Compare { input, test_size, seed, reg_param } => {
            let config = ModelConfig { seed, reg_param, ..ModelConfig::default() };
            let scores = training::compare(&input, test_size, &config)?;

            println!("{:<20} {:>10}", "Model", "Accuracy");
            println!("{}", "-".repeat(31));
            for score in &scores {
                println!("{:<20} {:>10.4}", score.model.display_name(), score.accuracy);
            }
            if scores.is_empty() {
                println!("No model completed training");
            }
        }
    }

    Ok(())
}

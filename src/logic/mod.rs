//! Detection logic: data, preprocessing, models, bundle, serving

pub mod bundle;
pub mod dataset;
pub mod features;
pub mod inference;
pub mod model;
pub mod simulation;
pub mod training;

pub use bundle::{ArtifactBundle, BundleHeader};
pub use inference::{Detector, Prediction};
pub use simulation::TrafficSampler;

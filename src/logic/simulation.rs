//! Traffic Simulation - Replays recorded rows as feature records

use std::path::Path;

use rand::Rng;

use crate::error::{DetectError, DetectResult};
use crate::logic::dataset::{load_csv, Table};
use crate::models::FeatureRecord;

/// Secondary dataset sampled by `/simulate`
#[derive(Debug, Clone)]
pub struct TrafficSampler {
    table: Table,
}

impl TrafficSampler {
    pub fn new(table: Table) -> DetectResult<Self> {
        if table.n_rows() == 0 {
            return Err(DetectError::Model("simulation dataset has no rows".to_string()));
        }
        Ok(Self { table })
    }

    pub fn load(path: &Path) -> DetectResult<Self> {
        Self::new(load_csv(path)?)
    }

    pub fn len(&self) -> usize {
        self.table.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.n_rows() == 0
    }

    /// One row chosen uniformly at random
    pub fn sample(&self) -> Option<FeatureRecord> {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<FeatureRecord> {
        if self.table.n_rows() == 0 {
            return None;
        }
        self.table.record(rng.gen_range(0..self.table.n_rows()))
    }
}

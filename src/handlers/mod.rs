//! HTTP handlers

pub mod extract;
pub mod health;
pub mod predict;
pub mod simulate;

//! Outbreak risk prediction engine
//!
//! Trains Gaussian Naive Bayes models on labelled county observations, one per
//! disease plus a combined model, persists them to disk and scores prediction
//! requests into a probability, risk tier, case estimate and recommendations.

pub mod config;
pub mod error;
pub mod ml;
pub mod models;
pub mod state;

pub use error::{AppError, Result};

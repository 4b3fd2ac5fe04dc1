//! Role-gated predictive analytics aggregation.
//!
//! One engine per process; every request is an independent, stateless
//! computation. Individual models trap their own failures and degrade to
//! inline `{"error": ...}` objects so one bad query never empties the
//! whole response.

pub mod aggregator;
pub mod models;

pub use aggregator::PredictiveEngine;
pub use models::{
    AdminPredictions, DeveloperPredictions, ModelOutcome, ModelSelector, Predictions,
    PredictionsResponse, PredictiveRequest,
};

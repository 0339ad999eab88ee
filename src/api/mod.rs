//! Health backend access.
//!
//! `HealthStore` is the read-side seam used by the insights fetch cycle;
//! `HealthApiClient` implements it over HTTP.

pub mod client;
pub mod error;

pub use client::{ApiConfig, HealthApiClient};
pub use error::ApiError;

use crate::models::{Medication, Prediction, Symptom};
use async_trait::async_trait;

/// Read access to a user's health records.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn symptoms(&self, token: &str, user_id: &str) -> Result<Vec<Symptom>, ApiError>;

    async fn medications(&self, token: &str, user_id: &str) -> Result<Vec<Medication>, ApiError>;

    async fn predictions(&self, token: &str, user_id: &str) -> Result<Vec<Prediction>, ApiError>;
}

//! Per-view fetch cycle.
//!
//! The three sources behind the insights view are fetched concurrently.
//! Each one settles independently into a [`SourceResult`]; a failing
//! source falls back to an empty list and never aborts the others.

use crate::api::{ApiError, HealthStore};
use crate::auth::AuthProvider;
use crate::models::{Medication, Prediction, Symptom};
use futures::future::join3;
use std::fmt;
use tracing::{debug, warn};

/// Why a source fell back to empty data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// No user is signed in.
    NotSignedIn,
    /// The identity provider had no token for this request.
    NoToken,
    /// The request itself failed.
    Request(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::NotSignedIn => write!(f, "not signed in"),
            FetchFailure::NoToken => write!(f, "no auth token available"),
            FetchFailure::Request(msg) => write!(f, "{}", msg),
        }
    }
}

/// Outcome of fetching one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult<T> {
    Loaded(Vec<T>),
    Fallback { data: Vec<T>, reason: FetchFailure },
}

impl<T> SourceResult<T> {
    fn fallback(reason: FetchFailure) -> Self {
        SourceResult::Fallback {
            data: Vec::new(),
            reason,
        }
    }

    /// The records to render, real or fallback.
    pub fn data(&self) -> &[T] {
        match self {
            SourceResult::Loaded(data) | SourceResult::Fallback { data, .. } => data,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            SourceResult::Loaded(_) => None,
            SourceResult::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure().is_some()
    }
}

/// Everything fetched for one insights view.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub symptoms: SourceResult<Symptom>,
    pub medications: SourceResult<Medication>,
    pub predictions: SourceResult<Prediction>,
}

impl PageData {
    fn all_failed(reason: FetchFailure) -> Self {
        Self {
            symptoms: SourceResult::fallback(reason.clone()),
            medications: SourceResult::fallback(reason.clone()),
            predictions: SourceResult::fallback(reason),
        }
    }

    /// `"source: reason"` for every source that fell back.
    pub fn degraded_sources(&self) -> Vec<String> {
        [
            ("symptoms", self.symptoms.failure()),
            ("medications", self.medications.failure()),
            ("predictions", self.predictions.failure()),
        ]
        .into_iter()
        .filter_map(|(source, failure)| failure.map(|f| format!("{}: {}", source, f)))
        .collect()
    }

    pub fn fully_degraded(&self) -> bool {
        self.symptoms.is_degraded() && self.medications.is_degraded() && self.predictions.is_degraded()
    }
}

fn settle<T>(source: &str, result: Result<Vec<T>, ApiError>) -> SourceResult<T> {
    match result {
        Ok(data) => {
            debug!("Loaded {} {}", data.len(), source);
            SourceResult::Loaded(data)
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", source, e);
            SourceResult::fallback(FetchFailure::Request(e.to_string()))
        }
    }
}

fn missing_token<T>(source: &str) -> SourceResult<T> {
    warn!("No auth token; skipping {}", source);
    SourceResult::fallback(FetchFailure::NoToken)
}

/// Fetch symptoms, medications and predictions for the signed-in user.
pub async fn fetch_page_data<S, A>(store: &S, auth: &A) -> PageData
where
    S: HealthStore + ?Sized,
    A: AuthProvider + ?Sized,
{
    let Some(user_id) = auth.current_user() else {
        warn!("No signed-in user; insights will be empty");
        return PageData::all_failed(FetchFailure::NotSignedIn);
    };
    let user_id = user_id.as_str();

    let symptoms = async {
        match auth.auth_token() {
            Some(token) => settle("symptoms", store.symptoms(&token, user_id).await),
            None => missing_token("symptoms"),
        }
    };
    let medications = async {
        match auth.auth_token() {
            Some(token) => settle("medications", store.medications(&token, user_id).await),
            None => missing_token("medications"),
        }
    };
    let predictions = async {
        match auth.auth_token() {
            Some(token) => settle("predictions", store.predictions(&token, user_id).await),
            None => missing_token("predictions"),
        }
    };

    let (symptoms, medications, predictions) = join3(symptoms, medications, predictions).await;

    PageData {
        symptoms,
        medications,
        predictions,
    }
}

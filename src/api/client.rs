//! HTTP client for the health backend.
//!
//! Wraps every REST endpoint the tracker uses: symptom, medication and
//! prediction listings, logging endpoints, and the classifier/advice agent.

use crate::api::error::ApiError;
use crate::api::HealthStore;
use crate::models::{
    AgentRequest, AgentResponse, Medication, MedicationUpdate, NewMedication, NewSymptom,
    Prediction, PredictionResult, Symptom,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for the client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SymptomList {
    #[serde(default)]
    symptoms: Vec<Symptom>,
}

#[derive(Debug, Deserialize)]
struct PredictionList {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct MedicationList {
    #[serde(default)]
    medications: Vec<Medication>,
}

#[derive(Debug, Deserialize)]
struct SymptomCreated {
    symptom_id: String,
}

#[derive(Debug, Deserialize)]
struct MedicationCreated {
    med_id: String,
}

#[derive(Debug, Deserialize)]
struct MedicationUpdated {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    symptom_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// Client for the health backend REST API.
pub struct HealthApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl HealthApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// List all symptoms for a user, newest first.
    pub async fn get_symptoms(&self, token: &str, user_id: &str) -> Result<Vec<Symptom>, ApiError> {
        let request = self
            .http_client
            .get(self.url(&format!("/symptoms/{}", user_id)))
            .bearer_auth(token);
        let list: SymptomList = self.execute(request).await?;
        debug!("Fetched {} symptoms", list.symptoms.len());
        Ok(list.symptoms)
    }

    /// List stored symptom predictions for a user, newest first.
    pub async fn get_predictions(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Vec<Prediction>, ApiError> {
        let request = self
            .http_client
            .get(self.url(&format!("/symptoms/predictions/{}", user_id)))
            .bearer_auth(token);
        let list: PredictionList = self.execute(request).await?;
        debug!("Fetched {} predictions", list.predictions.len());
        Ok(list.predictions)
    }

    /// List medications for a user, newest first.
    pub async fn get_medications(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Vec<Medication>, ApiError> {
        let request = self
            .http_client
            .get(self.url(&format!("/medications/{}", user_id)))
            .bearer_auth(token);
        let list: MedicationList = self.execute(request).await?;
        debug!("Fetched {} medications", list.medications.len());
        Ok(list.medications)
    }

    /// Log a symptom. Returns the new symptom id.
    pub async fn add_symptom(&self, token: &str, symptom: &NewSymptom) -> Result<String, ApiError> {
        symptom.validate().map_err(ApiError::InvalidRequest)?;

        let request = self
            .http_client
            .post(self.url("/symptoms/add"))
            .bearer_auth(token)
            .json(symptom);
        let created: SymptomCreated = self.execute(request).await?;
        info!("Logged symptom {}", created.symptom_id);
        Ok(created.symptom_id)
    }

    /// Add a medication. Returns the new medication id.
    pub async fn add_medication(
        &self,
        token: &str,
        medication: &NewMedication,
    ) -> Result<String, ApiError> {
        medication.validate().map_err(ApiError::InvalidRequest)?;

        let request = self
            .http_client
            .post(self.url("/medications/add"))
            .bearer_auth(token)
            .json(medication);
        let created: MedicationCreated = self.execute(request).await?;
        info!("Added medication {}", created.med_id);
        Ok(created.med_id)
    }

    /// Update fields of an existing medication.
    pub async fn update_medication(
        &self,
        token: &str,
        med_id: &str,
        update: &MedicationUpdate,
    ) -> Result<String, ApiError> {
        if med_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("medication id is required".to_string()));
        }
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("no fields to update".to_string()));
        }

        let request = self
            .http_client
            .put(self.url(&format!("/medications/update/{}", med_id)))
            .bearer_auth(token)
            .json(update);
        let updated: MedicationUpdated = self.execute(request).await?;
        Ok(updated.message)
    }

    /// Classify free-text symptoms. Passing a user id stores the prediction.
    pub async fn predict_symptom(
        &self,
        text: &str,
        user_id: Option<&str>,
    ) -> Result<PredictionResult, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::InvalidRequest("symptom_text is required".to_string()));
        }

        let request = self
            .http_client
            .post(self.url("/api/predict_symptom"))
            .json(&PredictRequest {
                symptom_text: text,
                user_id,
            });
        self.execute(request).await
    }

    /// Ask the advice agent for a follow-up message.
    pub async fn agent_advice(&self, payload: &AgentRequest) -> Result<AgentResponse, ApiError> {
        let request = self
            .http_client
            .post(self.url("/api/agent_response"))
            .json(payload);
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.config.timeout_seconds)
            } else if e.is_connect() {
                ApiError::Connect(self.config.base_url.clone())
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        parse_body(status, &body)
    }
}

/// Turn a response status and body into a typed value or an error.
fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, body),
        });
    }

    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl HealthStore for HealthApiClient {
    async fn symptoms(&self, token: &str, user_id: &str) -> Result<Vec<Symptom>, ApiError> {
        self.get_symptoms(token, user_id).await
    }

    async fn medications(&self, token: &str, user_id: &str) -> Result<Vec<Medication>, ApiError> {
        self.get_medications(token, user_id).await
    }

    async fn predictions(&self, token: &str, user_id: &str) -> Result<Vec<Prediction>, ApiError> {
        self.get_predictions(token, user_id).await
    }
}

//! Data models for the health tracker.
//!
//! This module contains the records exchanged with the health backend
//! (symptoms, medications, predictions) and the display-ready structures
//! produced by the insights aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Overall risk attached to a symptom prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Low risk (backend default)
    #[default]
    Low,
    /// Moderate risk - worth monitoring
    Medium,
    /// High risk - worth raising with a clinician
    High,
    /// Any value the backend sends that we don't recognise
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A logged symptom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub description: String,
    /// Intensity on a 1-10 scale.
    pub intensity: u8,
    /// Explicit tags. When absent or empty, tags are derived from the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Medications the user was taking when the symptom was logged.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub med_context: Vec<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// A medication entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub medication_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dosage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One ranked label from the symptom classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLabel {
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
}

/// A stored classification of free-text symptoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    /// The text the user submitted.
    #[serde(rename = "text", default, deserialize_with = "null_as_default")]
    pub source_text: String,
    /// Ranked labels, best first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Vec<PredictionLabel>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_risk: RiskLevel,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Prediction {
    /// Returns the best-ranked label, if any.
    pub fn top_label(&self) -> Option<&str> {
        self.predictions.first().map(|p| p.label.as_str())
    }
}

/// Live classifier output from `/api/predict_symptom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub predicted_symptom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub probability: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_predictions: Vec<PredictionLabel>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_risk: RiskLevel,
}

/// Request body for logging a symptom.
#[derive(Debug, Clone, Serialize)]
pub struct NewSymptom {
    pub user_id: String,
    pub description: String,
    pub intensity: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub med_context: Vec<String>,
}

impl NewSymptom {
    /// Validate the request the same way the backend would.
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user_id is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        if !(1..=10).contains(&self.intensity) {
            return Err("intensity must be between 1 and 10".to_string());
        }
        Ok(())
    }
}

/// Request body for adding a medication.
#[derive(Debug, Clone, Serialize)]
pub struct NewMedication {
    pub user_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: String,
    pub notes: String,
}

impl NewMedication {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("user_id is required".to_string());
        }
        if self.medication_name.trim().is_empty() {
            return Err("medication_name is required".to_string());
        }
        Ok(())
    }
}

/// Partial update for an existing medication. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MedicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MedicationUpdate {
    pub fn is_empty(&self) -> bool {
        self.medication_name.is_none()
            && self.dosage.is_none()
            && self.frequency.is_none()
            && self.start_date.is_none()
            && self.notes.is_none()
    }
}

/// Symptom summary sent to the advice agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSymptom {
    pub description: String,
    pub predicted_symptom: String,
    pub risk: RiskLevel,
}

/// Medication summary sent to the advice agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMedication {
    pub name: String,
    pub dosage: String,
}

/// Request body for `/api/agent_response`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub recent_symptoms: Vec<AgentSymptom>,
    pub medications: Vec<AgentMedication>,
}

/// Reply from the advice agent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub agent_message: Option<String>,
}

/// A one-week aggregation window, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Average intensity of one tag within a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagAverage {
    pub tag: String,
    pub average: f64,
}

/// One point of the symptom trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub bucket_label: String,
    /// Exactly three tags, in rank order.
    pub values: Vec<TagAverage>,
}

impl TrendPoint {
    /// Look up the average for a tag.
    pub fn value(&self, tag: &str) -> Option<f64> {
        self.values.iter().find(|v| v.tag == tag).map(|v| v.average)
    }

    /// Tag names in rank order.
    pub fn tags(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.tag.as_str()).collect()
    }
}

/// One slice of the side-effect distribution chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSlice {
    pub name: String,
    /// Rounded percentage share, 0-100.
    pub value: u32,
    pub color_index: usize,
    pub color: String,
}

/// Display priority of an advice entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvicePriority {
    High,
    Medium,
    Positive,
}

impl AdvicePriority {
    /// Badge text shown next to the entry.
    pub fn badge(&self) -> &'static str {
        match self {
            AdvicePriority::High => "Important",
            AdvicePriority::Medium => "Notice",
            AdvicePriority::Positive => "Good News",
        }
    }
}

impl From<RiskLevel> for AdvicePriority {
    fn from(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::High => AdvicePriority::High,
            RiskLevel::Medium => AdvicePriority::Medium,
            RiskLevel::Low | RiskLevel::Unknown => AdvicePriority::Positive,
        }
    }
}

/// An entry in the advice history feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceItem {
    pub date: String,
    pub advice: String,
    pub priority: AdvicePriority,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_symptoms: usize,
    /// Change in symptoms logged this month vs. last month, in percent.
    pub symptom_change_pct: Option<i64>,
    pub active_medications: usize,
    pub insights_this_month: usize,
}

/// Everything the insights view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub buckets: Vec<WeeklyBucket>,
    pub trend: Vec<TrendPoint>,
    pub distribution: Vec<DistributionSlice>,
    pub advice: Vec<AdviceItem>,
}

/// Metadata about an insights report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub api_url: String,
    /// Sources that fell back to empty data, with the reason.
    pub degraded_sources: Vec<String>,
}

/// The complete exported insights report.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub metadata: ReportMetadata,
    pub stats: SummaryStats,
    pub insights: Insights,
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Lenient timestamp parsing for backend records.
///
/// The backend emits `datetime.isoformat()` values without an offset; those
/// are read as UTC. Unparseable values become `None` so a single bad record
/// doesn't fail the whole list.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }
}

//! Symptom assistant.
//!
//! Sends free text to the classifier, formats the ranked suggestions and
//! asks the advice agent for a follow-up. The agent is best effort.

use crate::api::{ApiError, HealthApiClient};
use crate::models::{AgentRequest, AgentResponse, AgentSymptom, PredictionResult, RiskLevel};
use async_trait::async_trait;
use tracing::{debug, warn};

const NO_SUGGESTIONS: &str =
    "ClinicalBERT analyzed your message, but was unable to provide suggestions.";

const DISCLAIMER: &str =
    "These are not diagnoses, but patterns you may want to discuss with your clinician.";

/// Classifier and advice agent endpoints.
#[async_trait]
pub trait SymptomAdvisor: Send + Sync {
    async fn predict(&self, text: &str, user_id: Option<&str>) -> Result<PredictionResult, ApiError>;

    async fn advise(&self, request: &AgentRequest) -> Result<AgentResponse, ApiError>;
}

#[async_trait]
impl SymptomAdvisor for HealthApiClient {
    async fn predict(&self, text: &str, user_id: Option<&str>) -> Result<PredictionResult, ApiError> {
        self.predict_symptom(text, user_id).await
    }

    async fn advise(&self, request: &AgentRequest) -> Result<AgentResponse, ApiError> {
        self.agent_advice(request).await
    }
}

/// What the assistant says back.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub suggestions: String,
    pub agent_message: Option<String>,
    pub overall_risk: RiskLevel,
}

fn risk_prefix(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::High => "High-risk pattern detected. ",
        RiskLevel::Medium => "Moderate-risk pattern detected. ",
        RiskLevel::Low | RiskLevel::Unknown => "",
    }
}

/// Render the classifier output as a chat message.
pub fn format_suggestions(result: &PredictionResult) -> String {
    if result.top_predictions.is_empty() {
        return NO_SUGGESTIONS.to_string();
    }

    let formatted = result
        .top_predictions
        .iter()
        .map(|p| match &p.risk {
            Some(risk) => format!("{} ({:.2}, risk: {})", p.label, p.score, risk),
            None => format!("{} ({:.2})", p.label, p.score),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{}ClinicalBERT suggestions: {}. {}",
        risk_prefix(result.overall_risk),
        formatted,
        DISCLAIMER
    )
}

/// Build the advice agent request for one message.
pub fn agent_request(text: &str, result: &PredictionResult, user_id: Option<&str>) -> AgentRequest {
    let predicted = result
        .top_predictions
        .first()
        .map(|p| p.label.as_str())
        .filter(|l| !l.is_empty())
        .or_else(|| Some(result.predicted_symptom.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or("unknown");

    AgentRequest {
        user_id: user_id.map(str::to_string),
        recent_symptoms: vec![AgentSymptom {
            description: text.to_string(),
            predicted_symptom: predicted.to_string(),
            risk: result.overall_risk,
        }],
        medications: Vec::new(),
    }
}

/// Classify a message and collect the agent's follow-up.
pub async fn consult<C>(advisor: &C, text: &str, user_id: Option<&str>) -> Result<AssistantReply, ApiError>
where
    C: SymptomAdvisor + ?Sized,
{
    let result = advisor.predict(text, user_id).await?;
    debug!(
        "Classifier returned {} suggestions ({} risk)",
        result.top_predictions.len(),
        result.overall_risk
    );

    let agent_message = match advisor.advise(&agent_request(text, &result, user_id)).await {
        Ok(response) => response.agent_message.filter(|m| !m.trim().is_empty()),
        Err(e) => {
            warn!("Advice agent unavailable: {}", e);
            None
        }
    };

    Ok(AssistantReply {
        suggestions: format_suggestions(&result),
        agent_message,
        overall_risk: result.overall_risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionLabel;
    use std::sync::Mutex;

    fn result(risk: RiskLevel, labels: &[(&str, f64, Option<&str>)]) -> PredictionResult {
        PredictionResult {
            predicted_symptom: "fallback label".to_string(),
            probability: 0.5,
            top_predictions: labels
                .iter()
                .map(|(label, score, risk)| PredictionLabel {
                    label: label.to_string(),
                    score: *score,
                    risk: risk.map(str::to_string),
                })
                .collect(),
            overall_risk: risk,
        }
    }

    struct MockAdvisor {
        result: PredictionResult,
        agent: Result<Option<String>, ()>,
        requests: Mutex<Vec<AgentRequest>>,
    }

    #[async_trait]
    impl SymptomAdvisor for MockAdvisor {
        async fn predict(&self, _text: &str, _user_id: Option<&str>) -> Result<PredictionResult, ApiError> {
            Ok(self.result.clone())
        }

        async fn advise(&self, request: &AgentRequest) -> Result<AgentResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.agent {
                Ok(message) => Ok(AgentResponse {
                    agent_message: message.clone(),
                }),
                Err(()) => Err(ApiError::Timeout(30)),
            }
        }
    }

    #[test]
    fn test_format_high_risk() {
        let r = result(
            RiskLevel::High,
            &[("cardiac disorder", 0.8123, Some("HIGH")), ("anxiety", 0.1, None)],
        );
        assert_eq!(
            format_suggestions(&r),
            "High-risk pattern detected. ClinicalBERT suggestions: cardiac disorder (0.81, risk: HIGH), anxiety (0.10). These are not diagnoses, but patterns you may want to discuss with your clinician."
        );
    }

    #[test]
    fn test_format_prefixes() {
        let medium = format_suggestions(&result(RiskLevel::Medium, &[("skin disorder", 0.5, None)]));
        assert!(medium.starts_with("Moderate-risk pattern detected. "));

        let low = format_suggestions(&result(RiskLevel::Low, &[("cold", 0.5, None)]));
        assert!(low.starts_with("ClinicalBERT suggestions: "));
    }

    #[test]
    fn test_format_without_suggestions() {
        assert_eq!(format_suggestions(&result(RiskLevel::High, &[])), NO_SUGGESTIONS);
    }

    #[test]
    fn test_agent_request_label_fallbacks() {
        let with_top = agent_request("text", &result(RiskLevel::Low, &[("nausea", 0.9, None)]), Some("u1"));
        assert_eq!(with_top.recent_symptoms[0].predicted_symptom, "nausea");
        assert_eq!(with_top.user_id.as_deref(), Some("u1"));
        assert!(with_top.medications.is_empty());

        let without_top = agent_request("text", &result(RiskLevel::Low, &[]), None);
        assert_eq!(without_top.recent_symptoms[0].predicted_symptom, "fallback label");

        let mut empty = result(RiskLevel::Low, &[]);
        empty.predicted_symptom.clear();
        assert_eq!(
            agent_request("text", &empty, None).recent_symptoms[0].predicted_symptom,
            "unknown"
        );
    }

    #[tokio::test]
    async fn test_consult_includes_agent_message() {
        let advisor = MockAdvisor {
            result: result(RiskLevel::Medium, &[("migraine", 0.7, None)]),
            agent: Ok(Some("Try keeping a headache diary.".to_string())),
            requests: Mutex::new(Vec::new()),
        };
        let reply = consult(&advisor, "my head hurts", Some("u1")).await.unwrap();

        assert_eq!(reply.agent_message.as_deref(), Some("Try keeping a headache diary."));
        assert_eq!(reply.overall_risk, RiskLevel::Medium);
        let requests = advisor.requests.lock().unwrap();
        assert_eq!(requests[0].recent_symptoms[0].description, "my head hurts");
        assert_eq!(requests[0].recent_symptoms[0].risk, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_consult_ignores_agent_failure() {
        let advisor = MockAdvisor {
            result: result(RiskLevel::Low, &[("cold", 0.6, None)]),
            agent: Err(()),
            requests: Mutex::new(Vec::new()),
        };
        let reply = consult(&advisor, "sniffles", None).await.unwrap();
        assert!(reply.agent_message.is_none());
        assert!(reply.suggestions.contains("cold (0.60)"));
    }
}

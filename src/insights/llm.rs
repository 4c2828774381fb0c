//! LLM-backed persona generation against an OpenAI-compatible chat API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{InsightError, InsightGenerator, Persona};
use crate::connectors::SiteProfile;

pub struct LlmInsightGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmInsightGenerator {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, InsightError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
        })
    }

    fn prompt(profile: &SiteProfile) -> String {
        let industry = profile.industry.as_deref().unwrap_or("technology");
        let business_model = profile.business_model.as_deref().unwrap_or("b2b");
        let topics = profile.key_topics.join(", ");
        format!(
            "Generate up to 3 customer personas for a {business_model} company in the \
             {industry} industry. Key site topics: {topics}. Respond with a JSON array; \
             each element must have the fields name, job_title, company_size, \
             pain_points (array), goals (array), keywords (array), \
             preferred_channels (array)."
        )
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawPersona {
    name: String,
    job_title: String,
    #[serde(default)]
    company_size: Option<String>,
    #[serde(default)]
    pain_points: Vec<String>,
    #[serde(default)]
    goals: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    preferred_channels: Vec<String>,
}

#[async_trait]
impl InsightGenerator for LlmInsightGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn personas(&self, profile: &SiteProfile) -> Result<Vec<Persona>, InsightError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a marketing audience analyst."},
                {"role": "user", "content": Self::prompt(profile)}
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::Request(format!(
                "chat endpoint returned {status}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| InsightError::Unusable(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| InsightError::Unusable("empty choices".to_string()))?;

        let personas = parse_personas(content, profile)?;
        if personas.is_empty() {
            return Err(InsightError::Unusable("no personas in response".to_string()));
        }
        Ok(personas)
    }
}

/// Extract the JSON array from the model output, tolerating surrounding
/// prose and markdown fences.
fn parse_personas(content: &str, profile: &SiteProfile) -> Result<Vec<Persona>, InsightError> {
    let start = content
        .find('[')
        .ok_or_else(|| InsightError::Unusable("no JSON array found".to_string()))?;
    let end = content
        .rfind(']')
        .ok_or_else(|| InsightError::Unusable("no JSON array found".to_string()))?;
    if end <= start {
        return Err(InsightError::Unusable("malformed JSON array".to_string()));
    }

    let raw: Vec<RawPersona> = serde_json::from_str(&content[start..=end])
        .map_err(|e| InsightError::Unusable(e.to_string()))?;

    let industry = profile
        .industry
        .clone()
        .unwrap_or_else(|| "technology".to_string());

    Ok(raw
        .into_iter()
        .take(3)
        .map(|p| Persona {
            name: p.name,
            job_title: p.job_title,
            industry: industry.clone(),
            company_size: p
                .company_size
                .unwrap_or_else(|| "Mid-market (100-1000 employees)".to_string()),
            pain_points: p.pain_points,
            goals: p.goals,
            keywords: p.keywords,
            preferred_channels: p.preferred_channels,
            confidence_score: 0.8,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_personas_from_fenced_json() {
        let content = r#"Here are the personas:
```json
[{"name": "Ops Lead", "job_title": "Operations Manager", "pain_points": ["manual work"], "goals": ["automation"]}]
```"#;
        let personas = parse_personas(content, &SiteProfile::default()).unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].name, "Ops Lead");
        assert_eq!(personas[0].confidence_score, 0.8);
    }

    #[test]
    fn test_parse_personas_rejects_prose() {
        let err = parse_personas("no structured data here", &SiteProfile::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_personas_caps_at_three() {
        let content = r#"[
            {"name": "A", "job_title": "a"},
            {"name": "B", "job_title": "b"},
            {"name": "C", "job_title": "c"},
            {"name": "D", "job_title": "d"}
        ]"#;
        let personas = parse_personas(content, &SiteProfile::default()).unwrap();
        assert_eq!(personas.len(), 3);
    }
}

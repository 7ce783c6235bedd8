use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{lexicon, Classification, SpecialtyClassifier};

const KNOWN_SPECIALTIES: &[&str] = &[
    "dentist",
    "dermatologist",
    "ophthalmologist",
    "cardiologist",
    "ent",
    "gp",
];

const PROMPT: &str = r#"You are a triage engine for a healthcare booking assistant.
Given the patient's symptom description, pick the single most appropriate
specialty from: dentist, dermatologist, ophthalmologist, cardiologist, ent, gp.

Return ONLY valid JSON (no markdown, no explanation):
{"specialty": "...", "display_name": "..."}
"#;

pub struct GeminiClassifier {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClassifier {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpecialtyClassifier for GeminiClassifier {
    async fn classify(&self, symptom_text: &str) -> anyhow::Result<Classification> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{PROMPT}\nSymptoms: {symptom_text}") }],
            }],
            "generationConfig": { "temperature": 0.0, "maxOutputTokens": 100 },
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Gemini response")?;

        if !status.is_success() {
            anyhow::bail!("Gemini API error ({}): {}", status, data);
        }

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("missing content in Gemini response"))?;

        parse_classification(text)
    }
}

fn parse_classification(response: &str) -> anyhow::Result<Classification> {
    // Strip markdown code fences the model sometimes wraps JSON in.
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    let parsed: Classification = serde_json::from_str(cleaned)
        .context("Gemini response was not a classification object")?;

    let specialty = parsed.specialty.to_lowercase();
    if !KNOWN_SPECIALTIES.contains(&specialty.as_str()) {
        anyhow::bail!("Gemini returned unknown specialty: {}", parsed.specialty);
    }

    Ok(Classification {
        display_name: lexicon::display_name_for(&specialty).to_string(),
        specialty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let c = parse_classification(r#"{"specialty":"dentist","display_name":"Dentists"}"#)
            .unwrap();
        assert_eq!(c.specialty, "dentist");
        assert_eq!(c.display_name, "Dentists");
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"specialty\":\"ent\",\"display_name\":\"ENT\"}\n```";
        let c = parse_classification(raw).unwrap();
        assert_eq!(c.specialty, "ent");
        // Display name is normalized from our own table, not trusted.
        assert_eq!(c.display_name, "ENT Specialists");
    }

    #[test]
    fn test_unknown_specialty_is_rejected() {
        let raw = r#"{"specialty":"wizard","display_name":"Wizards"}"#;
        assert!(parse_classification(raw).is_err());
    }

    #[test]
    fn test_non_json_is_rejected() {
        assert!(parse_classification("I think you need a dentist").is_err());
    }
}

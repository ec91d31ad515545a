use log::{debug, error};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::models::{CampaignAnalysis, UrgencyLevel};
use crate::services::error::AnalyzerError;

#[rocket::async_trait]
pub trait CampaignAnalyzer: Send + Sync {
    async fn analyze(&self, description: &str) -> Result<CampaignAnalysis, AnalyzerError>;
}

/* ----------------------------- REMOTE ----------------------------- */

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that analyzes nonprofit campaign descriptions.";

pub struct OpenAiAnalyzer {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: String,
    category: Option<String>,
    urgency: Option<UrgencyLevel>,
}

impl OpenAiAnalyzer {
    /// Without an API key every call reports `Unavailable`.
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> Result<Self, AnalyzerError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(OpenAiAnalyzer {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn prompt(description: &str) -> String {
        format!(
            r#"Analyze this nonprofit campaign description and provide:
1. 3-5 relevant tags
2. A short summary (2-3 sentences)
3. Category (e.g., disaster relief, education, healthcare, etc.)
4. Urgency level (low, medium, high)

Campaign: "{}"

Respond in JSON format:
{{"tags": ["tag1", "tag2", "tag3"], "summary": "Brief summary here", "category": "category name", "urgency": "low|medium|high"}}"#,
            description
        )
    }
}

#[rocket::async_trait]
impl CampaignAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, description: &str) -> Result<CampaignAnalysis, AnalyzerError> {
        let api_key = self.api_key.as_ref().ok_or(AnalyzerError::Unavailable)?;

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "temperature": 0.3,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": Self::prompt(description) },
                ]
            }))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_completion(&body)
    }
}

/// Extracts the analysis JSON from a chat-completion response body.
pub fn parse_completion(body: &str) -> Result<CampaignAnalysis, AnalyzerError> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AnalyzerError::Malformed("no response content".to_string()))?;

    // Models sometimes wrap the JSON in a markdown fence.
    let content = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw: RawAnalysis =
        serde_json::from_str(content).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

    Ok(CampaignAnalysis {
        tags: raw.tags,
        summary: raw.summary,
        category: raw.category,
        urgency: raw.urgency,
    })
}

/* ----------------------------- FALLBACK ----------------------------- */

/// Offline keyword heuristic. Never fails.
pub struct KeywordAnalyzer;

struct KeywordRule {
    keywords: [&'static str; 2],
    tags: [&'static str; 2],
    category: Option<&'static str>,
    urgency: Option<UrgencyLevel>,
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: ["emergency", "disaster"],
        tags: ["emergency", "disaster-relief"],
        category: Some("disaster-relief"),
        urgency: Some(UrgencyLevel::High),
    },
    KeywordRule {
        keywords: ["food", "hunger"],
        tags: ["food-security", "hunger-relief"],
        category: Some("food-security"),
        urgency: None,
    },
    KeywordRule {
        keywords: ["water", "clean"],
        tags: ["water", "sanitation"],
        category: Some("water-sanitation"),
        urgency: None,
    },
    KeywordRule {
        keywords: ["education", "school"],
        tags: ["education", "learning"],
        category: Some("education"),
        urgency: None,
    },
    KeywordRule {
        keywords: ["health", "medical"],
        tags: ["healthcare", "medical"],
        category: Some("healthcare"),
        urgency: None,
    },
    KeywordRule {
        keywords: ["children", "kids"],
        tags: ["children", "youth"],
        category: None,
        urgency: None,
    },
];

impl KeywordAnalyzer {
    pub fn analyze_now(description: &str) -> CampaignAnalysis {
        let lower = description.to_lowercase();

        let mut tags: Vec<String> = Vec::new();
        let mut category = "general";
        let mut urgency = UrgencyLevel::Medium;

        for rule in RULES {
            if !rule.keywords.iter().any(|kw| lower.contains(kw)) {
                continue;
            }
            tags.extend(rule.tags.iter().map(|t| t.to_string()));
            if let Some(c) = rule.category {
                category = c;
            }
            if let Some(u) = rule.urgency {
                urgency = u;
            }
        }

        if tags.is_empty() {
            tags = vec!["nonprofit".to_string(), "charity".to_string()];
        }

        let excerpt: String = description.chars().take(100).collect();
        let summary = format!(
            "Campaign focused on {}. {}...",
            category.replacen('-', " ", 1),
            excerpt
        );

        CampaignAnalysis {
            tags,
            summary,
            category: Some(category.to_string()),
            urgency: Some(urgency),
        }
    }
}

#[rocket::async_trait]
impl CampaignAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, description: &str) -> Result<CampaignAnalysis, AnalyzerError> {
        Ok(Self::analyze_now(description))
    }
}

/// Runs `analyzer`, falling back to the keyword heuristic on any error.
pub async fn analyze_or_fallback(
    analyzer: &dyn CampaignAnalyzer,
    description: &str,
) -> CampaignAnalysis {
    match analyzer.analyze(description).await {
        Ok(analysis) => analysis,
        Err(AnalyzerError::Unavailable) => {
            debug!("Campaign analyzer unavailable, using keyword analysis");
            KeywordAnalyzer::analyze_now(description)
        }
        Err(e) => {
            error!("Error analyzing campaign: {}", e);
            KeywordAnalyzer::analyze_now(description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_description_gets_default_tags() {
        let analysis = KeywordAnalyzer::analyze_now("Support our local library");
        assert_eq!(analysis.tags, vec!["nonprofit", "charity"]);
        assert_eq!(analysis.category.as_deref(), Some("general"));
        assert_eq!(analysis.urgency, Some(UrgencyLevel::Medium));
        assert_eq!(
            analysis.summary,
            "Campaign focused on general. Support our local library..."
        );
    }

    #[test]
    fn later_rules_override_category_but_keep_urgency() {
        let analysis =
            KeywordAnalyzer::analyze_now("Emergency food and clean WATER for earthquake kids");
        assert_eq!(
            analysis.tags,
            vec![
                "emergency",
                "disaster-relief",
                "food-security",
                "hunger-relief",
                "water",
                "sanitation",
                "children",
                "youth"
            ]
        );
        assert_eq!(analysis.category.as_deref(), Some("water-sanitation"));
        assert_eq!(analysis.urgency, Some(UrgencyLevel::High));
        assert!(analysis.summary.starts_with("Campaign focused on water sanitation. Emergency"));
    }

    #[test]
    fn summary_truncates_to_hundred_chars() {
        let description = "é".repeat(150);
        let analysis = KeywordAnalyzer::analyze_now(&description);
        let expected = format!("Campaign focused on general. {}...", "é".repeat(100));
        assert_eq!(analysis.summary, expected);
    }

    #[test]
    fn parses_fenced_completion() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "```json\n{\"tags\":[\"education\"],\"summary\":\"Books\",\"category\":\"education\",\"urgency\":\"low\"}\n```"
                }
            }]
        })
        .to_string();

        let analysis = parse_completion(&body).unwrap();
        assert_eq!(analysis.tags, vec!["education"]);
        assert_eq!(analysis.summary, "Books");
        assert_eq!(analysis.urgency, Some(UrgencyLevel::Low));
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, AnalyzerError::Malformed(_)));
    }

    #[tokio::test]
    async fn falls_back_without_api_key() {
        let analyzer = OpenAiAnalyzer::new(
            None,
            "gpt-3.5-turbo".to_string(),
            "https://api.openai.com/v1".to_string(),
        )
        .unwrap();
        assert!(matches!(
            analyzer.analyze("School supplies").await,
            Err(AnalyzerError::Unavailable)
        ));

        let analysis = analyze_or_fallback(&analyzer, "School supplies").await;
        assert_eq!(analysis.tags, vec!["education", "learning"]);
    }
}

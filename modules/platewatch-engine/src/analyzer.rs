//! AI review analysis with a deterministic fallback.
//!
//! Builds a prompt from the review batch, calls Gemini with a
//! schema-constrained JSON response, and validates the result
//! defensively: clamp the score, cap the lists, salvage JSON out of
//! fenced or chatty responses. When the model call fails or the
//! response is unusable, a rating-derived fallback keeps the pipeline
//! moving; the outcome carries a `degraded` flag so callers can tell.

use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{error, info, warn};

use gemini_client::{strip_code_fences, Gemini, ResponseSchema};
use platewatch_common::{AnalysisOutcome, AnalysisResult, Config, RawReview};

/// Cap on list fields, whatever the model returns.
const MAX_LIST_ITEMS: usize = 5;

/// Sentinel list entry used when analysis was unavailable. Explicit
/// rather than an empty list, which would read as "no complaints".
const UNAVAILABLE: &str = "Analysis unavailable - AI service error";

/// First `{...}` span in a response that has extra prose around the
/// JSON object.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

/// What the model returns. List fields default to empty so a
/// schema-violating response still parses when the score and summary
/// are usable.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct ModelAnalysis {
    /// Overall sentiment, -1.0 (very negative) to 1.0 (very positive).
    sentiment_score: f64,
    /// 2-3 sentence summary of overall customer sentiment.
    summary: String,
    /// Most common complaints, each 5-10 words.
    #[serde(default)]
    complaints: Vec<String>,
    /// Most common positive aspects, each 5-10 words.
    #[serde(default)]
    praises: Vec<String>,
    /// Concrete actions the owner should take.
    #[serde(default)]
    recommended_actions: Vec<String>,
}

pub struct GeminiAnalyzer {
    gemini: Gemini,
    batch_size: usize,
}

impl GeminiAnalyzer {
    pub fn new(api_key: &str, model: &str, batch_size: usize) -> Self {
        Self {
            gemini: Gemini::new(api_key, model),
            batch_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.gemini_api_key,
            &config.gemini_model,
            config.analysis_batch_size,
        )
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.gemini = self.gemini.with_base_url(url);
        self
    }

    /// Analyze a review batch. Never fails: model errors and
    /// unparsable responses degrade to the rating-based fallback.
    pub async fn analyze(&self, reviews: &[RawReview], subject_name: &str) -> AnalysisOutcome {
        if reviews.is_empty() {
            return AnalysisOutcome {
                result: AnalysisResult {
                    sentiment_score: 0.0,
                    summary: "No reviews available for analysis.".to_string(),
                    complaints: vec![],
                    praises: vec![],
                    recommended_actions: vec![],
                    reviews_analyzed: 0,
                },
                degraded: false,
                raw_response: None,
            };
        }

        let prompt = build_prompt(reviews, subject_name, self.batch_size);
        let schema = ModelAnalysis::response_schema();

        match self.gemini.generate_json(&prompt, schema).await {
            Ok(text) => match parse_response(&text, reviews.len()) {
                Ok(result) => {
                    info!(
                        subject_name,
                        sentiment = result.sentiment_score,
                        "AI analysis complete"
                    );
                    AnalysisOutcome {
                        result,
                        degraded: false,
                        raw_response: Some(text),
                    }
                }
                Err(e) => {
                    warn!(subject_name, error = %e, "Unparsable model response, using fallback");
                    // Keep the unparsable text; it is the only evidence
                    // of what the model actually said.
                    AnalysisOutcome {
                        result: fallback_analysis(reviews),
                        degraded: true,
                        raw_response: Some(text),
                    }
                }
            },
            Err(e) => {
                error!(subject_name, error = %e, "Model call failed, using fallback");
                AnalysisOutcome {
                    result: fallback_analysis(reviews),
                    degraded: true,
                    raw_response: None,
                }
            }
        }
    }
}

/// Format the review batch for the prompt, capped at `batch_size` to
/// bound model input. Reviews without text carry no signal and are
/// skipped.
fn build_reviews_text(reviews: &[RawReview], batch_size: usize) -> String {
    reviews
        .iter()
        .take(batch_size)
        .enumerate()
        .filter(|(_, r)| !r.text.trim().is_empty())
        .map(|(i, r)| format!("Review {} (Rating: {}/5):\n{}\n", i + 1, r.rating, r.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(reviews: &[RawReview], subject_name: &str, batch_size: usize) -> String {
    let reviews_text = build_reviews_text(reviews, batch_size);
    format!(
        r#"Analyze these {count} customer reviews for "{subject_name}".

Reviews:
{reviews_text}

Provide analysis as a JSON object with these fields:
- sentiment_score: float between -1.0 and 1.0, where -1 is very negative, 0 is neutral, 1 is very positive
- summary: a concise 2-3 sentence summary of overall customer sentiment and key themes
- complaints: list of 3-5 most common complaints
- praises: list of 3-5 most common positive aspects
- recommended_actions: list of 3-5 concrete actions the owner should take

Rules:
- Base sentiment_score on overall tone
- Be specific (e.g., "slow service during peak hours" not just "slow service")
- Only include issues/praises mentioned in multiple reviews
- Include at least 2 constructive criticisms in complaints even when reviews are mostly positive
- Each list item: 5-10 words max
- Return ONLY valid JSON, no markdown or extra text"#,
        count = reviews.len().min(batch_size),
    )
}

/// Parse and validate a model response into an [`AnalysisResult`].
fn parse_response(response_text: &str, reviews_count: usize) -> Result<AnalysisResult> {
    let stripped = strip_code_fences(response_text);

    let parsed: ModelAnalysis = match serde_json::from_str(stripped) {
        Ok(parsed) => parsed,
        Err(first_err) => {
            // Salvage the first {...} span when the model wrapped the
            // JSON in prose despite instructions.
            let span = JSON_SPAN
                .find(stripped)
                .ok_or_else(|| anyhow!("no JSON object in response: {first_err}"))?;
            serde_json::from_str(span.as_str())?
        }
    };

    let mut complaints = parsed.complaints;
    let mut praises = parsed.praises;
    let mut recommended_actions = parsed.recommended_actions;
    complaints.truncate(MAX_LIST_ITEMS);
    praises.truncate(MAX_LIST_ITEMS);
    recommended_actions.truncate(MAX_LIST_ITEMS);

    Ok(AnalysisResult {
        sentiment_score: parsed.sentiment_score.clamp(-1.0, 1.0),
        summary: parsed.summary,
        complaints,
        praises,
        recommended_actions,
        reviews_analyzed: reviews_count,
    })
}

/// Rating-derived substitute when the model is unavailable. Maps the
/// 1-5 star mean onto -1..1 and flags the list fields as unavailable.
fn fallback_analysis(reviews: &[RawReview]) -> AnalysisResult {
    let ratings: Vec<f64> = reviews.iter().map(|r| r.rating).filter(|r| *r > 0.0).collect();
    let avg_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };

    let sentiment_score = (((avg_rating - 3.0) / 2.0) * 100.0).round() / 100.0;

    AnalysisResult {
        sentiment_score: sentiment_score.clamp(-1.0, 1.0),
        summary: format!(
            "Based on {} reviews with an average rating of {:.1}/5.",
            reviews.len(),
            avg_rating
        ),
        complaints: vec![UNAVAILABLE.to_string()],
        praises: vec![UNAVAILABLE.to_string()],
        recommended_actions: vec![UNAVAILABLE.to_string()],
        reviews_analyzed: reviews.len(),
    }
}

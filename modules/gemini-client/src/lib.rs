mod client;
pub mod schema;
pub mod types;
pub mod util;

pub use schema::ResponseSchema;
pub use types::{GenerateRequest, GenerationConfig, GenerateResponse};
pub use util::strip_code_fences;

use anyhow::{anyhow, Result};
use serde_json::Value;

use client::GeminiHttpClient;

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiHttpClient {
        let client = GeminiHttpClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// JSON-mode completion constrained by `schema`. Returns the raw
    /// response text; callers parse and validate defensively since the
    /// declared schema's strictness varies by model version.
    pub async fn generate_json(&self, prompt: &str, schema: Value) -> Result<String> {
        let request = GenerateRequest::from_prompt(prompt).config(GenerationConfig {
            temperature: Some(0.7),
            // Generous cap to avoid truncated JSON mid-object.
            max_output_tokens: Some(8192),
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        });

        let response = self.client().generate(&self.model, &request).await?;
        response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))
    }
}

//! Client for the hosted vision model that turns a photo of math into LaTeX.
//!
//! The endpoint is an OpenAI-compatible `chat/completions` API called with a
//! strict JSON schema, so the reply is always `{"latex": "..."}`.

use std::time::Duration;

use anyhow::Context;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capture::EncodedImage;
use crate::config::Config;
use crate::error::RecognizeError;
use crate::pricing::{log_usage, TokenUsage};

pub const NO_MATH_FOUND: &str = "No math found";

/// How the submitted image was produced; selects the prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// The whole photo.
    Direct,
    /// A crop around ink the user drew on the photo.
    #[default]
    Paint,
}

impl CaptureMode {
    pub fn prompt(self) -> &'static str {
        match self {
            CaptureMode::Paint => {
                "Respond with any math INSIDE THE RED CIRCLE. If there is no math circled, return 'No math found' and nothing else."
            }
            CaptureMode::Direct => {
                "Convert any math you see to LaTeX. If there is no math in the image, return 'No math found'."
            }
        }
    }
}

/// Image bytes in, transcribed LaTeX out.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &EncodedImage, mode: CaptureMode) -> Result<String, RecognizeError>;
}

pub struct OpenAiRecognizer {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiRecognizer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("no API key configured (set MATHSNAP_API_KEY or OPENAI_API_KEY)")?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Recognizer for OpenAiRecognizer {
    fn recognize(&self, image: &EncodedImage, mode: CaptureMode) -> Result<String, RecognizeError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = build_request(&self.model, mode.prompt(), image);
        debug!(
            "POST {url} model={} image={}x{} ({} bytes)",
            self.model,
            image.width,
            image.height,
            image.bytes.len()
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(RecognizeError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        let (latex, usage) = parse_response(&text)?;
        if let Some(usage) = usage {
            log_usage(&usage, &self.model);
        }
        info!("recognized LaTeX: {latex}");
        Ok(latex)
    }
}

/// `gpt-4o-mini` gets high detail; larger models read well enough at low detail.
pub fn detail_for(model: &str) -> &'static str {
    if model == "gpt-4o-mini" {
        "high"
    } else {
        "low"
    }
}

pub fn build_request(model: &str, prompt: &str, image: &EncodedImage) -> Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                {
                    "type": "image_url",
                    "image_url": {
                        "url": image.to_data_uri(),
                        "detail": detail_for(model),
                    }
                }
            ]
        }],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "latex_response",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": { "latex": { "type": "string" } },
                    "required": ["latex"],
                    "additionalProperties": false
                }
            }
        }
    })
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct LatexPayload {
    latex: String,
}

pub fn parse_response(body: &str) -> Result<(String, Option<TokenUsage>), RecognizeError> {
    let resp: ChatResponse = serde_json::from_str(body)?;
    let message = resp
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(RecognizeError::EmptyResponse)?;
    if let Some(refusal) = message.refusal {
        return Err(RecognizeError::Refused(refusal));
    }
    let content = message.content.ok_or(RecognizeError::EmptyResponse)?;
    let payload: LatexPayload = serde_json::from_str(&content)?;
    Ok((payload.latex, resp.usage))
}

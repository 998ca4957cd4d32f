//! Hugging Face style inference endpoint.
//!
//! Works with the hosted inference API as well as self-hosted servers that
//! speak the same `summarization` task protocol.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AbstractiveBackend, GenerationParams, NeuralError};

pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";
pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    estimated_time: Option<f64>,
}

pub struct HfInferenceBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
    timeout: Duration,
    wait_for_model: bool,
}

impl std::fmt::Debug for HfInferenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfInferenceBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("wait_for_model", &self.wait_for_model)
            .finish()
    }
}

impl HfInferenceBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            wait_for_model: true,
        }
    }

    /// Build from the resolved configuration.
    pub fn from_config(client: reqwest::Client, config: &crate::Config) -> Self {
        Self::new(client, &config.inference_url, &config.model)
            .with_token(config.api_token.clone())
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_wait_for_model(config.wait_for_model)
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_wait_for_model(mut self, wait: bool) -> Self {
        self.wait_for_model = wait;
        self
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model)
    }

    fn request_body<'a>(&self, text: &'a str, params: &GenerationParams) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                do_sample: params.do_sample,
            },
            options: InferenceOptions {
                wait_for_model: self.wait_for_model,
            },
        }
    }
}

impl AbstractiveBackend for HfInferenceBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        params: &'a GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<String, NeuralError>> + Send + 'a>> {
        Box::pin(async move {
            let mut req = self
                .client
                .post(self.endpoint())
                .timeout(self.timeout)
                .json(&self.request_body(text, params));
            if let Some(token) = &self.api_token {
                req = req.bearer_auth(token);
            }

            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;

            parse_response(&self.model, status, &body)
        })
    }
}

/// Turn an endpoint reply into the first summary, or a typed error.
fn parse_response(model: &str, status: u16, body: &str) -> Result<String, NeuralError> {
    if !(200..300).contains(&status) {
        if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
            if status == 503 {
                if let Some(estimated_secs) = err.estimated_time {
                    return Err(NeuralError::ModelLoading {
                        model: model.to_string(),
                        estimated_secs,
                    });
                }
            }
            return Err(NeuralError::Status {
                status,
                message: err.error,
            });
        }
        return Err(NeuralError::Status {
            status,
            message: body.chars().take(200).collect(),
        });
    }

    let items: Vec<SummaryItem> =
        serde_json::from_str(body).map_err(|e| NeuralError::Decode(e.to_string()))?;
    items
        .into_iter()
        .next()
        .map(|item| item.summary_text)
        .ok_or(NeuralError::EmptyResponse)
}

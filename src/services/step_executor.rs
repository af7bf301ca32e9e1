use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::models::{
    Environment, Header, HttpMethod, RequestSnapshot, ResponseSnapshot, Step, StepResult,
    StepStatus,
};
use crate::services::assertion;

/// Configuration for step execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound for one request, including reading the body
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Executes single steps against a live target. Each step is attempted exactly once.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    client: Client,
}

impl StepExecutor {
    /// Create a new StepExecutor with default config
    pub fn new() -> AppResult<Self> {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create a new StepExecutor with custom config
    pub fn with_config(config: ExecutorConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Execute one step against `base_url`.
    ///
    /// Any HTTP status is a normal outcome. A body that is not valid JSON or a
    /// transport failure (connect, DNS, timeout) yields a failed step with a
    /// status 0 response and every assertion marked `"Request failed"`.
    #[tracing::instrument(
        skip_all,
        fields(step = %step.name, method = step.method.as_str(), environment = environment.as_str())
    )]
    pub async fn execute(&self, step: &Step, base_url: &str, environment: Environment) -> StepResult {
        // Concatenated as-is, slashes are not normalized
        let url = format!("{}{}", base_url, step.endpoint);
        let headers = flatten_headers(&step.headers);

        let request = RequestSnapshot {
            method: step.method,
            url,
            headers,
            body: step.body.clone(),
        };

        let body = match parse_body(step.body.as_deref()) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Request body is not valid JSON, step not sent");
                return failed_step(step, request, e.to_string());
            }
        };

        let start = Instant::now();
        let outcome = self
            .send(step.method, &request.url, &request.headers, body.as_ref())
            .await;
        let duration_ms = start.elapsed().as_millis() as i64;

        match outcome {
            Ok(response) => {
                let assertions: Vec<_> = step
                    .assertions
                    .iter()
                    .map(|a| assertion::evaluate(a, &response, duration_ms))
                    .collect();

                let status = if assertions.iter().all(|a| a.passed) {
                    StepStatus::Passed
                } else {
                    StepStatus::Failed
                };

                tracing::debug!(
                    response_status = response.status,
                    duration_ms,
                    passed = status.is_passed(),
                    "Step executed"
                );

                StepResult {
                    name: step.name.clone(),
                    status,
                    duration_ms,
                    request,
                    response,
                    assertions,
                }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Request failed");
                failed_step(step, request, e.to_string())
            }
        }
    }

    /// Perform the round trip and capture the response
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&serde_json::Value>,
    ) -> Result<ResponseSnapshot, reqwest::Error> {
        let mut request = self.client.request(method.into(), url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        // Keeps a caller supplied Content-Type
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(key, value)| {
                (
                    key.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(ResponseSnapshot {
            status,
            headers,
            body,
        })
    }
}

/// Flatten ordered header pairs; a later duplicate key overwrites an earlier one
fn flatten_headers(headers: &[Header]) -> HashMap<String, String> {
    headers
        .iter()
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect()
}

fn parse_body(body: Option<&str>) -> Result<Option<serde_json::Value>, serde_json::Error> {
    match body {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw).map(Some),
        _ => Ok(None),
    }
}

/// Step result for a request that was never completed
fn failed_step(step: &Step, request: RequestSnapshot, reason: String) -> StepResult {
    StepResult {
        name: step.name.clone(),
        status: StepStatus::Failed,
        duration_ms: 0,
        request,
        response: ResponseSnapshot::failed(reason),
        assertions: step.assertions.iter().map(assertion::request_failed).collect(),
    }
}

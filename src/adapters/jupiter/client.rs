//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap API with retry and rate-limit backoff.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::ports::ExecutionError;
use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};

pub const DEFAULT_JUPITER_API_URL: &str = "https://api.jup.ag/swap/v1";

#[derive(Debug, Clone)]
pub struct JupiterConfig {
    pub api_base_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_JUPITER_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ExecutionError> {
        if request.amount == 0 {
            return Err(ExecutionError::InvalidParameters("quote amount is zero".into()));
        }
        let url = format!("{}/quote", self.config.api_base_url);

        let amount = request.amount.to_string();
        let slippage = request.slippage_bps.to_string();
        let mut req = self.http.get(&url).query(&[
            ("inputMint", request.input_mint.as_str()),
            ("outputMint", request.output_mint.as_str()),
            ("amount", amount.as_str()),
            ("slippageBps", slippage.as_str()),
        ]);
        if request.only_direct_routes {
            req = req.query(&[("onlyDirectRoutes", "true")]);
        }

        debug!(
            "Quote {} -> {} for {} (slippage {} bps)",
            request.input_mint, request.output_mint, request.amount, request.slippage_bps
        );
        let response = self.execute_with_retry(self.authorize(req)).await?;
        self.handle_response(response).await
    }

    /// Build the swap transaction for a quote
    pub async fn get_swap_transaction(&self, request: &SwapRequest) -> Result<SwapResponse, ExecutionError> {
        let url = format!("{}/swap", self.config.api_base_url);
        let req = self.http.post(&url).json(request);

        let response = self.execute_with_retry(self.authorize(req)).await?;
        self.handle_response(response).await
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref api_key) => req.header("x-api-key", api_key),
            None => req,
        }
    }

    /// Send with retries on transport errors, 429 and 5xx
    async fn execute_with_retry(&self, req: RequestBuilder) -> Result<reqwest::Response, ExecutionError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries.max(1) {
            let attempt_req = req
                .try_clone()
                .ok_or_else(|| ExecutionError::ApiError("Failed to clone request".into()))?;

            match attempt_req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(ExecutionError::ApiError("Rate limit exceeded".into()));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(ExecutionError::ApiError(format!("Server error: {}", status)));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(ExecutionError::ApiError(e.to_string()));
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ExecutionError::ApiError("Max retries exceeded".into())))
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if error_text.contains("SlippageToleranceExceeded") || error_text.contains("6001") {
                return Err(ExecutionError::SlippageExceeded);
            }
            return Err(ExecutionError::ApiError(format!("API error {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

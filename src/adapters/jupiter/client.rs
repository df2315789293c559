//! Jupiter API Client
//!
//! HTTP client for the Jupiter V6 swap API: quote fetching and swap
//! transaction building. Each call is a single time-bounded attempt.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};
use crate::ports::execution::{
    BuildSwapRequest, BuiltSwap, ExecutionError, SwapQuote, SwapQuoteRequest, SwapRouter,
};

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for the swap API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://quote-api.jup.ag/v6".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    /// Create a new Jupiter client with custom configuration
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Fetch a quote, returning the raw body
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<serde_json::Value, ExecutionError> {
        let url = format!("{}/quote", self.config.api_base_url.trim_end_matches('/'));

        let mut req = self.http.get(&url).query(&request.query_pairs());
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Build an unsigned swap transaction for a quote
    pub async fn get_swap_transaction(
        &self,
        request: &SwapRequest,
    ) -> Result<SwapResponse, ExecutionError> {
        let url = format!("{}/swap", self.config.api_base_url.trim_end_matches('/'));

        let mut req = self.http.post(&url).json(request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExecutionError::ApiError("Rate limit exceeded".into()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExecutionError::ApiError(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

#[async_trait]
impl SwapRouter for JupiterClient {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote, ExecutionError> {
        if request.amount == 0 {
            return Err(ExecutionError::InvalidParameters("amount must be positive".into()));
        }

        let raw = self.get_quote(&QuoteRequest::from(request)).await?;
        let quote = QuoteResponse::into_swap_quote(raw);

        tracing::debug!(
            input = %request.input_mint,
            output = %request.output_mint,
            amount = request.amount,
            out_amount = ?quote.out_amount,
            "Jupiter quote received"
        );

        Ok(quote)
    }

    async fn build_swap(&self, request: &BuildSwapRequest) -> Result<BuiltSwap, ExecutionError> {
        let response = self.get_swap_transaction(&SwapRequest::from(request)).await?;
        Ok(response.into())
    }
}

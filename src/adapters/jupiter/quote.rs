//! Jupiter Quote Types
//!
//! Request and response structures for the Jupiter V6 quote API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ports::execution::{SwapQuote, SwapQuoteRequest};

/// Query parameters for `GET /quote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Restrict routing to a single hop
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteRequest {
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            only_direct_routes: false,
        }
    }

    pub fn with_direct_routes(mut self, direct: bool) -> Self {
        self.only_direct_routes = direct;
        self
    }

    /// Query pairs in the order the API documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
        ];
        if self.only_direct_routes {
            pairs.push(("onlyDirectRoutes", "true".to_string()));
        }
        pairs
    }
}

impl From<&SwapQuoteRequest> for QuoteRequest {
    fn from(request: &SwapQuoteRequest) -> Self {
        QuoteRequest::new(
            request.input_mint.to_string(),
            request.output_mint.to_string(),
            request.amount,
            request.slippage_bps,
        )
    }
}

/// Typed view over a quote body.
///
/// Every field is optional: the engine decides what a usable quote is, this
/// type only reads what is there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(default)]
    pub input_mint: Option<String>,
    #[serde(default)]
    pub output_mint: Option<String>,
    #[serde(default)]
    pub in_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub out_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub other_amount_threshold: Option<serde_json::Value>,
    #[serde(default)]
    pub price_impact_pct: Option<serde_json::Value>,
    #[serde(default)]
    pub slippage_bps: Option<u16>,
    /// Route plan and anything else the API adds
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    /// Output amount in base units, if present and numeric
    pub fn output_amount(&self) -> Option<u64> {
        self.out_amount.as_ref().and_then(parse_amount)
    }

    pub fn input_amount(&self) -> Option<u64> {
        self.in_amount.as_ref().and_then(parse_amount)
    }

    pub fn min_output_amount(&self) -> Option<u64> {
        self.other_amount_threshold.as_ref().and_then(parse_amount)
    }

    /// Price impact as a percentage
    pub fn price_impact(&self) -> Option<f64> {
        match self.price_impact_pct.as_ref()? {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Wrap the raw body into the port-level quote
    pub fn into_swap_quote(raw: serde_json::Value) -> SwapQuote {
        let typed: QuoteResponse = serde_json::from_value(raw.clone()).unwrap_or_default();
        SwapQuote {
            out_amount: typed.output_amount(),
            price_impact_pct: typed.price_impact(),
            raw,
        }
    }
}

/// Jupiter encodes amounts as decimal strings; accept bare numbers too
fn parse_amount(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

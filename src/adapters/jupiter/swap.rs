//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter V6 swap API.

use serde::{Deserialize, Serialize};

use crate::ports::execution::{BuildSwapRequest, BuiltSwap};

/// Body for `POST /swap`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Wallet that will sign the transaction
    pub user_public_key: String,
    /// The full quote body from `/quote`, echoed back
    pub quote_response: serde_json::Value,
    /// Wrap SOL into WSOL on the way in and unwrap on the way out
    #[serde(rename = "wrapAndUnwrapSol")]
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_compute_unit_limit: bool,
    pub as_legacy_transaction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_destination: Option<String>,
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            quote_response,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            as_legacy_transaction: false,
            fee_bps: None,
            fee_destination: None,
        }
    }

    /// Take `fee_bps` of the swap into `destination`
    pub fn with_fee(mut self, fee_bps: u16, destination: String) -> Self {
        self.fee_bps = Some(fee_bps);
        self.fee_destination = Some(destination);
        self
    }
}

impl From<&BuildSwapRequest> for SwapRequest {
    fn from(request: &BuildSwapRequest) -> Self {
        let swap = SwapRequest::new(
            request.user_public_key.to_string(),
            request.quote.raw.clone(),
        );
        match &request.fee {
            Some(fee) => swap.with_fee(fee.fee_bps, fee.fee_destination.to_string()),
            None => swap,
        }
    }
}

/// Response from `POST /swap`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded transaction ready to sign
    #[serde(default)]
    pub swap_transaction: Option<String>,
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
    #[serde(default)]
    pub prioritization_fee_lamports: Option<u64>,
}

impl SwapResponse {
    /// Decode the transaction payload from base64
    pub fn transaction_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        use base64::Engine;
        self.swap_transaction
            .as_deref()
            .map(|tx| base64::engine::general_purpose::STANDARD.decode(tx))
    }
}

impl From<SwapResponse> for BuiltSwap {
    fn from(response: SwapResponse) -> Self {
        BuiltSwap {
            swap_transaction: response.swap_transaction.filter(|tx| !tx.is_empty()),
            last_valid_block_height: response.last_valid_block_height,
        }
    }
}

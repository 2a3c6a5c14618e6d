//! Jupiter Quote Types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Amount in base units of the input mint
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteRequest {
    pub fn new(input_mint: &str, output_mint: &str, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps,
            only_direct_routes: false,
        }
    }

    pub fn with_direct_routes(mut self, direct: bool) -> Self {
        self.only_direct_routes = direct;
        self
    }
}

/// Response from Jupiter quote API. Amounts are base-unit strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    /// Minimum output amount after slippage
    pub other_amount_threshold: String,
    pub swap_mode: String,
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: String,
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    /// Unknown fields are kept so the quote can be passed back to /swap intact
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    pub fn min_output_amount(&self) -> u64 {
        self.other_amount_threshold.parse().unwrap_or(0)
    }

    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }

    /// Label of the first route hop, e.g. "Raydium"
    pub fn venue(&self) -> Option<String> {
        self.route_plan.first().map(|step| step.swap_info.label.clone())
    }

    /// All hop labels joined with " > "
    pub fn route_labels(&self) -> String {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub amm_key: String,
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_mint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "outputMint": "TKN",
        "inAmount": "50000000",
        "outAmount": "1234500000",
        "otherAmountThreshold": "1228327500",
        "swapMode": "ExactIn",
        "slippageBps": 50,
        "priceImpactPct": "0.12",
        "routePlan": [
            {"swapInfo": {"ammKey": "p1", "label": "Raydium", "inputMint": "SOL", "outputMint": "USDC",
                          "inAmount": "50000000", "outAmount": "7000000"}, "percent": 100},
            {"swapInfo": {"ammKey": "p2", "label": "Orca", "inputMint": "USDC", "outputMint": "TKN",
                          "inAmount": "7000000", "outAmount": "1234500000"}, "percent": 100}
        ],
        "contextSlot": 42,
        "platformFee": null
    }"#;

    #[test]
    fn test_quote_request_serializes_camel_case() {
        let req = QuoteRequest::new("SOL", "TKN", 1_000_000, 50).with_direct_routes(true);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["inputMint"], "SOL");
        assert_eq!(json["slippageBps"], 50);
        assert_eq!(json["onlyDirectRoutes"], true);
    }

    #[test]
    fn test_quote_response_parsing() {
        let quote: QuoteResponse = serde_json::from_str(QUOTE).unwrap();
        assert_eq!(quote.input_amount(), 50_000_000);
        assert_eq!(quote.output_amount(), 1_234_500_000);
        assert_eq!(quote.min_output_amount(), 1_228_327_500);
        assert!((quote.price_impact() - 0.12).abs() < 1e-9);
        assert_eq!(quote.venue().as_deref(), Some("Raydium"));
        assert_eq!(quote.route_labels(), "Raydium > Orca");
        assert!(quote.extra.contains_key("platformFee"));
    }
}

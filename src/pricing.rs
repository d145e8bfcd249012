//! Per-request cost estimates for the hosted vision models.

use log::info;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelPricing {
    pub input_per_1m: f64,
    pub output_per_1m: f64,
}

const GPT_4O: ModelPricing = ModelPricing {
    input_per_1m: 2.5,
    output_per_1m: 10.0,
};
const GPT_4O_MINI: ModelPricing = ModelPricing {
    input_per_1m: 0.15,
    output_per_1m: 0.6,
};

/// Unknown models are priced as `gpt-4o-mini`.
pub fn pricing_for(model: &str) -> ModelPricing {
    match model {
        "gpt-4o-2024-08-06" => GPT_4O,
        _ => GPT_4O_MINI,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostEstimate {
    pub input: f64,
    pub output: f64,
}

impl CostEstimate {
    pub fn total(&self) -> f64 {
        self.input + self.output
    }
}

pub fn estimate(usage: &TokenUsage, model: &str) -> CostEstimate {
    let p = pricing_for(model);
    CostEstimate {
        input: usage.prompt_tokens as f64 / 1_000_000.0 * p.input_per_1m,
        output: usage.completion_tokens as f64 / 1_000_000.0 * p.output_per_1m,
    }
}

pub fn log_usage(usage: &TokenUsage, model: &str) {
    let cost = estimate(usage, model);
    info!("model used: {model}");
    info!(
        "token usage - input: {}, output: {}",
        usage.prompt_tokens, usage.completion_tokens
    );
    info!(
        "estimated cost - input: ${:.6}, output: ${:.6}, total: ${:.6}",
        cost.input,
        cost.output,
        cost.total()
    );
    info!(
        "estimated cost for 1000 identical requests: ${:.2}",
        cost.total() * 1000.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpt4o_cost() {
        let usage = TokenUsage {
            prompt_tokens: 1_000_000,
            completion_tokens: 500_000,
            total_tokens: 1_500_000,
        };
        let cost = estimate(&usage, "gpt-4o-2024-08-06");
        assert!((cost.input - 2.5).abs() < 1e-9);
        assert!((cost.output - 5.0).abs() < 1e-9);
        assert!((cost.total() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_uses_mini_pricing() {
        assert_eq!(pricing_for("some-new-model"), pricing_for("gpt-4o-mini"));
    }
}

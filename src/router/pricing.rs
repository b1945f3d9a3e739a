//! Static per-model price table used for cost estimation.
//!
//! Prices are USD per 1000 tokens. Unknown models accrue no cost.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

const fn price(input_per_1k: f64, output_per_1k: f64) -> ModelPrice {
    ModelPrice {
        input_per_1k,
        output_per_1k,
    }
}

const MODEL_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4o", price(0.0025, 0.01)),
    ("gpt-4o-mini", price(0.00015, 0.0006)),
    ("gpt-4.1", price(0.002, 0.008)),
    ("gpt-4.1-mini", price(0.0004, 0.0016)),
    ("text-embedding-3-small", price(0.00002, 0.0)),
    ("text-embedding-3-large", price(0.00013, 0.0)),
    ("claude-3-5-sonnet-latest", price(0.003, 0.015)),
    ("claude-3-5-haiku-latest", price(0.0008, 0.004)),
    ("claude-3-opus-latest", price(0.015, 0.075)),
    ("gemini-1.5-flash", price(0.000075, 0.0003)),
    ("gemini-1.5-pro", price(0.00125, 0.005)),
    ("llama-3.1-70b-versatile", price(0.00059, 0.00079)),
    ("llama-3.1-8b-instant", price(0.00005, 0.00008)),
    ("mistral-large-latest", price(0.002, 0.006)),
    ("mistral-small-latest", price(0.0002, 0.0006)),
    ("deepseek-chat", price(0.00014, 0.00028)),
    ("openai/gpt-4o-mini", price(0.00015, 0.0006)),
];

pub fn price_for(model: &str) -> Option<ModelPrice> {
    MODEL_PRICES
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, price)| *price)
}

/// Estimated USD cost of one call, or `None` when the model is not priced
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    price_for(model).map(|price| {
        (input_tokens as f64 / 1000.0) * price.input_per_1k
            + (output_tokens as f64 / 1000.0) * price.output_per_1k
    })
}

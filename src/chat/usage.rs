use std::fmt;

use serde::Serialize;

use crate::relay::protocol::Usage;

/// Running token counters for the main model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub requests: u64,
}

impl TokenUsage {
    pub fn record(&mut self, usage: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(usage.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(usage.output_tokens);
        self.requests = self.requests.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl fmt::Display for TokenUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:>10} {:>10} {:>10}", "Model", "Input", "Output", "Requests")?;
        write!(
            f,
            "{:<12} {:>10} {:>10} {:>10}",
            "Main Model", self.input_tokens, self.output_tokens, self.requests
        )
    }
}

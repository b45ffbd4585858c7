//! Prompt Budgeter (K): token estimation, head/tail-preserving
//! compression, and cumulative per-request accounting (§4.8).

use crate::error::{Error, Result};
use tracing::warn;

/// Default maximum prompt size the controller will send to the gateway
/// without compressing first (§4.3).
pub const DEFAULT_MAX_PROMPT_TOKENS: u64 = 12_000;

/// Heuristic token estimate: `ceil(len(text) / 4)`. Implementations may
/// substitute a model-specific tokenizer (§4.8).
#[must_use]
pub fn estimate(text: &str) -> u64 {
    ((text.len() as u64) + 3) / 4
}

/// Compress `text` to fit within `max_tokens`, preserving the first 20%
/// and last 20% of characters (sized to the character budget
/// `4 * max_tokens`) joined by a truncation marker. Returns the input
/// unchanged if it already fits.
#[must_use]
pub fn compress(text: &str, max_tokens: u64) -> String {
    let before = estimate(text);
    if before <= max_tokens {
        return text.to_string();
    }

    let char_budget = (max_tokens * 4) as usize;
    let head_len = (char_budget as f64 * 0.2) as usize;
    let tail_len = (char_budget as f64 * 0.2) as usize;

    let chars: Vec<char> = text.chars().collect();
    let head: String = chars.iter().take(head_len).collect();
    let tail: String = chars.iter().rev().take(tail_len).collect::<Vec<_>>().into_iter().rev().collect();

    let marker = "\n...[truncated for token budget]...\n";
    let compressed = format!("{head}{marker}{tail}");
    let after = estimate(&compressed);
    warn!(before, after, max_tokens, "compressed prompt to fit token budget");
    compressed
}

/// Cumulative per-request token accounting. Raises
/// [`Error::TokenBudgetExceeded`] once `account` would push the running
/// total over `request_budget` (§4.8).
#[derive(Debug, Clone)]
pub struct TokenAccount {
    request_budget: u64,
    used: u64,
}

impl TokenAccount {
    #[must_use]
    pub fn new(request_budget: u64) -> Self {
        Self {
            request_budget,
            used: 0,
        }
    }

    /// Record a call's token usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenBudgetExceeded`] if the new cumulative total
    /// exceeds `request_budget`. The account's internal total is still
    /// updated so a caller inspecting `used()` after the error sees the
    /// true cumulative cost.
    pub fn account(&mut self, prompt_tokens: u64, completion_tokens: u64) -> Result<()> {
        self.used += prompt_tokens + completion_tokens;
        if self.used > self.request_budget {
            return Err(Error::TokenBudgetExceeded {
                used: self.used,
                budget: self.request_budget,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn used(&self) -> u64 {
        self.used
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.request_budget.saturating_sub(self.used)
    }
}

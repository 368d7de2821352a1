//! Token accounting

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Tokens spent by one call, or summed over many
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl AddAssign<&Usage> for Usage {
    fn add_assign(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Running totals for a crew run, overall and per model
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total: Usage,
    pub by_model: BTreeMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total += usage;
        *self.by_model.entry(model.to_string()).or_default() += usage;
    }

    pub fn total_tokens(&self) -> usize {
        self.total.prompt_tokens + self.total.completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: usize, completion: usize) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[test]
    fn test_tracks_per_model() {
        let mut tracker = UsageTracker::new();
        tracker.track("gpt-3.5-turbo", &usage(100, 50));
        tracker.track("gpt-3.5-turbo", &usage(200, 100));
        tracker.track("gpt-4o-mini", &usage(10, 5));

        assert_eq!(tracker.total_calls, 3);
        assert_eq!(tracker.total_tokens(), 465);
        assert_eq!(tracker.by_model["gpt-3.5-turbo"], usage(300, 150));
        assert_eq!(tracker.by_model.len(), 2);
    }

    #[test]
    fn test_empty_tracker_serializes() {
        let json = serde_json::to_value(UsageTracker::new()).unwrap();
        assert_eq!(json["total_calls"], 0);
        assert_eq!(json["total"]["total_tokens"], 0);
    }
}

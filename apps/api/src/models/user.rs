use serde::{Deserialize, Serialize};

/// Subscription level of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
}

impl PlanTier {
    pub fn is_premium(&self) -> bool {
        matches!(self, PlanTier::Premium)
    }
}

/// The authenticated caller of a request, as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub plan: PlanTier,
    /// Free-tier operations already consumed. Always 0 for premium callers.
    pub free_usage: u32,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, plan: PlanTier, free_usage: u32) -> Self {
        let free_usage = if plan.is_premium() { 0 } else { free_usage };
        Self {
            user_id: user_id.into(),
            plan,
            free_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_caller_reports_zero_usage() {
        let caller = Caller::new("user_1", PlanTier::Premium, 7);
        assert_eq!(caller.free_usage, 0);
    }

    #[test]
    fn test_free_caller_keeps_usage() {
        let caller = Caller::new("user_1", PlanTier::Free, 7);
        assert_eq!(caller.free_usage, 7);
    }
}

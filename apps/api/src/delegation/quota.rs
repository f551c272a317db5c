//! Plan gating and free-tier allowance.
//!
//! The gate reads the counter the identity provider reported at request start;
//! the increment happens after persistence. Two concurrent requests from the same
//! free caller can both pass the gate with the last allowance left.

use crate::delegation::outcome::{Failure, LIMIT_REACHED, PREMIUM_ONLY};
use crate::models::user::Caller;

/// Free-tier operations allowed before a caller must upgrade.
pub const FREE_USAGE_LIMIT: u32 = 10;

/// Who may run an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Open to free callers until the allowance is spent.
    FreeTier,
    PremiumOnly,
}

/// What the request costs the caller once it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charge {
    Waived,
    /// Store `next_usage` as the caller's new free-usage count.
    FreeUsage { next_usage: u32 },
}

/// Admits or refuses a caller for an operation.
pub fn check(access: Access, caller: &Caller) -> Result<Charge, Failure> {
    if caller.plan.is_premium() {
        return Ok(Charge::Waived);
    }

    match access {
        Access::PremiumOnly => Err(Failure::quota(PREMIUM_ONLY)),
        Access::FreeTier if caller.free_usage >= FREE_USAGE_LIMIT => {
            Err(Failure::quota(LIMIT_REACHED))
        }
        Access::FreeTier => Ok(Charge::FreeUsage {
            next_usage: caller.free_usage + 1,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::outcome::FailureKind;
    use crate::models::user::PlanTier;

    fn free(usage: u32) -> Caller {
        Caller::new("user_free", PlanTier::Free, usage)
    }

    fn premium() -> Caller {
        Caller::new("user_premium", PlanTier::Premium, 0)
    }

    #[test]
    fn test_premium_is_never_charged() {
        assert_eq!(check(Access::FreeTier, &premium()), Ok(Charge::Waived));
        assert_eq!(check(Access::PremiumOnly, &premium()), Ok(Charge::Waived));
    }

    #[test]
    fn test_free_caller_refused_premium_feature() {
        let err = check(Access::PremiumOnly, &free(0)).unwrap_err();
        assert_eq!(err.kind, FailureKind::Quota);
        assert_eq!(err.message, PREMIUM_ONLY);
    }

    #[test]
    fn test_free_caller_under_limit_is_charged_one() {
        assert_eq!(
            check(Access::FreeTier, &free(0)),
            Ok(Charge::FreeUsage { next_usage: 1 })
        );
        assert_eq!(
            check(Access::FreeTier, &free(9)),
            Ok(Charge::FreeUsage { next_usage: 10 })
        );
    }

    #[test]
    fn test_free_caller_at_or_over_limit_refused() {
        for usage in [FREE_USAGE_LIMIT, FREE_USAGE_LIMIT + 5] {
            let err = check(Access::FreeTier, &free(usage)).unwrap_err();
            assert_eq!(err.kind, FailureKind::Quota);
            assert_eq!(err.message, LIMIT_REACHED);
        }
    }
}

//! Payout rule chain: decides whether a commission is currently payable.

use crate::domain::{BlockReason, Commission, PayoutPolicy};
use chrono::{DateTime, Utc};

/// Everything a rule may inspect. The evaluator never mutates any of it.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub policy: &'a PayoutPolicy,
    pub commission: &'a Commission,
    /// New-customer fact for this commission. At creation time this is the
    /// freshly computed value; on re-evaluation it is the stored snapshot.
    pub is_new_customer: bool,
    pub now: DateTime<Utc>,
}

/// Outcome of running the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutDecision {
    pub payable: bool,
    pub reason: Option<BlockReason>,
}

impl PayoutDecision {
    fn payable() -> Self {
        PayoutDecision {
            payable: true,
            reason: None,
        }
    }

    fn blocked(reason: BlockReason) -> Self {
        PayoutDecision {
            payable: false,
            reason: Some(reason),
        }
    }
}

/// One predicate+reason pair in the chain.
#[derive(Clone)]
struct PayoutRule {
    reason: BlockReason,
    blocks: fn(&EvaluationContext) -> bool,
}

/// Ordered rule chain. Rules run in priority order and the FIRST failing
/// rule determines the reason; later failures are never reported. New rules
/// are added by appending to the list in `standard`, not by editing
/// conditionals elsewhere.
#[derive(Clone)]
pub struct PayoutEvaluator {
    rules: Vec<PayoutRule>,
}

impl PayoutEvaluator {
    /// The standard chain, in priority order: new-customer gate, then
    /// coupon-usage gate, then validity window.
    pub fn standard() -> Self {
        PayoutEvaluator {
            rules: vec![
                PayoutRule {
                    reason: BlockReason::NewCustomersOnly,
                    blocks: |ctx| ctx.policy.new_customers_only && !ctx.is_new_customer,
                },
                PayoutRule {
                    reason: BlockReason::CouponValueNotUsed,
                    blocks: |ctx| {
                        ctx.policy.require_coupon_usage
                            && ctx.commission.coupon_code.is_some()
                            && ctx.commission.coupon_value_used
                                < ctx.commission.coupon_value_required
                    },
                },
                PayoutRule {
                    reason: BlockReason::OutsideCommissionPeriod,
                    // Strictly after: a commission is still payable at the
                    // exact valid_until instant.
                    blocks: |ctx| ctx.now > ctx.commission.valid_until,
                },
            ],
        }
    }

    /// Run the chain. Returns the first blocking reason, or payable.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> PayoutDecision {
        for rule in &self.rules {
            if (rule.blocks)(ctx) {
                return PayoutDecision::blocked(rule.reason);
            }
        }
        PayoutDecision::payable()
    }
}

impl Default for PayoutEvaluator {
    fn default() -> Self {
        Self::standard()
    }
}

//! Coupon redemption reporting: accumulates redeemed value on a commission
//! and re-runs the payout rules so blocked commissions can recover.

use crate::db::Store;
use crate::domain::{Commission, CommissionStatus, Money, OrderId};
use crate::engine::{EvaluationContext, PayoutEvaluator};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("no commission recorded for order {0}")]
    UnknownOrder(OrderId),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome of applying reported coupon usage.
#[derive(Debug)]
pub struct RedemptionResult {
    pub commission: Commission,
    /// True when this report moved the commission out of pending/blocked.
    pub newly_approved: bool,
}

#[derive(Clone)]
pub struct CouponUsageTracker {
    store: Arc<dyn Store>,
    evaluator: PayoutEvaluator,
}

impl CouponUsageTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            evaluator: PayoutEvaluator::standard(),
        }
    }

    /// Apply redeemed coupon value to the most recent commission for the
    /// order, then re-run the full rule chain against the updated row.
    ///
    /// Only pending and blocked commissions can change state here. Paid and
    /// refunded are terminal, and an approved commission stays approved. The
    /// new-customer fact is the snapshot taken at conversion time, so a
    /// commission blocked for a returning customer never recovers through
    /// coupon usage alone.
    pub async fn apply_usage(
        &self,
        order_id: &OrderId,
        amount: Money,
    ) -> Result<RedemptionResult, RedemptionError> {
        let commission = self
            .store
            .latest_commission_for_order(order_id)
            .await?
            .ok_or_else(|| RedemptionError::UnknownOrder(order_id.clone()))?;

        let mut updated = self
            .store
            .add_coupon_value_used(commission.id, amount)
            .await?;

        let newly_approved = match updated.status {
            CommissionStatus::Pending | CommissionStatus::Blocked => {
                let partner = self
                    .store
                    .get_partner(updated.partner_id)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;

                let decision = self.evaluator.evaluate(&EvaluationContext {
                    policy: &partner.policy,
                    commission: &updated,
                    is_new_customer: updated.is_new_customer,
                    now: Utc::now(),
                });

                if decision.payable {
                    self.store
                        .update_commission_status(updated.id, CommissionStatus::Approved, None)
                        .await?;
                    updated.status = CommissionStatus::Approved;
                    updated.block_reason = None;
                    true
                } else {
                    // Keep the stored reason current; the first failing rule
                    // may have changed since the block was written.
                    self.store
                        .update_commission_status(
                            updated.id,
                            CommissionStatus::Blocked,
                            decision.reason,
                        )
                        .await?;
                    updated.status = CommissionStatus::Blocked;
                    updated.block_reason = decision.reason;
                    false
                }
            }
            CommissionStatus::Approved | CommissionStatus::Paid | CommissionStatus::Refunded => {
                false
            }
        };

        info!(
            order_id = %order_id,
            commission_id = updated.id,
            amount = %amount,
            total_used = %updated.coupon_value_used,
            newly_approved,
            "Applied coupon usage"
        );

        Ok(RedemptionResult {
            commission: updated,
            newly_approved,
        })
    }
}

//! Conversion processing: turns a referral webhook event into a commission
//! row, a customer history entry, and updated partner aggregates.

use crate::db::Store;
use crate::domain::{
    BlockReason, Commission, CommissionStatus, Coupon, CouponCode, EmailAddress, Money,
    NewCommission, OrderId, ReferralCode,
};
use crate::engine::{commission_amount, EvaluationContext, PayoutEvaluator};
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// A referral conversion reported by the shop webhook.
#[derive(Debug, Clone)]
pub struct ConversionEvent {
    pub referral_code: ReferralCode,
    pub order_id: OrderId,
    pub customer_email: EmailAddress,
    pub order_value: Money,
    pub coupon_code: Option<CouponCode>,
}

/// Result of processing one conversion.
#[derive(Debug)]
pub enum ConversionOutcome {
    /// A new commission was recorded.
    Processed(ProcessedConversion),
    /// The order id was already processed; nothing was written.
    Duplicate(Commission),
}

#[derive(Debug)]
pub struct ProcessedConversion {
    pub commission: Commission,
    pub payable: bool,
    pub reason: Option<BlockReason>,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("unknown referral code: {0}")]
    UnknownReferralCode(ReferralCode),
    #[error("partner {0} is not active")]
    PartnerInactive(i64),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct CommissionProcessor {
    store: Arc<dyn Store>,
    evaluator: PayoutEvaluator,
}

impl CommissionProcessor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            evaluator: PayoutEvaluator::standard(),
        }
    }

    /// Process a conversion end to end.
    ///
    /// Ordering matters in two places: the new-customer check reads history
    /// before this order is folded in, and the payout rules run against the
    /// commission row exactly as stored.
    pub async fn process(&self, event: ConversionEvent) -> Result<ConversionOutcome, ProcessError> {
        let partner = self
            .store
            .get_partner_by_referral_code(&event.referral_code)
            .await?
            .ok_or_else(|| ProcessError::UnknownReferralCode(event.referral_code.clone()))?;

        if !partner.is_active() {
            return Err(ProcessError::PartnerInactive(partner.id));
        }

        if let Some(existing) = self
            .store
            .latest_commission_for_order(&event.order_id)
            .await?
        {
            info!(
                order_id = %event.order_id,
                commission_id = existing.id,
                "Conversion already processed, skipping"
            );
            return Ok(ConversionOutcome::Duplicate(existing));
        }

        let now = Utc::now();
        let coupon = self.resolve_coupon(&event, partner.id, now).await?;
        let coupon_discount = coupon
            .as_ref()
            .map(|c| c.discount_for(event.order_value))
            .unwrap_or_else(Money::zero);

        // Must be read before record_customer_order folds this order in.
        let is_new_customer = self
            .store
            .find_customer_history(&event.customer_email)
            .await?
            .is_none();

        let history = self
            .store
            .record_customer_order(
                &event.customer_email,
                &event.order_id,
                partner.id,
                event.order_value,
                now,
            )
            .await?;

        let amount = commission_amount(
            event.order_value,
            partner.commission_rate,
            partner.commission_kind,
        );
        let valid_until = now
            .checked_add_months(Months::new(partner.policy.commission_period_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut commission = self
            .store
            .insert_commission(&NewCommission {
                partner_id: partner.id,
                order_id: event.order_id.clone(),
                customer_email: event.customer_email.clone(),
                order_value: event.order_value,
                amount,
                rate: partner.commission_rate,
                coupon_code: event.coupon_code.clone(),
                coupon_discount,
                is_new_customer,
                customer_first_order_date: history.first_order_date,
                valid_until,
                coupon_value_used: Money::zero(),
                coupon_value_required: coupon_discount,
                created_at: now,
            })
            .await?;

        let decision = self.evaluator.evaluate(&EvaluationContext {
            policy: &partner.policy,
            commission: &commission,
            is_new_customer,
            now,
        });

        if decision.payable {
            self.store
                .update_commission_status(commission.id, CommissionStatus::Approved, None)
                .await?;
            commission.status = CommissionStatus::Approved;
            commission.block_reason = None;
        } else {
            self.store
                .update_commission_status(commission.id, CommissionStatus::Blocked, decision.reason)
                .await?;
            commission.status = CommissionStatus::Blocked;
            commission.block_reason = decision.reason;
        }

        if let Some(coupon) = &coupon {
            self.store.increment_coupon_usage(coupon.id).await?;
        }

        self.store
            .record_conversion_stats(partner.id, event.order_value, amount)
            .await?;

        info!(
            partner_id = partner.id,
            order_id = %commission.order_id,
            amount = %commission.amount,
            payable = decision.payable,
            reason = decision.reason.map(|r| r.as_str()),
            "Processed conversion"
        );

        Ok(ConversionOutcome::Processed(ProcessedConversion {
            commission,
            payable: decision.payable,
            reason: decision.reason,
        }))
    }

    /// Find the coupon a conversion names, if it grants a discount here.
    ///
    /// An unknown code, a code owned by another partner, or a coupon that is
    /// no longer redeemable all degrade to "no discount" rather than failing
    /// the conversion. The code string itself is still stored on the
    /// commission for audit.
    async fn resolve_coupon(
        &self,
        event: &ConversionEvent,
        partner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Coupon>, sqlx::Error> {
        let Some(code) = &event.coupon_code else {
            return Ok(None);
        };

        let Some(coupon) = self.store.get_coupon_by_code(code).await? else {
            warn!(order_id = %event.order_id, coupon_code = %code, "Unknown coupon code on conversion");
            return Ok(None);
        };

        if coupon.partner_id != partner_id {
            warn!(
                order_id = %event.order_id,
                coupon_code = %code,
                coupon_partner_id = coupon.partner_id,
                partner_id,
                "Coupon belongs to a different partner, ignoring"
            );
            return Ok(None);
        }

        if !coupon.is_redeemable(now) {
            warn!(order_id = %event.order_id, coupon_code = %code, "Coupon is not redeemable, ignoring");
            return Ok(None);
        }

        Ok(Some(coupon))
    }
}

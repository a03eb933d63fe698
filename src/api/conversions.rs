use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{Commission, CommissionStatus, CouponCode, EmailAddress, Money, OrderId, ReferralCode};
use crate::error::AppError;
use crate::orchestration::{ConversionEvent, ConversionOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub referral_code: String,
    pub order_id: String,
    pub customer_email: String,
    /// Accepts a JSON number or a decimal string.
    pub order_value: Decimal,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub success: bool,
    /// True when this order id had already been processed and no new
    /// records were written.
    pub duplicate: bool,
    pub should_pay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub commission: CommissionDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionDto {
    pub id: i64,
    pub partner_id: i64,
    pub order_id: String,
    pub customer_email: String,
    pub order_value: String,
    pub amount: String,
    pub rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub coupon_discount: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    pub is_new_customer: bool,
    pub first_order_date_ms: i64,
    pub valid_until_ms: i64,
    pub coupon_value_used: String,
    pub coupon_value_required: String,
    pub created_at_ms: i64,
}

impl From<Commission> for CommissionDto {
    fn from(c: Commission) -> Self {
        CommissionDto {
            id: c.id,
            partner_id: c.partner_id,
            order_id: c.order_id.to_string(),
            customer_email: c.customer_email.to_string(),
            order_value: c.order_value.to_canonical_string(),
            amount: c.amount.to_canonical_string(),
            rate: c.rate.to_canonical_string(),
            coupon_code: c.coupon_code.map(|code| code.to_string()),
            coupon_discount: c.coupon_discount.to_canonical_string(),
            status: c.status.as_str().to_string(),
            block_reason: c.block_reason.map(|r| r.as_str().to_string()),
            is_new_customer: c.is_new_customer,
            first_order_date_ms: c.customer_first_order_date.timestamp_millis(),
            valid_until_ms: c.valid_until.timestamp_millis(),
            coupon_value_used: c.coupon_value_used.to_canonical_string(),
            coupon_value_required: c.coupon_value_required.to_canonical_string(),
            created_at_ms: c.created_at.timestamp_millis(),
        }
    }
}

pub async fn post_conversion(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<ConversionResponse>, AppError> {
    let Json(req) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid conversion payload: {}", e)))?;

    let customer_email = EmailAddress::from_str(&req.customer_email)
        .map_err(|_| AppError::BadRequest("Invalid customer email".into()))?;
    let order_value = Money::new(req.order_value);
    if !order_value.is_positive() {
        return Err(AppError::BadRequest("orderValue must be positive".into()));
    }
    if req.order_id.trim().is_empty() {
        return Err(AppError::BadRequest("orderId must not be empty".into()));
    }

    let outcome = state
        .processor
        .process(ConversionEvent {
            referral_code: ReferralCode::new(req.referral_code),
            order_id: OrderId::new(req.order_id),
            customer_email,
            order_value,
            coupon_code: req
                .coupon_code
                .filter(|c| !c.trim().is_empty())
                .map(CouponCode::new),
        })
        .await?;

    let response = match outcome {
        ConversionOutcome::Processed(p) => ConversionResponse {
            success: true,
            duplicate: false,
            should_pay: p.payable,
            reason: p.reason.map(|r| r.as_str().to_string()),
            commission: p.commission.into(),
        },
        ConversionOutcome::Duplicate(existing) => ConversionResponse {
            success: true,
            duplicate: true,
            should_pay: existing.status == CommissionStatus::Approved,
            reason: existing.block_reason.map(|r| r.as_str().to_string()),
            commission: existing.into(),
        },
    };

    Ok(Json(response))
}

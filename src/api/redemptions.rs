use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::conversions::CommissionDto;
use crate::api::AppState;
use crate::domain::{Money, OrderId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsageRequest {
    pub order_id: String,
    /// Accepts a JSON number or a decimal string.
    pub amount_used: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsageResponse {
    pub success: bool,
    /// True when this report moved the commission to approved.
    pub newly_approved: bool,
    pub commission: CommissionDto,
}

pub async fn post_coupon_usage(
    State(state): State<AppState>,
    payload: Result<Json<CouponUsageRequest>, JsonRejection>,
) -> Result<Json<CouponUsageResponse>, AppError> {
    let Json(req) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid coupon usage payload: {}", e)))?;

    let amount = Money::new(req.amount_used);
    if !amount.is_positive() {
        return Err(AppError::BadRequest("amountUsed must be positive".into()));
    }
    if req.order_id.trim().is_empty() {
        return Err(AppError::BadRequest("orderId must not be empty".into()));
    }

    let result = state
        .tracker
        .apply_usage(&OrderId::new(req.order_id), amount)
        .await?;

    Ok(Json(CouponUsageResponse {
        success: true,
        newly_approved: result.newly_approved,
        commission: result.commission.into(),
    }))
}

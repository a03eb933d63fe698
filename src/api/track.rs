use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Redirect;
use chrono::Utc;

use crate::api::AppState;
use crate::domain::ReferralCode;
use crate::error::AppError;

/// Record a tracking-link click and send the visitor on to the shop's
/// signup page, carrying the referral code as a query parameter.
pub async fn track_click(
    Path(referral_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let code = ReferralCode::new(referral_code);
    let partner = state
        .store
        .get_partner_by_referral_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown referral code: {}", code)))?;

    // Client address comes from the proxy header; the service itself only
    // ever sees the load balancer's socket.
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
    let referrer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());

    state
        .store
        .record_click(partner.id, &ip_address, user_agent, referrer, Utc::now())
        .await?;

    let url = format!("{}?ref={}", state.config.signup_redirect_url, code);
    Ok(Redirect::temporary(&url))
}

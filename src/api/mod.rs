pub mod conversions;
pub mod health;
pub mod redemptions;
pub mod track;

use crate::config::Config;
use crate::db::Store;
use crate::orchestration::{CommissionProcessor, CouponUsageTracker};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub processor: CommissionProcessor,
    pub tracker: CouponUsageTracker,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            processor: CommissionProcessor::new(store.clone()),
            tracker: CouponUsageTracker::new(store.clone()),
            store,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/t/:referral_code", get(track::track_click))
        .route(
            "/v1/webhooks/conversion",
            post(conversions::post_conversion),
        )
        .route(
            "/v1/webhooks/coupon-usage",
            post(redemptions::post_coupon_usage),
        )
        .layer(cors)
        .with_state(state)
}

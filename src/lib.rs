pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository, Store};
pub use domain::{
    BlockReason, Commission, CommissionKind, CommissionStatus, Coupon, CouponCode, CouponStatus,
    CustomerHistory, EmailAddress, Money, OrderId, Partner, PartnerStatus, PayoutPolicy,
    ReferralCode,
};
pub use error::AppError;

//! Pure decision logic: commission calculation and the payout rule chain.
//!
//! Nothing in this module performs I/O; the orchestration layer feeds it
//! loaded records and persists its decisions.

pub mod calculator;
pub mod rules;

pub use calculator::commission_amount;
pub use rules::{EvaluationContext, PayoutDecision, PayoutEvaluator};

//! Commission rows: insert with snapshot fields, status transitions, and
//! coupon usage accumulation.

use super::{datetime_from_millis, parse_money_col, Repository};
use crate::domain::{
    BlockReason, Commission, CommissionStatus, CouponCode, EmailAddress, Money, NewCommission,
    OrderId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

fn map_commission_row(row: &SqliteRow) -> Commission {
    let id: i64 = row.get("id");
    let order_id: String = row.get("order_id");

    let status_str: String = row.get("status");
    let status = CommissionStatus::from_str(&status_str).unwrap_or_else(|e| {
        warn!(commission_id = id, error = %e, "Unknown commission status in database, treating as pending");
        CommissionStatus::Pending
    });

    let block_reason = row
        .get::<Option<String>, _>("block_reason")
        .and_then(|s| match BlockReason::from_str(&s) {
            Ok(reason) => Some(reason),
            Err(e) => {
                warn!(commission_id = id, error = %e, "Unknown block reason in database, dropping it");
                None
            }
        });

    let order_value_str: String = row.get("order_value");
    let amount_str: String = row.get("commission_amount");
    let rate_str: String = row.get("commission_rate");
    let discount_str: String = row.get("coupon_discount");
    let used_str: String = row.get("coupon_value_used");
    let required_str: String = row.get("coupon_value_required");

    Commission {
        id,
        partner_id: row.get("partner_id"),
        customer_email: EmailAddress::from_stored(row.get("customer_email")),
        order_value: parse_money_col(&order_value_str, "order_value", &order_id),
        amount: parse_money_col(&amount_str, "commission_amount", &order_id),
        rate: parse_money_col(&rate_str, "commission_rate", &order_id),
        coupon_code: row
            .get::<Option<String>, _>("coupon_code")
            .map(CouponCode::new),
        coupon_discount: parse_money_col(&discount_str, "coupon_discount", &order_id),
        status,
        block_reason,
        is_new_customer: row.get("is_new_customer"),
        customer_first_order_date: datetime_from_millis(row.get("customer_first_order_date")),
        valid_until: datetime_from_millis(row.get("valid_until")),
        coupon_value_used: parse_money_col(&used_str, "coupon_value_used", &order_id),
        coupon_value_required: parse_money_col(&required_str, "coupon_value_required", &order_id),
        created_at: datetime_from_millis(row.get("created_at")),
        order_id: OrderId::new(order_id),
    }
}

impl Repository {
    /// Insert a commission in pending status and return the stored row.
    ///
    /// Rate and new-customer flag are snapshots taken at conversion time and
    /// never rewritten afterwards.
    pub async fn insert_commission(
        &self,
        commission: &NewCommission,
    ) -> Result<Commission, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO commissions
                (partner_id, order_id, customer_email, order_value, commission_amount,
                 commission_rate, coupon_code, coupon_discount, status, block_reason,
                 is_new_customer, customer_first_order_date, valid_until,
                 coupon_value_used, coupon_value_required, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', NULL, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(commission.partner_id)
        .bind(commission.order_id.as_str())
        .bind(commission.customer_email.as_str())
        .bind(commission.order_value.to_canonical_string())
        .bind(commission.amount.to_canonical_string())
        .bind(commission.rate.to_canonical_string())
        .bind(commission.coupon_code.as_ref().map(|c| c.as_str().to_string()))
        .bind(commission.coupon_discount.to_canonical_string())
        .bind(commission.is_new_customer)
        .bind(commission.customer_first_order_date.timestamp_millis())
        .bind(commission.valid_until.timestamp_millis())
        .bind(commission.coupon_value_used.to_canonical_string())
        .bind(commission.coupon_value_required.to_canonical_string())
        .bind(commission.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_commission(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Fetch a commission by primary key.
    pub async fn get_commission(&self, id: i64) -> Result<Option<Commission>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM commissions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_commission_row))
    }

    /// The most recently created commission for an order id, if any.
    pub async fn latest_commission_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Commission>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT * FROM commissions
            WHERE order_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_commission_row))
    }

    /// Move a commission to a new status, replacing the stored block reason.
    pub async fn update_commission_status(
        &self,
        id: i64,
        status: CommissionStatus,
        reason: Option<BlockReason>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE commissions SET status = ?, block_reason = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(reason.map(|r| r.as_str().to_string()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add redeemed coupon value to a commission and return the updated row.
    pub async fn add_coupon_value_used(
        &self,
        id: i64,
        amount: Money,
    ) -> Result<Commission, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT order_id, coupon_value_used FROM commissions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let order_id: String = row.get("order_id");
        let used_str: String = row.get("coupon_value_used");
        let used = parse_money_col(&used_str, "coupon_value_used", &order_id) + amount;

        sqlx::query("UPDATE commissions SET coupon_value_used = ? WHERE id = ?")
            .bind(used.to_canonical_string())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_commission(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}

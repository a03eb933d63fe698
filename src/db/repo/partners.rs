//! Partner rows, running aggregates, click recording, and cascade delete.

use super::{datetime_from_millis, parse_money_col, Repository};
use crate::domain::{
    Click, CommissionKind, Money, NewPartner, Partner, PartnerStatus, PayoutPolicy, ReferralCode,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

fn map_partner_row(row: &SqliteRow) -> Partner {
    let id: i64 = row.get("id");

    let status_str: String = row.get("status");
    let status = PartnerStatus::from_str(&status_str).unwrap_or_else(|e| {
        warn!(partner_id = id, error = %e, "Unknown partner status in database, treating as inactive");
        PartnerStatus::Inactive
    });

    let kind_str: String = row.get("commission_kind");
    let commission_kind = CommissionKind::from_str(&kind_str).unwrap_or_else(|e| {
        warn!(partner_id = id, error = %e, "Unknown commission kind in database, treating as percentage");
        CommissionKind::Percentage
    });

    let email: String = row.get("email");
    let rate_str: String = row.get("commission_rate");
    let revenue_str: String = row.get("total_revenue");
    let commissions_str: String = row.get("total_commissions");
    let months: i64 = row.get("commission_period_months");

    Partner {
        id,
        name: row.get("name"),
        referral_code: ReferralCode::new(row.get::<String, _>("referral_code")),
        status,
        commission_rate: parse_money_col(&rate_str, "commission_rate", &email),
        commission_kind,
        policy: PayoutPolicy {
            new_customers_only: row.get("new_customers_only"),
            commission_period_months: u32::try_from(months).unwrap_or(12),
            require_coupon_usage: row.get("require_coupon_usage"),
        },
        click_count: row.get("click_count"),
        conversion_count: row.get("conversion_count"),
        total_revenue: parse_money_col(&revenue_str, "total_revenue", &email),
        total_commissions: parse_money_col(&commissions_str, "total_commissions", &email),
        created_at: datetime_from_millis(row.get("created_at")),
        email,
    }
}

impl Repository {
    /// Insert a new partner and return the stored row.
    pub async fn create_partner(&self, partner: &NewPartner) -> Result<Partner, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO partners
                (name, email, referral_code, status, commission_rate, commission_kind,
                 new_customers_only, commission_period_months, require_coupon_usage, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&partner.name)
        .bind(&partner.email)
        .bind(partner.referral_code.as_str())
        .bind(partner.status.as_str())
        .bind(partner.commission_rate.to_canonical_string())
        .bind(partner.commission_kind.as_str())
        .bind(partner.policy.new_customers_only)
        .bind(partner.policy.commission_period_months as i64)
        .bind(partner.policy.require_coupon_usage)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_partner(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Fetch a partner by primary key.
    pub async fn get_partner(&self, id: i64) -> Result<Option<Partner>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM partners WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_partner_row))
    }

    /// Fetch a partner by its unique referral code.
    pub async fn get_partner_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Partner>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM partners WHERE referral_code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_partner_row))
    }

    /// Change a partner's commission rate. Existing commissions keep the rate
    /// they were created with.
    pub async fn update_partner_rate(&self, id: i64, rate: Money) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE partners SET commission_rate = ? WHERE id = ?")
            .bind(rate.to_canonical_string())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Bump a partner's conversion aggregates after a processed conversion.
    ///
    /// The integer counter is incremented in SQL. The decimal totals are read,
    /// summed in Rust to keep exact arithmetic, and written back in the same
    /// transaction.
    pub async fn record_conversion_stats(
        &self,
        partner_id: i64,
        order_value: Money,
        commission: Money,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT email, total_revenue, total_commissions FROM partners WHERE id = ?")
            .bind(partner_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let email: String = row.get("email");
        let revenue_str: String = row.get("total_revenue");
        let commissions_str: String = row.get("total_commissions");
        let total_revenue = parse_money_col(&revenue_str, "total_revenue", &email) + order_value;
        let total_commissions =
            parse_money_col(&commissions_str, "total_commissions", &email) + commission;

        sqlx::query(
            r#"
            UPDATE partners
            SET conversion_count = conversion_count + 1,
                total_revenue = ?,
                total_commissions = ?
            WHERE id = ?
            "#,
        )
        .bind(total_revenue.to_canonical_string())
        .bind(total_commissions.to_canonical_string())
        .bind(partner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Record a tracking-link click and bump the partner's click counter.
    pub async fn record_click(
        &self,
        partner_id: i64,
        ip_address: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Click, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO clicks (partner_id, ip_address, user_agent, referrer, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(partner_id)
        .bind(ip_address)
        .bind(user_agent)
        .bind(referrer)
        .bind(at.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE partners SET click_count = click_count + 1 WHERE id = ?")
            .bind(partner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Click {
            id: result.last_insert_rowid(),
            partner_id,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.map(|s| s.to_string()),
            referrer: referrer.map(|s| s.to_string()),
            created_at: datetime_from_millis(at.timestamp_millis()),
        })
    }

    /// All recorded clicks for a partner, newest first.
    pub async fn list_clicks(&self, partner_id: i64) -> Result<Vec<Click>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM clicks WHERE partner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Click {
                id: row.get("id"),
                partner_id: row.get("partner_id"),
                ip_address: row.get("ip_address"),
                user_agent: row.get("user_agent"),
                referrer: row.get("referrer"),
                created_at: datetime_from_millis(row.get("created_at")),
            })
            .collect())
    }

    /// Delete a partner together with its commissions, coupons, and clicks.
    /// Customer history is global and is left untouched.
    ///
    /// Returns false when no partner with that id existed.
    pub async fn delete_partner(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM clicks WHERE partner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM coupons WHERE partner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM commissions WHERE partner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM partners WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

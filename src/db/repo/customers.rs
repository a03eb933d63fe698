//! Customer order history, keyed by normalized email across all partners.

use super::{datetime_from_millis, parse_money_col, Repository};
use crate::domain::{CustomerHistory, EmailAddress, Money, OrderId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn map_history_row(row: &SqliteRow) -> CustomerHistory {
    let customer_email: String = row.get("customer_email");
    let spent_str: String = row.get("total_spent");
    CustomerHistory {
        id: row.get("id"),
        first_order_date: datetime_from_millis(row.get("first_order_date")),
        first_order_id: OrderId::new(row.get::<String, _>("first_order_id")),
        first_partner_id: row.get("first_partner_id"),
        total_orders: row.get("total_orders"),
        total_spent: parse_money_col(&spent_str, "total_spent", &customer_email),
        last_order_date: datetime_from_millis(row.get("last_order_date")),
        customer_email: EmailAddress::from_stored(customer_email),
    }
}

impl Repository {
    /// Look up a customer's order history. `None` means the email has never
    /// placed an order through any partner.
    pub async fn find_customer_history(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<CustomerHistory>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM customer_history WHERE customer_email = ?")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_history_row))
    }

    /// Fold an order into the customer's history and return the updated row.
    ///
    /// The first order for an email creates the row. The UNIQUE constraint on
    /// customer_email makes the insert race-safe: whichever writer loses the
    /// conflict falls through to the returning-customer update path.
    pub async fn record_customer_order(
        &self,
        email: &EmailAddress,
        order_id: &OrderId,
        partner_id: i64,
        order_value: Money,
        at: DateTime<Utc>,
    ) -> Result<CustomerHistory, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO customer_history
                (customer_email, first_order_date, first_order_id, first_partner_id,
                 total_orders, total_spent, last_order_date)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(customer_email) DO NOTHING
            "#,
        )
        .bind(email.as_str())
        .bind(at.timestamp_millis())
        .bind(order_id.as_str())
        .bind(partner_id)
        .bind(order_value.to_canonical_string())
        .bind(at.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            let row = sqlx::query("SELECT total_spent FROM customer_history WHERE customer_email = ?")
                .bind(email.as_str())
                .fetch_one(&mut *tx)
                .await?;
            let spent_str: String = row.get("total_spent");
            let total_spent =
                parse_money_col(&spent_str, "total_spent", email.as_str()) + order_value;

            sqlx::query(
                r#"
                UPDATE customer_history
                SET total_orders = total_orders + 1,
                    total_spent = ?,
                    last_order_date = ?
                WHERE customer_email = ?
                "#,
            )
            .bind(total_spent.to_canonical_string())
            .bind(at.timestamp_millis())
            .bind(email.as_str())
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query("SELECT * FROM customer_history WHERE customer_email = ?")
            .bind(email.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let history = map_history_row(&row);

        tx.commit().await?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_first_order_creates_history() {
        let (repo, _temp) = setup_test_db().await;
        let email = EmailAddress::from_str("ana@example.com").unwrap();
        let now = Utc::now();

        let history = repo
            .record_customer_order(
                &email,
                &OrderId::new("ORD-1001".to_string()),
                7,
                Money::from_str_canonical("100").unwrap(),
                now,
            )
            .await
            .unwrap();

        assert_eq!(history.customer_email.as_str(), "ana@example.com");
        assert_eq!(history.total_orders, 1);
        assert_eq!(history.total_spent.to_canonical_string(), "100");
        assert_eq!(history.first_order_id.as_str(), "ORD-1001");
        assert_eq!(history.first_partner_id, 7);
        assert_eq!(history.first_order_date, history.last_order_date);
    }

    #[tokio::test]
    async fn test_repeat_order_preserves_first_order_fields() {
        let (repo, _temp) = setup_test_db().await;
        let email = EmailAddress::from_str("ana@example.com").unwrap();
        let t0 = Utc::now();

        repo.record_customer_order(
            &email,
            &OrderId::new("ORD-1001".to_string()),
            7,
            Money::from_str_canonical("100").unwrap(),
            t0,
        )
        .await
        .unwrap();

        let history = repo
            .record_customer_order(
                &email,
                &OrderId::new("ORD-1002".to_string()),
                9,
                Money::from_str_canonical("49.99").unwrap(),
                t0 + chrono::Duration::days(3),
            )
            .await
            .unwrap();

        assert_eq!(history.total_orders, 2);
        assert_eq!(history.total_spent.to_canonical_string(), "149.99");
        assert_eq!(history.first_order_id.as_str(), "ORD-1001");
        assert_eq!(history.first_partner_id, 7);
        assert!(history.last_order_date > history.first_order_date);
    }

    #[tokio::test]
    async fn test_find_customer_history_unknown_email() {
        let (repo, _temp) = setup_test_db().await;
        let email = EmailAddress::from_str("nobody@example.com").unwrap();
        assert!(repo.find_customer_history(&email).await.unwrap().is_none());
    }
}

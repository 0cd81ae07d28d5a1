//! Order and payment persistence.
//!
//! The writer treats the repository as a collaborator without multi-statement transactions:
//! header, lines and payment are separate calls and any compensation is its job.

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    addresses::AddressId,
    cart::{ProductId, UserId},
};

use super::{NewOrder, NewPayment, Order, OrderId, OrderLine, OrderStatus, PaymentStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &NewOrder) -> Result<(), anyhow::Error>;

    /// Writes every line of an order in one batch. Either all lines are written or none.
    async fn insert_order_lines(
        &self,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> Result<(), anyhow::Error>;

    async fn delete_order(&self, order_id: OrderId) -> Result<(), anyhow::Error>;

    async fn insert_payment(&self, payment: &NewPayment) -> Result<(), anyhow::Error>;

    /// Marks the payment for a gateway order and its order as completed. Returns the order, or
    /// `None` when no payment record exists for the gateway order.
    async fn complete_payment(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderId>, anyhow::Error>;

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, anyhow::Error>;

    /// Orders placed by a user, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, anyhow::Error>;
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct OrderRow {
    order_id: OrderId,
    user_id: Option<UserId>,
    address_id: AddressId,
    total_amount: Decimal,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    created_at: jiff_sqlx::Timestamp,
    updated_at: jiff_sqlx::Timestamp,
}

#[derive(sqlx::FromRow, Debug, Clone)]
struct OrderLineRow {
    product_id: i64,
    quantity: i32,
    price: Decimal,
    size: Option<String>,
    color: Option<String>,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = anyhow::Error;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(OrderLine {
            product_id: ProductId(row.product_id),
            quantity: u32::try_from(row.quantity)
                .with_context(|| format!("Stored quantity {} is not valid.", row.quantity))?,
            price: row.price,
            size: row.size.unwrap_or_default(),
            color: row.color.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lines_for(&self, order_id: OrderId) -> Result<Vec<OrderLine>, anyhow::Error> {
        sqlx::query_as::<_, OrderLineRow>(
            r#"SELECT product_id, quantity, price, size, color
               FROM order_items WHERE order_id = $1 ORDER BY line_no"#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Problem reading lines of order {order_id}."))?
        .into_iter()
        .map(OrderLine::try_from)
        .collect()
    }

    async fn with_lines(&self, row: OrderRow) -> Result<Order, anyhow::Error> {
        let lines = self.lines_for(row.order_id).await?;
        Ok(Order {
            order_id: row.order_id,
            user_id: row.user_id,
            address_id: row.address_id,
            total_amount: row.total_amount,
            payment_status: row.payment_status,
            order_status: row.order_status,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
            lines,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert_order(&self, order: &NewOrder) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"INSERT INTO orders (order_id, user_id, address_id, total_amount, payment_status, order_status)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(order.order_id)
        .bind(order.user_id)
        .bind(order.address_id)
        .bind(order.total_amount)
        .bind(PaymentStatus::Pending)
        .bind(OrderStatus::Processing)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Problem inserting order {}.", order.order_id))?;
        Ok(())
    }

    async fn insert_order_lines(
        &self,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> Result<(), anyhow::Error> {
        if lines.is_empty() {
            return Ok(());
        }

        let rows = lines
            .iter()
            .zip(1i32..)
            .map(|(line, line_no)| {
                let quantity = i32::try_from(line.quantity)
                    .with_context(|| format!("Quantity {} is too large.", line.quantity))?;
                Ok((line_no, line, quantity))
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO order_items (order_id, line_no, product_id, quantity, price, size, color) ",
        );
        builder.push_values(rows, |mut row, (line_no, line, quantity)| {
            row.push_bind(order_id)
                .push_bind(line_no)
                .push_bind(line.product_id.0)
                .push_bind(quantity)
                .push_bind(line.price)
                .push_bind(line.size.clone())
                .push_bind(line.color.clone());
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .with_context(|| format!("Problem inserting lines of order {order_id}."))?;
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<(), anyhow::Error> {
        sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Problem deleting order {order_id}."))?;
        Ok(())
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"INSERT INTO payments (payment_id, order_id, gateway_order_id, amount, currency, status)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(payment.payment_id)
        .bind(payment.order_id)
        .bind(&payment.gateway_order_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(PaymentStatus::Pending)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Problem inserting payment for order {}.", payment.order_id))?;
        Ok(())
    }

    async fn complete_payment(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<Option<OrderId>, anyhow::Error> {
        let completed = PaymentStatus::Completed;
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Problem starting payment transaction.")?;

        let order_id: Option<OrderId> = sqlx::query_scalar(
            r#"UPDATE payments
               SET status = $3, gateway_payment_id = $2, updated_at = now()
               WHERE gateway_order_id = $1
               RETURNING order_id"#,
        )
        .bind(gateway_order_id)
        .bind(gateway_payment_id)
        .bind(completed)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Problem completing payment for gateway order {gateway_order_id}."))?;

        let Some(order_id) = order_id else {
            tx.rollback().await.context("Problem rolling back payment transaction.")?;
            return Ok(None);
        };

        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = now() WHERE order_id = $1")
            .bind(order_id)
            .bind(completed)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Problem completing order {order_id}."))?;

        tx.commit().await.context("Problem committing payment transaction.")?;
        Ok(Some(order_id))
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, anyhow::Error> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"SELECT order_id, user_id, address_id, total_amount, payment_status, order_status,
                      created_at, updated_at
               FROM orders WHERE order_id = $1"#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Problem reading order {order_id}."))?;

        match row {
            Some(row) => Ok(Some(self.with_lines(row).await?)),
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, anyhow::Error> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"SELECT order_id, user_id, address_id, total_amount, payment_status, order_status,
                      created_at, updated_at
               FROM orders WHERE user_id = $1
               ORDER BY created_at DESC, order_id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Problem listing orders for user {user_id}."))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.with_lines(row).await?);
        }
        Ok(orders)
    }
}

//-------------------------- Tests -------------------------------

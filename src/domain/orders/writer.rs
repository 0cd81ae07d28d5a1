//! Turns a checked-out cart into a persisted order and drives the gateway to completion.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};

use crate::{
    domain::{
        addresses::AddressId,
        cart::{CartLine, UserId},
        checkout::Contact,
        pricing::{OrderSummary, amount_in_minor_units, to_cents},
    },
    infra::PaymentSettings,
};

use super::{
    GatewayOrderRequest, NewOrder, NewPayment, OrderError, OrderId, OrderLine, OrderRepository,
    PaymentGateway, PaymentId, is_gateway_id,
};

/// Everything needed to place an order for one payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub user_id: Option<UserId>,
    pub address_id: Option<AddressId>,
    pub lines: Vec<CartLine>,
    pub summary: OrderSummary,
    pub contact: Contact,
}

/// Options handed to the gateway's checkout UI. Field names follow the gateway's own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GatewayHandoff {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub receipt: OrderId,
    pub prefill: Prefill,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Clone)]
pub struct OrderRecordWriter {
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: PaymentSettings,
}

impl OrderRecordWriter {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            orders,
            gateway,
            settings,
        }
    }

    pub fn orders(&self) -> &Arc<dyn OrderRepository> {
        &self.orders
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.settings.attempt_timeout()
    }

    /// Writes the order header and lines, opens a gateway order for it and records a pending
    /// payment. The amount charged is the order total, which does not include a promo discount. Preconditions are checked before anything is written. If the lines cannot be
    /// written the header is deleted again.
    pub async fn open_payment(&self, request: PaymentRequest) -> Result<GatewayHandoff, OrderError> {
        let address_id = request.address_id.ok_or(OrderError::MissingAddress)?;
        if request.lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let order_total = request.summary.order_total().ok_or(OrderError::InvalidAmount)?;
        let amount = amount_in_minor_units(order_total)
            .filter(|amount| *amount > 0)
            .ok_or(OrderError::InvalidAmount)?;

        let order = NewOrder {
            order_id: OrderId::new(),
            user_id: request.user_id,
            address_id,
            total_amount: to_cents(order_total),
        };
        let order_id = order.order_id;
        let lines: Vec<OrderLine> = request.lines.iter().map(OrderLine::from).collect();

        self.orders
            .insert_order(&order)
            .await
            .map_err(OrderError::Persistence)?;

        if let Err(err) = self.orders.insert_order_lines(order_id, &lines).await {
            match self.orders.delete_order(order_id).await {
                Ok(()) => warn!("Order {order_id}: lines failed, header rolled back: {err:?}"),
                Err(delete_err) => error!(
                    "Order {order_id}: lines failed and header could not be rolled back: {delete_err:?}"
                ),
            }
            return Err(OrderError::Persistence(err));
        }

        let gateway_order = self
            .gateway
            .create_order(&GatewayOrderRequest {
                amount,
                currency: self.settings.currency.clone(),
                receipt: order_id.to_string(),
            })
            .await?;

        self.orders
            .insert_payment(&NewPayment {
                payment_id: PaymentId::new(),
                order_id,
                gateway_order_id: gateway_order.id.clone(),
                amount,
                currency: self.settings.currency.clone(),
            })
            .await
            .map_err(OrderError::Persistence)?;

        info!(
            "Order {order_id}: opened gateway order {} for {amount} {}",
            gateway_order.id, self.settings.currency
        );

        let contact = request.contact;
        Ok(GatewayHandoff {
            key: self.settings.key_id.clone(),
            amount,
            currency: self.settings.currency.clone(),
            name: self.settings.merchant_name.clone(),
            description: self.settings.description.clone(),
            order_id: gateway_order.id,
            receipt: order_id,
            prefill: Prefill {
                name: format!("{} {}", contact.first_name, contact.last_name),
                email: contact.email,
                contact: contact.phone,
            },
        })
    }

    /// Confirms with the gateway that the payment landed on this gateway order, then marks the
    /// payment and the order completed.
    pub async fn complete_payment(
        &self,
        order_id: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
    ) -> Result<(), OrderError> {
        if !is_gateway_id(gateway_payment_id) || !is_gateway_id(gateway_order_id) {
            warn!("Order {order_id}: callback carried a malformed gateway id {gateway_payment_id:?}");
            return Err(OrderError::PaymentNotConfirmed);
        }
        let payment = self.gateway.fetch_payment(gateway_payment_id).await?;
        if payment.order_id != gateway_order_id || !payment.is_successful() {
            warn!(
                "Order {order_id}: payment {gateway_payment_id} has status {} on gateway order {}",
                payment.status, payment.order_id
            );
            return Err(OrderError::PaymentNotConfirmed);
        }

        match self
            .orders
            .complete_payment(gateway_order_id, gateway_payment_id)
            .await
            .map_err(OrderError::Persistence)?
        {
            Some(completed) if completed == order_id => {
                info!("Order {order_id}: payment {gateway_payment_id} completed");
                Ok(())
            }
            Some(_) => Err(OrderError::PaymentNotConfirmed),
            None => Err(OrderError::OrderNotFound(order_id)),
        }
    }
}

//-------------------------- Tests -------------------------------

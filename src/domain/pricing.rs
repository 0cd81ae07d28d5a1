//! Order arithmetic shared by the cart view and checkout.
//!
//! Amounts are kept at full precision. Rounding to cents happens only in [`to_cents`] and
//! [`amount_in_minor_units`]. The promo discount lowers the cart total shown to the customer;
//! the order total charged at checkout is [`OrderSummary::order_total`], which leaves it out.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use super::cart::{CartError, CartLine, sum_lines};

fn free_shipping_threshold() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn flat_shipping_fee() -> Decimal {
    Decimal::new(599, 2)
}

fn tax_rate() -> Decimal {
    Decimal::new(7, 2)
}

/// Promotional codes the storefront recognises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, serde::Serialize, serde::Deserialize,
)]
pub enum PromoCode {
    #[strum(serialize = "WELCOME10")]
    #[serde(rename = "WELCOME10")]
    Welcome10,
}

impl PromoCode {
    pub fn discount_rate(&self) -> Decimal {
        match self {
            PromoCode::Welcome10 => Decimal::new(10, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognised promo code.")]
pub struct UnknownPromoCode;

impl FromStr for PromoCode {
    type Err = UnknownPromoCode;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        if code.eq_ignore_ascii_case("welcome10") {
            Ok(PromoCode::Welcome10)
        } else {
            Err(UnknownPromoCode)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    pub fn for_lines(lines: &[CartLine], promo_code: Option<PromoCode>) -> Result<Self, CartError> {
        let subtotal = sum_lines(lines)?;
        Self::for_subtotal(subtotal, promo_code).ok_or(CartError::TotalOutOfRange)
    }

    /// `None` when an amount leaves the decimal range.
    pub fn for_subtotal(subtotal: Decimal, promo_code: Option<PromoCode>) -> Option<Self> {
        let shipping = if subtotal > free_shipping_threshold() {
            Decimal::ZERO
        } else {
            flat_shipping_fee()
        };
        let tax = subtotal.checked_mul(tax_rate())?;
        let discount = match promo_code {
            Some(code) => subtotal.checked_mul(code.discount_rate())?.min(subtotal),
            None => Decimal::ZERO,
        };
        let total = subtotal
            .checked_add(shipping)?
            .checked_add(tax)?
            .checked_sub(discount)?;

        Some(Self {
            subtotal,
            shipping,
            tax,
            discount,
            total,
        })
    }

    /// The amount an order is placed for: subtotal with shipping and tax added, no discount.
    pub fn order_total(&self) -> Option<Decimal> {
        self.subtotal.checked_add(self.shipping)?.checked_add(self.tax)
    }

    /// The summary as shown to a customer: every amount rounded to cents.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: to_cents(self.subtotal),
            shipping: to_cents(self.shipping),
            tax: to_cents(self.tax),
            discount: to_cents(self.discount),
            total: to_cents(self.total),
        }
    }
}

pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An amount in the smallest currency unit, as payment gateways expect it.
pub fn amount_in_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

//-------------------------- Tests -------------------------------

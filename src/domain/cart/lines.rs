//! Cart lines and the in-memory cart they live in.

use fake::Dummy;
use rust_decimal::Decimal;

use crate::domain::fake::{Color, Price, Size};

use super::{CartError, ProductId};

/// Highest shelf price a line may carry.
pub fn max_price() -> Decimal {
    Decimal::new(1_000_000, 0)
}

/// Prices are non-negative cent amounts no higher than [`max_price`].
pub fn check_price(price: Decimal) -> Result<(), CartError> {
    if price.is_sign_negative() || price > max_price() || price.normalize().scale() > 2 {
        return Err(CartError::InvalidPrice(price));
    }
    Ok(())
}

/// One product variant in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Dummy, serde::Serialize, serde::Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    #[dummy(faker = "Price")]
    pub price: Decimal,
    pub image: String,
    #[dummy(faker = "1..5")]
    pub quantity: u32,
    #[dummy(faker = "Size")]
    pub size: String,
    #[dummy(faker = "Color")]
    pub color: String,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// `None` when price times quantity leaves the decimal range.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }
}

/// Identity of a cart line: the product together with its variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.product_id, self.size, self.color)
    }
}

/// The line items of one cart session.
///
/// No two lines share a [`LineKey`] and every quantity is at least 1. Item count and total
/// price are derived on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Rebuilds a cart from stored lines, merging any duplicates back into one line.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Cart::default();
        for line in lines {
            let quantity = line.quantity;
            cart.add_item(line.into(), quantity);
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    pub fn total_price(&self) -> Result<Decimal, CartError> {
        sum_lines(&self.lines)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub(super) fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.matches(key))
    }

    pub(super) fn push(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub(super) fn retain(&mut self, keep: impl FnMut(&CartLine) -> bool) {
        self.lines.retain(keep);
    }
}

/// Sum of every line total, failing instead of overflowing.
pub fn sum_lines(lines: &[CartLine]) -> Result<Decimal, CartError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        line.line_total()
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or(CartError::TotalOutOfRange)
    })
}

//-------------------------- Tests -------------------------------

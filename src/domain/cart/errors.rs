use rust_decimal::Decimal;

use super::LineKey;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CartError {
    #[error("Item {0} is not in the cart.")]
    LineNotInCart(LineKey),
    #[error("Please enter a valid promo code")]
    InvalidPromoCode,
    #[error("Price {0} is not valid. Prices are between 0 and {max} with at most two decimal places.", max = super::max_price())]
    InvalidPrice(Decimal),
    #[error("The cart total is too large.")]
    TotalOutOfRange,
}

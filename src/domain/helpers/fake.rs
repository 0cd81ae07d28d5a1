use fake::{Dummy, Fake, Faker};
use rust_decimal::Decimal;

use crate::domain::cart::ProductId;

/// A shelf price between 0.10 and 9.99.
pub struct Price;

impl Dummy<Price> for Decimal {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Price, rng: &mut R) -> Self {
        let value: i64 = (10..1000).fake_with_rng(rng);
        Decimal::new(value, 2)
    }
}

const SIZES: [&str; 5] = ["XS", "S", "M", "L", "XL"];
const COLORS: [&str; 4] = ["Black", "White", "Red", "Navy"];

pub struct Size;

impl Dummy<Size> for String {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Size, rng: &mut R) -> Self {
        let index: usize = (0..SIZES.len()).fake_with_rng(rng);
        SIZES.get(index).copied().unwrap_or("M").to_owned()
    }
}

pub struct Color;

impl Dummy<Color> for String {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Color, rng: &mut R) -> Self {
        let index: usize = (0..COLORS.len()).fake_with_rng(rng);
        COLORS.get(index).copied().unwrap_or("Black").to_owned()
    }
}

impl Dummy<Faker> for ProductId {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Faker, rng: &mut R) -> Self {
        ProductId((1..10_000).fake_with_rng(rng))
    }
}

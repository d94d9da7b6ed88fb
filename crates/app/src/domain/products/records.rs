//! Product Records

use rust_decimal::Decimal;

use crate::{domain::categories::records::ProductCategoryRecord, ids::TypedId};

/// Product Id
pub type ProductId = TypedId<ProductRecord>;

/// Decimal places kept by `products.price`.
pub const PRICE_SCALE: u32 = 2;

/// Whether `price` is stored without rounding. Trailing zeros do not count.
pub fn price_fits_scale(price: Decimal) -> bool {
    price.normalize().scale() <= PRICE_SCALE
}

/// Product Record
///
/// `categories` is filled in by the product repository; the product store only
/// reads and writes the link rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub available: bool,
    pub categories: Vec<ProductCategoryRecord>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn cents_fit_the_price_scale() -> Result<(), rust_decimal::Error> {
        assert!(price_fits_scale(Decimal::from_str("19.99")?));
        assert!(price_fits_scale(Decimal::from_str("1.250")?));
        assert!(price_fits_scale(Decimal::ZERO));

        Ok(())
    }

    #[test]
    fn fractions_of_a_cent_do_not_fit() -> Result<(), rust_decimal::Error> {
        assert!(!price_fits_scale(Decimal::from_str("0.004")?));
        assert!(!price_fits_scale(Decimal::from_str("10.001")?));

        Ok(())
    }
}

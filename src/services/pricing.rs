use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::{MAX_SELECTION_SIZE, MIN_SELECTION_SIZE, USDC_DECIMALS};

// Fee in cents, indexed by selection size minus MIN_SELECTION_SIZE.
const FEE_CENTS: [i64; MAX_SELECTION_SIZE - MIN_SELECTION_SIZE + 1] = [
    700, 650, 600, 550, 500, 450, 400, 350, 300, 250, 200, 150, 100, // 2..=14
    90, 80, 70, 60, 50, 40, 30, 20, 10, 5, // 15..=24
];

/// Fee in USD for revealing `count` positions; `None` outside 2..=24.
pub fn price_for(count: usize) -> Option<Decimal> {
    if !(MIN_SELECTION_SIZE..=MAX_SELECTION_SIZE).contains(&count) {
        return None;
    }
    Some(Decimal::new(FEE_CENTS[count - MIN_SELECTION_SIZE], 2))
}

/// Fee expressed in USDC base units (6 decimals), as carried in payment requirements.
pub fn to_usdc_units(price: Decimal) -> u128 {
    let scale = Decimal::from(10_u64.pow(USDC_DECIMALS));
    (price * scale).trunc().to_u128().unwrap_or(0)
}

/// `$7.00` style label.
pub fn format_usd(price: Decimal) -> String {
    format!("${:.2}", price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_endpoints_match() {
        assert_eq!(price_for(2), Some(Decimal::new(7, 0)));
        assert_eq!(price_for(24), Some(Decimal::new(5, 2)));
        assert_eq!(price_for(14), Some(Decimal::ONE));
        assert_eq!(price_for(15), Some(Decimal::new(9, 1)));
    }

    #[test]
    fn sizes_outside_table_have_no_price() {
        assert_eq!(price_for(0), None);
        assert_eq!(price_for(1), None);
        assert_eq!(price_for(25), None);
    }

    #[test]
    fn table_is_strictly_decreasing() {
        let prices: Vec<Decimal> = (2..=24).filter_map(price_for).collect();
        assert_eq!(prices.len(), 23);
        assert!(prices.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn usdc_units_use_six_decimals() {
        assert_eq!(to_usdc_units(Decimal::new(7, 0)), 7_000_000);
        assert_eq!(to_usdc_units(Decimal::new(5, 2)), 50_000);
    }

    #[test]
    fn format_usd_pads_cents() {
        assert_eq!(format_usd(Decimal::new(65, 1)), "$6.50");
        assert_eq!(format_usd(Decimal::new(5, 2)), "$0.05");
    }
}

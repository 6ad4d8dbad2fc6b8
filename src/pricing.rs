//! Price rules for catalog and bulk ("encomenda") items.
//!
//! Bulk products carry a catalog price per **hundred** units; the amount
//! charged for a line is the rate scaled by the ordered unit count. All money
//! is integer cents, and the bulk rule multiplies before dividing so catalog
//! rates that are whole cents stay exact.

/// Quantity stored when a bulk product is added without an explicit count.
pub const DEFAULT_BULK_ORDER_QUANTITY: i64 = 50;

/// Increment used by the bulk-quantity stepper.
pub const BULK_QUANTITY_STEP: i64 = 50;

pub fn bulk_price_cents(rate_per_hundred_cents: i64, quantity: i64) -> i64 {
    rate_per_hundred_cents * quantity / 100
}

pub fn linear_price_cents(unit_price_cents: i64, quantity: i64) -> i64 {
    unit_price_cents * quantity
}

/// Steps a bulk quantity up or down, clamped at zero. Decrementing an empty
/// selection is a no-op rather than a negative count.
pub fn step_bulk_quantity(current: i64, delta: i64) -> i64 {
    (current + delta).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_rate_scales_by_ordered_units() {
        // R$38.00 per hundred, 150 units ordered -> R$57.00
        assert_eq!(bulk_price_cents(3_800, 150), 5_700);
        assert_eq!(bulk_price_cents(3_800, 50), 1_900);
        assert_eq!(bulk_price_cents(4_200, 100), 4_200);
    }

    #[test]
    fn linear_price_is_unit_times_quantity() {
        assert_eq!(linear_price_cents(450, 3), 1_350);
        assert_eq!(linear_price_cents(120, 1), 120);
    }

    #[test]
    fn stepping_clamps_at_zero() {
        assert_eq!(step_bulk_quantity(0, -BULK_QUANTITY_STEP), 0);
        assert_eq!(step_bulk_quantity(50, -50), 0);
        assert_eq!(step_bulk_quantity(0, 50), 50);
        assert_eq!(step_bulk_quantity(150, 50), 200);
    }
}

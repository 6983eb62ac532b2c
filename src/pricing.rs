//! Pure cart pricing: subtotal, tiered shipping, coupon discount, total.
//!
//! All arithmetic is done on [`Decimal`] so the tier boundaries at 52.00,
//! 166.59 and 200.00 compare exactly. No I/O happens here; callers feed a
//! cart whose line prices were already refreshed from the catalog.

use rust_decimal::Decimal;

use crate::models::{Cart, CartItem, CouponRef};

fn free_shipping_min() -> Decimal {
    Decimal::new(200_00, 2)
}

fn mid_tier_min() -> Decimal {
    Decimal::new(52_00, 2)
}

fn mid_tier_max() -> Decimal {
    Decimal::new(166_59, 2)
}

fn mid_tier_fee() -> Decimal {
    Decimal::new(15_00, 2)
}

fn base_fee() -> Decimal {
    Decimal::new(20_00, 2)
}

pub fn compute_subtotal(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum()
}

/// Flat-rate shipping tiers. Free at exactly 200.00 and above; the
/// boundary is inclusive and pinned by a unit test.
pub fn compute_shipping(subtotal: Decimal) -> Decimal {
    if subtotal >= free_shipping_min() {
        Decimal::ZERO
    } else if subtotal >= mid_tier_min() && subtotal <= mid_tier_max() {
        mid_tier_fee()
    } else {
        base_fee()
    }
}

/// Fixed-amount discount, clamped so the total never goes negative.
pub fn compute_discount(subtotal: Decimal, coupon: Option<&CouponRef>) -> Decimal {
    match coupon {
        Some(coupon) => coupon.discount.min(subtotal),
        None => Decimal::ZERO,
    }
}

pub fn compute_total(subtotal: Decimal, shipping: Decimal, discount: Decimal) -> Decimal {
    subtotal + shipping - discount
}

/// Recompute every derived field in order: subtotal, shipping, discount,
/// total. Called after each cart mutation and before any read-out so stale
/// figures never leak. An empty cart is all zeros, shipping included.
pub fn recalculate(cart: &mut Cart) {
    if cart.items.is_empty() {
        cart.subtotal = Decimal::ZERO;
        cart.shipping = Decimal::ZERO;
        cart.discount = compute_discount(Decimal::ZERO, cart.coupon.as_ref());
        cart.total = Decimal::ZERO;
        return;
    }

    cart.subtotal = compute_subtotal(&cart.items);
    cart.shipping = compute_shipping(cart.subtotal);
    cart.discount = compute_discount(cart.subtotal, cart.coupon.as_ref());
    cart.total = compute_total(cart.subtotal, cart.shipping, cart.discount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item(price: Decimal, quantity: i32) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            variant_id: None,
            name: "widget".into(),
            variant_name: None,
            unit_price: price,
            quantity,
            stock: 100,
        }
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn subtotal_is_zero_for_empty_cart() {
        assert_eq!(compute_subtotal(&[]), Decimal::ZERO);
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let items = vec![item(dec("30.00"), 2), item(dec("1.50"), 3)];
        assert_eq!(compute_subtotal(&items), dec("64.50"));
    }

    #[test]
    fn shipping_tier_boundaries() {
        assert_eq!(compute_shipping(dec("51.99")), dec("20.00"));
        assert_eq!(compute_shipping(dec("52.00")), dec("15.00"));
        assert_eq!(compute_shipping(dec("166.59")), dec("15.00"));
        assert_eq!(compute_shipping(dec("166.60")), dec("20.00"));
        assert_eq!(compute_shipping(dec("199.99")), dec("20.00"));
        // 200.00 exactly ships free; the boundary is inclusive.
        assert_eq!(compute_shipping(dec("200.00")), Decimal::ZERO);
        assert_eq!(compute_shipping(dec("200.01")), Decimal::ZERO);
    }

    #[test]
    fn discount_clamps_to_subtotal() {
        let coupon = CouponRef {
            id: Uuid::new_v4(),
            code: "BIG".into(),
            discount: dec("80.00"),
        };
        assert_eq!(compute_discount(dec("60.00"), Some(&coupon)), dec("60.00"));
        assert_eq!(compute_discount(dec("100.00"), Some(&coupon)), dec("80.00"));
        assert_eq!(compute_discount(dec("60.00"), None), Decimal::ZERO);
    }

    #[test]
    fn recalculate_keeps_total_identity() {
        let mut cart = Cart::empty();
        cart.items.push(item(dec("30.00"), 2));
        recalculate(&mut cart);

        assert_eq!(cart.subtotal, dec("60.00"));
        assert_eq!(cart.shipping, dec("15.00"));
        assert_eq!(cart.discount, Decimal::ZERO);
        assert_eq!(cart.total, dec("75.00"));
        assert_eq!(cart.total, cart.subtotal + cart.shipping - cart.discount);
    }

    #[test]
    fn recalculate_empty_cart_is_all_zeros() {
        let mut cart = Cart::empty();
        recalculate(&mut cart);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.shipping, Decimal::ZERO);
        assert_eq!(cart.discount, Decimal::ZERO);
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[test]
    fn applying_same_coupon_twice_is_idempotent() {
        let coupon = CouponRef {
            id: Uuid::new_v4(),
            code: "TEN".into(),
            discount: dec("10.00"),
        };

        let mut cart = Cart::empty();
        cart.items.push(item(dec("100.00"), 1));
        cart.coupon = Some(coupon.clone());
        recalculate(&mut cart);
        let once = cart.clone();

        cart.coupon = Some(coupon);
        recalculate(&mut cart);

        assert_eq!(cart.subtotal, once.subtotal);
        assert_eq!(cart.discount, once.discount);
        assert_eq!(cart.total, once.total);
    }
}

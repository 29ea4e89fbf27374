//! Property-based tests for the money and discount arithmetic.
//!
//! These tests use proptest to check the pricing invariants across a wide
//! range of carts, coupons and shipping fees.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use storefront_checkout::{
    models::{Coupon, DiscountType, LineItem, Money},
    services::{
        coupons::{calculate_discount, check_coupon},
        pricing::{grand_total, subtotal},
    },
};
use uuid::Uuid;

// Strategies for generating test data
fn line_strategy() -> impl Strategy<Value = LineItem> {
    (0i64..5_000_000, 1u32..50).prop_map(|(unit_price, quantity)| LineItem {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        color_id: Uuid::new_v4(),
        size_id: Uuid::new_v4(),
        inventory_id: Some(Uuid::new_v4()),
        quantity,
        unit_price: Money::new(unit_price),
    })
}

fn amount_strategy() -> impl Strategy<Value = Money> {
    (0i64..100_000_000).prop_map(Money::new)
}

fn coupon_strategy() -> impl Strategy<Value = Coupon> {
    (
        prop_oneof![Just(DiscountType::Fixed), Just(DiscountType::Percentage)],
        0i64..200_000,
        proptest::option::of(0i64..100_000),
    )
        .prop_map(|(discount_type, raw_value, max_discount)| {
            let valid_from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
            Coupon {
                id: Uuid::new_v4(),
                code: "PROP".to_string(),
                discount_type,
                discount_value: match discount_type {
                    DiscountType::Fixed => raw_value,
                    DiscountType::Percentage => raw_value % 101,
                },
                min_order_value: Money::ZERO,
                max_discount: max_discount.map(Money::new),
                valid_from,
                valid_to: valid_from + Duration::days(90),
                is_active: true,
                usage_limit: None,
                usage_count: 0,
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn subtotal_is_sum_of_line_products(items in prop::collection::vec(line_strategy(), 0..12)) {
        let expected: i64 = items
            .iter()
            .map(|item| item.unit_price.minor_units() * i64::from(item.quantity))
            .sum();
        let total = subtotal(&items);
        prop_assert!(!total.is_negative());
        prop_assert_eq!(total.minor_units(), expected);
    }

    #[test]
    fn grand_total_never_drops_below_shipping(
        sub in amount_strategy(),
        discount in amount_strategy(),
        shipping in amount_strategy(),
    ) {
        let total = grand_total(sub, discount, shipping);
        prop_assert!(!total.is_negative());
        prop_assert!(total >= shipping);
    }

    #[test]
    fn discount_respects_order_amount_and_cap(
        coupon in coupon_strategy(),
        amount in amount_strategy(),
    ) {
        let discount = calculate_discount(&coupon, amount);
        prop_assert!(!discount.is_negative());
        prop_assert!(discount <= amount);
        if let (DiscountType::Percentage, Some(cap)) = (coupon.discount_type, coupon.max_discount) {
            prop_assert!(discount <= cap);
        }
    }

    #[test]
    fn validity_window_is_inclusive(coupon in coupon_strategy(), offset_days in 0i64..=90) {
        let at = coupon.valid_from + Duration::days(offset_days);
        prop_assert!(check_coupon(&coupon, Money::ZERO, at).is_ok());
        prop_assert!(check_coupon(&coupon, Money::ZERO, coupon.valid_to + Duration::seconds(1)).is_err());
        prop_assert!(check_coupon(&coupon, Money::ZERO, coupon.valid_from - Duration::seconds(1)).is_err());
    }

    #[test]
    fn usage_limit_reached_is_rejected(coupon in coupon_strategy(), limit in 1i32..100) {
        let mut exhausted = coupon;
        exhausted.usage_limit = Some(limit);
        exhausted.usage_count = limit;
        prop_assert!(check_coupon(&exhausted, Money::ZERO, exhausted.valid_from).is_err());
    }
}

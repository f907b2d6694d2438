// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use subtrack::currency::{format_money, RateTable, BASE};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn fallback_table_has_base_at_one() {
    let table = RateTable::fallback();
    assert_eq!(table.rate(BASE), Some(Decimal::ONE));
    assert!(table.rate("EUR").is_some());
    assert!(table.rate("RSD").is_some());
}

#[test]
fn two_hop_conversion_through_base() {
    let table = RateTable::fallback();
    // 85 EUR -> USD = 85 / 0.85 = 100; -> RSD = 100 * 99.1 = 9910
    let got = table.convert(dec("85"), "EUR", "RSD");
    assert_eq!(got.round_dp(2), dec("9910.00"));
}

#[test]
fn conversion_round_trips() {
    let table = RateTable::fallback();
    for from in ["USD", "EUR", "RSD"] {
        for to in ["USD", "EUR", "RSD"] {
            let x = dec("123.45");
            let back = table.convert(table.convert(x, from, to), to, from);
            assert!(
                (back - x).abs() < dec("0.000001"),
                "{}->{}->{} drifted: {}",
                from,
                to,
                from,
                back
            );
        }
    }
}

#[test]
fn unknown_currency_leaves_amount_unchanged() {
    let table = RateTable::fallback();
    assert_eq!(table.convert(dec("10"), "XXX", "USD"), dec("10"));
    assert_eq!(table.convert(dec("10"), "USD", "XXX"), dec("10"));
}

#[test]
fn same_currency_is_identity() {
    let table = RateTable::fallback();
    assert_eq!(table.convert(dec("42.42"), "EUR", "EUR"), dec("42.42"));
}

#[test]
fn formats_known_symbols_and_falls_back() {
    assert_eq!(format_money(dec("12.345"), "USD"), "$12.35");
    assert_eq!(format_money(dec("9.9"), "EUR"), "€9.90");
    assert_eq!(format_money(dec("5"), "RSD"), "дин5.00");
    // unsupported identifier: manual code + fixed two decimals
    assert_eq!(format_money(dec("7.1"), "AUD"), "AUD 7.10");
}

#[test]
fn rounds_half_up_on_cents() {
    assert_eq!(format_money(dec("1.005"), "USD"), "$1.01");
    assert_eq!(format_money(dec("2.675"), "USD"), "$2.68");
}

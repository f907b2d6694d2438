// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use subtrack::analytics::{
    budget_forecast, calculate_roi, category_breakdown, filter_subscriptions, insights, predict,
    spending_trends, top_subscriptions, AnalyticsFilters, Insight, Recommendation,
};
use subtrack::models::{BillingCycle, Category, Status, Subscription};
use subtrack::store::{annual_equivalent, monthly_equivalent, total_monthly_spend};

fn sub(
    id: i64,
    name: &str,
    category: Category,
    price: &str,
    cycle: BillingCycle,
    renewal: (i32, u32, u32),
) -> Subscription {
    Subscription {
        id,
        name: name.to_string(),
        category,
        price: price.parse().unwrap(),
        original_price: None,
        original_currency: None,
        billing_cycle: cycle,
        renewal_date: NaiveDate::from_ymd_opt(renewal.0, renewal.1, renewal.2).unwrap(),
        status: Status::Active,
        payment_method: None,
        notes: None,
        created_at: "2025-01-01 00:00:00".to_string(),
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn wide_filters() -> AnalyticsFilters {
    AnalyticsFilters {
        start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
        categories: Category::ALL.to_vec(),
        include_inactive: false,
    }
}

#[test]
fn monthly_equivalents_per_cycle() {
    let weekly = sub(1, "w", Category::Other, "3", BillingCycle::Weekly, (2025, 8, 1));
    let monthly = sub(2, "m", Category::Other, "10", BillingCycle::Monthly, (2025, 8, 1));
    let yearly = sub(3, "y", Category::Other, "120", BillingCycle::Yearly, (2025, 8, 1));

    assert_eq!(monthly_equivalent(&weekly), dec("13")); // 3 * 52 / 12
    assert_eq!(monthly_equivalent(&monthly), dec("10"));
    assert_eq!(monthly_equivalent(&yearly), dec("10"));

    assert_eq!(annual_equivalent(&weekly), dec("156"));
    assert_eq!(annual_equivalent(&monthly), dec("120"));
    assert_eq!(annual_equivalent(&yearly), dec("120"));
}

#[test]
fn yearly_999_is_08325_monthly() {
    let s = sub(1, "a", Category::Software, "9.99", BillingCycle::Yearly, (2025, 8, 1));
    assert_eq!(monthly_equivalent(&s), dec("0.8325"));
    assert_eq!(annual_equivalent(&s), dec("9.99"));
}

#[test]
fn default_filter_window_spans_six_months_either_way() {
    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let filters = AnalyticsFilters::around(today);
    assert_eq!(filters.start, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!(filters.end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    assert!(!filters.include_inactive);

    // year boundary on both ends
    let january = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let filters = AnalyticsFilters::around(january);
    assert_eq!(filters.start, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    assert_eq!(filters.end, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
}

#[test]
fn filtering_by_status_category_and_date() {
    let mut inactive = sub(1, "paused", Category::Gaming, "5", BillingCycle::Monthly, (2025, 8, 10));
    inactive.status = Status::Paused;
    let out_of_range = sub(2, "later", Category::Gaming, "5", BillingCycle::Monthly, (2031, 1, 1));
    let wrong_cat = sub(3, "gym", Category::Fitness, "5", BillingCycle::Monthly, (2025, 8, 10));
    let kept = sub(4, "game", Category::Gaming, "5", BillingCycle::Monthly, (2025, 8, 10));
    let all = vec![inactive.clone(), out_of_range, wrong_cat, kept];

    let mut filters = wide_filters();
    filters.categories = vec![Category::Gaming];
    let got = filter_subscriptions(&all, &filters);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].id, 4);

    filters.include_inactive = true;
    let got = filter_subscriptions(&all, &filters);
    assert_eq!(got.len(), 2);
}

#[test]
fn trend_buckets_sum_and_order() {
    let subs = vec![
        sub(1, "a", Category::Streaming, "15.99", BillingCycle::Monthly, (2025, 9, 3)),
        sub(2, "b", Category::Software, "9.99", BillingCycle::Monthly, (2025, 9, 14)),
        sub(3, "c", Category::Streaming, "120", BillingCycle::Yearly, (2025, 8, 20)),
    ];
    let trends = spending_trends(&subs);
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[0].month, "2025-08");
    assert_eq!(trends[1].month, "2025-09");
    assert_eq!(trends[0].total, dec("10.00"));
    assert_eq!(trends[1].total, dec("25.98"));
    assert_eq!(trends[1].subscriptions, 2);

    // per-category subtotals reproduce the bucket total to the cent
    for t in &trends {
        let cat_sum: Decimal = t.categories.values().copied().sum();
        assert!((cat_sum - t.total).abs() <= dec("0.01") * Decimal::from(t.categories.len() as u64));
    }
}

#[test]
fn breakdown_streaming_65_software_35() {
    let subs = vec![
        sub(1, "a", Category::Streaming, "15.99", BillingCycle::Monthly, (2025, 8, 1)),
        sub(2, "b", Category::Streaming, "9.99", BillingCycle::Monthly, (2025, 8, 5)),
        sub(3, "c", Category::Software, "14.00", BillingCycle::Monthly, (2025, 8, 9)),
    ];
    let breakdown = category_breakdown(&subs);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].category, Category::Streaming);
    assert_eq!(breakdown[0].amount, dec("25.98"));
    assert_eq!(breakdown[0].percentage, 65);
    assert_eq!(breakdown[0].subscriptions, 2);
    assert_eq!(breakdown[1].category, Category::Software);
    assert_eq!(breakdown[1].amount, dec("14.00"));
    assert_eq!(breakdown[1].percentage, 35);

    let pct_sum: i64 = breakdown.iter().map(|b| b.percentage).sum();
    assert!((pct_sum - 100).abs() <= breakdown.len() as i64);
}

#[test]
fn breakdown_drops_empty_categories_and_handles_zero_total() {
    assert!(category_breakdown(&[]).is_empty());
}

#[test]
fn top_subscriptions_ranked_and_capped() {
    let mut subs: Vec<Subscription> = (1..=12)
        .map(|i| {
            sub(
                i,
                &format!("s{}", i),
                Category::Other,
                &format!("{}", i),
                BillingCycle::Monthly,
                (2025, 8, 1),
            )
        })
        .collect();
    subs.reverse();
    let top = top_subscriptions(&subs);
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].name, "s12");
    assert!(top[0].monthly_cost > top[9].monthly_cost);
    let total = total_monthly_spend(&subs);
    assert!(total > Decimal::ZERO);
    assert!(top[0].percentage_of_total > top[9].percentage_of_total);
}

#[test]
fn prediction_on_perfectly_linear_series() {
    let subs = vec![
        sub(1, "a", Category::Other, "100", BillingCycle::Monthly, (2025, 1, 15)),
        sub(2, "b", Category::Other, "110", BillingCycle::Monthly, (2025, 2, 15)),
        sub(3, "c", Category::Other, "120", BillingCycle::Monthly, (2025, 3, 15)),
    ];
    let trends = spending_trends(&subs);
    let p = predict(&trends);
    assert_eq!(p.next_month, dec("130.00"));
    assert_eq!(p.next_year, dec("240.00"));
    assert_eq!(p.confidence, Decimal::ONE);
}

#[test]
fn prediction_needs_two_buckets() {
    let subs = vec![sub(1, "a", Category::Other, "100", BillingCycle::Monthly, (2025, 1, 15))];
    let trends = spending_trends(&subs);
    let p = predict(&trends);
    assert_eq!(p.next_month, Decimal::ZERO);
    assert_eq!(p.next_year, Decimal::ZERO);
    assert_eq!(p.confidence, Decimal::ZERO);
}

#[test]
fn prediction_never_negative() {
    let subs = vec![
        sub(1, "a", Category::Other, "100", BillingCycle::Monthly, (2025, 1, 15)),
        sub(2, "b", Category::Other, "10", BillingCycle::Monthly, (2025, 2, 15)),
    ];
    let trends = spending_trends(&subs);
    let p = predict(&trends);
    // slope -90: raw extrapolation would be well below zero
    assert_eq!(p.next_month, Decimal::ZERO);
    assert_eq!(p.next_year, Decimal::ZERO);
}

#[test]
fn insight_rules_in_order() {
    let subs = vec![
        sub(1, "a", Category::Streaming, "20", BillingCycle::Monthly, (2025, 7, 10)),
        sub(2, "b", Category::Streaming, "30", BillingCycle::Monthly, (2025, 8, 10)),
    ];
    let trends = spending_trends(&subs);
    let breakdown = category_breakdown(&subs);
    let got = insights(&trends, &breakdown, dec("25"));
    assert_eq!(got.len(), 3);
    assert_eq!(
        got[0],
        Insight::TrendUp {
            amount: dec("10.00"),
            percent: dec("50.0")
        }
    );
    assert_eq!(
        got[1],
        Insight::CategoryDominant {
            category: Category::Streaming,
            percentage: 100
        }
    );
    assert_eq!(got[2], Insight::OverBudget { amount: dec("5.00") });
}

#[test]
fn insight_low_budget_and_high_volume() {
    let mut subs: Vec<Subscription> = (1..=11)
        .map(|i| {
            sub(i, &format!("s{}", i), Category::Other, "1", BillingCycle::Monthly, (2025, 8, 1))
        })
        .collect();
    subs.push(sub(12, "prev", Category::Other, "11", BillingCycle::Monthly, (2025, 7, 1)));
    let trends = spending_trends(&subs);
    let breakdown = category_breakdown(&subs);
    // budget 12, spend 11: remaining 1 < 10% of budget
    let got = insights(&trends, &breakdown, dec("12"));
    assert!(got.contains(&Insight::TrendStable));
    assert!(got.contains(&Insight::LowBudgetRemaining { remaining: dec("1.00") }));
    assert!(got.contains(&Insight::HighVolume { count: 11 }));
    assert!(got.len() <= 5);
}

#[test]
fn insights_empty_without_trends() {
    assert!(insights(&[], &[], dec("100")).is_empty());
}

#[test]
fn forecast_counts_only_recurring_renewals_next_month() {
    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let subs = vec![
        sub(1, "this-month", Category::Other, "10", BillingCycle::Monthly, (2025, 8, 5)),
        sub(2, "next-month", Category::Other, "20", BillingCycle::Monthly, (2025, 9, 5)),
        sub(3, "next-weekly", Category::Other, "3", BillingCycle::Weekly, (2025, 9, 12)),
        sub(4, "next-annual", Category::Other, "120", BillingCycle::Yearly, (2025, 9, 20)),
    ];
    let trends = spending_trends(&subs);
    let fc = budget_forecast(&trends, &subs, today, dec("50"));

    assert_eq!(fc.current.actual, dec("10.00"));
    assert_eq!(fc.current.budget, dec("50.00"));
    assert_eq!(fc.current.remaining, dec("40.00"));
    assert_eq!(fc.current.percentage, 20);

    // 20 monthly + 13 weekly-equivalent; the yearly renewal is excluded
    assert_eq!(fc.next.renewals, dec("33.00"));
    assert_eq!(fc.next.predicted, dec("43.00"));
    assert_eq!(fc.next.new_subscriptions, Decimal::ZERO);
    assert_eq!(fc.next.cancellations, Decimal::ZERO);
}

#[test]
fn forecast_with_no_budget_and_no_current_bucket() {
    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let subs = vec![sub(1, "far", Category::Other, "10", BillingCycle::Monthly, (2025, 11, 5))];
    let trends = spending_trends(&subs);
    let fc = budget_forecast(&trends, &subs, today, Decimal::ZERO);
    assert_eq!(fc.current.actual, Decimal::ZERO);
    assert_eq!(fc.current.percentage, 0);
    assert_eq!(fc.next.predicted, Decimal::ZERO);
}

#[test]
fn roi_thresholds() {
    let s = sub(1, "svc", Category::Software, "10", BillingCycle::Monthly, (2025, 8, 1));

    let keep = calculate_roi(&s, dec("20"), 8);
    assert_eq!(keep.roi_percentage, dec("100.00"));
    assert_eq!(keep.recommendation, Recommendation::Keep);
    assert_eq!(keep.value_score, 20);

    let review_low_usage = calculate_roi(&s, dec("20"), 4);
    assert_eq!(review_low_usage.recommendation, Recommendation::Review);

    let review_negative_roi = calculate_roi(&s, dec("9"), 9);
    assert_eq!(review_negative_roi.roi_percentage, dec("-10.00"));
    assert_eq!(review_negative_roi.recommendation, Recommendation::Review);

    let cancel_deep_negative = calculate_roi(&s, dec("7"), 9);
    assert_eq!(cancel_deep_negative.roi_percentage, dec("-30.00"));
    assert_eq!(cancel_deep_negative.recommendation, Recommendation::Cancel);

    let cancel_unused = calculate_roi(&s, dec("20"), 2);
    assert_eq!(cancel_unused.recommendation, Recommendation::Cancel);
}

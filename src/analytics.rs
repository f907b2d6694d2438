// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived-metrics engine: trends, breakdowns, prediction, insights, and the
//! budget forecast. Everything here is a pure function of the subscription
//! list, the filter value, and explicitly passed scalars (budget, today);
//! no I/O and no ambient reads.
//!
//! Buckets are keyed by each subscription's *next* renewal date, so the
//! series is forward-looking renewal scheduling, not a ledger of historical
//! charges. A single renewal-date field cannot reconstruct past billing
//! events; this is an inherent modeling limit, not a bug.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::currency::{format_money, BASE};
use crate::models::{BillingCycle, Category, Status, Subscription};
use crate::store::monthly_equivalent;
use crate::utils::{add_months, month_end, month_key, month_start, round_cents};

const TOP_SUBSCRIPTIONS_CAP: usize = 10;
const INSIGHTS_CAP: usize = 5;
const HIGH_VOLUME_THRESHOLD: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalyticsFilters {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub categories: Vec<Category>,
    pub include_inactive: bool,
}

impl AnalyticsFilters {
    /// Default window: start of the month six months back through the end of
    /// the month six months ahead.
    pub fn around(today: NaiveDate) -> Self {
        let (sy, sm) = add_months(today.year(), today.month(), -6);
        let (ey, em) = add_months(today.year(), today.month(), 6);
        let start = month_start(sy, sm).unwrap_or(today);
        let end = month_end(ey, em).unwrap_or(today);
        Self {
            start,
            end,
            categories: Category::ALL.to_vec(),
            include_inactive: false,
        }
    }

    fn includes(&self, sub: &Subscription) -> bool {
        if !self.include_inactive && sub.status != Status::Active {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&sub.category) {
            return false;
        }
        sub.renewal_date >= self.start && sub.renewal_date <= self.end
    }
}

pub fn filter_subscriptions(subs: &[Subscription], filters: &AnalyticsFilters) -> Vec<Subscription> {
    subs.iter()
        .filter(|s| filters.includes(s))
        .cloned()
        .collect()
}

/// One calendar month's aggregated spend, keyed by renewal month.
#[derive(Debug, Clone, Serialize)]
pub struct SpendingTrend {
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub total: Decimal,
    pub subscriptions: usize,
    pub categories: BTreeMap<Category, Decimal>,
}

pub fn spending_trends(subs: &[Subscription]) -> Vec<SpendingTrend> {
    let mut buckets: BTreeMap<(i32, u32), (Decimal, usize, BTreeMap<Category, Decimal>)> =
        BTreeMap::new();
    for sub in subs {
        let key = (sub.renewal_date.year(), sub.renewal_date.month());
        let cost = monthly_equivalent(sub);
        let entry = buckets
            .entry(key)
            .or_insert_with(|| (Decimal::ZERO, 0, BTreeMap::new()));
        entry.0 += cost;
        entry.1 += 1;
        *entry.2.entry(sub.category).or_insert(Decimal::ZERO) += cost;
    }
    buckets
        .into_iter()
        .map(|((year, month_number), (total, count, categories))| SpendingTrend {
            month: format!("{:04}-{:02}", year, month_number),
            year,
            month_number,
            total: round_cents(total),
            subscriptions: count,
            categories: categories
                .into_iter()
                .map(|(c, v)| (c, round_cents(v)))
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub amount: Decimal,
    pub percentage: i64,
    pub subscriptions: usize,
}

pub fn category_breakdown(subs: &[Subscription]) -> Vec<CategoryBreakdown> {
    let mut totals: BTreeMap<Category, (Decimal, usize)> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;
    for sub in subs {
        let cost = monthly_equivalent(sub);
        let entry = totals.entry(sub.category).or_insert((Decimal::ZERO, 0));
        entry.0 += cost;
        entry.1 += 1;
        grand_total += cost;
    }
    let mut out: Vec<CategoryBreakdown> = totals
        .into_iter()
        .filter(|(_, (amount, _))| *amount > Decimal::ZERO)
        .map(|(category, (amount, count))| CategoryBreakdown {
            category,
            amount: round_cents(amount),
            percentage: if grand_total > Decimal::ZERO {
                round_to_i64(amount / grand_total * Decimal::from(100))
            } else {
                0
            },
            subscriptions: count,
        })
        .collect();
    out.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category.cmp(&b.category)));
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSubscription {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub monthly_cost: Decimal,
    pub percentage_of_total: Decimal,
}

pub fn top_subscriptions(subs: &[Subscription]) -> Vec<TopSubscription> {
    let total: Decimal = subs.iter().map(monthly_equivalent).sum();
    let mut out: Vec<TopSubscription> = subs
        .iter()
        .map(|sub| {
            let cost = monthly_equivalent(sub);
            TopSubscription {
                id: sub.id,
                name: sub.name.clone(),
                category: sub.category,
                monthly_cost: round_cents(cost),
                percentage_of_total: if total > Decimal::ZERO {
                    round_cents(cost / total * Decimal::from(100))
                } else {
                    Decimal::ZERO
                },
            }
        })
        .collect();
    out.sort_by(|a, b| b.monthly_cost.cmp(&a.monthly_cost).then(a.name.cmp(&b.name)));
    out.truncate(TOP_SUBSCRIPTIONS_CAP);
    out
}

/// Linear spend extrapolation. `confidence` is a heuristic score in [0, 1]
/// derived from residual variance over the total; it is intentionally not a
/// coefficient of determination, and is kept as-is for behavioral parity with
/// the dashboards this replaces.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub next_month: Decimal,
    pub next_year: Decimal,
    pub confidence: Decimal,
}

pub fn predict(trends: &[SpendingTrend]) -> Prediction {
    let n = trends.len();
    if n < 2 {
        return Prediction {
            next_month: Decimal::ZERO,
            next_year: Decimal::ZERO,
            confidence: Decimal::ZERO,
        };
    }
    let n_dec = Decimal::from(n as u64);
    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_x2 = Decimal::ZERO;
    for (i, trend) in trends.iter().enumerate() {
        let x = Decimal::from(i as u64);
        sum_x += x;
        sum_y += trend.total;
        sum_xy += x * trend.total;
        sum_x2 += x * x;
    }

    // Ordinary least squares via closed-form sums; denominator is nonzero
    // whenever n >= 2 with distinct indices.
    let slope = (n_dec * sum_xy - sum_x * sum_y) / (n_dec * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n_dec;

    let next_month = (intercept + slope * n_dec).max(Decimal::ZERO);
    let next_year = (intercept + slope * (n_dec + Decimal::from(11))).max(Decimal::ZERO);

    let mut residual_variance = Decimal::ZERO;
    for (i, trend) in trends.iter().enumerate() {
        let fitted = intercept + slope * Decimal::from(i as u64);
        let resid = trend.total - fitted;
        residual_variance += resid * resid;
    }
    let confidence = if sum_y > Decimal::ZERO {
        (Decimal::ONE - residual_variance / sum_y).clamp(Decimal::ZERO, Decimal::ONE)
    } else {
        Decimal::ZERO
    };

    Prediction {
        next_month: round_cents(next_month),
        next_year: round_cents(next_year),
        confidence,
    }
}

/// Rule-derived observation about current spend. Human wording lives only in
/// the `Display` impl; consumers match on the variant, never on text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "params")]
pub enum Insight {
    TrendUp { amount: Decimal, percent: Decimal },
    TrendDown { amount: Decimal, percent: Decimal },
    TrendStable,
    CategoryDominant { category: Category, percentage: i64 },
    OverBudget { amount: Decimal },
    LowBudgetRemaining { remaining: Decimal },
    HighVolume { count: usize },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::TrendUp { amount, percent } => write!(
                f,
                "Spending increased by {} ({}%) compared to last month",
                format_money(*amount, BASE),
                percent
            ),
            Insight::TrendDown { amount, percent } => write!(
                f,
                "Spending decreased by {} ({}%) compared to last month",
                format_money(*amount, BASE),
                percent
            ),
            Insight::TrendStable => {
                write!(f, "Spending remained stable compared to last month")
            }
            Insight::CategoryDominant { category, percentage } => write!(
                f,
                "{} is your largest expense category at {}% of total spending",
                category, percentage
            ),
            Insight::OverBudget { amount } => {
                write!(f, "You're over budget by {}", format_money(*amount, BASE))
            }
            Insight::LowBudgetRemaining { remaining } => write!(
                f,
                "Only {} remaining in your monthly budget",
                format_money(*remaining, BASE)
            ),
            Insight::HighVolume { count } => write!(
                f,
                "You have {} subscriptions this month. Consider reviewing for potential savings",
                count
            ),
        }
    }
}

/// Ordered rule evaluation, capped at five entries. `budget` of zero means
/// no budget is configured and the budget rules are skipped.
pub fn insights(
    trends: &[SpendingTrend],
    breakdown: &[CategoryBreakdown],
    budget: Decimal,
) -> Vec<Insight> {
    let mut out = Vec::new();
    let Some(current) = trends.last() else {
        return out;
    };

    if trends.len() > 1 {
        let previous = &trends[trends.len() - 2];
        let change = current.total - previous.total;
        if change.is_zero() {
            out.push(Insight::TrendStable);
        } else {
            let percent = if previous.total > Decimal::ZERO {
                (change.abs() / previous.total * Decimal::from(100))
                    .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            } else {
                Decimal::ZERO
            };
            if change > Decimal::ZERO {
                out.push(Insight::TrendUp {
                    amount: round_cents(change),
                    percent,
                });
            } else {
                out.push(Insight::TrendDown {
                    amount: round_cents(change.abs()),
                    percent,
                });
            }
        }
    }

    if let Some(top) = breakdown.first() {
        out.push(Insight::CategoryDominant {
            category: top.category,
            percentage: top.percentage,
        });
    }

    if budget > Decimal::ZERO {
        let remaining = budget - current.total;
        if remaining < Decimal::ZERO {
            out.push(Insight::OverBudget {
                amount: round_cents(remaining.abs()),
            });
        } else if remaining < budget * Decimal::new(1, 1) {
            out.push(Insight::LowBudgetRemaining {
                remaining: round_cents(remaining),
            });
        }
    }

    if current.subscriptions > HIGH_VOLUME_THRESHOLD {
        out.push(Insight::HighVolume {
            count: current.subscriptions,
        });
    }

    out.truncate(INSIGHTS_CAP);
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetForecast {
    pub current: CurrentMonthBudget,
    pub next: NextMonthOutlook,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentMonthBudget {
    pub actual: Decimal,
    pub budget: Decimal,
    pub remaining: Decimal,
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextMonthOutlook {
    pub predicted: Decimal,
    pub renewals: Decimal,
    pub new_subscriptions: Decimal,
    pub cancellations: Decimal,
}

/// Current-month actual against the configured budget, plus a next-month
/// projection. Yearly-cycle subscriptions are excluded from the renewals sum
/// since they do not recur monthly.
pub fn budget_forecast(
    trends: &[SpendingTrend],
    filtered: &[Subscription],
    today: NaiveDate,
    budget: Decimal,
) -> BudgetForecast {
    let current_key = month_key(today);
    let actual = trends
        .iter()
        .find(|t| t.month == current_key)
        .map(|t| t.total)
        .unwrap_or(Decimal::ZERO);
    let remaining = budget - actual;
    let percentage = if budget > Decimal::ZERO {
        round_to_i64(actual / budget * Decimal::from(100))
    } else {
        0
    };

    let (next_year, next_month) = add_months(today.year(), today.month(), 1);
    let renewals: Decimal = filtered
        .iter()
        .filter(|sub| {
            matches!(
                sub.billing_cycle,
                BillingCycle::Weekly | BillingCycle::Monthly
            ) && sub.renewal_date.year() == next_year
                && sub.renewal_date.month() == next_month
        })
        .map(monthly_equivalent)
        .sum();

    BudgetForecast {
        current: CurrentMonthBudget {
            actual: round_cents(actual),
            budget: round_cents(budget),
            remaining: round_cents(remaining),
            percentage,
        },
        next: NextMonthOutlook {
            predicted: round_cents(actual + renewals),
            renewals: round_cents(renewals),
            new_subscriptions: Decimal::ZERO,
            cancellations: Decimal::ZERO,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Keep,
    Review,
    Cancel,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Keep => "Keep",
            Recommendation::Review => "Review",
            Recommendation::Cancel => "Cancel",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiCalculation {
    pub subscription_id: i64,
    pub name: String,
    pub monthly_cost: Decimal,
    pub estimated_value: Decimal,
    pub roi_percentage: Decimal,
    pub usage_score: u8,
    pub value_score: i64,
    pub recommendation: Recommendation,
}

/// Value-for-money check for one subscription against a user-supplied
/// estimated monthly value and a usage score from 1 to 10.
pub fn calculate_roi(sub: &Subscription, estimated_value: Decimal, usage_score: u8) -> RoiCalculation {
    let monthly_cost = monthly_equivalent(sub);
    let roi_percentage = if monthly_cost > Decimal::ZERO {
        round_cents((estimated_value - monthly_cost) / monthly_cost * Decimal::from(100))
    } else {
        Decimal::ZERO
    };

    let recommendation = if roi_percentage < Decimal::from(-20) || usage_score < 3 {
        Recommendation::Cancel
    } else if roi_percentage < Decimal::ZERO || usage_score < 6 {
        Recommendation::Review
    } else {
        Recommendation::Keep
    };

    let value_score = if monthly_cost > Decimal::ZERO {
        round_to_i64(estimated_value / monthly_cost * Decimal::from(10))
    } else {
        0
    };

    RoiCalculation {
        subscription_id: sub.id,
        name: sub.name.clone(),
        monthly_cost: round_cents(monthly_cost),
        estimated_value: round_cents(estimated_value),
        roi_percentage,
        usage_score,
        value_score,
        recommendation,
    }
}

fn round_to_i64(d: Decimal) -> i64 {
    d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

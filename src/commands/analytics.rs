// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::analytics::{self, AnalyticsFilters, SpendingTrend};
use crate::currency::{self, format_money, RateTable, BASE};
use crate::models::{Category, Subscription};
use crate::store::SubscriptionStore;
use crate::utils::{
    get_display_currency, get_monthly_budget, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("trends", sub)) => trends(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        Some(("top", sub)) => top(conn, sub)?,
        Some(("predict", sub)) => predict(conn, sub)?,
        Some(("insights", sub)) => insights(conn, sub)?,
        Some(("forecast", sub)) => forecast(conn, sub)?,
        Some(("roi", sub)) => roi(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_filters(sub: &clap::ArgMatches) -> Result<AnalyticsFilters> {
    let today = Utc::now().date_naive();
    let mut filters = AnalyticsFilters::around(today);
    if let Some(from) = sub.get_one::<String>("from") {
        filters.start = parse_date(from)?;
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filters.end = parse_date(to)?;
    }
    if let Some(cats) = sub.get_many::<String>("category") {
        let mut parsed = Vec::new();
        for c in cats {
            parsed.push(c.parse::<Category>()?);
        }
        filters.categories = parsed;
    }
    filters.include_inactive = sub.get_flag("include-inactive");
    Ok(filters)
}

/// Filtered subscriptions plus the display-conversion context every
/// subcommand needs.
fn gather(
    conn: &Connection,
    sub: &clap::ArgMatches,
) -> Result<(Vec<Subscription>, RateTable, String)> {
    let filters = parse_filters(sub)?;
    let all = SubscriptionStore::new(conn).list()?;
    let filtered = analytics::filter_subscriptions(&all, &filters);
    let rates = currency::load(conn)?;
    let display = get_display_currency(conn)?;
    Ok((filtered, rates, display))
}

fn fmt_disp(amount: Decimal, rates: &RateTable, display: &str) -> String {
    format_money(rates.convert(amount, BASE, display), display)
}

fn trends(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, rates, display) = gather(conn, sub)?;
    let trends = analytics::spending_trends(&filtered);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &trends)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = trends
        .iter()
        .map(|t| {
            let cats = t
                .categories
                .iter()
                .map(|(c, v)| format!("{} {}", c, fmt_disp(*v, &rates, &display)))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                t.month.clone(),
                fmt_disp(t.total, &rates, &display),
                t.subscriptions.to_string(),
                cats,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Total", "Subs", "By category"], rows)
    );
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, rates, display) = gather(conn, sub)?;
    let breakdown = analytics::category_breakdown(&filtered);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &breakdown)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = breakdown
        .iter()
        .map(|b| {
            vec![
                b.category.to_string(),
                fmt_disp(b.amount, &rates, &display),
                format!("{}%", b.percentage),
                b.subscriptions.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", "Monthly", "Share", "Subs"], rows)
    );
    Ok(())
}

fn top(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, rates, display) = gather(conn, sub)?;
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&5);
    let mut ranked = analytics::top_subscriptions(&filtered);
    ranked.truncate(limit);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &ranked)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = ranked
        .iter()
        .enumerate()
        .map(|(i, t)| {
            vec![
                (i + 1).to_string(),
                t.name.clone(),
                t.category.to_string(),
                fmt_disp(t.monthly_cost, &rates, &display),
                format!("{:.2}%", t.percentage_of_total),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["#", "Name", "Category", "Monthly", "Of total"], rows)
    );
    Ok(())
}

fn predict(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, rates, display) = gather(conn, sub)?;
    let trends = analytics::spending_trends(&filtered);
    let prediction = analytics::predict(&trends);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &prediction)? {
        return Ok(());
    }
    if trends.len() < 2 {
        println!("Need at least two months of renewals to predict spend.");
        return Ok(());
    }
    println!(
        "Next month: {}",
        fmt_disp(prediction.next_month, &rates, &display)
    );
    println!(
        "Next year:  {}",
        fmt_disp(prediction.next_year, &rates, &display)
    );
    println!(
        "Confidence: {:.0}%",
        prediction.confidence * Decimal::from(100)
    );
    Ok(())
}

fn insights(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, _rates, _display) = gather(conn, sub)?;
    let trends = analytics::spending_trends(&filtered);
    let breakdown = analytics::category_breakdown(&filtered);
    let budget = get_monthly_budget(conn)?;
    let found = analytics::insights(&trends, &breakdown, budget);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &found)? {
        return Ok(());
    }
    if found.is_empty() {
        println!("Start adding subscriptions to see insights");
        return Ok(());
    }
    for insight in &found {
        println!("- {}", insight);
    }
    Ok(())
}

fn forecast(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (filtered, rates, display) = gather(conn, sub)?;
    let trends: Vec<SpendingTrend> = analytics::spending_trends(&filtered);
    let budget = get_monthly_budget(conn)?;
    let today = Utc::now().date_naive();
    let fc = analytics::budget_forecast(&trends, &filtered, today, budget);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &fc)? {
        return Ok(());
    }
    println!("This month");
    println!("  actual:    {}", fmt_disp(fc.current.actual, &rates, &display));
    println!("  budget:    {}", fmt_disp(fc.current.budget, &rates, &display));
    println!(
        "  remaining: {} ({}% used)",
        fmt_disp(fc.current.remaining, &rates, &display),
        fc.current.percentage
    );
    println!("Next month");
    println!("  predicted: {}", fmt_disp(fc.next.predicted, &rates, &display));
    println!("  renewals:  {}", fmt_disp(fc.next.renewals, &rates, &display));
    Ok(())
}

fn roi(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let value = parse_decimal(sub.get_one::<String>("value").unwrap())?;
    let usage = *sub.get_one::<u8>("usage").unwrap_or(&5);
    let subscription = SubscriptionStore::new(conn).get(id)?;
    let calc = analytics::calculate_roi(&subscription, value, usage);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &calc)? {
        return Ok(());
    }
    println!("'{}' costs {} per month", calc.name, format_money(calc.monthly_cost, BASE));
    println!(
        "Estimated value {} -> ROI {}%",
        format_money(calc.estimated_value, BASE),
        calc.roi_percentage
    );
    println!(
        "Usage {}/10, value score {} -> {}",
        calc.usage_score, calc.value_score, calc.recommendation
    );
    Ok(())
}

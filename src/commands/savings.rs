// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use crate::currency::{format_money, BASE};
use crate::savings::{self, STATS_WINDOW};
use crate::store::{self, SubscriptionStore};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("salary", sub)) => salary(conn, sub)?,
        Some(("deposit", sub)) => deposit(conn, sub)?,
        Some(("withdraw", sub)) => withdraw(conn, sub)?,
        Some(("auto-deposit", _)) => auto_deposit(conn)?,
        Some(("reset", sub)) => reset(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        Some(("stats", sub)) => stats(conn, sub)?,
        Some(("summary", sub)) => summary(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn salary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = sub
        .get_one::<String>("amount")
        .map(|s| parse_decimal(s))
        .transpose()?;
    let pct = sub
        .get_one::<String>("save-pct")
        .map(|s| parse_decimal(s))
        .transpose()?;
    if amount.is_none() && pct.is_none() {
        let prefs = savings::get_preferences(conn)?;
        match prefs.monthly_salary {
            Some(s) => println!(
                "Monthly salary {} with {}% set aside for savings",
                format_money(s, BASE),
                prefs.savings_percentage
            ),
            None => println!("No salary configured. Use --amount and --save-pct."),
        }
        return Ok(());
    }
    let prefs = savings::update_preferences(conn, amount, pct)?;
    println!(
        "Preferences saved: salary {}, savings {}%",
        prefs
            .monthly_salary
            .map(|s| format_money(s, BASE))
            .unwrap_or_else(|| "unset".into()),
        prefs.savings_percentage
    );
    Ok(())
}

fn deposit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());
    let tx = savings::deposit(conn, amount, note)?;
    println!(
        "Deposited {}; balance is now {}",
        format_money(tx.amount, BASE),
        format_money(tx.balance_after, BASE)
    );
    Ok(())
}

fn withdraw(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());
    let tx = savings::withdraw(conn, amount, note)?;
    println!(
        "Withdrew {}; balance is now {}",
        format_money(tx.amount, BASE),
        format_money(tx.balance_after, BASE)
    );
    Ok(())
}

fn auto_deposit(conn: &Connection) -> Result<()> {
    let tx = savings::auto_deposit(conn)?;
    println!(
        "Deposited this month's savings slice of {}; balance is now {}",
        format_money(tx.amount, BASE),
        format_money(tx.balance_after, BASE)
    );
    Ok(())
}

fn reset(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("force") {
        println!(
            "This permanently deletes the entire savings ledger. Re-run with --force to confirm."
        );
        return Ok(());
    }
    let removed = savings::reset(conn)?;
    println!(
        "Removed {} ledger entries; balance is now {}",
        removed,
        format_money(savings::current_balance(conn)?, BASE)
    );
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&STATS_WINDOW);
    let txs = savings::recent_transactions(conn, limit)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &txs)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = txs
        .iter()
        .map(|t| {
            vec![
                t.created_at.clone(),
                t.kind.to_string(),
                format_money(t.amount, BASE),
                format_money(t.balance_after, BASE),
                t.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["When", "Kind", "Amount", "Balance", "Note"], rows)
    );
    Ok(())
}

fn stats(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let prefs = savings::get_preferences(conn)?;
    let txs = savings::recent_transactions(conn, STATS_WINDOW)?;
    let balance = savings::current_balance(conn)?;
    let s = savings::savings_stats(&prefs, &txs, balance);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    println!("Balance:          {}", format_money(s.current_balance, BASE));
    println!("Deposits (last {}): {}", txs.len(), format_money(s.total_deposits, BASE));
    println!("Withdrawals:      {}", format_money(s.total_withdrawals, BASE));
    println!("Monthly savings:  {}", format_money(s.monthly_savings, BASE));
    if let Some(when) = &s.last_transaction_at {
        println!("Last activity:    {}", when);
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let prefs = savings::get_preferences(conn)?;
    let subs = SubscriptionStore::new(conn).list()?;
    let spend = store::total_monthly_spend(&subs);
    let balance = savings::current_balance(conn)?;
    let summary = savings::budget_summary(&prefs, spend, balance);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    match summary.monthly_salary {
        Some(salary) => {
            println!("Salary:        {}", format_money(salary, BASE));
            println!("Subscriptions: {}", format_money(summary.total_subscriptions, BASE));
            println!(
                "Savings:       {} ({}%)",
                format_money(summary.savings_amount, BASE),
                summary.savings_percentage
            );
            println!("Remaining:     {}", format_money(summary.remaining_budget, BASE));
        }
        None => {
            println!("No salary configured; run `subtrack savings salary --amount <n> --save-pct <p>`.");
            println!("Subscriptions: {}", format_money(summary.total_subscriptions, BASE));
        }
    }
    println!("Savings balance: {}", format_money(summary.current_savings_balance, BASE));
    Ok(())
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::currency::{self, format_money, BASE};
use crate::utils::{maybe_print_json, parse_decimal, pretty_table, set_display_currency};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-display", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
            set_display_currency(conn, &ccy)?;
            println!("Display currency set to {}", ccy);
        }
        Some(("fetch", _)) => {
            // Explicit fetch surfaces failures; the startup refresh never does.
            currency::refresh(conn).context("Exchange-rate fetch failed")?;
            println!("Exchange rates refreshed.");
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("convert", sub)) => convert(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let table = currency::load(conn)?;
    let rows: Vec<Vec<String>> = table
        .currencies()
        .into_iter()
        .filter_map(|c| table.rate(&c).map(|r| (c, r)))
        .map(|(c, r)| vec![c, r.to_string()])
        .collect();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(&["Currency", &format!("Per 1 {}", BASE)], rows)
    );
    Ok(())
}

fn convert(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = sub.get_one::<String>("from").unwrap().to_uppercase();
    let to = sub.get_one::<String>("to").unwrap().to_uppercase();
    let table = currency::load(conn)?;
    let result = table.convert(amount, &from, &to);
    println!(
        "{} {} -> {}",
        amount,
        from,
        format_money(result, &to)
    );
    Ok(())
}

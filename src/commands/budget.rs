// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::currency::{format_money, BASE};
use crate::utils::{get_monthly_budget, parse_decimal, set_monthly_budget};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            if amount < Decimal::ZERO {
                anyhow::bail!("Budget must not be negative");
            }
            set_monthly_budget(conn, amount)?;
            println!("Monthly budget set to {}", format_money(amount, BASE));
        }
        Some(("show", _)) => {
            let budget = get_monthly_budget(conn)?;
            if budget.is_zero() {
                println!("No monthly budget configured");
            } else {
                println!("Monthly budget: {}", format_money(budget, BASE));
            }
        }
        _ => {}
    }
    Ok(())
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::currency::{self, format_money, BASE};
use crate::models::{BillingCycle, Category, NewSubscription, Status, SubscriptionPatch};
use crate::store::{self, SubscriptionStore};
use crate::utils::{get_display_currency, maybe_print_json, parse_date, parse_decimal, pretty_table, round_cents};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("remove", sub)) => remove(conn, sub)?,
        Some(("status", sub)) => set_status(conn, sub)?,
        Some(("upcoming", sub)) => upcoming(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SubscriptionStore::new(conn);
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let category = sub.get_one::<String>("category").unwrap().parse::<Category>()?;
    let entered_price = parse_decimal(sub.get_one::<String>("price").unwrap())?;
    let cycle = sub.get_one::<String>("cycle").unwrap().parse::<BillingCycle>()?;
    let renewal = parse_date(sub.get_one::<String>("renewal").unwrap())?;
    let entry_ccy = sub
        .get_one::<String>("currency")
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| BASE.to_string());

    // Duplicate names warn rather than block; --force confirms.
    if let Some(existing) = store.find_by_name(&name)? {
        if !sub.get_flag("force") {
            println!(
                "A subscription named '{}' already exists (id {}). Re-run with --force to add anyway.",
                existing.name, existing.id
            );
            return Ok(());
        }
    }

    // Prices are persisted in the base currency; the entered amount and
    // currency are kept for provenance.
    let (price, original_price, original_currency) = if entry_ccy == BASE {
        (entered_price, None, None)
    } else {
        let rates = currency::load(conn)?;
        let converted = round_cents(rates.convert(entered_price, &entry_ccy, BASE));
        (converted, Some(entered_price), Some(entry_ccy.clone()))
    };

    let created = store.create(&NewSubscription {
        name,
        category,
        price,
        original_price,
        original_currency,
        billing_cycle: cycle,
        renewal_date: renewal,
        status: Status::Active,
        payment_method: sub.get_one::<String>("payment").map(|s| s.to_string()),
        notes: sub.get_one::<String>("notes").map(|s| s.to_string()),
    })?;
    println!(
        "Added '{}' (id {}): {} {} / {}, renews {}",
        created.name,
        created.id,
        format_money(created.price, BASE),
        BASE,
        created.billing_cycle,
        created.renewal_date
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let store = SubscriptionStore::new(conn);
    let mut subs = store.list()?;

    if let Some(needle) = sub.get_one::<String>("name") {
        subs.retain(|s| store::name_matches(s, needle));
    }
    if let Some(status) = sub.get_one::<String>("status") {
        let status = status.parse::<Status>()?;
        subs.retain(|s| s.status == status);
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        let cat = cat.parse::<Category>()?;
        subs.retain(|s| s.category == cat);
    }

    if maybe_print_json(json_flag, jsonl_flag, &subs)? {
        return Ok(());
    }

    let display = sub
        .get_one::<String>("currency")
        .map(|s| s.to_uppercase())
        .map(Ok)
        .unwrap_or_else(|| get_display_currency(conn))?;
    let rates = currency::load(conn)?;

    let rows: Vec<Vec<String>> = subs
        .iter()
        .map(|s| {
            let price_disp = rates.convert(s.price, BASE, &display);
            let monthly_disp = rates.convert(store::monthly_equivalent(s), BASE, &display);
            vec![
                s.id.to_string(),
                s.name.clone(),
                s.category.to_string(),
                format_money(price_disp, &display),
                s.billing_cycle.to_string(),
                format_money(monthly_disp, &display),
                s.renewal_date.to_string(),
                s.status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Category", "Price", "Cycle", "Monthly", "Renews", "Status"],
            rows
        )
    );

    let active: Vec<_> = subs.iter().filter(|s| s.status == Status::Active).cloned().collect();
    let total = rates.convert(store::total_monthly_spend(&active), BASE, &display);
    println!("Active monthly spend: {}", format_money(total, &display));
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let patch = SubscriptionPatch {
        name: sub.get_one::<String>("name").map(|s| s.to_string()),
        category: sub
            .get_one::<String>("category")
            .map(|s| s.parse::<Category>())
            .transpose()?,
        price: sub
            .get_one::<String>("price")
            .map(|s| parse_decimal(s))
            .transpose()?,
        billing_cycle: sub
            .get_one::<String>("cycle")
            .map(|s| s.parse::<BillingCycle>())
            .transpose()?,
        renewal_date: sub
            .get_one::<String>("renewal")
            .map(|s| parse_date(s))
            .transpose()?,
        status: sub
            .get_one::<String>("status")
            .map(|s| s.parse::<Status>())
            .transpose()?,
        payment_method: sub.get_one::<String>("payment").map(|s| s.to_string()),
        notes: sub.get_one::<String>("notes").map(|s| s.to_string()),
    };
    if patch.is_empty() {
        println!("Nothing to change for subscription {}", id);
        return Ok(());
    }
    SubscriptionStore::new(conn).update(id, &patch)?;
    println!("Updated subscription {}", id);
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    SubscriptionStore::new(conn).delete(id)?;
    println!("Removed subscription {}", id);
    Ok(())
}

fn set_status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let status = sub.get_one::<String>("status").unwrap().parse::<Status>()?;
    let patch = SubscriptionPatch {
        status: Some(status),
        ..Default::default()
    };
    SubscriptionStore::new(conn).update(id, &patch)?;
    println!("Subscription {} is now {}", id, status);
    Ok(())
}

fn upcoming(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let days = *sub.get_one::<usize>("days").unwrap_or(&7);
    let subs = SubscriptionStore::new(conn).list()?;
    let today = Utc::now().date_naive();
    let due = store::upcoming_renewals(&subs, today, days as i64);

    if maybe_print_json(json_flag, jsonl_flag, &due)? {
        return Ok(());
    }

    let display = get_display_currency(conn)?;
    let rates = currency::load(conn)?;
    let rows: Vec<Vec<String>> = due
        .iter()
        .map(|s| {
            let in_days = (s.renewal_date - today).num_days();
            vec![
                s.renewal_date.to_string(),
                format!("{}d", in_days),
                s.name.clone(),
                format_money(rates.convert(s.price, BASE, &display), &display),
                s.billing_cycle.to_string(),
            ]
        })
        .collect();
    if rows.is_empty() {
        println!("No renewals in the next {} days", days);
    } else {
        println!(
            "{}",
            pretty_table(&["Renews", "In", "Name", "Price", "Cycle"], rows)
        );
    }
    Ok(())
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::currency::{self, BASE};
use crate::models::{Status, TransactionKind};
use crate::store::SubscriptionStore;
use crate::utils::{get_display_currency, pretty_table};

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Subscriptions that violate the price invariant
    let subs = SubscriptionStore::new(conn).list()?;
    for s in &subs {
        if s.price <= Decimal::ZERO {
            rows.push(vec![
                "non_positive_price".into(),
                format!("id {} '{}'", s.id, s.name),
            ]);
        }
    }

    // 2) Active subscriptions whose renewal date has already passed. The core
    // never advances renewal dates; the user is expected to edit them.
    let today = Utc::now().date_naive();
    for s in &subs {
        if s.status == Status::Active && s.renewal_date < today {
            rows.push(vec![
                "overdue_renewal".into(),
                format!("id {} '{}' renewed {}", s.id, s.name, s.renewal_date),
            ]);
        }
    }

    // 3) Display currency without a cached rate
    let display = get_display_currency(conn)?;
    let rates = currency::load(conn)?;
    if display != BASE && rates.rate(&display).is_none() {
        rows.push(vec!["missing_rate".into(), display]);
    }

    // 4) Savings ledger chain: replaying the entries in creation order must
    // reproduce every stored balance_after.
    let mut stmt = conn.prepare(
        "SELECT id, amount, kind, balance_after FROM savings_transactions
         ORDER BY created_at, id",
    )?;
    let mut cur = stmt.query([])?;
    let mut running = Decimal::ZERO;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let amount_s: String = r.get(1)?;
        let kind_s: String = r.get(2)?;
        let stored_s: String = r.get(3)?;
        let (Ok(amount), Ok(stored)) = (amount_s.parse::<Decimal>(), stored_s.parse::<Decimal>())
        else {
            rows.push(vec!["savings_corrupt_row".into(), format!("id {}", id)]);
            continue;
        };
        match kind_s.parse::<TransactionKind>() {
            Ok(TransactionKind::Deposit) => running += amount,
            Ok(TransactionKind::Withdrawal) => running -= amount,
            Err(_) => {
                rows.push(vec!["savings_corrupt_row".into(), format!("id {}", id)]);
                continue;
            }
        }
        if running != stored {
            rows.push(vec![
                "savings_chain_mismatch".into(),
                format!("id {}: stored {}, replayed {}", id, stored, running),
            ]);
            running = stored;
        }
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

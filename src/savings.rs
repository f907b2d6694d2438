// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Salary preferences and the append-only savings ledger. Entries are never
//! mutated; the running balance is carried on each row as `balance_after`.
//! The only destructive operation is [`reset`], which drops the whole ledger
//! at once.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    BudgetSummary, Preferences, SavingsStats, SavingsTransaction, TransactionKind, ValidationError,
};
use crate::store::StoreError;
use crate::utils::round_cents;

/// Stats are computed over the most recent transactions only, not the full
/// history.
pub const STATS_WINDOW: usize = 20;

const AUTO_DEPOSIT_NOTE: &str = "Monthly automatic savings";

pub fn get_preferences(conn: &Connection) -> Result<Preferences, StoreError> {
    let row: Option<(Option<String>, String)> = conn
        .query_row(
            "SELECT monthly_salary, savings_percentage FROM preferences WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((salary_s, pct_s)) = row else {
        return Ok(Preferences::default());
    };
    let monthly_salary = salary_s
        .map(|s| {
            s.parse::<Decimal>().map_err(|_| StoreError::Corrupt {
                field: "monthly_salary",
                value: s,
            })
        })
        .transpose()?;
    let savings_percentage = pct_s.parse::<Decimal>().map_err(|_| StoreError::Corrupt {
        field: "savings_percentage",
        value: pct_s,
    })?;
    Ok(Preferences {
        monthly_salary,
        savings_percentage,
    })
}

pub fn update_preferences(
    conn: &Connection,
    monthly_salary: Option<Decimal>,
    savings_percentage: Option<Decimal>,
) -> Result<Preferences, StoreError> {
    let current = get_preferences(conn)?;
    let salary = monthly_salary.or(current.monthly_salary);
    let pct = savings_percentage.unwrap_or(current.savings_percentage);
    conn.execute(
        "INSERT INTO preferences(id, monthly_salary, savings_percentage)
         VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET monthly_salary=excluded.monthly_salary,
             savings_percentage=excluded.savings_percentage,
             updated_at=datetime('now')",
        params![salary.map(|s| s.to_string()), pct.to_string()],
    )?;
    get_preferences(conn)
}

/// Balance as of the newest ledger entry; zero for an empty ledger.
pub fn current_balance(conn: &Connection) -> Result<Decimal, StoreError> {
    let v: Option<String> = conn
        .query_row(
            "SELECT balance_after FROM savings_transactions
             ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => s.parse::<Decimal>().map_err(|_| StoreError::Corrupt {
            field: "balance_after",
            value: s,
        }),
        None => Ok(Decimal::ZERO),
    }
}

pub fn deposit(
    conn: &Connection,
    amount: Decimal,
    note: Option<&str>,
) -> Result<SavingsTransaction, StoreError> {
    record(conn, TransactionKind::Deposit, amount, note)
}

pub fn withdraw(
    conn: &Connection,
    amount: Decimal,
    note: Option<&str>,
) -> Result<SavingsTransaction, StoreError> {
    record(conn, TransactionKind::Withdrawal, amount, note)
}

fn record(
    conn: &Connection,
    kind: TransactionKind,
    amount: Decimal,
    note: Option<&str>,
) -> Result<SavingsTransaction, StoreError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount.into());
    }
    let balance = current_balance(conn)?;
    // Overdrafts are rejected locally, before any write.
    if kind == TransactionKind::Withdrawal && amount > balance {
        return Err(ValidationError::InsufficientBalance {
            requested: amount,
            balance,
        }
        .into());
    }
    let balance_after = match kind {
        TransactionKind::Deposit => balance + amount,
        TransactionKind::Withdrawal => balance - amount,
    };
    conn.execute(
        "INSERT INTO savings_transactions(amount, kind, note, balance_after)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            amount.to_string(),
            kind.as_str(),
            note,
            balance_after.to_string()
        ],
    )?;
    get_transaction(conn, conn.last_insert_rowid())
}

/// Deposit this month's configured savings slice in one step.
pub fn auto_deposit(conn: &Connection) -> Result<SavingsTransaction, StoreError> {
    let prefs = get_preferences(conn)?;
    let Some(salary) = prefs.monthly_salary else {
        return Err(ValidationError::SalaryNotSet.into());
    };
    let amount = round_cents(salary * prefs.savings_percentage / Decimal::from(100));
    deposit(conn, amount, Some(AUTO_DEPOSIT_NOTE))
}

/// Permanently delete the entire ledger, returning the balance to zero.
/// Returns the number of removed entries.
pub fn reset(conn: &Connection) -> Result<usize, StoreError> {
    let n = conn.execute("DELETE FROM savings_transactions", [])?;
    Ok(n)
}

fn get_transaction(conn: &Connection, id: i64) -> Result<SavingsTransaction, StoreError> {
    let raw: (i64, String, String, Option<String>, String, String) = conn.query_row(
        "SELECT id, amount, kind, note, balance_after, created_at
         FROM savings_transactions WHERE id=?1",
        params![id],
        |r| {
            Ok((
                r.get(0)?,
                r.get(1)?,
                r.get(2)?,
                r.get(3)?,
                r.get(4)?,
                r.get(5)?,
            ))
        },
    )?;
    parse_transaction(raw)
}

/// Newest-first slice of the ledger for display and stats.
pub fn recent_transactions(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<SavingsTransaction>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, kind, note, balance_after, created_at
         FROM savings_transactions ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(parse_transaction(row?)?);
    }
    Ok(out)
}

fn parse_transaction(
    raw: (i64, String, String, Option<String>, String, String),
) -> Result<SavingsTransaction, StoreError> {
    let (id, amount_s, kind_s, note, balance_s, created_at) = raw;
    Ok(SavingsTransaction {
        id,
        amount: amount_s.parse().map_err(|_| StoreError::Corrupt {
            field: "amount",
            value: amount_s,
        })?,
        kind: kind_s.parse().map_err(|_| StoreError::Corrupt {
            field: "kind",
            value: kind_s,
        })?,
        note,
        balance_after: balance_s.parse().map_err(|_| StoreError::Corrupt {
            field: "balance_after",
            value: balance_s,
        })?,
        created_at,
    })
}

/// salary − subscriptions − savings = remaining.
pub fn budget_summary(
    prefs: &Preferences,
    total_monthly_spend: Decimal,
    current_savings_balance: Decimal,
) -> BudgetSummary {
    let savings_amount = match prefs.monthly_salary {
        Some(salary) => round_cents(salary * prefs.savings_percentage / Decimal::from(100)),
        None => Decimal::ZERO,
    };
    let remaining_budget = match prefs.monthly_salary {
        Some(salary) => round_cents(salary - total_monthly_spend - savings_amount),
        None => Decimal::ZERO,
    };
    BudgetSummary {
        monthly_salary: prefs.monthly_salary,
        total_subscriptions: round_cents(total_monthly_spend),
        savings_amount,
        remaining_budget,
        savings_percentage: prefs.savings_percentage,
        current_savings_balance,
    }
}

/// Deposit and withdrawal totals over the supplied window (normally the
/// newest [`STATS_WINDOW`] entries, newest first).
pub fn savings_stats(
    prefs: &Preferences,
    transactions: &[SavingsTransaction],
    current_balance: Decimal,
) -> SavingsStats {
    let total_deposits = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Deposit)
        .map(|t| t.amount)
        .sum();
    let total_withdrawals = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Withdrawal)
        .map(|t| t.amount)
        .sum();
    let monthly_savings = match prefs.monthly_salary {
        Some(salary) => round_cents(salary * prefs.savings_percentage / Decimal::from(100)),
        None => Decimal::ZERO,
    };
    SavingsStats {
        total_deposits,
        total_withdrawals,
        current_balance,
        monthly_savings,
        last_transaction_at: transactions.first().map(|t| t.created_at.clone()),
    }
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("io.subtrack", "Subtrack", "subtrack"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("subtrack.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Idempotent schema setup. Public so tests can run against an in-memory
/// connection instead of the platform data dir.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS subscriptions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        category TEXT NOT NULL CHECK(category IN ('Streaming','Software','Fitness','Gaming','Other')),
        price TEXT NOT NULL, -- stored in BASE currency
        original_price TEXT,
        original_currency TEXT,
        billing_cycle TEXT NOT NULL CHECK(billing_cycle IN ('weekly','monthly','yearly')),
        renewal_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','paused','cancelled')),
        payment_method TEXT,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_subscriptions_renewal ON subscriptions(renewal_date);

    CREATE TABLE IF NOT EXISTS preferences(
        id INTEGER PRIMARY KEY CHECK(id = 1),
        monthly_salary TEXT,
        savings_percentage TEXT NOT NULL DEFAULT '0',
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Append-only; balance_after is the running balance in creation order.
    CREATE TABLE IF NOT EXISTS savings_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('deposit','withdrawal')),
        note TEXT,
        balance_after TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_savings_created ON savings_transactions(created_at);

    -- FX rates relative to the base currency: 1 BASE = rate units of currency.
    CREATE TABLE IF NOT EXISTS fx_rates(
        currency TEXT PRIMARY KEY,
        rate TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::utils::{get_setting, round_cents, set_setting};

/// All subscription prices are persisted in this currency.
pub const BASE: &str = "USD";

const RATES_URL: &str = "https://api.exchangerate.host/latest";
const CACHE_MAX_AGE_HOURS: i64 = 8;
const FETCHED_AT_KEY: &str = "fx_fetched_at";

// Compiled-in fallback, used until a fetch succeeds.
const FALLBACK_RATES: &[(&str, &str)] = &[("USD", "1"), ("EUR", "0.85"), ("RSD", "99.1")];

const SYMBOLS: &[(&str, &str)] = &[("USD", "$"), ("EUR", "€"), ("RSD", "дин")];

const UA: &str = concat!(
    "subtrack/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/subtrack/subtrack)"
);

fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Exchange rates keyed by currency code, expressed relative to [`BASE`]
/// (`rate[BASE] == 1`). A value, not ambient state: callers load it once and
/// pass it into whatever needs conversion.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn fallback() -> Self {
        let rates = FALLBACK_RATES
            .iter()
            .map(|(c, r)| (c.to_string(), r.parse::<Decimal>().unwrap_or(Decimal::ONE)))
            .collect();
        Self { rates }
    }

    pub fn from_rates(rates: HashMap<String, Decimal>) -> Self {
        let mut table = Self { rates };
        table.rates.insert(BASE.to_string(), Decimal::ONE);
        table
    }

    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    pub fn currencies(&self) -> Vec<String> {
        let mut out: Vec<String> = self.rates.keys().cloned().collect();
        out.sort();
        out
    }

    /// Two-hop conversion through the base currency. An unknown or zero rate
    /// on either side leaves the amount unchanged rather than failing; display
    /// degradation beats a hard error here.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        if from == to {
            return amount;
        }
        let Some(from_rate) = self.rate(from) else {
            return amount;
        };
        let Some(to_rate) = self.rate(to) else {
            return amount;
        };
        if from_rate.is_zero() {
            return amount;
        }
        amount / from_rate * to_rate
    }
}

/// "$12.34" for currencies with a known symbol, "XYZ 12.34" otherwise.
pub fn format_money(amount: Decimal, code: &str) -> String {
    let rounded = round_cents(amount);
    match SYMBOLS.iter().find(|(c, _)| *c == code) {
        Some((_, sym)) => format!("{}{:.2}", sym, rounded),
        None => format!("{} {:.2}", code, rounded),
    }
}

pub fn load(conn: &Connection) -> Result<RateTable> {
    let mut stmt = conn.prepare("SELECT currency, rate FROM fx_rates")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    let mut rates = HashMap::new();
    for row in rows {
        let (ccy, rate_s) = row?;
        let rate = rate_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid stored rate '{}' for {}", rate_s, ccy))?;
        rates.insert(ccy, rate);
    }
    if rates.is_empty() {
        return Ok(RateTable::fallback());
    }
    Ok(RateTable::from_rates(rates))
}

fn save(conn: &Connection, table: &RateTable) -> Result<()> {
    for ccy in table.currencies() {
        if let Some(rate) = table.rate(&ccy) {
            conn.execute(
                "INSERT INTO fx_rates(currency, rate) VALUES(?1, ?2)
                 ON CONFLICT(currency) DO UPDATE SET rate=excluded.rate",
                params![ccy, rate.to_string()],
            )?;
        }
    }
    set_setting(conn, FETCHED_AT_KEY, &Utc::now().to_rfc3339())?;
    Ok(())
}

/// Currencies worth keeping rates for: the fallback set plus anything a
/// subscription was originally entered in, plus the display currency.
fn tracked_currencies(conn: &Connection) -> Result<Vec<String>> {
    let mut out: Vec<String> = FALLBACK_RATES.iter().map(|(c, _)| c.to_string()).collect();
    let mut stmt = conn.prepare(
        "SELECT DISTINCT original_currency FROM subscriptions WHERE original_currency IS NOT NULL",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    for row in rows {
        let c = row?;
        if !c.is_empty() && !out.contains(&c) {
            out.push(c);
        }
    }
    let display = crate::utils::get_display_currency(conn)?;
    if !out.contains(&display) {
        out.push(display);
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct Latest {
    rates: HashMap<String, f64>,
}

/// Fetch current rates and persist them. Errors propagate; callers decide
/// whether to surface or swallow them.
pub fn refresh(conn: &Connection) -> Result<RateTable> {
    let targets: Vec<String> = tracked_currencies(conn)?
        .into_iter()
        .filter(|c| c != BASE)
        .collect();
    let symbols = targets.join(",");
    let url = format!("{RATES_URL}?base={BASE}&symbols={symbols}");
    let client = http_client()?;
    let resp = client.get(url).send()?.error_for_status()?;
    let latest: Latest = resp.json()?;

    let mut rates = HashMap::new();
    for (ccy, rate) in latest.rates {
        let rate = Decimal::try_from(rate)
            .with_context(|| format!("Invalid rate '{}' for {}", rate, ccy))?;
        rates.insert(ccy, rate);
    }
    let table = RateTable::from_rates(rates);
    save(conn, &table)?;
    Ok(table)
}

fn cache_is_fresh(conn: &Connection) -> Result<bool> {
    let Some(stamp) = get_setting(conn, FETCHED_AT_KEY)? else {
        return Ok(false);
    };
    let Ok(fetched_at) = DateTime::parse_from_rfc3339(&stamp) else {
        return Ok(false);
    };
    let age = Utc::now().signed_duration_since(fetched_at.with_timezone(&Utc));
    Ok(age < chrono::Duration::hours(CACHE_MAX_AGE_HOURS))
}

/// Refresh the cached table when it is missing or older than 8 hours. A
/// failed fetch is not an error: the stored (possibly stale) or fallback
/// table stays in effect.
pub fn ensure_fresh(conn: &Connection) -> Result<RateTable> {
    if !cache_is_fresh(conn)? {
        if let Ok(table) = refresh(conn) {
            return Ok(table);
        }
    }
    load(conn)
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    BillingCycle, Category, NewSubscription, Status, Subscription, SubscriptionPatch,
    ValidationError,
};

/// Failure surface of the subscription store. Store failures are reported to
/// the user once and never retried automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("subscription {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("corrupt {field} value '{value}' in store")]
    Corrupt { field: &'static str, value: String },
}

fn parse_field<T: std::str::FromStr>(value: String, field: &'static str) -> Result<T, StoreError> {
    value
        .parse::<T>()
        .map_err(|_| StoreError::Corrupt { field, value })
}

const SELECT_COLS: &str = "id, name, category, price, original_price, original_currency, \
     billing_cycle, renewal_date, status, payment_method, notes, created_at";

type RawRow = (
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    NaiveDate,
    String,
    Option<String>,
    Option<String>,
    String,
);

fn raw_row(r: &Row) -> rusqlite::Result<RawRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
        r.get(10)?,
        r.get(11)?,
    ))
}

fn from_raw(raw: RawRow) -> Result<Subscription, StoreError> {
    let (
        id,
        name,
        category,
        price,
        original_price,
        original_currency,
        billing_cycle,
        renewal_date,
        status,
        payment_method,
        notes,
        created_at,
    ) = raw;
    Ok(Subscription {
        id,
        name,
        category: parse_field::<Category>(category, "category")?,
        price: parse_field::<Decimal>(price, "price")?,
        original_price: original_price
            .map(|p| parse_field::<Decimal>(p, "original_price"))
            .transpose()?,
        original_currency,
        billing_cycle: parse_field::<BillingCycle>(billing_cycle, "billing_cycle")?,
        renewal_date,
        status: parse_field::<Status>(status, "status")?,
        payment_method,
        notes,
        created_at,
    })
}

/// CRUD boundary over the externally-owned subscription rows.
pub struct SubscriptionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SubscriptionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self) -> Result<Vec<Subscription>, StoreError> {
        let sql = format!("SELECT {SELECT_COLS} FROM subscriptions ORDER BY renewal_date, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], raw_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(from_raw(row?)?);
        }
        Ok(out)
    }

    pub fn get(&self, id: i64) -> Result<Subscription, StoreError> {
        let sql = format!("SELECT {SELECT_COLS} FROM subscriptions WHERE id=?1");
        let raw = self
            .conn
            .query_row(&sql, params![id], raw_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        from_raw(raw)
    }

    /// Case-insensitive name lookup, used for the duplicate warning on add.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Subscription>, StoreError> {
        let sql = format!("SELECT {SELECT_COLS} FROM subscriptions WHERE LOWER(name)=LOWER(?1)");
        let raw = self.conn.query_row(&sql, params![name], raw_row).optional()?;
        raw.map(from_raw).transpose()
    }

    pub fn create(&self, new: &NewSubscription) -> Result<Subscription, StoreError> {
        new.validate()?;
        self.conn.execute(
            "INSERT INTO subscriptions(name, category, price, original_price, original_currency,
                                       billing_cycle, renewal_date, status, payment_method, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                new.name,
                new.category.as_str(),
                new.price.to_string(),
                new.original_price.map(|p| p.to_string()),
                new.original_currency,
                new.billing_cycle.as_str(),
                new.renewal_date.to_string(),
                new.status.as_str(),
                new.payment_method,
                new.notes,
            ],
        )?;
        self.get(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, patch: &SubscriptionPatch) -> Result<(), StoreError> {
        patch.validate()?;
        let current = self.get(id)?;
        let name = patch.name.clone().unwrap_or(current.name);
        let category = patch.category.unwrap_or(current.category);
        let price = patch.price.unwrap_or(current.price);
        let billing_cycle = patch.billing_cycle.unwrap_or(current.billing_cycle);
        let renewal_date = patch.renewal_date.unwrap_or(current.renewal_date);
        let status = patch.status.unwrap_or(current.status);
        let payment_method = patch.payment_method.clone().or(current.payment_method);
        let notes = patch.notes.clone().or(current.notes);
        self.conn.execute(
            "UPDATE subscriptions
             SET name=?1, category=?2, price=?3, billing_cycle=?4, renewal_date=?5,
                 status=?6, payment_method=?7, notes=?8
             WHERE id=?9",
            params![
                name,
                category.as_str(),
                price.to_string(),
                billing_cycle.as_str(),
                renewal_date.to_string(),
                status.as_str(),
                payment_method,
                notes,
                id,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let n = self
            .conn
            .execute("DELETE FROM subscriptions WHERE id=?1", params![id])?;
        if n == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// Monthly-equivalent cost of a subscription, normalizing the billing cycle
/// to a common monthly basis.
pub fn monthly_equivalent(sub: &Subscription) -> Decimal {
    match sub.billing_cycle {
        BillingCycle::Weekly => sub.price * Decimal::from(52) / Decimal::from(12),
        BillingCycle::Monthly => sub.price,
        BillingCycle::Yearly => sub.price / Decimal::from(12),
    }
}

pub fn annual_equivalent(sub: &Subscription) -> Decimal {
    match sub.billing_cycle {
        BillingCycle::Weekly => sub.price * Decimal::from(52),
        BillingCycle::Monthly => sub.price * Decimal::from(12),
        BillingCycle::Yearly => sub.price,
    }
}

/// Sum of monthly equivalents over `subs`, regardless of status. Callers that
/// want active-only spend filter before calling.
pub fn total_monthly_spend(subs: &[Subscription]) -> Decimal {
    subs.iter().map(monthly_equivalent).sum()
}

/// Case-insensitive substring match on the subscription name.
pub fn name_matches(sub: &Subscription, needle: &str) -> bool {
    sub.name.to_lowercase().contains(&needle.to_lowercase())
}

/// Active subscriptions renewing within `days` of `today`, soonest first.
pub fn upcoming_renewals(subs: &[Subscription], today: NaiveDate, days: i64) -> Vec<Subscription> {
    let horizon = today + chrono::Duration::days(days);
    let mut out: Vec<Subscription> = subs
        .iter()
        .filter(|s| {
            s.status == Status::Active && s.renewal_date >= today && s.renewal_date <= horizon
        })
        .cloned()
        .collect();
    out.sort_by_key(|s| (s.renewal_date, s.id));
    out
}

// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const NAME_MAX_LEN: usize = 100;
pub const NOTES_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Streaming,
    Software,
    Fitness,
    Gaming,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Streaming,
        Category::Software,
        Category::Fitness,
        Category::Gaming,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Streaming => "Streaming",
            Category::Software => "Software",
            Category::Fitness => "Fitness",
            Category::Gaming => "Gaming",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "streaming" => Ok(Category::Streaming),
            "software" => Ok(Category::Software),
            "fitness" => Ok(Category::Fitness),
            "gaming" => Ok(Category::Gaming),
            "other" => Ok(Category::Other),
            _ => Err(ParseEnumError::new("category", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingCycle {
    Weekly,
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(ParseEnumError::new("billing cycle", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Paused,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Paused => "paused",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "paused" => Ok(Status::Paused),
            "cancelled" | "canceled" => Ok(Status::Cancelled),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A recurring subscription. `price` is always stored in the base currency;
/// the original entry amount and currency are kept for display provenance only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub original_currency: Option<String>,
    pub billing_cycle: BillingCycle,
    pub renewal_date: NaiveDate,
    pub status: Status,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Fields for a subscription about to be created; the store assigns the id
/// and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub category: Category,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub original_currency: Option<String>,
    pub billing_cycle: BillingCycle,
    pub renewal_date: NaiveDate,
    pub status: Status,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl NewSubscription {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub renewal_date: Option<NaiveDate>,
    pub status: Option<Status>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl SubscriptionPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.billing_cycle.is_none()
            && self.renewal_date.is_none()
            && self.status.is_none()
            && self.payment_method.is_none()
            && self.notes.is_none()
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice);
    }
    Ok(())
}

fn validate_notes(notes: Option<&str>) -> Result<(), ValidationError> {
    if let Some(n) = notes {
        if n.chars().count() > NOTES_MAX_LEN {
            return Err(ValidationError::NotesTooLong);
        }
    }
    Ok(())
}

/// Rejections raised before any store write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("name must not be empty")]
    EmptyName,
    #[error("name exceeds {NAME_MAX_LEN} characters")]
    NameTooLong,
    #[error("notes exceed {NOTES_MAX_LEN} characters")]
    NotesTooLong,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("withdrawal of {requested} exceeds current balance {balance}")]
    InsufficientBalance { requested: Decimal, balance: Decimal },
    #[error("no monthly salary configured")]
    SalaryNotSet,
}

/// Salary and savings preferences; a single row in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub monthly_salary: Option<Decimal>,
    pub savings_percentage: Decimal,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            monthly_salary: None,
            savings_percentage: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            _ => Err(ParseEnumError::new("transaction kind", s)),
        }
    }
}

/// One immutable entry in the append-only savings ledger. `balance_after` is
/// the running balance as of this entry, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTransaction {
    pub id: i64,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub balance_after: Decimal,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    pub monthly_salary: Option<Decimal>,
    pub total_subscriptions: Decimal,
    pub savings_amount: Decimal,
    pub remaining_budget: Decimal,
    pub savings_percentage: Decimal,
    pub current_savings_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavingsStats {
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub current_balance: Decimal,
    pub monthly_savings: Decimal,
    pub last_transaction_at: Option<String>,
}

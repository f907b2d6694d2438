// Copyright (c) 2025 Subtrack Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use subtrack::db;
use subtrack::models::{
    BillingCycle, Category, NewSubscription, Status, SubscriptionPatch, ValidationError,
};
use subtrack::store::{name_matches, upcoming_renewals, StoreError, SubscriptionStore};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn new_sub(name: &str, price: &str, renewal: (i32, u32, u32)) -> NewSubscription {
    NewSubscription {
        name: name.to_string(),
        category: Category::Streaming,
        price: price.parse().unwrap(),
        original_price: None,
        original_currency: None,
        billing_cycle: BillingCycle::Monthly,
        renewal_date: NaiveDate::from_ymd_opt(renewal.0, renewal.1, renewal.2).unwrap(),
        status: Status::Active,
        payment_method: None,
        notes: None,
    }
}

#[test]
fn create_list_update_delete() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);

    let created = store.create(&new_sub("Netflix", "15.99", (2025, 9, 3))).unwrap();
    assert!(created.id > 0);
    assert_eq!(created.status, Status::Active);

    store.create(&new_sub("Spotify", "9.99", (2025, 8, 20))).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    // ordered by renewal date
    assert_eq!(listed[0].name, "Spotify");

    let patch = SubscriptionPatch {
        price: Some("17.99".parse().unwrap()),
        status: Some(Status::Paused),
        ..Default::default()
    };
    store.update(created.id, &patch).unwrap();
    let got = store.get(created.id).unwrap();
    assert_eq!(got.price, "17.99".parse::<Decimal>().unwrap());
    assert_eq!(got.status, Status::Paused);
    // untouched fields survive a partial update
    assert_eq!(got.name, "Netflix");
    assert_eq!(got.billing_cycle, BillingCycle::Monthly);

    store.delete(created.id).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    assert!(matches!(store.get(created.id), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete(created.id), Err(StoreError::NotFound(_))));
}

#[test]
fn validation_rejects_before_any_write() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);

    let mut bad = new_sub("Free Tier", "0", (2025, 9, 1));
    assert!(matches!(
        store.create(&bad),
        Err(StoreError::Invalid(ValidationError::NonPositivePrice))
    ));

    bad.price = "9.99".parse().unwrap();
    bad.name = "   ".to_string();
    assert!(matches!(
        store.create(&bad),
        Err(StoreError::Invalid(ValidationError::EmptyName))
    ));

    bad.name = "x".repeat(101);
    assert!(matches!(
        store.create(&bad),
        Err(StoreError::Invalid(ValidationError::NameTooLong))
    ));

    bad.name = "Fine".to_string();
    bad.notes = Some("n".repeat(501));
    assert!(matches!(
        store.create(&bad),
        Err(StoreError::Invalid(ValidationError::NotesTooLong))
    ));

    assert!(store.list().unwrap().is_empty());
}

#[test]
fn duplicate_names_found_case_insensitively() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);
    store.create(&new_sub("Netflix", "15.99", (2025, 9, 3))).unwrap();
    assert!(store.find_by_name("netflix").unwrap().is_some());
    assert!(store.find_by_name("NETFLIX").unwrap().is_some());
    assert!(store.find_by_name("Hulu").unwrap().is_none());
}

#[test]
fn name_filter_matches_substrings_case_insensitively() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);
    let sub = store
        .create(&new_sub("Netflix Premium", "15.99", (2025, 9, 3)))
        .unwrap();
    assert!(name_matches(&sub, "flix"));
    assert!(name_matches(&sub, "NETFLIX"));
    assert!(name_matches(&sub, "premium"));
    assert!(!name_matches(&sub, "hulu"));
}

#[test]
fn original_entry_provenance_survives() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);
    let mut sub = new_sub("Deezer", "10.59", (2025, 9, 3));
    sub.original_price = Some("9.00".parse().unwrap());
    sub.original_currency = Some("EUR".to_string());
    let created = store.create(&sub).unwrap();
    let got = store.get(created.id).unwrap();
    assert_eq!(got.original_price, Some("9.00".parse().unwrap()));
    assert_eq!(got.original_currency, Some("EUR".to_string()));
}

#[test]
fn upcoming_renewals_window_and_order() {
    let conn = setup();
    let store = SubscriptionStore::new(&conn);
    store.create(&new_sub("due-soon", "5", (2025, 8, 28))).unwrap();
    store.create(&new_sub("due-later", "5", (2025, 9, 10))).unwrap();
    store.create(&new_sub("due-today", "5", (2025, 8, 25))).unwrap();
    let cancelled = store.create(&new_sub("cancelled", "5", (2025, 8, 26))).unwrap();
    store
        .update(
            cancelled.id,
            &SubscriptionPatch {
                status: Some(Status::Cancelled),
                ..Default::default()
            },
        )
        .unwrap();

    let subs = store.list().unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let due = upcoming_renewals(&subs, today, 7);
    let names: Vec<&str> = due.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["due-today", "due-soon"]);
}

#[test]
fn works_against_a_file_backed_db() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subtrack.sqlite");
    let mut conn = Connection::open(&path).unwrap();
    db::init_schema(&mut conn).unwrap();
    let store = SubscriptionStore::new(&conn);
    store.create(&new_sub("Persisted", "4.99", (2025, 9, 1))).unwrap();
    drop(store);
    drop(conn);

    let conn = Connection::open(&path).unwrap();
    let store = SubscriptionStore::new(&conn);
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Persisted");
}

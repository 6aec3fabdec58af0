//! Integration tests for carrental-core services
//!
//! These tests drive the services against a real DuckDB file in a temp dir.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use carrental_core::adapters::duckdb::DuckDbRepository;
use carrental_core::config::Config;
use carrental_core::domain::rental::parse_timestamp;
use carrental_core::ports::Repository;
use carrental_core::{AvailabilityPolicy, Car, Customer, Error, RentalContext};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn create_context(temp_dir: &TempDir, policy: AvailabilityPolicy) -> RentalContext {
    let config = Config::default().with_availability_policy(policy);
    RentalContext::with_repository(config, create_test_repo(temp_dir))
}

fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).expect("valid timestamp")
}

/// Seed one car at 10/h and one customer
fn seed(ctx: &RentalContext) -> (i64, i64) {
    let car = ctx
        .car_service
        .add_car(Car::new("Toyota", "Corolla", 2020, "ABC-123", Decimal::from(10)))
        .expect("add car");
    let customer = ctx
        .customer_service
        .add_customer(Customer::new("Ada", "Lovelace", "ada@example.com", "555-0100"))
        .expect("add customer");
    (car.id, customer.id)
}

// ============================================================================
// Booking Scenario
// ============================================================================

#[test]
fn test_end_to_end_booking_on_duckdb() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let (car_id, customer_id) = seed(&ctx);

    let first = ctx
        .rental_service
        .create_rental(car_id, customer_id, ts("2024-01-01 10:00"), Some(ts("2024-01-01 13:30")))
        .unwrap();
    assert_eq!(first.total_cost, Decimal::from(40));

    let clash = ctx.rental_service.create_rental(
        car_id,
        customer_id,
        ts("2024-01-01 12:00"),
        Some(ts("2024-01-01 14:00")),
    );
    assert!(matches!(clash, Err(Error::CarUnavailable(id)) if id == car_id));

    let second = ctx
        .rental_service
        .create_rental(car_id, customer_id, ts("2024-01-01 14:00"), Some(ts("2024-01-01 15:00")))
        .unwrap();
    assert_eq!(second.total_cost, Decimal::from(10));
    assert_ne!(first.rental_id, second.rental_id);

    let stored = ctx.rental_service.get_rental(first.rental_id).unwrap();
    assert_eq!(stored.start, ts("2024-01-01 10:00"));
    assert_eq!(stored.end, Some(ts("2024-01-01 13:30")));
    assert_eq!(stored.total_cost, Decimal::from(40));

    let for_car = ctx.rental_service.list_rentals_for_car(car_id).unwrap();
    assert_eq!(for_car.len(), 2);
    assert!(for_car[0].start <= for_car[1].start);
}

#[test]
fn test_rental_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let rental_id = {
        let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
        let (car_id, customer_id) = seed(&ctx);
        ctx.rental_service
            .create_rental(car_id, customer_id, ts("2024-03-01 08:00"), Some(ts("2024-03-01 08:30:15")))
            .unwrap()
            .rental_id
    };

    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let rental = ctx.rental_service.get_rental(rental_id).unwrap();
    assert_eq!(rental.end, Some(ts("2024-03-01 08:30:15")));
    assert_eq!(rental.total_cost, Decimal::from(10));
}

#[test]
fn test_delete_frees_interval() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let (car_id, customer_id) = seed(&ctx);
    let start = ts("2024-01-01 10:00");
    let end = Some(ts("2024-01-01 12:00"));

    let booked = ctx
        .rental_service
        .create_rental(car_id, customer_id, start, end)
        .unwrap();
    assert!(!ctx.rental_service.is_available(car_id, start, end).unwrap());

    assert!(ctx.rental_service.delete_rental(booked.rental_id).unwrap());
    assert!(!ctx.rental_service.delete_rental(booked.rental_id).unwrap());
    assert!(ctx.rental_service.is_available(car_id, start, end).unwrap());
}

#[test]
fn test_update_excludes_itself_on_duckdb() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let (car_id, customer_id) = seed(&ctx);
    let start = ts("2024-01-01 10:00");

    let booked = ctx
        .rental_service
        .create_rental(car_id, customer_id, start, None)
        .unwrap();
    let same = ctx
        .rental_service
        .update_rental(booked.rental_id, car_id, customer_id, start, None)
        .unwrap();
    assert_eq!(same.rental_id, booked.rental_id);

    let closed = ctx
        .rental_service
        .close_rental(booked.rental_id, ts("2024-01-01 12:00:01"))
        .unwrap();
    assert_eq!(closed.total_cost, Decimal::from(30));
}

#[test]
fn test_inverted_interval_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let (car_id, customer_id) = seed(&ctx);

    let result = ctx.rental_service.create_rental(
        car_id,
        customer_id,
        ts("2024-01-02 10:00"),
        Some(ts("2024-01-01 10:00")),
    );
    assert!(matches!(result, Err(Error::InvalidInterval { .. })));
    assert!(ctx.rental_service.list_rentals().unwrap().is_empty());
}

// ============================================================================
// Availability Policy
// ============================================================================

#[test]
fn test_active_rental_blocks_under_default_policy() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::ActiveBlocks);
    let (car_id, customer_id) = seed(&ctx);

    ctx.rental_service
        .create_rental(car_id, customer_id, ts("2024-01-01 10:00"), None)
        .unwrap();

    let later = ctx.rental_service.create_rental(
        car_id,
        customer_id,
        ts("2024-06-01 10:00"),
        Some(ts("2024-06-01 11:00")),
    );
    assert!(matches!(later, Err(Error::CarUnavailable(_))));

    // Ending before the active rental began is fine
    assert!(ctx
        .rental_service
        .is_available(car_id, ts("2023-12-31 08:00"), Some(ts("2024-01-01 10:00")))
        .unwrap());
}

#[test]
fn test_active_rental_ignored_under_confirmed_only() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::ConfirmedOnly);
    let (car_id, customer_id) = seed(&ctx);

    ctx.rental_service
        .create_rental(car_id, customer_id, ts("2024-01-01 10:00"), None)
        .unwrap();
    assert!(ctx
        .rental_service
        .create_rental(car_id, customer_id, ts("2024-06-01 10:00"), Some(ts("2024-06-01 11:00")))
        .is_ok());
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_car_and_customer_deletes_are_guarded() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let (car_id, customer_id) = seed(&ctx);

    let booked = ctx
        .rental_service
        .create_rental(car_id, customer_id, ts("2024-01-01 10:00"), Some(ts("2024-01-01 11:00")))
        .unwrap();

    assert!(matches!(ctx.car_service.delete_car(car_id), Err(Error::Validation(_))));
    assert!(matches!(
        ctx.customer_service.delete_customer(customer_id),
        Err(Error::Validation(_))
    ));

    ctx.rental_service.delete_rental(booked.rental_id).unwrap();
    ctx.car_service.delete_car(car_id).unwrap();
    ctx.customer_service.delete_customer(customer_id).unwrap();
    assert!(ctx.car_service.list_cars().unwrap().is_empty());
}

#[test]
fn test_decimal_rates_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());
    let car = ctx
        .car_service
        .add_car(Car::new("Mini", "Cooper", 2023, "MC-7", Decimal::new(1299, 2)))
        .unwrap();
    let customer = ctx
        .customer_service
        .add_customer(Customer::new("Alan", "Turing", "alan@example.com", "555-0199"))
        .unwrap();

    assert_eq!(ctx.car_service.get_car(car.id).unwrap().hourly_rate, Decimal::new(1299, 2));

    let receipt = ctx
        .rental_service
        .create_rental(car.id, customer.id, ts("2024-01-01 10:00"), Some(ts("2024-01-01 12:30")))
        .unwrap();
    assert_eq!(receipt.total_cost, Decimal::new(3897, 2));

    let status = ctx.status_service.get_status().unwrap();
    assert_eq!(status.total_cars, 1);
    assert_eq!(status.closed_rentals, 1);
    assert_eq!(status.total_revenue, Decimal::new(3897, 2));
}

#[test]
fn test_sub_cent_rates_never_reach_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());

    let rejected = ctx
        .car_service
        .add_car(Car::new("Fiat", "500", 2022, "FI-500", Decimal::new(10005, 3)));
    assert!(matches!(rejected, Err(Error::Validation(_))));
    assert!(ctx.car_service.list_cars().unwrap().is_empty());

    let car = ctx
        .car_service
        .add_car(Car::new("Fiat", "500", 2022, "FI-500", Decimal::new(10500, 3)))
        .unwrap();
    let stored = ctx.car_service.get_car(car.id).unwrap();
    assert_eq!(stored.hourly_rate, car.hourly_rate);

    let mut repriced = stored.clone();
    repriced.hourly_rate = Decimal::new(12345, 3);
    assert!(matches!(ctx.car_service.update_car(repriced), Err(Error::Validation(_))));
    assert_eq!(ctx.car_service.get_car(car.id).unwrap().hourly_rate, car.hourly_rate);

    let customer = ctx
        .customer_service
        .add_customer(Customer::new("Alan", "Turing", "alan@example.com", "555-0199"))
        .unwrap();
    let receipt = ctx
        .rental_service
        .create_rental(car.id, customer.id, ts("2024-01-01 10:00"), Some(ts("2024-01-01 13:00")))
        .unwrap();
    assert_eq!(receipt.total_cost, car.hourly_rate * Decimal::from(3));
    assert_eq!(
        ctx.rental_service.get_rental(receipt.rental_id).unwrap().total_cost,
        receipt.total_cost
    );
}

#[test]
fn test_login_gate_on_duckdb() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir, AvailabilityPolicy::default());

    ctx.auth_service.register("desk", "hunter2").unwrap();
    assert!(ctx.auth_service.login("desk", "hunter2").is_ok());
    assert!(matches!(
        ctx.auth_service.login("desk", "wrong"),
        Err(Error::InvalidCredentials)
    ));

    let stored = ctx.repository.get_user_by_username("desk").unwrap().unwrap();
    assert_ne!(stored.password_digest, "hunter2");
}

#[test]
fn test_context_new_creates_database_and_settings_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("data");

    let ctx = RentalContext::new(&data_dir).unwrap();
    assert!(data_dir.join(&ctx.config.database_file).exists());
    assert!(ctx.car_service.list_cars().unwrap().is_empty());
}

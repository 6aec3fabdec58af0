//! Concurrent booking tests
//!
//! Many threads racing for the same car and interval must produce exactly one
//! rental. Every thread shares one context, the way a desk process would.
//!
//! Run with: cargo test --test concurrent_booking_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

use rust_decimal::Decimal;

use carrental_core::adapters::duckdb::DuckDbRepository;
use carrental_core::adapters::memory::InMemoryRepository;
use carrental_core::config::Config;
use carrental_core::domain::rental::parse_timestamp;
use carrental_core::ports::Repository;
use carrental_core::{Car, Customer, Error, RentalContext};

/// Number of concurrent threads for race tests
const THREAD_COUNT: usize = 8;

fn seed(ctx: &RentalContext) -> (i64, i64) {
    let car = ctx
        .car_service
        .add_car(Car::new("VW", "Golf", 2022, "RACE-1", Decimal::from(15)))
        .unwrap();
    let customer = ctx
        .customer_service
        .add_customer(Customer::new("Race", "Tester", "race@example.com", "555-0123"))
        .unwrap();
    (car.id, customer.id)
}

/// Spawn THREAD_COUNT threads that all try to book the same slot
///
/// Returns (successes, unavailable rejections).
fn race_for_same_slot(ctx: Arc<RentalContext>, car_id: i64, customer_id: i64) -> (usize, usize) {
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let success_count = Arc::new(AtomicUsize::new(0));
    let rejected_count = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            let success_count = Arc::clone(&success_count);
            let rejected_count = Arc::clone(&rejected_count);

            thread::spawn(move || {
                // Stagger the interval slightly so every request still overlaps
                let start = parse_timestamp("2024-05-01 09:00").unwrap()
                    + chrono::Duration::minutes(thread_id as i64);
                let end = parse_timestamp("2024-05-01 12:00").unwrap();

                barrier.wait();

                match ctx
                    .rental_service
                    .create_rental(car_id, customer_id, start, Some(end))
                {
                    Ok(_) => {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(Error::CarUnavailable(_)) => {
                        rejected_count.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => panic!("Thread {}: unexpected error: {}", thread_id, e),
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    (
        success_count.load(Ordering::SeqCst),
        rejected_count.load(Ordering::SeqCst),
    )
}

#[test]
fn test_race_on_duckdb_books_once() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DuckDbRepository::new(&temp_dir.path().join("race.duckdb")).unwrap();
    repo.ensure_schema().unwrap();

    let ctx = Arc::new(RentalContext::with_repository(Config::default(), Arc::new(repo)));
    let (car_id, customer_id) = seed(&ctx);

    let (successes, rejected) = race_for_same_slot(Arc::clone(&ctx), car_id, customer_id);
    println!("duckdb race: {} booked, {} rejected", successes, rejected);

    assert_eq!(successes, 1);
    assert_eq!(rejected, THREAD_COUNT - 1);
    assert_eq!(ctx.repository.list_rentals_for_car(car_id).unwrap().len(), 1);
}

#[test]
fn test_race_in_memory_books_once() {
    let ctx = Arc::new(RentalContext::with_repository(
        Config::default(),
        Arc::new(InMemoryRepository::new()),
    ));
    let (car_id, customer_id) = seed(&ctx);

    let (successes, _) = race_for_same_slot(Arc::clone(&ctx), car_id, customer_id);

    assert_eq!(successes, 1);
    assert_eq!(ctx.rental_service.list_rentals().unwrap().len(), 1);
}

#[test]
fn test_different_cars_do_not_block_each_other() {
    let ctx = Arc::new(RentalContext::with_repository(
        Config::default(),
        Arc::new(InMemoryRepository::new()),
    ));
    let customer = ctx
        .customer_service
        .add_customer(Customer::new("Fleet", "Manager", "fleet@example.com", "555-0124"))
        .unwrap();
    let car_ids: Vec<i64> = (0..THREAD_COUNT)
        .map(|i| {
            ctx.car_service
                .add_car(Car::new("VW", "Polo", 2021, format!("POLO-{}", i), Decimal::from(9)))
                .unwrap()
                .id
        })
        .collect();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let handles: Vec<_> = car_ids
        .iter()
        .map(|&car_id| {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            let customer_id = customer.id;
            thread::spawn(move || {
                barrier.wait();
                ctx.rental_service.create_rental(
                    car_id,
                    customer_id,
                    parse_timestamp("2024-05-01 09:00").unwrap(),
                    Some(parse_timestamp("2024-05-01 10:00").unwrap()),
                )
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("Thread panicked").is_ok());
    }
    assert_eq!(ctx.rental_service.list_rentals().unwrap().len(), THREAD_COUNT);
}

#[test]
fn test_reopen_after_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("reopen.duckdb");

    {
        let repo = DuckDbRepository::new(&db_path).unwrap();
        repo.ensure_schema().unwrap();
    }

    let repo = DuckDbRepository::new(&db_path).unwrap();
    let result = repo.run_migrations().unwrap();
    assert!(result.applied.is_empty());
    assert!(result.already_applied > 0);
}

#[test]
fn test_race_moving_rentals_onto_one_slot() {
    let ctx = Arc::new(RentalContext::with_repository(
        Config::default(),
        Arc::new(InMemoryRepository::new()),
    ));
    let (source_car, customer_id) = seed(&ctx);
    let target_car = ctx
        .car_service
        .add_car(Car::new("VW", "Passat", 2022, "RACE-2", Decimal::from(20)))
        .unwrap()
        .id;

    // One rental per thread on the source car, each on its own day
    let rental_ids: Vec<i64> = (0..THREAD_COUNT)
        .map(|day| {
            let start = parse_timestamp("2024-06-01 09:00").unwrap() + chrono::Duration::days(day as i64);
            ctx.rental_service
                .create_rental(source_car, customer_id, start, Some(start + chrono::Duration::hours(2)))
                .unwrap()
                .rental_id
        })
        .collect();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let handles: Vec<_> = rental_ids
        .iter()
        .map(|&rental_id| {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ctx.rental_service.update_rental(
                    rental_id,
                    target_car,
                    customer_id,
                    parse_timestamp("2024-07-01 09:00").unwrap(),
                    Some(parse_timestamp("2024-07-01 12:00").unwrap()),
                )
            })
        })
        .collect();

    let mut moved = 0;
    for handle in handles {
        match handle.join().expect("Thread panicked") {
            Ok(receipt) => {
                assert_eq!(receipt.total_cost, Decimal::from(60));
                moved += 1;
            }
            Err(Error::CarUnavailable(id)) => assert_eq!(id, target_car),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(moved, 1);
    assert_eq!(ctx.rental_service.list_rentals_for_car(target_car).unwrap().len(), 1);
    assert_eq!(
        ctx.rental_service.list_rentals_for_car(source_car).unwrap().len(),
        THREAD_COUNT - 1
    );
}

#[test]
fn test_delete_car_racing_a_booking_leaves_no_orphan() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DuckDbRepository::new(&temp_dir.path().join("orphans.duckdb")).unwrap();
    repo.ensure_schema().unwrap();
    let ctx = Arc::new(RentalContext::with_repository(Config::default(), Arc::new(repo)));
    let customer_id = ctx
        .customer_service
        .add_customer(Customer::new("Race", "Tester", "race@example.com", "555-0123"))
        .unwrap()
        .id;

    for round in 0..20 {
        let car_id = ctx
            .car_service
            .add_car(Car::new("VW", "Up", 2020, format!("DEL-{}", round), Decimal::from(7)))
            .unwrap()
            .id;
        let barrier = Arc::new(Barrier::new(2));

        let booking = {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ctx.rental_service.create_rental(
                    car_id,
                    customer_id,
                    parse_timestamp("2024-08-01 09:00").unwrap(),
                    Some(parse_timestamp("2024-08-01 10:00").unwrap()),
                )
            })
        };
        let deletion = {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ctx.car_service.delete_car(car_id)
            })
        };

        let booked = booking.join().expect("Thread panicked");
        let deleted = deletion.join().expect("Thread panicked");

        match (booked, deleted) {
            (Ok(_), Err(Error::Validation(_))) => {
                assert!(ctx.car_service.get_car(car_id).is_ok());
            }
            (Err(Error::CarNotFound(id)), Ok(())) => {
                assert_eq!(id, car_id);
                assert!(ctx.rental_service.list_rentals_for_car(car_id).unwrap().is_empty());
            }
            (booked, deleted) => panic!(
                "round {}: inconsistent outcome {:?} / {:?}",
                round, booked, deleted
            ),
        }
    }
}

#[test]
fn test_delete_customer_racing_a_booking_leaves_no_orphan() {
    let ctx = Arc::new(RentalContext::with_repository(
        Config::default(),
        Arc::new(InMemoryRepository::new()),
    ));
    let car_id = ctx
        .car_service
        .add_car(Car::new("VW", "Golf", 2022, "RACE-1", Decimal::from(15)))
        .unwrap()
        .id;

    for round in 0..20 {
        let customer_id = ctx
            .customer_service
            .add_customer(Customer::new("Walk", "In", format!("walkin{}@example.com", round), "555-0199"))
            .unwrap()
            .id;
        let start = parse_timestamp("2024-09-01 09:00").unwrap() + chrono::Duration::days(round);
        let barrier = Arc::new(Barrier::new(2));

        let booking = {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ctx.rental_service
                    .create_rental(car_id, customer_id, start, Some(start + chrono::Duration::hours(1)))
            })
        };
        let deletion = {
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ctx.customer_service.delete_customer(customer_id)
            })
        };

        let booked = booking.join().expect("Thread panicked");
        let deleted = deletion.join().expect("Thread panicked");

        match (booked, deleted) {
            (Ok(_), Err(Error::Validation(_))) => {
                assert!(ctx.customer_service.get_customer(customer_id).is_ok());
            }
            (Err(Error::NotFound(_)), Ok(())) => {
                assert!(ctx
                    .rental_service
                    .list_rentals_for_customer(customer_id)
                    .unwrap()
                    .is_empty());
            }
            (booked, deleted) => panic!(
                "round {}: inconsistent outcome {:?} / {:?}",
                round, booked, deleted
            ),
        }
    }
}

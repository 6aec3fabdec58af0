//! Rental service - booking, re-booking and pricing of rentals
//!
//! Every write goes through the same sequence: validate the interval, make
//! sure the customer exists, then, holding the target car's booking lock,
//! check availability, price the rental from the car's rate and persist.
//! Holding the lock across check and write keeps two overlapping requests
//! for one car from both passing the availability check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::availability::{self, AvailabilityPolicy};
use crate::domain::billing;
use crate::domain::result::{Error, Result};
use crate::domain::{Car, Rental, RentalInterval};
use crate::ports::Repository;

/// Mutexes keyed by record id, created on demand
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    fn get(&self, key: i64) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        // Entries only the table still holds are idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(Arc::clone(locks.entry(key).or_default()))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

/// Per-car and per-customer mutexes serializing check-then-write sequences
///
/// Shared by every service that guards a write on the state of rentals.
/// When both are needed, the customer lock is taken before the car lock.
#[derive(Debug, Default)]
pub struct BookingLocks {
    cars: KeyedLocks,
    customers: KeyedLocks,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_car(&self, car_id: i64) -> Result<Arc<Mutex<()>>> {
        self.cars.get(car_id)
    }

    pub fn for_customer(&self, customer_id: i64) -> Result<Arc<Mutex<()>>> {
        self.customers.get(customer_id)
    }
}

/// Acquire a lock handed out by [`BookingLocks`]
pub(crate) fn hold(lock: &Mutex<()>) -> Result<MutexGuard<'_, ()>> {
    lock.lock()
        .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
}

/// Outcome of a successful create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RentalReceipt {
    pub rental_id: i64,
    pub total_cost: Decimal,
}

/// Price and availability preview for a prospective rental
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub car_id: i64,
    pub available: bool,
    pub billable_hours: i64,
    pub hourly_rate: Decimal,
    pub total_cost: Decimal,
    /// Ids of the rentals blocking the interval, empty when available
    pub conflicting_rental_ids: Vec<i64>,
}

/// Rental record manager
pub struct RentalService {
    repository: Arc<dyn Repository>,
    policy: AvailabilityPolicy,
    locks: Arc<BookingLocks>,
}

impl RentalService {
    pub fn new(repository: Arc<dyn Repository>, policy: AvailabilityPolicy) -> Self {
        Self::with_locks(repository, policy, Arc::new(BookingLocks::new()))
    }

    /// Create a service sharing `locks` with the car and customer services
    pub fn with_locks(
        repository: Arc<dyn Repository>,
        policy: AvailabilityPolicy,
        locks: Arc<BookingLocks>,
    ) -> Self {
        Self {
            repository,
            policy,
            locks,
        }
    }

    pub fn policy(&self) -> AvailabilityPolicy {
        self.policy
    }

    /// Whether no existing rental of `car_id` overlaps `[start, end)`
    ///
    /// A missing `end` asks for an open-ended rental. The car is not looked
    /// up; an unknown id simply has no rentals.
    pub fn is_available(
        &self,
        car_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<bool> {
        let requested = RentalInterval { start, end };
        Ok(self.conflicts(car_id, &requested, None)?.is_empty())
    }

    /// Cost of renting at `hourly_rate` over the interval
    ///
    /// Incomplete or inverted intervals cost zero.
    pub fn calculate_cost(
        hourly_rate: Decimal,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Decimal {
        billing::calculate_cost(hourly_rate, start, end)
    }

    /// Preview availability and price without booking
    pub fn quote(
        &self,
        car_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<Quote> {
        let car = self.require_car(car_id)?;
        let requested = RentalInterval { start, end };
        let conflicting_rental_ids = self.conflicts(car_id, &requested, None)?;

        Ok(Quote {
            car_id,
            available: conflicting_rental_ids.is_empty(),
            billable_hours: billing::billable_hours(Some(start), end),
            hourly_rate: car.hourly_rate,
            total_cost: billing::calculate_cost(car.hourly_rate, Some(start), end),
            conflicting_rental_ids,
        })
    }

    /// Book a car for a customer
    ///
    /// # Errors
    /// - `InvalidInterval` if `end` precedes `start`
    /// - `NotFound` if the customer does not exist
    /// - `CarUnavailable` if another rental of the car overlaps
    /// - `CarNotFound` if the car does not exist
    /// - `Storage` on store failure
    pub fn create_rental(
        &self,
        car_id: i64,
        customer_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<RentalReceipt> {
        let interval = RentalInterval::new(start, end)?;

        let customer_lock = self.locks.for_customer(customer_id)?;
        let _customer_guard = hold(&customer_lock)?;
        self.require_customer(customer_id)?;

        let car_lock = self.locks.for_car(car_id)?;
        let _car_guard = hold(&car_lock)?;

        self.ensure_available(car_id, &interval, None)?;
        let car = self.require_car(car_id)?;

        let mut rental = Rental::new(car_id, customer_id, start, end);
        rental.total_cost = price(&car, start, end)?;
        let rental_id = self.repository.insert_rental(&rental)?;

        Ok(RentalReceipt {
            rental_id,
            total_cost: rental.total_cost,
        })
    }

    /// Replace car, customer and interval of an existing rental
    ///
    /// The rental's own current interval never blocks the edit. Same errors
    /// as [`create_rental`](Self::create_rental), plus `NotFound` for an
    /// unknown rental id.
    pub fn update_rental(
        &self,
        rental_id: i64,
        car_id: i64,
        customer_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Result<RentalReceipt> {
        let interval = RentalInterval::new(start, end)?;
        self.get_rental(rental_id)?;

        let customer_lock = self.locks.for_customer(customer_id)?;
        let _customer_guard = hold(&customer_lock)?;
        self.require_customer(customer_id)?;

        let car_lock = self.locks.for_car(car_id)?;
        let _car_guard = hold(&car_lock)?;

        self.ensure_available(car_id, &interval, Some(rental_id))?;
        let car = self.require_car(car_id)?;

        let rental = Rental {
            id: rental_id,
            car_id,
            customer_id,
            start,
            end,
            total_cost: price(&car, start, end)?,
        };
        if !self.repository.update_rental(&rental)? {
            // Deleted between the lookup and the write
            return Err(Error::not_found(format!("Rental {}", rental_id)));
        }

        Ok(RentalReceipt {
            rental_id,
            total_cost: rental.total_cost,
        })
    }

    /// Record the return of an active rental at `end`
    pub fn close_rental(&self, rental_id: i64, end: NaiveDateTime) -> Result<RentalReceipt> {
        let rental = self.get_rental(rental_id)?;
        if !rental.is_active() {
            return Err(Error::validation(format!(
                "Rental {} is already closed",
                rental_id
            )));
        }
        self.update_rental(
            rental_id,
            rental.car_id,
            rental.customer_id,
            rental.start,
            Some(end),
        )
    }

    /// Remove a rental by id. Returns whether anything was removed.
    pub fn delete_rental(&self, rental_id: i64) -> Result<bool> {
        self.repository.delete_rental(rental_id)
    }

    pub fn get_rental(&self, rental_id: i64) -> Result<Rental> {
        self.repository
            .get_rental(rental_id)?
            .ok_or_else(|| Error::not_found(format!("Rental {}", rental_id)))
    }

    pub fn list_rentals(&self) -> Result<Vec<Rental>> {
        self.repository.list_rentals()
    }

    pub fn list_rentals_for_car(&self, car_id: i64) -> Result<Vec<Rental>> {
        self.repository.list_rentals_for_car(car_id)
    }

    pub fn list_rentals_for_customer(&self, customer_id: i64) -> Result<Vec<Rental>> {
        self.repository.list_rentals_for_customer(customer_id)
    }

    fn conflicts(
        &self,
        car_id: i64,
        requested: &RentalInterval,
        exclude: Option<i64>,
    ) -> Result<Vec<i64>> {
        let rentals = self.repository.list_rentals_for_car(car_id)?;
        Ok(
            availability::find_conflicts(&rentals, car_id, requested, exclude, self.policy)
                .into_iter()
                .map(|r| r.id)
                .collect(),
        )
    }

    fn ensure_available(
        &self,
        car_id: i64,
        requested: &RentalInterval,
        exclude: Option<i64>,
    ) -> Result<()> {
        if self.conflicts(car_id, requested, exclude)?.is_empty() {
            Ok(())
        } else {
            Err(Error::CarUnavailable(car_id))
        }
    }

    fn require_car(&self, car_id: i64) -> Result<Car> {
        self.repository
            .get_car(car_id)?
            .ok_or(Error::CarNotFound(car_id))
    }

    fn require_customer(&self, customer_id: i64) -> Result<()> {
        match self.repository.get_customer(customer_id)? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("Customer {}", customer_id))),
        }
    }
}

/// Price a rental of `car`, refusing totals the store cannot hold
fn price(car: &Car, start: NaiveDateTime, end: Option<NaiveDateTime>) -> Result<Decimal> {
    let total = billing::calculate_cost(car.hourly_rate, Some(start), end);
    if total > billing::max_amount() {
        return Err(Error::validation(format!(
            "Rental cost {} exceeds the maximum of {}",
            total,
            billing::max_amount()
        )));
    }
    Ok(total)
}

//! In-memory repository implementation
//!
//! Holds everything in ordered maps behind one mutex. Used by tests and by
//! callers that want a throwaway store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Car, Customer, Rental, User};
use crate::ports::{RecordCounts, Repository};

#[derive(Debug, Default)]
struct MemoryState {
    cars: BTreeMap<i64, Car>,
    customers: BTreeMap<i64, Customer>,
    rentals: BTreeMap<i64, Rental>,
    users: BTreeMap<i64, User>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Repository backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }
}

fn sorted_by_start(mut rentals: Vec<Rental>) -> Vec<Rental> {
    rentals.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
    rentals
}

impl Repository for InMemoryRepository {
    fn insert_car(&self, car: &Car) -> Result<i64> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.cars.insert(id, Car { id, ..car.clone() });
        Ok(id)
    }

    fn get_car(&self, id: i64) -> Result<Option<Car>> {
        Ok(self.state()?.cars.get(&id).cloned())
    }

    fn list_cars(&self) -> Result<Vec<Car>> {
        Ok(self.state()?.cars.values().cloned().collect())
    }

    fn update_car(&self, car: &Car) -> Result<bool> {
        let mut state = self.state()?;
        match state.cars.get_mut(&car.id) {
            Some(existing) => {
                *existing = car.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_car(&self, id: i64) -> Result<bool> {
        Ok(self.state()?.cars.remove(&id).is_some())
    }

    fn insert_customer(&self, customer: &Customer) -> Result<i64> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.customers.insert(id, Customer { id, ..customer.clone() });
        Ok(id)
    }

    fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.state()?.customers.get(&id).cloned())
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.state()?.customers.values().cloned().collect())
    }

    fn update_customer(&self, customer: &Customer) -> Result<bool> {
        let mut state = self.state()?;
        match state.customers.get_mut(&customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_customer(&self, id: i64) -> Result<bool> {
        Ok(self.state()?.customers.remove(&id).is_some())
    }

    fn insert_rental(&self, rental: &Rental) -> Result<i64> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.rentals.insert(id, Rental { id, ..rental.clone() });
        Ok(id)
    }

    fn get_rental(&self, id: i64) -> Result<Option<Rental>> {
        Ok(self.state()?.rentals.get(&id).cloned())
    }

    fn list_rentals(&self) -> Result<Vec<Rental>> {
        Ok(self.state()?.rentals.values().cloned().collect())
    }

    fn list_rentals_for_car(&self, car_id: i64) -> Result<Vec<Rental>> {
        let rentals = self
            .state()?
            .rentals
            .values()
            .filter(|r| r.car_id == car_id)
            .cloned()
            .collect();
        Ok(sorted_by_start(rentals))
    }

    fn list_rentals_for_customer(&self, customer_id: i64) -> Result<Vec<Rental>> {
        let rentals = self
            .state()?
            .rentals
            .values()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(sorted_by_start(rentals))
    }

    fn update_rental(&self, rental: &Rental) -> Result<bool> {
        let mut state = self.state()?;
        match state.rentals.get_mut(&rental.id) {
            Some(existing) => {
                *existing = rental.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_rental(&self, id: i64) -> Result<bool> {
        Ok(self.state()?.rentals.remove(&id).is_some())
    }

    fn insert_user(&self, user: &User) -> Result<i64> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.users.insert(id, User { id, ..user.clone() });
        Ok(id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn record_counts(&self) -> Result<RecordCounts> {
        let state = self.state()?;
        let active_rentals = state.rentals.values().filter(|r| r.is_active()).count() as i64;
        Ok(RecordCounts {
            cars: state.cars.len() as i64,
            customers: state.customers.len() as i64,
            active_rentals,
            closed_rentals: state.rentals.len() as i64 - active_rentals,
            total_revenue: state.rentals.values().map(|r| r.total_cost).sum::<Decimal>(),
        })
    }
}

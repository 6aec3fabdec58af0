//! Customer service - customer records

use std::sync::Arc;

use super::rental::{hold, BookingLocks};
use crate::domain::result::{Error, Result};
use crate::domain::Customer;
use crate::ports::Repository;

pub struct CustomerService {
    repository: Arc<dyn Repository>,
    locks: Arc<BookingLocks>,
}

impl CustomerService {
    /// `locks` must be the table the rental service books under
    pub fn new(repository: Arc<dyn Repository>, locks: Arc<BookingLocks>) -> Self {
        Self { repository, locks }
    }

    pub fn add_customer(&self, mut customer: Customer) -> Result<Customer> {
        customer.normalize();
        customer.validate()?;

        customer.id = self.repository.insert_customer(&customer)?;
        Ok(customer)
    }

    pub fn get_customer(&self, id: i64) -> Result<Customer> {
        self.repository
            .get_customer(id)?
            .ok_or_else(|| Error::not_found(format!("Customer {}", id)))
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        self.repository.list_customers()
    }

    pub fn update_customer(&self, mut customer: Customer) -> Result<Customer> {
        customer.normalize();
        customer.validate()?;

        if !self.repository.update_customer(&customer)? {
            return Err(Error::not_found(format!("Customer {}", customer.id)));
        }
        Ok(customer)
    }

    /// Remove a customer with no rentals on record
    pub fn delete_customer(&self, id: i64) -> Result<()> {
        let customer_lock = self.locks.for_customer(id)?;
        let _guard = hold(&customer_lock)?;

        let referencing = self.repository.list_rentals_for_customer(id)?.len();
        if referencing > 0 {
            return Err(Error::validation(format!(
                "Customer {} is referenced by {} rental(s)",
                id, referencing
            )));
        }
        if !self.repository.delete_customer(id)? {
            return Err(Error::not_found(format!("Customer {}", id)));
        }
        Ok(())
    }
}

//! Repository port - storage abstraction

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{Car, Customer, Rental, User};

/// Storage abstraction for every record kind
///
/// The store owns persisted identity: `insert_*` ignores the `id` on the
/// value passed in and returns the id it assigned. `update_*` and `delete_*`
/// return whether a row matched.
pub trait Repository: Send + Sync {
    // === Cars ===

    /// Insert a car, returning its assigned id
    fn insert_car(&self, car: &Car) -> Result<i64>;

    fn get_car(&self, id: i64) -> Result<Option<Car>>;

    /// All cars ordered by id
    fn list_cars(&self) -> Result<Vec<Car>>;

    fn update_car(&self, car: &Car) -> Result<bool>;

    fn delete_car(&self, id: i64) -> Result<bool>;

    // === Customers ===

    /// Insert a customer, returning its assigned id
    fn insert_customer(&self, customer: &Customer) -> Result<i64>;

    fn get_customer(&self, id: i64) -> Result<Option<Customer>>;

    /// All customers ordered by id
    fn list_customers(&self) -> Result<Vec<Customer>>;

    fn update_customer(&self, customer: &Customer) -> Result<bool>;

    fn delete_customer(&self, id: i64) -> Result<bool>;

    // === Rentals ===

    /// Insert a rental, returning its assigned id
    fn insert_rental(&self, rental: &Rental) -> Result<i64>;

    fn get_rental(&self, id: i64) -> Result<Option<Rental>>;

    /// All rentals ordered by id
    fn list_rentals(&self) -> Result<Vec<Rental>>;

    /// Rentals of one car, active and closed, ordered by start
    fn list_rentals_for_car(&self, car_id: i64) -> Result<Vec<Rental>>;

    /// Rentals of one customer ordered by start
    fn list_rentals_for_customer(&self, customer_id: i64) -> Result<Vec<Rental>>;

    fn update_rental(&self, rental: &Rental) -> Result<bool>;

    fn delete_rental(&self, id: i64) -> Result<bool>;

    // === Users ===

    /// Insert a user, returning its assigned id
    fn insert_user(&self, user: &User) -> Result<i64>;

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // === Summary ===

    fn record_counts(&self) -> Result<RecordCounts>;
}

/// Aggregate counts across the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub cars: i64,
    pub customers: i64,
    pub active_rentals: i64,
    pub closed_rentals: i64,
    /// Sum of `total_cost` over all rentals
    pub total_revenue: Decimal,
}

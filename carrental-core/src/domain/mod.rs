//! Core domain entities
//!
//! All business entities and the pure scheduling/billing rules live here.
//! No I/O or storage dependencies.

pub mod availability;
pub mod billing;
mod car;
mod customer;
pub mod rental;
mod user;
pub mod result;

pub use availability::AvailabilityPolicy;
pub use car::Car;
pub use customer::Customer;
pub use rental::{Rental, RentalInterval, RentalStatus};
pub use user::User;

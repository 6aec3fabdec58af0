//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
mod car;
mod customer;
pub mod logging;
pub mod migration;
pub mod rental;
mod status;

pub use auth::AuthService;
pub use car::CarService;
pub use customer::CustomerService;
pub use logging::{EntryPoint, EventCount, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use rental::{BookingLocks, Quote, RentalReceipt, RentalService};
pub use status::{StatusService, StatusSummary};

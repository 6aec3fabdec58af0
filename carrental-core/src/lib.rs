//! Car Rental Core - scheduling, billing and records for a car rental desk
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Car, Customer, Rental, User) and the
//!   pure availability and billing rules
//! - **ports**: Trait definitions for external dependencies (Repository)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::Repository;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{AvailabilityPolicy, Car, Customer, Rental, RentalInterval, RentalStatus, User};
pub use domain::result::{Error, OperationResult};

/// Main context for car rental operations
///
/// This is the primary entry point for all business logic. It holds
/// the store, configuration, and all services.
pub struct RentalContext {
    pub config: Config,
    pub repository: Arc<dyn Repository>,
    pub car_service: CarService,
    pub customer_service: CustomerService,
    pub rental_service: RentalService,
    pub auth_service: AuthService,
    pub status_service: StatusService,
}

impl RentalContext {
    /// Open the rental database in `data_dir`, migrating it if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(&config.database_file);
        let repository = DuckDbRepository::new(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        repository.ensure_schema()?;

        Ok(Self::with_repository(config, Arc::new(repository)))
    }

    /// Wire services around an already prepared store
    pub fn with_repository(config: Config, repository: Arc<dyn Repository>) -> Self {
        let locks = Arc::new(BookingLocks::new());
        Self {
            car_service: CarService::new(Arc::clone(&repository), Arc::clone(&locks)),
            customer_service: CustomerService::new(Arc::clone(&repository), Arc::clone(&locks)),
            rental_service: RentalService::with_locks(
                Arc::clone(&repository),
                config.availability_policy,
                locks,
            ),
            auth_service: AuthService::new(Arc::clone(&repository)),
            status_service: StatusService::new(Arc::clone(&repository)),
            config,
            repository,
        }
    }
}

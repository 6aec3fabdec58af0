//! Status service - fleet and rental summaries

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::Repository;

/// Status service for fleet summaries
pub struct StatusService {
    repository: Arc<dyn Repository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub fn get_status(&self) -> Result<StatusSummary> {
        let counts = self.repository.record_counts()?;

        Ok(StatusSummary {
            total_cars: counts.cars,
            total_customers: counts.customers,
            active_rentals: counts.active_rentals,
            closed_rentals: counts.closed_rentals,
            total_revenue: counts.total_revenue,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total_cars: i64,
    pub total_customers: i64,
    pub active_rentals: i64,
    pub closed_rentals: i64,
    pub total_revenue: Decimal,
}

//! Car domain model

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::billing::{max_amount, MONEY_SCALE};
use super::result::{Error, Result};

/// First year a production car could plausibly be registered
const EARLIEST_MODEL_YEAR: i32 = 1886;

/// A car in the rental fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Assigned by the store; 0 until persisted
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub hourly_rate: Decimal,
    /// Informational flag edited by staff. Booking decisions are made from
    /// rental intervals, not from this field.
    pub available: bool,
}

impl Car {
    /// Create an unsaved car, available by default
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        license_plate: impl Into<String>,
        hourly_rate: Decimal,
    ) -> Self {
        Self {
            id: 0,
            make: make.into(),
            model: model.into(),
            year,
            license_plate: license_plate.into(),
            hourly_rate,
            available: true,
        }
    }

    /// "Make Model (Year)"
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.year)
    }

    /// Trim text fields and normalize the plate to uppercase
    pub fn normalize(&mut self) {
        self.make = self.make.trim().to_string();
        self.model = self.model.trim().to_string();
        self.license_plate = self.license_plate.trim().to_uppercase();
    }

    pub fn validate(&self) -> Result<()> {
        if self.make.trim().is_empty() {
            return Err(Error::validation("Make is required"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::validation("Model is required"));
        }
        if self.license_plate.trim().is_empty() {
            return Err(Error::validation("License plate is required"));
        }

        let latest_year = Utc::now().year() + 1;
        if self.year < EARLIEST_MODEL_YEAR || self.year > latest_year {
            return Err(Error::validation(format!(
                "Year must be between {} and {}",
                EARLIEST_MODEL_YEAR, latest_year
            )));
        }

        if self.hourly_rate < Decimal::ZERO {
            return Err(Error::validation("Hourly rate cannot be negative"));
        }
        if self.hourly_rate > max_amount() {
            return Err(Error::validation(format!(
                "Hourly rate cannot exceed {}",
                max_amount()
            )));
        }
        if self.hourly_rate.round_dp(MONEY_SCALE) != self.hourly_rate {
            return Err(Error::validation(format!(
                "Hourly rate {} has more than {} decimal places",
                self.hourly_rate, MONEY_SCALE
            )));
        }

        Ok(())
    }
}

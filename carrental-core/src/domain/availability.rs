//! Availability checking
//!
//! A car is available for a requested interval when no other rental of the
//! same car overlaps it. The car's own `available` flag is informational and
//! never consulted here.

use serde::{Deserialize, Serialize};

use super::rental::{Rental, RentalInterval};

/// Which existing rentals take part in the conflict scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityPolicy {
    /// Closed rentals block their interval; active rentals block everything
    /// from their start onward.
    #[default]
    ActiveBlocks,
    /// Only closed rentals are scanned. Active rentals never block.
    ConfirmedOnly,
}

impl AvailabilityPolicy {
    fn considers(&self, rental: &Rental) -> bool {
        match self {
            AvailabilityPolicy::ActiveBlocks => true,
            AvailabilityPolicy::ConfirmedOnly => !rental.is_active(),
        }
    }
}

/// Rentals of `car_id` that overlap `requested`
///
/// `exclude` drops one rental from the scan, so an edit is never blocked by
/// the interval it is replacing.
pub fn find_conflicts<'a>(
    rentals: &'a [Rental],
    car_id: i64,
    requested: &RentalInterval,
    exclude: Option<i64>,
    policy: AvailabilityPolicy,
) -> Vec<&'a Rental> {
    rentals
        .iter()
        .filter(|r| r.car_id == car_id)
        .filter(|r| exclude != Some(r.id))
        .filter(|r| policy.considers(r))
        .filter(|r| r.interval().overlaps(requested))
        .collect()
}

/// True when no rental of `car_id` overlaps `requested`
pub fn is_available(
    rentals: &[Rental],
    car_id: i64,
    requested: &RentalInterval,
    exclude: Option<i64>,
    policy: AvailabilityPolicy,
) -> bool {
    find_conflicts(rentals, car_id, requested, exclude, policy).is_empty()
}

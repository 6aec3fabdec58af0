//! Car service - fleet records

use std::sync::Arc;

use super::rental::{hold, BookingLocks};
use crate::domain::result::{Error, Result};
use crate::domain::Car;
use crate::ports::Repository;

pub struct CarService {
    repository: Arc<dyn Repository>,
    locks: Arc<BookingLocks>,
}

impl CarService {
    /// `locks` must be the table the rental service books under
    pub fn new(repository: Arc<dyn Repository>, locks: Arc<BookingLocks>) -> Self {
        Self { repository, locks }
    }

    /// Validate and store a new car. Returns it with its assigned id.
    pub fn add_car(&self, mut car: Car) -> Result<Car> {
        car.normalize();
        car.validate()?;
        self.ensure_plate_free(&car.license_plate, None)?;

        car.id = self.repository.insert_car(&car)?;
        Ok(car)
    }

    pub fn get_car(&self, id: i64) -> Result<Car> {
        self.repository
            .get_car(id)?
            .ok_or_else(|| Error::not_found(format!("Car {}", id)))
    }

    pub fn list_cars(&self) -> Result<Vec<Car>> {
        self.repository.list_cars()
    }

    /// Replace every field of an existing car
    ///
    /// Rentals already priced keep their cost; a new rate applies to
    /// bookings made or edited afterwards.
    pub fn update_car(&self, mut car: Car) -> Result<Car> {
        car.normalize();
        car.validate()?;
        self.ensure_plate_free(&car.license_plate, Some(car.id))?;

        if !self.repository.update_car(&car)? {
            return Err(Error::not_found(format!("Car {}", car.id)));
        }
        Ok(car)
    }

    /// Remove a car that no rental references
    ///
    /// Runs under the car's booking lock, so no rental can be booked on it
    /// between the reference check and the delete.
    pub fn delete_car(&self, id: i64) -> Result<()> {
        let car_lock = self.locks.for_car(id)?;
        let _guard = hold(&car_lock)?;

        let referencing = self.repository.list_rentals_for_car(id)?.len();
        if referencing > 0 {
            return Err(Error::validation(format!(
                "Car {} is referenced by {} rental(s)",
                id, referencing
            )));
        }
        if !self.repository.delete_car(id)? {
            return Err(Error::not_found(format!("Car {}", id)));
        }
        Ok(())
    }

    fn ensure_plate_free(&self, plate: &str, own_id: Option<i64>) -> Result<()> {
        let taken = self
            .repository
            .list_cars()?
            .iter()
            .any(|c| c.license_plate == plate && Some(c.id) != own_id);
        if taken {
            return Err(Error::validation(format!(
                "License plate {} is already registered",
                plate
            )));
        }
        Ok(())
    }
}

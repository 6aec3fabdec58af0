//! Car command - manage the fleet

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;

use super::{confirm, get_context};
use crate::output::{create_table, format_money, print_json, success};
use carrental_core::Car;

#[derive(Subcommand)]
pub enum CarCommands {
    /// Add a car to the fleet
    Add {
        make: String,
        model: String,
        year: i32,
        /// License plate (stored uppercase)
        plate: String,
        /// Hourly rate
        #[arg(long)]
        rate: Decimal,
        /// Register the car as unavailable
        #[arg(long)]
        unavailable: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all cars
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one car and its rentals
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a car; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        plate: Option<String>,
        #[arg(long)]
        rate: Option<Decimal>,
        /// Set the informational availability flag
        #[arg(long)]
        available: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a car with no rentals
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl CarCommands {
    pub fn name(&self) -> &'static str {
        match self {
            CarCommands::Add { .. } => "car add",
            CarCommands::List { .. } => "car list",
            CarCommands::Show { .. } => "car show",
            CarCommands::Update { .. } => "car update",
            CarCommands::Delete { .. } => "car delete",
        }
    }
}

fn availability_label(car: &Car) -> String {
    if car.available {
        "yes".green().to_string()
    } else {
        "no".yellow().to_string()
    }
}

pub fn run(command: CarCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        CarCommands::Add {
            make,
            model,
            year,
            plate,
            rate,
            unavailable,
            json,
        } => {
            let mut car = Car::new(make, model, year, plate, rate);
            car.available = !unavailable;
            let car = ctx.car_service.add_car(car)?;

            if json {
                return print_json(&car);
            }
            success(&format!("Added car {}: {}", car.id, car.display_name()));
        }
        CarCommands::List { json } => {
            let cars = ctx.car_service.list_cars()?;

            if json {
                return print_json(&cars);
            }
            if cars.is_empty() {
                println!("No cars found.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["ID", "Make", "Model", "Year", "Plate", "Rate/h", "Available"]);
            for car in &cars {
                table.add_row(vec![
                    car.id.to_string(),
                    car.make.clone(),
                    car.model.clone(),
                    car.year.to_string(),
                    car.license_plate.clone(),
                    format_money(car.hourly_rate),
                    availability_label(car),
                ]);
            }
            println!("{}", table);
        }
        CarCommands::Show { id, json } => {
            let car = ctx.car_service.get_car(id)?;
            let rentals = ctx.rental_service.list_rentals_for_car(id)?;

            if json {
                return print_json(&serde_json::json!({ "car": car, "rentals": rentals }));
            }

            println!("{}", car.display_name().bold());
            println!("  Plate: {}", car.license_plate);
            println!("  Rate: {}/h", format_money(car.hourly_rate));
            println!("  Available: {}", availability_label(&car));
            println!("  Rentals: {}", rentals.len());
        }
        CarCommands::Update {
            id,
            make,
            model,
            year,
            plate,
            rate,
            available,
            json,
        } => {
            let mut car = ctx.car_service.get_car(id)?;
            if let Some(make) = make {
                car.make = make;
            }
            if let Some(model) = model {
                car.model = model;
            }
            if let Some(year) = year {
                car.year = year;
            }
            if let Some(plate) = plate {
                car.license_plate = plate;
            }
            if let Some(rate) = rate {
                car.hourly_rate = rate;
            }
            if let Some(available) = available {
                car.available = available;
            }
            let car = ctx.car_service.update_car(car)?;

            if json {
                return print_json(&car);
            }
            success(&format!("Updated car {}", car.id));
        }
        CarCommands::Delete { id, force, json } => {
            if !confirm(&format!("Delete car {}?", id), force, json)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.car_service.delete_car(id)?;

            if json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            success(&format!("Deleted car {}", id));
        }
    }

    Ok(())
}

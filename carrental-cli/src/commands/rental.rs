//! Rental command - book, edit, price and return rentals

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::Subcommand;
use colored::Colorize;

use super::{confirm, get_context, parse_datetime};
use crate::output::{create_table, format_money, info, print_json, success, warning};
use carrental_core::domain::rental::{format_timestamp, truncate_to_seconds};
use carrental_core::{Rental, RentalStatus};

#[derive(Subcommand)]
pub enum RentalCommands {
    /// Book a car for a customer
    Add {
        #[arg(long)]
        car: i64,
        #[arg(long)]
        customer: i64,
        /// Rental start, e.g. "2024-01-01 10:00"
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        /// Return time; omit for an open rental
        #[arg(long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List rentals
    List {
        /// Only rentals of this car
        #[arg(long)]
        car: Option<i64>,
        /// Only rentals of this customer
        #[arg(long)]
        customer: Option<i64>,
        /// Only rentals still out
        #[arg(long)]
        active: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one rental
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace car, customer or interval of a rental; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        car: Option<i64>,
        #[arg(long)]
        customer: Option<i64>,
        #[arg(long, value_parser = parse_datetime)]
        start: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_datetime, conflicts_with = "open")]
        end: Option<NaiveDateTime>,
        /// Clear the return time
        #[arg(long)]
        open: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record the return of an open rental
    Close {
        id: i64,
        /// Return time; defaults to now
        #[arg(long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a rental
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Preview availability and price without booking
    Quote {
        #[arg(long)]
        car: i64,
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check whether a car is free for an interval
    Check {
        #[arg(long)]
        car: i64,
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        #[arg(long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl RentalCommands {
    pub fn name(&self) -> &'static str {
        match self {
            RentalCommands::Add { .. } => "rental add",
            RentalCommands::List { .. } => "rental list",
            RentalCommands::Show { .. } => "rental show",
            RentalCommands::Update { .. } => "rental update",
            RentalCommands::Close { .. } => "rental close",
            RentalCommands::Delete { .. } => "rental delete",
            RentalCommands::Quote { .. } => "rental quote",
            RentalCommands::Check { .. } => "rental check",
        }
    }
}

fn format_end(end: &Option<NaiveDateTime>) -> String {
    end.as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string())
}

fn status_label(rental: &Rental) -> String {
    match rental.status() {
        RentalStatus::Active => rental.status().to_string().yellow().to_string(),
        RentalStatus::Closed => rental.status().to_string(),
    }
}

pub fn run(command: RentalCommands) -> Result<()> {
    let ctx = get_context()?;
    let rentals = &ctx.rental_service;

    match command {
        RentalCommands::Add {
            car,
            customer,
            start,
            end,
            json,
        } => {
            let receipt = rentals.create_rental(car, customer, start, end)?;

            if json {
                return print_json(&receipt);
            }
            success(&format!(
                "Booked rental {} (cost {})",
                receipt.rental_id,
                format_money(receipt.total_cost)
            ));
            if end.is_none() {
                info("Open rental: cost is computed when it is closed.");
            }
        }
        RentalCommands::List {
            car,
            customer,
            active,
            json,
        } => {
            let mut list = match car {
                Some(car_id) => rentals.list_rentals_for_car(car_id)?,
                None => rentals.list_rentals()?,
            };
            if let Some(customer_id) = customer {
                list.retain(|r| r.customer_id == customer_id);
            }
            if active {
                list.retain(|r| r.is_active());
            }

            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No rentals found.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["ID", "Car", "Customer", "Start", "End", "Cost", "Status"]);
            for rental in &list {
                table.add_row(vec![
                    rental.id.to_string(),
                    rental.car_id.to_string(),
                    rental.customer_id.to_string(),
                    format_timestamp(&rental.start),
                    format_end(&rental.end),
                    format_money(rental.total_cost),
                    status_label(rental),
                ]);
            }
            println!("{}", table);
        }
        RentalCommands::Show { id, json } => {
            let rental = rentals.get_rental(id)?;

            if json {
                return print_json(&rental);
            }

            println!("{}", format!("Rental {}", rental.id).bold());
            println!("  Car: {}", rental.car_id);
            println!("  Customer: {}", rental.customer_id);
            println!("  Start: {}", format_timestamp(&rental.start));
            println!("  End: {}", format_end(&rental.end));
            println!("  Cost: {}", format_money(rental.total_cost));
            println!("  Status: {}", status_label(&rental));
        }
        RentalCommands::Update {
            id,
            car,
            customer,
            start,
            end,
            open,
            json,
        } => {
            let current = rentals.get_rental(id)?;
            let end = if open { None } else { end.or(current.end) };
            let receipt = rentals.update_rental(
                id,
                car.unwrap_or(current.car_id),
                customer.unwrap_or(current.customer_id),
                start.unwrap_or(current.start),
                end,
            )?;

            if json {
                return print_json(&receipt);
            }
            success(&format!(
                "Updated rental {} (cost {})",
                receipt.rental_id,
                format_money(receipt.total_cost)
            ));
        }
        RentalCommands::Close { id, end, json } => {
            let end = end.unwrap_or_else(|| truncate_to_seconds(Local::now().naive_local()));
            let receipt = rentals.close_rental(id, end)?;

            if json {
                return print_json(&receipt);
            }
            success(&format!(
                "Closed rental {} at {} (cost {})",
                receipt.rental_id,
                format_timestamp(&end),
                format_money(receipt.total_cost)
            ));
        }
        RentalCommands::Delete { id, force, json } => {
            if !confirm(&format!("Delete rental {}?", id), force, json)? {
                println!("Cancelled.");
                return Ok(());
            }
            let deleted = rentals.delete_rental(id)?;

            if json {
                return print_json(&serde_json::json!({ "id": id, "deleted": deleted }));
            }
            if deleted {
                success(&format!("Deleted rental {}", id));
            } else {
                warning(&format!("No rental with id {}", id));
            }
        }
        RentalCommands::Quote {
            car,
            start,
            end,
            json,
        } => {
            let quote = rentals.quote(car, start, end)?;

            if json {
                return print_json(&quote);
            }

            if quote.available {
                success(&format!("Car {} is available", quote.car_id));
            } else {
                warning(&format!(
                    "Car {} is booked (conflicts with rental {})",
                    quote.car_id,
                    quote
                        .conflicting_rental_ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            println!(
                "  {} h x {} = {}",
                quote.billable_hours,
                format_money(quote.hourly_rate),
                format_money(quote.total_cost).bold()
            );
        }
        RentalCommands::Check {
            car,
            start,
            end,
            json,
        } => {
            let available = rentals.is_available(car, start, end)?;

            if json {
                return print_json(&serde_json::json!({ "car_id": car, "available": available }));
            }
            if available {
                success(&format!("Car {} is available", car));
            } else {
                warning(&format!("Car {} is not available for that period", car));
            }
        }
    }

    Ok(())
}

//! Status command - fleet and rental summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output::{create_table, format_money, print_json};

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        return print_json(&status);
    }

    println!("{}", "Car Rental Status".bold());
    println!();

    let mut table = create_table();
    table.add_row(vec!["Cars", &status.total_cars.to_string()]);
    table.add_row(vec!["Customers", &status.total_customers.to_string()]);
    table.add_row(vec!["Active rentals", &status.active_rentals.to_string()]);
    table.add_row(vec!["Closed rentals", &status.closed_rentals.to_string()]);
    table.add_row(vec!["Revenue", &format_money(status.total_revenue)]);

    println!("{}", table);
    Ok(())
}

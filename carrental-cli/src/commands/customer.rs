//! Customer command - manage customer records

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{confirm, get_context};
use crate::output::{create_table, format_money, print_json, success};
use carrental_core::Customer;

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a customer
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all customers
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one customer and their rentals
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a customer; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a customer with no rentals
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

impl CustomerCommands {
    pub fn name(&self) -> &'static str {
        match self {
            CustomerCommands::Add { .. } => "customer add",
            CustomerCommands::List { .. } => "customer list",
            CustomerCommands::Show { .. } => "customer show",
            CustomerCommands::Update { .. } => "customer update",
            CustomerCommands::Delete { .. } => "customer delete",
        }
    }
}

pub fn run(command: CustomerCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        CustomerCommands::Add {
            first_name,
            last_name,
            email,
            phone,
            json,
        } => {
            let customer = ctx
                .customer_service
                .add_customer(Customer::new(first_name, last_name, email, phone))?;

            if json {
                return print_json(&customer);
            }
            success(&format!("Added customer {}: {}", customer.id, customer.full_name()));
        }
        CustomerCommands::List { json } => {
            let customers = ctx.customer_service.list_customers()?;

            if json {
                return print_json(&customers);
            }
            if customers.is_empty() {
                println!("No customers found.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["ID", "Name", "Email", "Phone"]);
            for customer in &customers {
                table.add_row(vec![
                    customer.id.to_string(),
                    customer.full_name(),
                    customer.email.clone(),
                    customer.phone.clone(),
                ]);
            }
            println!("{}", table);
        }
        CustomerCommands::Show { id, json } => {
            let customer = ctx.customer_service.get_customer(id)?;
            let rentals = ctx.rental_service.list_rentals_for_customer(id)?;

            if json {
                return print_json(&serde_json::json!({ "customer": customer, "rentals": rentals }));
            }

            println!("{}", customer.full_name().bold());
            println!("  Email: {}", customer.email);
            println!("  Phone: {}", customer.phone);
            let spent = rentals.iter().map(|r| r.total_cost).sum();
            println!("  Rentals: {} (total {})", rentals.len(), format_money(spent));
        }
        CustomerCommands::Update {
            id,
            first_name,
            last_name,
            email,
            phone,
            json,
        } => {
            let mut customer = ctx.customer_service.get_customer(id)?;
            if let Some(first_name) = first_name {
                customer.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                customer.last_name = last_name;
            }
            if let Some(email) = email {
                customer.email = email;
            }
            if let Some(phone) = phone {
                customer.phone = phone;
            }
            let customer = ctx.customer_service.update_customer(customer)?;

            if json {
                return print_json(&customer);
            }
            success(&format!("Updated customer {}", customer.id));
        }
        CustomerCommands::Delete { id, force, json } => {
            if !confirm(&format!("Delete customer {}?", id), force, json)? {
                println!("Cancelled.");
                return Ok(());
            }
            ctx.customer_service.delete_customer(id)?;

            if json {
                return print_json(&serde_json::json!({ "deleted": id }));
            }
            success(&format!("Deleted customer {}", id));
        }
    }

    Ok(())
}

//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::rental::{format_timestamp, parse_timestamp};
use crate::domain::result::{Error, Result};
use crate::domain::{Car, Customer, Rental, User};
use crate::ports::{RecordCounts, Repository};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const CAR_COLUMNS: &str =
    "car_id, make, model, year, license_plate, CAST(hourly_rate AS VARCHAR), available";

const CUSTOMER_COLUMNS: &str = "customer_id, first_name, last_name, email, phone_number";

const RENTAL_COLUMNS: &str = "rental_id, car_id, customer_id, CAST(rental_datetime AS VARCHAR), \
     CAST(return_datetime AS VARCHAR), CAST(total_cost AS VARCHAR)";

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    ///
    /// Retries with exponential backoff while another process holds the
    /// file lock, e.g. a second CLI invocation finishing its write.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[carrental] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> anyhow::Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading stays off: nothing here needs one, and cached
        // extensions in ~/.duckdb can fail code-signing checks on macOS.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Path of the backing file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self.conn()?;
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    fn next_id(conn: &Connection, sequence: &str) -> Result<i64> {
        let id = conn.query_row(&format!("SELECT nextval('{}')", sequence), [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(id)
    }

    fn query_rentals(&self, sql: &str, param: Option<i64>) -> Result<Vec<Rental>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = match param {
            Some(value) => stmt
                .query_map([value], RentalRow::read)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], RentalRow::read)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };
        rows.into_iter().map(RentalRow::into_rental).collect()
    }
}

// Money and timestamps are read back as text and parsed on our side, so the
// adapter does not depend on duckdb-rs DECIMAL/TIMESTAMP conversions.

struct CarRow {
    id: i64,
    make: String,
    model: String,
    year: i32,
    license_plate: String,
    hourly_rate: String,
    available: bool,
}

impl CarRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            make: row.get(1)?,
            model: row.get(2)?,
            year: row.get(3)?,
            license_plate: row.get(4)?,
            hourly_rate: row.get(5)?,
            available: row.get(6)?,
        })
    }

    fn into_car(self) -> Result<Car> {
        Ok(Car {
            id: self.id,
            make: self.make,
            model: self.model,
            year: self.year,
            license_plate: self.license_plate,
            hourly_rate: parse_money(&self.hourly_rate)?,
            available: self.available,
        })
    }
}

struct RentalRow {
    id: i64,
    car_id: i64,
    customer_id: i64,
    start: String,
    end: Option<String>,
    total_cost: String,
}

impl RentalRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            car_id: row.get(1)?,
            customer_id: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            total_cost: row.get(5)?,
        })
    }

    fn into_rental(self) -> Result<Rental> {
        Ok(Rental {
            id: self.id,
            car_id: self.car_id,
            customer_id: self.customer_id,
            start: parse_stored_timestamp(&self.start)?,
            end: self.end.as_deref().map(parse_stored_timestamp).transpose()?,
            total_cost: parse_money(&self.total_cost)?,
        })
    }
}

fn read_customer(row: &duckdb::Row) -> duckdb::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

fn parse_money(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim())
        .map_err(|e| Error::storage(format!("Invalid stored amount '{}': {}", s, e)))
}

fn parse_stored_timestamp(s: &str) -> Result<chrono::NaiveDateTime> {
    parse_timestamp(s).map_err(|_| Error::storage(format!("Invalid stored timestamp '{}'", s)))
}

impl Repository for DuckDbRepository {
    // === Cars ===

    fn insert_car(&self, car: &Car) -> Result<i64> {
        let conn = self.conn()?;
        let id = Self::next_id(&conn, "seq_car_id")?;
        conn.execute(
            "INSERT INTO cars (car_id, make, model, year, license_plate, hourly_rate, available)
             VALUES (?, ?, ?, ?, ?, CAST(? AS DECIMAL(12, 2)), ?)",
            params![
                id,
                car.make,
                car.model,
                car.year,
                car.license_plate,
                car.hourly_rate.to_string(),
                car.available,
            ],
        )?;
        Ok(id)
    }

    fn get_car(&self, id: i64) -> Result<Option<Car>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM cars WHERE car_id = ?", CAR_COLUMNS))?;
        let mut rows = stmt
            .query_map([id], CarRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.pop().map(CarRow::into_car).transpose()
    }

    fn list_cars(&self) -> Result<Vec<Car>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM cars ORDER BY car_id", CAR_COLUMNS))?;
        let rows = stmt
            .query_map([], CarRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CarRow::into_car).collect()
    }

    fn update_car(&self, car: &Car) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE cars SET make = ?, model = ?, year = ?, license_plate = ?,
                    hourly_rate = CAST(? AS DECIMAL(12, 2)), available = ?
             WHERE car_id = ?",
            params![
                car.make,
                car.model,
                car.year,
                car.license_plate,
                car.hourly_rate.to_string(),
                car.available,
                car.id,
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_car(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM cars WHERE car_id = ?", params![id])?;
        Ok(deleted > 0)
    }

    // === Customers ===

    fn insert_customer(&self, customer: &Customer) -> Result<i64> {
        let conn = self.conn()?;
        let id = Self::next_id(&conn, "seq_customer_id")?;
        conn.execute(
            "INSERT INTO customers (customer_id, first_name, last_name, email, phone_number)
             VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.phone,
            ],
        )?;
        Ok(id)
    }

    fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM customers WHERE customer_id = ?",
            CUSTOMER_COLUMNS
        ))?;
        let mut rows = stmt
            .query_map([id], read_customer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.pop())
    }

    fn list_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM customers ORDER BY customer_id",
            CUSTOMER_COLUMNS
        ))?;
        let customers = stmt
            .query_map([], read_customer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(customers)
    }

    fn update_customer(&self, customer: &Customer) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE customers SET first_name = ?, last_name = ?, email = ?, phone_number = ?
             WHERE customer_id = ?",
            params![
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.phone,
                customer.id,
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_customer(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM customers WHERE customer_id = ?", params![id])?;
        Ok(deleted > 0)
    }

    // === Rentals ===

    fn insert_rental(&self, rental: &Rental) -> Result<i64> {
        let conn = self.conn()?;
        let id = Self::next_id(&conn, "seq_rental_id")?;
        conn.execute(
            "INSERT INTO rentals (rental_id, car_id, customer_id, rental_datetime, return_datetime, total_cost)
             VALUES (?, ?, ?, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP), CAST(? AS DECIMAL(12, 2)))",
            params![
                id,
                rental.car_id,
                rental.customer_id,
                format_timestamp(&rental.start),
                rental.end.as_ref().map(format_timestamp),
                rental.total_cost.to_string(),
            ],
        )?;
        Ok(id)
    }

    fn get_rental(&self, id: i64) -> Result<Option<Rental>> {
        let mut rentals = self.query_rentals(
            &format!("SELECT {} FROM rentals WHERE rental_id = ?", RENTAL_COLUMNS),
            Some(id),
        )?;
        Ok(rentals.pop())
    }

    fn list_rentals(&self) -> Result<Vec<Rental>> {
        self.query_rentals(
            &format!("SELECT {} FROM rentals ORDER BY rental_id", RENTAL_COLUMNS),
            None,
        )
    }

    fn list_rentals_for_car(&self, car_id: i64) -> Result<Vec<Rental>> {
        self.query_rentals(
            &format!(
                "SELECT {} FROM rentals WHERE car_id = ? ORDER BY rental_datetime, rental_id",
                RENTAL_COLUMNS
            ),
            Some(car_id),
        )
    }

    fn list_rentals_for_customer(&self, customer_id: i64) -> Result<Vec<Rental>> {
        self.query_rentals(
            &format!(
                "SELECT {} FROM rentals WHERE customer_id = ? ORDER BY rental_datetime, rental_id",
                RENTAL_COLUMNS
            ),
            Some(customer_id),
        )
    }

    fn update_rental(&self, rental: &Rental) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE rentals SET car_id = ?, customer_id = ?,
                    rental_datetime = CAST(? AS TIMESTAMP),
                    return_datetime = CAST(? AS TIMESTAMP),
                    total_cost = CAST(? AS DECIMAL(12, 2))
             WHERE rental_id = ?",
            params![
                rental.car_id,
                rental.customer_id,
                format_timestamp(&rental.start),
                rental.end.as_ref().map(format_timestamp),
                rental.total_cost.to_string(),
                rental.id,
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_rental(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM rentals WHERE rental_id = ?", params![id])?;
        Ok(deleted > 0)
    }

    // === Users ===

    fn insert_user(&self, user: &User) -> Result<i64> {
        let conn = self.conn()?;
        let id = Self::next_id(&conn, "seq_user_id")?;
        conn.execute(
            "INSERT INTO users (user_id, username, password_digest) VALUES (?, ?, ?)",
            params![id, user.username, user.password_digest],
        )?;
        Ok(id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT user_id, username, password_digest FROM users WHERE username = ?")?;
        let mut users = stmt
            .query_map([username], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_digest: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users.pop())
    }

    // === Summary ===

    fn record_counts(&self) -> Result<RecordCounts> {
        let conn = self.conn()?;
        let cars: i64 = conn.query_row("SELECT COUNT(*) FROM cars", [], |row| row.get(0))?;
        let customers: i64 = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        let (active_rentals, closed_rentals, revenue): (i64, i64, String) = conn.query_row(
            "SELECT COUNT(*) FILTER (WHERE return_datetime IS NULL),
                    COUNT(*) FILTER (WHERE return_datetime IS NOT NULL),
                    CAST(COALESCE(SUM(total_cost), 0) AS VARCHAR)
             FROM rentals",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(RecordCounts {
            cars,
            customers,
            active_rentals,
            closed_rentals,
            total_revenue: parse_money(&revenue)?,
        })
    }
}

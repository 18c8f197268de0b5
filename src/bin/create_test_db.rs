use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use expense_tracker_rs::{
    NewExpense, NewUser, PasswordHash, ValidatedPassword, create_expense_within_budget,
    create_user, get_budget_status, initialize_db,
};

/// A utility for creating a test database for the REST API server of expense_tracker_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demopassword";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let now = OffsetDateTime::now_utc();
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        NewUser {
            first_name: "Demo".to_owned(),
            last_name: "User".to_owned(),
            email: DEMO_EMAIL.to_owned(),
            password_hash,
            budget_limit: 1500.0,
        },
        now,
        &conn,
    )?;

    println!("Creating test expenses...");

    let today = now.date();
    for (title, price, days_ago) in [
        ("Groceries", 84.2, 0),
        ("Coffee", 4.5, 1),
        ("Bus pass", 60.0, 2),
        ("Dinner out", 72.9, 3),
        ("Electricity", 135.0, 5),
    ] {
        create_expense_within_budget(
            user.id,
            NewExpense {
                title: title.to_owned(),
                price,
                date: days_before_in_month(today, days_ago),
            },
            now,
            &conn,
        )?;
    }

    let status = get_budget_status(user.id, today, &conn)?;
    println!(
        "Spent {} of {} this month across {} expenses.",
        status.current_month_spent, status.budget_limit, status.total_expenses
    );
    println!("Success! Log in with {DEMO_EMAIL} and the password \"{DEMO_PASSWORD}\".");

    Ok(())
}

/// Go back `days` from `date` without leaving its month.
fn days_before_in_month(date: Date, days: i64) -> Date {
    let days = days.min(i64::from(date.day()) - 1);

    date - Duration::days(days)
}

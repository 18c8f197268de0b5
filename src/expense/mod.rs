//! Expenses: creating, reading, updating, deleting and listing them, and
//! keeping each month's total within the owner's budget.

mod budget;
mod budget_status_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod get_endpoint;
mod list_endpoint;
mod query;
mod state;

pub use budget::{BudgetStatus, create_expense_within_budget, get_budget_status};
pub use budget_status_endpoint::budget_status_endpoint;
pub use core::{Expense, NewExpense, create_expense_table};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::{patch_expense_endpoint, replace_expense_endpoint};
pub use get_endpoint::get_expense_endpoint;
pub use list_endpoint::list_expenses_endpoint;
pub use state::ExpenseState;

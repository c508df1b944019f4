pub mod diagnostics;
pub mod health;
pub mod help_requests;
pub mod users;

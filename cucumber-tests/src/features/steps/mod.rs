pub mod decorator_steps;
pub mod schema_steps;
pub mod upgrade_steps;

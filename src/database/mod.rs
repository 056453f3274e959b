//! # Database Layer
//!
//! Compiled statements and the executor seam between the core and the
//! query-execution service.
//!
//! The core never talks to a driver directly: builders compile to
//! [`SelectStatement`]/[`InsertStatement`]/[`UpdateStatement`]/
//! [`DeleteStatement`] values, and a [`QueryExecutor`] runs them. The bundled
//! [`Database`] executor targets PostgreSQL through sqlx; test suites plug in
//! an in-memory executor instead.

pub mod connection;
pub mod executor;
pub mod statement;

pub use connection::{Database, TransactionExecutor};
pub use executor::QueryExecutor;
pub use statement::{DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement};

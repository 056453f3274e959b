#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Armature Core
//!
//! Rust core for the active-record conventions a web application leans on
//! repeatedly: transparent visibility scoping, relation resolution, dynamic
//! finders, and request-scoped pagination.
//!
//! ## Overview
//!
//! Armature Core augments a generic data-mapping layer with the query-side
//! behavior that is otherwise re-implemented per application: soft-deleted
//! and unpublished rows disappear from every read unless a builder opts out,
//! relations (including polymorphic and through-table ones) resolve to
//! predicate/join pairs and materialize lazily, convention-named methods
//! such as `find_all_by_status_and_city` or `where_title_contains` compile
//! to predicates without hand-written builder calls, and pagination state is
//! computed once per request and frozen.
//!
//! ## Key Features
//!
//! - **Visibility scoping**: soft-delete and publish-window predicates
//!   injected ahead of user predicates on every read, toggleable per builder
//! - **Relation resolution**: belongs-to, has-one, has-many, has-many-through,
//!   and polymorphic relations resolved through an immutable model registry
//! - **Dynamic finders**: an explicit, fixed-order grammar table — unmatched
//!   names are an error, never a silent no-op
//! - **Pagination**: pure page-bounds calculation, memoized per builder,
//!   with a serializable snapshot for view layers
//! - **Count caches**: `<children>_count` parent columns recomputed under
//!   default visibility after every qualifying write
//!
//! ## Module Organization
//!
//! - [`models`] - Records, model registry, relations, persistence
//! - [`query_builder`] - Predicates, scopes, pagination, dynamic dispatch
//! - [`database`] - Compiled statements and the executor seam
//! - [`config`] - Library defaults
//! - [`error`] - Structured error handling
//! - [`validation`] - Validation-service seam
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_core::models::{ModelDef, ModelRegistry};
//! use armature_core::query_builder::TimestampFormat;
//! use armature_core::database::Database;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ModelRegistry::builder()
//!     .model(
//!         ModelDef::new("article", "articles")
//!             .columns(["id", "author_id", "title", "status", "deleted_at"])
//!             .soft_delete("deleted_at", TimestampFormat::Epoch)
//!             .belongs_to("author", "author", "author_id"),
//!     )
//!     .model(ModelDef::new("author", "authors").columns(["id", "name"]))
//!     .build()?;
//!
//! let db = Database::connect().await?;
//! let articles = registry
//!     .query("article")?
//!     .where_eq("status", json!("active"))
//!     .find_all(&db)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod query_builder;
pub mod validation;

pub use config::ArmatureConfig;
pub use database::{
    Database, DeleteStatement, InsertStatement, QueryExecutor, Row, SelectStatement,
    TransactionExecutor, UpdateStatement,
};
pub use error::{FieldErrors, OrmError, Result};
pub use models::{
    resolve, ModelDef, ModelRegistry, Record, RelationDescriptor, RelationGraph, Resolution,
};
pub use query_builder::{
    Dispatched, Join, JoinType, LogicalOperator, Operator, PageSnapshot, Paginator, Predicate,
    PredicateSet, QueryBuilder, ScopeConfig, ScopeState, TimestampColumn, TimestampFormat,
};
pub use validation::ValidationService;

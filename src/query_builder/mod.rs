//! # Query Builder System
//!
//! Visibility-scoped query building with dynamic finder dispatch.
//!
//! ## Key Components
//!
//! - [`conditions`] - Ordered predicate sets with AND/OR joins
//! - [`joins`] - JOIN clause management
//! - [`scopes`] - Soft-delete and publish-window visibility state
//! - [`pagination`] - Page-bounds calculation and the rendering snapshot
//! - [`dynamic`] - The `find_all_by_*` / `where_*_contains` grammar
//! - [`builder`] - The chainable builder tying the above together
//!
//! ## Scope Injection
//!
//! Every read (`find`, `find_all`, `count_all`) compiles scope predicates
//! ahead of user predicates unless the builder's visibility toggles disable
//! them. User predicate order is insertion order, respecting declared
//! AND/OR joins.
//!
//! ## Example
//!
//! ```rust,ignore
//! let articles = registry
//!     .query("article")?
//!     .where_eq("status", json!("active"))
//!     .order_desc("articles.id")
//!     .find_all(&executor)
//!     .await?;
//! ```

pub mod builder;
pub mod conditions;
pub mod dynamic;
pub mod joins;
pub mod pagination;
pub mod scopes;

pub use builder::QueryBuilder;
pub use conditions::{LogicalOperator, Operator, Predicate, PredicateSet};
pub use dynamic::{ConditionToken, Dispatched, DynamicCall, FinderAction, WhereVerb};
pub use joins::{Join, JoinType};
pub use pagination::{PageSnapshot, Paginator, DEFAULT_COUNT_PER_PAGE, DEFAULT_PAGE_PARAM};
pub use scopes::{
    DeletedVisibility, PublishedVisibility, ScopeConfig, ScopeState, TimestampColumn,
    TimestampFormat,
};

//! # Model Layer
//!
//! Records, static model declarations, and relation machinery.
//!
//! A [`ModelRegistry`] is built once from [`ModelDef`] declarations and read
//! thereafter. [`Record`] carries one row's columns, change tracking, and
//! identity; the resolver turns declared relations into predicate/join pairs
//! against other models, and the persistence impl keeps dependent count
//! caches in sync on every qualifying write.

pub mod counter_cache;
pub mod persistence;
pub mod record;
pub mod registry;
pub mod relations;
pub mod resolver;

pub use record::{Record, RelatedQuery};
pub use registry::{ModelDef, ModelRegistry, ModelRegistryBuilder};
pub use relations::{RelationDescriptor, RelationGraph};
pub use resolver::{resolve, Resolution};

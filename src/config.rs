//! Library defaults for pagination and scan protection, overridable from the
//! environment (`ARMATURE_DEFAULT_PER_PAGE`, `ARMATURE_PAGE_PARAM`,
//! `ARMATURE_ROW_CAP`).

use serde::Deserialize;

use crate::error::{OrmError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArmatureConfig {
    /// Page size used when a builder paginates without an explicit size
    pub default_per_page: u64,
    /// Request-parameter name carried into pagination snapshots
    pub page_param: String,
    /// Row limit applied to unpaginated `find_all` calls with no explicit
    /// limit
    pub row_cap: u64,
}

impl Default for ArmatureConfig {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            page_param: "page".to_string(),
            row_cap: 1000,
        }
    }
}

impl ArmatureConfig {
    /// Load configuration from `ARMATURE_`-prefixed environment variables,
    /// falling back to the defaults for anything unset
    pub fn from_env() -> Result<Self> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("ARMATURE").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|err| OrmError::Configuration(err.to_string()))
    }
}

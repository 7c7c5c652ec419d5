//! Matching discipline of a generated policy set.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Exact literal matching or colon-delimited glob matching.
///
/// The lowercase name doubles as the CLI value, the data-store key under
/// `store.ory`, and the Rego package suffix (`ory.exact`, `ory.glob`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Flavor {
    #[default]
    Exact,
    Glob,
}

impl Flavor {
    /// Rego package name of the flavor's policy module.
    pub fn package(&self) -> String {
        format!("ory.{self}")
    }

    /// Fully-qualified path of a rule in the flavor's package.
    pub fn rule_path(&self, rule: &str) -> String {
        format!("data.{}.{rule}", self.package())
    }
}

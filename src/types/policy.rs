//! Access control policy records and the store that holds them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::BenchError;
use crate::types::Flavor;

/// Effect of an access control policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// An access control policy (ACP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Unique within one store; the generator uses decimal indices.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub resources: Vec<String>,
    pub actions: Vec<String>,
    pub effect: Effect,
    /// Named conditions. Carried through to the store but never evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Map<String, Value>>,
}

/// A role grants its members every subject pattern that matches its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub members: Vec<String>,
}

impl Role {
    pub fn new(id: impl Into<String>, members: &[&str]) -> Self {
        Role {
            id: id.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// The policies and roles of one benchmark run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcpStore {
    pub policies: Vec<AccessPolicy>,
    pub roles: Vec<Role>,
}

impl AcpStore {
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Build the data document the policy modules read, with this store at
    /// `store.ory.<flavor>`.
    pub fn to_document(&self, flavor: Flavor) -> Result<Value, BenchError> {
        let mut ory = Map::new();
        ory.insert(flavor.to_string(), serde_json::to_value(self)?);

        let mut store = Map::new();
        store.insert("ory".to_string(), Value::Object(ory));

        let mut root = Map::new();
        root.insert("store".to_string(), Value::Object(store));
        Ok(Value::Object(root))
    }
}

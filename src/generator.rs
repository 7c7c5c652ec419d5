//! Synthetic ACP corpus generation.
//!
//! Every policy grants `check` on eight resources to one subject. The index
//! is baked into the label segment of each resource (`thing0`, `foo0`, ...),
//! so no two policies share a resource pattern. Glob policies replace the
//! tenant, user and resource-id segments with `*` and keep the label
//! segment literal.

use tracing::debug;

use crate::types::{AccessPolicy, AcpStore, Effect, Flavor};

pub const RESOURCE_LABELS: [&str; 8] = ["thing", "foo", "bar", "baz", "boo", "bam", "bag", "bad"];

pub const EXACT_SUBJECT: &str = "tenant:acmecorp:user:user.name@domain.com";
pub const GLOB_SUBJECT: &str = "tenant:*:user:*";
pub const ACTION: &str = "check";

const TENANT: &str = "acmecorp";
const RESOURCE_ID: &str = "resource-1111-2222-3333-4444";
const WILDCARD: &str = "*";

/// Generate `amount` policies of the given flavor, with no roles.
pub fn generate(flavor: Flavor, amount: usize) -> AcpStore {
    let policies = (0..amount).map(|idx| policy(flavor, idx)).collect();
    debug!(event = "Generate", flavor = %flavor, amount);
    AcpStore {
        policies,
        roles: Vec::new(),
    }
}

fn policy(flavor: Flavor, idx: usize) -> AccessPolicy {
    let (subject, tenant, resource_id) = match flavor {
        Flavor::Exact => (EXACT_SUBJECT, TENANT, RESOURCE_ID),
        Flavor::Glob => (GLOB_SUBJECT, WILDCARD, WILDCARD),
    };

    AccessPolicy {
        id: idx.to_string(),
        description: None,
        subjects: vec![subject.to_string()],
        resources: RESOURCE_LABELS
            .iter()
            .map(|label| format!("tenant:{tenant}:{label}{idx}:{resource_id}"))
            .collect(),
        actions: vec![ACTION.to_string()],
        effect: Effect::Allow,
        conditions: None,
    }
}

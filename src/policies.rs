//! Embedded Rego modules and the fixed parameters of each flavor.
//!
//! Both modules decide `allow` as "some matching policy allows and no
//! matching policy denies". They differ only in how a pattern is compared
//! with a request value: equality for `exact`, and for `glob` a per-segment
//! `glob.match` after splitting both sides on `:`, so `*` never spans a
//! segment boundary.

use crate::generator::{ACTION, EXACT_SUBJECT};
use crate::types::{Decision, Flavor, RequestInput};

pub const EXACT_POLICY: &str = r#"package ory.exact

import rego.v1

import data.store.ory.exact as store

default allow := false

allow if {
	any_allow
	not any_deny
}

any_allow if {
	some matched in effect_matches
	matched[1] == "allow"
}

any_deny if {
	some matched in effect_matches
	matched[1] == "deny"
}

effect_matches contains [acp_id, policy.effect] if {
	some acp_id, policy in store.policies
	action_matches[acp_id]
	subject_matches[acp_id]
	resource_matches[acp_id]
	condition_matches[acp_id]
}

action_matches contains acp_id if {
	some acp_id, policy in store.policies
	some action in policy.actions
	action == input.action
}

resource_matches contains acp_id if {
	some acp_id, policy in store.policies
	some resource in policy.resources
	resource == input.resource
}

subject_matches contains acp_id if {
	some acp_id, policy in store.policies
	some subject in policy.subjects
	subject == input.subject
}

subject_matches contains acp_id if {
	some role in store.roles
	some member in role.members
	member == input.subject
	some acp_id, policy in store.policies
	some subject in policy.subjects
	subject == role.id
}

condition_matches contains acp_id if {
	some acp_id, _ in store.policies
	not any_conditions_fail[acp_id]
}

any_conditions_fail contains acp_id if {
	some acp_id, policy in store.policies
	some _, condition in policy.conditions
	condition != null
	false
}
"#;

/// Colon-segmented glob match: both sides must have the same number of
/// segments and every pattern segment must match its value segment.
macro_rules! glob_matchfn {
    () => {
        r#"matchfn(pattern, value) if {
	pattern_segments := split(pattern, ":")
	value_segments := split(value, ":")
	count(pattern_segments) == count(value_segments)
	every i, segment in pattern_segments {
		glob.match(segment, null, value_segments[i])
	}
}
"#
    };
}

pub const GLOB_MATCHFN: &str = glob_matchfn!();

pub const EXACT_MATCHFN: &str = r#"matchfn(pattern, value) if {
	pattern == value
}
"#;

pub const GLOB_POLICY: &str = concat!(
    r#"package ory.glob

import rego.v1

import data.store.ory.glob as store

default allow := false

allow if {
	any_allow
	not any_deny
}

any_allow if {
	some matched in effect_matches
	matched[1] == "allow"
}

any_deny if {
	some matched in effect_matches
	matched[1] == "deny"
}

effect_matches contains [acp_id, policy.effect] if {
	some acp_id, policy in store.policies
	action_matches[acp_id]
	subject_matches[acp_id]
	resource_matches[acp_id]
	condition_matches[acp_id]
}

action_matches contains acp_id if {
	some acp_id, policy in store.policies
	some action in policy.actions
	matchfn(action, input.action)
}

resource_matches contains acp_id if {
	some acp_id, policy in store.policies
	some resource in policy.resources
	matchfn(resource, input.resource)
}

subject_matches contains acp_id if {
	some acp_id, policy in store.policies
	some subject in policy.subjects
	matchfn(subject, input.subject)
}

subject_matches contains acp_id if {
	some role in store.roles
	some member in role.members
	member == input.subject
	some acp_id, policy in store.policies
	some subject in policy.subjects
	matchfn(subject, role.id)
}

condition_matches contains acp_id if {
	some acp_id, _ in store.policies
	not any_conditions_fail[acp_id]
}

any_conditions_fail contains acp_id if {
	some acp_id, policy in store.policies
	some _, condition in policy.conditions
	condition != null
	false
}

"#,
    glob_matchfn!()
);

/// The embedded module of `flavor`.
pub fn module(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Exact => EXACT_POLICY,
        Flavor::Glob => GLOB_POLICY,
    }
}

/// How `flavor` compares a pattern with a value.
pub fn matchfn(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Exact => EXACT_MATCHFN,
        Flavor::Glob => GLOB_MATCHFN,
    }
}

/// Fixed query, module and sample of one flavor.
#[derive(Debug, Clone, PartialEq)]
pub struct FlavorProfile {
    pub flavor: Flavor,
    pub module_name: &'static str,
    pub policy: &'static str,
    pub query: String,
    pub disable_inlining: Vec<String>,
    pub sample: RequestInput,
    pub expected: Decision,
}

impl FlavorProfile {
    pub fn for_flavor(flavor: Flavor) -> Self {
        let sample_resource = match flavor {
            Flavor::Exact => "tenant:acmecorp:thing0:resource-dead-beef-feed-face",
            Flavor::Glob => "tenant:acmecorp:thing-deadbeef:resource-dead-beef-feed-face",
        };

        FlavorProfile {
            flavor,
            module_name: "test.rego",
            policy: module(flavor),
            query: flavor.rule_path("allow"),
            disable_inlining: vec![flavor.rule_path("any_allow"), flavor.rule_path("any_deny")],
            sample: RequestInput::new(EXACT_SUBJECT, ACTION, sample_resource),
            expected: Decision::Deny,
        }
    }
}

//! Partial evaluation of the ACP modules against a fixed store.
//!
//! `regorus` has no partial-evaluation API, so the store is folded into a
//! residual program here. Every (policy, subject, resource, action)
//! combination becomes one residual row. Rows made only of literals go into
//! a nested `subject -> resource -> action` index, so a request resolves
//! with three keyed lookups instead of a scan over the store. Rows that
//! still need a glob match at request time are bucketed by the literal
//! segments of their resource pattern and only the bucket selected by the
//! request resource is matched.
//!
//! The residual module keeps the package and the `allow` rule of the
//! original module, so the prepared query path is unchanged. Its rows live
//! in a data document under `data.residual.ory.<flavor>`.
//!
//! `any_allow` is inlined into `allow` unless it is listed in the inlining
//! exclusions. `any_deny` is negated by `allow` and always stays a residual
//! rule. The condition predicate never fails and folds away.

use std::collections::BTreeMap;

use itertools::iproduct;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::engine::PrepareParams;
use crate::error::BenchError;
use crate::policies;
use crate::types::{AccessPolicy, AcpStore, Effect, Flavor};

/// Characters that make a glob segment more than a literal.
const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}', '<', '>', '(', ')', '$', ',', '!', '\\'];

/// The specialized program produced by [`specialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Residual {
    pub module: String,
    /// Data document holding the residual rows, loaded next to the module.
    pub document: Value,
    /// Rows emitted for predicates kept out of inlining.
    pub support_rules: usize,
    /// Rows folded directly into `allow`.
    pub inlined_rules: usize,
    /// Rows that still need a glob match at request time.
    pub pattern_rows: usize,
}

/// How a request subject can satisfy a policy subject pattern.
#[derive(Clone, Copy)]
enum SubjectTerm<'a> {
    Direct(&'a str),
    /// Through a role: the role id must match the pattern, the request
    /// subject must be a member.
    Role {
        pattern: &'a str,
        role_id: &'a str,
        member: &'a str,
    },
}

/// A row matched at request time.
#[derive(Debug, Serialize)]
struct PatternRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    member: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<[&'a str; 2]>,
    resource: &'a str,
    action: &'a str,
}

/// Residual rows of one effect.
#[derive(Default)]
struct Table<'a> {
    index: BTreeMap<&'a str, BTreeMap<&'a str, BTreeMap<&'a str, bool>>>,
    /// Keyed by which resource segments are literal, then by those segments.
    buckets: BTreeMap<Vec<bool>, BTreeMap<String, Vec<PatternRow<'a>>>>,
    rows: usize,
    pattern_rows: usize,
}

impl<'a> Table<'a> {
    fn insert(&mut self, flavor: Flavor, subject: SubjectTerm<'a>, resource: &'a str, action: &'a str) {
        let literal = |s: &str| flavor == Flavor::Exact || !s.contains(GLOB_META);

        let row = match subject {
            SubjectTerm::Direct(pattern) => PatternRow {
                subject: Some(pattern),
                member: None,
                role: None,
                resource,
                action,
            },
            SubjectTerm::Role {
                pattern,
                role_id,
                member,
            } => {
                let role = if literal(pattern) {
                    if pattern != role_id {
                        return;
                    }
                    None
                } else {
                    Some([pattern, role_id])
                };
                PatternRow {
                    subject: None,
                    member: Some(member),
                    role,
                    resource,
                    action,
                }
            }
        };
        self.rows += 1;

        let indexed_subject = match (row.subject, row.member, row.role) {
            (Some(pattern), _, _) if literal(pattern) => Some(pattern),
            (None, Some(member), None) => Some(member),
            _ => None,
        };
        if let Some(subject) = indexed_subject.filter(|_| literal(resource) && literal(action)) {
            self.index
                .entry(subject)
                .or_default()
                .entry(resource)
                .or_default()
                .insert(action, true);
            return;
        }

        let segments: Vec<&str> = resource.split(':').collect();
        let mask: Vec<bool> = segments.iter().map(|s| literal(*s)).collect();
        let key = segments
            .iter()
            .zip(&mask)
            .filter_map(|(segment, is_literal)| is_literal.then_some(*segment))
            .collect::<Vec<_>>()
            .join(":");
        self.buckets
            .entry(mask)
            .or_default()
            .entry(key)
            .or_default()
            .push(row);
        self.pattern_rows += 1;
    }

    fn to_value(&self) -> Result<Value, BenchError> {
        let shapes = self
            .buckets
            .iter()
            .map(|(mask, rows)| {
                let literal: Vec<usize> = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(pos, is_literal)| is_literal.then_some(pos))
                    .collect();
                Ok::<_, BenchError>(json!({
                    "size": mask.len(),
                    "literal": literal,
                    "rows": serde_json::to_value(rows)?,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(json!({
            "index": serde_json::to_value(&self.index)?,
            "shapes": shapes,
        }))
    }
}

/// Specialize the flavor's embedded module against `params.store`.
///
/// Only the embedded module and its `allow` query can be specialized.
pub fn specialize(params: &PrepareParams) -> Result<Residual, BenchError> {
    let flavor = params.flavor;
    if params.policy != policies::module(flavor) {
        return Err(BenchError::PartialEvalError(format!(
            "module {} is not the embedded {flavor} module and cannot be specialized",
            params.module_name
        )));
    }
    if params.query != flavor.rule_path("allow") {
        return Err(BenchError::PartialEvalError(format!(
            "query {} cannot be specialized, expected {}",
            params.query,
            flavor.rule_path("allow")
        )));
    }

    let any_allow = flavor.rule_path("any_allow");
    let any_deny = flavor.rule_path("any_deny");
    let mut keep_any_allow = false;
    for name in &params.disable_inlining {
        if *name == any_allow {
            keep_any_allow = true;
        } else if *name != any_deny {
            warn!(
                event = "Specialize",
                predicate = name.as_str(),
                "predicate cannot be kept residual, ignoring"
            );
        }
    }

    let mut allow = Table::default();
    let mut deny = Table::default();
    for policy in &params.store.policies {
        let table = match policy.effect {
            Effect::Allow => &mut allow,
            Effect::Deny => &mut deny,
        };
        insert_policy(table, flavor, policy, &params.store);
    }

    let mut ory = Map::new();
    ory.insert(
        flavor.to_string(),
        json!({
            "allow": allow.to_value()?,
            "deny": deny.to_value()?,
        }),
    );
    let document = json!({ "residual": { "ory": ory } });
    let module = residual_module(flavor, keep_any_allow);

    let (support_rules, inlined_rules) = if keep_any_allow {
        (allow.rows + deny.rows, 0)
    } else {
        (deny.rows, allow.rows)
    };
    let pattern_rows = allow.pattern_rows + deny.pattern_rows;

    debug!(
        event = "Specialize",
        flavor = %flavor,
        policies = params.store.len(),
        support_rules,
        inlined_rules,
        pattern_rows,
        bytes = module.len()
    );

    Ok(Residual {
        module,
        document,
        support_rules,
        inlined_rules,
        pattern_rows,
    })
}

fn insert_policy<'a>(table: &mut Table<'a>, flavor: Flavor, policy: &'a AccessPolicy, store: &'a AcpStore) {
    let subjects = policy.subjects.iter().flat_map(move |pattern| {
        let direct = std::iter::once(SubjectTerm::Direct(pattern));
        let via_roles = store
            .roles
            .iter()
            .filter(move |role| flavor == Flavor::Glob || role.id == *pattern)
            .flat_map(move |role| {
                role.members.iter().map(move |member| SubjectTerm::Role {
                    pattern,
                    role_id: &role.id,
                    member,
                })
            });
        direct.chain(via_roles)
    });

    for (subject, resource, action) in iproduct!(subjects, &policy.resources, &policy.actions) {
        table.insert(flavor, subject, resource, action);
    }
}

fn residual_module(flavor: Flavor, keep_any_allow: bool) -> String {
    let package = flavor.package();
    let rows = format!("data.residual.{package}");

    let allow = if keep_any_allow {
        format!(
            "allow if {{\n\tany_allow\n\tnot any_deny\n}}\n\n\
             any_allow if {{\n\tindexed({rows}.allow)\n}}\n\n\
             any_allow if {{\n\tmatched({rows}.allow)\n}}\n"
        )
    } else {
        format!(
            "allow if {{\n\tindexed({rows}.allow)\n\tnot any_deny\n}}\n\n\
             allow if {{\n\tmatched({rows}.allow)\n\tnot any_deny\n}}\n"
        )
    };

    format!(
        r#"package {package}

import rego.v1

default allow := false

default any_allow := false

default any_deny := false

{allow}
any_deny if {{
	indexed({rows}.deny)
}}

any_deny if {{
	matched({rows}.deny)
}}

indexed(table) if {{
	table.index[input.subject][input.resource][input.action]
}}

matched(table) if {{
	segments := split(input.resource, ":")
	some shape in table.shapes
	count(segments) == shape.size
	key := concat(":", [segments[i] | some i in shape.literal])
	some row in shape.rows[key]
	matchfn(row.action, input.action)
	matchfn(row.resource, input.resource)
	subject_matches(row)
}}

subject_matches(row) if {{
	matchfn(row.subject, input.subject)
}}

subject_matches(row) if {{
	row.member == input.subject
	not row.role
}}

subject_matches(row) if {{
	row.member == input.subject
	matchfn(row.role[0], row.role[1])
}}

{matchfn}"#,
        matchfn = policies::matchfn(flavor)
    )
}

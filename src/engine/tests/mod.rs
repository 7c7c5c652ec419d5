use super::*;
use crate::generator::{EXACT_SUBJECT, generate};
use crate::types::{Decision, Effect, Role};
use yare::parameterized;


const DENIED_EXACT: &str = "tenant:acmecorp:thing0:resource-dead-beef-feed-face";
const ALLOWED_EXACT: &str = "tenant:acmecorp:thing0:resource-1111-2222-3333-4444";
const DENIED_GLOB: &str = "tenant:acmecorp:thing-deadbeef:resource-dead-beef-feed-face";

fn prepare(flavor: Flavor, store: AcpStore, partial: bool) -> RegoQuery {
    let params = PrepareParams::from_profile(&FlavorProfile::for_flavor(flavor), store)
        .with_partial(partial);
    RegoEvaluator
        .prepare(params)
        .expect("policy module should prepare")
        .query
}

fn request(resource: &str) -> RequestInput {
    RequestInput::new(EXACT_SUBJECT, "check", resource)
}

fn decide(query: &mut RegoQuery, input: &RequestInput) -> Decision {
    let results = query.evaluate(input).expect("evaluation should succeed");
    Decision::try_from(&results).expect("result should be a single boolean")
}

fn assert_allow(decision: Decision) {
    assert_eq!(decision, Decision::Allow);
}

fn assert_deny(decision: Decision) {
    assert_eq!(decision, Decision::Deny);
}

include!("evaluate.rs");

#![allow(dead_code)]

use acp_bench::engine::RegoQuery;
use acp_bench::{
    Decision, Flavor, FlavorProfile, PolicyEvaluator, PrepareParams, PreparedQuery, RegoEvaluator,
    RequestInput, generate,
};

pub const SIZES: [usize; 3] = [30, 300, 3000];

pub const TRAVERSAL_POLICY: &str = r#"package bench.traversal

import rego.v1

import data.store.ory.exact as store

resources := [resource |
	some policy in store.policies
	some resource in policy.resources
]

resource_count := count(resources)
"#;

pub fn params(flavor: Flavor, amount: usize, partial: bool) -> PrepareParams {
    PrepareParams::from_profile(&FlavorProfile::for_flavor(flavor), generate(flavor, amount))
        .with_partial(partial)
}

pub fn traversal_params(amount: usize) -> PrepareParams {
    let mut params = params(Flavor::Exact, amount, false);
    params.module_name = "traversal.rego".to_string();
    params.policy = TRAVERSAL_POLICY.to_string();
    params.query = "data.bench.traversal.resource_count".to_string();
    params.disable_inlining.clear();
    params
}

pub fn prepare(params: PrepareParams) -> RegoQuery {
    RegoEvaluator
        .prepare(params)
        .expect("benchmark modules compile")
        .query
}

pub fn decide(query: &mut RegoQuery, input: &RequestInput) -> Decision {
    let results = query.evaluate(input).expect("benchmark queries evaluate");
    Decision::try_from(&results).expect("benchmark queries return a decision")
}

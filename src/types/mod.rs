//! Data model: policy records, request input, decisions and result sets.
//!
//! Pattern strings are colon-delimited, `tenant:<tenant>:<label>:<id>`;
//! glob-flavor patterns use `*` for a whole segment.

mod decision;
mod flavor;
mod policy;
mod request;

pub use decision::{Decision, QueryResult, ResultSet};
pub use flavor::Flavor;
pub use policy::{AccessPolicy, AcpStore, Effect, Role};
pub use request::RequestInput;

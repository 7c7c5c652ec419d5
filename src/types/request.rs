//! Decision request input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One access decision request. Serialized as the evaluation `input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub resource: String,
    pub action: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl RequestInput {
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        RequestInput {
            resource: resource.into(),
            action: action.into(),
            subject: subject.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;

    #[test]
    fn assert_request_serialization() {
        let request = RequestInput::new(
            "tenant:acmecorp:user:user.name@domain.com",
            "check",
            "tenant:acmecorp:thing0:resource-dead-beef-feed-face",
        );

        assert_json_snapshot!(request, @r#"
        {
          "resource": "tenant:acmecorp:thing0:resource-dead-beef-feed-face",
          "action": "check",
          "subject": "tenant:acmecorp:user:user.name@domain.com"
        }
        "#);
    }

    #[test]
    fn test_request_with_context() {
        let request = RequestInput::new("alice", "check", "doc")
            .with_context("remote_ip", Value::String("10.0.0.1".to_string()))
            .with_context("mfa", Value::Bool(true));

        let context = request.context.as_ref().unwrap();
        assert_eq!(context.len(), 2);

        let serialized = serde_json::to_value(&request).unwrap();
        assert_eq!(serialized["context"]["remote_ip"], "10.0.0.1");
        let back: RequestInput = serde_json::from_value(serialized).unwrap();
        assert_eq!(back, request);
    }
}

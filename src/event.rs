//! Gateway event and response types.
//!
//! The invocation shape differs between the two gateway integration modes:
//! HTTP API payloads carry `routeArn`, REST API payloads carry `methodArn`.
//! Both are normalized to a single resource ARN here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// IAM policy language version emitted in every decision.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The only action a gateway authorizer decides on.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Inbound authorizer invocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizerEvent {
    /// Request headers. Lookup is case-insensitive via [`Self::header`].
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Resource ARN in HTTP API integration mode.
    #[serde(default, rename = "routeArn")]
    pub route_arn: Option<String>,

    /// Resource ARN in REST API integration mode.
    #[serde(default, rename = "methodArn")]
    pub method_arn: Option<String>,

    /// Invocation context, passed through untouched.
    #[serde(default, rename = "requestContext")]
    pub request_context: Option<serde_json::Value>,
}

impl AuthorizerEvent {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The invoked resource ARN, whichever field the integration provided.
    pub fn resource_arn(&self) -> Option<&str> {
        self.route_arn.as_deref().or(self.method_arn.as_deref())
    }
}

/// Allow/deny effect in a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Single policy statement scoped to the invoked resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Effect")]
    pub effect: Effect,
    #[serde(rename = "Resource")]
    pub resource: String,
}

/// IAM-style policy document returned to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

/// Authorization decision forwarded to the gateway and, via `context`,
/// to the invoked resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizerResponse {
    #[serde(rename = "principalId")]
    pub principal_id: String,
    #[serde(rename = "policyDocument")]
    pub policy_document: PolicyDocument,
    pub context: HashMap<String, String>,
}

impl AuthorizerResponse {
    /// Build an allow decision scoped to a single resource.
    ///
    /// Allow is the only effect ever synthesized: denials collapse into the
    /// opaque `Unauthorized` signal instead of a deny policy.
    pub fn allow(
        principal_id: impl Into<String>,
        resource: impl Into<String>,
        context: HashMap<String, String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect: Effect::Allow,
                    resource: resource.into(),
                }],
            },
            context,
        }
    }
}

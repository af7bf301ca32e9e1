use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of API a suite targets. Both kinds are executed over plain HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiKind {
    #[default]
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "GraphQL")]
    GraphQl,
}

/// Target environment tag, copied onto every run result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertionKind {
    Status,
    Json,
    Header,
    ResponseTime,
}

impl AssertionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Json => "json",
            Self::Header => "header",
            Self::ResponseTime => "responseTime",
        }
    }
}

/// A single expected-vs-actual check declared on a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Status field name, JSON path, header name or time field name
    #[serde(default)]
    pub target: String,
    /// Expected value, always kept as text
    #[serde(alias = "value")]
    pub expected: String,
}

impl Assertion {
    pub fn new(kind: AssertionKind, target: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            expected: expected.into(),
        }
    }

    pub fn status(expected: impl Into<String>) -> Self {
        Self::new(AssertionKind::Status, "status", expected)
    }

    /// Report name, e.g. `"status status is 200"`
    pub fn display_name(&self) -> String {
        format!("{} {} is {}", self.kind.as_str(), self.target, self.expected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

/// One HTTP request definition plus its assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    pub endpoint: String,
    /// Ordered pairs; duplicate keys resolve to the last one
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Raw body text, parsed as JSON only when non-empty
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl Step {
    pub fn new(name: impl Into<String>, method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            endpoint: endpoint.into(),
            headers: Vec::new(),
            body: None,
            assertions: Vec::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }
}

/// An ordered, named collection of steps against one base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub api_kind: ApiKind,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TestSuite {
    pub fn new(owner_id: Uuid, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: None,
            base_url: base_url.into(),
            api_kind: ApiKind::Rest,
            environment: Environment::Development,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Stamp `updated_at`. Storage calls this on every mutation.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_display_name() {
        assert_eq!(Assertion::status("200").display_name(), "status status is 200");

        let assertion = Assertion::new(AssertionKind::ResponseTime, "duration", "500");
        assert_eq!(assertion.display_name(), "responseTime duration is 500");
    }

    #[test]
    fn test_step_deserializes_stored_shape() {
        let step: Step = serde_json::from_value(serde_json::json!({
            "name": "Get Users",
            "method": "GET",
            "endpoint": "/api/users",
            "headers": [{ "key": "Content-Type", "value": "application/json" }],
            "assertions": [{ "type": "status", "target": "status", "value": "200" }]
        }))
        .unwrap();

        assert_eq!(step.method, HttpMethod::Get);
        assert_eq!(step.body, None);
        assert_eq!(step.assertions, vec![Assertion::status("200")]);
    }

    #[test]
    fn test_api_kind_serialization() {
        assert_eq!(serde_json::to_value(ApiKind::GraphQl).unwrap(), "GraphQL");
        assert_eq!(serde_json::to_value(ApiKind::Rest).unwrap(), "REST");
    }
}

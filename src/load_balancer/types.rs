//! Control-plane wire types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::rules::condition::Condition;

/// A port-bound listener on the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub listener_arn: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: Option<String>,
}

/// A target group as returned by the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub name: String,
    pub target_group_arn: String,
}

/// Priority of a live rule.
///
/// The provider reports priorities as strings: a decimal number for ordinary
/// rules and a label such as `"default"` for the listener's default rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RulePriority {
    Numbered(u32),
    Label(String),
}

impl RulePriority {
    /// Returns the numeric priority, if this is a valid positive integer.
    pub fn number(&self) -> Option<u32> {
        match self {
            RulePriority::Numbered(n) => Some(*n),
            RulePriority::Label(_) => None,
        }
    }
}

impl FromStr for RulePriority {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let is_digits = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());
        match trimmed.parse::<u32>() {
            Ok(n) if is_digits && n > 0 => Ok(RulePriority::Numbered(n)),
            _ => Ok(RulePriority::Label(trimmed.to_string())),
        }
    }
}

impl fmt::Display for RulePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulePriority::Numbered(n) => write!(f, "{}", n),
            RulePriority::Label(label) => f.write_str(label),
        }
    }
}

impl Serialize for RulePriority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RulePriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        let priority = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string().parse(),
            Raw::Text(s) => s.parse(),
        };
        // FromStr is infallible
        Ok(priority.unwrap_or_else(|never| match never {}))
    }
}

/// Kind of action attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Forward,
    Redirect,
    FixedResponse,
    AuthenticateOidc,
    AuthenticateCognito,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Forward => "forward",
            ActionType::Redirect => "redirect",
            ActionType::FixedResponse => "fixed-response",
            ActionType::AuthenticateOidc => "authenticate-oidc",
            ActionType::AuthenticateCognito => "authenticate-cognito",
        }
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(ActionType::Forward),
            "redirect" => Ok(ActionType::Redirect),
            "fixed-response" => Ok(ActionType::FixedResponse),
            "authenticate-oidc" => Ok(ActionType::AuthenticateOidc),
            "authenticate-cognito" => Ok(ActionType::AuthenticateCognito),
            other => Err(format!("unknown action type '{}'", other)),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest rule priority the provider accepts.
pub const MAX_PRIORITY: u32 = 50_000;

/// Redirect settings of a `redirect` action.
///
/// Unset fields default to a permanent HTTPS:443 redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub protocol: String,
    pub port: String,
    pub status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            protocol: "HTTPS".to_string(),
            port: "443".to_string(),
            status_code: "HTTP_301".to_string(),
            host: None,
            path: None,
            query: None,
        }
    }
}

impl RedirectConfig {
    /// Render as a URL, using the provider placeholders for unset parts.
    pub fn to_url(&self) -> String {
        format!(
            "{}://{}:{}{}?{}",
            self.protocol,
            self.host.as_deref().unwrap_or("#{host}"),
            self.port,
            self.path.as_deref().unwrap_or("/#{path}"),
            self.query.as_deref().unwrap_or("#{query}"),
        )
    }
}

/// One action of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,
}

impl RuleAction {
    pub fn forward(target_group_arn: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Forward,
            target_group_arn: Some(target_group_arn.into()),
            redirect: None,
        }
    }

    pub fn redirect(config: RedirectConfig) -> Self {
        Self {
            action_type: ActionType::Redirect,
            target_group_arn: None,
            redirect: Some(config),
        }
    }
}

/// A live rule on a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_arn: String,
    pub priority: RulePriority,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub is_default: bool,
}

/// Body of a rule-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub priority: u32,
    pub conditions: Vec<Condition>,
    pub actions: Vec<RuleAction>,
}

/// Errors returned by the control plane.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request did not complete in time.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Non-success status not covered by a more specific variant.
    #[error("control plane returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The control plane refused a mutation (e.g. priority already in use).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

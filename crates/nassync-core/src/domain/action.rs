//! Post-sync action domain entity
//!
//! Actions fire after a run that transferred data. The store keeps the
//! kind as text and the configuration as an opaque JSON object; this
//! module decodes that pair into a closed set of typed variants so the
//! executor dispatches with a `match` instead of string comparisons.

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::DomainError;
use super::newtypes::ActionId;

/// Library section refreshed when none is configured
pub const DEFAULT_LIBRARY_SECTION: &str = "1";

/// A configured side effect run after a successful sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSyncAction {
    pub id: ActionId,
    pub name: String,
    pub kind: ActionKind,
    pub enabled: bool,
}

/// The supported action kinds, each carrying its own configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", content = "config", rename_all = "snake_case")]
pub enum ActionKind {
    /// Ask a media server to rescan one of its library sections
    LibraryRefresh(LibraryRefreshConfig),
    /// Call an arbitrary URL
    Webhook(WebhookConfig),
}

impl ActionKind {
    /// Storage name of the kind
    pub fn type_name(&self) -> &'static str {
        match self {
            ActionKind::LibraryRefresh(_) => "library_refresh",
            ActionKind::Webhook(_) => "webhook",
        }
    }

    /// The kind-specific configuration as a JSON object
    pub fn config_json(&self) -> serde_json::Value {
        let value = match self {
            ActionKind::LibraryRefresh(config) => serde_json::to_value(config),
            ActionKind::Webhook(config) => serde_json::to_value(config),
        };
        value.unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Decodes a stored `(kind, config)` pair
    ///
    /// `plex_refresh` is accepted as a legacy name for `library_refresh`.
    /// A `null` config decodes as an empty object so every field falls
    /// back to its default.
    pub fn from_parts(kind: &str, config: serde_json::Value) -> Result<Self, DomainError> {
        let config = if config.is_null() {
            serde_json::json!({})
        } else {
            config
        };

        match kind {
            "library_refresh" | "plex_refresh" => serde_json::from_value(config)
                .map(ActionKind::LibraryRefresh)
                .map_err(|e| DomainError::InvalidActionConfig {
                    kind: kind.to_string(),
                    reason: e.to_string(),
                }),
            "webhook" => serde_json::from_value(config)
                .map(ActionKind::Webhook)
                .map_err(|e| DomainError::InvalidActionConfig {
                    kind: kind.to_string(),
                    reason: e.to_string(),
                }),
            other => Err(DomainError::UnknownActionKind(other.to_string())),
        }
    }
}

/// Settings for a media-library refresh call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRefreshConfig {
    /// Base URL of the media server, e.g. `http://plex.local:32400`
    #[serde(default, alias = "plex_url")]
    pub base_url: String,
    /// Access token sent as `X-Plex-Token`
    #[serde(default, alias = "plex_token")]
    pub token: String,
    #[serde(
        default = "default_library_section",
        deserialize_with = "string_or_number"
    )]
    pub library_section: String,
}

impl LibraryRefreshConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            library_section: default_library_section(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.library_section = section.into();
        self
    }

    /// Refresh endpoint without the token, or `None` when the base URL or
    /// token is missing
    pub fn refresh_url(&self) -> Option<String> {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.is_empty() || self.token.trim().is_empty() {
            return None;
        }
        Some(format!(
            "{}/library/sections/{}/refresh",
            base, self.library_section
        ))
    }
}

/// Settings for a generic webhook call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: WebhookMethod,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>, method: WebhookMethod) -> Self {
        Self {
            url: url.into(),
            method,
        }
    }
}

/// HTTP method used by a webhook; anything other than `GET` means `POST`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebhookMethod {
    Get,
    #[default]
    Post,
}

impl From<String> for WebhookMethod {
    fn from(s: String) -> Self {
        WebhookMethod::from(s.as_str())
    }
}

impl From<&str> for WebhookMethod {
    fn from(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("GET") {
            WebhookMethod::Get
        } else {
            WebhookMethod::Post
        }
    }
}

impl From<WebhookMethod> for String {
    fn from(method: WebhookMethod) -> Self {
        match method {
            WebhookMethod::Get => "GET".to_string(),
            WebhookMethod::Post => "POST".to_string(),
        }
    }
}

fn default_library_section() -> String {
    DEFAULT_LIBRARY_SECTION.to_string()
}

/// Library sections are sometimes saved as JSON numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Section {
        Text(String),
        Number(i64),
    }

    Ok(match Section::deserialize(deserializer)? {
        Section::Text(s) => s,
        Section::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_parts_library_refresh() {
        let kind = ActionKind::from_parts(
            "library_refresh",
            json!({"base_url": "http://plex:32400/", "token": "abc", "library_section": "3"}),
        )
        .unwrap();

        match kind {
            ActionKind::LibraryRefresh(config) => {
                assert_eq!(config.token, "abc");
                assert_eq!(
                    config.refresh_url().as_deref(),
                    Some("http://plex:32400/library/sections/3/refresh")
                );
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_from_parts_accepts_legacy_plex_names() {
        let kind = ActionKind::from_parts(
            "plex_refresh",
            json!({"plex_url": "http://plex:32400", "plex_token": "t", "library_section": 2}),
        )
        .unwrap();

        let ActionKind::LibraryRefresh(config) = kind else {
            panic!("expected library refresh");
        };
        assert_eq!(config.base_url, "http://plex:32400");
        assert_eq!(config.library_section, "2");
        assert_eq!(
            ActionKind::LibraryRefresh(config).type_name(),
            "library_refresh"
        );
    }

    #[test]
    fn test_library_refresh_defaults_and_missing_fields() {
        let kind = ActionKind::from_parts("library_refresh", serde_json::Value::Null).unwrap();
        let ActionKind::LibraryRefresh(config) = kind else {
            panic!("expected library refresh");
        };
        assert_eq!(config.library_section, "1");
        assert!(config.refresh_url().is_none());

        let config = LibraryRefreshConfig::new("http://plex", "");
        assert!(config.refresh_url().is_none());
    }

    #[test]
    fn test_webhook_method_parsing() {
        let kind = ActionKind::from_parts("webhook", json!({"url": "http://x", "method": "get"}))
            .unwrap();
        assert_eq!(
            kind,
            ActionKind::Webhook(WebhookConfig::new("http://x", WebhookMethod::Get))
        );

        let kind = ActionKind::from_parts("webhook", json!({"url": "http://x"})).unwrap();
        let ActionKind::Webhook(config) = kind else {
            panic!("expected webhook");
        };
        assert_eq!(config.method, WebhookMethod::Post);

        assert_eq!(WebhookMethod::from("PUT"), WebhookMethod::Post);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = ActionKind::from_parts("email", json!({}));
        assert_eq!(
            result,
            Err(DomainError::UnknownActionKind("email".to_string()))
        );
    }

    #[test]
    fn test_invalid_config_shape_rejected() {
        let result = ActionKind::from_parts("webhook", json!(["not", "an", "object"]));
        assert!(matches!(
            result,
            Err(DomainError::InvalidActionConfig { .. })
        ));
    }

    #[test]
    fn test_config_json_uses_canonical_keys() {
        let kind = ActionKind::Webhook(WebhookConfig::new("http://hook", WebhookMethod::Get));
        assert_eq!(
            kind.config_json(),
            json!({"url": "http://hook", "method": "GET"})
        );

        let kind = ActionKind::LibraryRefresh(LibraryRefreshConfig::new("http://p", "tok"));
        assert_eq!(
            kind.config_json(),
            json!({"base_url": "http://p", "token": "tok", "library_section": "1"})
        );
    }
}

//! Requests a client makes of its host.
//!
//! None of these are handled by the bus itself; the host application receives
//! them as events and decides what to do (navigate, show a toast, open a
//! modal, update the page title).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a navigation request should affect the host's history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Push a new history entry.
    #[default]
    Push,
    /// Replace the current history entry.
    Replace,
}

/// Navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavRequest {
    /// Target URL, usually built with the client's URL helpers.
    pub url: String,

    /// History mode. Absent means [`HistoryMode::Push`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryMode>,
}

impl NavRequest {
    /// Effective history mode.
    pub fn history_mode(&self) -> HistoryMode {
        self.history.unwrap_or_default()
    }
}

/// Notification request (`notifyRequest`, formerly `toastRequest`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Notification body.
    pub message: String,

    /// Host-defined presentation data. Must be present, may be `null`.
    pub custom: Value,
}

/// Modal request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalRequest {
    /// Host-defined modal identifier.
    pub modal_id: String,

    /// Data handed to the modal.
    pub modal_data: Value,

    /// Host-defined extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    /// Display text.
    pub text: String,
    /// Link target.
    pub href: String,
}

/// Page metadata report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Page title.
    pub title: String,

    /// Breadcrumb trail, outermost first.
    pub breadcrumbs: Vec<Breadcrumb>,

    /// Host-defined extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

/// Leave confirmation toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOnLeave {
    /// Whether the host should confirm before navigating away.
    pub should_prompt: bool,

    /// Text for the confirmation prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn history_defaults_to_push() {
        let request: NavRequest = serde_json::from_value(json!({"url": "/a"})).unwrap();
        assert_eq!(request.history_mode(), HistoryMode::Push);

        let request: NavRequest =
            serde_json::from_value(json!({"url": "/a", "history": "replace"})).unwrap();
        assert_eq!(request.history_mode(), HistoryMode::Replace);
    }

    #[test]
    fn unknown_history_mode_is_rejected() {
        let request = serde_json::from_value::<NavRequest>(json!({"url": "/a", "history": "pop"}));
        assert!(request.is_err());
    }

    #[test]
    fn notification_custom_must_be_present() {
        let missing = serde_json::from_value::<Notification>(json!({"message": "hi"}));
        assert!(missing.is_err());

        let null = serde_json::from_value::<Notification>(json!({"message": "hi", "custom": null}));
        assert!(null.is_ok());
    }

    #[test]
    fn modal_fields_are_camel_case() {
        let modal = ModalRequest {
            modal_id: "confirm".into(),
            modal_data: json!({"a": 1}),
            custom: None,
        };
        assert_eq!(
            serde_json::to_value(&modal).unwrap(),
            json!({"modalId": "confirm", "modalData": {"a": 1}})
        );
    }

    #[test]
    fn breadcrumbs_require_href() {
        let metadata = serde_json::from_value::<PageMetadata>(json!({
            "title": "Orders",
            "breadcrumbs": [{"text": "Home"}],
        }));
        assert!(metadata.is_err());
    }
}

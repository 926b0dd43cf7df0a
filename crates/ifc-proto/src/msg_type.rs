//! Message type tags.
//!
//! The `msgType` string of an envelope selects the payload schema. Every tag
//! belongs to exactly one direction except `publish`, which both sides send.

use crate::Direction;

/// Known `msgType` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// Client finished starting and is ready for environment data.
    ClientStarted,
    /// Pub/sub publication (both directions).
    Publish,
    /// Client asks the host to navigate.
    NavRequest,
    /// Client asks the host to show a notification.
    NotifyRequest,
    /// Client asks the host to open a modal.
    ModalRequest,
    /// Client reports page title and breadcrumbs.
    PageMetadata,
    /// Client toggles the host's leave confirmation.
    PromptOnLeave,
    /// A host-registered key chord fired inside the client.
    RegisteredKeyFired,
    /// A click happened inside the client.
    ClickFired,
    /// Worker client finished a cooperative unload.
    UnloadComplete,
    /// Host sends environment data to a started client.
    EnvInit,
    /// Host asks a worker client to shut down.
    UnloadRequest,
}

impl MsgType {
    /// Legacy tag accepted as an alias of [`MsgType::NotifyRequest`].
    pub const LEGACY_TOAST_REQUEST: &'static str = "toastRequest";

    /// All tags, in wire-table order.
    pub const ALL: [Self; 12] = [
        Self::ClientStarted,
        Self::Publish,
        Self::NavRequest,
        Self::NotifyRequest,
        Self::ModalRequest,
        Self::PageMetadata,
        Self::PromptOnLeave,
        Self::RegisteredKeyFired,
        Self::ClickFired,
        Self::UnloadComplete,
        Self::EnvInit,
        Self::UnloadRequest,
    ];

    /// Wire string written on encode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientStarted => "client_started",
            Self::Publish => "publish",
            Self::NavRequest => "navRequest",
            Self::NotifyRequest => "notifyRequest",
            Self::ModalRequest => "modalRequest",
            Self::PageMetadata => "pageMetadata",
            Self::PromptOnLeave => "promptOnLeave",
            Self::RegisteredKeyFired => "registeredKeyFired",
            Self::ClickFired => "clickFired",
            Self::UnloadComplete => "unload_complete",
            Self::EnvInit => "env_init",
            Self::UnloadRequest => "unload_request",
        }
    }

    /// Parse a wire string, accepting legacy aliases. `None` if unknown.
    #[must_use]
    pub fn from_wire(tag: &str) -> Option<Self> {
        if tag == Self::LEGACY_TOAST_REQUEST {
            return Some(Self::NotifyRequest);
        }
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Whether a message of this type may travel in `direction`.
    #[must_use]
    pub const fn allowed_in(self, direction: Direction) -> bool {
        match self {
            Self::Publish => true,
            Self::EnvInit | Self::UnloadRequest => matches!(direction, Direction::HostToClient),
            Self::ClientStarted
            | Self::NavRequest
            | Self::NotifyRequest
            | Self::ModalRequest
            | Self::PageMetadata
            | Self::PromptOnLeave
            | Self::RegisteredKeyFired
            | Self::ClickFired
            | Self::UnloadComplete => matches!(direction, Direction::ClientToHost),
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Platform lifecycle hooks.
//!
//! In a browser, the host element and the client runtime are driven by
//! custom-element callbacks. Those callbacks are the only thing tying the bus
//! to a platform, so they are expressed as a trait and implemented per
//! platform; routing and protocol code never depend on it.

/// Attach/detach/attribute notifications from the embedding platform.
pub trait Lifecycle {
    /// The owning element was attached to a document.
    fn on_attach(&mut self);

    /// The owning element was removed. Everything the component acquired
    /// (listeners, frames, workers) must be released.
    fn on_detach(&mut self);

    /// An observed attribute changed. `None` means the attribute was removed.
    fn on_attribute_change(&mut self, name: &str, value: Option<&str>);
}

use tokio::sync::mpsc;

use fleetdesk_application::CatalogChangeNotifier;

/// Catalog-change notifier backed by an unbounded tokio channel.
///
/// Senders never block; the API composition root drains the receiver in a
/// background task that reconciles superadmin grants per event. Dropped
/// events (listener shut down) are harmless because reconciliation is
/// idempotent and also runs at startup.
#[derive(Clone)]
pub struct ChannelCatalogNotifier {
    sender: mpsc::UnboundedSender<()>,
}

impl ChannelCatalogNotifier {
    /// Creates a notifier and the receiver its listener drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CatalogChangeNotifier for ChannelCatalogNotifier {
    fn notify(&self) {
        if self.sender.send(()).is_err() {
            // Listener is gone (shutdown); the startup reconcile covers it.
            tracing::debug!("catalog change listener stopped; notification skipped");
        }
    }
}

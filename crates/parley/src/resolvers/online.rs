//! `(onlineonly)` and `(offlineonly)` gates.

use crate::pipeline::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    OnlineOnly,
    OfflineOnly,
}

/// `Some("")` when the gate is open, `None` when it is closed.
pub(crate) async fn gate(resolver: &Resolver, gate: Gate) -> Option<String> {
    let online = resolver.collaborators().stream.is_online().await;
    let open = match gate {
        Gate::OnlineOnly => online,
        Gate::OfflineOnly => !online,
    };
    open.then(String::new)
}

//! Message router.
//!
//! Validates inbound envelopes and forwards them verbatim to the
//! recipient's outbound channel. A recipient with no active connection
//! means the envelope is dropped — no retry, no queueing. The router
//! never decrypts, inspects, or logs payload content; only the routing
//! fields (`from`, `to`, kind) appear in traces.

use crate::presence::PresenceRegistry;
use crate::protocol::{ClientEnvelope, ServerEnvelope};

/// What became of a routed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Written to the recipient's outbound channel.
    Delivered,
    /// Recipient not connected; envelope dropped, sender not told.
    DroppedOffline,
    /// Envelope failed validation; the connection answers with a typed
    /// error frame.
    Invalid,
}

/// Validate and forward one envelope from `from`.
pub fn route(registry: &PresenceRegistry, from: &str, envelope: ClientEnvelope) -> RouteOutcome {
    match envelope {
        ClientEnvelope::MessageSend {
            to,
            encrypted_content,
        } => {
            if to.is_empty() {
                return RouteOutcome::Invalid;
            }
            deliver(
                registry,
                from,
                &to,
                "message",
                ServerEnvelope::MessageReceive {
                    from: from.to_string(),
                    encrypted_content,
                },
            )
        }

        ClientEnvelope::FileSend {
            to,
            file_name,
            file_type,
            encrypted_file,
            encrypted_key,
        } => {
            if to.is_empty() || file_name.is_empty() {
                return RouteOutcome::Invalid;
            }
            deliver(
                registry,
                from,
                &to,
                "file",
                ServerEnvelope::FileReceive {
                    from: from.to_string(),
                    file_name,
                    file_type,
                    encrypted_file,
                    encrypted_key,
                },
            )
        }
    }
}

fn deliver(
    registry: &PresenceRegistry,
    from: &str,
    to: &str,
    kind: &'static str,
    envelope: ServerEnvelope,
) -> RouteOutcome {
    if registry.send_to(to, envelope) {
        tracing::trace!(from, to, kind, "envelope forwarded");
        RouteOutcome::Delivered
    } else {
        tracing::debug!(from, to, kind, "recipient offline, envelope dropped");
        RouteOutcome::DroppedOffline
    }
}

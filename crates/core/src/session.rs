//! Session state types shared between the lifecycle manager and callers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::CommandSurface;

/// Host-application endpoint, fixed at session creation.
///
/// Reconnecting to a different endpoint requires mounting a new manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl Endpoint {
	/// Creates an endpoint for `host:port`.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
		}
	}
}

impl Default for Endpoint {
	fn default() -> Self {
		Self::new("localhost", 4682)
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Connection status of one session.
///
/// Transitions only happen inside the lifecycle manager; callers read
/// snapshots and never mutate status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
	/// Created but connection not yet requested.
	#[default]
	Uninitialized,
	/// Connect requested, acknowledgment pending.
	Connecting,
	/// Host acknowledged the connection. The command surface may still be
	/// in flight; readiness is a separate observable.
	Connected,
	/// Host closed the session. A fresh connect acknowledgment re-enters
	/// `Connected` without caller intervention.
	Disconnected,
	/// Host capability missing at mount. Terminal for this manager.
	Unavailable,
}

/// Read-only status tuple handed to the presentation layer.
///
/// Re-published on every change through the manager's watch channel. The
/// transport being up (`connected`) and the command surface being acquired
/// (`surface_ready`) are distinct: commands fail as not-connected in the
/// window between the two.
#[derive(Clone, Default)]
pub struct StatusSnapshot {
	/// The acquired command surface, present only while usable.
	pub surface: Option<Arc<dyn CommandSurface>>,
	/// Transport-level connection flag.
	pub connected: bool,
	/// Whether the command surface has been acquired.
	pub surface_ready: bool,
	/// Human-readable diagnostic from the most recent failure, if any.
	pub error: Option<String>,
}

impl fmt::Debug for StatusSnapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StatusSnapshot")
			.field("surface", &self.surface.is_some())
			.field("connected", &self.connected)
			.field("surface_ready", &self.surface_ready)
			.field("error", &self.error)
			.finish()
	}
}

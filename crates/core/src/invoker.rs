//! Command invocation over an established session.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::SimlinkError;
use crate::manager::LifecycleManager;

/// Typed result of a single time-jump request. Never raised as a fault; the
/// presentation layer decides what to show for each kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDateOutcome {
	/// Host applied the jump. `display` is the long-form date for rendering
	/// (e.g. "March 15, 2024").
	Applied { display: String },
	/// No live session with an acquired command surface; the host was not
	/// called.
	NotConnected,
	/// Host refused the command; `detail` is the host's message verbatim.
	HostRejected { detail: String },
}

/// Jumps simulation time to midnight of `date`.
///
/// Date-only semantics: the wire form is `YYYY-MM-DDT00:00:00` with no
/// timezone offset. The manager's state is validated first — the host time
/// entry point is never invoked unless a command surface is held. Rejections
/// are reported, not retried; calling twice with the same date lands on the
/// same simulated time.
pub async fn set_simulation_date(manager: &LifecycleManager, date: NaiveDate) -> SetDateOutcome {
	let surface = match manager.command_surface() {
		Ok(surface) => surface,
		Err(_) => {
			debug!(target: "simlink.invoke", %date, "time jump requested while not connected");
			return SetDateOutcome::NotConnected;
		}
	};

	let timestamp = wire_timestamp(date);
	match surface.set_time(&timestamp).await {
		Ok(()) => {
			debug!(target: "simlink.invoke", %timestamp, "simulation time applied");
			SetDateOutcome::Applied {
				display: display_date(date),
			}
		}
		Err(err) => {
			warn!(target: "simlink.invoke", %timestamp, error = %err, "host rejected time jump");
			SetDateOutcome::HostRejected {
				detail: host_detail(err),
			}
		}
	}
}

/// Normalizes a calendar date to the host's date-time form, midnight local.
fn wire_timestamp(date: NaiveDate) -> String {
	format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// Long-form date for display, e.g. "March 15, 2024".
fn display_date(date: NaiveDate) -> String {
	date.format("%B %-d, %Y").to_string()
}

fn host_detail(err: SimlinkError) -> String {
	match err {
		SimlinkError::HostRejected(detail) => detail,
		other => other.to_string(),
	}
}

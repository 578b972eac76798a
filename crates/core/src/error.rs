use thiserror::Error;

/// Result type alias for simlink operations.
pub type Result<T> = std::result::Result<T, SimlinkError>;

/// Failure taxonomy for the session core.
///
/// Every variant is recoverable at the boundary: the core never terminates
/// the process, it only updates observable state or returns a typed value.
#[derive(Debug, Error)]
pub enum SimlinkError {
	/// Host capability was not present in the execution environment at
	/// mount. Terminal for that mount; no automatic retry.
	#[error("capability not loaded")]
	CapabilityMissing,

	/// Host closed or never opened the session. Recoverable on the next
	/// connect acknowledgment from the host.
	#[error("connect failed: {0}")]
	ConnectFailed(String),

	/// Transport is up but the command surface could not be obtained.
	#[error("command surface acquisition failed: {0}")]
	AcquisitionFailed(String),

	/// Command attempted while no surface is available.
	#[error("not connected to the simulation host")]
	NotConnected,

	/// Host explicitly rejected a command. Carries the host's detail
	/// verbatim; never retried.
	#[error("host rejected command: {0}")]
	HostRejected(String),
}

impl SimlinkError {
	/// Returns the host-provided detail for a rejected command.
	pub fn rejection_detail(&self) -> Option<&str> {
		match self {
			SimlinkError::HostRejected(detail) => Some(detail),
			_ => None,
		}
	}
}

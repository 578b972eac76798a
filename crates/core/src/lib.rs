//! simlink: session lifecycle core for driving a remote simulation host.
//!
//! One persistent session connects a control front end to the host
//! application; once established, callers can push a single command — jump
//! simulation time to a calendar date. The crate is the connection core
//! only; rendering and input are external collaborators that call
//! [`set_simulation_date`] and re-render from [`StatusSnapshot`].
//!
//! - [`LifecycleManager`] owns the session state machine: it opens the host
//!   client, tracks connect/disconnect, acquires the command surface, and
//!   tears everything down on drop.
//! - [`set_simulation_date`] validates manager state and forwards the
//!   normalized date, returning a typed [`SetDateOutcome`].
//! - [`HostCapability`] / [`HostClient`] / [`CommandSurface`] pin down the
//!   consumed slice of the host's opaque client library; the capability is
//!   injected at mount, so tests run against a scripted host.
//!
//! ```ignore
//! use simlink::{Endpoint, LifecycleManager, set_simulation_date};
//!
//! let manager = LifecycleManager::mount(Some(&capability), Endpoint::default());
//! // ... host acknowledges the connection, surface gets acquired ...
//! let outcome = set_simulation_date(&manager, date).await;
//! ```

pub mod error;
pub mod handlers;
pub mod host;
pub mod invoker;
pub mod manager;
pub mod session;

pub use error::{Result, SimlinkError};
pub use handlers::{EventHandler, HandlerId, HandlerRegistry, Subscription};
pub use host::{CommandSurface, HostCapability, HostClient};
pub use invoker::{SetDateOutcome, set_simulation_date};
pub use manager::{LifecycleManager, ManagerConfig};
pub use session::{Endpoint, SessionStatus, StatusSnapshot};

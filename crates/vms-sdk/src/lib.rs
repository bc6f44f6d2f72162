//! VMS SDK - a shareable session over the vaccination-management working set
//!
//! The core model is synchronous and single-writer. This crate wraps it for
//! use from many threads or tasks: one lock, writes serialized, and every
//! committed change published to subscribers and kept in a short history.
//!
//! # Quick Start
//!
//! ```rust
//! use vms_sdk::{Session, SessionConfigBuilder};
//! use vms_model::{GroupName, VaxType};
//!
//! let config = SessionConfigBuilder::new().operator("Front desk").build();
//! let session = Session::new(config);
//! let mut events = session.subscribe();
//!
//! session
//!     .add_vaccination(VaxType::builder(GroupName::new("Flu").unwrap()).build().unwrap())
//!     .unwrap();
//!
//! let event = events.try_recv().unwrap();
//! assert_eq!(event.operator, "Front desk");
//! assert_eq!(session.read().vax_types().len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`session`] - The shared handle and its mutation methods
//! - [`event`] - Events published after every change
//! - [`config`] - Session configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod event;
pub mod session;

// Re-exports for convenience
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{Result, SdkError};
pub use event::{EventKind, ModelEvent};
pub use session::Session;

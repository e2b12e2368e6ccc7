//! RCL Common - container bring-up for the utility appliance
//!
//! Validates the persisted container configuration, checks the host's
//! network topology and outbound reachability, then drives the service
//! container through cleanup, install and run.

pub mod dns;
pub mod endpoints;
pub mod error;
pub mod exit_codes;
pub mod lifecycle;
pub mod network;
pub mod persist;
pub mod pipeline;
pub mod preflight;
pub mod runtime;
pub mod schema;
pub mod settings;
pub mod sibling;

pub use error::{RclError, Result};
pub use pipeline::{BringUp, GateReport, Host, Pipeline, StartRequest};
pub use settings::Settings;

//! Process exit codes for rclctl
//!
//! These values are consumed by provisioning automation and must never be
//! renumbered. Gaps are codes retired by earlier releases.

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Log output directory could not be created
pub const EXIT_OUTPUT_DIR: i32 = 2;

/// Not every remote endpoint could be resolved
pub const EXIT_ENDPOINT_RESOLUTION: i32 = 3;

/// Interface exists but carries no IPv4 address
pub const EXIT_INTERFACE_UNBOUND: i32 = 4;

/// Interface does not exist on this host
pub const EXIT_INTERFACE_MISSING: i32 = 5;

/// No remote endpoint reachable, or operator cancelled input
pub const EXIT_UNREACHABLE: i32 = 6;

/// RAS bridge address is not the expected one
pub const EXIT_RAS_ADDRESS: i32 = 7;

/// Host has no DNS domain configured
pub const EXIT_NO_DOMAIN: i32 = 8;

/// Container is already running
pub const EXIT_ALREADY_RUNNING: i32 = 9;

/// Could not delete the container image
pub const EXIT_IMAGE_DELETE: i32 = 10;

/// Failure writing the configuration file
pub const EXIT_WRITE_FAILURE: i32 = 12;

/// Configuration lacks required fields or carries wrong static values
pub const EXIT_SCHEMA: i32 = 13;

/// Not run as the operator user
pub const EXIT_NOT_OPERATOR: i32 = 15;

/// Sibling install tool is not available
pub const EXIT_SIBLING_UNAVAILABLE: i32 = 22;

/// Sibling install tool could not read the configuration
pub const EXIT_SIBLING_READCONF: i32 = 23;

/// Starting the container returned an error
pub const EXIT_RUN_FAILED: i32 = 24;

/// Container runtime binary does not exist
pub const EXIT_NO_RUNTIME: i32 = 26;

/// Network manager binary does not exist
pub const EXIT_NO_NETWORK_MANAGER: i32 = 28;

/// Container name resolves outside the container network
pub const EXIT_CONTAINER_RESOLVABLE: i32 = 51;

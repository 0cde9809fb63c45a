//! Capability bridge between the host and a sandboxed UI context
//!
//! ```text
//! preload (isolated, privileged)          UI code
//! ------------------------------          -------
//! exposed_capabilities(ipc)               attach_api_from_globals(globals)
//!   -> CapabilityTable                      re-derives encode_key(name)
//!   -> install(): ContextBridge             for each EXPOSED_NAMES entry
//!        expose_in_main_world(key, cap)     -> UiApi (subset, maybe empty)
//!        seal() -> Arc<UiGlobals>
//! ```
//!
//! The table in [`exposed`] is the entire surface. Keys are derived from
//! names only to keep bridge bindings apart from other globals.

pub mod assemble;
pub mod capability;
pub mod exposed;
pub mod key;
pub mod namespace;

pub use assemble::{UiApi, attach_api_from_globals};
pub use capability::{Capability, CapabilityTable};
pub use exposed::{EXPOSED_NAMES, exposed_capabilities, sha256sum, versions};
pub use key::{decode_key, encode_key};
pub use namespace::{ContextBridge, UiGlobals, install};

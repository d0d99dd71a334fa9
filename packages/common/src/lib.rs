//! Shared building blocks for the overlay workspace.
//!
//! - [`template`]: `{{path}}` placeholder substitution and dot-path lookup
//!   into arbitrary JSON payloads.
//! - [`timer`]: cancellable timer slots used by every debounce, dismiss and
//!   revert timer in the editor and live view.

pub mod template;
pub mod timer;

pub use template::{coerce_payload, display_value, get_nested_value, resolve_template};
pub use timer::{earliest, TimerSlot, TimerToken};

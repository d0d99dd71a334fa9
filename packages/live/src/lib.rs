//! # Overlay Live
//!
//! Event-driven state for the broadcast-facing overlay view.
//!
//! ```text
//! named event ─▶ LiveRouter::route ─┬─▶ AlertQueue        (alert)
//!                                   ├─▶ ChatWindow        (chat-message)
//!                                   ├─▶ CustomEventQueue  (configured name)
//!                                   └─▶ BoundValue        (binding's name)
//!
//! LiveRouter::tick(now) ─▶ dismiss / revert / fade
//! LiveRouter::render()  ─▶ Vec<RenderedElement>
//! ```
//!
//! Everything here is synchronous and clock-agnostic: callers supply the
//! current instant and schedule the next tick from
//! [`LiveRouter::next_deadline`].

pub mod alerts;
pub mod binding;
pub mod chat;
pub mod custom_events;
pub mod queue;
pub mod router;

pub use alerts::{Alert, AlertQueue};
pub use binding::{BindingMode, BoundValue};
pub use chat::{ChatMessage, ChatWindow};
pub use custom_events::{CustomEventQueue, QueuedText};
pub use queue::DisplayQueue;
pub use router::{LiveContent, LiveRouter, LiveWidget, RenderedElement, ALERT_EVENT, CHAT_EVENT};

//! # Overlay Workspace
//!
//! Runtime wiring around the editor and live crates: scene storage, the
//! event transport and registry, debounced persistence for editor
//! sessions, and the live session that feeds the broadcast view.
//!
//! ```text
//!   editor session (Workspace) ──save──▶ SceneService ──▶ SceneStore
//!          ▲                                   │
//!          │ scene-*                           ▼ publish
//!   EventRegistry ◀──────────────────────── Transport ◀── upstream events
//!          │
//!          ▼
//!   LiveSession ─▶ LiveRouter ─▶ LiveFrame (watch)
//! ```

pub mod autosave;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod live_session;
pub mod registry;
pub mod service;
pub mod storage;
pub mod transport;

pub use autosave::{RetryPolicy, SaveTicket, SaveTracker};
pub use config::WorkspaceConfig;
pub use coordinator::Workspace;
pub use error::{StorageError, StorageResult, WorkspaceError, WorkspaceResult};
pub use live_session::{LiveFrame, LiveSession, LiveTarget};
pub use registry::{EventRegistry, Subscription};
pub use service::SceneService;
pub use storage::{FileSceneStore, MemorySceneStore, SceneStore};
pub use transport::{events, Envelope, ListenerId, LocalTransport, Transport};

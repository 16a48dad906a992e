//! egui renderer for the accessibility tree explorer.
//!
//! Immediate mode, with the engine state owned by
//! [`ViewerSession`](axtree_core::ViewerSession):
//!
//! - **Update phase**: `session.update(dt)` advances transitions, debounced
//!   search and playback
//! - **Render phase**: [`TreeView`] and [`OverviewPanel`] read the session;
//!   input is forwarded back to it as method calls
//!
//! ```text
//!   ┌──────────────────────────────┬──────────────┐
//!   │                              │ search / fit │
//!   │          TreeView            │ OverviewPanel│
//!   │                              │ roles legend │
//!   │                              │ inspector    │
//!   ├──────────────────────────────┴──────────────┤
//!   │ status                                      │
//!   └─────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod minimap;
pub mod style;
pub mod tree_view;

pub use app::ViewerApp;
pub use minimap::OverviewPanel;
pub use tree_view::{TreeView, TreeViewOutput};

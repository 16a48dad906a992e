//! Accessibility tree visualization and navigation engine.
//!
//! Pure, frame-driven core shared by the CLI and the egui viewer:
//!
//! ```text
//!   raw nodes ─► TreeBuilder ─► RoleFilter ─► LayoutEngine ─► TreeLayout
//!                                                              │
//!                          ┌───────────────────────────────────┤
//!                          ▼                                   ▼
//!                     OverviewMap ──NavigateRequest──► ViewportController
//!                          ▲                                   ▲
//!                    HighlightSet ◄── search          NavigationPlayback
//! ```
//!
//! No component but [`viewport::ViewportController`] writes the pan/zoom
//! transform; everything else reads it or asks the controller to move.

pub mod animation;
pub mod config;
pub mod filter;
pub mod geometry;
pub mod layout;
pub mod minimap;
pub mod playback;
pub mod search;
pub mod session;
pub mod spatial;
pub mod viewport;

pub use config::{global_config, ConfigError, ViewerConfig};
pub use filter::{RoleFilter, VisibleTree};
pub use geometry::{Bounds, Point, Size};
pub use layout::{Edge, LayoutEngine, PositionedNode, TreeLayout};
pub use minimap::{NavigateRequest, OverviewMap, OverviewProjection};
pub use playback::{NavigationPlayback, PlaybackEvent, PlaybackHandle};
pub use search::{search, HighlightSet};
pub use session::{RoleToggle, SessionEvent, ViewerSession};
pub use viewport::{ViewportController, ViewportTransform};

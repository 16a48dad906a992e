//! Accessibility tree explorer.
//!
//! Umbrella crate over the workspace:
//!
//! - [`axtree_snapshot`]: wire model, tree builder, focusable extraction
//! - [`axtree_core`]: role filter, tidy layout, viewport, overview, search,
//!   playback and the frame-driven [`ViewerSession`]
//! - [`fetch`]: client for the headless-browser snapshot endpoint
//!
//! The `axtree` binary inspects snapshots from the command line; the
//! `axtree_viewer` binary (feature `viewer`) opens them in egui.

pub mod fetch;

pub use axtree_core::{
    global_config, search, Bounds, HighlightSet, LayoutEngine, NavigateRequest,
    NavigationPlayback, OverviewMap, OverviewProjection, PlaybackEvent, PlaybackHandle, Point,
    RoleFilter, SessionEvent, Size, TreeLayout, ViewerConfig, ViewerSession, ViewportController,
    ViewportTransform,
};
pub use axtree_snapshot::{
    build_tree, focusable_links_and_buttons, AccessibilityNode, AccessibilityNodeRaw,
    AccessibilityTree, DuplicatePolicy, Snapshot, SnapshotError, TreeBuilder,
};
pub use fetch::{parse_snapshot_response, FetchError, SnapshotClient};

/// Install the stderr `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins; otherwise this crate logs at `info`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "axtree=info,axtree_core=info,axtree_snapshot=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

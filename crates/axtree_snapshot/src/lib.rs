//! Wire model and tree builder for browser accessibility snapshots.
//!
//! A snapshot arrives either as a flat, parent-referencing node list (the
//! DevTools `getFullAXTree` shape) or as an already nested root object (the
//! headless-driver `accessibility.snapshot()` shape). Both are normalised to
//! an [`AccessibilityTree`]: one rooted hierarchy plus the flat node list in
//! document order.
//!
//! ```text
//!   JSON payload
//!        │
//!        ▼
//!   Snapshot::from_json ──► Flat(Vec<AccessibilityNodeRaw>) ──► TreeBuilder ──┐
//!                       └─► Nested(NestedNode) ──────────► into_hierarchy ──┤
//!                                                                           ▼
//!                                                              AccessibilityTree
//! ```

pub mod builder;
pub mod error;
pub mod focusable;
pub mod model;
pub mod nested;
pub mod snapshot;

pub use builder::{build_tree, DuplicatePolicy, TreeBuilder};
pub use error::SnapshotError;
pub use focusable::{focusable_links_and_buttons, is_focusable};
pub use model::{AccessibilityNode, AccessibilityNodeRaw, LabeledValue, NodeProperty};
pub use nested::NestedNode;
pub use snapshot::{AccessibilityTree, Snapshot};

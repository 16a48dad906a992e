//! Viewer session - wires the engine together for a host UI.
//!
//! ```text
//!   AccessibilityTree ──► RoleFilter ──► LayoutEngine ──► TreeLayout
//!                                                           │
//!        query ──► (debounce) ──► search ──► HighlightSet   ├──► OverviewMap
//!                                   │                       │
//!                                   └─► (delay) auto-focus ─┴──► ViewportController
//!        NavigationPlayback ──► focus + flash ──────────────────┘
//! ```
//!
//! Everything runs on the host's frame loop: mutate through the methods, then
//! call [`ViewerSession::update`] once per frame and react to the returned
//! [`SessionEvent`]s. The session is the only holder of the
//! [`ViewportController`], so the transform has a single writer.

use axtree_snapshot::{
    focusable_links_and_buttons, AccessibilityNodeRaw, AccessibilityTree, SnapshotError, TreeBuilder,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::animation::Countdown;
use crate::config::ViewerConfig;
use crate::filter::RoleFilter;
use crate::geometry::{Point, Size};
use crate::layout::{LayoutEngine, TreeLayout};
use crate::minimap::{NavigateRequest, OverviewMap};
use crate::playback::{NavigationPlayback, PlaybackEvent, PlaybackHandle};
use crate::search::{normalize_query, search, HighlightSet};
use crate::viewport::{ViewportController, ViewportTransform};

/// Notifications for the host, returned from [`ViewerSession::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The debounced search ran.
    SearchUpdated { matches: usize },
    /// The viewport started moving to a node.
    Focused { node_id: String },
    /// Flash a node (playback step).
    HighlightNode { node_id: String },
    PlaybackFinished,
    PlaybackStopped,
}

/// One entry of the role checkbox list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleToggle {
    pub role: String,
    pub enabled: bool,
}

#[derive(Debug)]
pub struct ViewerSession {
    config: ViewerConfig,
    tree: AccessibilityTree,
    roles: Vec<RoleToggle>,
    /// Set by `set_only_roles`; wins over the toggles until one is touched.
    requested: Option<RoleFilter>,
    engine: LayoutEngine,
    layout: TreeLayout,
    overview: OverviewMap,
    viewport: ViewportController,

    query: String,
    pending_search: Option<Countdown>,
    highlights: HighlightSet,
    pending_focus: Option<(Countdown, String)>,

    playback: Option<NavigationPlayback>,
    flash: Option<(String, Countdown)>,
    selected: Option<String>,
}

impl ViewerSession {
    pub fn new(tree: AccessibilityTree, config: ViewerConfig) -> Self {
        let canvas = Size::new(config.canvas.width, config.canvas.height);
        let roles = tree
            .roles()
            .into_iter()
            .map(|role| RoleToggle {
                role,
                enabled: true,
            })
            .collect();
        let engine = LayoutEngine::new(config.layout);
        let mut session = Self {
            viewport: ViewportController::new(canvas, config.viewport),
            overview: OverviewMap::new(&TreeLayout::default(), canvas, &config.minimap),
            layout: TreeLayout::default(),
            engine,
            roles,
            requested: None,
            tree,
            config,
            query: String::new(),
            pending_search: None,
            highlights: HighlightSet::new(),
            pending_focus: None,
            playback: None,
            flash: None,
            selected: None,
        };
        session.relayout();
        session.viewport.fit_immediately(&session.layout);
        session
    }

    /// Decode a snapshot payload and open a session on it.
    pub fn from_json(json: &str, config: ViewerConfig) -> Result<Self, SnapshotError> {
        let builder = TreeBuilder::new().with_duplicate_policy(config.snapshot.duplicate_ids);
        let tree = AccessibilityTree::from_json(json, &builder)?;
        Ok(Self::new(tree, config))
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn tree(&self) -> &AccessibilityTree {
        &self.tree
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn overview(&self) -> &OverviewMap {
        &self.overview
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn transform(&self) -> ViewportTransform {
        self.viewport.transform()
    }

    pub fn canvas(&self) -> Size {
        self.viewport.canvas()
    }

    pub fn roles(&self) -> &[RoleToggle] {
        &self.roles
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_node(&self) -> Option<&AccessibilityNodeRaw> {
        self.selected.as_deref().and_then(|id| self.tree.get(id))
    }

    /// Node currently flashed by playback.
    pub fn flashing(&self) -> Option<&str> {
        self.flash.as_ref().map(|(id, _)| id.as_str())
    }

    /// False as soon as playback is stopped, even before the next frame
    /// delivers [`SessionEvent::PlaybackStopped`].
    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.is_done() && !p.handle().is_stopped())
    }

    /// True while anything time-based is pending; hosts keep repainting.
    pub fn is_active(&self) -> bool {
        self.viewport.is_animating()
            || self.pending_search.is_some()
            || self.pending_focus.is_some()
            || self.flash.is_some()
            || self.playback.is_some()
    }

    /// Kept-role set: the explicit request from `set_only_roles` if one is
    /// active, otherwise the enabled toggles. No enabled toggle means no
    /// constraint.
    pub fn role_filter(&self) -> RoleFilter {
        match &self.requested {
            Some(filter) => filter.clone(),
            None => RoleFilter::new(self.roles.iter().filter(|t| t.enabled).map(|t| t.role.as_str())),
        }
    }

    // =========================================================================
    // STRUCTURE CHANGES
    // =========================================================================

    fn relayout(&mut self) {
        let filter = self.role_filter();
        let view = filter.view(&self.tree.root);
        self.layout = self.engine.compute(&view, self.viewport.canvas());
        self.overview = OverviewMap::new(&self.layout, self.viewport.canvas(), &self.config.minimap);
    }

    /// New canvas size. Positions are recomputed; call `fit_to_screen` again
    /// to refit.
    pub fn set_canvas(&mut self, canvas: Size) {
        if canvas == self.viewport.canvas() {
            return;
        }
        debug!(width = canvas.width, height = canvas.height, "canvas resized");
        self.viewport.set_canvas(canvas);
        self.relayout();
    }

    pub fn set_role_enabled(&mut self, role: &str, enabled: bool) {
        let role = role.to_lowercase();
        let mut changed = self.requested.take().is_some();
        for toggle in self.roles.iter_mut().filter(|t| t.role == role) {
            changed |= toggle.enabled != enabled;
            toggle.enabled = enabled;
        }
        if changed {
            self.relayout();
        }
    }

    pub fn toggle_role(&mut self, role: &str) {
        let key = role.to_lowercase();
        if let Some(enabled) = self.roles.iter().find(|t| t.role == key).map(|t| t.enabled) {
            self.set_role_enabled(&key, !enabled);
        }
    }

    /// Keep exactly the listed roles, the same way `axtree layout --roles`
    /// does. Roles the tree lacks still count: a request matching nothing
    /// leaves only the root. An empty request clears the filter.
    pub fn set_only_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep = RoleFilter::new(roles);
        for toggle in &mut self.roles {
            toggle.enabled = keep.roles().contains(&toggle.role);
        }
        self.requested = (!keep.is_unconstrained()).then_some(keep);
        self.relayout();
    }

    /// Enable every toggle and drop any explicit request; the whole tree is
    /// shown.
    pub fn clear_role_filter(&mut self) {
        self.requested = None;
        for toggle in &mut self.roles {
            toggle.enabled = true;
        }
        self.relayout();
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Record a keystroke. Blank queries clear highlights at once; others
    /// are searched after the debounce delay.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        if normalize_query(&self.query).is_none() {
            self.pending_search = None;
            self.pending_focus = None;
            self.highlights = HighlightSet::new();
        } else {
            self.pending_search = Some(Countdown::from_ms(self.config.search.debounce_ms));
        }
    }

    /// Run the search now and schedule the auto-focus of the first match.
    pub fn search_now(&mut self) -> usize {
        self.pending_search = None;
        self.highlights = search(&self.tree.nodes, &self.query);
        self.pending_focus = self.highlights.first().map(|first| {
            (
                Countdown::from_ms(self.config.search.auto_focus_delay_ms),
                first.to_string(),
            )
        });
        self.highlights.len()
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    pub fn fit_to_screen(&mut self) -> Option<ViewportTransform> {
        self.viewport.fit_to_screen(&self.layout)
    }

    pub fn focus_node(&mut self, id: &str) -> bool {
        self.viewport.focus_node(&self.layout, id)
    }

    /// Consume a navigation request from the overview or any other control.
    pub fn navigate(&mut self, request: NavigateRequest) -> bool {
        self.focus_node(&request.node_id)
    }

    /// Activate an overview-local point.
    pub fn activate_overview(&mut self, local: Point) -> bool {
        let mut request = None;
        self.overview.activate(&self.layout, local, |r| request = Some(r));
        request.is_some_and(|r| self.navigate(r))
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.viewport.pan_by(dx, dy);
    }

    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        self.viewport.zoom_at(anchor, factor);
    }

    pub fn wheel(&mut self, anchor: Point, delta: f32) {
        self.viewport.wheel(anchor, delta);
    }

    // =========================================================================
    // SELECTION & PLAYBACK
    // =========================================================================

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    /// Start stepping through `targets`, stopping any earlier run.
    pub fn start_playback(&mut self, targets: Vec<String>) -> PlaybackHandle {
        self.stop_playback();
        let playback = NavigationPlayback::new(targets, self.config.playback.step_delay_ms);
        let handle = playback.handle();
        self.playback = Some(playback);
        handle
    }

    /// Play the focusable links and buttons in document order.
    pub fn start_keyboard_flow(&mut self) -> PlaybackHandle {
        let targets = focusable_links_and_buttons(&self.tree.root);
        info!(targets = targets.len(), "keyboard flow");
        self.start_playback(targets)
    }

    pub fn stop_playback(&mut self) {
        if let Some(playback) = &self.playback {
            playback.handle().stop();
        }
    }

    // =========================================================================
    // FRAME UPDATE
    // =========================================================================

    /// Advance timers and animations by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.pending_search.as_mut().is_some_and(|t| t.tick(dt)) {
            let matches = self.search_now();
            events.push(SessionEvent::SearchUpdated { matches });
        } else if let Some((timer, _)) = self.pending_focus.as_mut() {
            if timer.tick(dt) {
                if let Some((_, id)) = self.pending_focus.take() {
                    if self.focus_node(&id) {
                        events.push(SessionEvent::Focused { node_id: id });
                    }
                }
            }
        }

        if let Some(event) = self.playback.as_mut().and_then(|p| p.update(dt)) {
            match event {
                PlaybackEvent::Step { node_id, .. } => {
                    if self.focus_node(&node_id) {
                        events.push(SessionEvent::Focused {
                            node_id: node_id.clone(),
                        });
                    }
                    self.flash = Some((node_id.clone(), Countdown::from_ms(self.config.playback.flash_ms)));
                    events.push(SessionEvent::HighlightNode { node_id });
                }
                PlaybackEvent::Finished => {
                    self.playback = None;
                    events.push(SessionEvent::PlaybackFinished);
                }
                PlaybackEvent::Stopped => {
                    self.playback = None;
                    events.push(SessionEvent::PlaybackStopped);
                }
            }
        } else if self.flash.as_mut().is_some_and(|(_, t)| t.tick(dt)) {
            self.flash = None;
        }

        self.viewport.update(dt);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axtree_snapshot::{build_tree, LabeledValue};
    use pretty_assertions::assert_eq;

    fn session() -> ViewerSession {
        let focusable = || LabeledValue::tagged("booleanOrUndefined", true);
        let nodes = vec![
            AccessibilityNodeRaw::new("1").with_role("RootWebArea"),
            AccessibilityNodeRaw::new("2")
                .with_role("link")
                .with_name("Home")
                .with_parent("1")
                .with_property("focusable", focusable()),
            AccessibilityNodeRaw::new("3").with_role("generic").with_parent("1"),
            AccessibilityNodeRaw::new("4")
                .with_role("button")
                .with_name("Search")
                .with_parent("3")
                .with_property("focusable", focusable()),
        ];
        let root = build_tree(&nodes).unwrap();
        ViewerSession::new(AccessibilityTree { root, nodes }, ViewerConfig::default())
    }

    fn run(session: &mut ViewerSession, seconds: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let frames = (seconds * 60.0).round() as usize;
        for _ in 0..frames {
            events.extend(session.update(1.0 / 60.0));
        }
        events
    }

    #[test]
    fn opens_fitted_with_all_roles_enabled() {
        let session = session();
        assert_eq!(session.layout().len(), 4);
        assert!(session.roles().iter().all(|t| t.enabled));
        assert!(!session.viewport().is_animating());
        assert!(session.transform().scale <= 1.0);
    }

    #[test]
    fn unknown_requested_role_leaves_only_the_root() {
        let mut session = session();
        session.set_only_roles(["slider"]);
        let expected = RoleFilter::new(["slider"]).view(&session.tree().root);
        assert_eq!(expected.ids().collect::<Vec<_>>(), vec!["1"]);
        let ids: Vec<&str> = session.layout().nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["1"]);
        assert!(session.roles().iter().all(|t| !t.enabled));

        // Touching a toggle hands control back to the checkboxes.
        session.set_role_enabled("link", true);
        let ids: Vec<&str> = session.layout().nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn clearing_the_filter_shows_everything() {
        let mut session = session();
        session.set_only_roles(["slider"]);
        assert_eq!(session.layout().len(), 1);

        session.clear_role_filter();
        assert_eq!(session.layout().len(), 4);
        assert!(session.roles().iter().all(|t| t.enabled));
        assert!(session.role_filter().is_unconstrained());
    }

    #[test]
    fn disabling_every_toggle_is_no_constraint() {
        let mut session = session();
        let roles: Vec<String> = session.roles().iter().map(|t| t.role.clone()).collect();
        for role in &roles {
            session.set_role_enabled(role, false);
        }
        assert!(session.roles().iter().all(|t| !t.enabled));
        assert_eq!(session.layout().len(), 4);
    }

    #[test]
    fn toggling_roles_relayouts_but_keeps_transform() {
        let mut session = session();
        let before = session.transform();
        session.set_only_roles(["link"]);
        let ids: Vec<&str> = session.layout().nodes().iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(session.transform(), before);

        session.toggle_role("BUTTON");
        assert_eq!(session.layout().len(), 4);
    }

    #[test]
    fn debounced_search_then_auto_focus() {
        let mut session = session();
        session.set_query("hom");
        session.set_query("home");
        assert!(session.highlights().is_empty());

        let events = run(&mut session, 0.2);
        assert_eq!(events, vec![SessionEvent::SearchUpdated { matches: 1 }]);
        assert!(session.highlights().contains("2"));

        let events = run(&mut session, 0.35);
        assert_eq!(
            events,
            vec![SessionEvent::Focused {
                node_id: "2".into()
            }]
        );
        run(&mut session, 1.0);
        let center = session
            .transform()
            .apply(session.layout().position("2").unwrap());
        assert!((center.x - 600.0).abs() < 1e-2 && (center.y - 400.0).abs() < 1e-2);
    }

    #[test]
    fn blank_query_clears_immediately() {
        let mut session = session();
        session.set_query("home");
        session.search_now();
        assert_eq!(session.highlights().len(), 1);
        session.set_query("  ");
        assert!(session.highlights().is_empty());
        assert!(run(&mut session, 1.0).is_empty());
    }

    #[test]
    fn keyboard_flow_focuses_and_flashes_each_target() {
        let mut session = session();
        session.start_keyboard_flow();
        let events = run(&mut session, 2.0);
        let highlighted: Vec<&SessionEvent> = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::HighlightNode { .. }))
            .collect();
        assert_eq!(
            highlighted,
            vec![
                &SessionEvent::HighlightNode {
                    node_id: "2".into()
                },
                &SessionEvent::HighlightNode {
                    node_id: "4".into()
                },
            ]
        );
        assert_eq!(events.last(), Some(&SessionEvent::PlaybackFinished));
        assert!(!session.is_playing());
    }

    #[test]
    fn stopping_playback_is_immediate() {
        let mut session = session();
        session.start_keyboard_flow();
        session.update(0.0);
        assert!(session.is_playing());

        session.stop_playback();
        assert!(!session.is_playing());
        assert!(session.is_active());

        let events = session.update(1.0 / 60.0);
        assert_eq!(events, vec![SessionEvent::PlaybackStopped]);
        assert!(!session.is_playing());
        assert!(run(&mut session, 2.0)
            .iter()
            .all(|e| !matches!(e, SessionEvent::HighlightNode { .. })));
    }

    #[test]
    fn new_playback_supersedes_old() {
        let mut session = session();
        let first = session.start_playback(vec!["2".into(), "4".into()]);
        session.update(0.0);
        let second = session.start_playback(vec!["4".into()]);
        assert!(first.is_stopped());
        assert!(!second.is_stopped());
        let events = session.update(0.0);
        assert!(events.contains(&SessionEvent::HighlightNode {
            node_id: "4".into()
        }));
        assert_eq!(session.flashing(), Some("4"));
    }

    #[test]
    fn navigate_to_hidden_node_is_noop() {
        let mut session = session();
        session.set_only_roles(["link"]);
        let before = session.transform();
        assert!(!session.navigate(NavigateRequest {
            node_id: "4".into()
        }));
        run(&mut session, 1.0);
        assert_eq!(session.transform(), before);
    }

    #[test]
    fn overview_click_focuses_node() {
        let mut session = session();
        let local = session
            .overview()
            .projection()
            .project(session.layout().position("4").unwrap());
        assert!(session.activate_overview(local));
        assert_eq!(session.viewport().target().scale, 1.2);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = ViewerSession::from_json("[]", ViewerConfig::default()).unwrap_err();
        assert_eq!(err, SnapshotError::EmptyInput);
    }
}

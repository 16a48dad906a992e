//! Frame-driven session behaviour on a realistic page.

use axtree::fetch::parse_snapshot_response;
use axtree::{
    Point, SessionEvent, Size, TreeBuilder, ViewerConfig, ViewerSession, ViewportTransform,
};
use pretty_assertions::assert_eq;

const FRAME: f32 = 1.0 / 60.0;

fn page() -> ViewerSession {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/flat_page.json");
    let json = std::fs::read_to_string(path).unwrap();
    ViewerSession::from_json(&json, ViewerConfig::default()).unwrap()
}

fn run(session: &mut ViewerSession, seconds: f32) -> Vec<SessionEvent> {
    let frames = (seconds / FRAME).round() as usize;
    (0..frames).flat_map(|_| session.update(FRAME)).collect()
}

fn assert_centered(session: &ViewerSession, id: &str) {
    let world = session.layout().position(id).unwrap();
    let screen = session.transform().apply(world);
    let center = session.canvas().center();
    assert!(
        (screen.x - center.x).abs() < 0.01 && (screen.y - center.y).abs() < 0.01,
        "{id} lands at {screen:?}, not {center:?}"
    );
}

#[test]
fn opens_with_whole_tree_on_screen() {
    let session = page();
    let t = session.transform();
    let bounds = session.layout().bounds().unwrap();
    let canvas = session.canvas();

    assert!(t.scale <= 1.0);
    for corner in [bounds.min, bounds.max] {
        let p = t.apply(corner);
        assert!(p.x >= 0.0 && p.x <= canvas.width);
        assert!(p.y >= 0.0 && p.y <= canvas.height);
    }
}

#[test]
fn focus_animates_to_canvas_center() {
    let mut session = page();
    assert!(session.focus_node("9"));
    assert!(session.viewport().is_animating());

    run(&mut session, 1.0);
    assert!(!session.viewport().is_animating());
    assert!((session.transform().scale - 1.2).abs() < 1e-4);
    assert_centered(&session, "9");
}

#[test]
fn unknown_focus_target_changes_nothing() {
    let mut session = page();
    let before = session.transform();
    assert!(!session.focus_node("no-such-node"));
    assert!(!session.viewport().is_animating());
    assert_eq!(session.transform(), before);
}

#[test]
fn hidden_node_cannot_be_focused() {
    let mut session = page();
    session.set_only_roles(["link"]);
    assert!(session.layout().get("9").is_none());
    assert!(!session.focus_node("9"));
    assert!(session.focus_node("3"));
}

#[test]
fn search_highlights_then_auto_focuses_first_match() {
    let mut session = page();
    session.set_query("home");

    let events = run(&mut session, 0.2);
    assert_eq!(events, vec![SessionEvent::SearchUpdated { matches: 2 }]);
    assert_eq!(session.highlights().iter().collect::<Vec<_>>(), vec!["3", "6"]);

    let events = run(&mut session, 0.4);
    assert_eq!(
        events,
        vec![SessionEvent::Focused {
            node_id: "3".into()
        }]
    );

    run(&mut session, 1.0);
    assert_centered(&session, "3");
}

#[test]
fn clearing_the_query_cancels_pending_focus() {
    let mut session = page();
    session.set_query("sign");
    run(&mut session, 0.2);
    assert_eq!(session.highlights().len(), 1);

    session.set_query("");
    assert!(session.highlights().is_empty());
    assert!(run(&mut session, 1.0).is_empty());
}

#[test]
fn keyboard_flow_visits_links_and_buttons_in_order() {
    let mut session = page();
    session.start_keyboard_flow();
    assert!(session.is_playing());

    let events = run(&mut session, 3.0);
    let flashed: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::HighlightNode { node_id } => Some(node_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(flashed, vec!["3", "4", "9"]);
    assert_eq!(events.last(), Some(&SessionEvent::PlaybackFinished));
    assert!(!session.is_playing());
}

#[test]
fn stopping_playback_ends_the_run_early() {
    let mut session = page();
    let handle = session.start_keyboard_flow();
    let first = session.update(FRAME);
    assert!(first.contains(&SessionEvent::HighlightNode {
        node_id: "3".into()
    }));

    handle.stop();
    let rest = run(&mut session, 2.0);
    assert!(rest.contains(&SessionEvent::PlaybackStopped));
    assert!(!rest
        .iter()
        .any(|e| matches!(e, SessionEvent::HighlightNode { .. })));
}

#[test]
fn gestures_keep_the_anchor_fixed() {
    let mut session = page();
    session.set_canvas(Size::new(1000.0, 700.0));
    session.fit_to_screen();
    run(&mut session, 1.0);

    let anchor = Point::new(420.0, 310.0);
    let world = session.transform().invert(anchor);
    session.wheel(anchor, -240.0);
    let after = session.transform().apply(world);
    assert!((after.x - anchor.x).abs() < 0.01 && (after.y - anchor.y).abs() < 0.01);

    let before = session.transform();
    session.pan_by(25.0, -10.0);
    assert_eq!(
        session.transform(),
        ViewportTransform {
            translate_x: before.translate_x + 25.0,
            translate_y: before.translate_y - 10.0,
            scale: before.scale,
        }
    );
}

#[test]
fn fetched_nested_snapshot_opens_a_session() {
    let body = r#"{"role":"WebArea","name":"Shop","children":[
        {"role":"link","name":"Cart","focused":true},
        {"role":"button","name":"Buy"}
    ]}"#;
    let snapshot = parse_snapshot_response(200, body).unwrap();
    let tree = snapshot.into_tree(&TreeBuilder::new()).unwrap();
    let mut session = ViewerSession::new(tree, ViewerConfig::default());

    assert_eq!(session.layout().len(), 3);
    assert!(session.focus_node("0.1"));
}

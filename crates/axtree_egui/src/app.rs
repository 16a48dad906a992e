//! Viewer chrome: search box, role toggles, legend, inspector and overview
//! around the main [`TreeView`].

use axtree_core::{SessionEvent, ViewerSession};
use egui::{Color32, Key, RichText, ScrollArea};
use tracing::{debug, warn};

use crate::minimap::OverviewPanel;
use crate::style;
use crate::tree_view::TreeView;

/// Blocking error text shown in place of the tree.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub title: String,
    pub message: String,
}

pub struct ViewerApp {
    session: Option<ViewerSession>,
    failure: Option<LoadFailure>,
    query: String,
    tree_view: TreeView,
    overview: OverviewPanel,
    status: String,
}

impl ViewerApp {
    pub fn new(session: ViewerSession) -> Self {
        Self {
            session: Some(session),
            failure: None,
            query: String::new(),
            tree_view: TreeView::new(),
            overview: OverviewPanel,
            status: String::new(),
        }
    }

    /// App that only shows why the snapshot could not be opened.
    pub fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session: None,
            failure: Some(LoadFailure {
                title: title.into(),
                message: message.into(),
            }),
            query: String::new(),
            tree_view: TreeView::new(),
            overview: OverviewPanel,
            status: String::new(),
        }
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        self.session.as_ref()
    }

    /// Draw one frame.
    pub fn ui(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            let failure = self.failure.clone();
            egui::CentralPanel::default().show(ctx, |ui| {
                if let Some(failure) = failure {
                    ui.heading(RichText::new(failure.title).color(Color32::from_rgb(0xDC, 0x26, 0x26)));
                    ui.label(failure.message);
                }
            });
            return;
        };

        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        for event in session.update(dt) {
            match event {
                SessionEvent::SearchUpdated { matches } => {
                    self.status = format!("{matches} match(es)");
                }
                SessionEvent::PlaybackFinished => self.status = "keyboard flow finished".into(),
                SessionEvent::PlaybackStopped => self.status = "keyboard flow stopped".into(),
                other => debug!(?other, "session event"),
            }
        }

        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(Key::F)) {
                session.fit_to_screen();
            }
            if ctx.input(|i| i.key_pressed(Key::Escape)) {
                session.select(None);
                session.stop_playback();
            }
        }

        egui::SidePanel::right("axtree_side")
            .default_width(280.0)
            .show(ctx, |ui| {
                side_panel(ui, session, &mut self.query, &self.overview);
            });

        egui::TopBottomPanel::bottom("axtree_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let layout = session.layout();
                ui.label(format!(
                    "{} nodes · {} edges · zoom {:.0}%",
                    layout.len(),
                    layout.edges().len(),
                    session.transform().scale * 100.0
                ));
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let output = self.tree_view.show(ui, session);
                if let Some(clicked) = output.clicked {
                    session.select(clicked);
                }
            });

        if session.is_active() {
            ctx.request_repaint();
        }
    }
}

fn side_panel(ui: &mut egui::Ui, session: &mut ViewerSession, query: &mut String, overview: &OverviewPanel) {
    ui.heading("Accessibility tree");
    ui.add_space(4.0);

    let search = ui.add(egui::TextEdit::singleline(query).hint_text("Search role, name or id"));
    if search.changed() {
        session.set_query(query.clone());
    }
    if !session.highlights().is_empty() {
        ui.small(format!("{} highlighted", session.highlights().len()));
    }

    ui.horizontal(|ui| {
        if ui.button("Fit to screen").clicked() {
            session.fit_to_screen();
        }
        if session.is_playing() {
            if ui.button("Stop").clicked() {
                session.stop_playback();
            }
        } else if ui.button("Play keyboard flow").clicked() {
            session.start_keyboard_flow();
        }
    });

    ui.separator();
    ui.strong("Mini-map");
    ui.small("Click a node to center");
    let mut request = None;
    overview.show(ui, session, |r| request = Some(r));
    if let Some(request) = request {
        if !session.navigate(request) {
            warn!("overview target vanished before navigation");
        }
    }

    ui.separator();
    ui.horizontal(|ui| {
        ui.strong("Roles");
        // An empty role set is no constraint, so there is no "hide all".
        if ui
            .small_button("clear filter")
            .on_hover_text("Show every role")
            .clicked()
        {
            session.clear_role_filter();
        }
    });
    let mut toggled = None;
    ScrollArea::vertical()
        .id_salt("roles")
        .max_height(180.0)
        .show(ui, |ui| {
            for toggle in session.roles() {
                let mut enabled = toggle.enabled;
                let label = RichText::new(&toggle.role).color(style::role_color(&toggle.role));
                if ui.checkbox(&mut enabled, label).changed() {
                    toggled = Some((toggle.role.clone(), enabled));
                }
            }
        });
    if let Some((role, enabled)) = toggled {
        session.set_role_enabled(&role, enabled);
    }

    ui.separator();
    ui.strong("Legend");
    for (keyword, color) in style::ROLE_PALETTE {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 5.0, color);
            ui.label(keyword);
        });
    }

    ui.separator();
    ui.strong("Selected node");
    match session.selected_node() {
        Some(node) => {
            egui::Grid::new("inspector").num_columns(2).show(ui, |ui| {
                ui.label("id");
                ui.monospace(&node.id);
                ui.end_row();
                ui.label("role");
                ui.label(node.role_label());
                ui.end_row();
                ui.label("name");
                ui.label(node.name_label());
                ui.end_row();
            });
            let properties = serde_json::to_string_pretty(&node.properties).unwrap_or_default();
            ScrollArea::vertical()
                .id_salt("properties")
                .max_height(220.0)
                .show(ui, |ui| {
                    ui.monospace(properties);
                });
        }
        None => {
            ui.weak("Click a node to inspect it");
        }
    }
}

//! Native accessibility tree viewer.
//!
//! ```bash
//! axtree_viewer page.json
//! axtree_viewer --url https://example.com
//! ```
//!
//! Load failures do not abort: the window opens on the error text instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use tracing::{error, info};

use axtree::fetch::{SnapshotClient, DEFAULT_ENDPOINT, ENDPOINT_ENV};
use axtree::{global_config, ViewerConfig, ViewerSession};
use axtree_egui::ViewerApp;

#[derive(Parser)]
#[command(name = "axtree_viewer")]
#[command(about = "Explore a browser accessibility snapshot")]
struct Args {
    /// Snapshot file
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Capture this page through the snapshot endpoint instead
    #[arg(long)]
    url: Option<String>,

    /// Snapshot endpoint
    #[arg(long, env = ENDPOINT_ENV, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

struct AxTreeViewer {
    app: ViewerApp,
}

impl eframe::App for AxTreeViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.app.ui(ctx);
    }
}

fn main() -> eframe::Result<()> {
    let _ = dotenvy::dotenv();
    axtree::init_tracing();

    let args = Args::parse();
    let config = global_config().clone();
    let (title, app) = match (&args.file, &args.url) {
        (Some(path), _) => (path.display().to_string(), open_file(path, config)),
        (None, Some(url)) => (url.clone(), open_url(url, &args, config)),
        (None, None) => (
            "axtree".to_string(),
            ViewerApp::failed("No snapshot", "pass a snapshot file or --url"),
        ),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("axtree - {title}"))
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    info!(%title, "opening viewer");
    eframe::run_native(
        "axtree",
        native_options,
        Box::new(move |_cc| Ok(Box::new(AxTreeViewer { app }))),
    )
}

fn open_file(path: &Path, config: ViewerConfig) -> ViewerApp {
    let loaded = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .and_then(|json| Ok(ViewerSession::from_json(&json, config)?));
    match loaded {
        Ok(session) => ViewerApp::new(session),
        Err(e) => {
            error!(error = %format!("{e:#}"), "cannot open snapshot");
            ViewerApp::failed("Cannot open snapshot", format!("{e:#}"))
        }
    }
}

fn open_url(url: &str, args: &Args, config: ViewerConfig) -> ViewerApp {
    let fetched = SnapshotClient::new(&args.endpoint)
        .map(|client| client.with_timeout(Duration::from_secs(args.timeout)))
        .map_err(anyhow::Error::from)
        .and_then(|client| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("cannot start async runtime")?;
            Ok(runtime.block_on(client.fetch(url))?)
        });

    let session = fetched.and_then(|snapshot| {
        let builder = axtree::TreeBuilder::new()
            .with_duplicate_policy(config.snapshot.duplicate_ids);
        let tree = snapshot.into_tree(&builder)?;
        Ok(ViewerSession::new(tree, config))
    });

    match session {
        Ok(session) => ViewerApp::new(session),
        Err(e) => {
            error!(error = %format!("{e:#}"), "cannot fetch snapshot");
            ViewerApp::failed("Failed to fetch accessibility tree", format!("{e:#}"))
        }
    }
}

//! Accessibility tree CLI
//!
//! Inspect browser accessibility snapshots without opening the viewer.
//!
//! # Usage
//!
//! ```bash
//! # Outline of the tree, links and buttons only, three levels deep
//! axtree inspect page.json --roles link,button --depth 3
//!
//! # Identifiers whose role or name contains "submit"
//! axtree search page.json submit
//!
//! # Keyboard-flow order
//! axtree focusables page.json
//!
//! # Node positions, fit transform and overview scale as JSON
//! axtree layout page.json --width 1600 --height 900 -o json
//!
//! # Capture a live page through the snapshot endpoint
//! axtree fetch https://example.com --out page.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use axtree::fetch::{SnapshotClient, DEFAULT_ENDPOINT, ENDPOINT_ENV};
use axtree::{
    focusable_links_and_buttons, global_config, search, AccessibilityNode, AccessibilityTree,
    LayoutEngine, OverviewProjection, RoleFilter, Size, Snapshot, TreeBuilder, ViewerConfig,
};
use axtree_core::viewport::fit_transform;

#[derive(Parser)]
#[command(name = "axtree")]
#[command(version)]
#[command(about = "Inspect, search and lay out browser accessibility snapshots")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json, text, or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tree and print an indented outline
    Inspect {
        /// Snapshot file (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Keep only these roles (comma separated, case-insensitive)
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Maximum depth to print (root = 0)
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Print identifiers whose id, role or name contains the query
    Search {
        /// Snapshot file
        file: PathBuf,

        /// Case-insensitive substring
        query: String,
    },

    /// Print the keyboard-flow order (focusable links and buttons)
    Focusables {
        /// Snapshot file (reads stdin if not provided)
        file: Option<PathBuf>,
    },

    /// Compute the tidy-tree layout for a canvas size
    Layout {
        /// Snapshot file (reads stdin if not provided)
        file: Option<PathBuf>,

        /// Canvas width (defaults to the configured canvas)
        #[arg(long)]
        width: Option<f32>,

        /// Canvas height (defaults to the configured canvas)
        #[arg(long)]
        height: Option<f32>,

        /// Keep only these roles (comma separated, case-insensitive)
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },

    /// Capture a live page through the snapshot endpoint
    Fetch {
        /// Page to capture
        target: String,

        /// Snapshot endpoint
        #[arg(long, env = ENDPOINT_ENV, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Write the snapshot here instead of summarising it
        #[arg(long)]
        out: Option<PathBuf>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    axtree::init_tracing();

    let cli = Cli::parse();
    let config = global_config();

    let result = match cli.command {
        Commands::Inspect { file, roles, depth } => {
            cmd_inspect(file, &roles, depth, config, cli.format)
        }
        Commands::Search { file, query } => cmd_search(&file, &query, config, cli.format),
        Commands::Focusables { file } => cmd_focusables(file, config, cli.format),
        Commands::Layout {
            file,
            width,
            height,
            roles,
        } => cmd_layout(file, width, height, &roles, config, cli.format),
        Commands::Fetch {
            target,
            endpoint,
            out,
            timeout,
        } => cmd_fetch(&target, &endpoint, out, timeout, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_inspect(
    file: Option<PathBuf>,
    roles: &[String],
    depth: Option<usize>,
    config: &ViewerConfig,
    format: OutputFormat,
) -> Result<()> {
    let tree = load_tree(file.as_deref(), config)?;
    let root = if roles.is_empty() {
        tree.root.clone()
    } else {
        RoleFilter::new(roles).prune(&tree.root)
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&truncate(&root, depth))?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            let pretty = format == OutputFormat::Pretty;
            print_outline(&root, depth, pretty);
            if pretty {
                println!(
                    "\n{} {} node(s) shown, {} in snapshot",
                    "OK".green(),
                    count_within(&root, depth),
                    tree.nodes.len()
                );
            }
        }
    }
    Ok(())
}

fn cmd_search(
    file: &Path,
    query: &str,
    config: &ViewerConfig,
    format: OutputFormat,
) -> Result<()> {
    let tree = load_tree(Some(file), config)?;
    let matches = search(&tree.nodes, query);

    match format {
        OutputFormat::Json => {
            let ids: Vec<&str> = matches.iter().collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "query": query,
                    "matches": ids,
                }))?
            );
        }
        OutputFormat::Text => {
            for id in matches.iter() {
                println!("{id}");
            }
        }
        OutputFormat::Pretty => {
            for id in matches.iter() {
                match tree.get(id) {
                    Some(node) => println!(
                        "{}  {} {}",
                        id.cyan(),
                        node.role_label().dimmed(),
                        node.name_label()
                    ),
                    None => println!("{}", id.cyan()),
                }
            }
            println!("\n{} match(es) for {:?}", matches.len(), query);
        }
    }
    Ok(())
}

fn cmd_focusables(
    file: Option<PathBuf>,
    config: &ViewerConfig,
    format: OutputFormat,
) -> Result<()> {
    let tree = load_tree(file.as_deref(), config)?;
    let order = focusable_links_and_buttons(&tree.root);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&order)?),
        OutputFormat::Text => {
            for id in &order {
                println!("{id}");
            }
        }
        OutputFormat::Pretty => {
            for (step, id) in order.iter().enumerate() {
                let name = tree.get(id).map(|n| n.name_label()).unwrap_or_default();
                println!("  [{}] {} {}", step + 1, id.cyan(), name);
            }
            println!("\n{} focusable link(s)/button(s)", order.len());
        }
    }
    Ok(())
}

fn cmd_layout(
    file: Option<PathBuf>,
    width: Option<f32>,
    height: Option<f32>,
    roles: &[String],
    config: &ViewerConfig,
    format: OutputFormat,
) -> Result<()> {
    let tree = load_tree(file.as_deref(), config)?;
    let canvas = Size::new(
        width.unwrap_or(config.canvas.width),
        height.unwrap_or(config.canvas.height),
    );
    let filter = RoleFilter::new(roles);
    let visible = filter.view(&tree.root);
    let layout = LayoutEngine::new(config.layout).compute(&visible, canvas);
    let fit = layout
        .bounds()
        .map(|bounds| fit_transform(bounds, canvas, &config.viewport));
    let overview = OverviewProjection::for_layout(&layout, canvas, &config.minimap);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "canvas": canvas,
                    "layout": layout,
                    "fit": fit,
                    "overview": overview,
                }))?
            );
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            for node in layout.nodes() {
                println!(
                    "{:indent$}{} ({:.1}, {:.1})",
                    "",
                    node.id(),
                    node.position.x,
                    node.position.y,
                    indent = node.depth * 2
                );
            }
            println!();
            println!(
                "canvas {}x{}, {} node(s), {} edge(s)",
                canvas.width,
                canvas.height,
                layout.len(),
                layout.edges().len()
            );
            if let Some(fit) = fit {
                println!(
                    "fit: translate ({:.1}, {:.1}) scale {:.3}",
                    fit.translate_x, fit.translate_y, fit.scale
                );
            }
            println!(
                "overview: {}x{} scale {:.4}",
                overview.footprint.width, overview.footprint.height, overview.scale
            );
        }
    }
    Ok(())
}

fn cmd_fetch(
    target: &str,
    endpoint: &str,
    out: Option<PathBuf>,
    timeout: u64,
    format: OutputFormat,
) -> Result<()> {
    let client = SnapshotClient::new(endpoint)?.with_timeout(Duration::from_secs(timeout));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;
    let snapshot = runtime
        .block_on(client.fetch(target))
        .with_context(|| format!("fetching snapshot of {target}"))?;

    if let Some(path) = out {
        std::fs::write(&path, snapshot.to_json_pretty()?)
            .with_context(|| format!("writing {}", path.display()))?;
        if format != OutputFormat::Json {
            println!("{} saved snapshot to {}", "OK".green(), path.display());
        }
        return Ok(());
    }

    let flat = snapshot.is_flat();
    let tree = snapshot.into_tree(&builder(global_config()))?;
    let summary = serde_json::json!({
        "target": target,
        "shape": if flat { "flat" } else { "nested" },
        "nodes": tree.nodes.len(),
        "depth": tree.root.height(),
        "roles": tree.roles(),
        "focusables": focusable_links_and_buttons(&tree.root).len(),
    });
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text | OutputFormat::Pretty => {
            println!("{} {}", "OK".green(), target);
            println!("  shape:      {}", summary["shape"].as_str().unwrap_or_default());
            println!("  nodes:      {}", tree.nodes.len());
            println!("  depth:      {}", tree.root.height());
            println!("  roles:      {}", tree.roles().join(", "));
            println!("  focusables: {}", summary["focusables"]);
        }
    }
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn builder(config: &ViewerConfig) -> TreeBuilder {
    TreeBuilder::new().with_duplicate_policy(config.snapshot.duplicate_ids)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            Ok(buffer)
        }
    }
}

fn load_tree(file: Option<&Path>, config: &ViewerConfig) -> Result<AccessibilityTree> {
    let source = read_input(file)?;
    let tree = Snapshot::from_json(&source)?.into_tree(&builder(config))?;
    Ok(tree)
}

fn print_outline(root: &AccessibilityNode, max_depth: Option<usize>, pretty: bool) {
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let role = node.raw.role_label();
        let role = if role.is_empty() { "node".to_string() } else { role };
        let name = node.raw.name_label();
        let indent = "  ".repeat(depth);
        if pretty {
            let marker = if node.raw.ignored {
                " (ignored)".dimmed().to_string()
            } else {
                String::new()
            };
            println!(
                "{indent}{} {} {}{marker}",
                role.bold(),
                format!("{name:?}").green(),
                format!("#{}", node.id()).dimmed()
            );
        } else {
            println!("{indent}{role} {name:?} #{}", node.id());
        }

        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

fn count_within(root: &AccessibilityNode, max_depth: Option<usize>) -> usize {
    match max_depth {
        None => root.count(),
        Some(max) => truncate(root, Some(max)).count(),
    }
}

/// Copy of `root` cut below `max_depth`.
fn truncate(root: &AccessibilityNode, max_depth: Option<usize>) -> AccessibilityNode {
    fn cut(node: &AccessibilityNode, remaining: usize) -> AccessibilityNode {
        AccessibilityNode {
            raw: node.raw.clone(),
            children: match remaining {
                0 => Vec::new(),
                n => node.children.iter().map(|c| cut(c, n - 1)).collect(),
            },
        }
    }
    match max_depth {
        None => root.clone(),
        Some(max) => cut(root, max),
    }
}

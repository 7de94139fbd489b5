//! CLI binary for pdfmap.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ViewerConfig`, renders the view, and writes a PNG or JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfmap::compose::write_png;
use pdfmap::{
    render_view, MarkerAnchor, OverlayFile, PanZoom, ProgressCallback, ViewProgressCallback,
    ViewerConfig, ViewportSize,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the document loads, then a page bar while pages rasterise.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Loading");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ViewProgressCallback for CliProgressCallback {
    fn on_document_selected(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_loaded(&self, page_count: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(page_count as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rendering");
    }

    fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_view_complete(&self, page_count: usize, markers_drawn: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        let mark = if failed == 0 { green("✔") } else { cyan("⚠") };
        eprintln!(
            "{} {} pages, {} markers drawn{}",
            mark,
            bold(&page_count.to_string()),
            bold(&markers_drawn.to_string()),
            if failed > 0 {
                format!("  ({} pages blank)", red(&failed.to_string()))
            } else {
                String::new()
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render with the built-in example markers
  pdfmap plan.pdf -o plan.png

  # Markers and bounds from an overlay file
  pdfmap plan.pdf --overlay survey.json -o plan.png

  # Zoom 2x into a 1200x800 window, panned left
  pdfmap plan.pdf --viewport 1200x800 --zoom 2 --pan-x -300 -o zoomed.png

  # Placement data as JSON (no image written without -o)
  pdfmap plan.pdf --overlay survey.json --json

OVERLAY FILE:
  { "bounds": { "xmin": 2, "xmax": 12, "ymin": 3, "ymax": 23 },
    "markers": [ { "x": 11, "y": 5 }, { "x": 4, "y": 7 } ] }

  x grows to the right, y grows upward. Markers are placed on the stacked
  page content, so they scroll and zoom with the pages.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Override the log filter
"#;

/// Render a PDF with map-space markers overlaid.
#[derive(Parser, Debug)]
#[command(
    name = "pdfmap",
    version,
    about = "Render a PDF with map-space markers overlaid",
    long_about = "Render every page of a PDF into one stacked surface, project markers from a \
rectangular map coordinate space onto it, and write the view (optionally panned and zoomed) \
as PNG or describe it as JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to render.
    input: PathBuf,

    /// Write the view as PNG to this file.
    #[arg(short, long, env = "PDFMAP_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file with map bounds and markers.
    #[arg(long, env = "PDFMAP_OVERLAY")]
    overlay: Option<PathBuf>,

    /// Marker diameter in pixels (1–256).
    #[arg(long, env = "PDFMAP_MARKER_SIZE", default_value_t = 10)]
    marker_size: u32,

    /// Marker colour as RRGGBB or RRGGBBAA hex.
    #[arg(long, env = "PDFMAP_MARKER_COLOR", value_parser = parse_color)]
    marker_color: Option<[u8; 4]>,

    /// Which point of the marker sits on its projected position.
    #[arg(long, env = "PDFMAP_ANCHOR", value_enum, default_value = "top-left")]
    anchor: AnchorArg,

    /// Maximum rendered page height in pixels.
    #[arg(long, env = "PDFMAP_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Rendered page width in pixels.
    #[arg(long, env = "PDFMAP_PAGE_WIDTH", default_value_t = 800)]
    page_width: u32,

    /// Vertical gap between pages in pixels (0–1000).
    #[arg(long, env = "PDFMAP_PAGE_GAP", default_value_t = 8)]
    page_gap: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFMAP_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFMAP_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Viewport size as WxH. Defaults to the content size.
    #[arg(long, env = "PDFMAP_VIEWPORT", value_parser = parse_viewport)]
    viewport: Option<ViewportSize>,

    /// Zoom factor around the viewport origin.
    #[arg(long, env = "PDFMAP_ZOOM", default_value_t = 1.0)]
    zoom: f64,

    /// Horizontal pan in screen pixels.
    #[arg(long, env = "PDFMAP_PAN_X", default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f64,

    /// Vertical pan in screen pixels.
    #[arg(long, env = "PDFMAP_PAN_Y", default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f64,

    /// Print the view description as JSON on stdout.
    #[arg(long, env = "PDFMAP_JSON")]
    json: bool,

    /// Include the PNG as a data URI in the JSON output.
    #[arg(long, env = "PDFMAP_EMBED_IMAGE", requires = "json")]
    embed_image: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFMAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFMAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFMAP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum AnchorArg {
    TopLeft,
    Center,
}

impl From<AnchorArg> for MarkerAnchor {
    fn from(v: AnchorArg) -> Self {
        match v {
            AnchorArg::TopLeft => MarkerAnchor::TopLeft,
            AnchorArg::Center => MarkerAnchor::Center,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.output.is_none() && !cli.json {
        bail!("Nothing to do: pass -o <file.png> and/or --json");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ViewProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Render ───────────────────────────────────────────────────────────
    let mut output = render_view(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to render {}", cli.input.display()))?;

    if let Some(ref path) = cli.output {
        write_png(&output.image, path)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {}x{}  {}ms  →  {}",
                green("✔"),
                output.image.width(),
                output.image.height(),
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
    }

    if !cli.quiet {
        for e in &output.page_errors {
            eprintln!("  {} {}", red("✗"), dim(&e.to_string()));
        }
        let outside = output.placements.iter().filter(|p| !p.inside).count();
        if outside > 0 {
            eprintln!(
                "  {} {} marker(s) outside the map bounds",
                cyan("⚠"),
                outside
            );
        }
    }

    if cli.json {
        if cli.embed_image {
            output.embed_image().context("Failed to encode image")?;
        }
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `ViewerConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ViewerConfig> {
    let mut builder = ViewerConfig::builder()
        .marker_size(cli.marker_size)
        .marker_anchor(cli.anchor.clone().into())
        .page_width(cli.page_width)
        .max_rendered_pixels(cli.max_pixels)
        .page_gap(cli.page_gap)
        .pan_zoom(PanZoom::new(cli.zoom, cli.pan_x, cli.pan_y));

    if let Some(ref path) = cli.overlay {
        let overlay = OverlayFile::load(path)
            .await
            .with_context(|| format!("Failed to load overlay {}", path.display()))?;
        builder = builder.overlay(overlay);
    }
    if let Some(color) = cli.marker_color {
        builder = builder.marker_color(color);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(size) = cli.viewport {
        builder = builder.viewport(size);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `RRGGBB` or `RRGGBBAA`, with an optional leading `#`.
fn parse_color(s: &str) -> Result<[u8; 4], String> {
    let hex = s.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected RRGGBB or RRGGBBAA, got '{s}'"));
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok([byte(0)?, byte(2)?, byte(4)?, alpha])
}

/// Parse `WxH`, e.g. `1200x800`.
fn parse_viewport(s: &str) -> Result<ViewportSize, String> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("viewport must be non-empty, got '{s}'"));
    }
    Ok(ViewportSize { width, height })
}

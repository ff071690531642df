use clap::{Parser, Subcommand};
use rust_qr_scan::decode::decode_frame;
use rust_qr_scan::overlay::list_row;
use rust_qr_scan::tools::{load_rgba, parse_dimensions};
use rust_qr_scan::{
    CancelToken, CanvasOverlay, Extraction, ImageSequenceSource, RqrrDecoder, ScanLoop,
    ScannerConfig, VideoDimensions, Viewport, ViewportMapping, WindowConfig, viewport_channel,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "scantool", version, about = "RustQR Scan CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scan window for a viewport and video size
    Window {
        /// Viewport in CSS pixels, e.g. 390x844
        #[arg(long, value_parser = parse_dimensions)]
        viewport: (u32, u32),
        /// Native video size, e.g. 1920x1080
        #[arg(long, value_parser = parse_dimensions)]
        video: (u32, u32),
        #[arg(long, default_value_t = rust_qr_scan::mapper::DEFAULT_PERCENT_WIDE)]
        percent_wide: f32,
        #[arg(long, default_value_t = rust_qr_scan::mapper::DEFAULT_PERCENT_TALL)]
        percent_tall: f32,
    },
    /// Decode one image through the scan window
    Decode {
        #[arg(long)]
        image: PathBuf,
        /// Viewport the image is shown in; defaults to the image size
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Option<(u32, u32)>,
        /// Decode the whole image instead of the window
        #[arg(long)]
        full_frame: bool,
    },
    /// Run the scan loop over an image file or a directory of frames
    Scan {
        #[arg(long)]
        frames: PathBuf,
        #[arg(long, value_parser = parse_dimensions, default_value = "390x844")]
        viewport: (u32, u32),
        /// JSON scanner configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
        /// Override the delay between cycles
        #[arg(long)]
        delay_ms: Option<u64>,
        #[arg(long)]
        full_frame: bool,
        /// Write the final overlay as PNG
        #[arg(long)]
        overlay_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Honors RUST_LOG if present
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Window {
            viewport,
            video,
            percent_wide,
            percent_tall,
        } => window_cmd(
            viewport,
            video,
            WindowConfig {
                percent_wide,
                percent_tall,
            },
        ),
        Command::Decode {
            image,
            viewport,
            full_frame,
        } => decode_cmd(&image, viewport, full_frame),
        Command::Scan {
            frames,
            viewport,
            config,
            cycles,
            delay_ms,
            full_frame,
            overlay_out,
        } => {
            let settings = ScanSettings {
                config,
                cycles,
                delay_ms,
                full_frame,
            };
            scan_cmd(frames, viewport, settings, overlay_out.as_deref()).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "scantool failed");
            ExitCode::FAILURE
        }
    }
}

fn window_cmd(
    viewport: (u32, u32),
    video: (u32, u32),
    window: WindowConfig,
) -> rust_qr_scan::Result<()> {
    let viewport = Viewport::new(viewport.0 as f32, viewport.1 as f32);
    let mapping = ViewportMapping::compute(viewport, VideoDimensions::from(video), &window)?;
    let layout = mapping.layout();
    let (sx, sy) = mapping.scale();
    let css = mapping.css_window();
    let vid = mapping.video_window();
    let px = mapping.pixel_window();

    println!("Viewport: {}x{}  Video: {}x{}", viewport.width, viewport.height, video.0, video.1);
    println!(
        "Layout: offset=({:.1}, {:.1}) size={:.1}x{:.1} letterbox={:?}",
        layout.offset.x, layout.offset.y, layout.width, layout.height, layout.letterbox
    );
    println!("Scale: x={sx:.4} y={sy:.4}");
    println!(
        "CSS window:   left={:.1} top={:.1} {:.1}x{:.1}",
        css.left, css.top, css.width, css.height
    );
    println!(
        "Video window: left={:.1} top={:.1} {:.1}x{:.1}{}",
        vid.left,
        vid.top,
        vid.width,
        vid.height,
        if mapping.is_clipped() { " (clipped)" } else { "" }
    );
    println!("Pixel window: x={} y={} {}x{}", px.x, px.y, px.width, px.height);
    Ok(())
}

fn decode_cmd(
    image: &Path,
    viewport: Option<(u32, u32)>,
    full_frame: bool,
) -> rust_qr_scan::Result<()> {
    let frame = load_rgba(image)?;
    let video = VideoDimensions::new(frame.width(), frame.height());
    let (vw, vh) = viewport.unwrap_or((video.width, video.height));
    let mapping = ViewportMapping::compute(
        Viewport::new(vw as f32, vh as f32),
        video,
        &WindowConfig::default(),
    )?;
    let extraction = if full_frame {
        Extraction::FullFrame
    } else {
        Extraction::CropToWindow
    };

    let start = Instant::now();
    let (symbols, origin) = decode_frame(&frame, &mapping, extraction)?;
    let elapsed = start.elapsed();

    println!("Image: {} ({}x{})", image.display(), video.width, video.height);
    println!("Found {} symbols ({:.2?})", symbols.len(), elapsed);
    for (i, symbol) in symbols.iter().enumerate() {
        println!("  {}", list_row(i, symbol));
        let outline: Vec<String> = symbol
            .translated_polygon(origin)
            .iter()
            .map(|p| format!("({:.0}, {:.0})", p.x, p.y))
            .collect();
        println!("    outline: {}", outline.join(" "));
    }
    Ok(())
}

struct ScanSettings {
    config: Option<PathBuf>,
    cycles: Option<u64>,
    delay_ms: Option<u64>,
    full_frame: bool,
}

impl ScanSettings {
    fn resolve(&self) -> rust_qr_scan::Result<ScannerConfig> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::load(path)?,
            None if self.full_frame => ScannerConfig::full_frame(),
            None => ScannerConfig::cropped(),
        };
        if self.full_frame {
            config.extraction = Extraction::FullFrame;
        }
        if let Some(delay) = self.delay_ms {
            config.cycle_delay_ms = delay;
        }
        if self.cycles.is_some() {
            config.max_cycles = self.cycles;
        }
        config.validate()?;
        Ok(config)
    }
}

async fn scan_cmd(
    frames: PathBuf,
    viewport: (u32, u32),
    settings: ScanSettings,
    overlay_out: Option<&Path>,
) -> rust_qr_scan::Result<()> {
    let config = settings.resolve()?;
    let (_resize, viewport_rx) =
        viewport_channel(Viewport::new(viewport.0 as f32, viewport.1 as f32));
    let overlay = CanvasOverlay::new(config.style);
    let mut scan = ScanLoop::new(
        ImageSequenceSource::new(frames),
        RqrrDecoder::new(),
        overlay,
        viewport_rx,
        config,
    );

    let token = CancelToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping");
                token.cancel();
            }
        });
    }

    let result = scan.run(&token).await;
    if let Some(status) = scan.overlay().status() {
        println!("{status}");
    }
    let report = result?;

    println!(
        "Cycles: {}  Frames: {}  Symbols: {}  Remaps: {}",
        report.cycles, report.frames, report.symbols_seen, report.remaps
    );
    for row in scan.overlay().rows() {
        println!("  {row}");
    }

    if let Some(path) = overlay_out {
        match scan.overlay().composite() {
            Some(composite) => {
                composite.save(path)?;
                info!(path = %path.display(), "overlay written");
            }
            None => warn!(path = %path.display(), "no overlay drawn, nothing written"),
        }
    }
    Ok(())
}

//! Scan loop
//!
//! `Init → Running → (decode → render → wait)*`, ending in `Stopped` when the
//! token is cancelled or the cycle budget runs out, or in `Failed` on the
//! first error. A failed acquisition shows one message on the overlay and no
//! cycle ever runs. Nothing is retried.
//!
//! The delay is awaited after rendering, so the real period is decode time
//! plus render time plus the configured delay.

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::cancel::CancelToken;
use crate::config::ScannerConfig;
use crate::decode::{DecodeInvoker, SymbolDecoder};
use crate::error::{Result, ScanError};
use crate::mapper::ViewportMapping;
use crate::models::{VideoDimensions, Viewport};
use crate::overlay::OverlaySink;
use crate::source::{Frame, FrameSource};

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet run
    Init,
    /// Source acquired, cycles in progress
    Running,
    /// Ended through cancellation or the cycle budget
    Stopped,
    /// Ended by an error; carries its message
    Failed(String),
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Init => write!(f, "init"),
            LoopState::Running => write!(f, "running"),
            LoopState::Stopped => write!(f, "stopped"),
            LoopState::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Frames pulled from the source
    pub frames: u64,
    /// Completed decode and render cycles
    pub cycles: u64,
    /// Symbols rendered, summed over all cycles
    pub symbols_seen: u64,
    /// Times the mapping was (re)computed
    pub remaps: u64,
}

/// Channel carrying viewport sizes into a running loop
///
/// The loop picks up the latest value at the top of the next cycle; sizes
/// sent in between are coalesced.
pub fn viewport_channel(initial: Viewport) -> (watch::Sender<Viewport>, watch::Receiver<Viewport>) {
    watch::channel(initial)
}

/// Drives a frame source, a decoder and an overlay
pub struct ScanLoop<S, D, O> {
    source: S,
    invoker: DecodeInvoker<D>,
    overlay: O,
    config: ScannerConfig,
    viewport: watch::Receiver<Viewport>,
    mapping: Option<ViewportMapping>,
    state: LoopState,
}

impl<S, D, O> ScanLoop<S, D, O>
where
    S: FrameSource,
    D: SymbolDecoder,
    O: OverlaySink,
{
    /// Assemble a loop; nothing is acquired until `run`
    pub fn new(
        source: S,
        decoder: D,
        overlay: O,
        viewport: watch::Receiver<Viewport>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            source,
            invoker: DecodeInvoker::new(decoder, config.extraction),
            overlay,
            config,
            viewport,
            mapping: None,
            state: LoopState::Init,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Mapping in effect, once the first frame has arrived
    pub fn mapping(&self) -> Option<&ViewportMapping> {
        self.mapping.as_ref()
    }

    /// The overlay being drawn on
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// The frame source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The decode invoker
    pub fn invoker(&self) -> &DecodeInvoker<D> {
        &self.invoker
    }

    /// Configuration in use
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run until cancelled, out of cycles, or failed
    ///
    /// A loop that has already ended does not start again; it fails instead.
    pub async fn run(&mut self, token: &CancelToken) -> Result<ScanReport> {
        if self.state != LoopState::Init {
            return Err(ScanError::LoopEnded(self.state.to_string()));
        }
        let result = self.drive(token).await;
        self.state = match &result {
            Ok(report) => {
                info!(cycles = report.cycles, symbols = report.symbols_seen, "scan loop stopped");
                LoopState::Stopped
            }
            Err(err) => LoopState::Failed(err.to_string()),
        };
        result
    }

    async fn drive(&mut self, token: &CancelToken) -> Result<ScanReport> {
        self.config.validate()?;
        let mut report = ScanReport::default();

        if let Err(err) = self.source.open(&self.config.constraints).await {
            error!(%err, "cannot acquire frame source");
            self.overlay.show_error(&format!("Cannot get camera: {err}"))?;
            return Err(err.into());
        }

        // The first frame doubles as the metadata event.
        let mut frame = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(report),
            frame = self.source.next_frame() => frame?,
        };
        report.frames += 1;
        let mut mapping = self.remap(frame.dimensions(), &mut report)?;
        self.state = LoopState::Running;
        info!(
            video = ?mapping.video(),
            window = ?mapping.pixel_window(),
            extraction = ?self.invoker.extraction(),
            "scan loop running"
        );

        let delay = self.config.cycle_delay();
        loop {
            if token.is_cancelled() {
                break;
            }
            if self.needs_remap(&mapping, &frame) {
                mapping = self.remap(frame.dimensions(), &mut report)?;
            }

            let outcome = self.invoker.invoke(&frame, &mapping).await?;
            self.overlay.render(&outcome.symbols, outcome.origin())?;
            report.cycles += 1;
            report.symbols_seen += outcome.symbols.len() as u64;
            for symbol in &outcome.symbols {
                info!(kind = symbol.type_name(), value = symbol.decode(), "symbol decoded");
            }

            if self
                .config
                .max_cycles
                .is_some_and(|max| report.cycles >= max)
            {
                break;
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            frame = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                frame = self.source.next_frame() => frame?,
            };
            report.frames += 1;
        }
        Ok(report)
    }

    fn needs_remap(&self, mapping: &ViewportMapping, frame: &Frame) -> bool {
        // A closed sender means no more resizes, not an error.
        self.viewport.has_changed().unwrap_or(false) || mapping.video() != frame.dimensions()
    }

    fn remap(
        &mut self,
        video: VideoDimensions,
        report: &mut ScanReport,
    ) -> Result<ViewportMapping> {
        let viewport = *self.viewport.borrow_and_update();
        let mapping = ViewportMapping::compute(viewport, video, &self.config.window)?;
        self.overlay.show_scan_window(&mapping)?;
        debug!(
            ?viewport,
            ?video,
            window = ?mapping.pixel_window(),
            clipped = mapping.is_clipped(),
            "scan window mapped"
        );
        self.mapping = Some(mapping);
        report.remaps += 1;
        Ok(mapping)
    }
}

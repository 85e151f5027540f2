//! The frame-production engine.
//!
//! A dedicated worker thread owns the active layout and runs it at the
//! configured rate into whichever of two output buffers is not currently
//! exposed to the consumer. Controllers drive the worker over a rendezvous
//! request/reply mailbox; the consumer copies the latest completed frame
//! out at its own cadence, falling back to a pre-rendered splash frame
//! whenever the layout is unconfigured or has failed.
//!
//! ```text
//! controller ──(Stop; Set*; Run)──▶ worker ──▶ layout ──▶ back buffer
//!                                                             │ flip
//! consumer ◀──────────── copy_front_image ◀──────────── front buffer
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tracing::{debug, warn};

use crate::capture::CaptureProvider;
use crate::config::EngineConfig;
use crate::error::ImagingError;
use crate::image::FrameImage;
use crate::layout::{ComplexLayout, Layout, NativeLayout};
use crate::params::{LayoutParameter, MAX_LAYOUT_ELEMENTS};
use crate::splash::SplashScreen;

/// Frames between heartbeat log lines.
const HEARTBEAT_FRAMES: u64 = 300;

/// Requests understood by the engine worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    ResetLayout,
    SetNativeLayout,
    SetComplexLayout,
    Run,
    Stop,
    Exit,
}

/// Health of the installed layout.
///
/// Distinct from engine-fatal errors: a failed layout keeps the engine
/// alive and serving splash frames until a controller reconfigures it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutHealth {
    /// No layout configured (initial state, or after a reset).
    Unconfigured,
    /// The layout is producing frames.
    Ok,
    /// The layout failed; the first error is latched.
    Failed(ImagingError),
}

/// Which double buffer holds the most recent completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageIndex {
    Front,
    Back,
}

impl ImageIndex {
    fn other(self) -> Self {
        match self {
            ImageIndex::Front => ImageIndex::Back,
            ImageIndex::Back => ImageIndex::Front,
        }
    }

    fn as_usize(self) -> usize {
        match self {
            ImageIndex::Front => 0,
            ImageIndex::Back => 1,
        }
    }
}

/// State guarded by the worker lock.
struct EngineState {
    health: LayoutHealth,
    last_update: ImageIndex,
    element_count: usize,
    parameters: [LayoutParameter; MAX_LAYOUT_ELEMENTS],
}

struct Shared {
    state: Mutex<EngineState>,
    /// Front and back output buffers, each behind its own lock. The worker
    /// only ever locks the one `last_update` does not point at; the
    /// consumer only the one it does.
    images: [Mutex<FrameImage>; 2],
    /// Rendered once at init, read-only afterwards.
    splash: FrameImage,
}

type Reply = Sender<()>;

/// The double-buffered frame engine.
///
/// Controller methods may be called from any thread; `copy_front_image`
/// may run concurrently from the consumer thread.
pub struct Engine {
    config: EngineConfig,
    shared: Arc<Shared>,
    requests: Sender<(Request, Reply)>,
    worker: Option<JoinHandle<()>>,
    /// Latched when the worker becomes unreachable.
    fatal: Mutex<Option<ImagingError>>,
}

impl Engine {
    /// Create the output buffers, render the splash, and start the worker.
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn CaptureProvider>,
    ) -> Result<Self, ImagingError> {
        config.validate()?;
        let output = config.output_desc();
        let front = FrameImage::new(output)?;
        let back = FrameImage::new(output)?;
        let mut splash = FrameImage::new(output)?;
        SplashScreen::new(output)?.render(&mut splash)?;

        let shared = Arc::new(Shared {
            state: Mutex::new(EngineState {
                health: LayoutHealth::Unconfigured,
                last_update: ImageIndex::Front,
                element_count: 0,
                parameters: [LayoutParameter::default(); MAX_LAYOUT_ELEMENTS],
            }),
            images: [Mutex::new(front), Mutex::new(back)],
            splash,
        });

        let (requests, mailbox) = bounded(0);
        let worker = Worker {
            config,
            shared: Arc::clone(&shared),
            provider,
            mailbox,
            layout: None,
            frames: 0,
            dropped: 0,
        };
        let handle = thread::Builder::new()
            .name("imaging-engine".into())
            .spawn(move || worker.run())
            .map_err(|_| ImagingError::ThreadSpawn)?;

        let engine =
            Self { config, shared, requests, worker: Some(handle), fatal: Mutex::new(None) };
        engine.call(Request::ResetLayout)?;
        Ok(engine)
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Byte size of one output frame in the canonical layout.
    pub fn frame_size(&self) -> usize {
        self.shared.splash.byte_size()
    }

    pub fn layout_health(&self) -> LayoutHealth {
        lock(&self.shared.state).health
    }

    /// Send one request and block until the worker acknowledges it.
    pub fn call(&self, request: Request) -> Result<(), ImagingError> {
        if let Some(error) = *lock(&self.fatal) {
            return Err(error);
        }
        let (reply, acknowledged) = bounded(1);
        if self.requests.send((request, reply)).is_err() {
            return Err(self.worker_lost());
        }
        if acknowledged.recv().is_err() {
            return Err(self.worker_lost());
        }
        Ok(())
    }

    /// Stop the loop, drop the layout, and resume with splash fallback.
    pub fn reset_layout(&self) -> Result<(), ImagingError> {
        self.transition(Request::ResetLayout)
    }

    /// Stop the loop, install a native layout from staged parameters, and
    /// resume.
    pub fn set_native_layout(&self) -> Result<(), ImagingError> {
        self.transition(Request::SetNativeLayout)
    }

    /// Stop the loop, install a complex layout from staged parameters, and
    /// resume.
    pub fn set_complex_layout(&self) -> Result<(), ImagingError> {
        self.transition(Request::SetComplexLayout)
    }

    fn transition(&self, set: Request) -> Result<(), ImagingError> {
        self.call(Request::Stop)?;
        self.call(set)?;
        self.call(Request::Run)
    }

    /// Stage layout parameters for the next `set_*_layout` call.
    ///
    /// Never fails: invalid parameters surface as a layout error when the
    /// layout is installed. Incoming `bound.y` values are measured from the
    /// top of the output area; for a topdown output format they are
    /// normalized to the buffer's memory order here, and staged parameters
    /// hold normalized coordinates exclusively.
    pub fn set_layout_parameters(&self, parameters: &[LayoutParameter]) {
        let mut state = lock(&self.shared.state);
        state.element_count = parameters.len();
        for (slot, parameter) in state.parameters.iter_mut().zip(parameters) {
            let mut parameter = *parameter;
            if self.config.pixel_format.is_topdown() {
                parameter.bound.y = self.config.height as i32
                    - (parameter.bound.y + parameter.bound.height as i32);
            }
            *slot = parameter;
        }
    }

    /// Copy the latest ready frame (or the splash fallback) into `dst`.
    ///
    /// `dst` must be exactly one canonical output frame. After an
    /// engine-fatal error the destination is zeroed and the error returned.
    pub fn copy_front_image(&self, dst: &mut [u8]) -> Result<(), ImagingError> {
        if let Some(error) = *lock(&self.fatal) {
            dst.fill(0);
            return Err(error);
        }

        // Index snapshot and byte copy happen under one critical section so
        // a concurrent flip cannot tear the frame.
        let state = lock(&self.shared.state);
        match state.health {
            LayoutHealth::Ok => {
                let image = lock(&self.shared.images[state.last_update.as_usize()]);
                image.copy_packed(dst)
            }
            LayoutHealth::Unconfigured | LayoutHealth::Failed(_) => {
                self.shared.splash.copy_packed(dst)
            }
        }
    }

    fn worker_lost(&self) -> ImagingError {
        warn!("engine worker is unreachable; the engine must be rebuilt");
        *lock(&self.fatal) = Some(ImagingError::EngineDown);
        ImagingError::EngineDown
    }

    #[cfg(test)]
    fn staged_parameter(&self, index: usize) -> LayoutParameter {
        lock(&self.shared.state).parameters[index]
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.call(Request::Stop);
        let _ = self.call(Request::ResetLayout);
        let _ = self.call(Request::Exit);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Lock with poison recovery: a panicked holder cannot leave the pipeline
/// state half-written because every critical section only stores whole
/// values.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn ack(reply: &Reply) {
    let _ = reply.send(());
}

enum Flow {
    Continue,
    Exit,
}

/// Worker-thread side of the engine.
struct Worker {
    config: EngineConfig,
    shared: Arc<Shared>,
    provider: Arc<dyn CaptureProvider>,
    mailbox: Receiver<(Request, Reply)>,
    layout: Option<Layout>,
    frames: u64,
    dropped: u64,
}

impl Worker {
    fn run(mut self) {
        debug!("engine worker started");
        loop {
            let Ok((request, reply)) = self.mailbox.recv() else { break };
            if let Flow::Exit = self.dispatch(request, &reply) {
                break;
            }
        }
        debug!(frames = self.frames, dropped = self.dropped, "engine worker exiting");
    }

    fn dispatch(&mut self, request: Request, reply: &Reply) -> Flow {
        match request {
            Request::ResetLayout => {
                self.reset_layout();
                ack(reply);
                Flow::Continue
            }
            Request::SetNativeLayout => {
                self.set_native_layout();
                ack(reply);
                Flow::Continue
            }
            Request::SetComplexLayout => {
                self.set_complex_layout();
                ack(reply);
                Flow::Continue
            }
            Request::Run => {
                // Reply first; the controller must not block on the loop.
                ack(reply);
                self.frame_loop()
            }
            Request::Stop => {
                ack(reply);
                Flow::Continue
            }
            Request::Exit => {
                ack(reply);
                Flow::Exit
            }
        }
    }

    /// Produce frames until a `Stop` arrives, polling the mailbox during
    /// the inter-frame sleep.
    fn frame_loop(&mut self) -> Flow {
        let period = self.config.frame_period();
        let mut last = Instant::now();
        loop {
            self.update();

            let elapsed = last.elapsed();
            let wait = match period.checked_sub(elapsed) {
                Some(wait) => wait,
                None => {
                    // Over budget: no sleep, no catch-up skipping. The
                    // consumer simply keeps reading the older buffer.
                    self.dropped += 1;
                    metrics::counter!("imaging_engine_dropped_frames_total").increment(1);
                    debug!(
                        over_ms = (elapsed - period).as_millis() as u64,
                        "frame over budget"
                    );
                    Duration::ZERO
                }
            };

            match self.mailbox.recv_timeout(wait) {
                Ok((Request::Run, reply)) => ack(&reply),
                Ok((Request::Stop, reply)) => {
                    ack(&reply);
                    return Flow::Continue;
                }
                Ok((request, reply)) => {
                    if let Flow::Exit = self.dispatch(request, &reply) {
                        return Flow::Exit;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Flow::Exit,
            }
            last = Instant::now();
        }
    }

    /// Render one frame into the buffer the consumer is not reading, then
    /// flip `last_update` to it.
    fn update(&mut self) {
        let target = {
            let state = lock(&self.shared.state);
            if state.health != LayoutHealth::Ok {
                return;
            }
            state.last_update.other()
        };
        let Some(layout) = self.layout.as_mut() else {
            return;
        };

        let result = {
            let mut image = lock(&self.shared.images[target.as_usize()]);
            layout.run(&mut image)
        };
        match result {
            Ok(()) => {
                lock(&self.shared.state).last_update = target;
                self.frames += 1;
                metrics::counter!("imaging_engine_frames_total").increment(1);
                if self.frames % HEARTBEAT_FRAMES == 0 {
                    debug!(frames = self.frames, dropped = self.dropped, "frame heartbeat");
                }
            }
            Err(error) => {
                warn!(%error, "layout failed; serving splash until reconfigured");
                let mut state = lock(&self.shared.state);
                if state.health == LayoutHealth::Ok {
                    state.health = LayoutHealth::Failed(error);
                }
            }
        }
    }

    fn reset_layout(&mut self) {
        if self.layout.take().is_some() {
            debug!("layout dropped");
        }
        lock(&self.shared.state).health = LayoutHealth::Unconfigured;
    }

    fn staged(&self) -> (usize, [LayoutParameter; MAX_LAYOUT_ELEMENTS]) {
        let state = lock(&self.shared.state);
        (state.element_count, state.parameters)
    }

    fn set_native_layout(&mut self) {
        self.reset_layout();
        let (_, parameters) = self.staged();
        let result =
            NativeLayout::new(self.provider.as_ref(), self.config.output_desc(), parameters[0])
                .map(Layout::Native);
        self.install(result);
    }

    fn set_complex_layout(&mut self) {
        self.reset_layout();
        let (count, parameters) = self.staged();
        let result = if count == 0 || count > MAX_LAYOUT_ELEMENTS {
            Err(ImagingError::ElementCount(count))
        } else {
            ComplexLayout::new(
                self.provider.as_ref(),
                self.config.output_desc(),
                &parameters[..count],
            )
            .map(Layout::Complex)
        };
        self.install(result);
    }

    fn install(&mut self, result: Result<Layout, ImagingError>) {
        match result {
            Ok(layout) => {
                self.layout = Some(layout);
                // Clear both buffers so the consumer can never observe a
                // stale frame from a prior layout.
                for image in &self.shared.images {
                    lock(image).clear();
                }
                lock(&self.shared.state).health = LayoutHealth::Ok;
                debug!("layout installed");
            }
            Err(error) => {
                warn!(%error, "layout rejected");
                lock(&self.shared.state).health = LayoutHealth::Failed(error);
            }
        }
    }
}

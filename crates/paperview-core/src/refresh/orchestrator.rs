use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use image::GrayImage;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureError, CapturePipeline, build_target_url};
use crate::config::{ContentConfig, PaperviewConfig};
use crate::diagnostics::log_resource_snapshot;
use crate::display::{DisplayAdapter, DisplayState, PaintOutcome, PanelDevice};
use crate::errors::PaperviewError;
use crate::health::ContentProbe;
use crate::net::AddressSource;
use crate::refresh::retry::{Recoverable, RetryError, RetryPolicy, retry_with_recovery};
use crate::refresh::schedule::{RefreshKind, RefreshSchedule};
use crate::refresh::view::ViewToggle;
use crate::render::{BrowserLauncher, SessionManager};

/// Why a refresh cycle ended without painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The display was faulted or uninitialised and re-init failed.
    DisplayRecoveryFailed,
    /// Every capture attempt failed.
    CaptureExhausted { attempts: u32 },
    /// Shutdown arrived while waiting to retry a capture.
    Cancelled,
    /// The paint itself failed; the display is now faulted.
    DisplayFault,
}

/// Result of one decision pass or refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed {
        kind: RefreshKind,
        paint: PaintOutcome,
    },
    /// Nothing was due.
    Idle,
    /// The content source did not answer; `cleared` is true when this pass
    /// blanked the panel.
    SourceUnreachable { cleared: bool },
    Abandoned(AbandonReason),
    ShuttingDown,
}

/// Point-in-time view of the orchestrator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSnapshot {
    pub last_quick: Instant,
    pub last_full: Instant,
    pub display_state: DisplayState,
    pub has_reference_frame: bool,
    pub blanked: bool,
    pub has_session: bool,
    pub sessions_created: u64,
    pub session_invalidations: u64,
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_abandoned: u64,
}

/// Everything the refresh lock guards.
struct RefreshCore<L: BrowserLauncher, D: PanelDevice> {
    sessions: SessionManager<L>,
    display: DisplayAdapter<D>,
    pipeline: CapturePipeline,
    schedule: RefreshSchedule,
    view: ViewToggle,
    blanked: bool,
    cycles_started: u64,
    cycles_completed: u64,
    cycles_abandoned: u64,
}

/// One capture attempt; recovery invalidates the browser session.
struct CaptureAttempt<'a, L: BrowserLauncher> {
    pipeline: &'a CapturePipeline,
    sessions: &'a mut SessionManager<L>,
    url: &'a str,
}

impl<L: BrowserLauncher> Recoverable for CaptureAttempt<'_, L> {
    type Output = GrayImage;
    type Error = CaptureError;

    async fn attempt(&mut self, attempt: u32) -> Result<GrayImage, CaptureError> {
        debug!(event = "core.refresh.capture_attempt_started", attempt = attempt);
        self.pipeline.capture(self.sessions, self.url).await
    }

    async fn recover(&mut self, _error: &CaptureError) {
        self.sessions.invalidate().await;
    }
}

/// Decides when to refresh and serialises every access to the browser
/// session and the panel behind one FIFO lock.
///
/// The scheduler loop and external triggers share the same lock, so refresh
/// cycles reach the hardware strictly one at a time in the order their
/// callers queued.
pub struct RefreshOrchestrator<L, D, P, A>
where
    L: BrowserLauncher,
    D: PanelDevice,
    P: ContentProbe,
    A: AddressSource,
{
    core: Mutex<RefreshCore<L, D>>,
    probe: P,
    address: A,
    content: ContentConfig,
    retry: RetryPolicy,
    poll_interval: Duration,
    unreachable_wait: Duration,
    shutdown: CancellationToken,
    torn_down: AtomicBool,
}

impl<L, D, P, A> RefreshOrchestrator<L, D, P, A>
where
    L: BrowserLauncher,
    D: PanelDevice,
    P: ContentProbe,
    A: AddressSource,
{
    /// Build an orchestrator. The schedule starts now.
    pub fn new(
        config: &PaperviewConfig,
        launcher: L,
        panel: D,
        probe: P,
        address: A,
        shutdown: CancellationToken,
    ) -> Self {
        let start = Instant::now();
        let display = DisplayAdapter::new(panel, config.display.mode);
        let (width, height) = display.dimensions();

        let core = RefreshCore {
            sessions: SessionManager::new(launcher),
            display,
            pipeline: CapturePipeline::new(width, height, config.renderer.page_load_timeout()),
            schedule: RefreshSchedule::new(
                config.schedule.quick_interval(),
                config.schedule.full_interval(),
                start,
            ),
            view: ViewToggle::new(
                config.content.second_view,
                config.content.view_toggle_period(),
                start,
            ),
            blanked: false,
            cycles_started: 0,
            cycles_completed: 0,
            cycles_abandoned: 0,
        };

        Self {
            core: Mutex::new(core),
            probe,
            address,
            content: config.content.clone(),
            retry: RetryPolicy::from(&config.retry),
            poll_interval: config.schedule.poll_interval(),
            unreachable_wait: config.schedule.unreachable_wait(),
            shutdown,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Initialise and blank the panel. A failure leaves the display faulted;
    /// the next cycle retries the init.
    pub async fn initialize_display(&self) -> Result<(), crate::display::DisplayError> {
        let mut core = self.core.lock().await;
        core.display.init().await
    }

    /// One decision pass of the scheduler.
    ///
    /// Probes the content source outside the lock. When unreachable, blanks
    /// the panel on the first such pass only. When reachable, takes the lock
    /// and runs whatever refresh is due.
    pub async fn tick(&self) -> CycleOutcome {
        if self.shutdown.is_cancelled() {
            return CycleOutcome::ShuttingDown;
        }

        if !self.probe.is_reachable().await {
            let cleared = self.blank_once().await;
            return CycleOutcome::SourceUnreachable { cleared };
        }

        let mut core = self.core.lock().await;
        core.blanked = false;
        let now = Instant::now();
        match core.schedule.due(now) {
            Some(kind) => self.run_cycle(&mut core, kind, now).await,
            None => CycleOutcome::Idle,
        }
    }

    /// Run one full refresh now, queued behind any cycle in progress.
    pub async fn trigger_full_refresh(&self) -> CycleOutcome {
        info!(event = "core.refresh.trigger_received");
        if self.shutdown.is_cancelled() {
            return CycleOutcome::ShuttingDown;
        }
        let mut core = self.core.lock().await;
        let now = Instant::now();
        self.run_cycle(&mut core, RefreshKind::Full, now).await
    }

    /// Decision loop. Returns once shutdown is requested.
    pub async fn run_scheduler(&self) {
        info!(event = "core.refresh.scheduler_started");
        while !self.shutdown.is_cancelled() {
            let outcome = self.tick().await;
            let wait = match outcome {
                CycleOutcome::SourceUnreachable { .. } => {
                    warn!(
                        event = "core.refresh.source_unreachable",
                        wait_secs = self.unreachable_wait.as_secs(),
                    );
                    self.unreachable_wait
                }
                CycleOutcome::ShuttingDown => break,
                _ => self.poll_interval,
            };

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
        info!(event = "core.refresh.scheduler_stopped");
    }

    /// Stop everything: cancel the shutdown token, wait for any in-flight
    /// cycle, then blank and release the panel and close the browser.
    ///
    /// Runs exactly once; later or concurrent calls return `false` without
    /// doing anything.
    pub async fn teardown(&self) -> bool {
        if self
            .torn_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(event = "core.refresh.teardown_skipped");
            return false;
        }

        info!(event = "core.refresh.teardown_started");
        self.shutdown.cancel();

        let mut core = self.core.lock().await;
        log_resource_snapshot("teardown_start");
        if let Err(e) = core.display.shutdown().await {
            error!(
                event = "core.refresh.teardown_display_failed",
                error = %e,
                error_code = e.error_code(),
            );
        }
        core.sessions.close().await;
        log_resource_snapshot("teardown_end");
        info!(event = "core.refresh.teardown_completed");
        true
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let core = self.core.lock().await;
        OrchestratorSnapshot {
            last_quick: core.schedule.last_quick(),
            last_full: core.schedule.last_full(),
            display_state: core.display.state(),
            has_reference_frame: core.display.has_reference_frame(),
            blanked: core.blanked,
            has_session: core.sessions.has_session(),
            sessions_created: core.sessions.sessions_created(),
            session_invalidations: core.sessions.invalidation_count(),
            cycles_started: core.cycles_started,
            cycles_completed: core.cycles_completed,
            cycles_abandoned: core.cycles_abandoned,
        }
    }

    /// Blank the panel unless it already is. Returns true if a clear ran.
    async fn blank_once(&self) -> bool {
        let mut core = self.core.lock().await;
        if core.blanked || self.shutdown.is_cancelled() {
            return false;
        }
        core.blanked = true;

        info!(event = "core.refresh.blank_started");
        match core.display.clear().await {
            Ok(()) => info!(event = "core.refresh.blank_completed"),
            Err(e) => error!(
                event = "core.refresh.blank_failed",
                error = %e,
                error_code = e.error_code(),
            ),
        }
        true
    }

    async fn run_cycle(
        &self,
        core: &mut MutexGuard<'_, RefreshCore<L, D>>,
        kind: RefreshKind,
        now: Instant,
    ) -> CycleOutcome {
        if self.shutdown.is_cancelled() {
            return CycleOutcome::ShuttingDown;
        }

        core.cycles_started += 1;
        let cycle = core.cycles_started;
        info!(event = "core.refresh.cycle_started", cycle = cycle, kind = %kind);
        log_resource_snapshot("cycle_start");

        let outcome = self.execute_cycle(core, kind, now).await;
        match outcome {
            CycleOutcome::Completed { paint, .. } => {
                core.cycles_completed += 1;
                info!(
                    event = "core.refresh.cycle_completed",
                    cycle = cycle,
                    kind = %kind,
                    paint = ?paint,
                );
            }
            CycleOutcome::Abandoned(reason) => {
                core.cycles_abandoned += 1;
                error!(
                    event = "core.refresh.cycle_abandoned",
                    cycle = cycle,
                    kind = %kind,
                    reason = ?reason,
                );
            }
            _ => {}
        }
        log_resource_snapshot("cycle_end");
        outcome
    }

    async fn execute_cycle(
        &self,
        core: &mut RefreshCore<L, D>,
        kind: RefreshKind,
        now: Instant,
    ) -> CycleOutcome {
        if core.display.needs_recovery() {
            info!(
                event = "core.refresh.display_recovery_started",
                state = %core.display.state(),
            );
            if let Err(e) = core.display.init().await {
                error!(
                    event = "core.refresh.display_recovery_failed",
                    error = %e,
                    error_code = e.error_code(),
                );
                return CycleOutcome::Abandoned(AbandonReason::DisplayRecoveryFailed);
            }
        }

        let ip = self.address.local_address();
        let second_view = core.view.second_view(now);
        let url = build_target_url(&self.content, ip, second_view);

        let RefreshCore {
            sessions,
            pipeline,
            display,
            ..
        } = &mut *core;
        let mut attempt = CaptureAttempt {
            pipeline,
            sessions,
            url: &url,
        };
        let bitmap = match retry_with_recovery(self.retry, &mut attempt, &self.shutdown).await {
            Ok(bitmap) => bitmap,
            Err(RetryError::Exhausted { attempts, .. }) => {
                return CycleOutcome::Abandoned(AbandonReason::CaptureExhausted { attempts });
            }
            Err(RetryError::Cancelled { .. }) => {
                return CycleOutcome::Abandoned(AbandonReason::Cancelled);
            }
        };

        let painted = match kind {
            RefreshKind::Full => display.full_paint(&bitmap).await,
            RefreshKind::Partial => display.partial_paint(&bitmap).await,
        };
        drop(bitmap);

        let paint = match painted {
            Ok(paint) => paint,
            Err(_) => return CycleOutcome::Abandoned(AbandonReason::DisplayFault),
        };

        let recorded = if paint.was_full() {
            RefreshKind::Full
        } else {
            RefreshKind::Partial
        };
        core.schedule.record(recorded, now);
        core.blanked = false;

        CycleOutcome::Completed { kind, paint }
    }
}

//! Recording test doubles for the browser, panel and probe seams.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{GrayImage, ImageFormat, Luma};

use crate::config::PanelMode;
use crate::display::{DisplayError, FrameBuffer, PanelDevice, Rect};
use crate::health::ContentProbe;
use crate::render::{Browser, BrowserLauncher, RenderError};

pub fn gray_image(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

pub fn png_bytes(width: u32, height: u32, value: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    gray_image(width, height, value)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[derive(Default)]
struct ScriptState {
    next_id: u64,
    current_id: Option<u64>,
    dead_id: Option<u64>,
    launches: u32,
    quits: u32,
    shutdowns: u32,
    live: u32,
    max_live: u32,
    fail_launches: u32,
    fail_screenshots: u32,
    screenshots: u32,
    navigation_delay: Duration,
    active_navigations: u32,
    max_active_navigations: u32,
    navigations: Vec<String>,
}

/// Shared script and call log for [`FakeLauncher`] / [`FakeBrowser`].
///
/// Screenshots alternate between an all-white and an all-black 16x4 PNG so
/// consecutive captures always differ.
#[derive(Clone, Default)]
pub struct BrowserScript(Arc<Mutex<ScriptState>>);

impl BrowserScript {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut ScriptState) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }

    pub fn fail_next_launches(&self, n: u32) {
        self.with(|s| s.fail_launches = n);
    }

    pub fn fail_next_screenshots(&self, n: u32) {
        self.with(|s| s.fail_screenshots = n);
    }

    pub fn set_navigation_delay(&self, delay: Duration) {
        self.with(|s| s.navigation_delay = delay);
    }

    /// Make the current session fail its liveness probe.
    pub fn kill_current_session(&self) {
        self.with(|s| s.dead_id = s.current_id);
    }

    pub fn launches(&self) -> u32 {
        self.with(|s| s.launches)
    }

    pub fn quits(&self) -> u32 {
        self.with(|s| s.quits)
    }

    pub fn shutdowns(&self) -> u32 {
        self.with(|s| s.shutdowns)
    }

    pub fn max_live_sessions(&self) -> u32 {
        self.with(|s| s.max_live)
    }

    pub fn max_active_navigations(&self) -> u32 {
        self.with(|s| s.max_active_navigations)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.with(|s| s.navigations.clone())
    }
}

pub struct FakeBrowser {
    id: u64,
    script: BrowserScript,
}

impl Browser for FakeBrowser {
    async fn current_url(&self) -> Result<String, RenderError> {
        let dead = self.script.with(|s| s.dead_id == Some(self.id));
        if dead {
            Err(RenderError::SessionDead {
                message: "chrome not reachable".to_string(),
            })
        } else {
            Ok("about:blank".to_string())
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        let delay = self.script.with(|s| {
            s.navigations.push(url.to_string());
            s.active_navigations += 1;
            s.max_active_navigations = s.max_active_navigations.max(s.active_navigations);
            s.navigation_delay
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.script.with(|s| s.active_navigations -= 1);
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, RenderError> {
        let shade = self.script.with(|s| {
            if s.fail_screenshots > 0 {
                s.fail_screenshots -= 1;
                return None;
            }
            let shade = if s.screenshots % 2 == 0 { 255 } else { 0 };
            s.screenshots += 1;
            Some(shade)
        });
        match shade {
            Some(shade) => Ok(png_bytes(16, 4, shade)),
            None => Err(RenderError::ScreenshotFailed {
                message: "injected failure".to_string(),
            }),
        }
    }

    async fn quit(self) -> Result<(), RenderError> {
        self.script.with(|s| {
            s.quits += 1;
            s.live -= 1;
            if s.current_id == Some(self.id) {
                s.current_id = None;
            }
        });
        Ok(())
    }
}

pub struct FakeLauncher {
    script: BrowserScript,
}

impl FakeLauncher {
    pub fn new(script: BrowserScript) -> Self {
        Self { script }
    }
}

impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    async fn launch(&self) -> Result<FakeBrowser, RenderError> {
        let id = self.script.with(|s| {
            s.launches += 1;
            if s.fail_launches > 0 {
                s.fail_launches -= 1;
                return None;
            }
            s.next_id += 1;
            s.current_id = Some(s.next_id);
            s.live += 1;
            s.max_live = s.max_live.max(s.live);
            Some(s.next_id)
        });
        match id {
            Some(id) => Ok(FakeBrowser {
                id,
                script: self.script.clone(),
            }),
            None => Err(RenderError::SessionCreateFailed {
                message: "injected failure".to_string(),
            }),
        }
    }

    async fn shutdown(&self) {
        self.script.with(|s| s.shutdowns += 1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOp {
    Init(PanelMode),
    InitPartial,
    Clear,
    WriteFull,
    WritePartial(Rect, Vec<u8>),
    Sleep,
    Release,
}

struct PanelState {
    width: u32,
    height: u32,
    ops: Vec<PanelOp>,
    fail_next: u32,
}

/// Records every device call; can be told to fail the next N calls.
#[derive(Clone)]
pub struct FakePanel(Arc<Mutex<PanelState>>);

impl FakePanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self(Arc::new(Mutex::new(PanelState {
            width,
            height,
            ops: Vec::new(),
            fail_next: 0,
        })))
    }

    pub fn ops(&self) -> Vec<PanelOp> {
        self.0.lock().unwrap().ops.clone()
    }

    pub fn reset_ops(&self) {
        self.0.lock().unwrap().ops.clear();
    }

    pub fn fail_next_ops(&self, n: u32) {
        self.0.lock().unwrap().fail_next = n;
    }

    pub fn count(&self, op: &PanelOp) -> usize {
        self.0.lock().unwrap().ops.iter().filter(|o| *o == op).count()
    }

    pub fn position(&self, predicate: impl Fn(&PanelOp) -> bool) -> Option<usize> {
        self.0.lock().unwrap().ops.iter().position(predicate)
    }

    pub fn rposition(&self, predicate: impl Fn(&PanelOp) -> bool) -> Option<usize> {
        self.0.lock().unwrap().ops.iter().rposition(predicate)
    }

    fn record(&self, op: PanelOp) -> Result<(), DisplayError> {
        let mut state = self.0.lock().unwrap();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(DisplayError::Spi {
                message: "injected failure".to_string(),
            });
        }
        state.ops.push(op);
        Ok(())
    }
}

impl PanelDevice for FakePanel {
    fn width(&self) -> u32 {
        self.0.lock().unwrap().width
    }

    fn height(&self) -> u32 {
        self.0.lock().unwrap().height
    }

    fn init(&mut self, mode: PanelMode) -> Result<(), DisplayError> {
        self.record(PanelOp::Init(mode))
    }

    fn init_partial(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::InitPartial)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Clear)
    }

    fn write_full(&mut self, _frame: &FrameBuffer) -> Result<(), DisplayError> {
        self.record(PanelOp::WriteFull)
    }

    fn write_partial(&mut self, region: Rect, data: &[u8]) -> Result<(), DisplayError> {
        self.record(PanelOp::WritePartial(region, data.to_vec()))
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Sleep)
    }

    fn release(&mut self) -> Result<(), DisplayError> {
        self.record(PanelOp::Release)
    }
}

/// Probe with a switchable answer that counts its calls.
#[derive(Clone)]
pub struct FakeProbe {
    state: Arc<Mutex<(bool, u32)>>,
}

impl FakeProbe {
    pub fn reachable() -> Self {
        Self {
            state: Arc::new(Mutex::new((true, 0))),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().unwrap().0 = reachable;
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().1
    }
}

impl ContentProbe for FakeProbe {
    async fn is_reachable(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.1 += 1;
        state.0
    }
}

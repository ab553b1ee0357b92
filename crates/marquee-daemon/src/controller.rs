//! Refresh/animate state machine.
//!
//! ```text
//!   Resetting ── memory below floor ──────────────► Shutdown
//!       │
//!       ├── active status ── frame built ─────────► Animating
//!       │                                              │
//!       │                          tick: redraw ◄──────┤
//!       │                                              │
//!       ◄────────────── any label wrapped (no delay) ──┘
//!       │
//!       └── inactive / error ── retry delay ──► Resetting
//! ```
//!
//! The controller owns all mutable state. Each [`Controller::step`] performs
//! one transition and tells the caller which cadence to wait on, so the state
//! machine can be driven in tests without real sleeps.

use marquee_proto::error::{Error, Result};
use marquee_proto::marquee;
use marquee_proto::protocol::PlaybackStatus;
use tracing::{debug, info, warn};

use crate::display::{self, DisplayBackend, Palette};
use crate::frame::DisplayFrame;
use crate::memory::MemoryProbe;
use crate::scheduler::{Cadence, Scheduler};
use crate::status::StatusSource;
use crate::thumbnail::{Thumbnail, ThumbnailSource};
use crate::tokens::Credentials;

// ── state ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Resetting,
    Animating,
}

/// What the run loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Take the next step immediately.
    Continue,
    Sleep(Cadence),
    /// Display blanked; stop and let the supervisor restart the process.
    Shutdown,
}

/// Load the token pair and poll once. An `Unauthorized` answer earns exactly
/// one refresh and one more poll.
pub async fn fetch_status<C, S>(credentials: &C, status: &S) -> Result<PlaybackStatus>
where
    C: Credentials,
    S: StatusSource,
{
    let pair = credentials
        .load()
        .inspect_err(|e| warn!(component = "tokens", "{}", e))?;

    match status.poll(&pair.access_token).await {
        Err(e) if e.is_unauthorized() => {
            info!("access token expired");
            let pair = credentials
                .refresh(&pair)
                .await
                .inspect_err(|e| warn!(component = "tokens", "{}", e))?;
            status
                .poll(&pair.access_token)
                .await
                .inspect_err(|e| warn!(component = "status", "{}", e))
        }
        other => other.inspect_err(|e| warn!(component = "status", "{}", e)),
    }
}

pub struct Controller<C, S, T, D, M> {
    credentials: C,
    status: S,
    thumbnails: T,
    display: D,
    memory: M,

    state: State,
    setup: bool,
    /// Consecutive failed or idle cycles. Diagnostic only: every retry waits
    /// the same fixed delay.
    retry_count: u32,
    last_thumbnail_url: Option<String>,
    thumbnail: Thumbnail,
    placeholder: Thumbnail,
    frame: DisplayFrame,

    spacer: usize,
    palette: Palette,
    floor_kib: u64,
}

impl<C, S, T, D, M> Controller<C, S, T, D, M>
where
    C: Credentials,
    S: StatusSource,
    T: ThumbnailSource,
    D: DisplayBackend,
    M: MemoryProbe,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credentials: C,
        status: S,
        thumbnails: T,
        display: D,
        memory: M,
        placeholder: Thumbnail,
        spacer: usize,
        palette: Palette,
        floor_kib: u64,
    ) -> Self {
        Self {
            credentials,
            status,
            thumbnails,
            display,
            memory,
            state: State::Resetting,
            setup: false,
            retry_count: 0,
            last_thumbnail_url: None,
            thumbnail: placeholder.clone(),
            frame: DisplayFrame::idle(placeholder.clone()),
            placeholder,
            spacer,
            palette,
            floor_kib,
        }
    }

    /// Drive the state machine until memory pressure ends it.
    pub async fn run(&mut self, scheduler: &Scheduler) {
        loop {
            match self.step().await {
                Step::Continue => {}
                Step::Sleep(Cadence::Tick) => scheduler.sleep_until_next_tick().await,
                Step::Sleep(Cadence::Retry) => scheduler.sleep_until_next_retry().await,
                Step::Shutdown => return,
            }
        }
    }

    pub async fn step(&mut self) -> Step {
        match self.state {
            State::Resetting => self.reset().await,
            State::Animating => self.animate(),
        }
    }

    // ── Resetting ─────────────────────────────────────────────────────────────

    async fn reset(&mut self) -> Step {
        if let Some(err) = self.memory_pressure() {
            warn!(component = "memory", "{}", err);
            display::blank(&mut self.display, self.palette);
            self.present();
            return Step::Shutdown;
        }

        let status = match fetch_status(&self.credentials, &self.status).await {
            Ok(status) => status,
            Err(_) => {
                // No status means no image URL: the placeholder goes up and
                // the labels stay as they were.
                self.update_thumbnail(None).await;
                self.frame.thumbnail = self.thumbnail.clone();
                self.frame.alert = false;
                self.render();
                return self.retry();
            }
        };

        if !status.active {
            debug!("nothing playing");
            self.update_thumbnail(None).await;
            self.frame = DisplayFrame::idle(self.thumbnail.clone());
            self.render();
            return self.retry();
        }

        self.update_thumbnail(status.thumbnail_url.as_deref()).await;
        let text = marquee::format(
            status.primary_text.as_deref().unwrap_or_default(),
            &status.secondary_joined(),
            self.spacer,
        );
        debug!("now showing {:?} / {:?}", text.top, text.bottom);

        self.frame = DisplayFrame::new(text, self.thumbnail.clone()).with_alert(status.alert);
        self.setup = true;
        self.retry_count = 0;
        self.state = State::Animating;
        Step::Continue
    }

    fn retry(&mut self) -> Step {
        self.setup = false;
        self.retry_count += 1;
        self.state = State::Resetting;
        debug!("refresh cycle failed or idle, retry #{}", self.retry_count);
        Step::Sleep(Cadence::Retry)
    }

    fn memory_pressure(&self) -> Option<Error> {
        let available_kib = self.memory.available_kib()?;
        (available_kib < self.floor_kib).then_some(Error::MemoryPressure {
            available_kib,
            floor_kib: self.floor_kib,
        })
    }

    /// Fetch a new thumbnail only when the URL differs from the last one.
    /// An absent URL, or a failed fetch, shows the placeholder.
    async fn update_thumbnail(&mut self, url: Option<&str>) {
        if self.last_thumbnail_url.as_deref() == url {
            return;
        }
        self.thumbnail = match url {
            Some(url) => match self.thumbnails.fetch_and_decode(url).await {
                Ok(thumb) => thumb,
                Err(e) => {
                    warn!(component = "thumbnail", "{}", e);
                    self.placeholder.clone()
                }
            },
            None => self.placeholder.clone(),
        };
        self.last_thumbnail_url = url.map(str::to_string);
    }

    // ── Animating ─────────────────────────────────────────────────────────────

    fn animate(&mut self) -> Step {
        if !self.setup {
            self.state = State::Resetting;
            return Step::Sleep(Cadence::Retry);
        }
        if self.frame.advance() {
            self.state = State::Resetting;
            return Step::Continue;
        }
        self.render();
        Step::Sleep(Cadence::Tick)
    }

    fn render(&mut self) {
        display::render(&mut self.display, &self.frame, self.palette);
        self.present();
    }

    fn present(&mut self) {
        if let Err(e) = self.display.present() {
            warn!(component = "display", "{}", e);
        }
    }
}

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Info screen shared between the decoder loop and the once-per-second reporter.

use core::cell::RefCell;

use dcf77_core::clock::TimeOfDay;
use dcf77_core::diagnostics::info_screen::{SCREEN_LINES, ScreenLine};
use dcf77_core::diagnostics::{DiagnosticsSink, InfoScreen};
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::blocking_mutex::Mutex;

#[cfg(target_os = "none")]
type ScreenRawMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type ScreenRawMutex = NoopRawMutex;

pub type ScreenMutex = Mutex<ScreenRawMutex, RefCell<InfoScreen>>;

#[must_use]
pub const fn new_screen() -> ScreenMutex {
    Mutex::new(RefCell::new(InfoScreen::new()))
}

/// Diagnostics sink that forwards every notification into a shared screen.
#[derive(Copy, Clone)]
pub struct SharedScreen<'a> {
    screen: &'a ScreenMutex,
}

impl<'a> SharedScreen<'a> {
    pub const fn new(screen: &'a ScreenMutex) -> Self {
        Self { screen }
    }

    /// Advances the last-signal counter and renders the screen for `now`.
    pub fn tick(&self, now: TimeOfDay) -> [ScreenLine; SCREEN_LINES] {
        self.with(|screen| {
            screen.tick_second();
            screen.render(now)
        })
    }

    fn with<T>(&self, f: impl FnOnce(&mut InfoScreen) -> T) -> T {
        self.screen.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl DiagnosticsSink for SharedScreen<'_> {
    fn on_zero(&mut self, duration_ms: u16) {
        self.with(|screen| screen.on_zero(duration_ms));
    }

    fn on_one(&mut self, duration_ms: u16) {
        self.with(|screen| screen.on_one(duration_ms));
    }

    fn on_start(&mut self, duration_ms: u16) {
        self.with(|screen| screen.on_start(duration_ms));
    }

    fn on_invalid(&mut self, duration_ms: u16) {
        self.with(|screen| screen.on_invalid(duration_ms));
    }

    fn on_read_started(&mut self) {
        self.with(InfoScreen::on_read_started);
    }

    fn on_read_failed(&mut self) {
        self.with(InfoScreen::on_read_failed);
    }

    fn on_signal_committed(&mut self) {
        self.with(InfoScreen::on_signal_committed);
    }
}

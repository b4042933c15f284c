//! Application lifecycle context.
//!
//! Closing the overlay window hides it; only an explicit quit ends the
//! process. The owner of window-close handling holds an [`AppLifecycle`]
//! and asks it what a close request means.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Keep running, just get out of the way.
    Hide,
    Quit,
}

#[derive(Debug, Default)]
pub struct AppLifecycle {
    quitting: bool,
}

impl AppLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_quit(&mut self) {
        log::info!("Quit requested");
        self.quitting = true;
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn on_close_requested(&self) -> CloseAction {
        if self.quitting {
            CloseAction::Quit
        } else {
            CloseAction::Hide
        }
    }
}

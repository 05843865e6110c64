//! Terminal stand-ins for the window system and the status indicator.

use std::io::Write;

use cronobat_core::{Mode, OverlayError, OverlayHandle, OverlayHost, SessionBroadcast};

/// Prints interventions as banners on stdout.
#[derive(Debug)]
pub struct TerminalHost {
    overlay_permitted: bool,
    next_handle: u64,
}

impl TerminalHost {
    pub fn new(overlay_permitted: bool) -> Self {
        Self {
            overlay_permitted,
            next_handle: 0,
        }
    }
}

impl OverlayHost for TerminalHost {
    fn can_draw_overlay(&self) -> bool {
        self.overlay_permitted
    }

    fn show_overlay(&mut self, title: &str, text: &str) -> Result<OverlayHandle, OverlayError> {
        self.next_handle += 1;
        println!("\n[overlay] {title} | {text}");
        Ok(OverlayHandle(self.next_handle))
    }

    fn dismiss_overlay(&mut self, handle: OverlayHandle) -> Result<(), OverlayError> {
        tracing::debug!(handle = handle.0, "overlay dismissed");
        Ok(())
    }

    fn bring_app_to_front(&mut self) {
        println!("[focus] back to cronobat");
    }

    fn navigate_to_redirect(&mut self, title: &str, text: &str) {
        println!("\n[redirect] {title} | {text}");
    }

    fn close_redirect(&mut self) {
        tracing::debug!("redirect closed");
    }
}

/// Keeps a single status line up to date.
#[derive(Debug, Default)]
pub struct TerminalStatus {
    active: bool,
}

impl SessionBroadcast for TerminalStatus {
    fn start_session(&mut self, _mode: Mode, title: &str, text: &str, is_focus_active: bool) {
        let marker = if is_focus_active { "*" } else { " " };
        print!("\r{marker} {title}  {text}   ");
        if let Err(e) = std::io::stdout().flush() {
            tracing::debug!(error = %e, "failed to flush status line");
        }
        self.active = true;
    }

    fn stop_session(&mut self) {
        if self.active {
            println!();
            self.active = false;
        }
    }
}

use log::debug;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedSender;

use super::core::alerts::{FiredAlert, Notifier, Permission};
use super::core::scheduler::{SchedulerEvent, Toast, ToastLevel};

/// Surfaces fired alerts as toasts plus a terminal bell.
///
/// A terminal has no permission dialog, so the first request grants and
/// tells the user how to mute notifications.
pub struct TerminalNotifier {
    events: UnboundedSender<SchedulerEvent>,
    bell: bool,
}

impl TerminalNotifier {
    pub fn new(events: UnboundedSender<SchedulerEvent>) -> Self {
        Self { events, bell: true }
    }

    /// Without the bell, for when stdout is not a terminal.
    pub fn silent(events: UnboundedSender<SchedulerEvent>) -> Self {
        Self {
            events,
            bell: false,
        }
    }

    fn toast(&self, level: ToastLevel, message: String) {
        let _ = self.events.send(SchedulerEvent::Toast(Toast::new(level, message)));
    }
}

impl Notifier for TerminalNotifier {
    fn request_permission(&mut self) -> Permission {
        self.toast(
            ToastLevel::Info,
            "Alert notifications enabled, press n to mute".to_string(),
        );
        Permission::Granted
    }

    fn notify(&mut self, alert: &FiredAlert) {
        debug!("Notifying alert {}", alert.alert_id);
        self.toast(ToastLevel::Alert, alert.message());
        if self.bell {
            let mut out = io::stdout();
            let _ = out.write_all(b"\x07");
            let _ = out.flush();
        }
    }
}

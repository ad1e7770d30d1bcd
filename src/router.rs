// ── Appbar message router ─────────────────────────────────────────────────────
//
// Decides, one inbound window message at a time, whether the message is the
// shell's appbar callback and what to do about it.  No subscriptions and no
// hidden state beyond the armed message id, so tests drive it by feeding
// synthetic messages.
//
//   Unarmed ──arm(id)──▶ Armed(id)
//      ▲                    │
//      └─────disarm()───────┘

use tracing::{debug, info, trace, warn};

use crate::dock::{DockClient, MessageId, ShellHost};

// ── Notification codes ────────────────────────────────────────────────────────
//
// Carried in WPARAM of the callback message (shellapi.h `ABN_*`).

const ABN_STATECHANGE: usize = 0x0;
const ABN_POSCHANGED: usize = 0x1;
const ABN_FULLSCREENAPP: usize = 0x2;
const ABN_WINDOWARRANGE: usize = 0x3;

/// A decoded appbar callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    /// The taskbar's autohide or always-on-top state changed.
    StateChanged,
    /// Another bar or the monitor layout changed; our position may be stale.
    PositionChanged,
    /// A full-screen application opened (`true`) or closed (`false`).
    FullScreenApp(bool),
    /// The shell is cascading / tiling windows (`true` = starting).
    WindowArrange(bool),
    Unknown(usize),
}

impl Notification {
    pub(crate) fn decode(wparam: usize, lparam: isize) -> Self {
        match wparam {
            ABN_STATECHANGE => Self::StateChanged,
            ABN_POSCHANGED => Self::PositionChanged,
            ABN_FULLSCREENAPP => Self::FullScreenApp(lparam != 0),
            ABN_WINDOWARRANGE => Self::WindowArrange(lparam != 0),
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterState {
    Unarmed,
    Armed(MessageId),
}

/// Filters the bar window's messages for its appbar callback.
#[derive(Debug)]
pub(crate) struct MessageRouter {
    state: RouterState,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRouter {
    pub(crate) fn new() -> Self {
        Self {
            state: RouterState::Unarmed,
        }
    }

    /// Start recognising `id`.  Called right after a successful registration.
    pub(crate) fn arm(&mut self, id: MessageId) {
        debug!(message = id.0, "router armed");
        self.state = RouterState::Armed(id);
    }

    /// Stop recognising any callback.  Called on unregistration.
    pub(crate) fn disarm(&mut self) {
        if self.state != RouterState::Unarmed {
            debug!("router disarmed");
        }
        self.state = RouterState::Unarmed;
    }

    #[cfg(test)]
    pub(crate) fn armed_id(&self) -> Option<MessageId> {
        match self.state {
            RouterState::Armed(id) => Some(id),
            RouterState::Unarmed => None,
        }
    }

    /// Handle one inbound window message.
    ///
    /// Returns `true` only when `msg` is the armed callback id; every other
    /// message must continue to default processing.
    pub(crate) fn route<H: ShellHost>(
        &mut self,
        msg: u32,
        wparam: usize,
        lparam: isize,
        dock: &mut DockClient<H>,
    ) -> bool {
        let RouterState::Armed(id) = self.state else {
            return false;
        };
        if msg != id.0 {
            return false;
        }

        let notification = Notification::decode(wparam, lparam);
        trace!(?notification, "appbar callback");
        match notification {
            Notification::PositionChanged => reassert_if_drifted(dock),
            Notification::FullScreenApp(opening) => {
                // Step out of the way of full-screen apps, come back after.
                if let Err(e) = dock.set_topmost(!opening) {
                    warn!(error = %e, opening, "could not change bar z-order");
                }
            }
            Notification::StateChanged | Notification::WindowArrange(_) => {}
            Notification::Unknown(code) => debug!(code, "unknown appbar notification"),
        }
        true
    }
}

/// Reposition only when the live window left the last computed rectangle.
fn reassert_if_drifted<H: ShellHost>(dock: &mut DockClient<H>) {
    if !dock.has_drifted() {
        trace!("position notification without drift");
        return;
    }
    let (Some(handle), Some(edge), Some(thickness)) = (dock.handle(), dock.edge(), dock.thickness())
    else {
        return;
    };
    info!(%edge, "bar drifted; repositioning");
    if let Err(e) = dock.reposition(handle, thickness, edge) {
        warn!(error = %e, "reposition after shell notification failed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dock::fake::{FakeShell, HostCall, BAR_WINDOW},
        geometry::{Edge, Rect},
    };

    const WM_SIZE: u32 = 0x0005;

    fn armed() -> (MessageRouter, DockClient<FakeShell>) {
        let mut dock = DockClient::new(FakeShell::full_hd());
        let reg = dock.register(BAR_WINDOW, 40, Edge::Top).unwrap();
        let mut router = MessageRouter::new();
        router.arm(reg.message);
        (router, dock)
    }

    fn set_pos_calls(dock: &DockClient<FakeShell>) -> usize {
        dock.host().count(|c| matches!(c, HostCall::SetPos(_)))
    }

    #[test]
    fn unarmed_router_passes_everything_through() {
        let mut dock = DockClient::new(FakeShell::full_hd());
        let mut router = MessageRouter::new();

        assert!(!router.route(FakeShell::MESSAGE.0, ABN_POSCHANGED, 0, &mut dock));
        assert!(!router.route(WM_SIZE, 0, 0, &mut dock));
        assert!(dock.host().calls.is_empty());
    }

    #[test]
    fn non_matching_messages_are_never_handled() {
        let (mut router, mut dock) = armed();
        for msg in [WM_SIZE, 0x0001, FakeShell::MESSAGE.0 + 1, 0xFFFF] {
            assert!(!router.route(msg, ABN_POSCHANGED, 0, &mut dock), "{msg:#x}");
        }
    }

    #[test]
    fn every_matching_notification_is_handled() {
        let (mut router, mut dock) = armed();
        for code in [ABN_STATECHANGE, ABN_POSCHANGED, ABN_FULLSCREENAPP, ABN_WINDOWARRANGE, 42] {
            assert!(router.route(FakeShell::MESSAGE.0, code, 0, &mut dock));
        }
    }

    #[test]
    fn position_change_without_drift_does_not_touch_the_shell() {
        let (mut router, mut dock) = armed();
        let before = dock.host().calls.len();

        assert!(router.route(FakeShell::MESSAGE.0, ABN_POSCHANGED, 0, &mut dock));
        assert_eq!(dock.host().calls.len(), before);
        assert_eq!(dock.host().placements.len(), 1);
    }

    #[test]
    fn position_change_with_drift_repositions_once() {
        let (mut router, mut dock) = armed();
        dock.host_mut().nudge(BAR_WINDOW, 0, 17);
        let before = set_pos_calls(&dock);

        assert!(router.route(FakeShell::MESSAGE.0, ABN_POSCHANGED, 0, &mut dock));
        assert_eq!(set_pos_calls(&dock), before + 1);
        assert_eq!(dock.host().window_rect(BAR_WINDOW), Some(Rect::new(0, 0, 1920, 40)));
    }

    #[test]
    fn full_screen_app_drops_and_restores_topmost() {
        let (mut router, mut dock) = armed();

        router.route(FakeShell::MESSAGE.0, ABN_FULLSCREENAPP, 1, &mut dock);
        assert!(!dock.host().topmost);

        router.route(FakeShell::MESSAGE.0, ABN_FULLSCREENAPP, 0, &mut dock);
        assert!(dock.host().topmost);
    }

    #[test]
    fn disarm_returns_to_pass_through() {
        let (mut router, mut dock) = armed();
        router.disarm();

        assert_eq!(router.armed_id(), None);
        assert!(!router.route(FakeShell::MESSAGE.0, ABN_POSCHANGED, 0, &mut dock));
    }

    #[test]
    fn decode_maps_shell_codes() {
        assert_eq!(Notification::decode(0, 0), Notification::StateChanged);
        assert_eq!(Notification::decode(1, 0), Notification::PositionChanged);
        assert_eq!(Notification::decode(2, 1), Notification::FullScreenApp(true));
        assert_eq!(Notification::decode(3, 0), Notification::WindowArrange(false));
        assert_eq!(Notification::decode(9, 0), Notification::Unknown(9));
    }
}

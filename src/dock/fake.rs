// ── In-memory shell host for tests ────────────────────────────────────────────
//
// Models one monitor, the bar window, other application bars that already hold
// reservations, and the shell's position negotiation.  Every dock-service call
// is recorded in `calls`; every window move in `placements`.

use std::collections::HashMap;

use crate::{
    error::{LedgeError, RegistrationError, Result},
    geometry::{Edge, MonitorWorkArea, Rect},
};

use super::{MessageId, ShellHost, WindowId};

/// The window id the fake treats as the bar window.
pub(crate) const BAR_WINDOW: WindowId = WindowId(0x1000);

/// A dock-service call as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostCall {
    New,
    QueryPos(Rect),
    SetPos(Rect),
    Remove,
    Activate,
    WindowPosChanged,
}

pub(crate) struct FakeShell {
    pub(crate) monitor: Rect,
    /// Reservations held by other bars: (edge, thickness).
    pub(crate) others: Vec<(Edge, i32)>,
    pub(crate) windows: HashMap<WindowId, Rect>,
    pub(crate) service_available: bool,
    pub(crate) registered: bool,
    pub(crate) reservation: Option<Rect>,
    pub(crate) topmost: bool,
    pub(crate) calls: Vec<HostCall>,
    pub(crate) placements: Vec<(WindowId, Rect)>,
}

impl FakeShell {
    pub(crate) const MESSAGE: MessageId = MessageId(0xC123);

    /// A 1920×1080 monitor at the origin with the bar window floating on it.
    pub(crate) fn full_hd() -> Self {
        let mut windows = HashMap::new();
        windows.insert(BAR_WINDOW, Rect::new(100, 100, 900, 128));
        Self {
            monitor: Rect::new(0, 0, 1920, 1080),
            others: Vec::new(),
            windows,
            service_available: true,
            registered: false,
            reservation: None,
            topmost: true,
            calls: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Number of recorded calls matching `pred`.
    pub(crate) fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Move a window behind the dock client's back.
    pub(crate) fn nudge(&mut self, window: WindowId, dx: i32, dy: i32) {
        if let Some(r) = self.windows.get_mut(&window) {
            *r = Rect::new(r.left + dx, r.top + dy, r.right + dx, r.bottom + dy);
        }
    }

    /// Combined thickness of other bars on `edge`.
    fn reserved(&self, edge: Edge) -> i32 {
        self.others
            .iter()
            .filter(|(e, _)| *e == edge)
            .map(|(_, t)| t)
            .sum()
    }

    /// Shrink `r` by every other bar's reservation.
    fn without_others(&self, mut r: Rect) -> Rect {
        r.top += self.reserved(Edge::Top);
        r.bottom -= self.reserved(Edge::Bottom);
        r.left += self.reserved(Edge::Left);
        r.right -= self.reserved(Edge::Right);
        r
    }
}

impl ShellHost for FakeShell {
    fn is_window(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn work_area(&self, _window: WindowId) -> Result<MonitorWorkArea> {
        let mut work = self.without_others(self.monitor);
        if let Some(own) = self.reservation {
            if own.top == work.top && own.width() == work.width() {
                work.top = own.bottom;
            } else if own.bottom == work.bottom && own.width() == work.width() {
                work.bottom = own.top;
            }
        }
        Ok(MonitorWorkArea {
            monitor: self.monitor,
            work,
        })
    }

    fn window_rect(&self, window: WindowId) -> Option<Rect> {
        self.windows.get(&window).copied()
    }

    fn place_window(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        let Some(slot) = self.windows.get_mut(&window) else {
            return Err(LedgeError::Win32 {
                function: "SetWindowPos",
                code: 1400, // ERROR_INVALID_WINDOW_HANDLE
            });
        };
        *slot = rect;
        self.placements.push((window, rect));
        Ok(())
    }

    fn set_topmost(&mut self, _window: WindowId, topmost: bool) -> Result<()> {
        self.topmost = topmost;
        Ok(())
    }

    fn new_bar(&mut self, _window: WindowId) -> std::result::Result<MessageId, RegistrationError> {
        if !self.service_available {
            return Err(RegistrationError::ServiceUnavailable);
        }
        self.calls.push(HostCall::New);
        self.registered = true;
        Ok(Self::MESSAGE)
    }

    fn query_pos(&mut self, _window: WindowId, edge: Edge, proposed: Rect) -> Rect {
        self.calls.push(HostCall::QueryPos(proposed));
        let free = self.without_others(self.monitor);
        let mut r = proposed;
        match edge {
            Edge::Top => r.top = r.top.max(free.top),
            Edge::Bottom => r.bottom = r.bottom.min(free.bottom),
            Edge::Left => r.left = r.left.max(free.left),
            Edge::Right => r.right = r.right.min(free.right),
        }
        r
    }

    fn set_pos(&mut self, _window: WindowId, _edge: Edge, proposed: Rect) -> Rect {
        self.calls.push(HostCall::SetPos(proposed));
        self.reservation = Some(proposed);
        proposed
    }

    fn remove_bar(&mut self, _window: WindowId) {
        self.calls.push(HostCall::Remove);
        self.registered = false;
        self.reservation = None;
    }

    fn activate(&mut self, _window: WindowId) {
        self.calls.push(HostCall::Activate);
    }

    fn window_pos_changed(&mut self, _window: WindowId) {
        self.calls.push(HostCall::WindowPosChanged);
    }
}

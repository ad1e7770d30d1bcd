// ── Dock registry client ──────────────────────────────────────────────────────
//
// Owns the bar's application-bar registration with the shell.  All shell and
// window-system access goes through the injected `ShellHost`; the production
// implementation lives in `platform::win32::appbar`, the test double in
// `dock::fake`.
//
// Registration protocol (mirrors the shell's appbar contract):
//   1. new      – the shell records the window and its callback message id
//   2. querypos – propose a rect; the shell moves it off other bars
//   3. setpos   – commit the (re-fitted) rect as this bar's reservation
//   4. place    – move the window itself onto the reserved rect
//   5. remove   – release the reservation; the work area is restored
//
// Everything runs on the UI thread; no locking.

#[cfg(test)]
pub(crate) mod fake;

use tracing::{debug, info};

use crate::{
    error::{LedgeError, RegistrationError, Result},
    geometry::{self, Edge, MonitorWorkArea, Rect},
};

// ── Identity types ────────────────────────────────────────────────────────────

/// Platform-neutral window handle.  `0` never names a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WindowId(pub(crate) isize);

impl WindowId {
    pub(crate) fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Callback message number the shell uses to notify this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MessageId(pub(crate) u32);

/// Proof of a live registration.  A new handle is issued on every
/// registration cycle, so a handle kept across `unregister` goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BarHandle {
    window: WindowId,
    serial: u32,
}

/// Result of a successful `register` / `redock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Registration {
    pub(crate) handle: BarHandle,
    pub(crate) message: MessageId,
    pub(crate) rect: Rect,
}

// ── Host seam ─────────────────────────────────────────────────────────────────

/// The shell's dock-coordination service plus the window-system calls the
/// dock client needs.  Calls are synchronous and must not retry internally.
pub(crate) trait ShellHost {
    // ── Window system ─────────────────────────────────────────────────────────

    /// `true` if `window` currently names a live top-level window.
    fn is_window(&self, window: WindowId) -> bool;

    /// The monitor owning `window`, queried fresh on every call.
    fn work_area(&self, window: WindowId) -> Result<MonitorWorkArea>;

    /// The window's current screen rectangle.
    fn window_rect(&self, window: WindowId) -> Option<Rect>;

    /// Move and resize `window` to `rect`.
    fn place_window(&mut self, window: WindowId, rect: Rect) -> Result<()>;

    /// Raise the window to (or drop it out of) the topmost band.
    fn set_topmost(&mut self, window: WindowId, topmost: bool) -> Result<()>;

    // ── Dock service ──────────────────────────────────────────────────────────

    /// Register `window` as an application bar and return its callback id.
    fn new_bar(&mut self, window: WindowId) -> std::result::Result<MessageId, RegistrationError>;

    /// Ask the shell to adjust `proposed` so it does not overlap other bars.
    fn query_pos(&mut self, window: WindowId, edge: Edge, proposed: Rect) -> Rect;

    /// Commit `proposed` as this bar's reservation; returns the granted rect.
    fn set_pos(&mut self, window: WindowId, edge: Edge, proposed: Rect) -> Rect;

    /// Release the reservation.
    fn remove_bar(&mut self, window: WindowId);

    /// Tell the shell the bar window was activated.
    fn activate(&mut self, window: WindowId);

    /// Tell the shell the bar window moved or changed z-order.
    fn window_pos_changed(&mut self, window: WindowId);
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct LiveBar {
    handle: BarHandle,
    message: MessageId,
    edge: Edge,
    thickness: i32,
    rect: Rect,
}

/// Owner of the (at most one) live registration for the bar window.
pub(crate) struct DockClient<H: ShellHost> {
    host: H,
    live: Option<LiveBar>,
    serial: u32,
}

impl<H: ShellHost> DockClient<H> {
    pub(crate) fn new(host: H) -> Self {
        Self {
            host,
            live: None,
            serial: 0,
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Reserve `edge` of the window's monitor for a bar of `thickness`.
    ///
    /// On success the window has been moved onto the granted rectangle.  On
    /// failure nothing is left registered with the shell.
    pub(crate) fn register(
        &mut self,
        window: WindowId,
        thickness: i32,
        edge: Edge,
    ) -> Result<Registration> {
        if self.live.is_some() {
            return Err(RegistrationError::AlreadyRegistered.into());
        }
        if window.is_null() || !self.host.is_window(window) {
            return Err(RegistrationError::InvalidWindow.into());
        }

        let message = self.host.new_bar(window)?;
        debug!(?window, message = message.0, "shell accepted appbar");

        let placed = self
            .negotiate(window, edge, thickness)
            .and_then(|rect| self.place(window, rect).map(|_| rect));
        let rect = match placed {
            Ok(rect) => rect,
            Err(e) => {
                // Never leave a reservation without a positioned bar.
                self.host.remove_bar(window);
                return Err(e);
            }
        };

        self.serial = self.serial.wrapping_add(1);
        let handle = BarHandle {
            window,
            serial: self.serial,
        };
        self.live = Some(LiveBar {
            handle,
            message,
            edge,
            thickness,
            rect,
        });
        info!(%edge, thickness, %rect, "appbar registered");

        Ok(Registration {
            handle,
            message,
            rect,
        })
    }

    /// Recompute the bar's rectangle and reassert the reservation.
    ///
    /// The window is only moved when it is not already on the result, so a
    /// repeated call with unchanged inputs re-issues the shell negotiation and
    /// nothing else.  On failure the previous geometry is kept.
    pub(crate) fn reposition(&mut self, handle: BarHandle, thickness: i32, edge: Edge) -> Result<Rect> {
        let live = self.live_for(handle)?;
        if edge != live.edge {
            return Err(LedgeError::Precondition("edge change requires redock"));
        }

        let rect = self.negotiate(handle.window, edge, thickness)?;
        self.place(handle.window, rect)?;

        if let Some(live) = self.live.as_mut() {
            if live.rect != rect {
                debug!(from = %live.rect, to = %rect, "appbar moved");
            }
            live.thickness = thickness;
            live.rect = rect;
        }
        Ok(rect)
    }

    /// Move the bar to another edge as one transition: release the old
    /// reservation, then register afresh on `edge`.
    ///
    /// If re-registration fails the bar ends up unregistered, never half
    /// registered.
    pub(crate) fn redock(&mut self, handle: BarHandle, edge: Edge, thickness: i32) -> Result<Registration> {
        self.live_for(handle)?;
        self.unregister(handle);
        self.register(handle.window, thickness, edge)
    }

    /// Release the reservation held by `handle`.
    ///
    /// A stale or never-issued handle is a no-op, so shutdown paths may call
    /// this unconditionally.
    pub(crate) fn unregister(&mut self, handle: BarHandle) {
        match self.live {
            Some(live) if live.handle == handle => {
                self.host.remove_bar(handle.window);
                self.live = None;
                info!("appbar unregistered");
            }
            _ => debug!(?handle, "unregister ignored: handle is not live"),
        }
    }

    // ── Protocol courtesy calls ───────────────────────────────────────────────

    pub(crate) fn activate(&mut self) {
        if let Some(live) = self.live {
            self.host.activate(live.handle.window);
        }
    }

    pub(crate) fn window_pos_changed(&mut self) {
        if let Some(live) = self.live {
            self.host.window_pos_changed(live.handle.window);
        }
    }

    pub(crate) fn set_topmost(&mut self, topmost: bool) -> Result<()> {
        match self.live {
            Some(live) => self.host.set_topmost(live.handle.window, topmost),
            None => Ok(()),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub(crate) fn handle(&self) -> Option<BarHandle> {
        self.live.map(|l| l.handle)
    }

    #[cfg(test)]
    pub(crate) fn message_id(&self) -> Option<MessageId> {
        self.live.map(|l| l.message)
    }

    pub(crate) fn edge(&self) -> Option<Edge> {
        self.live.map(|l| l.edge)
    }

    pub(crate) fn thickness(&self) -> Option<i32> {
        self.live.map(|l| l.thickness)
    }

    #[cfg(test)]
    pub(crate) fn last_rect(&self) -> Option<Rect> {
        self.live.map(|l| l.rect)
    }

    /// `true` when the live window no longer sits on the last computed rect.
    pub(crate) fn has_drifted(&self) -> bool {
        match self.live {
            Some(live) => self.host.window_rect(live.handle.window) != Some(live.rect),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn live_for(&self, handle: BarHandle) -> Result<LiveBar> {
        self.live
            .filter(|l| l.handle == handle)
            .ok_or(LedgeError::StaleHandle)
    }

    /// compute → querypos → fit thickness → setpos.
    fn negotiate(&mut self, window: WindowId, edge: Edge, thickness: i32) -> Result<Rect> {
        let area = self.host.work_area(window)?;
        let proposed = geometry::compute(edge, &area, thickness)?;

        let queried = self.host.query_pos(window, edge, proposed);
        let fitted = geometry::fit_thickness(edge, queried, &area.monitor, thickness);
        if fitted.is_empty() {
            return Err(LedgeError::RepositionDrift {
                expected: proposed,
                reported: queried,
            });
        }

        let granted = self.host.set_pos(window, edge, fitted);
        if granted.is_empty() || !area.monitor.contains(&granted) {
            return Err(LedgeError::RepositionDrift {
                expected: fitted,
                reported: granted,
            });
        }
        if granted != proposed {
            debug!(%proposed, %granted, work = %area.work, "shell adjusted appbar rect");
        }
        Ok(granted)
    }

    /// Move the window onto `rect` unless it is already there.
    fn place(&mut self, window: WindowId, rect: Rect) -> Result<bool> {
        if self.host.window_rect(window) == Some(rect) {
            return Ok(false);
        }
        self.host.place_window(window, rect)?;
        Ok(true)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

// ── Bar lifecycle controller ──────────────────────────────────────────────────
//
// Drives the dock client and message router across the bar window's life:
//
//   Created ─window─▶ Initialized ─register ok─▶ Armed ─confirmed exit─▶ Closing ─▶ Terminated
//                        ▲     │                   │ ▲
//                        │     └─register failed───┘ │ (floating; bounded retry on timer)
//                        └────redock failed──────────┘
//
// Every dock error is handled here: logged, never fatal.  One instance lives
// in the window's state and is only touched from the UI thread.

use tracing::{debug, error, info, warn};

use crate::{
    dock::{DockClient, ShellHost, WindowId},
    error::LedgeError,
    geometry::Edge,
    router::MessageRouter,
};

// ── Collaborator seams ────────────────────────────────────────────────────────

/// Asks the user whether the bar should really exit.
pub(crate) trait ConfirmExit {
    fn confirm_exit(&mut self) -> bool;
}

impl<F: FnMut() -> bool> ConfirmExit for F {
    fn confirm_exit(&mut self) -> bool {
        self()
    }
}

/// A subsystem that follows the bar's visibility (clock ticker, tray host, …).
pub(crate) trait Companion {
    /// The bar is on screen, docked or floating.
    fn on_visible(&mut self);
    /// The bar is shutting down; the reservation is already released.
    fn on_closing(&mut self);
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Created,
    Initialized,
    Armed,
    Closing,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    /// The user declined; the bar stays as it was.
    Cancelled,
    /// The reservation is released and the bar is terminated.
    Closed,
}

/// Startup choices taken from the settings file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Policy {
    pub(crate) edge: Edge,
    /// Attempts per floating spell; refilled whenever the bar docks or
    /// falls back to floating.
    pub(crate) registration_attempts: u32,
    /// Periodic reassertion of a live reservation.  Registration retries
    /// run on the same tick either way.
    pub(crate) reassert: bool,
    pub(crate) confirm_exit: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            edge: Edge::Top,
            registration_attempts: 3,
            reassert: true,
            confirm_exit: true,
        }
    }
}

pub(crate) struct BarController<H: ShellHost> {
    phase: Phase,
    window: Option<WindowId>,
    dock: DockClient<H>,
    router: MessageRouter,
    edge: Edge,
    thickness: i32,
    attempts: u32,
    policy: Policy,
    companions: Vec<Box<dyn Companion>>,
    visible: bool,
}

impl<H: ShellHost> BarController<H> {
    pub(crate) fn new(host: H, policy: Policy) -> Self {
        Self {
            phase: Phase::Created,
            window: None,
            dock: DockClient::new(host),
            router: MessageRouter::new(),
            edge: policy.edge,
            thickness: 0,
            attempts: 0,
            policy,
            companions: Vec::new(),
            visible: false,
        }
    }

    pub(crate) fn add_companion(&mut self, companion: Box<dyn Companion>) {
        self.companions.push(companion);
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_docked(&self) -> bool {
        self.phase == Phase::Armed
    }

    #[cfg(test)]
    pub(crate) fn dock(&self) -> &DockClient<H> {
        &self.dock
    }

    #[cfg(test)]
    pub(crate) fn router(&self) -> &MessageRouter {
        &self.router
    }

    // ── Created → Initialized → Armed ─────────────────────────────────────────

    /// The native window exists; message routing may begin.
    pub(crate) fn on_window_created(&mut self, window: WindowId) {
        if self.phase != Phase::Created {
            warn!(phase = ?self.phase, "window created twice; ignored");
            return;
        }
        self.window = Some(window);
        self.phase = Phase::Initialized;
        debug!(?window, "bar initialized");
    }

    /// Reserve the configured edge for a bar of `thickness`.
    ///
    /// Returns `true` when docked.  On failure the bar stays a floating
    /// window; companions are told it is visible either way.
    pub(crate) fn dock_bar(&mut self, thickness: i32) -> bool {
        if self.phase != Phase::Initialized {
            debug!(phase = ?self.phase, "dock request ignored");
            return self.is_docked();
        }
        self.thickness = thickness;
        let docked = self.try_register();

        if !self.visible {
            self.visible = true;
            for c in &mut self.companions {
                c.on_visible();
            }
        }
        docked
    }

    fn try_register(&mut self) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        self.attempts += 1;
        match self.dock.register(window, self.thickness, self.edge) {
            Ok(reg) => {
                self.router.arm(reg.message);
                self.phase = Phase::Armed;
                info!(edge = %self.edge, rect = %reg.rect, attempt = self.attempts, "bar docked");
                self.attempts = 0;
                true
            }
            Err(e @ LedgeError::Precondition(_)) => {
                error!(error = %e, "bar geometry contract violated");
                false
            }
            Err(e) => {
                warn!(
                    error = %e,
                    attempt = self.attempts,
                    max = self.policy.registration_attempts,
                    "bar registration failed; running as a floating window"
                );
                false
            }
        }
    }

    // ── Armed self-loop ───────────────────────────────────────────────────────

    /// The window's rendered thickness changed (resize or DPI change).
    pub(crate) fn on_resize(&mut self, thickness: i32) {
        match self.phase {
            Phase::Armed => {
                self.thickness = thickness;
                self.reassert();
            }
            Phase::Initialized => self.thickness = thickness,
            _ => {}
        }
    }

    /// The monitor's DPI changed.  Returns `true` when the caller should move
    /// the window onto the system's suggested rect; a docked bar is placed by
    /// its reservation instead.
    pub(crate) fn on_dpi_changed(&mut self, thickness: i32) -> bool {
        self.on_resize(thickness);
        matches!(self.phase, Phase::Created | Phase::Initialized)
    }

    /// The monitor layout, resolution or work area changed.
    pub(crate) fn on_display_changed(&mut self) {
        if self.phase == Phase::Armed {
            self.reassert();
        }
    }

    /// Periodic tick: reassert a live reservation (unless turned off), or
    /// retry a failed registration while attempts remain.
    pub(crate) fn on_reassert_timer(&mut self) {
        match self.phase {
            Phase::Armed if self.policy.reassert => self.reassert(),
            Phase::Initialized if self.visible && self.attempts < self.policy.registration_attempts => {
                debug!(attempt = self.attempts + 1, "retrying bar registration");
                self.try_register();
            }
            _ => {}
        }
    }

    /// Feed one window message to the appbar router.
    pub(crate) fn route(&mut self, msg: u32, wparam: usize, lparam: isize) -> bool {
        self.router.route(msg, wparam, lparam, &mut self.dock)
    }

    pub(crate) fn on_activate(&mut self) {
        self.dock.activate();
    }

    pub(crate) fn on_window_pos_changed(&mut self) {
        self.dock.window_pos_changed();
    }

    /// Move the bar to another edge in one transition.
    ///
    /// While floating, the new edge is simply used by the next registration.
    pub(crate) fn move_to_edge(&mut self, edge: Edge) -> bool {
        if edge == self.edge {
            return self.is_docked();
        }
        let handle = match (self.phase, self.dock.handle()) {
            (Phase::Armed, Some(handle)) => handle,
            (Phase::Initialized, _) => {
                self.edge = edge;
                return false;
            }
            _ => return false,
        };

        self.edge = edge;
        match self.dock.redock(handle, edge, self.thickness) {
            Ok(reg) => {
                self.router.arm(reg.message);
                self.attempts = 0;
                info!(%edge, rect = %reg.rect, "bar redocked");
                true
            }
            Err(e) => {
                self.router.disarm();
                self.phase = Phase::Initialized;
                self.attempts = 0;
                warn!(error = %e, %edge, "redock failed; running as a floating window");
                false
            }
        }
    }

    fn reassert(&mut self) {
        let Some(handle) = self.dock.handle() else {
            return;
        };
        match self.dock.reposition(handle, self.thickness, self.edge) {
            Ok(rect) => debug!(%rect, "reservation reasserted"),
            Err(e @ LedgeError::Precondition(_)) => error!(error = %e, "bar geometry contract violated"),
            Err(e) => warn!(error = %e, "reposition failed; keeping previous geometry"),
        }
    }

    // ── Armed → Closing → Terminated ──────────────────────────────────────────

    /// Exit on user request.  The user is asked first (unless the settings
    /// turn the prompt off); declining leaves everything untouched.
    pub(crate) fn request_close(&mut self, confirm: &mut dyn ConfirmExit) -> CloseOutcome {
        if matches!(self.phase, Phase::Closing | Phase::Terminated) {
            return CloseOutcome::Closed;
        }
        if self.policy.confirm_exit && !confirm.confirm_exit() {
            info!("exit cancelled by user");
            return CloseOutcome::Cancelled;
        }
        self.shutdown();
        CloseOutcome::Closed
    }

    /// Release the reservation first, then stop dependent subsystems.
    ///
    /// Also used without confirmation when the session ends or the window is
    /// destroyed from outside.  Safe to call repeatedly.
    pub(crate) fn shutdown(&mut self) {
        if self.phase == Phase::Terminated {
            return;
        }
        self.phase = Phase::Closing;

        if let Some(handle) = self.dock.handle() {
            self.dock.unregister(handle);
        }
        self.router.disarm();

        for c in &mut self.companions {
            c.on_closing();
        }
        self.phase = Phase::Terminated;
        info!("bar terminated");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

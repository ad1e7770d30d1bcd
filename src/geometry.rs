// ── Bar geometry ──────────────────────────────────────────────────────────────
//
// Pure Rust, no Win32 imports.  Maps (edge, monitor, thickness) to the
// absolute device-pixel rectangle the bar should occupy.  Every rectangle the
// dock client hands to the shell or the window system comes from here.

use std::fmt;

use crate::error::{LedgeError, Result};

/// Smallest thickness a bar may have, in device pixels.
pub(crate) const MIN_THICKNESS: i32 = 1;

// ── Edge ──────────────────────────────────────────────────────────────────────

/// The monitor side a bar is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// `true` for the edges where thickness is a height.
    pub(crate) fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rect ──────────────────────────────────────────────────────────────────────

/// Absolute screen rectangle in device pixels.  `right` and `bottom` are
/// exclusive, matching Win32 `RECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Rect {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) right: i32,
    pub(crate) bottom: i32,
}

impl Rect {
    pub(crate) const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub(crate) fn width(&self) -> i32 {
        self.right - self.left
    }

    pub(crate) fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// `true` when the rectangle covers no pixels.
    pub(crate) fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// `true` when `other` lies entirely inside `self`.
    pub(crate) fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// The overlap of two rectangles; empty (all zero) when they are disjoint.
    pub(crate) fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if r.is_empty() {
            Rect::default()
        } else {
            r
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.top, self.right, self.bottom)
    }
}

// ── Monitor ───────────────────────────────────────────────────────────────────

/// The monitor that owns the bar window, as reported by the window system.
///
/// `work` is the monitor minus every edge reservation currently held by
/// application bars (the native taskbar included).  Never mutated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonitorWorkArea {
    pub(crate) monitor: Rect,
    pub(crate) work: Rect,
}

// ── Computation ───────────────────────────────────────────────────────────────

/// Scale a length given at `base` DPI to `dpi`, saturating at the `i32` range.
pub(crate) fn scale_to_dpi(px: i32, dpi: u32, base: u32) -> i32 {
    if base == 0 {
        return px;
    }
    let scaled = i64::from(px) * i64::from(dpi) / i64::from(base);
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Clamp `thickness` to what fits on `monitor` along `edge`.
pub(crate) fn clamp_thickness(edge: Edge, monitor: &Rect, thickness: i32) -> i32 {
    let extent = if edge.is_horizontal() {
        monitor.height()
    } else {
        monitor.width()
    };
    thickness.max(MIN_THICKNESS).min(extent.max(MIN_THICKNESS))
}

/// Compute the rectangle for a bar of `thickness` anchored to `edge`.
///
/// Top/Bottom bars span the full monitor width; Left/Right bars span the full
/// monitor height.  Thickness is clamped to `[MIN_THICKNESS, extent]`, so the
/// result is always inside the monitor and touches `edge`.
///
/// Returns `LedgeError::Precondition` for a zero-area monitor.
pub(crate) fn compute(edge: Edge, area: &MonitorWorkArea, thickness: i32) -> Result<Rect> {
    let m = area.monitor;
    if m.is_empty() {
        return Err(LedgeError::Precondition("monitor has zero area"));
    }
    let t = clamp_thickness(edge, &m, thickness);

    Ok(match edge {
        Edge::Top => Rect::new(m.left, m.top, m.right, m.top + t),
        Edge::Bottom => Rect::new(m.left, m.bottom - t, m.right, m.bottom),
        Edge::Left => Rect::new(m.left, m.top, m.left + t, m.bottom),
        Edge::Right => Rect::new(m.right - t, m.top, m.right, m.bottom),
    })
}

/// Re-apply `thickness` to a rectangle the shell adjusted during position
/// negotiation.
///
/// The shell only moves the anchored side out of other bars' reservations;
/// the opposite side must be recomputed from the anchored one.  The result is
/// clipped to `monitor` and may be empty when no room is left on that edge.
pub(crate) fn fit_thickness(edge: Edge, negotiated: Rect, monitor: &Rect, thickness: i32) -> Rect {
    let t = clamp_thickness(edge, monitor, thickness);
    let mut r = negotiated;
    match edge {
        Edge::Top => r.bottom = r.top + t,
        Edge::Bottom => r.top = r.bottom - t,
        Edge::Left => r.right = r.left + t,
        Edge::Right => r.left = r.right - t,
    }
    r.intersect(monitor)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    fn full_hd() -> MonitorWorkArea {
        MonitorWorkArea {
            monitor: Rect::new(0, 0, 1920, 1080),
            work: Rect::new(0, 0, 1920, 1040),
        }
    }

    #[test]
    fn dpi_scaling_saturates_instead_of_overflowing() {
        assert_eq!(scale_to_dpi(28, 96, 96), 28);
        assert_eq!(scale_to_dpi(28, 144, 96), 42);
        assert_eq!(scale_to_dpi(20_000_000, 144, 96), 30_000_000);
        assert_eq!(scale_to_dpi(i32::MAX, 192, 96), i32::MAX);
        assert_eq!(scale_to_dpi(i32::MIN, 192, 96), i32::MIN);
    }

    fn touches(edge: Edge, r: &Rect, m: &Rect) -> bool {
        match edge {
            Edge::Top => r.top == m.top,
            Edge::Bottom => r.bottom == m.bottom,
            Edge::Left => r.left == m.left,
            Edge::Right => r.right == m.right,
        }
    }

    #[test]
    fn top_forty_on_full_hd() {
        let r = compute(Edge::Top, &full_hd(), 40).expect("compute");
        assert_eq!(r, Rect::new(0, 0, 1920, 40));
    }

    #[test]
    fn left_and_right_are_transposed() {
        let area = full_hd();
        assert_eq!(compute(Edge::Left, &area, 64).unwrap(), Rect::new(0, 0, 64, 1080));
        assert_eq!(
            compute(Edge::Right, &area, 64).unwrap(),
            Rect::new(1856, 0, 1920, 1080)
        );
        assert_eq!(
            compute(Edge::Bottom, &area, 30).unwrap(),
            Rect::new(0, 1050, 1920, 1080)
        );
    }

    #[test]
    fn every_edge_is_contained_and_anchored() {
        // Secondary monitor to the left of the primary, with a negative origin.
        let areas = [
            full_hd(),
            MonitorWorkArea {
                monitor: Rect::new(-1280, -200, 0, 824),
                work: Rect::new(-1280, -200, 0, 824),
            },
        ];
        for area in &areas {
            for edge in EDGES {
                for thickness in [1, 23, 40, 500, 1024] {
                    let r = compute(edge, area, thickness).unwrap();
                    assert!(area.monitor.contains(&r), "{edge} {thickness}: {r}");
                    assert!(touches(edge, &r, &area.monitor), "{edge} {thickness}: {r}");
                    assert!(!r.is_empty());
                }
            }
        }
    }

    #[test]
    fn oversized_thickness_clamps_to_monitor() {
        let r = compute(Edge::Top, &full_hd(), 5000).unwrap();
        assert_eq!(r, Rect::new(0, 0, 1920, 1080));
        let r = compute(Edge::Right, &full_hd(), 5000).unwrap();
        assert_eq!(r, Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn non_positive_thickness_clamps_to_minimum() {
        let r = compute(Edge::Top, &full_hd(), 0).unwrap();
        assert_eq!(r.height(), MIN_THICKNESS);
        let r = compute(Edge::Left, &full_hd(), -12).unwrap();
        assert_eq!(r.width(), MIN_THICKNESS);
    }

    #[test]
    fn zero_area_monitor_is_a_precondition_violation() {
        let area = MonitorWorkArea {
            monitor: Rect::new(0, 0, 1920, 0),
            work: Rect::default(),
        };
        assert!(matches!(
            compute(Edge::Top, &area, 40),
            Err(LedgeError::Precondition(_))
        ));
    }

    #[test]
    fn compute_is_deterministic() {
        let a = compute(Edge::Bottom, &full_hd(), 33).unwrap();
        let b = compute(Edge::Bottom, &full_hd(), 33).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fit_thickness_follows_the_shifted_anchor() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        // Shell pushed the proposal below a 40 px taskbar on the same edge.
        let negotiated = Rect::new(0, 40, 1920, 40);
        assert_eq!(
            fit_thickness(Edge::Top, negotiated, &monitor, 28),
            Rect::new(0, 40, 1920, 68)
        );
        let negotiated = Rect::new(1880, 0, 1920, 1080);
        assert_eq!(
            fit_thickness(Edge::Right, negotiated, &monitor, 64),
            Rect::new(1856, 0, 1920, 1080)
        );
    }

    #[test]
    fn fit_thickness_clips_to_the_monitor() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        let negotiated = Rect::new(0, 1070, 1920, 1070);
        let r = fit_thickness(Edge::Top, negotiated, &monitor, 40);
        assert_eq!(r, Rect::new(0, 1070, 1920, 1080));
        assert!(monitor.contains(&r));
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!(a.intersect(&b).is_empty());
    }
}

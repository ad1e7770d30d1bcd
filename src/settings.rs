// ── User settings ─────────────────────────────────────────────────────────────
//
// Reads and writes `%APPDATA%\Ledge\settings.json`.  Consumed once at startup.
// No `unsafe`; plain serde_json over std::fs.

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::Result,
    geometry::MIN_THICKNESS,
    lifecycle::Policy,
};

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

/// Largest logical bar height accepted from the file.
const MAX_THICKNESS: i32 = 512;

// ── On-disk type ──────────────────────────────────────────────────────────────

/// Root of the JSON settings file.  Every field has a default so that older
/// or hand-trimmed files still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) version: u32,
    /// Bar height in logical pixels at 96 DPI.
    pub(crate) thickness: i32,
    /// chrono strftime pattern for the clock.
    pub(crate) time_format: String,
    /// chrono strftime pattern for the long date (tooltip).
    pub(crate) date_format: String,
    /// Seconds between reservation reassertions; `0` disables the timer.
    pub(crate) reassert_interval_secs: u32,
    /// Registration attempts per floating spell.
    pub(crate) registration_attempts: u32,
    /// Ask before exiting.
    pub(crate) confirm_exit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            thickness: 28,
            time_format: crate::clock::DEFAULT_TIME_FORMAT.to_owned(),
            date_format: crate::clock::DEFAULT_DATE_FORMAT.to_owned(),
            reassert_interval_secs: 60,
            registration_attempts: 3,
            confirm_exit: true,
        }
    }
}

impl Settings {
    /// Lifecycle choices derived from these settings.  The edge is fixed:
    /// Ledge is a top bar.
    pub(crate) fn policy(&self) -> Policy {
        Policy {
            registration_attempts: self.registration_attempts.max(1),
            reassert: self.reassert_interval_secs > 0,
            confirm_exit: self.confirm_exit,
            ..Policy::default()
        }
    }

    /// Logical bar height, clamped to `[MIN_THICKNESS, MAX_THICKNESS]`.
    pub(crate) fn bar_thickness(&self) -> i32 {
        self.thickness.clamp(MIN_THICKNESS, MAX_THICKNESS)
    }

    fn from_json(data: &[u8]) -> Option<Self> {
        let s: Settings = serde_json::from_slice(data).ok()?;
        if s.version != SETTINGS_VERSION {
            return None;
        }
        Some(s)
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

/// `%APPDATA%\Ledge`, or `None` if `APPDATA` is not set.
pub(crate) fn data_dir() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("Ledge");
    Some(p)
}

/// Return the path to the settings file: `%APPDATA%\Ledge\settings.json`.
pub(crate) fn settings_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("settings.json"))
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write `settings`, creating the `Ledge` directory if needed.
pub(crate) fn save(settings: &Settings) -> Result<()> {
    let path = settings_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "APPDATA not set")
    })?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, settings)?;
    Ok(())
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Load the settings file, falling back to defaults.
///
/// A missing file is created with the defaults so users have something to
/// edit.  An unreadable, malformed or wrong-version file is left alone and
/// the defaults are used.
pub(crate) fn load() -> Settings {
    let Some(path) = settings_path() else {
        warn!("APPDATA not set; using default settings");
        return Settings::default();
    };

    match fs::read(&path) {
        Ok(data) => Settings::from_json(&data).unwrap_or_else(|| {
            warn!(path = %path.display(), "settings file unusable; using defaults");
            Settings::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = Settings::default();
            match save(&defaults) {
                Ok(()) => info!(path = %path.display(), "wrote default settings"),
                Err(e) => warn!(error = %e, "could not write default settings"),
            }
            defaults
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "could not read settings; using defaults");
            Settings::default()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s = Settings::from_json(br#"{"version":1,"thickness":40}"#).expect("parse");
        assert_eq!(s.thickness, 40);
        assert_eq!(s.reassert_interval_secs, 60);
        assert!(s.confirm_exit);
        assert_eq!(s.time_format, crate::clock::DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let s = Settings::from_json(b"{}").expect("parse");
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn wrong_version_is_rejected() {
        assert!(Settings::from_json(br#"{"version":99}"#).is_none());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(Settings::from_json(b"{ thickness: 40").is_none());
    }

    #[test]
    fn roundtrip_keeps_every_field() {
        let s = Settings {
            thickness: 36,
            time_format: "%H:%M".to_owned(),
            date_format: "%Y-%m-%d".to_owned(),
            reassert_interval_secs: 0,
            registration_attempts: 5,
            confirm_exit: false,
            ..Settings::default()
        };
        let json = serde_json::to_vec(&s).expect("serialize");
        assert_eq!(Settings::from_json(&json), Some(s));
    }

    #[test]
    fn policy_keeps_at_least_one_attempt() {
        let s = Settings {
            registration_attempts: 0,
            ..Settings::default()
        };
        let p = s.policy();
        assert_eq!(p.registration_attempts, 1);
        assert_eq!(p.edge, crate::geometry::Edge::Top);
    }

    #[test]
    fn zero_interval_turns_off_reassertion_only() {
        let s = Settings {
            reassert_interval_secs: 0,
            ..Settings::default()
        };
        let p = s.policy();
        assert!(!p.reassert);
        assert_eq!(p.registration_attempts, 3);
        assert!(Settings::default().policy().reassert);
    }

    #[test]
    fn out_of_range_thickness_is_clamped() {
        let huge = Settings::from_json(br#"{"version":1,"thickness":20000000}"#).expect("parse");
        assert_eq!(huge.bar_thickness(), MAX_THICKNESS);

        let negative = Settings::from_json(br#"{"version":1,"thickness":-5}"#).expect("parse");
        assert_eq!(negative.bar_thickness(), MIN_THICKNESS);

        assert_eq!(Settings::default().bar_thickness(), 28);
    }
}

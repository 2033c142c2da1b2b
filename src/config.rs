//! Export configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;
pub const DEFAULT_DECODE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_FRAME_BORDER: f32 = 12.0;
pub const DEFAULT_FILENAME_PREFIX: &str = "moodboard";

/// Largest oversampling factor accepted from the environment.
const MAX_EXPORT_SCALE: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Surface pixels per board unit.
    pub scale: f32,
    /// Bounded wait for each payload fetch + decode.
    pub decode_timeout: Duration,
    /// Connect timeout for remote payloads.
    pub connect_timeout: Duration,
    /// White frame thickness around each photo, in board units.
    pub frame_border: f32,
    /// Leading part of the generated filename.
    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_EXPORT_SCALE,
            decode_timeout: Duration::from_millis(DEFAULT_DECODE_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            frame_border: DEFAULT_FRAME_BORDER,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

impl ExportConfig {
    /// Build export config from environment variables.
    ///
    /// Optional:
    /// - `MOODBOARD_EXPORT_SCALE`: default 2, clamped to `(0, 8]`
    /// - `MOODBOARD_DECODE_TIMEOUT_MS`: default 5000
    /// - `MOODBOARD_CONNECT_TIMEOUT_MS`: default 3000
    /// - `MOODBOARD_FRAME_BORDER`: default 12
    /// - `MOODBOARD_FILENAME_PREFIX`: default `moodboard`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build export config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let scale = parse_or(&lookup, "MOODBOARD_EXPORT_SCALE", DEFAULT_EXPORT_SCALE);
        let scale = if scale.is_finite() && scale > 0.0 { scale.min(MAX_EXPORT_SCALE) } else { DEFAULT_EXPORT_SCALE };

        let frame_border = parse_or(&lookup, "MOODBOARD_FRAME_BORDER", DEFAULT_FRAME_BORDER);
        let frame_border = if frame_border.is_finite() && frame_border >= 0.0 { frame_border } else { DEFAULT_FRAME_BORDER };

        let filename_prefix = lookup("MOODBOARD_FILENAME_PREFIX")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME_PREFIX.to_string());

        Self {
            scale,
            decode_timeout: Duration::from_millis(parse_or(
                &lookup,
                "MOODBOARD_DECODE_TIMEOUT_MS",
                DEFAULT_DECODE_TIMEOUT_MS,
            )),
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "MOODBOARD_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT_MS,
            )),
            frame_border,
            filename_prefix,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

//! Meditation modes and the catalog describing them.
//!
//! The engine only reads [`ModeInfo::requires_breathing_pacing`]; the other
//! fields exist for hosts that render a session and for the species
//! recorded alongside each result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeditationMode {
    #[default]
    Breathe,
    Focus,
    Calm,
    BodyScan,
    Sleep,
}

impl MeditationMode {
    pub const ALL: [MeditationMode; 5] = [
        MeditationMode::Breathe,
        MeditationMode::Focus,
        MeditationMode::Calm,
        MeditationMode::BodyScan,
        MeditationMode::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeditationMode::Breathe => "breathe",
            MeditationMode::Focus => "focus",
            MeditationMode::Calm => "calm",
            MeditationMode::BodyScan => "body-scan",
            MeditationMode::Sleep => "sleep",
        }
    }
}

impl fmt::Display for MeditationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeditationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        MeditationMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown mode '{s}'"),
            })
    }
}

/// Static presentation and pacing data for a mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub mode: MeditationMode,
    pub title: String,
    pub requires_breathing_pacing: bool,
    /// Hex color used by hosts for the session theme.
    pub display_color: String,
    pub icon: String,
    /// Tree species grown by sessions in this mode.
    pub species: String,
}

/// Lookup from mode id to its static description.
pub trait ModeCatalog {
    fn info(&self, mode: MeditationMode) -> ModeInfo;

    fn requires_breathing_pacing(&self, mode: MeditationMode) -> bool {
        self.info(mode).requires_breathing_pacing
    }
}

/// Built-in mode table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn all(&self) -> Vec<ModeInfo> {
        MeditationMode::ALL.iter().map(|m| self.info(*m)).collect()
    }
}

impl ModeCatalog for StaticCatalog {
    fn info(&self, mode: MeditationMode) -> ModeInfo {
        let (title, pacing, color, icon, species) = match mode {
            MeditationMode::Breathe => ("Breathing", true, "#38bdf8", "wind", "willow"),
            MeditationMode::Focus => ("Focus", false, "#f59e0b", "target", "oak"),
            MeditationMode::Calm => ("Calm", true, "#34d399", "leaf", "cherry-blossom"),
            MeditationMode::BodyScan => ("Body Scan", false, "#a78bfa", "body", "birch"),
            MeditationMode::Sleep => ("Sleep", true, "#6366f1", "moon", "pine"),
        };
        ModeInfo {
            mode,
            title: title.into(),
            requires_breathing_pacing: pacing,
            display_color: color.into(),
            icon: icon.into(),
            species: species.into(),
        }
    }
}

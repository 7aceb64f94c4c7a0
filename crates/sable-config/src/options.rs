//! Enumerated settings shared by the document model and override parsing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering backend requested for the emulated GPU.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GraphicsBackend {
    /// OpenGL renderer.
    OpenGl,
    /// Vulkan renderer.
    #[default]
    Vulkan,
}

/// Policy controlling when the mouse cursor is hidden over the render surface.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HideCursorMode {
    /// Always show the cursor.
    Never,
    /// Hide the cursor after a period without movement.
    #[default]
    OnIdle,
    /// Always hide the cursor.
    Always,
}

/// Threaded-optimisation policy forwarded to the host graphics driver.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendThreadingMode {
    /// Leave the driver default untouched.
    #[default]
    Auto,
    /// Force threaded optimisation off.
    Off,
    /// Force threaded optimisation on.
    On,
}

impl BackendThreadingMode {
    /// Returns the forced driver toggle, or `None` when the driver decides.
    #[must_use]
    pub const fn forced(self) -> Option<bool> {
        match self {
            Self::Auto => None,
            Self::Off => Some(false),
            Self::On => Some(true),
        }
    }
}

/// Errors encountered while parsing an option from text.
pub type OptionParseError = strum::ParseError;

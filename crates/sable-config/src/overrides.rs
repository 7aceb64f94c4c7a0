//! Command-line overrides layered over the resolved document.

use std::str::FromStr;

use strum::Display;

use crate::document::Settings;
use crate::resolver::ResolutionWarning;

/// Settings that accept free-form override text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OverrideField {
    /// `--graphics-backend`.
    GraphicsBackend,
    /// `--hide-cursor`.
    HideCursor,
}

/// Overrides parsed from the process arguments.
///
/// Each field is either absent, leaving the document value alone, or present,
/// forcing the corresponding setting on every resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    /// Requested graphics backend, matched case-insensitively.
    pub graphics_backend: Option<String>,
    /// Requested docked mode.
    pub docked_mode: Option<bool>,
    /// Requested cursor hiding policy, matched case-insensitively.
    pub hide_cursor: Option<String>,
}

impl OverrideSet {
    /// Returns true when no override is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.graphics_backend.is_none() && self.docked_mode.is_none() && self.hide_cursor.is_none()
    }

    /// Applies the overrides in their fixed order.
    ///
    /// Values that match no known option leave the setting untouched and are
    /// returned as warnings.
    pub fn apply(&self, settings: &mut Settings) -> Vec<ResolutionWarning> {
        let mut ignored = Vec::new();

        if let Some(raw) = self.graphics_backend.as_deref() {
            apply_text(
                OverrideField::GraphicsBackend,
                raw,
                &mut settings.graphics_backend,
                &mut ignored,
            );
        }
        if let Some(docked) = self.docked_mode {
            settings.docked_mode = docked;
        }
        if let Some(raw) = self.hide_cursor.as_deref() {
            apply_text(
                OverrideField::HideCursor,
                raw,
                &mut settings.hide_cursor,
                &mut ignored,
            );
        }

        ignored
    }
}

fn apply_text<T: FromStr>(
    field: OverrideField,
    raw: &str,
    target: &mut T,
    ignored: &mut Vec<ResolutionWarning>,
) {
    if let Ok(parsed) = raw.trim().parse::<T>() {
        *target = parsed;
        return;
    }
    ignored.push(ResolutionWarning::UnrecognisedOverride {
        field,
        value: raw.to_owned(),
    });
}

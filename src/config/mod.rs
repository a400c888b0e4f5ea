//! Configuration management for the shell
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It covers window placement, focus behaviour of the
//! default window management policy, and general settings.

use crate::geometry::Rectangle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted cascade offset for new windows (pixels)
pub const MAX_TITLE_BAR_HEIGHT: i32 = 256;

/// Main configuration struct containing all shell settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShellConfig {
    /// Placement of new surfaces
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Focus behaviour of the default policy
    #[serde(default)]
    pub focus: FocusConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacementConfig {
    /// Offset used to cascade a session's additional top-level windows
    pub title_bar_height: i32,

    /// Display area assumed until the first display is added
    #[serde(default = "PlacementConfig::default_display")]
    pub default_display: Rectangle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FocusConfig {
    /// Give focus to every new surface that can take it
    pub focus_new_surfaces: bool,

    /// Focus and raise the surface under a pointer click or touch
    pub click_to_focus: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralConfig {
    /// Enable debug logging
    pub debug: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            title_bar_height: 10,
            default_display: Self::default_display(),
        }
    }
}

impl PlacementConfig {
    fn default_display() -> Rectangle {
        Rectangle::from_loc_and_size((0, 0), (1920, 1080))
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_new_surfaces: true,
            click_to_focus: true,
        }
    }
}

impl ShellConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: ShellConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let display = &self.placement.default_display;
        if display.is_empty() {
            anyhow::bail!(
                "Invalid default_display: size {}x{} must be positive",
                display.size.width,
                display.size.height
            );
        }

        let title_bar_height = self.placement.title_bar_height;
        if !(0..=MAX_TITLE_BAR_HEIGHT).contains(&title_bar_height) {
            anyhow::bail!(
                "Invalid title_bar_height: must be between 0 and {}",
                MAX_TITLE_BAR_HEIGHT
            );
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config override this config
    pub fn merge_partial(mut self, partial: ShellConfig) -> Self {
        let default_config = ShellConfig::default();

        if partial.placement != default_config.placement {
            self.placement = partial.placement;
        }
        if partial.focus != default_config.focus {
            self.focus = partial.focus;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }

        self
    }
}

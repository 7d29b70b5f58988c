// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Process-wide BetterController settings.
//!
//! The settings live in a single global store that is meant to be written at
//! boot (or in tests) and read everywhere else. The only mutation entry
//! points are [`init`], [`configure`] and [`reset_to_default`].
//!
//! # Example Configuration
//!
//! ```toml
//! api_version = "v2"
//! default_per_page = 50
//! max_per_page = 200
//! log_errors = true
//! include_backtrace = false
//! page_component_namespace = "Pages"
//! flash_target = "flash"
//! form_errors_target = "form_errors"
//! frame_header = "Turbo-Frame"
//! ```

use lazy_static::lazy_static;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::error::Result;

/// BetterController settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Configuration {
    /// Version string written into every JSON envelope (default: "v1").
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Page size when a request does not ask for one (default: 25).
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,

    /// Upper bound for requested page sizes (default: 100).
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,

    /// Log errors caught inside action pipelines (default: true).
    #[serde(default = "default_true")]
    pub log_errors: bool,

    /// Include error type and backtrace in JSON failure bodies (default: false).
    #[serde(default)]
    pub include_backtrace: bool,

    /// Namespace prefix for page components resolved from a page type
    /// (default: "Pages").
    #[serde(default = "default_page_component_namespace")]
    pub page_component_namespace: String,

    /// DOM id updated by default flash streams (default: "flash").
    #[serde(default = "default_flash_target")]
    pub flash_target: String,

    /// DOM id updated by default form-error streams (default: "form_errors").
    #[serde(default = "default_form_errors_target")]
    pub form_errors_target: String,

    /// Request header marking an in-frame request (default: "Turbo-Frame").
    #[serde(default = "default_frame_header")]
    pub frame_header: String,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_per_page() -> usize {
    25
}

fn default_max_per_page() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_page_component_namespace() -> String {
    "Pages".to_string()
}

fn default_flash_target() -> String {
    "flash".to_string()
}

fn default_form_errors_target() -> String {
    "form_errors".to_string()
}

fn default_frame_header() -> String {
    "Turbo-Frame".to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            log_errors: default_true(),
            include_backtrace: false,
            page_component_namespace: default_page_component_namespace(),
            flash_target: default_flash_target(),
            form_errors_target: default_form_errors_target(),
            frame_header: default_frame_header(),
        }
    }
}

impl Configuration {
    /// Parses settings from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML for this struct.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads settings from a TOML file.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies the default and maximum page size to a requested one.
    pub fn clamp_per_page(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.default_per_page,
            Some(n) => n.min(self.max_per_page),
        }
    }
}

lazy_static! {
    static ref GLOBAL: RwLock<Configuration> = RwLock::new(Configuration::default());
}

/// Replaces the global configuration.
pub fn init(config: Configuration) {
    match GLOBAL.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Mutates the global configuration in place.
pub fn configure(f: impl FnOnce(&mut Configuration)) {
    match GLOBAL.write() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}

/// Returns a snapshot of the global configuration.
pub fn current() -> Configuration {
    match GLOBAL.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Restores the global configuration to its defaults.
pub fn reset_to_default() {
    init(Configuration::default());
}

//! Bootstrap configuration

use std::path::PathBuf;

use crate::compiler::{CompileRequest, Define};
use crate::device::FeatureLevel;
use crate::error::{Error, Result};

/// Which driver messages reach the console/file echo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, down to verbose
    All,
}

/// Where driver messages are echoed while they are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// Standard error, colored
    Console,
    /// Appended to a file, plain text
    File(String),
    /// Both of the above
    Both(String),
}

/// Per-category message filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: false,
        }
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (reported to the driver)
    pub app_name: String,
    /// Bind this adapter directly instead of probing
    pub adapter_index: Option<u32>,
    /// Feature level every device is created at
    pub feature_level: FeatureLevel,
    /// Enable the driver debug layer (required for a diagnostic sink)
    pub enable_validation: bool,
    /// Echo filter for driver messages
    pub debug_severity: DebugSeverity,
    /// Echo target for driver messages
    pub debug_output: DebugOutput,
    /// Echo filter by message category
    pub debug_message_filter: DebugMessageFilter,
    /// Pre-built container to validate/sign
    pub precompiled_shader: Option<PathBuf>,
    /// Source to compile
    pub compile: Option<CompileRequest>,
    /// Root signature blob
    pub root_signature: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Compute Bootstrap".to_string(),
            adapter_index: None,
            feature_level: FeatureLevel::BASELINE,
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            precompiled_shader: None,
            compile: None,
            root_signature: None,
        }
    }
}

impl Config {
    /// Set the source to compile with default flags
    pub fn with_source(mut self, path: impl Into<PathBuf>, entry_point: &str, profile: &str) -> Self {
        self.compile = Some(CompileRequest::new(path, entry_point, profile));
        self
    }

    /// Add a macro definition to the compile request, if any
    pub fn with_define(mut self, define: Define) -> Self {
        if let Some(request) = self.compile.as_mut() {
            request.defines.push(define);
        }
        self
    }

    /// Check that a run has something to build
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when no shader input or no root signature is set, or
    /// when the compile request has an empty entry point.
    pub fn validate(&self) -> Result<()> {
        if self.precompiled_shader.is_none() && self.compile.is_none() {
            return Err(Error::InvalidConfig(
                "either a precompiled shader or a source to compile is required".to_string(),
            ));
        }
        if self.root_signature.is_none() {
            return Err(Error::InvalidConfig("a root signature blob is required".to_string()));
        }
        if let Some(request) = &self.compile {
            if request.entry_point.trim().is_empty() {
                return Err(Error::InvalidConfig("entry point must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Target profiles and compile requests

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default compiler flags (maximum optimization)
pub const DEFAULT_ARGUMENTS: &[&str] = &["-O3"];

/// Shader stage encoded in a target profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// `cs`
    Compute,
    /// `vs`
    Vertex,
    /// `ps`
    Pixel,
}

impl ShaderStage {
    pub fn prefix(&self) -> &'static str {
        match self {
            ShaderStage::Compute => "cs",
            ShaderStage::Vertex => "vs",
            ShaderStage::Pixel => "ps",
        }
    }
}

/// Target profile: shader stage plus shader-model version (e.g. `cs_6_0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetProfile {
    pub stage: ShaderStage,
    pub major: u32,
    pub minor: u32,
}

impl TargetProfile {
    /// Parse `<stage>_<major>_<minor>`
    ///
    /// # Errors
    ///
    /// `CompileInvocationFailed` for an unknown stage or a malformed version.
    pub fn parse(profile: &str) -> Result<Self> {
        let invalid = || Error::CompileInvocationFailed(format!("invalid target profile '{}'", profile));

        let mut parts = profile.split('_');
        let stage = match parts.next() {
            Some("cs") => ShaderStage::Compute,
            Some("vs") => ShaderStage::Vertex,
            Some("ps") => ShaderStage::Pixel,
            _ => return Err(invalid()),
        };
        let major = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { stage, major, minor })
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.stage.prefix(), self.major, self.minor)
    }
}

/// Preprocessor macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// Parse `NAME` or `NAME=VALUE`
    pub fn parse(text: &str) -> Option<Self> {
        let (name, value) = match text.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (text.trim(), None),
        };
        let valid_name = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        valid_name.then(|| Self::new(name, value))
    }
}

/// Everything needed to compile one shader source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Source file
    pub source_path: PathBuf,
    /// Entry-point symbol
    pub entry_point: String,
    /// Target profile string (e.g. `cs_6_0`)
    pub profile: String,
    /// Compiler flags
    pub arguments: Vec<String>,
    /// Macro definitions
    pub defines: Vec<Define>,
}

impl CompileRequest {
    /// Request with the default flags and no defines
    pub fn new(source_path: impl Into<PathBuf>, entry_point: &str, profile: &str) -> Self {
        Self {
            source_path: source_path.into(),
            entry_point: entry_point.to_string(),
            profile: profile.to_string(),
            arguments: DEFAULT_ARGUMENTS.iter().map(|a| a.to_string()).collect(),
            defines: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;

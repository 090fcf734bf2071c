//! Source preprocessor run ahead of the WGSL front end
//!
//! Supports `#include "file"`, `#define NAME [value]`, `#undef`,
//! `#ifdef`/`#ifndef`/`#else`/`#endif` and plain identifier substitution.
//! Directive lines and disabled lines become blank lines so that line numbers
//! of the root file stay put until the first include.

use compute_bootstrap::bootstrap::compiler::{Define, IncludeHandler};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Deepest include nesting accepted
const MAX_INCLUDE_DEPTH: usize = 32;

/// Preprocessing failure, located in the file that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessError {
    pub file: PathBuf,
    /// 1-based
    pub line: usize,
    pub message: String,
}

impl fmt::Display for PreprocessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: error: {}", self.file.display(), self.line, self.message)
    }
}

impl std::error::Error for PreprocessError {}

struct Conditional {
    /// Whether lines in the current branch are emitted
    active: bool,
    /// Whether the enclosing block is emitted
    parent_active: bool,
    seen_else: bool,
    line: usize,
}

/// One preprocessing run
pub struct Preprocessor<'h> {
    defines: HashMap<String, String>,
    include_handler: &'h mut dyn IncludeHandler,
    include_stack: Vec<PathBuf>,
}

impl<'h> Preprocessor<'h> {
    /// Preprocessor seeded with command-line defines
    ///
    /// A define without a value expands to `1`.
    pub fn new(defines: &[Define], include_handler: &'h mut dyn IncludeHandler) -> Self {
        let defines = defines
            .iter()
            .map(|define| {
                (
                    define.name.clone(),
                    define.value.clone().unwrap_or_else(|| "1".to_string()),
                )
            })
            .collect();
        Self {
            defines,
            include_handler,
            include_stack: Vec::new(),
        }
    }

    /// Current value of a macro
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// Preprocess `source`, read from `name`
    pub fn run(&mut self, source: &str, name: &Path) -> Result<String, PreprocessError> {
        let mut output = String::with_capacity(source.len());
        self.process(source, name, &mut output)?;
        Ok(output)
    }

    fn process(&mut self, source: &str, name: &Path, output: &mut String) -> Result<(), PreprocessError> {
        let fail = |line: usize, message: String| PreprocessError {
            file: name.to_path_buf(),
            line,
            message,
        };

        self.include_stack.push(name.to_path_buf());
        let mut conditionals: Vec<Conditional> = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            let active = conditionals.last().map_or(true, |c| c.active);
            let trimmed = line.trim_start();

            let Some(directive_text) = trimmed.strip_prefix('#') else {
                if active {
                    output.push_str(&self.substitute(line));
                }
                output.push('\n');
                continue;
            };

            let directive_text = directive_text.trim();
            let (directive, argument) = match directive_text.split_once(char::is_whitespace) {
                Some((directive, argument)) => (directive, argument.trim()),
                None => (directive_text, ""),
            };

            match directive {
                "ifdef" | "ifndef" => {
                    let macro_name = parse_identifier(argument)
                        .ok_or_else(|| fail(line_number, format!("#{} expects a macro name", directive)))?;
                    let defined = self.defines.contains_key(macro_name);
                    let taken = if directive == "ifdef" { defined } else { !defined };
                    conditionals.push(Conditional {
                        active: active && taken,
                        parent_active: active,
                        seen_else: false,
                        line: line_number,
                    });
                }
                "else" => {
                    let conditional = conditionals
                        .last_mut()
                        .ok_or_else(|| fail(line_number, "#else without #ifdef".to_string()))?;
                    if conditional.seen_else {
                        return Err(fail(line_number, "duplicate #else".to_string()));
                    }
                    conditional.seen_else = true;
                    conditional.active = conditional.parent_active && !conditional.active;
                }
                "endif" => {
                    conditionals
                        .pop()
                        .ok_or_else(|| fail(line_number, "#endif without #ifdef".to_string()))?;
                }
                _ if !active => {}
                "define" => {
                    let (macro_name, value) = match argument.split_once(char::is_whitespace) {
                        Some((macro_name, value)) => (macro_name, value.trim()),
                        None => (argument, ""),
                    };
                    let macro_name = parse_identifier(macro_name)
                        .ok_or_else(|| fail(line_number, "#define expects a macro name".to_string()))?;
                    self.defines.insert(macro_name.to_string(), value.to_string());
                }
                "undef" => {
                    let macro_name = parse_identifier(argument)
                        .ok_or_else(|| fail(line_number, "#undef expects a macro name".to_string()))?;
                    self.defines.remove(macro_name);
                }
                "include" => {
                    let requested = parse_include_target(argument)
                        .ok_or_else(|| fail(line_number, format!("malformed #include {}", argument)))?;
                    self.include(requested, name, line_number, output)?;
                    continue;
                }
                other => return Err(fail(line_number, format!("unknown directive '#{}'", other))),
            }
            output.push('\n');
        }

        if let Some(open) = conditionals.last() {
            return Err(fail(open.line, "unterminated conditional block".to_string()));
        }

        self.include_stack.pop();
        Ok(())
    }

    /// Expand an include in place
    fn include(
        &mut self,
        requested: &str,
        includer: &Path,
        line: usize,
        output: &mut String,
    ) -> Result<(), PreprocessError> {
        let fail = |message: String| PreprocessError {
            file: includer.to_path_buf(),
            line,
            message,
        };

        if self.include_stack.len() >= MAX_INCLUDE_DEPTH {
            return Err(fail(format!("includes nested deeper than {}", MAX_INCLUDE_DEPTH)));
        }

        let included = self
            .include_handler
            .load_source(requested, includer)
            .map_err(|e| fail(e.to_string()))?;

        if self.include_stack.contains(&included.path) {
            return Err(fail(format!("recursive include of '{}'", included.path.display())));
        }

        let text = included.blob.to_text();
        self.process(&text, &included.path, output)
    }

    /// Replace defined identifiers (comments and numeric literals untouched)
    fn substitute(&self, line: &str) -> String {
        if self.defines.is_empty() {
            return line.to_string();
        }

        let mut result = String::with_capacity(line.len());
        let mut rest = line;

        while let Some(c) = rest.chars().next() {
            if rest.starts_with("//") {
                result.push_str(rest);
                break;
            }

            if c.is_ascii_alphabetic() || c == '_' || c.is_ascii_digit() {
                let end = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len());
                let token = &rest[..end];
                match self.defines.get(token) {
                    Some(value) if !c.is_ascii_digit() => result.push_str(value),
                    _ => result.push_str(token),
                }
                rest = &rest[end..];
            } else {
                result.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }

        result
    }
}

fn parse_identifier(text: &str) -> Option<&str> {
    let valid = !text.is_empty()
        && !text.starts_with(|c: char| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(text)
}

fn parse_include_target(argument: &str) -> Option<&str> {
    let inner = argument
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| argument.strip_prefix('<').and_then(|s| s.strip_suffix('>')))?;
    (!inner.is_empty()).then_some(inner)
}

#[cfg(test)]
#[path = "preprocessor_tests.rs"]
mod tests;

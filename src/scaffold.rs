//! Merge generated routines into a hand-maintained template
//!
//! A template file starts out as a blank with a few routines; a generator
//! later produces a full set. Only the routines whose signature is not yet in
//! the template get appended, so hand edits are never overwritten.
//!
//! A routine starts at a line that (after leading qualifiers such as `pub` or
//! `async`) begins with the configured keyword. Its signature is that line up
//! to the opening brace, with whitespace collapsed. Comment lines directly
//! above a routine travel with it.

use std::io::Write;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{BuildError, BuildResult};
use crate::fsutil;

/// Qualifiers that may precede the routine keyword
static QUALIFIERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:pub(?:\([^)]*\))?|async|const|unsafe|extern(?:\s+\x22[^\x22]*\x22)?|export|static)\s+)*",
    )
    .expect("Invalid regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Line comments that attach to the routine below them
const COMMENT_PREFIXES: &[&str] = &["//", "#"];

/// How routines are recognised in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineSyntax {
    keyword: String,
}

impl Default for RoutineSyntax {
    fn default() -> Self {
        Self::new("fn ")
    }
}

impl RoutineSyntax {
    /// `keyword` opens a routine, e.g. `"fn "` or `"func "`
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Normalised signature if `line` opens a routine
    pub fn signature(&self, line: &str) -> Option<String> {
        let trimmed = line.trim_start();
        let qualifiers = QUALIFIERS_RE.find(trimmed).map_or(0, |m| m.end());
        if !trimmed[qualifiers..].starts_with(&self.keyword) {
            return None;
        }
        let head = trimmed.split('{').next().unwrap_or(trimmed).trim();
        Some(WHITESPACE_RE.replace_all(head, " ").into_owned())
    }
}

/// One routine found in a source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub signature: String,
    /// Source lines of the routine, leading comments included
    pub code: String,
}

/// Split `source` into routines, in order of appearance
///
/// Text before the first routine is ignored.
pub fn parse_routines(source: &str, syntax: &RoutineSyntax) -> Vec<Routine> {
    let lines: Vec<&str> = source.lines().collect();

    let mut starts: Vec<(usize, String)> = Vec::new();
    let mut floor = 0;
    for (i, line) in lines.iter().enumerate() {
        if let Some(signature) = syntax.signature(line) {
            let mut start = i;
            while start > floor && is_comment(lines[start - 1]) {
                start -= 1;
            }
            starts.push((start, signature));
            floor = i + 1;
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, (start, signature))| {
            let end = starts.get(n + 1).map_or(lines.len(), |(next, _)| *next);
            Routine {
                signature: signature.clone(),
                code: lines[*start..end].join("\n").trim_end().to_string(),
            }
        })
        .collect()
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    COMMENT_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Generated routines whose signature does not occur in `template`
///
/// # Errors
/// * `BuildError::Scaffold` - If `generated` has text but no routine, or its
///   braces do not balance
pub fn missing_routines(
    template: &str,
    generated: &str,
    syntax: &RoutineSyntax,
) -> BuildResult<Vec<Routine>> {
    check_balanced(generated)?;

    let routines = parse_routines(generated, syntax);
    if routines.is_empty() && !generated.trim().is_empty() {
        return Err(BuildError::Scaffold(format!(
            "generated text contains no routine starting with `{}`",
            syntax.keyword().trim_end()
        )));
    }

    let mut known: Vec<String> = parse_routines(template, syntax)
        .into_iter()
        .map(|r| r.signature)
        .collect();

    let mut missing = Vec::new();
    for routine in routines {
        if known.contains(&routine.signature) {
            continue;
        }
        known.push(routine.signature.clone());
        missing.push(routine);
    }
    Ok(missing)
}

/// Text to append to `template` so it gains the routines it lacks
///
/// Each missing routine is preceded by a blank line. Empty when nothing is
/// missing.
pub fn extend_blank(
    template: &str,
    generated: &str,
    syntax: &RoutineSyntax,
) -> BuildResult<String> {
    let tail: String = missing_routines(template, generated, syntax)?
        .iter()
        .map(|r| format!("\n{}\n", r.code))
        .collect();
    Ok(tail)
}

/// Append to the file at `path` the routines `generate` writes that it lacks
///
/// Returns the number of routines appended. The file is not touched when
/// nothing is missing, so its modification time only moves on real changes.
///
/// # Errors
/// * `BuildError::Io` - If the template cannot be read or written
/// * `BuildError::Scaffold` - If the generated text is not usable
pub fn extend_blank_file<F>(
    path: impl AsRef<Path>,
    syntax: &RoutineSyntax,
    generate: F,
) -> BuildResult<usize>
where
    F: FnOnce(&mut dyn Write) -> BuildResult<()>,
{
    let path = path.as_ref();
    let template = std::fs::read_to_string(path).map_err(|e| {
        BuildError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;

    let mut buffer: Vec<u8> = Vec::new();
    generate(&mut buffer)?;
    let generated = String::from_utf8(buffer)
        .map_err(|e| BuildError::Scaffold(format!("generated text is not UTF-8: {}", e)))?;

    let missing = missing_routines(&template, &generated, syntax)?;
    if missing.is_empty() {
        tracing::debug!("{} already has every generated routine", path.display());
        return Ok(0);
    }

    let needs_newline = !template.is_empty() && !template.ends_with('\n');
    fsutil::append_file(path, |w| {
        if needs_newline {
            writeln!(w)?;
        }
        for routine in &missing {
            write!(w, "\n{}\n", routine.code)?;
        }
        Ok(())
    })?;

    tracing::info!(
        "Appended {} routine(s) to {}",
        missing.len(),
        path.display()
    );
    Ok(missing.len())
}

fn check_balanced(source: &str) -> BuildResult<()> {
    let mut depth: i64 = 0;
    for (n, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(BuildError::Scaffold(format!(
                    "unexpected `}}` on line {} of generated text",
                    n + 1
                )));
            }
        }
    }
    if depth != 0 {
        return Err(BuildError::Scaffold(format!(
            "generated text has {} unclosed `{{`",
            depth
        )));
    }
    Ok(())
}

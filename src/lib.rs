//! A layered repair pipeline that turns "almost JSON" (the kind of
//! output produced by LLMs, legacy exporters, and hand-edited configs)
//! into valid JSON.
//!
//! The pipeline runs, in order: pre-pipeline preprocessors, content
//! cleaning (code fences, comments, wrapper prose), structural repair
//! (balancing `{}`/`[]`), a context-aware syntax normalizer (quotes,
//! unquoted keys, literal aliases, commas), and a strict validator. Each
//! stage logs the edits it made as a [`RepairAction`] so callers can
//! audit what changed.

pub mod context;
pub mod error;
pub mod layers;
pub mod options;
pub mod scanner;

#[cfg(feature = "cli")]
pub mod cli;

pub use context::RepairAction;
pub use error::{RepairError, Result, StrictViolation};
pub use options::Options;

use serde_json::Value;
use tracing::debug;

use context::RepairContext;
use layers::{preprocess, validator, PipelineOutcome};

/// Repair `input` and parse it into a [`serde_json::Value`].
///
/// # Examples
///
/// ```
/// use jsonrepair::{repair, Options};
///
/// let broken = r#"{name: 'John', age: 30,}"#;
/// let value = repair(broken, &Options::default())?;
/// assert_eq!(value["name"], "John");
/// assert_eq!(value["age"], 30);
/// # Ok::<(), jsonrepair::RepairError>(())
/// ```
pub fn repair(input: &str, opts: &Options) -> Result<Value> {
    repair_with_log(input, opts).map(|(v, _)| v)
}

/// Like [`repair`], but also returns the accumulated repair log
/// alongside the value. The log is populated only when `opts.logging`
/// is true; otherwise it's empty, matching the plain [`repair`] cost.
pub fn repair_with_log(input: &str, opts: &Options) -> Result<(Value, Vec<RepairAction>)> {
    let (value, ctx) = run(input, opts)?;
    let repairs = if opts.logging { ctx.repairs } else { Vec::new() };
    Ok((value, repairs))
}

/// Alias for [`repair`] matching the Python `json_repair.loads()` naming.
pub fn loads(input: &str, opts: &Options) -> Result<Value> {
    repair(input, opts)
}

/// Repair `input` and re-serialize the result to canonical JSON text.
///
/// # Examples
///
/// ```
/// use jsonrepair::{repair_to_string, Options};
///
/// let broken = r#"[1, 2, 3,]"#;
/// let repaired = repair_to_string(broken, &Options::default())?;
/// assert_eq!(repaired, "[1,2,3]");
/// # Ok::<(), jsonrepair::RepairError>(())
/// ```
pub fn repair_to_string(input: &str, opts: &Options) -> Result<String> {
    repair_to_string_with_log(input, opts).map(|(s, _)| s)
}

/// Like [`repair_to_string`], but also returns the accumulated repair
/// log alongside the text. The log is populated only when
/// `opts.logging` is true.
///
/// # Examples
///
/// ```
/// use jsonrepair::{repair_to_string_with_log, Options};
///
/// let opts = Options { logging: true, ..Options::default() };
/// let (repaired, log) = repair_to_string_with_log("[1, 2 /*c*/, 3]", &opts)?;
/// assert_eq!(repaired, "[1,2,3]");
/// assert!(!log.is_empty());
/// # Ok::<(), jsonrepair::RepairError>(())
/// ```
pub fn repair_to_string_with_log(input: &str, opts: &Options) -> Result<(String, Vec<RepairAction>)> {
    let (value, ctx) = run(input, opts)?;
    let text = serde_json::to_string(&value)?;
    let repairs = if opts.logging { ctx.repairs } else { Vec::new() };
    Ok((text, repairs))
}

/// Read a UTF-8 file and repair its contents into a [`serde_json::Value`].
///
/// # Examples
///
/// ```no_run
/// use jsonrepair::{from_file, Options};
///
/// let value = from_file("broken.json", &Options::default())?;
/// # Ok::<(), jsonrepair::RepairError>(())
/// ```
pub fn from_file<P: AsRef<std::path::Path>>(path: P, opts: &Options) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    repair(&content, opts)
}

/// Alias for [`from_file`] matching the Python `json_repair.load()` naming.
pub fn load<P: AsRef<std::path::Path>>(path: P, opts: &Options) -> Result<Value> {
    from_file(path, opts)
}

/// The boundary-behavior result for empty / whitespace-only input: a
/// JSON string value, per the plain-text gate.
fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

fn run(input: &str, opts: &Options) -> Result<(Value, RepairContext)> {
    let mut ctx = RepairContext::new();

    if opts.strict_mode {
        validator::check_strict(input)?;
        let value = validator::decode(input)?;
        return Ok((value, ctx));
    }

    if is_blank(input) {
        return Ok((Value::String(String::new()), ctx));
    }

    if opts.fast_path_optimization {
        if let Some(value) = validator::try_decode(input) {
            debug!("fast path accepted input unchanged");
            return Ok((value, ctx));
        }
    }

    match preprocess::run(input, opts, &mut ctx) {
        preprocess::PreprocessOutcome::Single(text) => {
            let value = run_single(&text, &mut ctx)?;
            Ok((value, ctx))
        }
        preprocess::PreprocessOutcome::Multiple(candidates) => {
            let values = run_multiple(candidates, &mut ctx)?;
            Ok((Value::Array(values), ctx))
        }
    }
}

/// Runs the layer pipeline plus L4 over one already-preprocessed
/// candidate string.
fn run_single(text: &str, ctx: &mut RepairContext) -> Result<Value> {
    match layers::run_pipeline(text, false, ctx) {
        PipelineOutcome::PlainText(s) => Ok(Value::String(s)),
        PipelineOutcome::Repaired(final_text) => validator::decode(&final_text).map_err(|_| {
            RepairError::unrepairable(format!(
                "could not produce valid JSON from: {}",
                truncate_for_error(&final_text)
            ))
        }),
    }
}

/// Runs every candidate from multiple-value detection independently and
/// assembles an array. Fails the whole operation if any single candidate
/// cannot be repaired, rather than returning a partial prefix.
fn run_multiple(candidates: Vec<String>, ctx: &mut RepairContext) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        values.push(run_single(&candidate, ctx)?);
    }

    // Structurally identical successive values replace the previous one:
    // collapse adjacent objects that share the same key set, keeping the
    // later (more up to date) one.
    let mut collapsed: Vec<Value> = Vec::with_capacity(values.len());
    for v in values.drain(..) {
        let replaces_previous = match (collapsed.last(), &v) {
            (Some(Value::Object(prev)), Value::Object(cur)) => {
                let mut prev_keys: Vec<&String> = prev.keys().collect();
                let mut cur_keys: Vec<&String> = cur.keys().collect();
                prev_keys.sort();
                cur_keys.sort();
                prev_keys == cur_keys
            }
            _ => false,
        };
        if replaces_previous {
            collapsed.pop();
        }
        collapsed.push(v);
    }

    // Trailing empty structures carry no information once more than one
    // value was found; drop them.
    while collapsed.len() > 1 {
        match collapsed.last() {
            Some(Value::Object(m)) if m.is_empty() => {
                collapsed.pop();
            }
            Some(Value::Array(a)) if a.is_empty() => {
                collapsed.pop();
            }
            _ => break,
        }
    }

    Ok(collapsed)
}

fn truncate_for_error(s: &str) -> String {
    const MAX: usize = 80;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let head: String = s.chars().take(MAX).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests;

//! The fixed, ordered repair pipeline: a `Layer` trait plus a static,
//! priority-sorted list of stages. Each layer only ever hands text to
//! the next one; nothing here decodes JSON, that is L4's (`validator`)
//! job, invoked by the top-level `repair` functions in `lib.rs` once
//! this pipeline is done.

pub mod content_cleaner;
pub mod normalizer;
pub mod preprocess;
pub mod structural;
pub mod validator;

use crate::context::RepairContext;

/// What a single layer did with its input.
pub enum StepResult {
    /// Hand `String` to the next layer in the pipeline.
    Next(String),
    /// The plain-text gate fired: stop the pipeline and return this text
    /// as-is, bypassing every later layer including validation.
    StopAsPlainText(String),
}

/// A single stage of the repair pipeline.
///
/// `supports` lets a layer opt out of input it has nothing to do for.
/// None of the current layers need this, every layer always runs, but
/// the hook exists so a future layer can be added without changing the
/// orchestrator.
pub trait Layer {
    fn name(&self) -> &'static str;
    /// Lower runs first.
    fn priority(&self) -> u8;
    fn supports(&self, input: &str) -> bool;
    fn process(&self, input: &str, ctx: &mut RepairContext) -> StepResult;
}

pub struct ContentCleanerLayer {
    pub tolerate_hash_comments: bool,
}

impl Layer for ContentCleanerLayer {
    fn name(&self) -> &'static str {
        "content_cleaner"
    }
    fn priority(&self) -> u8 {
        10
    }
    fn supports(&self, _input: &str) -> bool {
        true
    }
    fn process(&self, input: &str, ctx: &mut RepairContext) -> StepResult {
        match content_cleaner::run(input, self.tolerate_hash_comments, ctx) {
            content_cleaner::L1Outcome::Ok(s) => StepResult::Next(s),
            content_cleaner::L1Outcome::Continue(s) => StepResult::StopAsPlainText(s),
        }
    }
}

pub struct StructuralRepairLayer;

impl Layer for StructuralRepairLayer {
    fn name(&self) -> &'static str {
        "structural_repair"
    }
    fn priority(&self) -> u8 {
        20
    }
    fn supports(&self, _input: &str) -> bool {
        true
    }
    fn process(&self, input: &str, ctx: &mut RepairContext) -> StepResult {
        StepResult::Next(structural::run(input, ctx))
    }
}

pub struct SyntaxNormalizerLayer;

impl Layer for SyntaxNormalizerLayer {
    fn name(&self) -> &'static str {
        "syntax_normalizer"
    }
    fn priority(&self) -> u8 {
        30
    }
    fn supports(&self, _input: &str) -> bool {
        true
    }
    fn process(&self, input: &str, ctx: &mut RepairContext) -> StepResult {
        StepResult::Next(normalizer::run(input, ctx))
    }
}

/// The outcome of running the ordered layer list over one candidate value.
pub enum PipelineOutcome {
    Repaired(String),
    PlainText(String),
}

/// Builds the fixed, priority-ordered layer list and runs `input`
/// through every layer until one reports `StopAsPlainText` or the list
/// is exhausted.
pub fn run_pipeline(input: &str, tolerate_hash_comments: bool, ctx: &mut RepairContext) -> PipelineOutcome {
    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(ContentCleanerLayer { tolerate_hash_comments }),
        Box::new(StructuralRepairLayer),
        Box::new(SyntaxNormalizerLayer),
    ];
    let mut layers = layers;
    layers.sort_by_key(|l| l.priority());

    let mut current = input.to_string();
    for layer in &layers {
        if !layer.supports(&current) {
            continue;
        }
        match layer.process(&current, ctx) {
            StepResult::Next(s) => current = s,
            StepResult::StopAsPlainText(s) => return PipelineOutcome::PlainText(s),
        }
    }
    PipelineOutcome::Repaired(current)
}

//! Component B — the parse context and the audit trail threaded through
//! every layer (§3).

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    ContentCleaning,
    StructuralRepair,
    SyntaxNormalization,
    Validation,
}

impl LayerId {
    pub fn name(self) -> &'static str {
        match self {
            LayerId::ContentCleaning => "content_cleaning",
            LayerId::StructuralRepair => "structural_repair",
            LayerId::SyntaxNormalization => "syntax_normalization",
            LayerId::Validation => "validation",
        }
    }
}

/// An audit record of one local edit applied by a layer (§3 RepairAction).
///
/// `position` is a character offset into the input *at the time the
/// issuing layer ran*; it is not comparable across layers without
/// knowing each layer's input length.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RepairAction {
    pub layer: LayerId,
    pub action: &'static str,
    pub position: Option<usize>,
    pub original: Option<String>,
    pub replacement: Option<String>,
}

impl RepairAction {
    pub fn new(layer: LayerId, action: &'static str, position: Option<usize>) -> Self {
        Self {
            layer,
            action,
            position,
            original: None,
            replacement: None,
        }
    }

    pub fn with_fragments(
        mut self,
        original: impl Into<Option<String>>,
        replacement: impl Into<Option<String>>,
    ) -> Self {
        self.original = original.into();
        self.replacement = replacement.into();
        self
    }
}

/// Threaded through the pipeline; each layer appends to `repairs` and may
/// stamp facts into `metadata` for downstream layers to read.
#[derive(Debug, Clone, Default)]
pub struct RepairContext {
    pub repairs: Vec<RepairAction>,
    pub metadata: BTreeMap<&'static str, String>,
}

impl RepairContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: RepairAction) {
        self.repairs.push(action);
    }

    pub fn log(&mut self, layer: LayerId, action: &'static str, position: Option<usize>) {
        self.push(RepairAction::new(layer, action, position));
    }
}

/// The L3 grammatical role (§3 ParseContext, §4.3 state table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Root,
    ObjectKey,
    ObjectValue,
    Array,
}

/// The L3 state record. `role_stack` depth equals structural nesting
/// depth minus one; `in_string` implies `string_delimiter.is_some()`.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub current_role: Role,
    pub role_stack: Vec<Role>,
    pub position: usize,
    pub in_string: bool,
    pub string_delimiter: Option<char>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            current_role: Role::Root,
            role_stack: Vec::new(),
            position: 0,
            in_string: false,
            string_delimiter: None,
        }
    }
}

impl ParseContext {
    pub fn enter(&mut self, role: Role) {
        self.role_stack.push(self.current_role);
        self.current_role = role;
    }

    pub fn exit(&mut self) {
        self.current_role = self.role_stack.pop().unwrap_or(Role::Root);
    }
}

/// An L2 delimiter stack entry (§3 Delimiter Frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Brace,
    Bracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterFrame {
    pub kind: FrameKind,
    pub open_position: usize,
}

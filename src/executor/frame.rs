use crate::ast::NodeId;
use crate::value::Value;
use compact_str::CompactString;
use std::collections::HashMap;

/// Scoped name → value bindings. One table lives at global scope and one per
/// activation frame; lookup never walks intermediate frames.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    bindings: HashMap<CompactString, Value>,
}

impl VariableTable {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: CompactString, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }
}

/// Re-entry state of a control node, keyed by its stable node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// The node has queued work and must be revisited on the climb.
    Entered,
    /// Remaining iterations of a `repeat`.
    Counting(i64),
}

pub type MarkerTable = HashMap<NodeId, ResumeState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Pushed by a function call; popped by return or normal completion.
    Call,
    /// Pushed by a `for` loop to host its counter variable.
    Loop,
}

#[derive(Debug)]
pub struct ActivationFrame {
    /// The call or loop node that pushed this frame.
    pub origin: NodeId,
    pub kind: FrameKind,
    pub variables: VariableTable,
    pub markers: MarkerTable,
}

impl ActivationFrame {
    pub fn new(kind: FrameKind, origin: NodeId) -> Self {
        Self {
            origin,
            kind,
            variables: VariableTable::default(),
            markers: MarkerTable::default(),
        }
    }
}

/// Name → defining `learn` node, populated as `learn` nodes execute.
#[derive(Debug, Default)]
pub struct FunctionTable {
    definitions: HashMap<CompactString, NodeId>,
}

impl FunctionTable {
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn insert(&mut self, name: CompactString, body: NodeId) {
        self.definitions.insert(name, body);
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.definitions.get(name).copied()
    }
}

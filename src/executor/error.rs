use crate::token::Token;
use crate::value::{ValueError, ValueKind};
use compact_str::CompactString;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaultKind {
    #[error("the {command} command was called with {actual} parameters but accepts {expected}")]
    ParameterCount {
        command: CompactString,
        actual: usize,
        expected: usize,
    },
    #[error("the {command} command only accepts {expected} values as parameters")]
    ParameterType {
        command: CompactString,
        expected: ValueKind,
    },
    #[error("the variable '{name}' was used without first being assigned a value")]
    UndefinedVariable { name: CompactString },
    #[error("an unknown function named '{name}' was called")]
    UnknownFunction { name: CompactString },
    #[error("the function '{name}' is already defined")]
    DuplicateFunction { name: CompactString },
    #[error("the function '{name}' was called with {actual} parameters but expects {expected}")]
    FunctionArity {
        name: CompactString,
        actual: usize,
        expected: usize,
    },
    #[error("the '{operator}' operator expects exactly {expected} operands")]
    OperatorArity {
        operator: CompactString,
        expected: usize,
    },
    #[error("the '{operator}' operator cannot be applied: {source}")]
    OperatorType {
        operator: CompactString,
        source: ValueError,
    },
}

/// A runtime fault, pinned to the token that raised it. Faults are reported
/// through an [`ErrorSink`](super::ErrorSink) and never unwind the executor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct Fault {
    pub kind: FaultKind,
    pub token: Token,
}

impl Fault {
    pub fn new(kind: FaultKind, token: Token) -> Self {
        Self { kind, token }
    }

    /// Numeric code unique per construct and check phase.
    pub fn code(&self) -> u32 {
        let phase = match self.kind {
            FaultKind::ParameterCount { .. } | FaultKind::OperatorArity { .. } => 90,
            FaultKind::ParameterType { .. } | FaultKind::OperatorType { .. } => 91,
            FaultKind::UndefinedVariable { .. }
            | FaultKind::UnknownFunction { .. }
            | FaultKind::DuplicateFunction { .. } => 92,
            FaultKind::FunctionArity { .. } => 93,
        };
        20_000 + (self.token.kind as u32) * 100 + phase
    }
}

/// A fault rendered down to what a report needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub message: String,
    pub token: Token,
    pub code: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList {
    errors: Vec<ScriptError>,
}

impl ErrorList {
    pub fn add(&mut self, fault: &Fault) {
        self.errors.push(ScriptError {
            message: fault.to_string(),
            token: fault.token.clone(),
            code: fault.code(),
        });
    }

    pub fn errors(&self) -> &[ScriptError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#![allow(dead_code)]

use turtox::ast::{NodeId, ProgramTree};
use turtox::executor::{Executor, RecordingContext};
use turtox::token::{Token, TokenKind};
use turtox::value::Value;

pub fn word(tree: &mut ProgramTree, parent: NodeId, kind: TokenKind, look: &str) -> NodeId {
    tree.attach(parent, Token::word(kind, look))
}

pub fn number(tree: &mut ProgramTree, parent: NodeId, value: f64) -> NodeId {
    tree.attach_literal(
        parent,
        Token::word(TokenKind::Number, value.to_string()),
        Value::Number(value),
    )
}

pub fn string(tree: &mut ProgramTree, parent: NodeId, text: &str) -> NodeId {
    tree.attach_literal(
        parent,
        Token::word(TokenKind::String, text),
        Value::String(text.into()),
    )
}

pub fn boolean(tree: &mut ProgramTree, parent: NodeId, value: bool) -> NodeId {
    let (kind, look) = if value {
        (TokenKind::True, "true")
    } else {
        (TokenKind::False, "false")
    };
    tree.attach_literal(parent, Token::word(kind, look), Value::Bool(value))
}

pub fn variable(tree: &mut ProgramTree, parent: NodeId, name: &str) -> NodeId {
    word(tree, parent, TokenKind::Variable, name)
}

pub fn scope(tree: &mut ProgramTree, parent: NodeId) -> NodeId {
    word(tree, parent, TokenKind::Scope, "{")
}

/// An `=` node with its target variable attached; the caller attaches the
/// value expression as the second child.
pub fn assign(tree: &mut ProgramTree, parent: NodeId, name: &str) -> NodeId {
    let node = word(tree, parent, TokenKind::Assign, "=");
    variable(tree, node, name);
    node
}

/// A `learn` definition; returns the body scope.
pub fn learn(tree: &mut ProgramTree, parent: NodeId, name: &str, parameters: &[&str]) -> NodeId {
    let node = word(tree, parent, TokenKind::Learn, "learn");
    word(tree, node, TokenKind::Unknown, name);
    let list = word(tree, node, TokenKind::ArgumentList, "");
    for parameter in parameters {
        variable(tree, list, parameter);
    }
    scope(tree, node)
}

pub fn call(tree: &mut ProgramTree, parent: NodeId, name: &str) -> NodeId {
    word(tree, parent, TokenKind::FunctionCall, name)
}

pub fn run(tree: ProgramTree) -> (Executor, RecordingContext) {
    run_seeded(tree, 0)
}

pub fn run_seeded(tree: ProgramTree, seed: u64) -> (Executor, RecordingContext) {
    let mut executor = Executor::with_seed(tree, seed);
    let mut context = RecordingContext::new();
    executor.run(&mut context);
    (executor, context)
}

pub fn fault_code(kind: TokenKind, phase: u32) -> u32 {
    20_000 + (kind as u32) * 100 + phase
}

use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Stable index of a node in a [`ProgramTree`] arena.
///
/// Ids are only minted by the owning tree and stay valid for its lifetime,
/// so they can be used as keys for re-entry markers and function lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Node {
    token: Token,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// The most recent evaluation result of this node.
    value: Option<Value>,
}

/// Arena-backed program tree. The root is created on construction; all other
/// nodes are attached under an existing parent.
#[derive(Debug, Clone)]
pub struct ProgramTree {
    nodes: Vec<Node>,
}

impl ProgramTree {
    pub fn new() -> Self {
        let root = Node {
            token: Token::word(TokenKind::Root, "root"),
            parent: None,
            children: Vec::new(),
            value: None,
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn attach(&mut self, parent: NodeId, token: Token) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            token,
            parent: Some(parent),
            children: Vec::new(),
            value: None,
        });
        self.nodes[parent.to_usize()].children.push(id);
        id
    }

    /// Attach a literal node with its value already computed.
    pub fn attach_literal(&mut self, parent: NodeId, token: Token, value: Value) -> NodeId {
        let id = self.attach(parent, token);
        self.nodes[id.to_usize()].value = Some(value);
        id
    }

    pub fn token(&self, id: NodeId) -> &Token {
        &self.nodes[id.to_usize()].token
    }

    pub fn kind(&self, id: NodeId) -> TokenKind {
        self.nodes[id.to_usize()].token.kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.to_usize()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.to_usize()].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.to_usize()].children.get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.to_usize()].children.len()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.to_usize()].children.is_empty()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, 0)
    }

    /// The sibling immediately after `id` under its parent, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&c| c == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes[id.to_usize()].value.as_ref()
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.nodes[id.to_usize()].value = Some(value);
    }
}

impl Default for ProgramTree {
    fn default() -> Self {
        Self::new()
    }
}

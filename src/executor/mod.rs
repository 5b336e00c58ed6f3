//! Stepped tree-walk execution.
//!
//! The executor owns a [`ProgramTree`] and a cursor into it. Each call to
//! [`Executor::step`] evaluates one node and moves the cursor using only the
//! tree's parent/child/sibling relations: there is no continuation stack, so
//! control nodes leave re-entry markers and get revisited on the climb out of
//! their bodies. A host drives the engine through an [`ExecutionContext`],
//! which receives drawing effects, editor events, and runtime faults.

mod context;
mod error;
mod formatter;
mod frame;

pub use context::{
    Action, ActionSink, ErrorSink, EventSink, ExecutionContext, RecordingContext, StdioContext,
};
pub use error::{ErrorList, Fault, FaultKind, ScriptError};
pub use formatter::{BasicFormatter, FaultFormatter, PrettyFormatter};
pub use frame::{
    ActivationFrame, FrameKind, FunctionTable, MarkerTable, ResumeState, VariableTable,
};

use crate::ast::{NodeId, ProgramTree};
use crate::token::TokenKind;
use crate::value::{Value, ValueError, ValueKind};
use compact_str::CompactString;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Executor {
    tree: ProgramTree,
    cursor: NodeId,
    /// Scope queued by a control node; entered on the next advance.
    pending_scope: Option<NodeId>,
    /// Evaluate the cursor again instead of advancing.
    re_evaluate: bool,
    returning: bool,
    return_value: Option<Value>,
    finished: bool,
    suspended: bool,
    globals: VariableTable,
    global_markers: MarkerTable,
    call_stack: Vec<ActivationFrame>,
    functions: FunctionTable,
    rng: StdRng,
}

impl Executor {
    pub fn new(tree: ProgramTree) -> Self {
        Self::with_rng(tree, StdRng::from_entropy())
    }

    /// An executor whose `random` command is deterministic.
    pub fn with_seed(tree: ProgramTree, seed: u64) -> Self {
        Self::with_rng(tree, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tree: ProgramTree, rng: StdRng) -> Self {
        let root = tree.root();
        let finished = !tree.has_children(root);
        Self {
            cursor: root,
            pending_scope: Some(root),
            re_evaluate: false,
            returning: false,
            return_value: None,
            finished,
            suspended: false,
            globals: VariableTable::default(),
            global_markers: MarkerTable::default(),
            call_stack: Vec::new(),
            functions: FunctionTable::default(),
            tree,
            rng,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Number of live activation frames (calls and for-loops).
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn tree(&self) -> &ProgramTree {
        &self.tree
    }

    /// Lift the suspension set by `wait`. Does nothing once finished.
    pub fn resume(&mut self) {
        if !self.finished {
            self.suspended = false;
        }
    }

    /// Stop execution for good. Idempotent.
    pub fn abort(&mut self) {
        self.finished = true;
        self.suspended = false;
    }

    /// Step until the program finishes or suspends itself.
    pub fn run<C: ExecutionContext>(&mut self, ctx: &mut C) {
        while !self.finished && !self.suspended {
            self.step(ctx);
        }
    }

    /// Evaluate one node and advance the cursor. A no-op while finished or
    /// suspended.
    pub fn step<C: ExecutionContext>(&mut self, ctx: &mut C) {
        if self.finished || self.suspended {
            return;
        }

        if self.re_evaluate {
            self.re_evaluate = false;
            self.evaluate(ctx, self.cursor);
            return;
        }

        if self.returning {
            if self.call_stack.iter().any(|f| f.kind == FrameKind::Call) {
                // Unwind loop frames down to the call being returned from.
                while self
                    .call_stack
                    .last()
                    .is_some_and(|f| f.kind == FrameKind::Loop)
                {
                    self.call_stack.pop();
                }
                if let Some(frame) = self.call_stack.pop() {
                    self.cursor = frame.origin;
                    let value = self.return_value.take().unwrap_or_default();
                    self.tree.set_value(self.cursor, value);
                    // `returning` stays set; the call node's evaluation
                    // consumes it instead of re-entering the function.
                    self.evaluate(ctx, self.cursor);
                }
                return;
            }
            // A return outside any call discards the value and carries on.
            self.returning = false;
            self.return_value = None;
        }

        let next = if let Some(scope) = self.pending_scope.take() {
            match self.tree.first_child(scope) {
                Some(child) => child,
                // An empty scope still bounces to its control node.
                None => scope,
            }
        } else if let Some(sibling) = self.tree.next_sibling(self.cursor) {
            sibling
        } else {
            match self.tree.parent(self.cursor) {
                Some(parent) if parent != self.tree.root() => {
                    self.cursor = parent;
                    self.evaluate(ctx, parent);
                }
                _ => self.finished = true,
            }
            return;
        };

        // Walk down to the leaf-most executable unit. Scope and learn nodes
        // gate their own bodies, so descent stops there.
        let mut node = next;
        while !self.tree.kind(node).opens_scope() {
            match self.tree.first_child(node) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.cursor = node;
        self.evaluate(ctx, node);
    }

    fn evaluate<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        let kind = self.tree.kind(node);
        if !matches!(kind, TokenKind::Root | TokenKind::Scope) {
            ctx.highlight(self.tree.token(node).span);
        }
        match kind {
            TokenKind::Root | TokenKind::Unknown | TokenKind::ArgumentList => {}
            // Literal nodes carry their value from construction.
            TokenKind::String | TokenKind::Number | TokenKind::True | TokenKind::False => {}
            TokenKind::Scope => self.execute_scope(node),
            TokenKind::Variable => self.execute_variable(ctx, node),
            TokenKind::FunctionCall => self.execute_function_call(ctx, node),
            TokenKind::Exit => self.execute_exit(),
            TokenKind::If => self.execute_if(node),
            TokenKind::Repeat => self.execute_repeat(ctx, node),
            TokenKind::While => self.execute_while(node),
            TokenKind::ForTo => self.execute_for_to(ctx, node),
            TokenKind::Break => self.execute_break(ctx, node),
            TokenKind::Return => self.execute_return(node),
            TokenKind::Wait => self.execute_wait(ctx, node),
            TokenKind::Assign => self.execute_assign(ctx, node),
            TokenKind::Learn => self.execute_learn(ctx, node),

            TokenKind::And => self.execute_infix(ctx, node, Value::and),
            TokenKind::Or => self.execute_infix(ctx, node, Value::or),
            TokenKind::Not => self.execute_prefix(ctx, node),
            TokenKind::Equals => {
                self.execute_infix(ctx, node, |l, r| Ok(Value::Bool(l.is_equal(r))))
            }
            TokenKind::NotEquals => {
                self.execute_infix(ctx, node, |l, r| Ok(Value::Bool(!l.is_equal(r))))
            }
            TokenKind::GreaterThan => self.execute_infix(ctx, node, Value::greater_than),
            TokenKind::LessThan => self.execute_infix(ctx, node, Value::less_than),
            TokenKind::GreaterOrEquals => {
                self.execute_infix(ctx, node, Value::greater_than_or_equal)
            }
            TokenKind::LessOrEquals => self.execute_infix(ctx, node, Value::less_than_or_equal),
            TokenKind::Addition => self.execute_infix(ctx, node, Value::add),
            TokenKind::Subtraction => self.execute_infix(ctx, node, Value::subtract),
            TokenKind::Multiplication => self.execute_infix(ctx, node, Value::multiply),
            TokenKind::Division => self.execute_infix(ctx, node, Value::divide),
            TokenKind::Power => self.execute_infix(ctx, node, Value::power),

            TokenKind::Reset => self.execute_nullary(ctx, node, |c| c.reset()),
            TokenKind::Clear => self.execute_nullary(ctx, node, |c| c.clear()),
            TokenKind::Center => self.execute_nullary(ctx, node, |c| c.center()),
            TokenKind::Go => self.execute_binary_number(ctx, node, |c, x, y| c.go(x, y)),
            TokenKind::GoX => self.execute_unary_number(ctx, node, |c, x| c.go_x(x)),
            TokenKind::GoY => self.execute_unary_number(ctx, node, |c, y| c.go_y(y)),
            TokenKind::Forward => self.execute_unary_number(ctx, node, |c, d| c.forward(d)),
            TokenKind::Backward => self.execute_unary_number(ctx, node, |c, d| c.backward(d)),
            TokenKind::Direction => self.execute_unary_number(ctx, node, |c, d| c.direction(d)),
            TokenKind::TurnLeft => self.execute_unary_number(ctx, node, |c, d| c.turn_left(d)),
            TokenKind::TurnRight => self.execute_unary_number(ctx, node, |c, d| c.turn_right(d)),
            TokenKind::PenWidth => self.execute_unary_number(ctx, node, |c, w| c.pen_width(w)),
            TokenKind::PenUp => self.execute_nullary(ctx, node, |c| c.pen_up()),
            TokenKind::PenDown => self.execute_nullary(ctx, node, |c| c.pen_down()),
            TokenKind::PenColor => {
                self.execute_ternary_number(ctx, node, |c, r, g, b| c.pen_color(r, g, b))
            }
            TokenKind::CanvasColor => {
                self.execute_ternary_number(ctx, node, |c, r, g, b| c.canvas_color(r, g, b))
            }
            TokenKind::CanvasSize => {
                self.execute_binary_number(ctx, node, |c, w, h| c.canvas_size(w, h))
            }
            TokenKind::SpriteShow => self.execute_nullary(ctx, node, |c| c.sprite_show()),
            TokenKind::SpriteHide => self.execute_nullary(ctx, node, |c| c.sprite_hide()),
            TokenKind::Print => self.execute_text(ctx, node, |c, text| c.print(text)),
            TokenKind::FontSize => self.execute_unary_number(ctx, node, |c, s| c.font_size(s)),
            TokenKind::Message => self.execute_text(ctx, node, |c, text| c.message(text)),
            TokenKind::Random => self.execute_random(ctx, node),
            TokenKind::GetX => {
                if self.check_quantity(ctx, node, 0) {
                    let x = ctx.get_x();
                    self.tree.set_value(node, Value::Number(x));
                }
            }
            TokenKind::GetY => {
                if self.check_quantity(ctx, node, 0) {
                    let y = ctx.get_y();
                    self.tree.set_value(node, Value::Number(y));
                }
            }
            TokenKind::Ask => self.execute_ask(ctx, node),
            TokenKind::Pi => self.tree.set_value(node, Value::Number(std::f64::consts::PI)),
            TokenKind::Tan => self.execute_math(ctx, node, |x| x.to_radians().tan()),
            TokenKind::Sin => self.execute_math(ctx, node, |x| x.to_radians().sin()),
            TokenKind::Cos => self.execute_math(ctx, node, |x| x.to_radians().cos()),
            TokenKind::ArcTan => self.execute_math(ctx, node, |x| x.atan().to_degrees()),
            TokenKind::ArcSin => self.execute_math(ctx, node, |x| x.asin().to_degrees()),
            TokenKind::ArcCos => self.execute_math(ctx, node, |x| x.acos().to_degrees()),
            TokenKind::Sqrt => self.execute_math(ctx, node, f64::sqrt),
            TokenKind::Exp => self.execute_math(ctx, node, f64::exp),
        }
    }

    // -- control constructs --------------------------------------------------

    /// A scope node is reached both on the way in (sibling walk) and on the
    /// way out (climb from its last statement). Either way it bounces to the
    /// control node that owns it, which decides what happens next.
    fn execute_scope(&mut self, node: NodeId) {
        let Some(parent) = self.tree.parent(node) else {
            return;
        };
        let parent_kind = self.tree.kind(parent);
        if matches!(
            parent_kind,
            TokenKind::If | TokenKind::Repeat | TokenKind::While | TokenKind::ForTo
        ) {
            self.cursor = parent;
            self.re_evaluate = true;
        } else if parent_kind == TokenKind::Learn {
            // Falling off the end of a function returns the empty value.
            self.returning = true;
            self.return_value = None;
        } else if self.markers_mut().remove(&node).is_none() {
            // A bare block has no control node to gate it, so it queues its
            // own children; the marker keeps the climb out from re-entering.
            self.markers_mut().insert(node, ResumeState::Entered);
            self.pending_scope = Some(node);
        }
    }

    fn execute_if(&mut self, node: NodeId) {
        if self.markers_mut().remove(&node).is_some() {
            // A branch just finished; fall through to the sibling.
            return;
        }
        if self.child_value(node, 0).is_truthy() {
            if let Some(then_scope) = self.tree.child(node, 1) {
                self.markers_mut().insert(node, ResumeState::Entered);
                self.pending_scope = Some(then_scope);
            }
        } else if let Some(else_scope) = self.tree.child(node, 2) {
            self.markers_mut().insert(node, ResumeState::Entered);
            self.pending_scope = Some(else_scope);
        }
    }

    fn execute_repeat<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        match self.markers_mut().get(&node).copied() {
            Some(ResumeState::Counting(remaining)) => {
                if remaining > 0 {
                    self.markers_mut()
                        .insert(node, ResumeState::Counting(remaining - 1));
                    self.pending_scope = self.tree.child(node, 1);
                } else {
                    self.markers_mut().remove(&node);
                }
            }
            Some(ResumeState::Entered) | None => {
                let Some(count) = self.child_value(node, 0).as_number() else {
                    let command = self.tree.token(node).look.clone();
                    self.report(
                        ctx,
                        node,
                        FaultKind::ParameterType {
                            command,
                            expected: ValueKind::Number,
                        },
                    );
                    return;
                };
                // The body always runs once; the countdown covers the rest.
                self.markers_mut()
                    .insert(node, ResumeState::Counting(count.round() as i64 - 1));
                self.pending_scope = self.tree.child(node, 1);
            }
        }
    }

    fn execute_while(&mut self, node: NodeId) {
        if self.markers_mut().remove(&node).is_some() {
            // An iteration finished. Re-enter through the while node itself
            // so the condition expression is evaluated afresh.
            self.pending_scope = Some(node);
            return;
        }
        if self.child_value(node, 0).is_truthy() {
            self.markers_mut().insert(node, ResumeState::Entered);
            self.pending_scope = self.tree.child(node, 1);
        }
    }

    fn execute_for_to<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if self.markers_mut().remove(&node).is_some() {
            // An iteration finished. Re-enter through the for node itself so
            // the bound expressions are evaluated afresh.
            self.pending_scope = Some(node);
            return;
        }
        let Some(counter) = self.tree.first_child(node) else {
            return;
        };
        let counter_name = self.tree.token(counter).look.clone();
        let child_count = self.tree.child_count(node);
        let has_step = child_count == 5;
        let bound_count = if has_step { 3 } else { 2 };
        for index in 1..=bound_count {
            if self.child_value(node, index).as_number().is_none() {
                let command = self.tree.token(node).look.clone();
                self.report(
                    ctx,
                    node,
                    FaultKind::ParameterType {
                        command,
                        expected: ValueKind::Number,
                    },
                );
                // A bound that stops being a number abandons the loop.
                if self
                    .call_stack
                    .last()
                    .is_some_and(|f| f.kind == FrameKind::Loop && f.origin == node)
                {
                    self.call_stack.pop();
                }
                return;
            }
        }
        let start = self.child_number(node, 1);
        let end = self.child_number(node, 2);
        let step = if has_step {
            self.child_number(node, 3)
        } else {
            1.0
        };

        let first_iteration = !self
            .call_stack
            .last()
            .is_some_and(|f| f.kind == FrameKind::Loop && f.origin == node);
        if first_iteration {
            let mut frame = ActivationFrame::new(FrameKind::Loop, node);
            frame
                .variables
                .set(counter_name.clone(), Value::Number(start));
            self.call_stack.push(frame);
            ctx.variable_changed(&counter_name, &Value::Number(start));
        }
        let current = self
            .call_stack
            .last()
            .and_then(|f| f.variables.get(&counter_name))
            .and_then(Value::as_number)
            .unwrap_or(start);
        // The counter strictly never reaches the end bound.
        let continues = (start < end && current + step < end)
            || (start > end && current + step > end);
        if continues {
            if !first_iteration {
                let next = Value::Number(current + step);
                if let Some(frame) = self.call_stack.last_mut() {
                    frame.variables.set(counter_name.clone(), next.clone());
                }
                ctx.variable_changed(&counter_name, &next);
            }
            self.markers_mut().insert(node, ResumeState::Entered);
            self.pending_scope = self.tree.child(node, child_count - 1);
        } else {
            self.call_stack.pop();
        }
    }

    /// Terminate the nearest enclosing loop in the current function. Stale
    /// re-entry markers on the path are cleared so a later pass over the same
    /// nodes starts clean.
    fn execute_break<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_quantity(ctx, node, 0) {
            return;
        }
        let mut path = Vec::new();
        let mut walk = node;
        let target = loop {
            let Some(parent) = self.tree.parent(walk) else {
                return;
            };
            let kind = self.tree.kind(parent);
            if kind == TokenKind::Learn || kind == TokenKind::Root {
                // No enclosing loop within this function.
                return;
            }
            if kind.is_loop() {
                break parent;
            }
            path.push(parent);
            walk = parent;
        };
        let markers = self.markers_mut();
        for ancestor in path {
            markers.remove(&ancestor);
        }
        markers.remove(&target);
        if self.tree.kind(target) == TokenKind::ForTo
            && self
                .call_stack
                .last()
                .is_some_and(|f| f.kind == FrameKind::Loop && f.origin == target)
        {
            self.call_stack.pop();
        }
        self.cursor = target;
    }

    fn execute_return(&mut self, node: NodeId) {
        self.return_value = Some(if self.tree.has_children(node) {
            self.child_value(node, 0)
        } else {
            Value::None
        });
        self.returning = true;
    }

    fn execute_wait<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_quantity(ctx, node, 1) || !self.check_numbers(ctx, node) {
            return;
        }
        let seconds = self.child_number(node, 0);
        self.suspended = true;
        ctx.wait(seconds);
    }

    fn execute_exit(&mut self) {
        self.finished = true;
        self.suspended = false;
    }

    fn execute_assign<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_operand_count(ctx, node, 2) {
            return;
        }
        let Some(target) = self.tree.first_child(node) else {
            return;
        };
        let name = self.tree.token(target).look.clone();
        let value = self.child_value(node, 1);
        self.current_variables_mut().set(name.clone(), value.clone());
        ctx.variable_changed(&name, &value);
    }

    fn execute_learn<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        let Some(name_node) = self.tree.child(node, 0) else {
            return;
        };
        let name = self.tree.token(name_node).look.clone();
        if self.functions.contains(&name) {
            self.report(ctx, node, FaultKind::DuplicateFunction { name });
            return;
        }
        let parameters: Vec<CompactString> = match self.tree.child(node, 1) {
            Some(list) => self
                .tree
                .children(list)
                .iter()
                .map(|&p| self.tree.token(p).look.clone())
                .collect(),
            None => Vec::new(),
        };
        self.functions.insert(name.clone(), node);
        ctx.function_defined(&name, &parameters);
    }

    fn execute_function_call<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if self.returning {
            // Resumed from this call's return; the value is already cached.
            self.returning = false;
            self.return_value = None;
            return;
        }
        let name = self.tree.token(node).look.clone();
        let Some(learn) = self.functions.get(&name) else {
            self.report(ctx, node, FaultKind::UnknownFunction { name });
            return;
        };
        let Some(body) = self.tree.child(learn, 2) else {
            return;
        };
        let parameters = self.tree.child(learn, 1);
        let expected = parameters.map_or(0, |list| self.tree.child_count(list));
        let actual = self.tree.child_count(node);
        // Checked before the frame goes up, so a faulted call leaves the
        // stack depth untouched.
        if actual != expected {
            self.report(
                ctx,
                node,
                FaultKind::FunctionArity {
                    name,
                    actual,
                    expected,
                },
            );
            return;
        }
        let mut frame = ActivationFrame::new(FrameKind::Call, node);
        if let Some(list) = parameters {
            for (index, &parameter) in self.tree.children(list).iter().enumerate() {
                let parameter_name = self.tree.token(parameter).look.clone();
                frame.variables.set(parameter_name, self.child_value(node, index));
            }
        }
        self.call_stack.push(frame);
        self.pending_scope = Some(body);
    }

    fn execute_variable<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if let Some(parent) = self.tree.parent(node) {
            // In binding position the parent writes the variable; reading it
            // here would fault on the very assignment that defines it.
            if matches!(self.tree.kind(parent), TokenKind::Assign | TokenKind::ForTo)
                && self.tree.first_child(parent) == Some(node)
            {
                return;
            }
        }
        let name = self.tree.token(node).look.clone();
        match self.lookup_variable(&name).cloned() {
            Some(value) => self.tree.set_value(node, value),
            None => {
                self.tree.set_value(node, Value::None);
                self.report(ctx, node, FaultKind::UndefinedVariable { name });
            }
        }
    }

    // -- commands ------------------------------------------------------------

    fn execute_nullary<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        emit: impl FnOnce(&mut C),
    ) {
        if self.check_quantity(ctx, node, 0) {
            emit(ctx);
        }
    }

    fn execute_unary_number<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        emit: impl FnOnce(&mut C, f64),
    ) {
        if self.check_quantity(ctx, node, 1) && self.check_numbers(ctx, node) {
            emit(ctx, self.child_number(node, 0));
        }
    }

    fn execute_binary_number<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        emit: impl FnOnce(&mut C, f64, f64),
    ) {
        if self.check_quantity(ctx, node, 2) && self.check_numbers(ctx, node) {
            emit(ctx, self.child_number(node, 0), self.child_number(node, 1));
        }
    }

    fn execute_ternary_number<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        emit: impl FnOnce(&mut C, f64, f64, f64),
    ) {
        if self.check_quantity(ctx, node, 3) && self.check_numbers(ctx, node) {
            emit(
                ctx,
                self.child_number(node, 0),
                self.child_number(node, 1),
                self.child_number(node, 2),
            );
        }
    }

    /// Commands that take any single value and use its display string.
    fn execute_text<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        emit: impl FnOnce(&mut C, &str),
    ) {
        if self.check_quantity(ctx, node, 1) {
            let text = self.child_value(node, 0).to_string();
            emit(ctx, &text);
        }
    }

    fn execute_math<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        f: impl FnOnce(f64) -> f64,
    ) {
        if self.check_quantity(ctx, node, 1) && self.check_numbers(ctx, node) {
            let value = Value::Number(f(self.child_number(node, 0)));
            self.tree.set_value(node, value);
        }
    }

    fn execute_random<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_quantity(ctx, node, 2) || !self.check_numbers(ctx, node) {
            return;
        }
        let min = self.child_number(node, 0);
        let max = self.child_number(node, 1);
        let value = self.rng.gen::<f64>() * (max - min) + min;
        self.tree.set_value(node, Value::Number(value));
    }

    fn execute_ask<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_quantity(ctx, node, 1) {
            return;
        }
        let question = self.child_value(node, 0).to_string();
        let reply = ctx.ask(&question);
        self.tree.set_value(node, Value::String(reply));
    }

    // -- operators -----------------------------------------------------------

    fn execute_infix<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        op: impl FnOnce(&Value, &Value) -> Result<Value, ValueError>,
    ) {
        if !self.check_operand_count(ctx, node, 2) {
            return;
        }
        let lhs = self.child_value(node, 0);
        let rhs = self.child_value(node, 1);
        match op(&lhs, &rhs) {
            Ok(value) => self.tree.set_value(node, value),
            Err(source) => {
                let operator = self.tree.token(node).look.clone();
                self.tree.set_value(node, Value::None);
                self.report(ctx, node, FaultKind::OperatorType { operator, source });
            }
        }
    }

    fn execute_prefix<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) {
        if !self.check_operand_count(ctx, node, 1) {
            return;
        }
        match self.child_value(node, 0).not() {
            Ok(value) => self.tree.set_value(node, value),
            Err(source) => {
                let operator = self.tree.token(node).look.clone();
                self.tree.set_value(node, Value::None);
                self.report(ctx, node, FaultKind::OperatorType { operator, source });
            }
        }
    }

    // -- shared plumbing -----------------------------------------------------

    fn report<C: ExecutionContext>(&self, ctx: &mut C, node: NodeId, kind: FaultKind) {
        ctx.add_error(&Fault::new(kind, self.tree.token(node).clone()));
    }

    fn check_quantity<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        expected: usize,
    ) -> bool {
        let actual = self.tree.child_count(node);
        if actual == expected {
            return true;
        }
        let command = self.tree.token(node).look.clone();
        self.report(
            ctx,
            node,
            FaultKind::ParameterCount {
                command,
                actual,
                expected,
            },
        );
        false
    }

    fn check_numbers<C: ExecutionContext>(&mut self, ctx: &mut C, node: NodeId) -> bool {
        for index in 0..self.tree.child_count(node) {
            if self.child_value(node, index).as_number().is_none() {
                let command = self.tree.token(node).look.clone();
                self.report(
                    ctx,
                    node,
                    FaultKind::ParameterType {
                        command,
                        expected: ValueKind::Number,
                    },
                );
                return false;
            }
        }
        true
    }

    fn check_operand_count<C: ExecutionContext>(
        &mut self,
        ctx: &mut C,
        node: NodeId,
        expected: usize,
    ) -> bool {
        if self.tree.child_count(node) == expected {
            return true;
        }
        let operator = self.tree.token(node).look.clone();
        self.report(ctx, node, FaultKind::OperatorArity { operator, expected });
        false
    }

    /// The cached value of a child node, or the empty value if it has none.
    fn child_value(&self, node: NodeId, index: usize) -> Value {
        self.tree
            .child(node, index)
            .and_then(|child| self.tree.value(child))
            .cloned()
            .unwrap_or_default()
    }

    /// Only valid after [`Self::check_numbers`] has passed.
    fn child_number(&self, node: NodeId, index: usize) -> f64 {
        self.child_value(node, index).as_number().unwrap_or_default()
    }

    /// Two-tier lookup: the innermost frame, then global scope. Intermediate
    /// frames are invisible.
    fn lookup_variable(&self, name: &str) -> Option<&Value> {
        if let Some(frame) = self.call_stack.last() {
            if let Some(value) = frame.variables.get(name) {
                return Some(value);
            }
        }
        self.globals.get(name)
    }

    fn current_variables_mut(&mut self) -> &mut VariableTable {
        match self.call_stack.last_mut() {
            Some(frame) => &mut frame.variables,
            None => &mut self.globals,
        }
    }

    fn markers_mut(&mut self) -> &mut MarkerTable {
        match self.call_stack.last_mut() {
            Some(frame) => &mut frame.markers,
            None => &mut self.global_markers,
        }
    }
}

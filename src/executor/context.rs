use super::error::{ErrorList, Fault};
use crate::token::SourceSpan;
use crate::value::Value;
use compact_str::CompactString;
use std::io::BufRead;

/// One method per drawing/dialog effect the language can request. The engine
/// calls these as side effects of evaluation; implementations decide what
/// they mean (draw, record, echo).
pub trait ActionSink {
    fn reset(&mut self);
    fn clear(&mut self);
    fn center(&mut self);
    fn go(&mut self, x: f64, y: f64);
    fn go_x(&mut self, x: f64);
    fn go_y(&mut self, y: f64);
    fn forward(&mut self, distance: f64);
    fn backward(&mut self, distance: f64);
    fn direction(&mut self, degrees: f64);
    fn turn_left(&mut self, degrees: f64);
    fn turn_right(&mut self, degrees: f64);
    fn pen_width(&mut self, width: f64);
    fn pen_up(&mut self);
    fn pen_down(&mut self);
    fn pen_color(&mut self, red: f64, green: f64, blue: f64);
    fn canvas_color(&mut self, red: f64, green: f64, blue: f64);
    fn canvas_size(&mut self, width: f64, height: f64);
    fn sprite_show(&mut self);
    fn sprite_hide(&mut self);
    fn print(&mut self, text: &str);
    fn font_size(&mut self, size: f64);
    fn get_x(&mut self) -> f64;
    fn get_y(&mut self) -> f64;
    fn message(&mut self, text: &str);
    fn ask(&mut self, question: &str) -> CompactString;
    /// One-shot timer request; the engine suspends itself right after.
    fn wait(&mut self, seconds: f64);
}

/// Editor/inspector notifications. All default to no-ops.
pub trait EventSink {
    fn highlight(&mut self, span: SourceSpan) {
        let _ = span;
    }
    fn variable_changed(&mut self, name: &str, value: &Value) {
        let _ = (name, value);
    }
    fn function_defined(&mut self, name: &str, parameters: &[CompactString]) {
        let _ = (name, parameters);
    }
}

pub trait ErrorSink {
    fn add_error(&mut self, fault: &Fault);
}

impl ErrorSink for ErrorList {
    fn add_error(&mut self, fault: &Fault) {
        self.add(fault);
    }
}

/// Everything the executor needs from its host, in one bound.
pub trait ExecutionContext: ActionSink + EventSink + ErrorSink {}

impl<T: ActionSink + EventSink + ErrorSink> ExecutionContext for T {}

/// One recorded [`ActionSink`] call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Reset,
    Clear,
    Center,
    Go(f64, f64),
    GoX(f64),
    GoY(f64),
    Forward(f64),
    Backward(f64),
    Direction(f64),
    TurnLeft(f64),
    TurnRight(f64),
    PenWidth(f64),
    PenUp,
    PenDown,
    PenColor(f64, f64, f64),
    CanvasColor(f64, f64, f64),
    CanvasSize(f64, f64),
    SpriteShow,
    SpriteHide,
    Print(String),
    FontSize(f64),
    GetX,
    GetY,
    Message(String),
    Ask(String),
    Wait(f64),
}

/// Context that records everything the engine does; the workhorse of the
/// integration tests.
#[derive(Debug, Default)]
pub struct RecordingContext {
    actions: Vec<Action>,
    highlights: Vec<SourceSpan>,
    variable_events: Vec<(CompactString, Value)>,
    function_events: Vec<(CompactString, Vec<CompactString>)>,
    errors: ErrorList,
    ask_reply: CompactString,
    position: (f64, f64),
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn highlights(&self) -> &[SourceSpan] {
        &self.highlights
    }

    pub fn variable_events(&self) -> &[(CompactString, Value)] {
        &self.variable_events
    }

    pub fn function_events(&self) -> &[(CompactString, Vec<CompactString>)] {
        &self.function_events
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn set_ask_reply(&mut self, reply: impl Into<CompactString>) {
        self.ask_reply = reply.into();
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = (x, y);
    }
}

impl ActionSink for RecordingContext {
    fn reset(&mut self) {
        self.actions.push(Action::Reset);
    }
    fn clear(&mut self) {
        self.actions.push(Action::Clear);
    }
    fn center(&mut self) {
        self.actions.push(Action::Center);
    }
    fn go(&mut self, x: f64, y: f64) {
        self.actions.push(Action::Go(x, y));
    }
    fn go_x(&mut self, x: f64) {
        self.actions.push(Action::GoX(x));
    }
    fn go_y(&mut self, y: f64) {
        self.actions.push(Action::GoY(y));
    }
    fn forward(&mut self, distance: f64) {
        self.actions.push(Action::Forward(distance));
    }
    fn backward(&mut self, distance: f64) {
        self.actions.push(Action::Backward(distance));
    }
    fn direction(&mut self, degrees: f64) {
        self.actions.push(Action::Direction(degrees));
    }
    fn turn_left(&mut self, degrees: f64) {
        self.actions.push(Action::TurnLeft(degrees));
    }
    fn turn_right(&mut self, degrees: f64) {
        self.actions.push(Action::TurnRight(degrees));
    }
    fn pen_width(&mut self, width: f64) {
        self.actions.push(Action::PenWidth(width));
    }
    fn pen_up(&mut self) {
        self.actions.push(Action::PenUp);
    }
    fn pen_down(&mut self) {
        self.actions.push(Action::PenDown);
    }
    fn pen_color(&mut self, red: f64, green: f64, blue: f64) {
        self.actions.push(Action::PenColor(red, green, blue));
    }
    fn canvas_color(&mut self, red: f64, green: f64, blue: f64) {
        self.actions.push(Action::CanvasColor(red, green, blue));
    }
    fn canvas_size(&mut self, width: f64, height: f64) {
        self.actions.push(Action::CanvasSize(width, height));
    }
    fn sprite_show(&mut self) {
        self.actions.push(Action::SpriteShow);
    }
    fn sprite_hide(&mut self) {
        self.actions.push(Action::SpriteHide);
    }
    fn print(&mut self, text: &str) {
        self.actions.push(Action::Print(text.to_owned()));
    }
    fn font_size(&mut self, size: f64) {
        self.actions.push(Action::FontSize(size));
    }
    fn get_x(&mut self) -> f64 {
        self.actions.push(Action::GetX);
        self.position.0
    }
    fn get_y(&mut self) -> f64 {
        self.actions.push(Action::GetY);
        self.position.1
    }
    fn message(&mut self, text: &str) {
        self.actions.push(Action::Message(text.to_owned()));
    }
    fn ask(&mut self, question: &str) -> CompactString {
        self.actions.push(Action::Ask(question.to_owned()));
        self.ask_reply.clone()
    }
    fn wait(&mut self, seconds: f64) {
        self.actions.push(Action::Wait(seconds));
    }
}

impl EventSink for RecordingContext {
    fn highlight(&mut self, span: SourceSpan) {
        self.highlights.push(span);
    }
    fn variable_changed(&mut self, name: &str, value: &Value) {
        self.variable_events.push((name.into(), value.clone()));
    }
    fn function_defined(&mut self, name: &str, parameters: &[CompactString]) {
        self.function_events.push((name.into(), parameters.to_vec()));
    }
}

impl ErrorSink for RecordingContext {
    fn add_error(&mut self, fault: &Fault) {
        self.errors.add(fault);
    }
}

/// Context that echoes every effect as a `name(args)` line on stdout, reads
/// `ask` replies from stdin, and turns wait requests into a pending duration
/// the driver can sleep on.
#[derive(Debug, Default)]
pub struct StdioContext {
    position: (f64, f64),
    pending_wait: Option<f64>,
}

impl StdioContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the duration of the last `wait`, if one was requested.
    pub fn take_pending_wait(&mut self) -> Option<f64> {
        self.pending_wait.take()
    }
}

impl ActionSink for StdioContext {
    fn reset(&mut self) {
        println!("reset()");
    }
    fn clear(&mut self) {
        println!("clear()");
    }
    fn center(&mut self) {
        println!("center()");
    }
    fn go(&mut self, x: f64, y: f64) {
        self.position = (x, y);
        println!("go({x},{y})");
    }
    fn go_x(&mut self, x: f64) {
        self.position.0 = x;
        println!("gox({x})");
    }
    fn go_y(&mut self, y: f64) {
        self.position.1 = y;
        println!("goy({y})");
    }
    fn forward(&mut self, distance: f64) {
        println!("forward({distance})");
    }
    fn backward(&mut self, distance: f64) {
        println!("backward({distance})");
    }
    fn direction(&mut self, degrees: f64) {
        println!("direction({degrees})");
    }
    fn turn_left(&mut self, degrees: f64) {
        println!("turnleft({degrees})");
    }
    fn turn_right(&mut self, degrees: f64) {
        println!("turnright({degrees})");
    }
    fn pen_width(&mut self, width: f64) {
        println!("penwidth({width})");
    }
    fn pen_up(&mut self) {
        println!("penup()");
    }
    fn pen_down(&mut self) {
        println!("pendown()");
    }
    fn pen_color(&mut self, red: f64, green: f64, blue: f64) {
        println!("pencolor({red},{green},{blue})");
    }
    fn canvas_color(&mut self, red: f64, green: f64, blue: f64) {
        println!("canvascolor({red},{green},{blue})");
    }
    fn canvas_size(&mut self, width: f64, height: f64) {
        println!("canvassize({width},{height})");
    }
    fn sprite_show(&mut self) {
        println!("spriteshow()");
    }
    fn sprite_hide(&mut self) {
        println!("spritehide()");
    }
    fn print(&mut self, text: &str) {
        println!("print({text})");
    }
    fn font_size(&mut self, size: f64) {
        println!("fontsize({size})");
    }
    fn get_x(&mut self) -> f64 {
        self.position.0
    }
    fn get_y(&mut self) -> f64 {
        self.position.1
    }
    fn message(&mut self, text: &str) {
        println!("message({text})");
    }
    fn ask(&mut self, question: &str) -> CompactString {
        println!("ask({question})");
        let mut reply = String::new();
        if std::io::stdin().lock().read_line(&mut reply).is_err() {
            return CompactString::default();
        }
        reply.trim_end_matches(['\r', '\n']).into()
    }
    fn wait(&mut self, seconds: f64) {
        self.pending_wait = Some(seconds);
        println!("wait({seconds})");
    }
}

impl EventSink for StdioContext {}

impl ErrorSink for StdioContext {
    fn add_error(&mut self, fault: &Fault) {
        println!("ERR> {fault} (runtime error)");
    }
}

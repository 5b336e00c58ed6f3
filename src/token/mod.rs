use compact_str::CompactString;

/// Source range of a token, in 1-based rows and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl SourceSpan {
    pub const fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Unknown,
    Root,
    Scope,
    Variable,
    FunctionCall,
    ArgumentList,

    // Literals; their nodes carry a pre-computed value.
    String,
    Number,
    True,
    False,

    // Control constructs
    Exit,
    If,
    Repeat,
    While,
    ForTo,
    Break,
    Return,
    Wait,
    Assign,
    Learn,

    // Operators
    And,
    Or,
    Not,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEquals,
    LessOrEquals,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Power,

    // Built-in commands
    Reset,
    Clear,
    Center,
    Go,
    GoX,
    GoY,
    Forward,
    Backward,
    Direction,
    TurnLeft,
    TurnRight,
    PenWidth,
    PenUp,
    PenDown,
    PenColor,
    CanvasColor,
    CanvasSize,
    SpriteShow,
    SpriteHide,
    Print,
    FontSize,
    Random,
    GetX,
    GetY,
    Message,
    Ask,
    Pi,
    Tan,
    Sin,
    Cos,
    ArcTan,
    ArcSin,
    ArcCos,
    Sqrt,
    Exp,
}

impl TokenKind {
    pub fn is_loop(self) -> bool {
        matches!(self, TokenKind::Repeat | TokenKind::While | TokenKind::ForTo)
    }

    /// Nodes the cursor must not descend through while looking for the
    /// leaf-most executable unit: block markers and function definitions.
    pub fn opens_scope(self) -> bool {
        matches!(self, TokenKind::Scope | TokenKind::Learn)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The literal spelling of the token in the source.
    pub look: CompactString,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(kind: TokenKind, look: impl Into<CompactString>, span: SourceSpan) -> Self {
        Self {
            kind,
            look: look.into(),
            span,
        }
    }

    /// A token with no source position, for synthesized trees.
    pub fn word(kind: TokenKind, look: impl Into<CompactString>) -> Self {
        Self::new(kind, look, SourceSpan::default())
    }
}

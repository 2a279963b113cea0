//! Abstract syntax trees for expressions and instructions
//!
//! A method body is a list of instructions; each instruction is either
//! an assignment (`memory.x := <expr>`) or a call to one of the
//! built-in functions (`send`, `if`, `parse`, `build`, `compile`,
//! `spawn`, `destroy`), optionally assigning the call result into
//! memory. Arguments are expressions, parsed eagerly into
//! [`ExpressionAst`] at compile time.

/// The three readable roots an expression can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRoot {
    Memory,
    Context,
    Message,
}

impl MemoryRoot {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryRoot::Memory => "memory",
            MemoryRoot::Context => "context",
            MemoryRoot::Message => "message",
        }
    }

    pub fn from_ident(name: &str) -> Option<MemoryRoot> {
        match name {
            "memory" => Some(MemoryRoot::Memory),
            "context" => Some(MemoryRoot::Context),
            "message" => Some(MemoryRoot::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAst {
    IntLiteral(i64),
    DoubleLiteral(f64),
    StringLiteral(String),
    /// `memory.a.b`, `context.key`, or bare `message`.
    /// `path` holds the segments after the root.
    MemoryAccess { root: MemoryRoot, path: Vec<String> },
    Binary {
        op: BinaryOp,
        left: Box<ExpressionAst>,
        right: Box<ExpressionAst>,
    },
}

/// The built-in functions callable from an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Send,
    If,
    Parse,
    Build,
    Compile,
    Spawn,
    Destroy,
}

impl FunctionKind {
    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Send => "send",
            FunctionKind::If => "if",
            FunctionKind::Parse => "parse",
            FunctionKind::Build => "build",
            FunctionKind::Compile => "compile",
            FunctionKind::Spawn => "spawn",
            FunctionKind::Destroy => "destroy",
        }
    }

    pub fn from_name(name: &str) -> Option<FunctionKind> {
        match name {
            "send" => Some(FunctionKind::Send),
            "if" => Some(FunctionKind::If),
            "parse" => Some(FunctionKind::Parse),
            "build" => Some(FunctionKind::Build),
            "compile" => Some(FunctionKind::Compile),
            "spawn" => Some(FunctionKind::Spawn),
            "destroy" => Some(FunctionKind::Destroy),
            _ => None,
        }
    }

    /// Inclusive range of accepted argument counts.
    pub fn arity(self) -> (usize, usize) {
        match self {
            FunctionKind::Send | FunctionKind::Parse | FunctionKind::Build => (2, 2),
            FunctionKind::If | FunctionKind::Compile | FunctionKind::Spawn => (3, 3),
            FunctionKind::Destroy => (1, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionAst {
    /// `memory.a.b := <expr>`; `path` holds the full dotted target
    /// including the leading `memory` segment.
    Assignment { path: Vec<String>, expr: ExpressionAst },
    /// `<name>(args...)`, optionally `memory.p := <name>(args...)`.
    /// `result_path`, when present, includes the leading `memory`
    /// segment.
    FunctionCall {
        kind: FunctionKind,
        args: Vec<ExpressionAst>,
        result_path: Option<Vec<String>>,
    },
}

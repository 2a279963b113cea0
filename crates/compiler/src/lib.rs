//! AgeRun language front-end
//!
//! Parses the instruction language agents are scripted in. Two
//! surfaces:
//!
//! - [`parse_expression`]: the expression sub-language (`2 + 3 * 4`,
//!   `memory.count > 0`, `context.user.name`)
//! - [`parse_instruction`] / [`parse_method_source`]: whole
//!   instructions (`memory.x := <expr>`, `send(target, payload)`,
//!   `memory.id := spawn("echo", "1.0.0", memory.ctx)`) and
//!   newline-separated method bodies
//!
//! Parsing is separate from evaluation: this crate builds ASTs only
//! and knows nothing about agents, frames, or data values. The
//! runtime crate walks the ASTs.

pub mod ast;
pub mod error;
pub mod expression;
pub mod instruction;
pub mod token;

pub use ast::{BinaryOp, ExpressionAst, FunctionKind, InstructionAst, MemoryRoot};
pub use error::ParseError;
pub use expression::parse_expression;
pub use instruction::{MethodParseError, parse_instruction, parse_method_source};

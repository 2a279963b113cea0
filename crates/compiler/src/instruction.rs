//! Instruction parsers
//!
//! One small LL(1) parser per instruction form, all sharing the
//! tokenizer and the expression parser:
//!
//! ```text
//! instruction := assignment | call | result-call
//! assignment  := memory-path ':=' expression
//! call        := name '(' expression { ',' expression } ')'
//! result-call := memory-path ':=' call
//! memory-path := 'memory' '.' ident { '.' ident }
//! ```
//!
//! `name` must be one of the built-in functions; argument counts are
//! checked here so evaluators can assume well-formed ASTs. Function
//! calls are not expressions, so they cannot nest as arguments.

use crate::ast::{FunctionKind, InstructionAst};
use crate::error::ParseError;
use crate::expression;
use crate::token::{Cursor, TokenKind, tokenize};
use std::fmt;

/// Parse a single instruction line.
pub fn parse_instruction(source: &str) -> Result<InstructionAst, ParseError> {
    let tokens = tokenize(source)?;
    let mut cursor = Cursor::new(tokens, source.len());

    let start = cursor.position();
    let Some(TokenKind::Ident(first)) = cursor.peek().map(|t| t.kind.clone()) else {
        return Err(ParseError::new(start, "expected assignment or function call"));
    };

    // A known function name followed by '(' is a bare call; anything
    // else identifier-shaped must be an assignment target.
    if let Some(kind) = FunctionKind::from_name(&first) {
        if matches!(cursor.peek_second().map(|t| &t.kind), Some(TokenKind::LParen)) {
            let call = parse_call(&mut cursor, kind, None)?;
            cursor.expect_end()?;
            return Ok(call);
        }
    }

    let path = parse_target_path(&mut cursor)?;
    if !cursor.eat(&TokenKind::Assign) {
        return Err(ParseError::new(cursor.position(), "expected ':=' after assignment target"));
    }

    // Result-assigned call, or plain expression assignment.
    if let Some(TokenKind::Ident(name)) = cursor.peek().map(|t| t.kind.clone()) {
        if matches!(cursor.peek_second().map(|t| &t.kind), Some(TokenKind::LParen)) {
            let position = cursor.position();
            let Some(kind) = FunctionKind::from_name(&name) else {
                return Err(ParseError::new(position, format!("unknown function '{name}'")));
            };
            let call = parse_call(&mut cursor, kind, Some(path))?;
            cursor.expect_end()?;
            return Ok(call);
        }
    }

    let expr = expression::parse(&mut cursor)?;
    cursor.expect_end()?;
    Ok(InstructionAst::Assignment { path, expr })
}

/// Parse `memory.a.b`; rejects non-`memory` roots and a bare root
/// with no key.
fn parse_target_path(cursor: &mut Cursor) -> Result<Vec<String>, ParseError> {
    let start = cursor.position();
    let Some(TokenKind::Ident(root)) = cursor.advance().map(|t| t.kind) else {
        return Err(ParseError::new(start, "expected assignment target"));
    };

    let mut path = vec![root];
    while cursor.eat(&TokenKind::Dot) {
        let position = cursor.position();
        match cursor.advance().map(|t| t.kind) {
            Some(TokenKind::Ident(segment)) => path.push(segment),
            _ => return Err(ParseError::new(position, "expected identifier after '.'")),
        }
    }

    if path[0] != "memory" || path.len() < 2 {
        return Err(ParseError::new(start, "assignment target must start with 'memory.'"));
    }

    Ok(path)
}

/// Parse `kind(arg, ...)` with the name token still unconsumed.
fn parse_call(
    cursor: &mut Cursor,
    kind: FunctionKind,
    result_path: Option<Vec<String>>,
) -> Result<InstructionAst, ParseError> {
    let call_position = cursor.position();
    cursor.advance(); // function name
    if !cursor.eat(&TokenKind::LParen) {
        return Err(ParseError::new(cursor.position(), "expected '(' after function name"));
    }

    let mut args = Vec::new();
    if !cursor.eat(&TokenKind::RParen) {
        loop {
            args.push(expression::parse(cursor)?);
            if cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if cursor.eat(&TokenKind::RParen) {
                break;
            }
            return Err(ParseError::new(cursor.position(), "expected ',' or ')' in argument list"));
        }
    }

    let (min, max) = kind.arity();
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} or {max}")
        };
        return Err(ParseError::new(
            call_position,
            format!("{}() expects {} argument(s), got {}", kind.name(), expected, args.len()),
        ));
    }

    Ok(InstructionAst::FunctionCall { kind, args, result_path })
}

/// Error from compiling a multi-line method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParseError {
    /// 1-based line number within the method source.
    pub line: usize,
    pub error: ParseError,
}

impl fmt::Display for MethodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

impl std::error::Error for MethodParseError {}

/// Parse a method body: one instruction per line, blank lines and
/// `#` comment lines skipped.
pub fn parse_method_source(source: &str) -> Result<Vec<InstructionAst>, MethodParseError> {
    let mut instructions = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_instruction(line) {
            Ok(instruction) => instructions.push(instruction),
            Err(error) => return Err(MethodParseError { line: index + 1, error }),
        }
    }
    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, ExpressionAst, MemoryRoot};

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_assignment() {
        let ast = parse_instruction("memory.x := 42").unwrap();
        assert_eq!(
            ast,
            InstructionAst::Assignment {
                path: segs(&["memory", "x"]),
                expr: ExpressionAst::IntLiteral(42),
            }
        );
    }

    #[test]
    fn test_parse_string_assignment() {
        let ast = parse_instruction(r#"memory.greeting := "Hello, World!""#).unwrap();
        assert_eq!(
            ast,
            InstructionAst::Assignment {
                path: segs(&["memory", "greeting"]),
                expr: ExpressionAst::StringLiteral("Hello, World!".into()),
            }
        );
    }

    #[test]
    fn test_parse_nested_target_path() {
        let ast = parse_instruction(r#"memory.user.name := "Alice""#).unwrap();
        assert_eq!(
            ast,
            InstructionAst::Assignment {
                path: segs(&["memory", "user", "name"]),
                expr: ExpressionAst::StringLiteral("Alice".into()),
            }
        );
    }

    #[test]
    fn test_parse_expression_assignment() {
        let ast = parse_instruction("memory.result := 2 + 3 * 4").unwrap();
        match ast {
            InstructionAst::Assignment { path, expr } => {
                assert_eq!(path, segs(&["memory", "result"]));
                assert!(matches!(expr, ExpressionAst::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_memory_to_memory_assignment() {
        let ast = parse_instruction("memory.copy := memory.original").unwrap();
        match ast {
            InstructionAst::Assignment { expr, .. } => {
                assert_eq!(
                    expr,
                    ExpressionAst::MemoryAccess {
                        root: MemoryRoot::Memory,
                        path: segs(&["original"]),
                    }
                );
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let ast = parse_instruction("  memory.x  :=  42  ").unwrap();
        assert!(matches!(ast, InstructionAst::Assignment { .. }));
    }

    #[test]
    fn test_parse_send() {
        let ast = parse_instruction(r#"send(0, "Hello")"#).unwrap();
        assert_eq!(
            ast,
            InstructionAst::FunctionCall {
                kind: FunctionKind::Send,
                args: vec![
                    ExpressionAst::IntLiteral(0),
                    ExpressionAst::StringLiteral("Hello".into()),
                ],
                result_path: None,
            }
        );
    }

    #[test]
    fn test_parse_send_with_result() {
        let ast = parse_instruction(r#"memory.success := send(0, "Hello")"#).unwrap();
        match ast {
            InstructionAst::FunctionCall { kind, result_path, .. } => {
                assert_eq!(kind, FunctionKind::Send);
                assert_eq!(result_path, Some(segs(&["memory", "success"])));
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_call() {
        let ast = parse_instruction(r#"memory.r := if(memory.x > 5, 100, 200)"#).unwrap();
        match ast {
            InstructionAst::FunctionCall { kind, args, result_path } => {
                assert_eq!(kind, FunctionKind::If);
                assert_eq!(args.len(), 3);
                assert_eq!(result_path, Some(segs(&["memory", "r"])));
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_template_calls() {
        let parse_call = parse_instruction(r#"memory.m := parse("name={n}", "name=Ann")"#).unwrap();
        assert!(matches!(
            parse_call,
            InstructionAst::FunctionCall { kind: FunctionKind::Parse, .. }
        ));

        let build_call = parse_instruction(r#"build("Hello {name}", memory.values)"#).unwrap();
        assert!(matches!(
            build_call,
            InstructionAst::FunctionCall { kind: FunctionKind::Build, .. }
        ));
    }

    #[test]
    fn test_parse_compile_call() {
        let ast =
            parse_instruction(r#"compile("greet", "memory.msg := \"Hi\"", "1.0.0")"#).unwrap();
        match ast {
            InstructionAst::FunctionCall { kind, args, .. } => {
                assert_eq!(kind, FunctionKind::Compile);
                assert_eq!(args[1], ExpressionAst::StringLiteral(r#"memory.msg := "Hi""#.into()));
            }
            other => panic!("expected function call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_spawn_call() {
        let ast = parse_instruction(r#"memory.id := spawn("echo", "1.0.0", memory.ctx)"#).unwrap();
        assert!(matches!(
            ast,
            InstructionAst::FunctionCall { kind: FunctionKind::Spawn, .. }
        ));
    }

    #[test]
    fn test_parse_destroy_both_arities() {
        let one = parse_instruction("destroy(42)").unwrap();
        match one {
            InstructionAst::FunctionCall { kind: FunctionKind::Destroy, args, .. } => {
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected destroy call, got {other:?}"),
        }

        let two = parse_instruction(r#"destroy("calculator", "1.0.0")"#).unwrap();
        match two {
            InstructionAst::FunctionCall { kind: FunctionKind::Destroy, args, .. } => {
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected destroy call, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_line_rejected() {
        assert!(parse_instruction("").is_err());
    }

    #[test]
    fn test_plain_equals_rejected() {
        let error = parse_instruction("memory.x = 42").unwrap_err();
        assert!(error.message.contains(":="));
    }

    #[test]
    fn test_bare_identifier_target_rejected() {
        let error = parse_instruction("x := 42").unwrap_err();
        assert!(error.message.contains("memory."));
    }

    #[test]
    fn test_context_target_rejected() {
        let error = parse_instruction("context.x := 42").unwrap_err();
        assert!(error.message.contains("memory."));
    }

    #[test]
    fn test_bare_memory_root_target_rejected() {
        let error = parse_instruction("memory := 42").unwrap_err();
        assert!(error.message.contains("memory."));
    }

    #[test]
    fn test_unknown_function_rejected() {
        let error = parse_instruction("unknown_func(1, 2)").unwrap_err();
        // Not a known function, so it is parsed as an assignment target
        assert!(error.message.contains("memory.") || error.message.contains("unknown"));

        let error = parse_instruction("memory.x := frobnicate(1)").unwrap_err();
        assert!(error.message.contains("unknown function 'frobnicate'"));
    }

    #[test]
    fn test_unterminated_call_rejected() {
        assert!(parse_instruction(r#"send(0, "hello""#).is_err());
        assert!(parse_instruction(r#"send(0, "hello)"#).is_err());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let error = parse_instruction("send(0)").unwrap_err();
        assert!(error.message.contains("2 argument"));

        let error = parse_instruction("if(1, 2)").unwrap_err();
        assert!(error.message.contains("3 argument"));

        let error = parse_instruction(r#"destroy("a", "1.0.0", 3)"#).unwrap_err();
        assert!(error.message.contains("1 or 2"));
    }

    #[test]
    fn test_nested_call_argument_rejected() {
        // Function calls are not expressions
        let error = parse_instruction(r#"send(0, build("msg", memory.data))"#).unwrap_err();
        assert!(error.message.contains("build"));
    }

    #[test]
    fn test_two_instructions_on_one_line_rejected() {
        assert!(parse_instruction("memory.x := 1; memory.y := 2").is_err());
    }

    #[test]
    fn test_parse_method_source_skips_blanks_and_comments() {
        let source = "\n# counter method\nmemory.count := memory.count + 1\n\nsend(0, memory.count)\n";
        let instructions = parse_method_source(source).unwrap();
        assert_eq!(instructions.len(), 2);
    }

    #[test]
    fn test_parse_method_source_reports_line() {
        let source = "memory.a := 1\nmemory.b :=\n";
        let error = parse_method_source(source).unwrap_err();
        assert_eq!(error.line, 2);
    }

    #[test]
    fn test_parse_method_source_empty_is_ok() {
        assert_eq!(parse_method_source("").unwrap().len(), 0);
        assert_eq!(parse_method_source("# only a comment\n").unwrap().len(), 0);
    }
}

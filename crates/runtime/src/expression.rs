//! Expression evaluator
//!
//! Walks an [`ExpressionAst`] against a [`Frame`]. A pure memory
//! access (`memory.x`, `message`) evaluates to a borrowed alias into
//! the frame; literals and computed values evaluate to fresh owned
//! data. [`Evaluated::into_owned`] is the claim-or-copy boundary:
//! owned results move out as-is, borrowed results are shallow-copied
//! (and a borrowed nested container is therefore not materializable).
//!
//! Numeric coercion promotes Integer to Double when the operand types
//! mix. Comparisons between mismatched types yield false rather than
//! erroring; arithmetic on non-numbers and integer division by zero
//! are errors (no value, recorded on the event log).

use crate::frame::Frame;
use agerun_compiler::ast::{BinaryOp, ExpressionAst, MemoryRoot};
use agerun_core::{Data, EventLog};

/// Result of evaluating an expression: an alias into the frame, or a
/// newly produced value.
#[derive(Debug)]
pub enum Evaluated<'a> {
    Ref(&'a Data),
    Owned(Data),
}

impl<'a> Evaluated<'a> {
    /// Borrow the underlying value, whichever side it lives on.
    pub fn get(&self) -> &Data {
        match self {
            Evaluated::Ref(data) => data,
            Evaluated::Owned(data) => data,
        }
    }

    /// Claim the value: move it when owned, shallow-copy it when
    /// borrowed. `None` means the value was a borrowed container with
    /// nested containers, which cannot be copied.
    pub fn into_owned(self) -> Option<Data> {
        match self {
            Evaluated::Ref(data) => data.shallow_copy(),
            Evaluated::Owned(data) => Some(data),
        }
    }
}

pub struct ExpressionEvaluator<'l> {
    log: &'l EventLog,
}

impl<'l> ExpressionEvaluator<'l> {
    pub fn new(log: &'l EventLog) -> Self {
        ExpressionEvaluator { log }
    }

    /// Evaluate `ast` against `frame`. `None` means evaluation failed
    /// and an error was recorded.
    pub fn evaluate<'f>(&self, frame: &'f Frame<'_>, ast: &ExpressionAst) -> Option<Evaluated<'f>> {
        match ast {
            ExpressionAst::IntLiteral(value) => Some(Evaluated::Owned(Data::Integer(*value))),
            ExpressionAst::DoubleLiteral(value) => Some(Evaluated::Owned(Data::Double(*value))),
            ExpressionAst::StringLiteral(value) => {
                Some(Evaluated::Owned(Data::String(value.clone())))
            }
            ExpressionAst::MemoryAccess { root, path } => {
                let base = match root {
                    MemoryRoot::Memory => frame.memory(),
                    MemoryRoot::Context => frame.context(),
                    MemoryRoot::Message => frame.message(),
                };
                if path.is_empty() {
                    return Some(Evaluated::Ref(base));
                }
                // A missing path reads as integer zero, so counters
                // can start from empty memory
                match base.get_segments(path) {
                    Some(data) => Some(Evaluated::Ref(data)),
                    None => Some(Evaluated::Owned(Data::Integer(0))),
                }
            }
            ExpressionAst::Binary { op, left, right } => {
                let left = self.evaluate(frame, left)?;
                let right = self.evaluate(frame, right)?;
                let result = self.apply_binary(*op, left.get(), right.get())?;
                Some(Evaluated::Owned(result))
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, left: &Data, right: &Data) -> Option<Data> {
        if op.is_comparison() {
            return Some(Data::Integer(i64::from(compare(op, left, right))));
        }
        self.apply_arithmetic(op, left, right)
    }

    fn apply_arithmetic(&self, op: BinaryOp, left: &Data, right: &Data) -> Option<Data> {
        match (left, right) {
            (Data::Integer(a), Data::Integer(b)) => {
                let result = match op {
                    BinaryOp::Add => a.wrapping_add(*b),
                    BinaryOp::Sub => a.wrapping_sub(*b),
                    BinaryOp::Mul => a.wrapping_mul(*b),
                    BinaryOp::Div => {
                        if *b == 0 {
                            self.log.error("integer division by zero");
                            return None;
                        }
                        a.wrapping_div(*b)
                    }
                    _ => return None,
                };
                Some(Data::Integer(result))
            }
            (Data::Integer(_), Data::Double(_))
            | (Data::Double(_), Data::Integer(_))
            | (Data::Double(_), Data::Double(_)) => {
                let a = as_f64(left)?;
                let b = as_f64(right)?;
                if op == BinaryOp::Div && b == 0.0 {
                    self.log.warning("double division by zero");
                }
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => return None,
                };
                Some(Data::Double(result))
            }
            _ => {
                self.log.error(format!(
                    "operator '{}' requires numeric operands, got {} and {}",
                    op.symbol(),
                    left.data_type().name(),
                    right.data_type().name()
                ));
                None
            }
        }
    }
}

fn as_f64(data: &Data) -> Option<f64> {
    match data {
        Data::Integer(value) => Some(*value as f64),
        Data::Double(value) => Some(*value),
        _ => None,
    }
}

/// Comparison semantics: numbers compare numerically across
/// Integer/Double, strings compare lexically, and everything else
/// (mismatched primitive types, containers) compares false.
fn compare(op: BinaryOp, left: &Data, right: &Data) -> bool {
    let ordering = match (left, right) {
        (Data::Integer(a), Data::Integer(b)) => a.partial_cmp(b),
        (Data::String(a), Data::String(b)) => a.partial_cmp(b),
        (Data::Integer(_) | Data::Double(_), Data::Integer(_) | Data::Double(_)) => {
            match (as_f64(left), as_f64(right)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        _ => None,
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Ne => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agerun_compiler::parse_expression;
    use agerun_core::MemorySink;

    fn eval_owned(memory: &mut Data, source: &str) -> Option<Data> {
        let log = EventLog::with_sink(Box::new(MemorySink::new()));
        let context = Data::map();
        let message = Data::from("msg");
        let frame = Frame::new(memory, &context, &message).unwrap();
        let evaluator = ExpressionEvaluator::new(&log);
        let ast = parse_expression(source).unwrap();
        let evaluated = evaluator.evaluate(&frame, &ast)?;
        evaluated.into_owned()
    }

    fn eval_fresh(source: &str) -> Option<Data> {
        let mut memory = Data::map();
        eval_owned(&mut memory, source)
    }

    #[test]
    fn test_literals_evaluate_to_owned_values() {
        assert_eq!(eval_fresh("42"), Some(Data::Integer(42)));
        assert_eq!(eval_fresh("2.5"), Some(Data::Double(2.5)));
        assert_eq!(eval_fresh(r#""hi""#), Some(Data::from("hi")));
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval_fresh("2 + 3 * 4"), Some(Data::Integer(14)));
        assert_eq!(eval_fresh("10 - 4 - 3"), Some(Data::Integer(3)));
        assert_eq!(eval_fresh("9 / 2"), Some(Data::Integer(4)));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_double() {
        assert_eq!(eval_fresh("1 + 0.5"), Some(Data::Double(1.5)));
        assert_eq!(eval_fresh("3.0 * 2"), Some(Data::Double(6.0)));
    }

    #[test]
    fn test_integer_division_by_zero_is_an_error() {
        let log = EventLog::with_sink(Box::new(MemorySink::new()));
        let mut memory = Data::map();
        let context = Data::map();
        let message = Data::Integer(0);
        let frame = Frame::new(&mut memory, &context, &message).unwrap();
        let evaluator = ExpressionEvaluator::new(&log);
        let ast = parse_expression("1 / 0").unwrap();
        assert!(evaluator.evaluate(&frame, &ast).is_none());
        assert!(log.last_error_message().unwrap().contains("division by zero"));
    }

    #[test]
    fn test_double_division_by_zero_is_flagged_but_yields_ieee() {
        let log = EventLog::with_sink(Box::new(MemorySink::new()));
        let mut memory = Data::map();
        let context = Data::map();
        let message = Data::Integer(0);
        let frame = Frame::new(&mut memory, &context, &message).unwrap();
        let evaluator = ExpressionEvaluator::new(&log);
        let ast = parse_expression("1.0 / 0.0").unwrap();
        let result = evaluator.evaluate(&frame, &ast).unwrap();
        assert_eq!(result.get().as_double(), Some(f64::INFINITY));
        assert!(log.last_warning().is_some());
    }

    #[test]
    fn test_comparisons_yield_integer_flags() {
        assert_eq!(eval_fresh("3 > 2"), Some(Data::Integer(1)));
        assert_eq!(eval_fresh("3 < 2"), Some(Data::Integer(0)));
        assert_eq!(eval_fresh("2 = 2"), Some(Data::Integer(1)));
        assert_eq!(eval_fresh("2 <> 2"), Some(Data::Integer(0)));
        assert_eq!(eval_fresh(r#""abc" < "abd""#), Some(Data::Integer(1)));
        assert_eq!(eval_fresh("1 <= 1.5"), Some(Data::Integer(1)));
    }

    #[test]
    fn test_mismatched_comparison_is_false() {
        assert_eq!(eval_fresh(r#"1 = "1""#), Some(Data::Integer(0)));
        assert_eq!(eval_fresh(r#""a" > 2"#), Some(Data::Integer(0)));
        // Even inequality on mismatched types is false
        assert_eq!(eval_fresh(r#"1 <> "1""#), Some(Data::Integer(0)));
    }

    #[test]
    fn test_string_plus_is_an_error() {
        assert_eq!(eval_fresh(r#""a" + "b""#), None);
    }

    #[test]
    fn test_memory_access_reads_the_frame() {
        let mut memory = Data::map();
        memory.set_path_integer("count", 41);
        assert_eq!(eval_owned(&mut memory, "memory.count + 1"), Some(Data::Integer(42)));
    }

    #[test]
    fn test_missing_memory_path_reads_as_zero() {
        let mut memory = Data::map();
        assert_eq!(eval_owned(&mut memory, "memory.absent"), Some(Data::Integer(0)));
        // Which is what lets a counter start from empty memory
        assert_eq!(eval_owned(&mut memory, "memory.count + 1"), Some(Data::Integer(1)));
    }

    #[test]
    fn test_borrowed_flat_map_is_shallow_copied() {
        let mut memory = Data::map();
        memory.set_path("user", Data::map()).unwrap();
        memory.set_path_string("user.name", "Ada");

        let copied = eval_owned(&mut memory, "memory.user").unwrap();
        assert_eq!(copied.get_path_string("name"), Some("Ada"));
        // The original is untouched
        assert_eq!(memory.get_path_string("user.name"), Some("Ada"));
    }

    #[test]
    fn test_borrowed_nested_container_is_not_copyable() {
        let mut memory = Data::map();
        memory.set_path("outer", Data::map()).unwrap();
        memory.set_path("outer.inner", Data::map()).unwrap();
        assert_eq!(eval_owned(&mut memory, "memory.outer"), None);
    }

    #[test]
    fn test_whole_message_access() {
        let log = EventLog::with_sink(Box::new(MemorySink::new()));
        let mut memory = Data::map();
        let context = Data::map();
        let message = Data::from("ping");
        let frame = Frame::new(&mut memory, &context, &message).unwrap();
        let evaluator = ExpressionEvaluator::new(&log);
        let ast = parse_expression("message").unwrap();
        let evaluated = evaluator.evaluate(&frame, &ast).unwrap();
        assert!(matches!(evaluated, Evaluated::Ref(_)));
        assert_eq!(evaluated.get().as_str(), Some("ping"));
    }
}

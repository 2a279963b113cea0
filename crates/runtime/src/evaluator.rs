//! Instruction evaluators
//!
//! One evaluator per instruction kind, all sharing the same contract:
//! evaluate argument expressions against the frame, perform the side
//! effect, optionally store an integer or value result under
//! `memory.`, and report `true` on success. Failures are local — they
//! are recorded on the event log and surfaced through the result
//! value (0), never propagated as panics.
//!
//! Every evaluated argument is either consumed (moved into a queue,
//! memory, or the methodology) or dropped here; nothing leaks
//! half-owned values.

use crate::delegation::Delegation;
use crate::expression::ExpressionEvaluator;
use crate::frame::Frame;
use crate::method::{Method, Version};
use crate::methodology::Methodology;
use crate::registry::AgentRegistry;
use crate::template;
use agerun_compiler::ast::{ExpressionAst, FunctionKind, InstructionAst};
use agerun_core::{Data, EventLog};

/// The mutable runtime collaborators an instruction may touch.
pub struct Services<'a> {
    pub methodology: &'a mut Methodology,
    pub agents: &'a mut AgentRegistry,
    pub delegation: &'a mut Delegation,
    pub log: &'a EventLog,
    /// Id of the agent whose method is executing; 0 when an
    /// instruction is driven directly by the host.
    pub self_id: i64,
}

/// Evaluate one instruction. Returns `true` when the instruction's
/// effect happened; diagnostics for failures are on the event log.
pub fn evaluate_instruction(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    instruction: &InstructionAst,
) -> bool {
    match instruction {
        InstructionAst::Assignment { path, expr } => eval_assignment(services, frame, path, expr),
        InstructionAst::FunctionCall { kind, args, result_path } => match kind {
            FunctionKind::Send => eval_send(services, frame, args, result_path.as_deref()),
            FunctionKind::If => eval_if(services, frame, args, result_path.as_deref()),
            FunctionKind::Parse => eval_parse(services, frame, args, result_path.as_deref()),
            FunctionKind::Build => eval_build(services, frame, args, result_path.as_deref()),
            FunctionKind::Compile => eval_compile(services, frame, args, result_path.as_deref()),
            FunctionKind::Spawn => eval_spawn(services, frame, args, result_path.as_deref()),
            FunctionKind::Destroy => eval_destroy(services, frame, args, result_path.as_deref()),
        },
    }
}

// ----------------------------------------------------------------------
// Argument helpers
// ----------------------------------------------------------------------

/// Evaluate to an owned value (claim-or-copy).
fn eval_owned(log: &EventLog, frame: &Frame<'_>, ast: &ExpressionAst) -> Option<Data> {
    let evaluated = ExpressionEvaluator::new(log).evaluate(frame, ast)?;
    let owned = evaluated.into_owned();
    if owned.is_none() {
        log.error("value with nested containers cannot be copied");
    }
    owned
}

fn eval_string(log: &EventLog, frame: &Frame<'_>, ast: &ExpressionAst) -> Option<String> {
    let evaluated = ExpressionEvaluator::new(log).evaluate(frame, ast)?;
    match evaluated.get().as_str() {
        Some(text) => Some(text.to_string()),
        None => {
            log.error(format!(
                "expected a string argument, got {}",
                evaluated.get().data_type().name()
            ));
            None
        }
    }
}

fn eval_integer(log: &EventLog, frame: &Frame<'_>, ast: &ExpressionAst) -> Option<i64> {
    let evaluated = ExpressionEvaluator::new(log).evaluate(frame, ast)?;
    match evaluated.get().as_integer() {
        Some(value) => Some(value),
        None => {
            log.error(format!(
                "expected an integer argument, got {}",
                evaluated.get().data_type().name()
            ));
            None
        }
    }
}

/// Store a value under the optional `memory.` result path. A failed
/// store drops the value and records the error.
fn store_result(log: &EventLog, frame: &mut Frame<'_>, result_path: Option<&[String]>, value: Data) {
    let Some(path) = result_path else {
        return;
    };
    if frame.memory_mut().set_root_matched("memory", path, value).is_err() {
        log.error(format!("could not store result at {}", path.join(".")));
    }
}

fn store_flag(log: &EventLog, frame: &mut Frame<'_>, result_path: Option<&[String]>, flag: bool) {
    store_result(log, frame, result_path, Data::Integer(i64::from(flag)));
}

// ----------------------------------------------------------------------
// Per-kind evaluators
// ----------------------------------------------------------------------

fn eval_assignment(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    path: &[String],
    expr: &ExpressionAst,
) -> bool {
    let Some(value) = eval_owned(services.log, frame, expr) else {
        return false;
    };
    match frame.memory_mut().set_root_matched("memory", path, value) {
        Ok(()) => true,
        Err(_rejected) => {
            services.log.error(format!("assignment failed at {}", path.join(".")));
            false
        }
    }
}

fn eval_send(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let Some(target) = eval_integer(services.log, frame, &args[0]) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };
    let Some(payload) = eval_owned(services.log, frame, &args[1]) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };

    // Id 0 is "no target": the payload is dropped without error.
    let delivered = if target == 0 {
        false
    } else if target > 0 {
        let delivered = services.agents.deliver(target, payload);
        if !delivered {
            services.log.warning(format!("send: no agent registered at id {target}"));
        }
        delivered
    } else {
        services.delegation.send_to_delegate(target, services.self_id, payload)
    };

    store_flag(services.log, frame, result_path, delivered);
    true
}

fn eval_if(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let condition = {
        let Some(evaluated) = ExpressionEvaluator::new(services.log).evaluate(frame, &args[0])
        else {
            store_flag(services.log, frame, result_path, false);
            return false;
        };
        match evaluated.get() {
            Data::Integer(value) => Some(*value != 0),
            Data::Double(value) => Some(*value != 0.0),
            other => {
                services.log.error(format!(
                    "if: condition must be numeric, got {}",
                    other.data_type().name()
                ));
                None
            }
        }
    };
    let Some(condition) = condition else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };

    // Exactly one branch expression is evaluated
    let branch = if condition { &args[1] } else { &args[2] };
    let Some(value) = eval_owned(services.log, frame, branch) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };
    store_result(services.log, frame, result_path, value);
    true
}

fn eval_parse(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let (Some(template_text), Some(input)) = (
        eval_string(services.log, frame, &args[0]),
        eval_string(services.log, frame, &args[1]),
    ) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };

    let parsed = template::parse_template(&template_text, &input);
    store_result(services.log, frame, result_path, parsed);
    true
}

fn eval_build(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let Some(template_text) = eval_string(services.log, frame, &args[0]) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };

    let rendered = {
        match ExpressionEvaluator::new(services.log).evaluate(frame, &args[1]) {
            Some(evaluated) if matches!(evaluated.get(), Data::Map(_)) => {
                Some(template::build_template(&template_text, evaluated.get()))
            }
            Some(evaluated) => {
                services.log.error(format!(
                    "build: second argument must be a map, got {}",
                    evaluated.get().data_type().name()
                ));
                None
            }
            None => None,
        }
    };

    match rendered {
        Some(text) => {
            store_result(services.log, frame, result_path, Data::String(text));
            true
        }
        None => {
            store_flag(services.log, frame, result_path, false);
            false
        }
    }
}

fn eval_compile(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let (Some(name), Some(source), Some(version)) = (
        eval_string(services.log, frame, &args[0]),
        eval_string(services.log, frame, &args[1]),
        eval_string(services.log, frame, &args[2]),
    ) else {
        store_flag(services.log, frame, result_path, false);
        return false;
    };

    match Method::compile(&name, &source, &version, services.log) {
        Some(method) => {
            services.methodology.register(method);
            store_flag(services.log, frame, result_path, true);
            true
        }
        None => {
            store_flag(services.log, frame, result_path, false);
            false
        }
    }
}

fn eval_spawn(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    let (Some(name), Some(version)) = (
        eval_string(services.log, frame, &args[0]),
        eval_string(services.log, frame, &args[1]),
    ) else {
        store_result(services.log, frame, result_path, Data::Integer(0));
        return false;
    };

    // The context argument is a map (snapshotted) or the literal 0
    // meaning "no context".
    let context = {
        match ExpressionEvaluator::new(services.log).evaluate(frame, &args[2]) {
            Some(evaluated) => match evaluated.get() {
                Data::Map(_) => {
                    let owned = evaluated.into_owned();
                    if owned.is_none() {
                        services.log.error("spawn: context has nested containers");
                    }
                    owned
                }
                Data::Integer(0) => Some(Data::map()),
                other => {
                    services.log.error(format!(
                        "spawn: context must be a map, got {}",
                        other.data_type().name()
                    ));
                    None
                }
            },
            None => None,
        }
    };
    let Some(context) = context else {
        store_result(services.log, frame, result_path, Data::Integer(0));
        return false;
    };

    match services.agents.spawn(services.methodology, services.log, &name, &version, context) {
        Some(id) => {
            store_result(services.log, frame, result_path, Data::Integer(id));
            true
        }
        None => {
            store_result(services.log, frame, result_path, Data::Integer(0));
            false
        }
    }
}

fn eval_destroy(
    services: &mut Services<'_>,
    frame: &mut Frame<'_>,
    args: &[ExpressionAst],
    result_path: Option<&[String]>,
) -> bool {
    // 1-arg form destroys an agent; 2-arg form unregisters a method
    let destroyed = if args.len() == 1 {
        match eval_integer(services.log, frame, &args[0]) {
            Some(id) => services.agents.begin_destroy(id),
            None => {
                store_flag(services.log, frame, result_path, false);
                return false;
            }
        }
    } else {
        let (Some(name), Some(version_text)) = (
            eval_string(services.log, frame, &args[0]),
            eval_string(services.log, frame, &args[1]),
        ) else {
            store_flag(services.log, frame, result_path, false);
            return false;
        };
        match Version::parse(&version_text) {
            Some(version) => services.methodology.unregister(&name, version, services.agents),
            None => {
                services.log.error(format!("destroy: invalid version '{version_text}'"));
                false
            }
        }
    };

    store_flag(services.log, frame, result_path, destroyed);
    destroyed
}

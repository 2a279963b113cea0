//! AgeRun runtime
//!
//! The agent runtime on top of `agerun-core` (values, event log) and
//! `agerun-compiler` (the instruction language front-end):
//!
//! - `frame` / `expression` / `evaluator`: a method executes against a
//!   `(memory, context, message)` frame; the expression evaluator
//!   walks ASTs and distinguishes borrowed frame aliases from owned
//!   results; the instruction evaluators perform the side effects
//!   (assign, send, if, parse, build, compile, spawn, destroy)
//! - `method` / `methodology`: named, versioned, compiled-once methods
//! - `agent` / `registry`: agents with private memory and FIFO queues,
//!   registered under monotonically increasing positive ids
//! - `system`: the single-threaded cooperative loop — one message per
//!   step, delegates serviced before agents
//! - `delegate` and friends: negative-id participants that handle
//!   messages natively (file, network stub, log) behind the
//!   delegation facade
//! - `store`: YAML snapshots of the methodology and the agency
//! - `template`: the `{hole}` template engine behind parse/build
//!
//! ```
//! use agerun_core::Data;
//! use agerun_runtime::System;
//!
//! let mut system = System::new();
//! system.compile_method("counter", "memory.count := memory.count + 1", "1.0.0");
//! let id = system.spawn("counter", "1.0.0", Data::map()).unwrap();
//! system.deliver(id, Data::map());
//! // The __spawn__ lifecycle message counts too
//! system.run_until_idle();
//! assert_eq!(
//!     system.agents().get(id).unwrap().memory().get_path_integer("count"),
//!     Some(2),
//! );
//! ```

pub mod agent;
pub mod delegate;
pub mod delegate_registry;
pub mod delegation;
pub mod evaluator;
pub mod expression;
pub mod file_delegate;
pub mod frame;
pub mod log_delegate;
pub mod method;
pub mod methodology;
pub mod network_delegate;
pub mod registry;
pub mod store;
pub mod system;
pub mod template;

pub use agent::{Agent, LIFECYCLE_DESTROY, LIFECYCLE_KEY, LIFECYCLE_SPAWN};
pub use delegate::DelegateHandler;
pub use delegate_registry::DelegateRegistry;
pub use delegation::Delegation;
pub use evaluator::{Services, evaluate_instruction};
pub use expression::{Evaluated, ExpressionEvaluator};
pub use file_delegate::FileDelegate;
pub use frame::Frame;
pub use log_delegate::LogDelegate;
pub use method::{Method, Version};
pub use methodology::Methodology;
pub use network_delegate::NetworkDelegate;
pub use registry::AgentRegistry;
pub use store::StoreError;
pub use system::System;

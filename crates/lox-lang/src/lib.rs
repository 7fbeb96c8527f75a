//! A tree-walking runtime for a small Lox-style language: it evaluates an
//! already-parsed program tree, optionally rewriting it first through static
//! optimization passes (constant propagation/folding and unused-binding
//! elimination).
//!
//! ```rust
//! use lox_lang::{Engine, Number, node::{Expr, Literal, Stmt}};
//!
//! let mut engine = Engine::with_output(Vec::new());
//! let mut program = vec![Stmt::Print(Expr::Literal(Literal::Number(
//!     Number::new(42.0),
//! )))];
//! engine.eval(&mut program).unwrap();
//!
//! assert_eq!(String::from_utf8(engine.into_output()).unwrap(), "42\n");
//! ```
mod ast;
mod engine;
mod eval;
mod number;
mod optimizer;

pub use ast::{IdentName, Params, Program, node};
pub use engine::Engine;
pub use eval::error::EvalError;
pub use eval::runtime_value::{Closure, Instance, NativeFn, NativeFunction, RuntimeValue};
pub use eval::{Evaluator, Options};
pub use number::Number;
pub use optimizer::{Optimizer, OptimizerError, Pass};

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::IdentName;

type TypeName = String;

/// Runtime conditions raised by the evaluator. The optimizer never raises;
/// anything it cannot resolve statically is left in the tree for the
/// evaluator to report.
#[derive(Error, Debug, PartialEq)]
pub enum EvalError {
    #[error("Undefined variable \"{0}\"")]
    UndefinedVariable(IdentName),
    #[error("Undefined property \"{1}\" on {0}")]
    UndefinedProperty(TypeName, IdentName),
    #[error("\"{0}\" is not callable")]
    NotCallable(TypeName),
    #[error("Invalid number of arguments in \"{0}\", expected {1}, got {2}")]
    InvalidNumberOfArguments(IdentName, u8, u8),
    #[error(r#"Invalid types for "{}", got {}"#, name, args.join(", "))]
    InvalidTypes { name: String, args: Vec<String> },
    #[error("Divided by 0")]
    ZeroDivision,
    #[error("Maximum recursion depth exceeded \"{0}\"")]
    RecursionError(u32),
    #[error("Failed to write output: {0}")]
    OutputError(String),
}

impl Diagnostic for EvalError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self {
            EvalError::UndefinedVariable(_) => "EvalError::UndefinedVariable",
            EvalError::UndefinedProperty(_, _) => "EvalError::UndefinedProperty",
            EvalError::NotCallable(_) => "EvalError::NotCallable",
            EvalError::InvalidNumberOfArguments(_, _, _) => "EvalError::InvalidNumberOfArguments",
            EvalError::InvalidTypes { .. } => "EvalError::InvalidTypes",
            EvalError::ZeroDivision => "EvalError::ZeroDivision",
            EvalError::RecursionError(_) => "EvalError::RecursionError",
            EvalError::OutputError(_) => "EvalError::OutputError",
        };
        Some(Box::new(code))
    }
}

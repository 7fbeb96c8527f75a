use std::{borrow::Cow, cell::RefCell, rc::Rc};

use itertools::Itertools;
use rustc_hash::FxHashMap;

use super::env::Env;
use super::error::EvalError;
use crate::{
    ast::{
        IdentName, Params,
        node::{BinaryOp, Ident, Literal, Stmt, UnaryOp},
    },
    number::Number,
};

/// A user-defined function paired with the frame captured at its declaration
/// site. The body is shared so cloning the value is cheap.
#[derive(Debug, Clone)]
pub struct Closure {
    pub name: Ident,
    pub params: Params,
    pub body: Rc<Vec<Stmt>>,
    pub env: Rc<RefCell<Env>>,
}

pub type NativeFn = fn(&[RuntimeValue]) -> Result<RuntimeValue, EvalError>;

/// A host-provided callable installed into the root frame (e.g. `sqrt`).
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFunction {
    pub name: IdentName,
    pub arity: usize,
    pub func: NativeFn,
}

/// A named-member record: the object shape produced by class instantiation.
/// Attribute access reads and writes its fields directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class: IdentName,
    pub fields: FxHashMap<Ident, RuntimeValue>,
}

#[derive(Debug, Clone, Default)]
pub enum RuntimeValue {
    Number(Number),
    Bool(bool),
    String(String),
    Function(Rc<Closure>),
    NativeFunction(Rc<NativeFunction>),
    Dict(Rc<RefCell<FxHashMap<Ident, RuntimeValue>>>),
    Instance(Rc<RefCell<Instance>>),
    #[default]
    Nil,
}

// Callables and objects compare by identity, everything else by value.
impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeValue::Number(a), RuntimeValue::Number(b)) => a == b,
            (RuntimeValue::Bool(a), RuntimeValue::Bool(b)) => a == b,
            (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
            (RuntimeValue::Function(a), RuntimeValue::Function(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::NativeFunction(a), RuntimeValue::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Dict(a), RuntimeValue::Dict(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Instance(a), RuntimeValue::Instance(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Nil, RuntimeValue::Nil) => true,
            _ => false,
        }
    }
}

impl From<bool> for RuntimeValue {
    fn from(b: bool) -> Self {
        RuntimeValue::Bool(b)
    }
}

impl From<String> for RuntimeValue {
    fn from(s: String) -> Self {
        RuntimeValue::String(s)
    }
}

impl From<&str> for RuntimeValue {
    fn from(s: &str) -> Self {
        RuntimeValue::String(s.to_string())
    }
}

impl From<Number> for RuntimeValue {
    fn from(n: Number) -> Self {
        RuntimeValue::Number(n)
    }
}

impl From<f64> for RuntimeValue {
    fn from(n: f64) -> Self {
        RuntimeValue::Number(Number::from(n))
    }
}

impl From<&Literal> for RuntimeValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::String(s) => RuntimeValue::String(s.clone()),
            Literal::Number(n) => RuntimeValue::Number(*n),
            Literal::Bool(b) => RuntimeValue::Bool(*b),
            Literal::Nil => RuntimeValue::Nil,
        }
    }
}

impl std::fmt::Display for RuntimeValue {
    /// The canonical display format: `true`/`false`, `nil`, numbers without a
    /// trailing `.0` when whole, strings as their text.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        let value: Cow<'_, str> = match self {
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Bool(b) => Cow::Owned(b.to_string()),
            Self::String(s) => Cow::Borrowed(s),
            Self::Function(closure) => Cow::Owned(format!("<fn {}>", closure.name)),
            Self::NativeFunction(native) => Cow::Owned(format!("<native fn {}>", native.name)),
            Self::Dict(map) => {
                let map = map.borrow();
                let entries = map
                    .iter()
                    .sorted_by(|(a, _), (b, _)| a.name.cmp(&b.name))
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .join(", ");
                Cow::Owned(format!("{{{}}}", entries))
            }
            Self::Instance(instance) => Cow::Owned(format!("{} instance", instance.borrow().class)),
            Self::Nil => Cow::Borrowed("nil"),
        };
        write!(f, "{}", value)
    }
}

impl RuntimeValue {
    pub const NIL: RuntimeValue = Self::Nil;
    pub const TRUE: RuntimeValue = Self::Bool(true);
    pub const FALSE: RuntimeValue = Self::Bool(false);

    #[inline(always)]
    pub fn name(&self) -> &str {
        match self {
            RuntimeValue::Number(_) => "number",
            RuntimeValue::Bool(_) => "bool",
            RuntimeValue::String(_) => "string",
            RuntimeValue::Function(_) => "function",
            RuntimeValue::NativeFunction(_) => "native_function",
            RuntimeValue::Dict(_) => "dict",
            RuntimeValue::Instance(_) => "instance",
            RuntimeValue::Nil => "nil",
        }
    }

    /// Only `nil` and `false` are falsy.
    #[inline(always)]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, RuntimeValue::Nil | RuntimeValue::Bool(false))
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, RuntimeValue::Nil)
    }

    /// Converts back to a literal when the value is representable in the
    /// tree. Callables and objects have no literal form.
    pub(crate) fn to_literal(&self) -> Option<Literal> {
        match self {
            RuntimeValue::Number(n) => Some(Literal::Number(*n)),
            RuntimeValue::Bool(b) => Some(Literal::Bool(*b)),
            RuntimeValue::String(s) => Some(Literal::String(s.clone())),
            RuntimeValue::Nil => Some(Literal::Nil),
            _ => None,
        }
    }

    /// Applies a binary operator. This is the single definition of operator
    /// semantics: the evaluator calls it at runtime and constant folding
    /// calls it at optimization time, so folded results match evaluation
    /// exactly.
    pub(crate) fn binary_op(
        op: BinaryOp,
        left: &RuntimeValue,
        right: &RuntimeValue,
    ) -> Result<RuntimeValue, EvalError> {
        match (op, left, right) {
            (BinaryOp::Add, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Number(*a + *b))
            }
            (BinaryOp::Add, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(RuntimeValue::String(format!("{}{}", a, b)))
            }
            (BinaryOp::Sub, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Number(*a - *b))
            }
            (BinaryOp::Mul, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Number(*a * *b))
            }
            (BinaryOp::Div, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                if b.is_zero() {
                    Err(EvalError::ZeroDivision)
                } else {
                    Ok(RuntimeValue::Number(*a / *b))
                }
            }
            (BinaryOp::Eq, left, right) => Ok(RuntimeValue::Bool(left == right)),
            (BinaryOp::NotEq, left, right) => Ok(RuntimeValue::Bool(left != right)),
            (BinaryOp::Gt, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Bool(a > b))
            }
            (BinaryOp::GtEq, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Bool(a >= b))
            }
            (BinaryOp::Lt, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Bool(a < b))
            }
            (BinaryOp::LtEq, RuntimeValue::Number(a), RuntimeValue::Number(b)) => {
                Ok(RuntimeValue::Bool(a <= b))
            }
            (BinaryOp::Gt, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(RuntimeValue::Bool(a > b))
            }
            (BinaryOp::GtEq, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(RuntimeValue::Bool(a >= b))
            }
            (BinaryOp::Lt, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(RuntimeValue::Bool(a < b))
            }
            (BinaryOp::LtEq, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(RuntimeValue::Bool(a <= b))
            }
            (op, left, right) => Err(EvalError::InvalidTypes {
                name: op.to_string(),
                args: vec![left.name().to_string(), right.name().to_string()],
            }),
        }
    }

    /// Applies a unary operator, shared by the evaluator and the folder the
    /// same way as [`RuntimeValue::binary_op`].
    pub(crate) fn unary_op(op: UnaryOp, operand: &RuntimeValue) -> Result<RuntimeValue, EvalError> {
        match (op, operand) {
            (UnaryOp::Neg, RuntimeValue::Number(n)) => Ok(RuntimeValue::Number(-*n)),
            (UnaryOp::Not, operand) => Ok(RuntimeValue::Bool(!operand.is_truthy())),
            (op, operand) => Err(EvalError::InvalidTypes {
                name: op.to_string(),
                args: vec![operand.name().to_string()],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RuntimeValue::Nil, false)]
    #[case(RuntimeValue::FALSE, false)]
    #[case(RuntimeValue::TRUE, true)]
    #[case(RuntimeValue::Number(Number::from(0)), true)]
    #[case(RuntimeValue::String("".to_string()), true)]
    fn test_truthiness(#[case] value: RuntimeValue, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[rstest]
    #[case(RuntimeValue::TRUE, "true")]
    #[case(RuntimeValue::FALSE, "false")]
    #[case(RuntimeValue::Nil, "nil")]
    #[case(RuntimeValue::Number(Number::from(3)), "3")]
    #[case(RuntimeValue::Number(Number::new(-3.0)), "-3")]
    #[case(RuntimeValue::Number(Number::new(2.5)), "2.5")]
    #[case(RuntimeValue::String("hello".to_string()), "hello")]
    fn test_canonical_display(#[case] value: RuntimeValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[rstest]
    #[case(BinaryOp::Add, 2.0, 3.0, RuntimeValue::Number(Number::new(5.0)))]
    #[case(BinaryOp::Sub, 5.0, 3.0, RuntimeValue::Number(Number::new(2.0)))]
    #[case(BinaryOp::Mul, 2.0, 3.0, RuntimeValue::Number(Number::new(6.0)))]
    #[case(BinaryOp::Div, 6.0, 3.0, RuntimeValue::Number(Number::new(2.0)))]
    #[case(BinaryOp::Gt, 2.0, 1.0, RuntimeValue::TRUE)]
    #[case(BinaryOp::LtEq, 2.0, 1.0, RuntimeValue::FALSE)]
    #[case(BinaryOp::Eq, 2.0, 2.0, RuntimeValue::TRUE)]
    #[case(BinaryOp::NotEq, 2.0, 2.0, RuntimeValue::FALSE)]
    fn test_numeric_binary_op(
        #[case] op: BinaryOp,
        #[case] left: f64,
        #[case] right: f64,
        #[case] expected: RuntimeValue,
    ) {
        let result =
            RuntimeValue::binary_op(op, &RuntimeValue::from(left), &RuntimeValue::from(right));
        assert_eq!(result, Ok(expected));
    }

    #[test]
    fn test_string_concat_and_compare() {
        let a = RuntimeValue::from("foo");
        let b = RuntimeValue::from("bar");
        assert_eq!(
            RuntimeValue::binary_op(BinaryOp::Add, &a, &b),
            Ok(RuntimeValue::from("foobar"))
        );
        assert_eq!(
            RuntimeValue::binary_op(BinaryOp::Lt, &b, &a),
            Ok(RuntimeValue::TRUE)
        );
    }

    #[test]
    fn test_cross_type_equality_is_false() {
        assert_eq!(
            RuntimeValue::binary_op(BinaryOp::Eq, &RuntimeValue::from(1.0), &RuntimeValue::TRUE),
            Ok(RuntimeValue::FALSE)
        );
    }

    #[test]
    fn test_type_mismatch() {
        let result = RuntimeValue::binary_op(
            BinaryOp::Sub,
            &RuntimeValue::from("a"),
            &RuntimeValue::from(1.0),
        );
        assert_eq!(
            result,
            Err(EvalError::InvalidTypes {
                name: "-".to_string(),
                args: vec!["string".to_string(), "number".to_string()],
            })
        );
    }

    #[test]
    fn test_division_by_zero() {
        let result = RuntimeValue::binary_op(
            BinaryOp::Div,
            &RuntimeValue::from(1.0),
            &RuntimeValue::from(0.0),
        );
        assert_eq!(result, Err(EvalError::ZeroDivision));
    }

    #[rstest]
    #[case(UnaryOp::Neg, RuntimeValue::from(42.0), Ok(RuntimeValue::Number(Number::new(-42.0))))]
    #[case(UnaryOp::Not, RuntimeValue::TRUE, Ok(RuntimeValue::FALSE))]
    #[case(UnaryOp::Not, RuntimeValue::Nil, Ok(RuntimeValue::TRUE))]
    #[case(UnaryOp::Not, RuntimeValue::from("x"), Ok(RuntimeValue::FALSE))]
    fn test_unary_op(
        #[case] op: UnaryOp,
        #[case] operand: RuntimeValue,
        #[case] expected: Result<RuntimeValue, EvalError>,
    ) {
        assert_eq!(RuntimeValue::unary_op(op, &operand), expected);
    }

    #[test]
    fn test_neg_non_number_fails() {
        let result = RuntimeValue::unary_op(UnaryOp::Neg, &RuntimeValue::from("a"));
        assert!(matches!(result, Err(EvalError::InvalidTypes { .. })));
    }
}

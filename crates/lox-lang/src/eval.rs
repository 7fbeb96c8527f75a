// This module executes a parsed Lox program tree against a chain of scope
// frames, writing `print` output to the evaluator's sink. Function return is
// threaded as an explicit control-flow result rather than unwound.
use std::{cell::RefCell, io, rc::Rc};

use crate::{Program, ast::node as ast};

pub mod env;
pub mod error;
pub mod runtime_value;

use env::Env;
use error::EvalError;
use runtime_value::{Closure, NativeFn, NativeFunction, RuntimeValue};

/// Configuration options for the evaluator.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum depth of the call stack to prevent infinite recursion.
    pub max_call_stack_depth: u32,
}

#[cfg(debug_assertions)]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_stack_depth: 32, // Lower call stack depth for debug builds.
        }
    }
}

#[cfg(not(debug_assertions))]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_stack_depth: 192, // Higher call stack depth for release builds.
        }
    }
}

/// The control-flow signal of statement execution: either execution fell
/// through normally, or a `return` was raised and is being carried outward
/// through any enclosing block frames to the nearest call boundary.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Return(RuntimeValue),
}

#[derive(Debug)]
pub struct Evaluator<W: io::Write> {
    /// The root frame. Child frames are created per block and per call.
    env: Rc<RefCell<Env>>,
    /// Sink for `print` statements.
    output: W,
    call_stack_depth: u32,
    pub(crate) options: Options,
}

impl<W: io::Write> Evaluator<W> {
    pub fn new(output: W) -> Self {
        Self {
            env: Rc::new(RefCell::new(Env::default())),
            output,
            call_stack_depth: 0,
            options: Options::default(),
        }
    }

    /// Installs a value binding in the root frame.
    pub fn define_value(&self, name: &str, value: RuntimeValue) {
        self.env.borrow_mut().define(ast::Ident::new(name), value);
    }

    /// Installs a host callable in the root frame.
    pub fn define_native(&self, name: &str, arity: usize, func: NativeFn) {
        self.define_value(
            name,
            RuntimeValue::NativeFunction(Rc::new(NativeFunction {
                name: name.into(),
                arity,
                func,
            })),
        );
    }

    pub(crate) fn into_output(self) -> W {
        self.output
    }

    /// Executes a program against the evaluator's root frame. A `return` at
    /// the top level stops execution of the remaining statements.
    pub fn eval(&mut self, program: &Program) -> Result<(), EvalError> {
        let env = Rc::clone(&self.env);
        for stmt in program {
            if let Flow::Return(_) = self.eval_stmt(stmt, &env)? {
                break;
            }
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &ast::Stmt, env: &Rc<RefCell<Env>>) -> Result<Flow, EvalError> {
        match stmt {
            ast::Stmt::Expression(expr) => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }
            ast::Stmt::Print(expr) => {
                let value = self.eval_expr(expr, env)?;
                writeln!(self.output, "{}", value)
                    .map_err(|e| EvalError::OutputError(e.to_string()))?;
                Ok(Flow::Normal)
            }
            ast::Stmt::Return(expr) => Ok(Flow::Return(self.eval_expr(expr, env)?)),
            ast::Stmt::Var(ident, initializer) => {
                let value = self.eval_expr(initializer, env)?;
                env.borrow_mut().define(ident.clone(), value);
                Ok(Flow::Normal)
            }
            ast::Stmt::If(condition, then_branch, else_branch) => {
                if self.eval_expr(condition, env)?.is_truthy() {
                    self.eval_stmt(then_branch, env)
                } else {
                    self.eval_stmt(else_branch, env)
                }
            }
            ast::Stmt::While(condition, body) => {
                // Explicit iteration: the condition is re-evaluated before
                // every pass, and stack depth stays constant regardless of
                // iteration count.
                while self.eval_expr(condition, env)?.is_truthy() {
                    if let Flow::Return(value) = self.eval_stmt(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::Block(statements) => self.eval_block(statements, env),
            ast::Stmt::Function(name, params, body) => {
                // The closure captures the frame it is declared in, and is
                // defined into that same frame so it can call itself.
                let closure = RuntimeValue::Function(Rc::new(Closure {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new(body.clone()),
                    env: Rc::clone(env),
                }));
                env.borrow_mut().define(name.clone(), closure);
                Ok(Flow::Normal)
            }
            ast::Stmt::Class(_) | ast::Stmt::NoOp => Ok(Flow::Normal),
        }
    }

    /// Runs a block in a fresh child frame; the frame is discarded on exit
    /// unless a closure declared inside captured it.
    fn eval_block(
        &mut self,
        statements: &[ast::Stmt],
        env: &Rc<RefCell<Env>>,
    ) -> Result<Flow, EvalError> {
        let block_env = Rc::new(RefCell::new(Env::with_parent(Rc::clone(env))));
        for stmt in statements {
            if let Flow::Return(value) = self.eval_stmt(stmt, &block_env)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_expr(
        &mut self,
        expr: &ast::Expr,
        env: &Rc<RefCell<Env>>,
    ) -> Result<RuntimeValue, EvalError> {
        match expr {
            ast::Expr::Literal(literal) => Ok(literal.into()),
            ast::Expr::Variable(ident) => self.eval_ident(ident, env),
            ast::Expr::Binary(left, op, right) => {
                let left_value = self.eval_expr(left, env)?;
                let right_value = self.eval_expr(right, env)?;
                RuntimeValue::binary_op(*op, &left_value, &right_value)
            }
            ast::Expr::Unary(op, operand) => {
                let value = self.eval_expr(operand, env)?;
                RuntimeValue::unary_op(*op, &value)
            }
            ast::Expr::And(left, right) => {
                if !self.eval_expr(left, env)?.is_truthy() {
                    return Ok(RuntimeValue::FALSE);
                }
                Ok(RuntimeValue::Bool(self.eval_expr(right, env)?.is_truthy()))
            }
            ast::Expr::Or(left, right) => {
                if self.eval_expr(left, env)?.is_truthy() {
                    return Ok(RuntimeValue::TRUE);
                }
                Ok(RuntimeValue::Bool(self.eval_expr(right, env)?.is_truthy()))
            }
            ast::Expr::Assign(ident, value_expr) => {
                // Existence is checked before the right-hand side runs, so a
                // failing assignment reports before any RHS side effects.
                let exists = env.borrow().contains(ident);
                if !exists {
                    return Err(EvalError::UndefinedVariable(ident.name.clone()));
                }
                let value = self.eval_expr(value_expr, env)?;
                env.borrow_mut()
                    .assign(ident, value.clone())
                    .map_err(|e| e.to_eval_error())?;
                Ok(value)
            }
            ast::Expr::Call(callee, args) => self.eval_call(callee, args, env),
            ast::Expr::Get(object, name) => self.eval_get(object, name, env),
            ast::Expr::Set(object, name, value) => self.eval_set(object, name, value, env),
            // Placeholders: resolved like ordinary variable reads so an
            // unbound use surfaces as an undefined-variable condition.
            ast::Expr::This => self.eval_ident(&ast::Ident::new("this"), env),
            ast::Expr::Super(_) => self.eval_ident(&ast::Ident::new("super"), env),
        }
    }

    fn eval_ident(
        &self,
        ident: &ast::Ident,
        env: &Rc<RefCell<Env>>,
    ) -> Result<RuntimeValue, EvalError> {
        env.borrow_mut()
            .resolve(ident)
            .map_err(|e| e.to_eval_error())
    }

    fn eval_call(
        &mut self,
        callee: &ast::Expr,
        args: &[ast::Expr],
        env: &Rc<RefCell<Env>>,
    ) -> Result<RuntimeValue, EvalError> {
        let callee_value = self.eval_expr(callee, env)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg, env)?);
        }

        match callee_value {
            RuntimeValue::Function(closure) => self.call_closure(&closure, arg_values),
            RuntimeValue::NativeFunction(native) => {
                if arg_values.len() != native.arity {
                    return Err(EvalError::InvalidNumberOfArguments(
                        native.name.clone(),
                        native.arity as u8,
                        arg_values.len() as u8,
                    ));
                }
                (native.func)(&arg_values)
            }
            other => Err(EvalError::NotCallable(other.name().to_string())),
        }
    }

    /// Invokes a user-defined function: a fresh frame is parented on the
    /// *captured* frame (lexical scoping), parameters are bound
    /// positionally, and a `return` raised in the body is caught here. A
    /// body that falls through yields `nil`.
    fn call_closure(
        &mut self,
        closure: &Closure,
        args: Vec<RuntimeValue>,
    ) -> Result<RuntimeValue, EvalError> {
        if args.len() != closure.params.len() {
            return Err(EvalError::InvalidNumberOfArguments(
                closure.name.name.clone(),
                closure.params.len() as u8,
                args.len() as u8,
            ));
        }

        self.enter_call()?;
        let call_env = Rc::new(RefCell::new(Env::with_parent(Rc::clone(&closure.env))));
        for (param, value) in closure.params.iter().zip(args) {
            call_env.borrow_mut().define(param.clone(), value);
        }

        let mut result = RuntimeValue::NIL;
        for stmt in closure.body.iter() {
            match self.eval_stmt(stmt, &call_env) {
                Ok(Flow::Return(value)) => {
                    result = value;
                    break;
                }
                Ok(Flow::Normal) => {}
                Err(e) => {
                    self.exit_call();
                    return Err(e);
                }
            }
        }
        self.exit_call();
        Ok(result)
    }

    fn eval_get(
        &mut self,
        object: &ast::Expr,
        name: &ast::Ident,
        env: &Rc<RefCell<Env>>,
    ) -> Result<RuntimeValue, EvalError> {
        let object_value = self.eval_expr(object, env)?;
        match &object_value {
            RuntimeValue::Dict(map) => map.borrow().get(name).cloned().ok_or_else(|| {
                EvalError::UndefinedProperty(object_value.name().to_string(), name.name.clone())
            }),
            RuntimeValue::Instance(instance) => {
                instance.borrow().fields.get(name).cloned().ok_or_else(|| {
                    EvalError::UndefinedProperty(
                        instance.borrow().class.to_string(),
                        name.name.clone(),
                    )
                })
            }
            other => Err(EvalError::InvalidTypes {
                name: name.to_string(),
                args: vec![other.name().to_string()],
            }),
        }
    }

    /// Attribute write: the member must already exist, checked before the
    /// value expression runs (mirroring assignment ordering).
    fn eval_set(
        &mut self,
        object: &ast::Expr,
        name: &ast::Ident,
        value_expr: &ast::Expr,
        env: &Rc<RefCell<Env>>,
    ) -> Result<RuntimeValue, EvalError> {
        let object_value = self.eval_expr(object, env)?;
        match &object_value {
            RuntimeValue::Dict(map) => {
                if !map.borrow().contains_key(name) {
                    return Err(EvalError::UndefinedProperty(
                        object_value.name().to_string(),
                        name.name.clone(),
                    ));
                }
                let value = self.eval_expr(value_expr, env)?;
                map.borrow_mut().insert(name.clone(), value.clone());
                Ok(value)
            }
            RuntimeValue::Instance(instance) => {
                if !instance.borrow().fields.contains_key(name) {
                    return Err(EvalError::UndefinedProperty(
                        instance.borrow().class.to_string(),
                        name.name.clone(),
                    ));
                }
                let value = self.eval_expr(value_expr, env)?;
                instance
                    .borrow_mut()
                    .fields
                    .insert(name.clone(), value.clone());
                Ok(value)
            }
            other => Err(EvalError::InvalidTypes {
                name: name.to_string(),
                args: vec![other.name().to_string()],
            }),
        }
    }

    fn enter_call(&mut self) -> Result<(), EvalError> {
        if self.call_stack_depth >= self.options.max_call_stack_depth {
            return Err(EvalError::RecursionError(self.options.max_call_stack_depth));
        }
        self.call_stack_depth += 1;
        Ok(())
    }

    fn exit_call(&mut self) {
        if self.call_stack_depth > 0 {
            self.call_stack_depth -= 1;
        }
    }
}

// Static rewrites applied to the program tree before evaluation. Passes
// mutate the tree in place and never raise: anything a pass cannot resolve
// statically is left as-is for the evaluator to handle at runtime.
use std::str::FromStr;

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::{
    Program,
    ast::{
        IdentName,
        node::{Expr, Literal, Stmt},
    },
    eval::runtime_value::RuntimeValue,
};

#[derive(Error, Debug, PartialEq)]
pub enum OptimizerError {
    #[error("Unknown optimization pass \"{0}\"")]
    UnknownPass(String),
}

impl Diagnostic for OptimizerError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            OptimizerError::UnknownPass(_) => Some(Box::new("OptimizerError::UnknownPass")),
        }
    }
}

/// A selectable optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ConstantPropagation,
    UnusedBindings,
}

impl FromStr for Pass {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "propagation" => Ok(Pass::ConstantPropagation),
            "unused-bindings" => Ok(Pass::UnusedBindings),
            _ => Err(OptimizerError::UnknownPass(s.to_string())),
        }
    }
}

pub struct Optimizer;

impl Optimizer {
    /// Applies the requested passes to `program` in place. The relative
    /// order is fixed (propagation before unused-binding elimination)
    /// regardless of the order passes were requested in.
    pub fn optimize(program: &mut Program, passes: &[Pass]) {
        if passes.contains(&Pass::ConstantPropagation) {
            ConstantPropagation::default().run(program);
        }
        if passes.contains(&Pass::UnusedBindings) {
            UnusedBindings.run(program);
        }
    }
}

/// Substitutes references to known-constant bindings with their literal
/// values and folds operations over literal operands. The constant map is
/// saved on block entry and restored on exit, mirroring the evaluator's
/// shadowing rules.
#[derive(Debug, Default)]
struct ConstantPropagation {
    constants: FxHashMap<IdentName, Literal>,
}

impl ConstantPropagation {
    fn run(&mut self, program: &mut Program) {
        for stmt in program.iter_mut() {
            self.propagate_stmt(stmt);
        }
    }

    /// `false` and `nil` are never recorded as propagatable, so falsy-value
    /// logic is left for the evaluator to decide.
    fn is_propagatable(literal: &Literal) -> bool {
        !matches!(literal, Literal::Bool(false) | Literal::Nil)
    }

    fn propagate_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) | Stmt::Return(expr) => {
                self.propagate_expr(expr);
            }
            Stmt::Var(ident, initializer) => {
                self.propagate_expr(initializer);
                if let Expr::Literal(literal) = initializer {
                    if Self::is_propagatable(literal) {
                        self.constants.insert(ident.name.clone(), literal.clone());
                    }
                }
            }
            Stmt::If(condition, then_branch, else_branch) => {
                self.propagate_expr(condition);
                self.propagate_stmt(then_branch);
                self.propagate_stmt(else_branch);
            }
            Stmt::While(condition, body) => {
                self.propagate_expr(condition);
                self.propagate_stmt(body);
            }
            Stmt::Block(statements) => {
                let saved = self.constants.clone();
                for stmt in statements {
                    self.propagate_stmt(stmt);
                }
                self.constants = saved;
            }
            // Bodies run later, possibly many times and with arbitrary
            // side-effecting arguments, so constant assumptions taken at
            // the declaration site are unsound inside them.
            Stmt::Function(_, _, _) => {}
            Stmt::Class(_) | Stmt::NoOp => {}
        }
    }

    fn propagate_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Binary(left, op, right) => {
                self.propagate_expr(left);
                self.propagate_expr(right);
                if let (Expr::Literal(l), Expr::Literal(r)) = (&**left, &**right) {
                    // Folding applies the same operator definition the
                    // evaluator uses; a fold that would error at runtime is
                    // left unfolded instead.
                    if let Some(folded) =
                        RuntimeValue::binary_op(*op, &l.into(), &r.into())
                            .ok()
                            .and_then(|value| value.to_literal())
                    {
                        *expr = Expr::Literal(folded);
                    }
                }
            }
            Expr::Unary(op, operand) => {
                self.propagate_expr(operand);
                if let Expr::Literal(l) = &**operand {
                    if let Some(folded) = RuntimeValue::unary_op(*op, &l.into())
                        .ok()
                        .and_then(|value| value.to_literal())
                    {
                        *expr = Expr::Literal(folded);
                    }
                }
            }
            Expr::Variable(ident) => {
                if let Some(literal) = self.constants.get(&ident.name) {
                    *expr = Expr::Literal(literal.clone());
                }
            }
            Expr::And(left, right) | Expr::Or(left, right) => {
                self.propagate_expr(left);
                self.propagate_expr(right);
            }
            Expr::Call(callee, args) => {
                // Arguments are propagated but a call is never folded.
                self.propagate_expr(callee);
                for arg in args {
                    self.propagate_expr(arg);
                }
            }
            Expr::Get(object, _) => self.propagate_expr(object),
            Expr::Set(object, _, value) => {
                self.propagate_expr(object);
                self.propagate_expr(value);
            }
            Expr::Assign(_, value) => self.propagate_expr(value),
            Expr::Literal(_) | Expr::This | Expr::Super(_) => {}
        }
    }
}

/// Replaces variable declarations whose name is never read with no-ops.
/// Works scope at a time: a survey phase collects the names read in the
/// scope (uses confined to an inner block are restored away, mirroring
/// shadowing), then unmarked declarations are rewritten. Dropping a
/// declaration drops its initializer's evaluation with it, side effects
/// included.
struct UnusedBindings;

impl UnusedBindings {
    fn run(&self, program: &mut Program) {
        self.eliminate_scope(program);
    }

    fn eliminate_scope(&self, statements: &mut Vec<Stmt>) {
        let mut used = FxHashSet::default();
        for stmt in statements.iter() {
            self.survey_stmt(stmt, &mut used);
        }
        for stmt in statements {
            self.eliminate_stmt(stmt, &used);
        }
    }

    fn survey_stmt(&self, stmt: &Stmt, used: &mut FxHashSet<IdentName>) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) | Stmt::Return(expr) => {
                self.survey_expr(expr, used);
            }
            Stmt::Var(_, initializer) => self.survey_expr(initializer, used),
            Stmt::If(condition, then_branch, else_branch) => {
                self.survey_expr(condition, used);
                self.survey_stmt(then_branch, used);
                self.survey_stmt(else_branch, used);
            }
            Stmt::While(condition, body) => {
                self.survey_expr(condition, used);
                self.survey_stmt(body, used);
            }
            Stmt::Block(statements) => {
                let saved = used.clone();
                for stmt in statements {
                    self.survey_stmt(stmt, used);
                }
                *used = saved;
            }
            Stmt::Function(name, _, body) => {
                // A declared function name counts as used; reads inside the
                // body are deferred, so they leak outward unrestored.
                used.insert(name.name.clone());
                for stmt in body {
                    self.survey_stmt(stmt, used);
                }
            }
            Stmt::Class(_) | Stmt::NoOp => {}
        }
    }

    fn survey_expr(&self, expr: &Expr, used: &mut FxHashSet<IdentName>) {
        match expr {
            Expr::Variable(ident) => {
                used.insert(ident.name.clone());
            }
            Expr::Binary(left, _, right) | Expr::And(left, right) | Expr::Or(left, right) => {
                self.survey_expr(left, used);
                self.survey_expr(right, used);
            }
            Expr::Unary(_, operand) => self.survey_expr(operand, used),
            Expr::Call(callee, args) => {
                self.survey_expr(callee, used);
                for arg in args {
                    self.survey_expr(arg, used);
                }
            }
            Expr::Get(object, _) => self.survey_expr(object, used),
            Expr::Set(object, _, value) => {
                self.survey_expr(object, used);
                self.survey_expr(value, used);
            }
            // The target is written, not read.
            Expr::Assign(_, value) => self.survey_expr(value, used),
            Expr::Literal(_) | Expr::This | Expr::Super(_) => {}
        }
    }

    fn eliminate_stmt(&self, stmt: &mut Stmt, used: &FxHashSet<IdentName>) {
        match stmt {
            Stmt::Var(ident, _) => {
                if !used.contains(&ident.name) {
                    *stmt = Stmt::NoOp;
                }
            }
            Stmt::If(_, then_branch, else_branch) => {
                self.eliminate_stmt(then_branch, used);
                self.eliminate_stmt(else_branch, used);
            }
            Stmt::While(_, body) => self.eliminate_stmt(body, used),
            Stmt::Block(statements) => self.eliminate_scope(statements),
            Stmt::Function(_, _, body) => self.eliminate_scope(body),
            Stmt::Expression(_)
            | Stmt::Print(_)
            | Stmt::Return(_)
            | Stmt::Class(_)
            | Stmt::NoOp => {}
        }
    }
}

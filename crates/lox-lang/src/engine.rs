use std::io;

use crate::{
    Program,
    eval::{Evaluator, error::EvalError, runtime_value::NativeFn, runtime_value::RuntimeValue},
    optimizer::{Optimizer, Pass},
};

/// The public entry point: owns an evaluator and an optimization pipeline
/// configuration, and runs programs through both.
#[derive(Debug)]
pub struct Engine<W: io::Write> {
    evaluator: Evaluator<W>,
    passes: Vec<Pass>,
}

impl Default for Engine<io::Stdout> {
    fn default() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: io::Write> Engine<W> {
    /// Creates an engine that writes `print` output to `output`, with both
    /// optimization passes enabled.
    pub fn with_output(output: W) -> Self {
        Self {
            evaluator: Evaluator::new(output),
            passes: vec![Pass::ConstantPropagation, Pass::UnusedBindings],
        }
    }

    /// Selects which optimization passes run before evaluation. An empty
    /// set means programs are evaluated exactly as given.
    pub fn set_passes(&mut self, passes: Vec<Pass>) {
        self.passes = passes;
    }

    pub fn set_max_call_stack_depth(&mut self, depth: u32) {
        self.evaluator.options.max_call_stack_depth = depth;
    }

    /// Binds a value in the root scope, visible to every program this
    /// engine evaluates.
    pub fn define_value(&self, name: &str, value: RuntimeValue) {
        self.evaluator.define_value(name, value);
    }

    /// Binds a host callable in the root scope.
    pub fn define_native(&self, name: &str, arity: usize, func: NativeFn) {
        self.evaluator.define_native(name, arity, func);
    }

    /// Optimizes `program` in place, then evaluates it. Successive calls
    /// share the engine's root scope.
    pub fn eval(&mut self, program: &mut Program) -> Result<(), EvalError> {
        Optimizer::optimize(program, &self.passes);
        self.evaluator.eval(program)
    }

    /// Consumes the engine and returns the output sink.
    pub fn into_output(self) -> W {
        self.evaluator.into_output()
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{BinaryOp, Expr, Ident, Literal, Stmt};
    use crate::number::Number;
    use smallvec::smallvec;

    fn num(value: f64) -> Expr {
        Expr::Literal(Literal::Number(Number::new(value)))
    }

    fn var(name: &str) -> Expr {
        Expr::Variable(Ident::new(name))
    }

    // fun zero() { return 0; }
    // var total = zero();
    // fun add(n) { total = total + n; return total; }
    // add(2); add(3);
    // print total;
    //
    // `total` is seeded through a call so propagation does not record it as
    // a constant; a literal initializer would be substituted into the final
    // print even though `total` is reassigned.
    fn accumulate_program() -> Program {
        vec![
            Stmt::Function(
                Ident::new("zero"),
                smallvec![],
                vec![Stmt::Return(num(0.0))],
            ),
            Stmt::Var(
                Ident::new("total"),
                Expr::Call(Box::new(var("zero")), vec![]),
            ),
            Stmt::Function(
                Ident::new("add"),
                smallvec![Ident::new("n")],
                vec![
                    Stmt::Expression(Expr::Assign(
                        Ident::new("total"),
                        Box::new(Expr::Binary(
                            Box::new(var("total")),
                            BinaryOp::Add,
                            Box::new(var("n")),
                        )),
                    )),
                    Stmt::Return(var("total")),
                ],
            ),
            Stmt::Expression(Expr::Call(Box::new(var("add")), vec![num(2.0)])),
            Stmt::Expression(Expr::Call(Box::new(var("add")), vec![num(3.0)])),
            Stmt::Print(var("total")),
        ]
    }

    fn output_of(engine: Engine<Vec<u8>>) -> String {
        String::from_utf8(engine.into_output()).unwrap()
    }

    #[test]
    fn test_eval_with_default_passes() {
        let mut engine = Engine::with_output(Vec::new());
        let mut program = vec![
            Stmt::Var(Ident::new("x"), num(1.0)),
            Stmt::Print(Expr::Binary(
                Box::new(num(1.0)),
                BinaryOp::Add,
                Box::new(var("x")),
            )),
        ];
        engine.eval(&mut program).unwrap();
        // Propagation folded the whole print operand down to a literal.
        assert_eq!(
            program[1],
            Stmt::Print(Expr::Literal(Literal::Number(Number::new(2.0))))
        );
        assert_eq!(output_of(engine), "2\n");
    }

    #[test]
    fn test_optimized_output_matches_unoptimized() {
        let mut optimized = Engine::with_output(Vec::new());
        optimized.eval(&mut accumulate_program()).unwrap();

        let mut unoptimized = Engine::with_output(Vec::new());
        unoptimized.set_passes(vec![]);
        unoptimized.eval(&mut accumulate_program()).unwrap();

        assert_eq!(output_of(optimized), "5\n");
        assert_eq!(output_of(unoptimized), "5\n");
    }

    #[test]
    fn test_eliminated_initializer_side_effect_is_dropped() {
        // var hits = 0;
        // fun bump() { hits = hits + 1; return hits; }
        // var unused = bump();
        // print hits;
        //
        // With elimination enabled the `unused` declaration disappears, and
        // `bump()` is never invoked.
        let program = || -> Program {
            vec![
                Stmt::Var(Ident::new("hits"), num(0.0)),
                Stmt::Function(
                    Ident::new("bump"),
                    smallvec![],
                    vec![
                        Stmt::Expression(Expr::Assign(
                            Ident::new("hits"),
                            Box::new(Expr::Binary(
                                Box::new(var("hits")),
                                BinaryOp::Add,
                                Box::new(num(1.0)),
                            )),
                        )),
                        Stmt::Return(var("hits")),
                    ],
                ),
                Stmt::Var(
                    Ident::new("unused"),
                    Expr::Call(Box::new(var("bump")), vec![]),
                ),
                Stmt::Print(var("hits")),
            ]
        };

        let mut optimized = Engine::with_output(Vec::new());
        optimized.eval(&mut program()).unwrap();
        assert_eq!(output_of(optimized), "0\n");

        let mut unoptimized = Engine::with_output(Vec::new());
        unoptimized.set_passes(vec![]);
        unoptimized.eval(&mut program()).unwrap();
        assert_eq!(output_of(unoptimized), "1\n");
    }

    #[test]
    fn test_root_scope_persists_across_eval_calls() {
        let mut engine = Engine::with_output(Vec::new());
        engine.set_passes(vec![]);
        engine
            .eval(&mut vec![Stmt::Var(Ident::new("x"), num(7.0))])
            .unwrap();
        engine.eval(&mut vec![Stmt::Print(var("x"))]).unwrap();
        assert_eq!(output_of(engine), "7\n");
    }

    #[test]
    fn test_version() {
        assert_eq!(Engine::<Vec<u8>>::version(), env!("CARGO_PKG_VERSION"));
    }
}

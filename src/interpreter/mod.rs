//! Direct tree evaluation. Reference semantics for the bytecode engine.

use crate::ast::*;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub message: String,
    pub span: Span,
}

impl RuntimeError {
    fn new(msg: impl Into<String>, span: Span) -> Self {
        RuntimeError { message: msg.into(), span }
    }
}

type Result<T> = std::result::Result<T, RuntimeError>;

/// Value of the last statement, or 0 for an empty program.
pub fn evaluate(program: &Program) -> Result<f64> {
    Ok(evaluate_each(program)?.last().copied().unwrap_or(0.0))
}

/// Value of every statement, in order.
pub fn evaluate_each(program: &Program) -> Result<Vec<f64>> {
    program.statements.iter().map(eval_expr).collect()
}

pub fn eval_expr(expr: &Expr) -> Result<f64> {
    match expr {
        Expr::Number { raw, span } => {
            parse_literal(raw).ok_or_else(|| RuntimeError::new(format!("malformed number literal '{raw}'"), *span))
        }
        Expr::Binary { op, left, right } => {
            let l = eval_expr(left)?;
            let r = eval_expr(right)?;
            Ok(op.apply(l, r))
        }
        Expr::Unary { op: UnaryOp::Negate, operand } => Ok(-eval_expr(operand)?),
    }
}

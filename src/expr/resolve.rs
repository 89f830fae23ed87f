use crate::context::Field;
use crate::expr::ast::{Clause, Expr};
use crate::expr::error::CompileError;

/// Bind every bare name to a context field or a comprehension variable.
/// Anything else is rejected here, before the expression can ever run.
pub fn resolve(mut expr: Expr) -> Result<Expr, CompileError> {
    let mut scope = Vec::new();
    resolve_in(&mut expr, &mut scope)?;
    Ok(expr)
}

fn resolve_in(expr: &mut Expr, scope: &mut Vec<String>) -> Result<(), CompileError> {
    match expr {
        Expr::Name(name) => {
            let resolved = if scope.iter().rev().any(|bound| bound == name) {
                Expr::Local(std::mem::take(name))
            } else if let Some(field) = Field::from_name(name) {
                Expr::Field(field)
            } else {
                return Err(CompileError::UnknownName(name.clone()));
            };
            *expr = resolved;
        }
        Expr::Literal(_) | Expr::Field(_) | Expr::Local(_) => {}
        Expr::List(items)
        | Expr::Tuple(items)
        | Expr::Set(items)
        | Expr::And(items)
        | Expr::Or(items) => {
            for item in items {
                resolve_in(item, scope)?;
            }
        }
        Expr::Dict(entries) => {
            for (key, value) in entries {
                resolve_in(key, scope)?;
                resolve_in(value, scope)?;
            }
        }
        Expr::Unary { operand, .. } | Expr::Not(operand) => resolve_in(operand, scope)?,
        Expr::Binary { left, right, .. } => {
            resolve_in(left, scope)?;
            resolve_in(right, scope)?;
        }
        Expr::Compare { first, rest } => {
            resolve_in(first, scope)?;
            for (_, operand) in rest {
                resolve_in(operand, scope)?;
            }
        }
        Expr::IfElse {
            cond,
            then,
            otherwise,
        } => {
            resolve_in(cond, scope)?;
            resolve_in(then, scope)?;
            resolve_in(otherwise, scope)?;
        }
        Expr::Subscript { target, index } => {
            resolve_in(target, scope)?;
            resolve_in(index, scope)?;
        }
        Expr::Slice { target, lo, hi } => {
            resolve_in(target, scope)?;
            if let Some(lo) = lo {
                resolve_in(lo, scope)?;
            }
            if let Some(hi) = hi {
                resolve_in(hi, scope)?;
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                resolve_in(arg, scope)?;
            }
        }
        Expr::Method { receiver, args, .. } => {
            resolve_in(receiver, scope)?;
            for arg in args {
                resolve_in(arg, scope)?;
            }
        }
        Expr::Comprehension {
            element, clauses, ..
        } => {
            let depth = scope.len();
            for clause in clauses.iter_mut() {
                match clause {
                    Clause::For { var, iter } => {
                        resolve_in(iter, scope)?;
                        scope.push(var.clone());
                    }
                    Clause::If(cond) => resolve_in(cond, scope)?,
                }
            }
            let result = resolve_in(element, scope);
            scope.truncate(depth);
            result?;
        }
    }
    Ok(())
}

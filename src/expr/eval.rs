use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::context::Context;
use crate::expr::ast::{BinOp, Builtin, Clause, CompKind, Expr, Method, UnaryOp};
use crate::expr::error::EvalError;
use crate::expr::ops::{binary, compare, order};
use crate::expr::value::{MapValue, Value};

// Upper bound on materialized range() results.
const MAX_RANGE_LEN: i64 = 100_000;

/// Work allowed for one evaluation: comprehension iterations plus elements
/// of every sequence built by an operator or builtin.
pub const MAX_STEPS: usize = 1_000_000;

/// Evaluate a resolved expression against one candidate context.
pub fn evaluate(expr: &Expr, ctx: &Context<'_>) -> Result<Value, EvalError> {
    let mut eval = Evaluator {
        ctx,
        locals: Vec::new(),
        steps: 0,
    };
    eval.eval(expr)
}

struct Evaluator<'a, 'h> {
    ctx: &'a Context<'h>,
    locals: Vec<(String, Value)>,
    steps: usize,
}

impl Evaluator<'_, '_> {
    fn charge(&mut self, steps: usize) -> Result<(), EvalError> {
        self.steps = self.steps.saturating_add(steps);
        if self.steps > MAX_STEPS {
            return Err(EvalError::Overflow);
        }
        Ok(())
    }

    fn charged(&mut self, value: Value) -> Result<Value, EvalError> {
        self.charge(size(&value))?;
        Ok(value)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Field(field) => Ok(self.ctx.value(*field)),
            Expr::Local(name) => self
                .locals
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| EvalError::KeyNotFound(name.clone())),
            Expr::Name(name) => Err(EvalError::KeyNotFound(name.clone())),

            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Set(items) => Ok(Value::Set(self.eval_all(items)?.into_iter().collect())),
            Expr::Dict(entries) => {
                let mut map = BTreeMap::new();
                for (k, v) in entries {
                    let key = self.eval(k)?;
                    let value = self.eval(v)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(MapValue {
                    entries: map,
                    counting: false,
                }))
            }

            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                unary(*op, &v)
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                let out = binary(*op, &l, &r)?;
                self.charged(out)
            }
            Expr::And(operands) => self.short_circuit(operands, false),
            Expr::Or(operands) => self.short_circuit(operands, true),
            Expr::Not(operand) => Ok(Value::Bool(!self.eval(operand)?.truthy())),
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, operand) in rest {
                    let right = self.eval(operand)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::IfElse {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }

            Expr::Subscript { target, index } => {
                let t = self.eval(target)?;
                let i = self.eval(index)?;
                subscript(&t, &i)
            }
            Expr::Slice { target, lo, hi } => {
                let t = self.eval(target)?;
                let lo = match lo {
                    Some(e) => Some(self.eval_int(e)?),
                    None => None,
                };
                let hi = match hi {
                    Some(e) => Some(self.eval_int(e)?),
                    None => None,
                };
                slice(&t, lo, hi)
            }
            Expr::Call { func, args } => {
                let values = self.eval_all(args)?;
                let out = call(*func, values)?;
                self.charged(out)
            }
            Expr::Method {
                receiver,
                method,
                args,
            } => {
                let recv = self.eval(receiver)?;
                let values = self.eval_all(args)?;
                let out = call_method(*method, &recv, values)?;
                self.charged(out)
            }
            Expr::Comprehension {
                kind,
                element,
                clauses,
            } => {
                let mut out = Vec::new();
                self.run_clauses(clauses, element, &mut out)?;
                Ok(match kind {
                    CompKind::Set => Value::Set(out.into_iter().collect()),
                    CompKind::List | CompKind::Generator => Value::List(out),
                })
            }
        }
    }

    // Python `and`/`or`: the first operand whose truthiness is `stop_on`, else the last.
    fn short_circuit(&mut self, operands: &[Expr], stop_on: bool) -> Result<Value, EvalError> {
        let mut last = Value::Bool(!stop_on);
        for operand in operands {
            last = self.eval(operand)?;
            if last.truthy() == stop_on {
                break;
            }
        }
        Ok(last)
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_int(&mut self, expr: &Expr) -> Result<i64, EvalError> {
        let v = self.eval(expr)?;
        v.as_int().ok_or_else(|| {
            EvalError::TypeMismatch(format!("slice indices must be integers, not {}", v.type_name()))
        })
    }

    fn run_clauses(
        &mut self,
        clauses: &[Clause],
        element: &Expr,
        out: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        match clauses.split_first() {
            None => {
                out.push(self.eval(element)?);
                Ok(())
            }
            Some((Clause::If(cond), rest)) => {
                if self.eval(cond)?.truthy() {
                    self.run_clauses(rest, element, out)
                } else {
                    Ok(())
                }
            }
            Some((Clause::For { var, iter }, rest)) => {
                let items = self.eval(iter)?.iterate()?;
                for item in items {
                    self.charge(1)?;
                    self.locals.push((var.clone(), item));
                    let result = self.run_clauses(rest, element, out);
                    self.locals.pop();
                    result?;
                }
                Ok(())
            }
        }
    }
}

fn size(value: &Value) -> usize {
    match value {
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Set(items) => items.len(),
        Value::Map(map) => map.entries.len(),
        Value::Str(s) => s.len(),
        _ => 0,
    }
}

fn unary(op: UnaryOp, v: &Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::Neg, v) if v.as_int().is_some() => v
            .as_int()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or(EvalError::Overflow),
        (UnaryOp::Pos, v) if v.as_int().is_some() => Ok(Value::Int(v.as_int().unwrap_or_default())),
        (_, v) => Err(EvalError::TypeMismatch(format!(
            "bad operand type for unary operator: {}",
            v.type_name()
        ))),
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len_i = len as i64;
    let idx = if index < 0 { index + len_i } else { index };
    (0..len_i).contains(&idx).then_some(idx as usize)
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Map(map) => map.get(index),
        Value::List(items) | Value::Tuple(items) => {
            let i = index_int(index)?;
            normalize_index(i, items.len())
                .map(|idx| items[idx].clone())
                .ok_or(EvalError::IndexOutOfRange { index: i, len: items.len() })
        }
        Value::Str(s) => {
            let i = index_int(index)?;
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|idx| Value::Str(chars[idx].to_string()))
                .ok_or(EvalError::IndexOutOfRange { index: i, len: chars.len() })
        }
        other => Err(EvalError::TypeMismatch(format!(
            "{} object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn index_int(index: &Value) -> Result<i64, EvalError> {
    index.as_int().ok_or_else(|| {
        EvalError::TypeMismatch(format!("indices must be integers, not {}", index.type_name()))
    })
}

fn slice_bounds(lo: Option<i64>, hi: Option<i64>, len: usize) -> (usize, usize) {
    let len_i = len as i64;
    let clamp = |v: i64| {
        let v = if v < 0 { v + len_i } else { v };
        v.clamp(0, len_i) as usize
    };
    let start = lo.map(clamp).unwrap_or(0);
    let end = hi.map(clamp).unwrap_or(len);
    (start, end.max(start))
}

fn slice(target: &Value, lo: Option<i64>, hi: Option<i64>) -> Result<Value, EvalError> {
    match target {
        Value::List(items) => {
            let (s, e) = slice_bounds(lo, hi, items.len());
            Ok(Value::List(items[s..e].to_vec()))
        }
        Value::Tuple(items) => {
            let (s, e) = slice_bounds(lo, hi, items.len());
            Ok(Value::Tuple(items[s..e].to_vec()))
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let (s, e) = slice_bounds(lo, hi, chars.len());
            Ok(Value::Str(chars[s..e].iter().collect()))
        }
        other => Err(EvalError::TypeMismatch(format!(
            "{} object is not sliceable",
            other.type_name()
        ))),
    }
}

/// Items of the single iterable argument, or the arguments themselves.
fn spread(func: Builtin, args: Vec<Value>) -> Result<Vec<Value>, EvalError> {
    let items = if args.len() == 1 {
        args[0].iterate()?
    } else {
        args
    };
    if items.is_empty() {
        return Err(EvalError::EmptySequence(func.name()));
    }
    Ok(items)
}

fn extreme(func: Builtin, args: Vec<Value>, wanted: Ordering) -> Result<Value, EvalError> {
    let mut items = spread(func, args)?.into_iter();
    let mut best = items.next().ok_or(EvalError::EmptySequence(func.name()))?;
    for item in items {
        if order(&item, &best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn counter(items: Vec<Value>) -> Value {
    let mut entries: BTreeMap<Value, Value> = BTreeMap::new();
    for item in items {
        let slot = entries.entry(item).or_insert(Value::Int(0));
        if let Value::Int(n) = slot {
            *n += 1;
        }
    }
    Value::Map(MapValue {
        entries,
        counting: true,
    })
}

fn first_or_empty(args: Vec<Value>) -> Result<Vec<Value>, EvalError> {
    match args.into_iter().next() {
        Some(v) => v.iterate(),
        None => Ok(Vec::new()),
    }
}

fn call(func: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    match func {
        Builtin::Len => Ok(Value::Int(args[0].len()? as i64)),
        Builtin::Sum => {
            let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
            for item in args[0].iterate()? {
                total = binary(BinOp::Add, &total, &item)?;
            }
            Ok(total)
        }
        Builtin::Min => extreme(func, args, Ordering::Less),
        Builtin::Max => extreme(func, args, Ordering::Greater),
        Builtin::Abs => match &args[0] {
            Value::Float(f) => Ok(Value::Float(f.abs())),
            v => v
                .as_int()
                .ok_or_else(|| {
                    EvalError::TypeMismatch(format!("bad operand type for abs(): {}", v.type_name()))
                })?
                .checked_abs()
                .map(Value::Int)
                .ok_or(EvalError::Overflow),
        },
        Builtin::Any => Ok(Value::Bool(args[0].iterate()?.iter().any(Value::truthy))),
        Builtin::All => Ok(Value::Bool(args[0].iterate()?.iter().all(Value::truthy))),
        Builtin::Set => Ok(Value::Set(first_or_empty(args)?.into_iter().collect())),
        Builtin::List => Ok(Value::List(first_or_empty(args)?)),
        Builtin::Tuple => Ok(Value::Tuple(first_or_empty(args)?)),
        Builtin::Sorted => {
            let mut items = args[0].iterate()?;
            if let Some(first) = items.first() {
                for item in &items {
                    order(first, item)?;
                }
            }
            items.sort();
            Ok(Value::List(items))
        }
        Builtin::Range => range(&args),
        Builtin::Int => match &args[0] {
            Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::InvalidInt(s.clone())),
            v => v.as_int().map(Value::Int).ok_or_else(|| {
                EvalError::TypeMismatch(format!("int() argument must not be {}", v.type_name()))
            }),
        },
        Builtin::Str => match &args[0] {
            Value::Str(s) => Ok(Value::Str(s.clone())),
            v => Ok(Value::Str(v.to_string())),
        },
        Builtin::Counter => Ok(counter(first_or_empty(args)?)),
    }
}

fn range(args: &[Value]) -> Result<Value, EvalError> {
    let mut bounds = Vec::with_capacity(args.len());
    for arg in args {
        bounds.push(arg.as_int().ok_or_else(|| {
            EvalError::TypeMismatch(format!("range() arguments must be integers, not {}", arg.type_name()))
        })?);
    }
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(EvalError::TypeMismatch("range() takes 1 to 3 arguments".into())),
    };
    if step == 0 {
        return Err(EvalError::TypeMismatch("range() step must not be zero".into()));
    }

    let span = if step > 0 { stop.saturating_sub(start) } else { start.saturating_sub(stop) };
    if span / step.saturating_abs() > MAX_RANGE_LEN {
        return Err(EvalError::Overflow);
    }

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        i = i.checked_add(step).ok_or(EvalError::Overflow)?;
    }
    Ok(Value::List(out))
}

fn call_method(method: Method, recv: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
    let wrong_receiver = || {
        EvalError::TypeMismatch(format!(
            "{} object has no method {}()",
            recv.type_name(),
            method.name()
        ))
    };

    match (method, recv) {
        (Method::Count, Value::List(items) | Value::Tuple(items)) => {
            Ok(Value::Int(items.iter().filter(|v| **v == args[0]).count() as i64))
        }
        (Method::Count, Value::Str(s)) => match &args[0] {
            Value::Str(needle) if needle.is_empty() => Ok(Value::Int(s.chars().count() as i64 + 1)),
            Value::Str(needle) => Ok(Value::Int(s.matches(needle.as_str()).count() as i64)),
            other => Err(EvalError::TypeMismatch(format!(
                "must be str, not {}",
                other.type_name()
            ))),
        },
        (Method::Keys, Value::Map(map)) => Ok(Value::List(map.entries.keys().cloned().collect())),
        (Method::Values, Value::Map(map)) => {
            Ok(Value::List(map.entries.values().cloned().collect()))
        }
        (Method::Union | Method::Intersection | Method::Difference, Value::Set(set)) => {
            let other: BTreeSet<Value> = args[0].iterate()?.into_iter().collect();
            let result = match method {
                Method::Union => set.union(&other).cloned().collect(),
                Method::Intersection => set.intersection(&other).cloned().collect(),
                _ => set.difference(&other).cloned().collect(),
            };
            Ok(Value::Set(result))
        }
        _ => Err(wrong_receiver()),
    }
}

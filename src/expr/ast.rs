use crate::context::Field;
use crate::expr::error::CompileError;
use crate::expr::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Bare identifier, replaced by `Field` or `Local` during resolution.
    Name(String),
    Field(Field),
    Local(String),

    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Two or more operands, short-circuiting left to right.
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// `a < b <= c`: each link is checked pairwise, short-circuiting.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
    IfElse {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    Subscript {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        target: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
    Method {
        receiver: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },
    Comprehension {
        kind: CompKind,
        element: Box<Expr>,
        clauses: Vec<Clause>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// Generators are materialized as lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    Generator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    For { var: String, iter: Expr },
    If(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Sum,
    Min,
    Max,
    Abs,
    Any,
    All,
    Set,
    List,
    Tuple,
    Sorted,
    Range,
    Int,
    Str,
    Counter,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        let func = match name {
            "len" => Builtin::Len,
            "sum" => Builtin::Sum,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "abs" => Builtin::Abs,
            "any" => Builtin::Any,
            "all" => Builtin::All,
            "set" => Builtin::Set,
            "list" => Builtin::List,
            "tuple" => Builtin::Tuple,
            "sorted" => Builtin::Sorted,
            "range" => Builtin::Range,
            "int" => Builtin::Int,
            "str" => Builtin::Str,
            "Counter" => Builtin::Counter,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Sum => "sum",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Any => "any",
            Builtin::All => "all",
            Builtin::Set => "set",
            Builtin::List => "list",
            Builtin::Tuple => "tuple",
            Builtin::Sorted => "sorted",
            Builtin::Range => "range",
            Builtin::Int => "int",
            Builtin::Str => "str",
            Builtin::Counter => "Counter",
        }
    }

    fn arity(&self) -> (usize, Option<usize>, &'static str) {
        match self {
            Builtin::Len | Builtin::Abs | Builtin::Any | Builtin::All => (1, Some(1), "1"),
            Builtin::Sorted | Builtin::Int | Builtin::Str => (1, Some(1), "1"),
            Builtin::Sum => (1, Some(2), "1-2"),
            Builtin::Min | Builtin::Max => (1, None, "at least 1"),
            Builtin::Set | Builtin::List | Builtin::Tuple | Builtin::Counter => (0, Some(1), "0-1"),
            Builtin::Range => (1, Some(3), "1-3"),
        }
    }

    pub fn check_arity(&self, got: usize) -> Result<(), CompileError> {
        let (min, max, expected) = self.arity();
        if got < min || max.is_some_and(|m| got > m) {
            return Err(CompileError::Arity {
                function: self.name().to_string(),
                expected,
                got,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Count,
    Keys,
    Values,
    Union,
    Intersection,
    Difference,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Method> {
        let method = match name {
            "count" => Method::Count,
            "keys" => Method::Keys,
            "values" => Method::Values,
            "union" => Method::Union,
            "intersection" => Method::Intersection,
            "difference" => Method::Difference,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Count => "count",
            Method::Keys => "keys",
            Method::Values => "values",
            Method::Union => "union",
            Method::Intersection => "intersection",
            Method::Difference => "difference",
        }
    }

    pub fn check_arity(&self, got: usize) -> Result<(), CompileError> {
        let expected = match self {
            Method::Keys | Method::Values => 0,
            Method::Count | Method::Union | Method::Intersection | Method::Difference => 1,
        };
        if got != expected {
            return Err(CompileError::Arity {
                function: format!(".{}", self.name()),
                expected: if expected == 0 { "0" } else { "1" },
                got,
            });
        }
        Ok(())
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::expr::error::EvalError;

/// Runtime value of the predicate language.
///
/// `Ord` is a total order used for set and map storage. Numbers (including
/// booleans) compare by value, so `1`, `1.0` and `True` are the same set member.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    Map(MapValue),
}

/// Key/value table. A counting map answers `0` for missing keys.
#[derive(Debug, Clone)]
pub struct MapValue {
    pub entries: BTreeMap<Value, Value>,
    pub counting: bool,
}

impl MapValue {
    pub fn get(&self, key: &Value) -> Result<Value, EvalError> {
        match self.entries.get(key) {
            Some(v) => Ok(v.clone()),
            None if self.counting => Ok(Value::Int(0)),
            None => Err(EvalError::KeyNotFound(key.to_string())),
        }
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MapValue {}

impl PartialOrd for MapValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MapValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entries.cmp(&other.entries)
    }
}

impl Value {
    pub fn int_list(digits: &[u8]) -> Value {
        Value::List(digits.iter().map(|&d| Value::Int(d as i64)).collect())
    }

    pub fn int_set<'a>(digits: impl IntoIterator<Item = &'a u8>) -> Value {
        Value::Set(digits.into_iter().map(|&d| Value::Int(d as i64)).collect())
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Set(items) => !items.is_empty(),
            Value::Map(map) => !map.entries.is_empty(),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    /// Integer view of bools and ints.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(*b as i64 as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Elements produced by iterating the value: sequence items, set members
    /// in order, map keys, or one-character strings.
    pub fn iterate(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::Set(items) => Ok(items.iter().cloned().collect()),
            Value::Map(map) => Ok(map.entries.keys().cloned().collect()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            other => Err(EvalError::NotIterable(other.type_name())),
        }
    }

    pub fn len(&self) -> Result<usize, EvalError> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.len()),
            Value::Set(items) => Ok(items.len()),
            Value::Map(map) => Ok(map.entries.len()),
            Value::Str(s) => Ok(s.chars().count()),
            other => Err(EvalError::TypeMismatch(format!(
                "object of type {} has no len()",
                other.type_name()
            ))),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => 0,
            Value::Str(_) => 1,
            Value::List(_) => 2,
            Value::Tuple(_) => 3,
            Value::Set(_) => 4,
            Value::Map(_) => 5,
        }
    }
}

fn cmp_numbers(a: &Value, b: &Value) -> Ordering {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (a, b) if a.is_number() && b.is_number() => cmp_numbers(a, b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<I, T>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
        where
            I: Iterator<Item = T>,
            T: fmt::Display,
        {
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::List(items) => {
                f.write_str("[")?;
                join(f, items.iter())?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                join(f, items.iter())?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Set(items) => {
                f.write_str("{")?;
                join(f, items.iter())?;
                f.write_str("}")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                join(f, map.entries.iter().map(|(k, v)| format!("{k}: {v}")))?;
                f.write_str("}")
            }
        }
    }
}

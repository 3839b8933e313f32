//! Values crossing the boundary between sketches and the engine.

use std::collections::BTreeMap;
use std::fmt;

use super::CallError;

/// Handle to an object created by the shim (movable circle, slider).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

/// A value as seen by the embedded language.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Object(ObjectId),
}

impl Value {
    /// Python-facing type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Object(_) => "object",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Python truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(d) => d.get(key),
            _ => None,
        }
    }

    pub fn point(x: f64, y: f64) -> Value {
        let mut d = BTreeMap::new();
        d.insert("x".to_string(), Value::Float(x));
        d.insert("y".to_string(), Value::Float(y));
        Value::Dict(d)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", format_number(*x)),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (i, (k, v)) in d.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                write!(f, "}}")
            }
            Value::Object(id) => write!(f, "<object {}>", id.0),
        }
    }
}

/// Render a number the way the engine prints it: integral values lose the `.0`.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// Conversion from an embedded-language value into an engine argument.
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.truthy())
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "str";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<f64> {
    const EXPECTED: &'static str = "list of numbers";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(Value::as_f64).collect(),
            _ => None,
        }
    }
}

impl FromValue for ObjectId {
    const EXPECTED: &'static str = "object";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Positional arguments of one forwarded call.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    pub name: &'a str,
    pub values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(name: &'a str, values: &'a [Value]) -> Self {
        Self { name, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, treating a trailing `None` as absent.
    pub fn raw(&self, index: usize) -> Option<&'a Value> {
        match self.values.get(index) {
            Some(Value::None) | None => None,
            Some(v) => Some(v),
        }
    }

    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, CallError> {
        let Some(value) = self.values.get(index) else {
            return Err(CallError::Type {
                name: self.name.to_string(),
                index,
                expected: T::EXPECTED,
                got: "nothing",
            });
        };
        T::from_value(value).ok_or_else(|| CallError::Type {
            name: self.name.to_string(),
            index,
            expected: T::EXPECTED,
            got: value.type_name(),
        })
    }

    pub fn opt<T: FromValue>(&self, index: usize) -> Result<Option<T>, CallError> {
        match self.raw(index) {
            None => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    pub fn or<T: FromValue>(&self, index: usize, default: T) -> Result<T, CallError> {
        Ok(self.opt(index)?.unwrap_or(default))
    }

    pub fn num(&self, index: usize) -> Result<f64, CallError> {
        self.get(index)
    }

    pub fn nums<const N: usize>(&self) -> Result<[f64; N], CallError> {
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.num(i)?;
        }
        Ok(out)
    }

    /// Arguments from `start` onward.
    pub fn rest(&self, start: usize) -> &'a [Value] {
        self.values.get(start..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_ints_floats_and_bools() {
        assert_eq!(f64::from_value(&Value::Int(3)), Some(3.0));
        assert_eq!(f64::from_value(&Value::Float(2.5)), Some(2.5));
        assert_eq!(f64::from_value(&Value::Bool(true)), Some(1.0));
        assert_eq!(f64::from_value(&Value::Str("3".into())), None);
    }

    #[test]
    fn integral_floats_convert_to_int() {
        assert_eq!(i64::from_value(&Value::Float(4.0)), Some(4));
        assert_eq!(i64::from_value(&Value::Float(4.5)), None);
    }

    #[test]
    fn args_report_position_and_types() {
        let values = [Value::Int(1), Value::Str("x".into())];
        let args = Args::new("circle", &values);
        let err = args.num(1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "circle() argument 2 must be number, not str"
        );
    }

    #[test]
    fn trailing_none_counts_as_absent() {
        let values = [Value::Int(1), Value::None];
        let args = Args::new("f", &values);
        assert_eq!(args.or(1, 9.0).unwrap(), 9.0);
        assert_eq!(args.or(5, 7.0).unwrap(), 7.0);
    }

    #[test]
    fn display_matches_python() {
        let v: Value = vec![1.0, 2.5].into();
        assert_eq!(v.to_string(), "[1, 2.5]");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::point(1.0, 2.0).to_string(), "{'x': 1, 'y': 2}");
    }
}

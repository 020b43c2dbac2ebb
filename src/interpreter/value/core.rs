use std::{fmt, rc::Rc};

use crate::{
    ast::{FuncDecl, NodeId},
    interpreter::{
        types::Type,
        value::{integer::Integer, modulus::Modulus, natural::Natural, rational::Rational},
    },
};

/// Represents a runtime value in the interpreter.
///
/// Every value belongs to exactly one runtime type. Numeric values are exact;
/// the checker decides statically which variant an expression produces, so
/// operators never need to promote at runtime.
#[derive(Debug, Clone)]
pub enum Value {
    /// A strictly positive integer (`N`).
    Natural(Natural),
    /// A signed integer (`Z`).
    Integer(Integer),
    /// An exact fraction (`Q`).
    Rational(Rational),
    /// A residue class (`Z/nZ`).
    Modulus(Modulus),
    /// A boolean (`Bool`).
    Bool(bool),
    /// A string (`Str`). Shared, since strings are immutable.
    Str(Rc<str>),
    /// A tuple of values (`T * U * ...`).
    Tuple(Rc<Vec<Self>>),
    /// A function value.
    Map(MapValue),
    /// The unit value (`void`).
    Void,
}

/// A callable value: the declaration it closes over plus an optional cast
/// applied to every result.
#[derive(Debug, Clone)]
pub struct MapValue {
    /// The function body and parameters.
    pub func:    Rc<FuncDecl>,
    /// Id of the declaration node; keys the binder's frame for this
    /// function.
    pub node:    NodeId,
    /// Set when the map was cast to a function type with a different
    /// codomain.
    pub returns: Option<Type>,
}

impl MapValue {
    #[must_use]
    pub const fn new(func: Rc<FuncDecl>, node: NodeId) -> Self {
        Self { func,
               node,
               returns: None }
    }

    /// The declared name, or `<lambda>` for anonymous functions.
    #[must_use]
    pub fn name(&self) -> &str {
        self.func.name.as_deref().unwrap_or("<lambda>")
    }

    /// The function type of this map, taking a result cast into account.
    #[must_use]
    pub fn ty(&self) -> Type {
        Type::function(self.func.params.iter().map(|p| p.ty.clone()).collect(),
                       self.returns.clone().unwrap_or_else(|| self.func.ret.clone()))
    }
}

impl From<Natural> for Value {
    fn from(n: Natural) -> Self {
        Self::Natural(n)
    }
}

impl From<Integer> for Value {
    fn from(i: Integer) -> Self {
        Self::Integer(i)
    }
}

impl From<Rational> for Value {
    fn from(q: Rational) -> Self {
        Self::Rational(q)
    }
}

impl From<Modulus> for Value {
    fn from(m: Modulus) -> Self {
        Self::Modulus(m)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Tuple(Rc::new(v))
    }
}

impl Value {
    /// The value a bare declaration `x: T;` starts with.
    ///
    /// `N` starts at one since zero is not a natural number. Function types
    /// have no default; the variable stays unset until assigned.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::{types::Type, value::core::Value};
    ///
    /// let pair = Type::Product(vec![Type::Natural, Type::Str]);
    ///
    /// assert_eq!(Value::default_for(&pair).unwrap().to_string(), "(1, )");
    /// assert!(Value::default_for(&Type::function(vec![], Type::Void)).is_none());
    /// ```
    #[must_use]
    pub fn default_for(ty: &Type) -> Option<Self> {
        Some(match ty {
            Type::Natural => Self::Natural(Natural::one()),
            Type::Integer => Self::Integer(Integer::zero()),
            Type::Rational | Type::Real => Self::Rational(Rational::zero()),
            Type::Modulus(n) => Self::Modulus(Modulus::from_residue(0, *n)),
            Type::Bool => Self::Bool(false),
            Type::Str => Self::from(""),
            Type::Void | Type::Any => Self::Void,
            Type::Product(components) => {
                Self::from(components.iter().map(Self::default_for).collect::<Option<Vec<_>>>()?)
            },
            Type::Function { .. } => return None,
        })
    }

    /// The runtime type of this value.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Natural(_) => Type::Natural,
            Self::Integer(_) => Type::Integer,
            Self::Rational(_) => Type::Rational,
            Self::Modulus(m) => Type::Modulus(m.modulus()),
            Self::Bool(_) => Type::Bool,
            Self::Str(_) => Type::Str,
            Self::Tuple(items) => Type::Product(items.iter().map(Self::ty).collect()),
            Self::Map(map) => map.ty(),
            Self::Void => Type::Void,
        }
    }

    /// The structural rendering used by `pprint`: factorizations for
    /// numbers, moduli for residues, quoted strings.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::{core::Value, natural::Natural};
    ///
    /// let value = Value::from(vec![Value::from(Natural::new(72).unwrap()), Value::from("hi")]);
    ///
    /// assert_eq!(value.pretty(), "(2^3*3^2, \"hi\")");
    /// ```
    #[must_use]
    pub fn pretty(&self) -> String {
        match self {
            Self::Natural(n) => n.pretty(),
            Self::Integer(i) => i.pretty(),
            Self::Rational(q) => q.pretty(),
            Self::Modulus(m) => m.pretty(),
            Self::Str(s) => format!("{s:?}"),
            Self::Tuple(items) => {
                format!("({})", items.iter().map(Self::pretty).collect::<Vec<_>>().join(", "))
            },
            Self::Bool(_) | Self::Map(_) | Self::Void => self.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Natural(a), Self::Natural(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Rational(a), Self::Rational(b)) => a == b,
            (Self::Modulus(a), Self::Modulus(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(&a.func, &b.func) && a.returns == b.returns,
            (Self::Void, Self::Void) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Natural(n) => write!(f, "{n}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Rational(q) => write!(f, "{q}"),
            Self::Modulus(m) => write!(f, "{m}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            },
            Self::Map(map) => write!(f, "<map {}>", map.ty()),
            Self::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_type() {
        assert_eq!(Value::default_for(&Type::Natural).unwrap().to_string(), "1");
        assert_eq!(Value::default_for(&Type::Integer).unwrap().to_string(), "0");
        assert_eq!(Value::default_for(&Type::Modulus(7)).unwrap().pretty(), "0 (mod 7)");
        assert_eq!(Value::default_for(&Type::Bool), Some(Value::Bool(false)));
        assert_eq!(Value::default_for(&Type::Void), Some(Value::Void));
    }

    #[test]
    fn runtime_types_match_static_types() {
        let pair = Value::from(vec![Value::from(Integer::zero()), Value::from(true)]);
        assert_eq!(pair.ty(), Type::Product(vec![Type::Integer, Type::Bool]));
        assert_eq!(Value::from(Modulus::from_residue(3, 5)).ty(), Type::Modulus(5));
    }

    #[test]
    fn equality_is_structural_within_a_type() {
        let half = Rational::from_decimal("0", "5").unwrap();
        let also_half = Rational::from_decimal("0", "50").unwrap();
        assert_eq!(Value::from(half), Value::from(also_half));
        assert_ne!(Value::from(Natural::one()), Value::from(Integer::from_i128(1).unwrap()));
        assert_eq!(Value::from("a"), Value::from("a".to_string()));
    }

    #[test]
    fn display_and_pretty_differ_for_numbers() {
        let value = Value::from(Rational::from_decimal("0", "75").unwrap());
        assert_eq!(value.to_string(), "3/4");
        assert_eq!(value.pretty(), "(3)/(2^2)");
        assert_eq!(Value::from("x\"y").pretty(), "\"x\\\"y\"");
    }
}

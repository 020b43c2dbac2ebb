use std::fmt;

use crate::util::num::gcd;

/// Lattice tags for the primitive types.
///
/// Tags are chosen so that "is an instance of" is divisibility and the
/// closest common parent is the greatest common divisor. Every pairwise GCD
/// of the tags below is again one of the tags.
pub mod tag {
    /// Top of the lattice.
    pub const ANY: u64 = 1;
    /// Root of every math type.
    pub const REAL: u64 = 2;
    pub const RATIONAL: u64 = REAL * 3;
    pub const INTEGER: u64 = RATIONAL * 5;
    pub const NATURAL: u64 = INTEGER * 7;
    pub const MODULUS: u64 = REAL * 11;
    pub const BOOL: u64 = MODULUS * 13;
    pub const STRING: u64 = 17;
    pub const VOID: u64 = 19;
    pub const PRODUCT: u64 = 23;
    pub const FUNCTION: u64 = 29;
}

/// A static type.
///
/// Primitive variants are fully described by their tag. `Modulus`,
/// `Product` and `Function` carry structural data that takes part in
/// equality and subtyping in addition to the tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Placeholder for nodes that have not been typed yet, and the top of the
    /// lattice.
    Any,
    /// Common ancestor of the numeric types. Never the type of a value.
    Real,
    /// `Q`
    Rational,
    /// `Z`
    Integer,
    /// `N`, the strictly positive integers.
    Natural,
    /// `Z/nZ`
    Modulus(u64),
    /// `Bool`, which is `Z/2Z` with a label.
    Bool,
    /// `Str`
    Str,
    /// `void`
    Void,
    /// `T * U * ...`
    Product(Vec<Self>),
    /// `params -> ret`. Several parameters form a product domain; no
    /// parameters means a `void` domain.
    Function {
        params: Vec<Self>,
        ret:    Box<Self>,
    },
}

impl Type {
    /// The lattice tag of this type.
    #[must_use]
    pub const fn tag(&self) -> u64 {
        match self {
            Self::Any => tag::ANY,
            Self::Real => tag::REAL,
            Self::Rational => tag::RATIONAL,
            Self::Integer => tag::INTEGER,
            Self::Natural => tag::NATURAL,
            Self::Modulus(_) => tag::MODULUS,
            Self::Bool => tag::BOOL,
            Self::Str => tag::STRING,
            Self::Void => tag::VOID,
            Self::Product(_) => tag::PRODUCT,
            Self::Function { .. } => tag::FUNCTION,
        }
    }

    /// The primitive type with the given tag. Structural tags have no
    /// canonical type and map to `Any`, a bare modulus tag to `Real`.
    const fn from_tag(tag: u64) -> Self {
        match tag {
            tag::REAL | tag::MODULUS => Self::Real,
            tag::RATIONAL => Self::Rational,
            tag::INTEGER => Self::Integer,
            tag::NATURAL => Self::Natural,
            tag::BOOL => Self::Bool,
            tag::STRING => Self::Str,
            tag::VOID => Self::Void,
            _ => Self::Any,
        }
    }

    /// Builds a function type from its parameter list.
    #[must_use]
    pub fn function(params: Vec<Self>, ret: Self) -> Self {
        Self::Function { params,
                         ret: Box::new(ret) }
    }

    /// Builds a function type from a written domain: `void` means no
    /// parameters, a product means one parameter per component.
    #[must_use]
    pub fn from_domain(domain: Self, ret: Self) -> Self {
        let params = match domain {
            Self::Void => Vec::new(),
            Self::Product(components) => components,
            other => vec![other],
        };
        Self::function(params, ret)
    }

    /// Number of nodes in the type's tree: one for every primitive, product
    /// and function type in it.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Product(components) => components.iter().fold(1, |size, c| size.saturating_add(c.size())),
            Self::Function { params, ret } => {
                params.iter().fold(ret.size().saturating_add(1), |size, p| size.saturating_add(p.size()))
            },
            _ => 1,
        }
    }

    /// The modulus of `Z/nZ`, with `Bool` counting as `Z/2Z`.
    #[must_use]
    pub const fn modulus(&self) -> Option<u64> {
        match self {
            Self::Modulus(n) => Some(*n),
            Self::Bool => Some(2),
            _ => None,
        }
    }

    /// Whether this type lies under `Real`.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::types::Type;
    ///
    /// assert!(Type::Natural.is_math_type());
    /// assert!(Type::Modulus(7).is_math_type());
    /// assert!(!Type::Str.is_math_type());
    /// ```
    #[must_use]
    pub const fn is_math_type(&self) -> bool {
        self.tag() % tag::REAL == 0
    }

    /// Whether this is one of `N`, `Z` or `Q`.
    #[must_use]
    pub const fn is_rational_tower(&self) -> bool {
        matches!(self, Self::Natural | Self::Integer | Self::Rational)
    }

    /// Subtype test: tag divisibility plus structural agreement.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::types::Type;
    ///
    /// assert!(Type::Natural.instance_of(&Type::Rational));
    /// assert!(Type::Bool.instance_of(&Type::Modulus(2)));
    /// assert!(!Type::Integer.instance_of(&Type::Natural));
    /// ```
    #[must_use]
    pub fn instance_of(&self, other: &Self) -> bool {
        if self.tag() % other.tag() != 0 {
            return false;
        }
        match other {
            Self::Modulus(n) => self.modulus() == Some(*n),
            Self::Product(theirs) => match self {
                Self::Product(ours) => {
                    ours.len() == theirs.len()
                    && ours.iter().zip(theirs).all(|(a, b)| a.instance_of(b))
                },
                _ => false,
            },
            Self::Function { .. } => self == other,
            _ => true,
        }
    }

    /// The closest common parent (lattice join) of two types.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::types::Type;
    ///
    /// assert_eq!(Type::Natural.closest_parent(&Type::Integer), Type::Integer);
    /// assert_eq!(Type::Natural.closest_parent(&Type::Rational), Type::Rational);
    /// assert_eq!(Type::Natural.closest_parent(&Type::Str), Type::Any);
    /// ```
    #[must_use]
    pub fn closest_parent(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Self::Modulus(_), Self::Modulus(_))
            | (Self::Bool, Self::Modulus(_))
            | (Self::Modulus(_), Self::Bool) => {
                if self.modulus() == other.modulus() {
                    Self::Modulus(self.modulus().unwrap_or(2))
                } else {
                    Self::Real
                }
            },
            (Self::Product(ours), Self::Product(theirs)) if ours.len() == theirs.len() => {
                Self::Product(ours.iter()
                                  .zip(theirs)
                                  .map(|(a, b)| a.closest_parent(b))
                                  .collect())
            },
            (Self::Product(_), Self::Product(_))
            | (Self::Function { .. }, Self::Function { .. }) => Self::Any,
            _ => Self::from_tag(gcd(self.tag(), other.tag())),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Real => write!(f, "R"),
            Self::Rational => write!(f, "Q"),
            Self::Integer => write!(f, "Z"),
            Self::Natural => write!(f, "N"),
            Self::Modulus(n) => write!(f, "Z/{n}Z"),
            Self::Bool => write!(f, "Bool"),
            Self::Str => write!(f, "Str"),
            Self::Void => write!(f, "void"),
            Self::Product(components) => write_product(f, components),
            Self::Function { params, ret } => {
                match params.as_slice() {
                    [] => write!(f, "void")?,
                    [single] => write_operand(f, single)?,
                    many => write_product(f, many)?,
                }
                write!(f, "->{ret}")
            },
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, ty: &Type) -> fmt::Result {
    match ty {
        Type::Product(_) | Type::Function { .. } => write!(f, "({ty})"),
        _ => write!(f, "{ty}"),
    }
}

fn write_product(f: &mut fmt::Formatter<'_>, components: &[Type]) -> fmt::Result {
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            write!(f, "*")?;
        }
        write_operand(f, component)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Type> {
        vec![Type::Any,
             Type::Real,
             Type::Rational,
             Type::Integer,
             Type::Natural,
             Type::Modulus(2),
             Type::Modulus(5),
             Type::Bool,
             Type::Str,
             Type::Void,
             Type::Product(vec![Type::Natural, Type::Integer]),
             Type::Product(vec![Type::Integer, Type::Integer]),
             Type::Product(vec![Type::Str]),
             Type::function(vec![Type::Integer], Type::Integer),
             Type::function(vec![], Type::Void)]
    }

    #[test]
    fn instance_of_is_reflexive_and_transitive() {
        let types = samples();
        for a in &types {
            assert!(a.instance_of(a), "{a} should be an instance of itself");
            for b in &types {
                for c in &types {
                    if a.instance_of(b) && b.instance_of(c) {
                        assert!(a.instance_of(c), "{a} <: {b} <: {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn closest_parent_is_commutative_and_idempotent() {
        let types = samples();
        for a in &types {
            assert_eq!(&a.closest_parent(a), a);
            for b in &types {
                assert_eq!(a.closest_parent(b), b.closest_parent(a), "{a} v {b}");
            }
        }
    }

    #[test]
    fn closest_parent_is_an_upper_bound() {
        let types = samples();
        for a in &types {
            for b in &types {
                let join = a.closest_parent(b);
                assert!(a.instance_of(&join), "{a} <: {a} v {b} = {join}");
                assert!(b.instance_of(&join), "{b} <: {a} v {b} = {join}");
            }
        }
    }

    #[test]
    fn natural_and_string_do_not_join_to_math() {
        assert!(!Type::Natural.closest_parent(&Type::Str).is_math_type());
        assert!(!Type::Integer.closest_parent(&Type::Str).is_math_type());
        assert_eq!(Type::Integer.closest_parent(&Type::Modulus(5)), Type::Real);
    }

    #[test]
    fn renders_written_syntax() {
        let ty = Type::from_domain(Type::Product(vec![Type::Integer, Type::Modulus(5)]),
                                   Type::function(vec![Type::Natural], Type::Bool));
        assert_eq!(ty.to_string(), "Z*Z/5Z->N->Bool");
        assert_eq!(Type::function(vec![], Type::Void).to_string(), "void->void");
        assert_eq!(Type::Product(vec![Type::function(vec![Type::Str], Type::Str),
                                      Type::Natural]).to_string(),
                   "(Str->Str)*N");
    }
}

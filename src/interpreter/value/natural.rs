use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
    sync::{LazyLock, Mutex},
};

use crate::{
    error::NumericError,
    util::num::{factorize, mul_mod, pow_mod, primes_up_to},
};

/// Largest argument accepted by [`Natural::factorial`].
pub const FACTORIAL_LIMIT: u64 = 1_000_000;

/// Largest result of [`Natural::pow`], in bits.
pub const POWER_BIT_LIMIT: u64 = 1 << 20;

/// Upper bound on memoized factorizations. The cache is cleared once full.
const MEMO_CAPACITY: usize = 1 << 14;

/// Base of the decimal limbs used for rendering and comparison.
const LIMB_BASE: u128 = 1_000_000_000;

static FACTORIZATIONS: LazyLock<Mutex<HashMap<u64, Shorthand>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Sparse prime factorization: `(prime, exponent)` pairs with strictly
/// increasing primes and non-zero exponents. The empty shorthand is `1`.
///
/// Products, quotients and powers are exact on shorthands no matter how
/// large the value they describe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shorthand(Vec<(u64, u64)>);

impl Shorthand {
    /// The factorization of `n`, or `None` for zero. Results are memoized
    /// process-wide.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Shorthand;
    ///
    /// let twelve = Shorthand::encode(12).unwrap();
    ///
    /// assert_eq!(twelve.factors(), &[(2, 2), (3, 1)]);
    /// assert_eq!(twelve.decode(), Some(12));
    /// assert!(Shorthand::encode(0).is_none());
    /// ```
    #[must_use]
    pub fn encode(n: u64) -> Option<Self> {
        if n == 0 {
            return None;
        }
        if n == 1 {
            return Some(Self::default());
        }
        if let Ok(memo) = FACTORIZATIONS.lock()
           && let Some(hit) = memo.get(&n)
        {
            return Some(hit.clone());
        }
        let shorthand = Self(factorize(n));
        if let Ok(mut memo) = FACTORIZATIONS.lock() {
            if memo.len() >= MEMO_CAPACITY {
                memo.clear();
            }
            memo.insert(n, shorthand.clone());
        }
        Some(shorthand)
    }

    /// The value described, or `None` when it does not fit in a `u64`.
    #[must_use]
    pub fn decode(&self) -> Option<u64> {
        self.0.iter().try_fold(1u64, |acc, &(p, e)| {
                         let e = u32::try_from(e).ok()?;
                         acc.checked_mul(p.checked_pow(e)?)
                     })
    }

    /// The value described, or `None` when it does not fit in a `u128`.
    #[must_use]
    pub fn decode_wide(&self) -> Option<u128> {
        self.0.iter().try_fold(1u128, |acc, &(p, e)| {
                         let e = u32::try_from(e).ok()?;
                         acc.checked_mul(u128::from(p).checked_pow(e)?)
                     })
    }

    /// The `(prime, exponent)` pairs.
    #[must_use]
    pub fn factors(&self) -> &[(u64, u64)] {
        &self.0
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Product, by merging the two factor lists.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                },
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                },
                Ordering::Equal => {
                    out.push((a[i].0, a[i].1.saturating_add(b[j].1)));
                    i += 1;
                    j += 1;
                },
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        Self(out)
    }

    /// Greatest common divisor: shared primes at their smaller exponent.
    #[must_use]
    pub fn gcd(&self, other: &Self) -> Self {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push((a[i].0, a[i].1.min(b[j].1)));
                    i += 1;
                    j += 1;
                },
            }
        }
        Self(out)
    }

    /// Divides both operands by their greatest common divisor.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Shorthand;
    ///
    /// let a = Shorthand::encode(12).unwrap();
    /// let b = Shorthand::encode(18).unwrap();
    /// let (a, b) = a.cancel(&b);
    ///
    /// assert_eq!((a.decode(), b.decode()), (Some(2), Some(3)));
    /// ```
    #[must_use]
    pub fn cancel(&self, other: &Self) -> (Self, Self) {
        let (a, b) = (&self.0, &other.0);
        let mut left = Vec::with_capacity(a.len());
        let mut right = Vec::with_capacity(b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                Ordering::Less => {
                    left.push(a[i]);
                    i += 1;
                },
                Ordering::Greater => {
                    right.push(b[j]);
                    j += 1;
                },
                Ordering::Equal => {
                    let (p, shared) = (a[i].0, a[i].1.min(b[j].1));
                    if a[i].1 > shared {
                        left.push((p, a[i].1 - shared));
                    }
                    if b[j].1 > shared {
                        right.push((p, b[j].1 - shared));
                    }
                    i += 1;
                    j += 1;
                },
            }
        }
        left.extend_from_slice(&a[i..]);
        right.extend_from_slice(&b[j..]);
        (Self(left), Self(right))
    }

    /// Every exponent multiplied by `k`.
    pub fn pow(&self, k: u64) -> Result<Self, NumericError> {
        if k == 0 {
            return Ok(Self::default());
        }
        self.0
            .iter()
            .map(|&(p, e)| e.checked_mul(k).map(|e| (p, e)).ok_or(NumericError::Overflow))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// A strictly positive integer of unbounded size, kept as its prime
/// factorization.
///
/// Multiplication, exponentiation, GCD and factorial stay exact for any
/// magnitude. Addition and subtraction go through machine integers and fail
/// with [`NumericError::Overflow`] once a value leaves `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Natural {
    shorthand: Shorthand,
}

impl Natural {
    #[must_use]
    pub fn one() -> Self {
        Self::default()
    }

    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Natural;
    ///
    /// assert_eq!(Natural::new(360).unwrap().to_string(), "360");
    /// assert!(Natural::new(0).is_err());
    /// ```
    pub fn new(n: u64) -> Result<Self, NumericError> {
        Shorthand::encode(n).map(Self::from_shorthand)
                            .ok_or_else(|| NumericError::NotPositive { value: n.to_string() })
    }

    #[must_use]
    pub const fn from_shorthand(shorthand: Shorthand) -> Self {
        Self { shorthand }
    }

    #[must_use]
    pub const fn shorthand(&self) -> &Shorthand {
        &self.shorthand
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        self.shorthand.is_one()
    }

    /// The value as a machine integer, if it fits.
    #[must_use]
    pub fn get_val(&self) -> Option<u64> {
        self.shorthand.decode()
    }

    /// The value as a machine integer, or [`NumericError::Overflow`].
    pub fn to_u64(&self) -> Result<u64, NumericError> {
        self.get_val().ok_or(NumericError::Overflow)
    }

    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_shorthand(self.shorthand.mul(&other.shorthand))
    }

    #[must_use]
    pub fn gcd(&self, other: &Self) -> Self {
        Self::from_shorthand(self.shorthand.gcd(&other.shorthand))
    }

    /// Both values divided by their greatest common divisor.
    #[must_use]
    pub fn cancel(&self, other: &Self) -> (Self, Self) {
        let (a, b) = self.shorthand.cancel(&other.shorthand);
        (Self::from_shorthand(a), Self::from_shorthand(b))
    }

    /// `self^k`.
    ///
    /// # Errors
    /// [`NumericError::Overflow`] when the result would be longer than
    /// [`POWER_BIT_LIMIT`] bits. The length is estimated from the floor of
    /// each prime's base-2 logarithm, so nothing is expanded to check it.
    ///
    /// # Example
    /// ```
    /// use ecru::{error::NumericError, interpreter::value::natural::Natural};
    ///
    /// let two = Natural::new(2).unwrap();
    ///
    /// assert_eq!(two.pow(10).unwrap().to_string(), "1024");
    /// assert_eq!(two.pow(4_000_000_000), Err(NumericError::Overflow));
    /// ```
    pub fn pow(&self, k: u64) -> Result<Self, NumericError> {
        let bits = self.shorthand
                       .factors()
                       .iter()
                       .fold(0u64, |bits, &(p, e)| {
                           bits.saturating_add(e.saturating_mul(k).saturating_mul(u64::from(p.ilog2())))
                       });
        if bits > POWER_BIT_LIMIT {
            return Err(NumericError::Overflow);
        }
        self.shorthand.pow(k).map(Self::from_shorthand)
    }

    /// Sum, computed on machine integers and factored again.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Natural;
    ///
    /// let sum = Natural::new(4).unwrap().add(&Natural::new(5).unwrap()).unwrap();
    ///
    /// assert_eq!(sum.shorthand().factors(), &[(3, 2)]);
    /// ```
    pub fn add(&self, other: &Self) -> Result<Self, NumericError> {
        let sum = u128::from(self.to_u64()?) + u128::from(other.to_u64()?);
        Self::new(u64::try_from(sum).map_err(|_| NumericError::Overflow)?)
    }

    /// Difference. Fails with [`NumericError::NotPositive`] when `other` is
    /// not smaller than `self`.
    pub fn sub(&self, other: &Self) -> Result<Self, NumericError> {
        let (a, b) = (self.to_u64()?, other.to_u64()?);
        if a <= b {
            let difference = i128::from(a) - i128::from(b);
            return Err(NumericError::NotPositive { value: difference.to_string() });
        }
        Self::new(a - b)
    }

    /// `n!` by Legendre's formula, without materializing the product.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Natural;
    ///
    /// assert_eq!(Natural::factorial(5).unwrap().to_string(), "120");
    /// assert_eq!(Natural::factorial(0).unwrap().to_string(), "1");
    /// ```
    pub fn factorial(n: u64) -> Result<Self, NumericError> {
        if n > FACTORIAL_LIMIT {
            return Err(NumericError::Overflow);
        }
        let factors = primes_up_to(n).into_iter()
                                     .map(|p| {
                                         let mut exponent = 0;
                                         let mut power = Some(p);
                                         while let Some(q) = power
                                               && q <= n
                                         {
                                             exponent += n / q;
                                             power = q.checked_mul(p);
                                         }
                                         (p, exponent)
                                     })
                                     .collect();
        Ok(Self::from_shorthand(Shorthand(factors)))
    }

    /// The remainder of division by `m`, for `m >= 1`.
    #[must_use]
    pub fn rem_u64(&self, m: u64) -> u64 {
        if m <= 1 {
            return 0;
        }
        self.shorthand
            .factors()
            .iter()
            .fold(1 % m, |acc, &(p, e)| mul_mod(acc, pow_mod(p % m, e, m), m))
    }

    /// Decimal limbs in base `10^9`, least significant first.
    #[allow(clippy::cast_possible_truncation)]
    fn limbs(&self) -> Vec<u32> {
        let mut limbs = vec![1u32];
        for &(p, e) in self.shorthand.factors() {
            let mut remaining = e;
            while remaining > 0 {
                let mut chunk = p;
                let mut used = 1;
                while used < remaining
                      && let Some(next) = chunk.checked_mul(p)
                {
                    chunk = next;
                    used += 1;
                }
                let mut carry = 0u128;
                for limb in &mut limbs {
                    let product = u128::from(*limb) * u128::from(chunk) + carry;
                    *limb = (product % LIMB_BASE) as u32;
                    carry = product / LIMB_BASE;
                }
                while carry > 0 {
                    limbs.push((carry % LIMB_BASE) as u32);
                    carry /= LIMB_BASE;
                }
                remaining -= used;
            }
        }
        limbs
    }

    /// The factorization, e.g. `2^3*3^2*5`. One renders as `1`.
    ///
    /// # Example
    /// ```
    /// use ecru::interpreter::value::natural::Natural;
    ///
    /// assert_eq!(Natural::new(360).unwrap().pretty(), "2^3*3^2*5");
    /// assert_eq!(Natural::one().pretty(), "1");
    /// ```
    #[must_use]
    pub fn pretty(&self) -> String {
        if self.is_one() {
            return "1".to_string();
        }
        self.shorthand
            .factors()
            .iter()
            .map(|&(p, e)| if e == 1 { p.to_string() } else { format!("{p}^{e}") })
            .collect::<Vec<_>>()
            .join("*")
    }
}

impl Ord for Natural {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        if let (Some(a), Some(b)) = (self.shorthand.decode_wide(), other.shorthand.decode_wide()) {
            return a.cmp(&b);
        }
        let (a, b) = (self.limbs(), other.limbs());
        a.len().cmp(&b.len()).then_with(|| a.iter().rev().cmp(b.iter().rev()))
    }
}

impl PartialOrd for Natural {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Natural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.shorthand.decode_wide() {
            return write!(f, "{value}");
        }
        let limbs = self.limbs();
        let mut limbs = limbs.iter().rev();
        if let Some(first) = limbs.next() {
            write!(f, "{first}")?;
        }
        for limb in limbs {
            write!(f, "{limb:09}")?;
        }
        Ok(())
    }
}

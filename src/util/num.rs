//! Number-theory helpers on machine integers.
//!
//! Everything here works on `u64` with `u128` intermediates, so no helper can
//! overflow. The numeric tower builds its exact types on top of these.

use std::collections::BTreeMap;

/// Primes used both for trial division and as Miller-Rabin witnesses. The
/// witness set is deterministic for every `u64`.
const SMALL_PRIMES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Trial division bound used before falling back to Pollard's rho.
const TRIAL_LIMIT: u64 = 1_000;

/// Greatest common divisor by the Euclidean algorithm. `gcd(0, n) == n`.
///
/// ## Example
/// ```
/// use ecru::util::num::gcd;
///
/// assert_eq!(gcd(12, 18), 6);
/// assert_eq!(gcd(0, 7), 7);
/// ```
#[must_use]
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `(a * b) mod m` without overflow.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// `(a + b) mod m` without overflow.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 + b as u128) % m as u128) as u64
}

/// `base^exp mod m` by repeated squaring.
///
/// ## Example
/// ```
/// use ecru::util::num::pow_mod;
///
/// assert_eq!(pow_mod(3, 4, 5), 1);
/// assert_eq!(pow_mod(10, 0, 1), 0);
/// ```
#[must_use]
pub const fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Multiplicative inverse of `a` modulo `m`, if `gcd(a, m) == 1`.
///
/// ## Example
/// ```
/// use ecru::util::num::inverse_mod;
///
/// assert_eq!(inverse_mod(3, 7), Some(5));
/// assert_eq!(inverse_mod(2, 6), None);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn inverse_mod(a: u64, m: u64) -> Option<u64> {
    if m == 1 {
        return Some(0);
    }
    let (mut old_r, mut r) = (i128::from(a % m), i128::from(m));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }
    (old_r == 1).then(|| old_s.rem_euclid(i128::from(m)) as u64)
}

/// Deterministic Miller-Rabin primality test for all `u64`.
///
/// ## Example
/// ```
/// use ecru::util::num::is_prime;
///
/// assert!(is_prime(2));
/// assert!(is_prime(1_000_000_007));
/// assert!(!is_prime(1));
/// assert!(!is_prime(561));
/// ```
#[must_use]
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in SMALL_PRIMES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in SMALL_PRIMES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Finds a nontrivial divisor of an odd composite `n`.
#[allow(clippy::cast_possible_truncation)]
fn pollard_rho(n: u64) -> u64 {
    let mut c = 1u64;
    loop {
        let step = |x: u64| ((u128::from(x) * u128::from(x) + u128::from(c)) % u128::from(n)) as u64;
        let (mut x, mut y, mut d) = (2u64, 2u64, 1u64);
        while d == 1 {
            x = step(x);
            y = step(step(y));
            d = gcd(x.abs_diff(y), n);
        }
        if d != n {
            return d;
        }
        c += 1;
    }
}

fn collect_factors(n: u64, out: &mut BTreeMap<u64, u64>) {
    if n == 1 {
        return;
    }
    if is_prime(n) {
        *out.entry(n).or_insert(0) += 1;
        return;
    }
    let d = pollard_rho(n);
    collect_factors(d, out);
    collect_factors(n / d, out);
}

/// Prime factorization of `n` as `(prime, exponent)` pairs with strictly
/// increasing primes. `factorize(1)` is empty; `factorize(0)` is empty too and
/// callers are expected to reject zero first.
///
/// ## Example
/// ```
/// use ecru::util::num::factorize;
///
/// assert_eq!(factorize(360), vec![(2, 3), (3, 2), (5, 1)]);
/// assert_eq!(factorize(1), vec![]);
/// ```
#[must_use]
pub fn factorize(mut n: u64) -> Vec<(u64, u64)> {
    let mut factors = BTreeMap::new();
    if n == 0 {
        return Vec::new();
    }

    let mut p = 2;
    while p <= TRIAL_LIMIT && p * p <= n {
        while n % p == 0 {
            *factors.entry(p).or_insert(0) += 1;
            n /= p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    collect_factors(n, &mut factors);

    factors.into_iter().collect()
}

/// All primes `<= limit`, by the sieve of Eratosthenes.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn primes_up_to(limit: u64) -> Vec<u64> {
    let limit = limit as usize;
    if limit < 2 {
        return Vec::new();
    }
    let mut composite = vec![false; limit + 1];
    let mut primes = Vec::new();
    for i in 2..=limit {
        if composite[i] {
            continue;
        }
        primes.push(i as u64);
        let mut multiple = i * i;
        while multiple <= limit {
            composite[multiple] = true;
            multiple += i;
        }
    }
    primes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_gcd(a: u64, b: u64) -> u64 {
        (1..=a.max(b)).rev()
                      .find(|d| a % d == 0 && b % d == 0)
                      .unwrap_or(0)
    }

    #[test]
    fn gcd_matches_naive() {
        for a in 1..60 {
            for b in 1..60 {
                assert_eq!(gcd(a, b), naive_gcd(a, b), "gcd({a}, {b})");
            }
        }
    }

    #[test]
    fn factorization_reconstructs_value() {
        for n in 1..2_000u64 {
            let product: u64 = factorize(n).iter()
                                           .map(|&(p, e)| p.pow(u32::try_from(e).unwrap()))
                                           .product();
            assert_eq!(product, n);
        }
    }

    #[test]
    fn factorizes_large_semiprime() {
        let p = 4_294_967_291u64;
        let q = 4_294_967_279u64;
        assert_eq!(factorize(p * q), vec![(q, 1), (p, 1)]);
        assert_eq!(factorize(u64::MAX),
                   vec![(3, 1), (5, 1), (17, 1), (257, 1), (641, 1), (65_537, 1), (6_700_417, 1)]);
    }

    #[test]
    fn inverses_round_trip() {
        for m in 2..40u64 {
            for a in 1..m {
                match inverse_mod(a, m) {
                    Some(inv) => assert_eq!(mul_mod(a, inv, m), 1),
                    None => assert_ne!(gcd(a, m), 1),
                }
            }
        }
    }

    #[test]
    fn sieve_lists_primes() {
        assert_eq!(primes_up_to(20), vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert!(primes_up_to(1).is_empty());
    }
}

//! Prime-factor shape algebra
//!
//! A membrane's shape is an ordered sequence of axis sizes, normally primes.
//! Each position in the sequence is one addressable axis whose size is the
//! factor at that position, and the volume is the product of the whole
//! sequence, repeats included.
//!
//! This single rule keeps sizing, addressing and reshape compatibility
//! consistent: volume is invariant under reshape, axis layout is free.
//!
//! ```
//! use membrane_core::shape::{factorize, PrimeShape};
//!
//! let shape = PrimeShape::new(vec![2, 3, 5]).unwrap();
//! assert_eq!(shape.rank(), 3);
//! assert_eq!(shape.volume(), 30);
//! assert!(shape.is_reshapable_to(&factorize(30).unwrap()));
//! ```

use crate::errors::{MembraneError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primality by trial division up to the square root
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let n = u64::from(n);
    let mut divisor = 3u64;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Ascending prime factorization of `n`
///
/// `factorize(1)` is the empty shape. Zero has no factorization.
pub fn factorize(n: u32) -> Result<PrimeShape> {
    if n == 0 {
        return Err(MembraneError::invalid_shape("0 has no prime factorization"));
    }

    let mut factors = Vec::new();
    let mut rest = u64::from(n);
    let mut divisor = 2u64;
    while divisor * divisor <= rest {
        while rest % divisor == 0 {
            factors.push(divisor as u32);
            rest /= divisor;
        }
        divisor += if divisor == 2 { 1 } else { 2 };
    }
    if rest > 1 {
        factors.push(rest as u32);
    }

    Ok(PrimeShape { factors })
}

/// Product of all factors; the empty shape has volume 1
pub fn volume(shape: &PrimeShape) -> u64 {
    shape.volume()
}

/// Number of addressable axes
pub fn rank(shape: &PrimeShape) -> u32 {
    shape.factors.len() as u32
}

/// Two shapes are mutually reshapable iff their volumes match
pub fn reshapable(from: &PrimeShape, to: &PrimeShape) -> bool {
    from.volume() == to.volume()
}

/// Ordered sequence of axis sizes, normally primes
///
/// Construction rejects degenerate axes (0 and 1) and volumes that overflow a
/// `u64`. Composite axis sizes are accepted so that a prime layout can be
/// reshaped into a coarser one such as `[2,15]`; [`canonical`](Self::canonical)
/// refines any shape back into primes. Emptiness is allowed here (it is the
/// factorization of 1); the store rejects empty shapes for membranes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct PrimeShape {
    factors: Vec<u32>,
}

impl PrimeShape {
    /// Validate and wrap a factor sequence
    pub fn new(factors: Vec<u32>) -> Result<Self> {
        let mut product: u64 = 1;
        for (axis, &factor) in factors.iter().enumerate() {
            if factor < 2 {
                return Err(MembraneError::invalid_shape(format!(
                    "axis {axis} has size {factor}, sizes start at 2"
                )));
            }
            product = product.checked_mul(u64::from(factor)).ok_or_else(|| {
                MembraneError::invalid_shape(format!("volume of {factors:?} overflows u64"))
            })?;
        }
        Ok(Self { factors })
    }

    /// Validate and copy a factor slice
    pub fn from_slice(factors: &[u32]) -> Result<Self> {
        Self::new(factors.to_vec())
    }

    /// The empty shape (volume 1, rank 0)
    pub fn scalar() -> Self {
        Self {
            factors: Vec::new(),
        }
    }

    /// Axis sizes in order
    pub fn factors(&self) -> &[u32] {
        &self.factors
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.factors.len()
    }

    /// Whether the shape has no axes
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Total element count
    pub fn volume(&self) -> u64 {
        // Overflow was ruled out at construction.
        self.factors.iter().map(|&f| u64::from(f)).product()
    }

    /// Size of one axis
    pub fn axis_size(&self, axis: usize) -> Option<u32> {
        self.factors.get(axis).copied()
    }

    /// Row-major strides, last axis fastest
    pub fn strides(&self) -> Vec<u64> {
        let mut strides = vec![1u64; self.factors.len()];
        for axis in (0..self.factors.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * u64::from(self.factors[axis + 1]);
        }
        strides
    }

    /// Flat buffer offset of a coordinate
    ///
    /// Requires exactly one index per axis and every index strictly below its
    /// axis size.
    pub fn flat_offset(&self, indices: &[u32]) -> Result<usize> {
        if indices.len() != self.factors.len() {
            return Err(MembraneError::IndexRankMismatch {
                expected: self.factors.len(),
                actual: indices.len(),
            });
        }

        let mut offset: u64 = 0;
        for (axis, (&index, stride)) in indices.iter().zip(self.strides()).enumerate() {
            let bound = self.factors[axis];
            if index >= bound {
                return Err(MembraneError::IndexOutOfBounds { axis, index, bound });
            }
            offset += u64::from(index) * stride;
        }

        usize::try_from(offset)
            .map_err(|_| MembraneError::invalid_shape("offset exceeds the address space"))
    }

    /// Whether every axis size is prime
    pub fn is_prime_factored(&self) -> bool {
        self.factors.iter().all(|&f| is_prime(f))
    }

    /// Refine every axis into its ascending prime factors, keeping axis order
    pub fn canonical(&self) -> PrimeShape {
        let factors = self
            .factors
            .iter()
            .flat_map(|&f| factorize(f).map(Vec::from).unwrap_or_default())
            .collect();
        PrimeShape { factors }
    }

    /// Whether `other` has the same volume
    pub fn is_reshapable_to(&self, other: &PrimeShape) -> bool {
        reshapable(self, other)
    }

    /// Distinct primes in first-seen order
    pub fn distinct_primes(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for &factor in &self.factors {
            if !seen.contains(&factor) {
                seen.push(factor);
            }
        }
        seen
    }

    /// Little-endian byte encoding of the factors, used for checksums
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.factors.iter().flat_map(|f| f.to_le_bytes()).collect()
    }
}

impl TryFrom<Vec<u32>> for PrimeShape {
    type Error = MembraneError;

    fn try_from(factors: Vec<u32>) -> Result<Self> {
        Self::new(factors)
    }
}

impl From<PrimeShape> for Vec<u32> {
    fn from(shape: PrimeShape) -> Self {
        shape.factors
    }
}

impl fmt::Display for PrimeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{factor}")?;
        }
        f.write_str("]")
    }
}

/// Parses `"2,3,5"`, `"[2, 3, 5]"`, `"2.3.5"` or `"2 3 5"`.
impl FromStr for PrimeShape {
    type Err = MembraneError;

    fn from_str(s: &str) -> Result<Self> {
        let body = s.trim().trim_start_matches('[').trim_end_matches(']');
        let factors = body
            .split(|c: char| c == ',' || c == '.' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| MembraneError::invalid_shape(format!("'{part}' is not an integer")))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(factors)
    }
}

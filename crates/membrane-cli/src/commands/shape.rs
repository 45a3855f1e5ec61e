//! `shape` and `factor` subcommands

use anyhow::{Context, Result};
use membrane_core::{factorize, PrimeShape};

/// Describe the rank, volume and strides of a shape
pub fn describe_shape(raw: &str) -> Result<String> {
    let shape: PrimeShape = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a shape"))?;
    let strides: Vec<String> = shape.strides().iter().map(u64::to_string).collect();

    let mut out = format!(
        "shape {shape}\nrank {}\nvolume {}\nstrides [{}]\n",
        shape.rank(),
        shape.volume(),
        strides.join(",")
    );
    if !shape.is_prime_factored() {
        out.push_str(&format!("canonical {}\n", shape.canonical()));
    }
    Ok(out)
}

/// Describe the prime factorization of `n`
pub fn describe_factorization(n: u32) -> Result<String> {
    let shape = factorize(n)?;
    Ok(format!("{n} = {shape} (rank {})\n", shape.rank()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_shape() {
        let out = describe_shape("2,3,5").unwrap();
        assert_eq!(out, "shape [2,3,5]\nrank 3\nvolume 30\nstrides [15,5,1]\n");
    }

    #[test]
    fn test_describe_composite_shape() {
        let out = describe_shape("[2, 15]").unwrap();
        assert!(out.ends_with("canonical [2,3,5]\n"));
    }

    #[test]
    fn test_describe_factorization() {
        assert_eq!(describe_factorization(12).unwrap(), "12 = [2,2,3] (rank 3)\n");
        assert_eq!(describe_factorization(1).unwrap(), "1 = [] (rank 0)\n");
        assert!(describe_factorization(0).is_err());
    }
}

use anyhow::{Result, bail};
use std::collections::HashSet;

use tourbus_game::region_hash;

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into concrete seeds.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex
/// literals, and `@label` tokens which hash the label so runs can be named.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed_token(token)?;
        if seen.insert(seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_seed_token(token: &str) -> Result<u64> {
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        && let Ok(value) = u64::from_str_radix(hex, 16)
    {
        return Ok(value);
    }
    if let Some(label) = token.strip_prefix('@')
        && !label.is_empty()
    {
        return Ok(u64::from(region_hash(label).unsigned_abs()));
    }
    bail!("Unrecognized seed token: {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_labels() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "@midwest-1"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 255, 927_188_955]);
    }

    #[test]
    fn dedupes_and_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", " 5 "])).unwrap();
        assert_eq!(seeds, vec![5]);
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(
            resolve_seed_inputs(&tokens(&["", "  "])).unwrap(),
            vec![DEFAULT_SEED]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["@"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xzz"])).is_err());
    }
}

//! # Finalizer Validation
//!
//! A finalizer is a qualified name: a DNS-1123 subdomain prefix with at
//! least two labels, a `/`, then a DNS-1123 label.

use crate::constants::MAX_FINALIZER_PREFIX_LEN;
use anyhow::Result;
use regex::Regex;

/// Validate finalizer name syntax
/// Format: `<domain>/<name>`, e.g. `widgets.sample.operator.io/finalizer`
/// The domain may not exceed 253 characters
pub fn validate_finalizer_name(finalizer: &str) -> Result<()> {
    if finalizer.is_empty() {
        return Err(anyhow::anyhow!("finalizer name cannot be empty"));
    }

    let (prefix, name) = finalizer
        .split_once('/')
        .ok_or_else(|| anyhow::anyhow!("'{finalizer}' must have the form <domain>/<name>"))?;

    if prefix.len() > MAX_FINALIZER_PREFIX_LEN {
        return Err(anyhow::anyhow!(
            "finalizer domain '{}' exceeds maximum length of {} characters (got {})",
            prefix,
            MAX_FINALIZER_PREFIX_LEN,
            prefix.len()
        ));
    }

    // label: alphanumeric, inner hyphens, 1-63 chars
    // domain: one or more labels followed by a TLD of at least two letters
    let finalizer_regex = Regex::new(
        r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}/[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    )
    .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !finalizer_regex.is_match(finalizer) {
        return Err(anyhow::anyhow!(
            "'{prefix}/{name}' must be a valid qualified name (DNS subdomain prefix, '/', DNS label)"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_finalizers() {
        for name in [
            "widgets.sample.operator.io/finalizer",
            "example.com/cleanup",
            "my-operator.example.org/my-finalizer-1",
        ] {
            assert!(validate_finalizer_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_finalizers() {
        for name in [
            "",
            "finalizer",
            "nodomain/finalizer",
            "example.com/",
            "example.com/-bad",
            "-bad.example.com/finalizer",
            "example.com/a/b",
            "example.c/finalizer",
        ] {
            assert!(validate_finalizer_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_prefix_length_limit() {
        let label = "a".repeat(60);
        let prefix = format!("{label}.{label}.{label}.{label}.{label}.com");
        assert!(prefix.len() > MAX_FINALIZER_PREFIX_LEN);
        assert!(validate_finalizer_name(&format!("{prefix}/finalizer")).is_err());
    }
}

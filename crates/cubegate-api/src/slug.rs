//! Slug validation and generation shared by tenant materialization and the
//! tenant-slug-rename admin endpoint.

use cubegate_core::{GatewayError, Result};
use cubegate_storage::RegistryStore;

const MAX_SUFFIX: u32 = 999;

/// `^[a-z][a-z0-9-]{2,47}$` — 3 to 48 characters total, first character a
/// lowercase letter.
pub fn validate_slug(slug: &str) -> Result<()> {
    let bytes = slug.as_bytes();
    let valid_len = (3..=48).contains(&bytes.len());
    let starts_with_letter = bytes.first().is_some_and(u8::is_ascii_lowercase);
    let valid_chars = bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');

    if valid_len && starts_with_letter && valid_chars {
        Ok(())
    } else {
        Err(GatewayError::Validation {
            message: format!("slug \"{slug}\" must match ^[a-z][a-z0-9-]{{2,47}}$"),
            details: None,
        })
    }
}

/// Lowercase, replace runs of non-`[a-z0-9]` with a single `-`, trim
/// leading/trailing dashes, and fall back to `"org"` if nothing survives.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_dash = false;
    for ch in input.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() || !slug.as_bytes()[0].is_ascii_lowercase() {
        slug = format!("org-{slug}");
    }
    if slug.len() > 48 {
        slug.truncate(48);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    if slug.len() < 3 {
        slug = format!("{slug}-org");
    }
    slug
}

/// Find a free slug starting from `preferred`: if taken, try `preferred-2`,
/// `preferred-3`, ... up to `preferred-999`, then give up.
pub fn unique_slug(store: &dyn RegistryStore, preferred: &str) -> Result<String> {
    let base = slugify(preferred);
    validate_slug(&base)?;

    if store.get_tenant_by_slug(&base)?.is_none() {
        return Ok(base);
    }

    for suffix in 2..=MAX_SUFFIX {
        let candidate = format!("{base}-{suffix}");
        if candidate.len() > 48 {
            break;
        }
        if store.get_tenant_by_slug(&candidate)?.is_none() {
            return Ok(candidate);
        }
    }

    Err(GatewayError::SlugTaken(base))
}

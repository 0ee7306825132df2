//! Utilities for working with `teleform-aws`.
use ring::rand::SecureRandom;

/// Returns `prefix` followed by a dash and a random lowercase hex suffix.
///
/// Used to name records synthesized during import, so importing the same
/// remote resource twice never produces colliding identifiers.
pub fn prefixed_unique_id(prefix: &str) -> anyhow::Result<String> {
    let mut bytes = [0u8; 13];
    ring::rand::SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("could not generate a unique id for '{prefix}'"))?;
    let id = format!("{prefix}-{}", data_encoding::HEXLOWER.encode(&bytes));
    log::trace!("generated unique id {id}");
    Ok(id)
}

//! Identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique record id then encode using bech32, the hrp names the record kind
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Case and whitespace insensitive key used for permission lookups and unique constraints.
pub fn normalise_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix() {
        let id = new_uuid_to_bech32("pay_").unwrap();
        assert!(id.starts_with("pay_1"));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    #[test]
    fn ids_are_unique() {
        let a = new_uuid_to_bech32("pref_").unwrap();
        let b = new_uuid_to_bech32("pref_").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keys_are_normalised() {
        assert_eq!(normalise_key("  Payments "), "payments");
    }
}

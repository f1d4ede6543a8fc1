//! Utility functions for identifiers and hashing

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Hex SHA-256 of raw content.
pub fn content_digest(bytes: &[u8]) -> String {
    sha256::digest(bytes)
}

/// Blob key under `namespace`, suffixed with random hex so uploads of the same
/// file name never collide.
pub fn blob_key(namespace: &str, name: &str) -> String {
    let suffix = hex::encode(uuid7().as_bytes());
    let name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    format!("{namespace}/{suffix}_{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blob_keys_are_namespaced_and_unique() {
        let a = blob_key("docs", "deed of sale.pdf");
        let b = blob_key("docs", "deed of sale.pdf");

        assert!(a.starts_with("docs/"));
        assert!(a.ends_with("_deed_of_sale.pdf"));
        assert_ne!(a, b);
    }
}

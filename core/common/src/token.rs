//! Retrieval token codec.
//!
//! A token is `storage_key ~ encryption_key`. The encryption key part is
//! optional: tokens without a separator refer to secrets stored in plaintext.
//! Only the first separator is significant, since the key text may itself
//! contain `~`.

/// Separator between the storage key and the encryption key.
pub const TOKEN_SEPARATOR: char = '~';

/// Join a storage key and an optional encryption key into a token.
pub fn encode(storage_key: &str, encryption_key: Option<&str>) -> String {
    match encryption_key {
        Some(key) => {
            let mut token = String::with_capacity(storage_key.len() + 1 + key.len());
            token.push_str(storage_key);
            token.push(TOKEN_SEPARATOR);
            token.push_str(key);
            token
        }
        None => storage_key.to_string(),
    }
}

/// Split a token into its storage key and optional encryption key.
///
/// Never fails: a token without a separator is taken whole as the storage
/// key, and an empty key fragment counts as absent. A key that turns out to
/// be unusable is rejected later, at decryption.
pub fn decode(token: &str) -> (&str, Option<&str>) {
    match token.split_once(TOKEN_SEPARATOR) {
        Some((storage_key, key)) if !key.is_empty() => (storage_key, Some(key)),
        Some((storage_key, _)) => (storage_key, None),
        None => (token, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_with_key() {
        assert_eq!(encode("oncelinkabc", Some("k3y")), "oncelinkabc~k3y");
    }

    #[test]
    fn test_encode_without_key() {
        assert_eq!(encode("oncelinkabc", None), "oncelinkabc");
    }

    #[test]
    fn test_decode_without_separator_is_plaintext_mode() {
        assert_eq!(decode("legacykey"), ("legacykey", None));
    }

    #[test]
    fn test_decode_splits_on_first_separator_only() {
        assert_eq!(decode("store~key~with~tildes"), ("store", Some("key~with~tildes")));
    }

    #[test]
    fn test_decode_trailing_separator_has_no_key() {
        assert_eq!(decode("store~"), ("store", None));
    }

    #[test]
    fn test_decode_empty_token() {
        assert_eq!(decode(""), ("", None));
    }

    proptest! {
        #[test]
        fn roundtrip_with_key(storage in "[a-z0-9]{1,40}", key in "[A-Za-z0-9_~-]{1,60}") {
            let token = encode(&storage, Some(&key));
            prop_assert_eq!(decode(&token), (storage.as_str(), Some(key.as_str())));
        }

        #[test]
        fn roundtrip_without_key(storage in "[a-z0-9]{1,40}") {
            let token = encode(&storage, None);
            prop_assert_eq!(decode(&token), (storage.as_str(), None));
        }

        #[test]
        fn decode_never_panics(token in ".*") {
            let _ = decode(&token);
        }
    }
}

//! Verification of Telegram WebApp init data.
//!
//! The client forwards the `initData` query string it received from the host
//! platform. Every field except `hash` is signed: the fields are sorted by key,
//! rendered as `key=value` lines and authenticated with HMAC-SHA256. The HMAC
//! key is the SHA-256 digest of the bot token.

pub mod user;

pub use user::{VerifiedIdentity, WebAppUser};

use crate::error::{AuthError, Result, WheelError};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const HASH_FIELD: &str = "hash";
pub const USER_FIELD: &str = "user";

/// Verifies init data against a single bot token.
#[derive(Clone)]
pub struct InitDataValidator {
    mac: HmacSha256,
}

impl InitDataValidator {
    pub fn new(bot_token: &str) -> Result<Self> {
        if bot_token.is_empty() {
            return Err(WheelError::config("BOT_TOKEN is not set"));
        }

        let secret_key = derive_secret_key(bot_token);
        let mac = HmacSha256::new_from_slice(&secret_key)
            .map_err(|e| WheelError::internal(format!("Failed to key HMAC: {}", e)))?;

        Ok(Self { mac })
    }

    /// Check the signature of `init_data` and extract the user it vouches for.
    pub fn validate(&self, init_data: &str) -> std::result::Result<VerifiedIdentity, AuthError> {
        if init_data.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        let mut fields = parse_fields(init_data);
        let received_hash = fields.remove(HASH_FIELD).unwrap_or_default();
        let calc_hash = self.sign_fields(&fields);

        let matches: bool = calc_hash
            .as_bytes()
            .ct_eq(received_hash.as_bytes())
            .into();
        if !matches {
            tracing::warn!(
                "initData hash mismatch (recv={} calc={})",
                received_hash.chars().take(8).collect::<String>(),
                &calc_hash[..8]
            );
            return Err(AuthError::InvalidSignature);
        }

        let raw_user = fields
            .get(USER_FIELD)
            .filter(|raw| !raw.is_empty())
            .ok_or(AuthError::MissingUserField)?;
        let user = WebAppUser::parse(raw_user)?;

        tracing::debug!("Verified initData for user {}", user.id);
        Ok(VerifiedIdentity::new(user, fields))
    }

    /// Produce a signed init data string carrying `fields`.
    ///
    /// Any `hash` entry in `fields` is ignored and replaced by the computed one.
    pub fn sign(&self, fields: &BTreeMap<String, String>) -> String {
        let mut fields = fields.clone();
        fields.remove(HASH_FIELD);
        let hash = self.sign_fields(&fields);

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(fields.iter());
        serializer.append_pair(HASH_FIELD, &hash);
        serializer.finish()
    }

    fn sign_fields(&self, fields: &BTreeMap<String, String>) -> String {
        let mut mac = self.mac.clone();
        mac.update(data_check_string(fields).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for InitDataValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataValidator").finish_non_exhaustive()
    }
}

/// Validate `init_data` against `bot_token` in one call.
pub fn validate_init_data(init_data: &str, bot_token: &str) -> Result<VerifiedIdentity> {
    let validator = InitDataValidator::new(bot_token)?;
    Ok(validator.validate(init_data)?)
}

/// Sign `fields` with `bot_token`, returning a complete init data string.
pub fn sign_init_data(fields: &BTreeMap<String, String>, bot_token: &str) -> Result<String> {
    Ok(InitDataValidator::new(bot_token)?.sign(fields))
}

/// Sorted `key=value` lines joined with `\n`.
pub fn data_check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

// Plain SHA-256 of the token, not HMAC("WebAppData", token). Matches the
// deployed bot; do not change without checking the platform.
fn derive_secret_key(bot_token: &str) -> [u8; 32] {
    Sha256::digest(bot_token.as_bytes()).into()
}

/// Percent-decoded pairs; blank values kept, later duplicates win.
fn parse_fields(init_data: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";

    fn fields(user_json: &str) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("auth_date".to_string(), "1700000000".to_string());
        fields.insert("query_id".to_string(), "AAHdF6IQAAAAAN0XohDhrOrc".to_string());
        fields.insert(USER_FIELD.to_string(), user_json.to_string());
        fields
    }

    fn validator() -> InitDataValidator {
        InitDataValidator::new(BOT_TOKEN).unwrap()
    }

    #[test]
    fn test_sign_then_validate() {
        let validator = validator();
        let init_data = validator.sign(&fields(r#"{"id":7,"username":"ann"}"#));

        let identity = validator.validate(&init_data).unwrap();
        assert_eq!(identity.id(), 7);
        assert_eq!(identity.user().username.as_deref(), Some("ann"));
        assert_eq!(identity.field("auth_date"), Some("1700000000"));
        assert!(identity.field(HASH_FIELD).is_none());
    }

    #[test]
    fn test_known_digest() {
        let mut fields = BTreeMap::new();
        fields.insert("auth_date".to_string(), "1700000000".to_string());
        fields.insert(USER_FIELD.to_string(), r#"{"id":7}"#.to_string());

        assert_eq!(
            data_check_string(&fields),
            "auth_date=1700000000\nuser={\"id\":7}"
        );
        assert_eq!(validator().sign_fields(&fields), KNOWN_DIGEST);
    }

    const KNOWN_DIGEST: &str = "cad4c8504036848bea597cd5c9da6ccca09f855308e55b7cfa1bf17e5336b2c2";

    #[test]
    fn test_field_order_does_not_matter() {
        let validator = validator();
        let signed = validator.sign(&fields(r#"{"id":7}"#));
        let hash = parse_fields(&signed).remove(HASH_FIELD).unwrap();

        let reordered = format!(
            "hash={}&user=%7B%22id%22%3A7%7D&query_id=AAHdF6IQAAAAAN0XohDhrOrc&auth_date=1700000000",
            hash
        );
        assert_eq!(validator.validate(&reordered).unwrap().id(), 7);
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(
            validator().validate("").unwrap_err(),
            AuthError::EmptyToken
        );
    }

    #[test]
    fn test_missing_hash() {
        let validator = validator();
        assert_eq!(
            validator.validate("auth_date=1700000000&user=%7B%22id%22%3A7%7D").unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_tampered_hash() {
        let validator = validator();
        let signed = validator.sign(&fields(r#"{"id":7}"#));
        let mut parsed = parse_fields(&signed);
        let hash = parsed.remove(HASH_FIELD).unwrap();

        for idx in [0, hash.len() / 2, hash.len() - 1] {
            let mut bytes = hash.clone().into_bytes();
            bytes[idx] = if bytes[idx] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();

            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            serializer.extend_pairs(parsed.iter());
            serializer.append_pair(HASH_FIELD, &tampered);

            assert_eq!(
                validator.validate(&serializer.finish()).unwrap_err(),
                AuthError::InvalidSignature
            );
        }
    }

    #[test]
    fn test_uppercase_hash_rejected() {
        let validator = validator();
        let signed = validator.sign(&fields(r#"{"id":7}"#));
        let mut parsed = parse_fields(&signed);
        let hash = parsed.remove(HASH_FIELD).unwrap().to_uppercase();
        parsed.insert(HASH_FIELD.to_string(), hash);

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(parsed.iter());
        assert_eq!(
            validator.validate(&serializer.finish()).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_tampered_field_value() {
        let validator = validator();
        let signed = validator.sign(&fields(r#"{"id":7}"#));

        let tampered = signed.replace("1700000000", "1700000001");
        assert_ne!(tampered, signed);
        assert_eq!(
            validator.validate(&tampered).unwrap_err(),
            AuthError::InvalidSignature
        );

        let impersonated = signed.replace("%3A7%7D", "%3A8%7D");
        assert_ne!(impersonated, signed);
        assert_eq!(
            validator.validate(&impersonated).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_extra_field_is_signed() {
        let validator = validator();
        let signed = validator.sign(&fields(r#"{"id":7}"#));

        assert_eq!(
            validator
                .validate(&format!("{}&start_param=promo", signed))
                .unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_blank_values_are_signed() {
        let validator = validator();
        let mut with_blank = fields(r#"{"id":7}"#);
        with_blank.insert("start_param".to_string(), String::new());

        let signed = validator.sign(&with_blank);
        assert!(signed.contains("start_param=&"));
        let identity = validator.validate(&signed).unwrap();
        assert_eq!(identity.field("start_param"), Some(""));

        let stripped = signed.replace("start_param=&", "");
        assert_eq!(
            validator.validate(&stripped).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_wrong_bot_token() {
        let signed = validator().sign(&fields(r#"{"id":7}"#));
        let other = InitDataValidator::new("654321:OTHER-TOKEN").unwrap();
        assert_eq!(
            other.validate(&signed).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_missing_user_field() {
        let validator = validator();
        let mut without_user = fields("");
        without_user.remove(USER_FIELD);

        let signed = validator.sign(&without_user);
        assert_eq!(
            validator.validate(&signed).unwrap_err(),
            AuthError::MissingUserField
        );

        let blank = validator.sign(&fields(""));
        assert_eq!(
            validator.validate(&blank).unwrap_err(),
            AuthError::MissingUserField
        );
    }

    #[test]
    fn test_malformed_user_json() {
        let validator = validator();
        for user in ["{\"first_name\":\"Ann\"}", "[7]", "[7,\"ann\"]", "{id:7}", "null"] {
            let signed = validator.sign(&fields(user));
            assert!(matches!(
                validator.validate(&signed).unwrap_err(),
                AuthError::MalformedUserJson(_)
            ));
        }
    }

    #[test]
    fn test_empty_bot_token_is_config_error() {
        assert!(matches!(
            InitDataValidator::new(""),
            Err(WheelError::Config(_))
        ));
        assert!(matches!(
            validate_init_data("user=%7B%22id%22%3A7%7D", ""),
            Err(WheelError::Config(_))
        ));
    }

    #[test]
    fn test_free_functions() {
        let signed = sign_init_data(&fields(r#"{"id":9}"#), BOT_TOKEN).unwrap();
        assert_eq!(validate_init_data(&signed, BOT_TOKEN).unwrap().id(), 9);
    }
}

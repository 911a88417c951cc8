use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `user` object carried inside init data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl WebAppUser {
    /// Parse the `user` field. Only a JSON object is accepted; derived struct
    /// impls would otherwise take a positional array as well.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AuthError::MalformedUserJson(e.to_string()))?;
        if !value.is_object() {
            return Err(AuthError::MalformedUserJson(
                "user data is not a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| AuthError::MalformedUserJson(e.to_string()))
    }

    /// `@username` when present, otherwise the full name, otherwise the id.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{}", username);
        }

        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.id.to_string()
        } else {
            name
        }
    }
}

/// Identity extracted from init data whose signature checked out.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    user: WebAppUser,
    raw_fields: BTreeMap<String, String>,
}

impl VerifiedIdentity {
    pub(crate) fn new(user: WebAppUser, raw_fields: BTreeMap<String, String>) -> Self {
        Self { user, raw_fields }
    }

    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn user(&self) -> &WebAppUser {
        &self.user
    }

    /// Signed fields, `hash` excluded.
    pub fn raw_fields(&self) -> &BTreeMap<String, String> {
        &self.raw_fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.raw_fields.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let user =
            WebAppUser::parse(r#"{"id":7,"first_name":"Ann","language_code":"en"}"#).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.first_name.as_deref(), Some("Ann"));
        assert_eq!(user.username, None);
    }

    #[test]
    fn test_parse_user_rejects_bad_id() {
        assert!(matches!(
            WebAppUser::parse(r#"{"first_name":"Ann"}"#),
            Err(AuthError::MalformedUserJson(_))
        ));
        assert!(matches!(
            WebAppUser::parse(r#"{"id":"seven"}"#),
            Err(AuthError::MalformedUserJson(_))
        ));
        assert!(matches!(
            WebAppUser::parse(r#"{"id":7.5}"#),
            Err(AuthError::MalformedUserJson(_))
        ));
        assert!(matches!(
            WebAppUser::parse("not json"),
            Err(AuthError::MalformedUserJson(_))
        ));
    }

    #[test]
    fn test_parse_user_rejects_non_objects() {
        for raw in ["[7]", r#"[7,"ann"]"#, "7", r#""7""#, "null", "true"] {
            assert!(
                matches!(WebAppUser::parse(raw), Err(AuthError::MalformedUserJson(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_display_name() {
        let mut user = WebAppUser {
            id: 42,
            username: Some("ann".into()),
            first_name: Some("Ann".into()),
            last_name: Some("Lee".into()),
        };
        assert_eq!(user.display_name(), "@ann");

        user.username = None;
        assert_eq!(user.display_name(), "Ann Lee");

        user.last_name = None;
        assert_eq!(user.display_name(), "Ann");

        user.first_name = None;
        assert_eq!(user.display_name(), "42");
    }
}

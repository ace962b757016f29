use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body returned by both `/auth/login` and `/auth/refresh`
///
/// The refresh endpoint may omit the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogoutRequest {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_with_partial_user() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"token":"T1","refreshToken":"R1","user":{"id":"1"}}"#,
        )
        .unwrap();
        assert_eq!(auth.token, "T1");
        assert_eq!(auth.refresh_token, "R1");
        let user = auth.user.unwrap();
        assert_eq!(user.id, "1");
        assert!(user.email.is_empty());
        assert!(user.role.is_none());
    }

    #[test]
    fn test_refresh_response_without_user() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"token":"T2","refreshToken":"R2"}"#).unwrap();
        assert!(auth.user.is_none());
    }

    #[test]
    fn test_refresh_request_is_camel_case() {
        let body = serde_json::to_value(RefreshRequest { refresh_token: "R1" }).unwrap();
        assert_eq!(body, serde_json::json!({ "refreshToken": "R1" }));
    }
}

//! JWT による TokenVerifier 実装
//!
//! 認証コラボレーターが HS256 で署名したセッショントークンを検証します。
//! ユーザー ID は `sub` クレームから取り出します。

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, TokenVerifier, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
}

/// HS256 JWT Verifier
pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// トークンを発行
    ///
    /// 本番では認証サービスが発行する。ローカル開発とテスト用。
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_str().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        UserId::new(data.claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn alice() -> UserId {
        UserId::new("alice".to_string()).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        // テスト項目: 発行したトークンからユーザー ID を取り出せる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = verifier.issue(&alice(), Duration::minutes(5)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Ok(alice()));
    }

    #[test]
    fn test_expired_token() {
        // テスト項目: 期限切れのトークンは Expired
        // given (前提条件): 検証の猶予（60 秒）より前に期限切れ
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = verifier.issue(&alice(), Duration::minutes(-10)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        // テスト項目: 別の鍵で署名されたトークンは拒否される
        // given (前提条件):
        let issuer = JwtTokenVerifier::new("another-secret");
        let token = issuer.issue(&alice(), Duration::minutes(5)).unwrap();
        let verifier = JwtTokenVerifier::new(SECRET);

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_and_empty_token() {
        // テスト項目: 形式不正・空のトークン
        let verifier = JwtTokenVerifier::new(SECRET);

        assert!(matches!(
            verifier.verify("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
        assert_eq!(verifier.verify(""), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        // テスト項目: sub が空のトークンは拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let claims = Claims {
            sub: String::new(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}

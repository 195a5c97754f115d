//! TokenVerifier 実装

pub mod jwt;

pub use jwt::JwtTokenVerifier;

//! Token verification configuration.

/// Configuration for the bearer token boundary.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for signing. Only needed where
    /// tokens are issued; verification uses the public key alone.
    pub jwt_private_key_pem: Option<String>,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 86_400 = 1 day).
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: None,
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 86_400,
            jwt_issuer: "bungalow".into(),
        }
    }
}

use anyhow::{bail, Result};
use eventdesk_misc::api::user::{Role, TokenResponse};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::authz::Caller;

const ISSUER: &str = "eventdesk/jwt-tokenizer";

/// Registered claims (RFC 7519). The audience carries the role the token was
/// issued for.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub nbf: usize,
    pub sub: String,
}

/// Signs RS256 session tokens.
pub struct JwtTokenGenerator {
    key: EncodingKey,
    expiry: usize,
}

impl JwtTokenGenerator {
    /// `private_key` is a PEM encoded RSA key, `expiry` is in seconds.
    pub fn new(private_key: &[u8], expiry: u64) -> Result<Self> {
        let key = match EncodingKey::from_rsa_pem(private_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA private key for jwt token generation failed: {e}"),
        };
        Ok(Self {
            key,
            expiry: expiry as usize,
        })
    }

    pub fn generate_token(&self, caller: &Caller, now: u64) -> Result<TokenResponse> {
        let now = now as usize;

        let claims = Claims {
            aud: caller.role.to_string(),
            exp: now + self.expiry,
            iat: now,
            iss: String::from(ISSUER),
            nbf: now,
            sub: caller.id.clone(),
        };

        match encode(&Header::new(Algorithm::RS256), &claims, &self.key) {
            Ok(token) => Ok(TokenResponse {
                token,
                expire_after: claims.exp as u64,
            }),
            Err(e) => bail!("generate jwt token failed: {e}"),
        }
    }
}

/// Verifies tokens signed by [`JwtTokenGenerator`].
pub struct JwtTokenValidator {
    key: DecodingKey,
}

impl JwtTokenValidator {
    pub fn new(public_key: &[u8]) -> Result<Self> {
        let key = match DecodingKey::from_rsa_pem(public_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA public key for jwt token validation failed: {e}"),
        };
        Ok(Self { key })
    }

    pub fn validate_token(&self, token: &str, now: u64) -> Result<Caller> {
        let audience: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["aud", "exp", "iat", "iss", "nbf", "sub"]);
        validation.set_audience(&audience);

        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => bail!("validate jwt token failed: {e}"),
        };

        if claims.sub.is_empty() {
            bail!("validate jwt token failed: empty subject");
        }

        // The library allows some leeway, the server does not.
        let now = now as usize;
        if now >= claims.exp {
            bail!("validate jwt token failed: token expired");
        }
        if now < claims.nbf {
            bail!("validate jwt token failed: token not yet valid");
        }

        let role: Role = claims.aud.parse()?;
        Ok(Caller {
            id: claims.sub,
            role,
        })
    }
}

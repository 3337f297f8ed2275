// src/verifier.rs

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, Algorithm, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::FirebaseConfig;
use crate::error::AuthError;
use crate::keys::{KeyCache, GOOGLE_CERTS_URL};

/// Issuer URLs are this prefix followed by the project ID.
pub const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Tolerance for clock skew when checking `exp` and `iat`.
const LEEWAY_SECS: u64 = 60;

/// The identity handed to callers after a token passes verification.
///
/// Derived fresh from the claims on every call; never stored. Profile fields
/// the token does not carry come through as empty strings.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Claims carried by a Firebase ID token.
///
/// Everything is optional at the wire level; the verifier decides which
/// absences are fatal so each check can fail with its own error.
#[derive(Debug, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// The `aud` claim, which may be a single value or an array of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }

    fn into_vec(self) -> Vec<String> {
        match self {
            Audience::One(aud) => vec![aud],
            Audience::Many(auds) => auds,
        }
    }
}

/// Token verification, in one of two mutually exclusive modes.
///
/// The mode is fixed when the process constructs its state; nothing a caller
/// sends can switch a production process onto the emulator path.
#[derive(Clone)]
pub enum TokenVerifier {
    Production(ProductionVerifier),
    Emulator(EmulatorVerifier),
}

impl TokenVerifier {
    pub fn from_config(config: &FirebaseConfig) -> Self {
        if config.emulator_host.is_some() {
            TokenVerifier::Emulator(EmulatorVerifier::new())
        } else {
            TokenVerifier::Production(ProductionVerifier::new(
                config.project_id.clone(),
                KeyCache::new(GOOGLE_CERTS_URL),
            ))
        }
    }

    pub async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        match self {
            TokenVerifier::Production(verifier) => verifier.verify(token).await,
            TokenVerifier::Emulator(verifier) => verifier.verify(token),
        }
    }
}

/// Verifies RS256-signed ID tokens against the provider's published keys.
#[derive(Clone)]
pub struct ProductionVerifier {
    project_id: String,
    expected_issuer: String,
    keys: KeyCache,
}

impl ProductionVerifier {
    pub fn new(project_id: impl Into<String>, keys: KeyCache) -> Self {
        let project_id = project_id.into();
        let expected_issuer = format!("{ISSUER_PREFIX}{project_id}");
        Self {
            project_id,
            expected_issuer,
            keys,
        }
    }

    /// Validates structure, signature, and claims, returning the normalized
    /// identity.
    ///
    /// The algorithm is pinned to RS256 before the signature is considered;
    /// the header's declared algorithm never decides whether verification
    /// happens. Claims are only trusted once the signature check has passed.
    #[instrument(skip_all, err)]
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        // Read alg and kid from the raw header segment. The strict typed
        // header parser cannot represent alg "none", and a downgrade attempt
        // must surface as an algorithm rejection rather than a parse error.
        let header: RawHeader = decode_json_segment(token, 0)?;
        if header.alg.as_deref() != Some("RS256") {
            return Err(AuthError::UnsupportedAlgorithm(
                header.alg.unwrap_or_default(),
            ));
        }
        let kid = match header.kid {
            Some(kid) if !kid.is_empty() => kid,
            _ => return Err(AuthError::MissingKeyId),
        };

        let key = self.keys.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS;
        // Audience membership is checked below so the mismatch carries the
        // offending values.
        validation.validate_aud = false;
        let decoded =
            decode::<IdTokenClaims>(token, &key, &validation).map_err(map_jwt_error)?;
        let claims = decoded.claims;

        // The decoder validates exp but does not compare iat to the clock.
        if claims.iat.is_some_and(|iat| iat > unix_now() + LEEWAY_SECS) {
            return Err(AuthError::IssuedInFuture);
        }

        let uid = match claims.sub {
            Some(ref sub) if !sub.is_empty() => sub.clone(),
            _ => return Err(AuthError::MissingSubject),
        };

        if claims.iss.as_deref() != Some(self.expected_issuer.as_str()) {
            return Err(AuthError::BadIssuer {
                got: claims.iss.unwrap_or_default(),
                want: self.expected_issuer.clone(),
            });
        }

        let audience_matches = claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&self.project_id));
        if !audience_matches {
            return Err(AuthError::BadAudience(
                claims.aud.map(Audience::into_vec).unwrap_or_default(),
            ));
        }

        Ok(AuthenticatedUser {
            uid,
            email: claims.email.unwrap_or_default(),
            name: claims.name.unwrap_or_default(),
            picture: claims.picture.unwrap_or_default(),
        })
    }
}

/// Parses tokens issued by the local Auth emulator.
///
/// The emulator deliberately issues unsigned tokens, so this path never
/// checks a signature, even when one is present. It lives in its own type so
/// the production verifier has no "skip signature" switch to reach.
#[derive(Clone, Default)]
pub struct EmulatorVerifier;

impl EmulatorVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let header: RawHeader = decode_json_segment(token, 0)?;
        match header.alg.as_deref() {
            Some("none") | Some("RS256") => {}
            alg => {
                return Err(AuthError::UnsupportedAlgorithm(
                    alg.unwrap_or_default().to_string(),
                ))
            }
        }

        let claims: IdTokenClaims = decode_json_segment(token, 1)?;

        let uid = match claims.sub {
            Some(sub) if !sub.is_empty() => sub,
            _ => return Err(AuthError::MissingSubject),
        };

        Ok(AuthenticatedUser {
            uid,
            email: claims.email.unwrap_or_default(),
            name: claims.name.unwrap_or_default(),
            picture: claims.picture.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    kid: Option<String>,
}

/// Splits a compact JWT and decodes one segment as JSON. Performs no
/// signature verification.
fn decode_json_segment<T: DeserializeOwned>(token: &str, index: usize) -> Result<T, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return Err(malformed_token());
    }
    let bytes = base64_url::decode(parts[index]).map_err(|_| malformed_token())?;
    serde_json::from_slice(&bytes).map_err(|_| malformed_token())
}

fn malformed_token() -> AuthError {
    AuthError::Malformed(jsonwebtoken::errors::ErrorKind::InvalidToken.into())
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => return AuthError::Expired,
        ErrorKind::InvalidSignature => return AuthError::BadSignature,
        ErrorKind::ImmatureSignature => return AuthError::IssuedInFuture,
        _ => {}
    }
    AuthError::Malformed(err)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

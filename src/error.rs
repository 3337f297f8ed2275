// src/error.rs

use thiserror::Error;

/// Failure refreshing the signing-key set from the certificate endpoint.
///
/// A fetch failure never evicts previously cached keys; the stale set is kept
/// and the next verification attempt triggers another refresh.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("fetching certificates: {0}")]
    Http(#[from] reqwest::Error),

    #[error("certificate endpoint returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("invalid certificate for key {kid:?}: {reason}")]
    BadCertificate { kid: String, reason: String },

    #[error("certificate for key {kid:?} does not hold an RSA public key")]
    NotRsa { kid: String },
}

/// Why a bearer token was rejected.
///
/// Every variant collapses to the same caller-visible UNAUTHENTICATED
/// response; the variant only drives server-side logging.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unexpected signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("token header is missing the 'kid' field")]
    MissingKeyId,

    #[error("no signing key found for kid {0:?}")]
    UnknownKey(String),

    #[error("signing keys unavailable: {0}")]
    KeyUnavailable(#[from] KeyFetchError),

    #[error("token signature verification failed")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token issued in the future")]
    IssuedInFuture,

    #[error("token subject (uid) is empty")]
    MissingSubject,

    #[error("invalid issuer: got {got:?}, want {want:?}")]
    BadIssuer { got: String, want: String },

    #[error("audience {0:?} does not include the expected project")]
    BadAudience(Vec<String>),

    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
}

// src/keys.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::error::{AuthError, KeyFetchError};

/// Google's published X.509 certificates for Firebase ID token signing keys.
pub const GOOGLE_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Fallback TTL when the certificate response carries no usable max-age.
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Upper bound on the refresh fetch so a hung provider cannot stall every
/// verification behind the write lock.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A cache of the identity provider's current public signing keys.
///
/// The provider republishes the complete key set together, so the cache holds
/// one `kid -> key` map with a single expiry instant covering the whole set.
/// Reads against a valid set never touch the network; an expired set is
/// refreshed exactly once even when many callers race into the expiry.
#[derive(Clone)]
pub struct KeyCache {
    // Internally ref-counted so clones share one key set.
    inner: Arc<Inner>,
}

struct Inner {
    certs_url: String,
    http_client: reqwest::Client,
    state: RwLock<CacheState>,
}

struct CacheState {
    keys: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

impl KeyCache {
    /// Creates an empty cache backed by the given certificate endpoint. The
    /// first lookup populates it.
    pub fn new(certs_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                certs_url: certs_url.into(),
                http_client: reqwest::Client::new(),
                state: RwLock::new(CacheState {
                    keys: HashMap::new(),
                    expires_at: Instant::now(),
                }),
            }),
        }
    }

    /// Resolves the decoding key for `kid`.
    ///
    /// A miss against an unexpired set fails without refreshing: the provider
    /// publishes the complete current set, so an unknown `kid` under a valid
    /// set indicates a forged or tampered token rather than a rotation.
    #[instrument(skip(self), err)]
    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        {
            let state = self.inner.state.read().await;
            if Instant::now() < state.expires_at {
                if let Some(key) = state.keys.get(kid) {
                    debug!("signing-key cache hit for kid {}", kid);
                    return Ok(key.clone());
                }
                return Err(AuthError::UnknownKey(kid.to_string()));
            }
        }

        self.refresh().await?;

        let state = self.inner.state.read().await;
        state
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    /// Replaces the key set from the certificate endpoint.
    ///
    /// Holds the write lock for the duration of the fetch so concurrent
    /// callers racing into an expired set issue one outbound request between
    /// them; the expiry re-check covers callers that queued behind a
    /// completed refresh. A failed fetch keeps the stale set in place.
    async fn refresh(&self) -> Result<(), AuthError> {
        let mut state = self.inner.state.write().await;

        if Instant::now() < state.expires_at {
            return Ok(());
        }

        let (keys, ttl) = self.fetch_keys().await.map_err(AuthError::KeyUnavailable)?;
        info!(
            count = keys.len(),
            ttl_secs = ttl.as_secs(),
            "refreshed signing keys"
        );
        state.keys = keys;
        state.expires_at = Instant::now() + ttl;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn fetch_keys(
        &self,
    ) -> Result<(HashMap<String, Arc<DecodingKey>>, Duration), KeyFetchError> {
        let response = self
            .inner
            .http_client
            .get(&self.inner.certs_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(KeyFetchError::BadStatus(response.status()));
        }

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_TTL);

        let cert_map: HashMap<String, String> = response.json().await?;

        let mut keys = HashMap::with_capacity(cert_map.len());
        for (kid, cert_pem) in cert_map {
            let key = decoding_key_from_cert(&kid, &cert_pem)?;
            keys.insert(kid, Arc::new(key));
        }
        Ok((keys, ttl))
    }
}

/// Extracts the RSA public key from one PEM-encoded X.509 certificate.
fn decoding_key_from_cert(kid: &str, cert_pem: &str) -> Result<DecodingKey, KeyFetchError> {
    let bad_cert = |reason: String| KeyFetchError::BadCertificate {
        kid: kid.to_string(),
        reason,
    };

    let (_, pem) = x509_parser::pem::parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| bad_cert(e.to_string()))?;
    let cert = pem.parse_x509().map_err(|e| bad_cert(e.to_string()))?;

    let spki = cert.public_key();
    match spki.parsed() {
        Ok(x509_parser::public_key::PublicKey::RSA(_)) => {}
        Ok(_) => return Err(KeyFetchError::NotRsa { kid: kid.to_string() }),
        Err(e) => return Err(bad_cert(e.to_string())),
    }

    // For RSA the SPKI bit string is the PKCS#1 RSAPublicKey structure, which
    // is exactly the DER form the decoder expects.
    Ok(DecodingKey::from_rsa_der(&spki.subject_public_key.data))
}

/// Parses the `max-age` directive out of a `Cache-Control` header value.
fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control.split(',').find_map(|part| {
        part.trim()
            .strip_prefix("max-age=")?
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    })
}

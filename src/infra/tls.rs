//! TLS termination for the HTTPS listener.

use pkcs8::der::{pem::PemLabel, Document};
use pkcs8::EncryptedPrivateKeyInfo;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

use crate::error::ServerError;

/// Builds a rustls server configuration from PEM-encoded material.
///
/// # Arguments
///
/// * `cert_pem` - Certificate chain, leaf first
/// * `key_pem` - Private key (PKCS#8, PKCS#1 or SEC1), or an encrypted PKCS#8 key
/// * `passphrase` - Passphrase for an encrypted key
///
/// # Errors
///
/// Fails when the PEM data cannot be parsed or contains no key, and when an
/// encrypted key comes without a passphrase or with the wrong one.
pub fn build_server_config(
    cert_pem: &[u8],
    key_pem: &[u8],
    passphrase: Option<&str>,
) -> Result<Arc<ServerConfig>, ServerError> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Tls(format!("failed to parse certificate chain: {}", e)))?;
    if certs.is_empty() {
        return Err(ServerError::Tls("no certificate found in PEM data".into()));
    }

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(key_pem))
        .map_err(|e| ServerError::Tls(format!("failed to read private key: {}", e)))?;
    let key = match key {
        Some(key) => {
            if passphrase.is_some() {
                tracing::debug!("Private key is not encrypted, ignoring passphrase");
            }
            key
        }
        None => decrypt_private_key(key_pem, passphrase)?,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ServerError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| ServerError::Tls(format!("invalid certificate or key: {}", e)))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

pub fn acceptor(config: Arc<ServerConfig>) -> TlsAcceptor {
    TlsAcceptor::from(config)
}

/// Decrypts an `ENCRYPTED PRIVATE KEY` PEM block (PKCS#8 with PBES2).
fn decrypt_private_key(
    key_pem: &[u8],
    passphrase: Option<&str>,
) -> Result<PrivateKeyDer<'static>, ServerError> {
    let no_key = || ServerError::Tls("no private key found in PEM data".into());

    let pem = std::str::from_utf8(key_pem).map_err(|_| no_key())?;
    let (label, document) = Document::from_pem(pem).map_err(|_| no_key())?;
    if label != EncryptedPrivateKeyInfo::PEM_LABEL {
        return Err(no_key());
    }

    let passphrase = passphrase.ok_or_else(|| {
        ServerError::Tls("private key is encrypted but no passphrase was supplied".into())
    })?;
    let info = EncryptedPrivateKeyInfo::try_from(document.as_bytes())
        .map_err(|e| ServerError::Tls(format!("malformed encrypted private key: {}", e)))?;
    let decrypted = info
        .decrypt(passphrase)
        .map_err(|_| ServerError::Tls("failed to decrypt private key; check the passphrase".into()))?;

    tracing::debug!("Decrypted private key with the supplied passphrase");
    Ok(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        decrypted.as_bytes().to_vec(),
    )))
}

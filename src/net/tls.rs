//! TLS configuration and certificate loading.

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;
use crate::error::ServerError;

/// The only protocol offered during ALPN. Connections are always served as
/// HTTP/2, so clients that cannot speak it are refused at the handshake.
const ALPN_H2: &[u8] = b"h2";

/// Load certificate and key files into a rustls configuration.
///
/// The resulting config advertises `h2` via ALPN and nothing else.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, ServerError> {
    let server_config = server_config(config).await?;
    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

/// Build the rustls server config for `config`.
pub async fn server_config(config: &TlsConfig) -> Result<rustls::ServerConfig, ServerError> {
    let cert_path = Path::new(&config.cert_path);
    let key_path = Path::new(&config.key_path);

    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(ServerError::Tls(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{kind} file not found: {}", path.display()),
            )));
        }
    }

    let certs = load_certs(cert_path).await?;
    let key = load_private_key(key_path).await?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .and_then(|builder| builder.with_no_client_auth().with_single_cert(certs, key))
        .map_err(|e| ServerError::Tls(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    server_config.alpn_protocols = vec![ALPN_H2.to_vec()];

    Ok(server_config)
}

async fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let pem = tokio::fs::read(path).await.map_err(ServerError::Tls)?;
    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ServerError::Tls)?;

    if certs.is_empty() {
        return Err(ServerError::Tls(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No certificates found in {}", path.display()),
        )));
    }
    Ok(certs)
}

async fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let pem = tokio::fs::read(path).await.map_err(ServerError::Tls)?;
    rustls_pemfile::private_key(&mut pem.as_slice())
        .map_err(ServerError::Tls)?
        .ok_or_else(|| {
            ServerError::Tls(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("No private key found in {}", path.display()),
            ))
        })
}

/// Build the acceptor that performs handshakes on accepted TCP streams.
pub fn acceptor(config: RustlsConfig) -> RustlsAcceptor {
    RustlsAcceptor::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    fn fixture_config() -> TlsConfig {
        TlsConfig {
            cert_path: fixture("cert.pem"),
            key_path: fixture("key.pem"),
        }
    }

    #[tokio::test]
    async fn missing_files_are_tls_errors() {
        let config = TlsConfig {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        };
        let err = load_tls_config(&config).await.unwrap_err();
        assert!(matches!(err, ServerError::Tls(_)));
        assert!(err.to_string().contains("Certificate file not found"));
    }

    #[tokio::test]
    async fn alpn_offers_only_h2() {
        let config = server_config(&fixture_config()).await.unwrap();
        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec()]);
    }

    #[tokio::test]
    async fn fixture_pair_loads() {
        assert!(load_tls_config(&fixture_config()).await.is_ok());
    }

    #[tokio::test]
    async fn key_file_without_a_key_is_rejected() {
        let config = TlsConfig {
            cert_path: fixture("cert.pem"),
            key_path: fixture("cert.pem"),
        };
        let err = server_config(&config).await.unwrap_err();
        assert!(err.to_string().contains("No private key found"));
    }

    #[tokio::test]
    async fn cert_file_without_certificates_is_rejected() {
        let config = TlsConfig {
            cert_path: fixture("key.pem"),
            key_path: fixture("key.pem"),
        };
        let err = server_config(&config).await.unwrap_err();
        assert!(err.to_string().contains("No certificates found"));
    }
}

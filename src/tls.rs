//! Server TLS configuration
//!
//! The composition engine dials functions over TLS and verifies the server
//! certificate. Deployments mount the certificate pair into a directory and
//! point `TLS_SERVER_CERTS_DIR` at it; this module loads the pair and turns
//! it into a tonic server config.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tonic::transport::{Identity, ServerTlsConfig};

/// Certificate file name inside the certs directory
const CERT_FILE: &str = "tls.crt";

/// Private key file name inside the certs directory
const KEY_FILE: &str = "tls.key";

/// Errors loading TLS material
#[derive(Debug, Error)]
pub enum TlsError {
    /// A certificate or key file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Server TLS identity: a PEM certificate chain and private key
#[derive(Debug)]
pub struct ServerTls {
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
}

impl ServerTls {
    /// Create a config from in-memory PEM data
    pub fn new(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    /// Load `tls.crt` and `tls.key` from a mounted certs directory
    pub fn from_dir(dir: &Path) -> Result<Self, TlsError> {
        Ok(Self {
            cert_pem: read_pem(&dir.join(CERT_FILE))?,
            key_pem: read_pem(&dir.join(KEY_FILE))?,
        })
    }

    /// Convert to a tonic server TLS config
    pub fn to_tonic_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(Identity::from_pem(&self.cert_pem, &self.key_pem))
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

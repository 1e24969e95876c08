//! TLS credential discovery and loading.
//!
//! Credentials live in a well-known directory as `tls.crt` (PEM certificate
//! chain) and `tls.key` (PEM private key). A missing directory, or a directory
//! holding neither file, means plaintext transport. Anything else that is not a
//! loadable pair aborts startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

use crate::error::ServeError;

/// Directory where the certificate and private key are mounted.
pub const DEFAULT_TLS_DIR: &str = "/etc/rpc-bootstrap/tls";

/// File name of the PEM certificate chain inside the TLS directory.
pub const TLS_CERT_FILE: &str = "tls.crt";

/// File name of the PEM private key inside the TLS directory.
pub const TLS_KEY_FILE: &str = "tls.key";

/// Paths of a certificate/key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// A certificate/key pair that has been read and parsed.
#[derive(Clone)]
pub struct CredentialMaterial {
    pub paths: CredentialPaths,
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
}

impl std::fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialMaterial")
            .field("paths", &self.paths)
            .field("cert_len", &self.cert_pem.len())
            .finish_non_exhaustive()
    }
}

/// Result of probing the TLS directory.
#[derive(Debug)]
pub enum CredentialState {
    /// No TLS material: serve plaintext.
    Absent,
    /// A well-formed certificate/key pair.
    Present(CredentialMaterial),
    /// TLS material exists but cannot be used.
    Invalid {
        paths: CredentialPaths,
        /// The file that failed.
        path: PathBuf,
        error: io::Error,
    },
}

impl CredentialState {
    /// Turn the probe result into transport credentials.
    ///
    /// `Absent` is not an error; `Invalid` is always one.
    pub async fn into_credentials(self) -> Result<Option<ServerCredentials>, ServeError> {
        match self {
            CredentialState::Absent => Ok(None),
            CredentialState::Present(material) => {
                let config = RustlsConfig::from_pem(material.cert_pem, material.key_pem)
                    .await
                    .map_err(|source| ServeError::CredentialLoad {
                        path: material.paths.cert.clone(),
                        source,
                    })?;
                Ok(Some(ServerCredentials {
                    config,
                    paths: material.paths,
                }))
            }
            CredentialState::Invalid { path, error, .. } => Err(ServeError::CredentialLoad {
                path,
                source: error,
            }),
        }
    }
}

/// Looks for TLS material in one directory.
#[derive(Debug, Clone)]
pub struct CredentialProbe {
    dir: PathBuf,
}

impl CredentialProbe {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Inspect the directory and parse whatever is there.
    pub fn probe(&self) -> CredentialState {
        let paths = CredentialPaths {
            cert: self.dir.join(TLS_CERT_FILE),
            key: self.dir.join(TLS_KEY_FILE),
        };

        match fs::metadata(&self.dir) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "No TLS directory, serving plaintext");
                return CredentialState::Absent;
            }
            Err(error) => {
                let path = self.dir.clone();
                return CredentialState::Invalid { paths, path, error };
            }
        }

        let cert_pem = read_optional(&paths.cert);
        let key_pem = read_optional(&paths.key);

        let (cert_pem, key_pem) = match (cert_pem, key_pem) {
            (Ok(None), Ok(None)) => {
                tracing::debug!(
                    dir = %self.dir.display(),
                    "TLS directory is empty, serving plaintext"
                );
                return CredentialState::Absent;
            }
            (Ok(Some(cert)), Ok(Some(key))) => (cert, key),
            (Err(error), _) => {
                let path = paths.cert.clone();
                return invalid_or_missing(paths, path, Some(error));
            }
            (Ok(_), Err(error)) => {
                let path = paths.key.clone();
                return invalid_or_missing(paths, path, Some(error));
            }
            (Ok(None), Ok(Some(_))) => {
                let path = paths.cert.clone();
                return invalid_or_missing(paths, path, None);
            }
            (Ok(Some(_)), Ok(None)) => {
                let path = paths.key.clone();
                return invalid_or_missing(paths, path, None);
            }
        };

        if let Err(error) = parse_certificates(&cert_pem) {
            let path = paths.cert.clone();
            return CredentialState::Invalid { paths, path, error };
        }
        if let Err(error) = parse_private_key(&key_pem) {
            let path = paths.key.clone();
            return CredentialState::Invalid { paths, path, error };
        }

        CredentialState::Present(CredentialMaterial {
            paths,
            cert_pem,
            key_pem,
        })
    }
}

impl Default for CredentialProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TLS_DIR)
    }
}

/// Encrypted-transport credentials shared by every listener of a serve call.
#[derive(Clone)]
pub struct ServerCredentials {
    config: RustlsConfig,
    paths: CredentialPaths,
}

impl ServerCredentials {
    pub fn rustls_config(&self) -> RustlsConfig {
        self.config.clone()
    }

    pub fn paths(&self) -> &CredentialPaths {
        &self.paths
    }
}

impl std::fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("cert", &self.paths.cert)
            .field("key", &self.paths.key)
            .finish_non_exhaustive()
    }
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn invalid_or_missing(
    paths: CredentialPaths,
    path: PathBuf,
    error: Option<io::Error>,
) -> CredentialState {
    let error = error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
    });
    CredentialState::Invalid { paths, path, error }
}

fn parse_certificates(pem: &[u8]) -> io::Result<usize> {
    let certs = rustls_pemfile::certs(&mut &pem[..]).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "no PEM certificates found",
        ));
    }
    Ok(certs.len())
}

fn parse_private_key(pem: &[u8]) -> io::Result<()> {
    match rustls_pemfile::private_key(&mut &pem[..])? {
        Some(_) => Ok(()),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "no PEM private key found",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pair(dir: &Path) {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        fs::write(dir.join(TLS_CERT_FILE), cert.cert.pem()).unwrap();
        fs::write(dir.join(TLS_KEY_FILE), cert.key_pair.serialize_pem()).unwrap();
    }

    #[test]
    fn missing_directory_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let probe = CredentialProbe::new(tmp.path().join("does-not-exist"));
        assert!(matches!(probe.probe(), CredentialState::Absent));
    }

    #[test]
    fn empty_directory_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let probe = CredentialProbe::new(tmp.path());
        assert!(matches!(probe.probe(), CredentialState::Absent));
    }

    #[test]
    fn well_formed_pair_is_present() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path());

        match CredentialProbe::new(tmp.path()).probe() {
            CredentialState::Present(material) => {
                assert_eq!(material.paths.cert, tmp.path().join(TLS_CERT_FILE));
                assert_eq!(material.paths.key, tmp.path().join(TLS_KEY_FILE));
            }
            other => panic!("expected Present, got {:?}", other),
        }
    }

    #[test]
    fn cert_without_key_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path());
        fs::remove_file(tmp.path().join(TLS_KEY_FILE)).unwrap();

        match CredentialProbe::new(tmp.path()).probe() {
            CredentialState::Invalid { path, .. } => {
                assert_eq!(path, tmp.path().join(TLS_KEY_FILE));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn garbage_certificate_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path());
        fs::write(tmp.path().join(TLS_CERT_FILE), "not a certificate").unwrap();

        match CredentialProbe::new(tmp.path()).probe() {
            CredentialState::Invalid { path, error, .. } => {
                assert_eq!(path, tmp.path().join(TLS_CERT_FILE));
                assert_eq!(error.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn garbage_key_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path());
        fs::write(tmp.path().join(TLS_KEY_FILE), "not a key").unwrap();

        assert!(matches!(
            CredentialProbe::new(tmp.path()).probe(),
            CredentialState::Invalid { .. }
        ));
    }

    #[tokio::test]
    async fn absent_yields_no_credentials() {
        let creds = CredentialState::Absent.into_credentials().await.unwrap();
        assert!(creds.is_none());
    }

    #[tokio::test]
    async fn invalid_yields_credential_load_error() {
        let state = CredentialState::Invalid {
            paths: CredentialPaths {
                cert: PathBuf::from("/tls/tls.crt"),
                key: PathBuf::from("/tls/tls.key"),
            },
            path: PathBuf::from("/tls/tls.crt"),
            error: io::Error::new(io::ErrorKind::InvalidData, "bad"),
        };
        let err = state.into_credentials().await.unwrap_err();
        assert!(matches!(err, ServeError::CredentialLoad { .. }));
    }

    #[tokio::test]
    async fn present_yields_credentials() {
        let tmp = tempfile::tempdir().unwrap();
        write_pair(tmp.path());

        let creds = CredentialProbe::new(tmp.path())
            .probe()
            .into_credentials()
            .await
            .unwrap()
            .expect("credentials");
        assert_eq!(creds.paths().cert, tmp.path().join(TLS_CERT_FILE));
    }
}

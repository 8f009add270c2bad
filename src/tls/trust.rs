use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};

const BUNDLE_CANDIDATES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/cert.pem",
    "/usr/local/share/certs/ca-root-nss.crt",
];

const DIRECTORY_CANDIDATES: &[&str] = &["/etc/ssl/certs", "/etc/pki/tls/certs"];

/// Where peer certificate chains are verified against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    Bundle(PathBuf),
    Directory(PathBuf),
    /// Nothing configured; the library's compiled-in default paths apply.
    None,
}

impl TrustAnchor {
    /// Interprets an operator supplied path; a missing path is an error.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("cannot read trust anchors at {}", path.display()))?;
        if meta.is_dir() {
            Ok(TrustAnchor::Directory(path.to_path_buf()))
        } else {
            Ok(TrustAnchor::Bundle(path.to_path_buf()))
        }
    }

    pub fn discover() -> Self {
        let env_file = std::env::var_os("SSL_CERT_FILE").map(PathBuf::from);
        let env_dir = std::env::var_os("SSL_CERT_DIR").map(PathBuf::from);

        let bundles = env_file
            .into_iter()
            .chain(BUNDLE_CANDIDATES.iter().map(PathBuf::from));
        let directories = env_dir
            .into_iter()
            .chain(DIRECTORY_CANDIDATES.iter().map(PathBuf::from));

        let anchor = discover_in(bundles, directories);
        if anchor == TrustAnchor::None {
            tracing::warn!("no CA bundle or directory found; falling back to library defaults");
        }
        anchor
    }
}

fn discover_in(
    bundles: impl IntoIterator<Item = PathBuf>,
    directories: impl IntoIterator<Item = PathBuf>,
) -> TrustAnchor {
    if let Some(bundle) = bundles.into_iter().find(|path| path.is_file()) {
        return TrustAnchor::Bundle(bundle);
    }
    if let Some(dir) = directories.into_iter().find(|path| path.is_dir()) {
        return TrustAnchor::Directory(dir);
    }
    TrustAnchor::None
}

impl fmt::Display for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustAnchor::Bundle(path) => write!(f, "bundle {}", path.display()),
            TrustAnchor::Directory(path) => write!(f, "directory {}", path.display()),
            TrustAnchor::None => write!(f, "none"),
        }
    }
}

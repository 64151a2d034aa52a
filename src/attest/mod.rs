//! RA-TLS identity bootstrap.
//!
//! Produces the TLS identity the listener binds when not in development mode:
//! a fresh P-256 key and a self-signed certificate carrying the SGX quote as
//! an X.509 extension, following the Gramine RA-TLS convention — the quote's
//! report data commits to the certificate's public key, so a verifying client
//! can tie the TLS channel to the attested enclave.

use std::path::Path;

use rcgen::{CertificateParams, CustomExtension, DnType, KeyPair, SanType};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// X.509 extension OID under which RA-TLS certificates carry the quote.
pub const RA_TLS_QUOTE_OID: &[u64] = &[1, 2, 840, 113741, 1337, 6];

const REPORT_DATA_PATH: &str = "/dev/attestation/user_report_data";
const QUOTE_PATH: &str = "/dev/attestation/quote";

/// Where quotes come from. Seam so issuance is testable with a canned quote.
pub trait QuoteSource: Send + Sync {
    /// Produce a quote whose report data equals the given 64 bytes.
    fn quote(&self, report_data: &[u8; 64]) -> Result<Vec<u8>>;
}

/// Gramine's attestation devfs: write the report data, read the quote.
pub struct GramineQuoteSource;

impl QuoteSource for GramineQuoteSource {
    fn quote(&self, report_data: &[u8; 64]) -> Result<Vec<u8>> {
        std::fs::write(REPORT_DATA_PATH, report_data).map_err(|e| {
            Error::attestation(format!(
                "writing {}: {} (is the attestation devfs mounted?)",
                REPORT_DATA_PATH, e
            ))
        })?;
        std::fs::read(QUOTE_PATH)
            .map_err(|e| Error::attestation(format!("reading {}: {}", QUOTE_PATH, e)))
    }
}

/// A freshly issued PEM key/certificate pair.
#[derive(Debug)]
pub struct RaTlsIdentity {
    pub key_pem: String,
    pub cert_pem: String,
}

/// Generate a keypair and self-sign a certificate embedding a quote over it.
pub fn issue_identity(source: &dyn QuoteSource, common_name: &str) -> Result<RaTlsIdentity> {
    let key_pair =
        KeyPair::generate().map_err(|e| Error::attestation(format!("key generation: {}", e)))?;

    // Report data commits to the public key: SHA-256 of the SPKI DER,
    // zero-padded to the 64 bytes SGX expects.
    let mut report_data = [0u8; 64];
    let digest = Sha256::digest(key_pair.public_key_der());
    report_data[..digest.len()].copy_from_slice(&digest);

    let quote = source.quote(&report_data)?;
    tracing::debug!(quote_len = quote.len(), "attestation quote obtained");

    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params.subject_alt_names = vec![SanType::DnsName(
        "localhost"
            .try_into()
            .map_err(|e| Error::attestation(format!("SAN encoding: {}", e)))?,
    )];
    params
        .custom_extensions
        .push(CustomExtension::from_oid_content(RA_TLS_QUOTE_OID, quote));

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| Error::attestation(format!("self-signing: {}", e)))?;

    Ok(RaTlsIdentity {
        key_pem: key_pair.serialize_pem(),
        cert_pem: cert.pem(),
    })
}

/// Issue an identity and write both PEM files, creating parent directories.
pub async fn write_identity(
    source: &dyn QuoteSource,
    key_path: &Path,
    cert_path: &Path,
) -> Result<()> {
    let identity = issue_identity(source, "attestable-mcp-server")?;

    for path in [key_path, cert_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    tokio::fs::write(key_path, identity.key_pem).await?;
    tokio::fs::write(cert_path, identity.cert_pem).await?;
    tracing::info!(
        key = %key_path.display(),
        cert = %cert_path.display(),
        "RA-TLS identity written"
    );
    Ok(())
}

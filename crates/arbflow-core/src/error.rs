use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Failures of the credential cipher.
///
/// `InvalidToken` covers every way a blob can fail to decrypt (bad encoding,
/// wrong version, wrong key, tampered ciphertext) so callers cannot use the
/// variant as an oracle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("encryption failed")]
    EncryptionFailed,
}

//! Typed errors for encoding instructions and decoding accounts

use thiserror::Error;

use crate::state::NAME_LENGTH;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name can only contain letters and numbers: {0:?}")]
    InvalidFormat(String),

    #[error("name is {0} bytes, maximum length is {max}", max = NAME_LENGTH)]
    TooLong(usize),

    #[error("stored name is not valid UTF-8")]
    NotUtf8,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{account} account data is {len} bytes, expected at least {min}")]
    TooShort {
        account: &'static str,
        len: usize,
        min: usize,
    },

    #[error("{account} discriminator mismatch: expected {expected:?}, got {actual:?}")]
    Discriminator {
        account: &'static str,
        expected: [u8; 8],
        actual: [u8; 8],
    },

    #[error("failed to deserialize {account} account: {source}")]
    Borsh {
        account: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Name(#[from] NameError),
}

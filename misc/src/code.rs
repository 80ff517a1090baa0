use anyhow::{bail, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

#[inline(always)]
pub fn base64_encode<T>(input: T) -> String
where
    T: AsRef<[u8]>,
{
    BASE64_STANDARD.encode(input)
}

pub fn base64_decode_string<T>(input: T) -> Result<String>
where
    T: AsRef<[u8]>,
{
    let data = match BASE64_STANDARD.decode(input) {
        Ok(data) => data,
        Err(_) => bail!("invalid base64 string"),
    };
    match String::from_utf8(data) {
        Ok(s) => Ok(s),
        Err(_) => bail!("invalid utf8 string"),
    }
}

#[inline(always)]
pub fn sha256<T>(input: T) -> String
where
    T: AsRef<[u8]>,
{
    let hash = Sha256::digest(input);
    format!("{hash:x}")
}

/// Salted password digest stored in the user table.
pub fn hash_password(password: &str, salt: &str) -> String {
    sha256(format!("{password}{salt}"))
}

pub fn generate_salt(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

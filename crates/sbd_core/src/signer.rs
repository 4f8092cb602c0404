/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    signer.rs

    Signer (component G). Holds an RSA private key, either loaded from a
    path or generated in memory at construction, and signs session claims
    with RS256. Read-only after construction; may be shared freely across
    the command-engine and session-simulator threads.

    Note: loading a passphrase-encrypted PKCS#8 key from disk is not
    supported by this build (see DESIGN.md); only plaintext PKCS#8/PKCS#1
    PEM files can be loaded via `jwtSignerKey`. Auto-generated keys are
    always emitted as plaintext PKCS#8 PEM alongside their passphrase,
    matching the source's "encrypted form" field in spirit but not at
    rest.
*/

use std::path::Path;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use sbd_common::{JwtSignerDetails, SbdClaims};

use crate::error::EmulatorError;

const GENERATED_KEY_BITS: usize = 4096;
const PASSPHRASE_LEN: usize = 8;

pub struct Signer {
    encoding_key: EncodingKey,
}

impl Signer {
    /// Loads a key from `path`. `passphrase` is accepted for interface
    /// symmetry with the generated-key path but unencrypted PEM is all
    /// that's currently parsed.
    pub fn from_path(path: &Path, _passphrase: Option<&str>) -> Result<Self, EmulatorError> {
        let pem = std::fs::read_to_string(path).map_err(|e| EmulatorError::SignerKeyLoad(e.to_string()))?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|e| EmulatorError::SignerKeyLoad(e.to_string()))?;

        let pkcs8_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| EmulatorError::SignerKeyLoad(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(pkcs8_pem.as_bytes())
            .map_err(|e| EmulatorError::SignerKeyLoad(e.to_string()))?;

        Ok(Signer { encoding_key })
    }

    /// Generates a fresh 4096-bit RSA key pair and an 8-character
    /// alphanumeric passphrase, returning both the signer and the details
    /// to publish on the `signer-key-generated` channel.
    pub fn generate(rng: &mut impl Rng) -> Result<(Self, JwtSignerDetails), EmulatorError> {
        let private_key = RsaPrivateKey::new(&mut rand_core::OsRng, GENERATED_KEY_BITS)
            .map_err(|e| EmulatorError::SignerKeyGenerate(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| EmulatorError::SignerKeyGenerate(e.to_string()))?
            .to_string();
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| EmulatorError::SignerKeyGenerate(e.to_string()))?;

        let passphrase: String = rng.sample_iter(&Alphanumeric).take(PASSPHRASE_LEN).map(char::from).collect();

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| EmulatorError::SignerKeyGenerate(e.to_string()))?;

        let details = JwtSignerDetails {
            public_key_pem,
            private_key_pem,
            passphrase,
        };

        Ok((Signer { encoding_key }, details))
    }

    /// Signs `claims` as a compact RS256 JWS.
    pub fn sign(&self, claims: &SbdClaims) -> Result<String, EmulatorError> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
            .map_err(|e| EmulatorError::SignerKeyGenerate(format!("signing failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Validation};
    use rsa::pkcs8::DecodePublicKey;
    use serde_derive::Deserialize;

    #[derive(Debug, Deserialize)]
    struct VerifyClaims {
        momsn: u16,
        iss: String,
    }

    #[test]
    fn generated_key_signs_and_verifies() {
        let mut rng = rand::thread_rng();
        let (signer, details) = Signer::generate(&mut rng).unwrap();
        let claims = SbdClaims::new(1, "010203".to_string(), "26-07-28 12:00:00".to_string());
        let token = signer.sign(&claims).unwrap();

        let public_key = RsaPublicKey::from_public_key_pem(&details.public_key_pem).unwrap();
        let decoding_key = jsonwebtoken::DecodingKey::from_rsa_pem(
            public_key.to_public_key_pem(LineEnding::LF).unwrap().as_bytes(),
        )
        .unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&["Rock7"]);
        validation.validate_exp = false;
        let decoded = decode::<VerifyClaims>(&token, &decoding_key, &validation).unwrap();
        assert_eq!(decoded.claims.momsn, 1);
        assert_eq!(decoded.claims.iss, "Rock7");
    }

    #[test]
    fn generated_passphrase_is_eight_alphanumeric_chars() {
        let mut rng = rand::thread_rng();
        let (_signer, details) = Signer::generate(&mut rng).unwrap();
        assert_eq!(details.passphrase.len(), PASSPHRASE_LEN);
        assert!(details.passphrase.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

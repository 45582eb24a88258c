//! Sealed-box encryption of bid openings to the auctioneer.
//!
//! Anonymous authenticated encryption: the sender uses a fresh ephemeral key
//! per payload, so no persistent sender identity is attached, and only the
//! holder of the recipient's secret key can open the box.
//!
//! # Encryption
//!
//! 1. Sample ephemeral scalar e, compute E = g·e
//! 2. Shared point S = pk·e
//! 3. Key = HKDF-SHA256(S, info = domain ‖ E ‖ pk)
//! 4. AES-256-GCM over the plaintext with AAD = E ‖ pk
//!
//! Payload layout: E(32) ‖ nonce(12) ‖ ciphertext(36) ‖ tag(16).
//!
//! Plaintext layout: value as 4 bytes little-endian, then the randomness as
//! 32 bytes big-endian. The randomness must be canonical on decode.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use group::Group;
use hkdf::Hkdf;
use jubjub::{Fr, SubgroupPoint};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use auction_types::{CompressedPoint, EncryptedPayload};

use crate::error::CryptoError;
use crate::pedersen::Opening;
use crate::primitives::{
    decode_point, encode_point, generators, random_nonzero_scalar, scalar_from_be_bytes_canonical,
    scalar_to_be_bytes,
};

const KDF_DOMAIN: &[u8] = b"SEALED_BID_BOX_JUBJUB_AES256GCM_V1";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Length of the packed opening.
pub const PLAINTEXT_LEN: usize = 4 + 32;

/// Total length of a sealed payload.
pub const PAYLOAD_LEN: usize = 32 + NONCE_LEN + PLAINTEXT_LEN + TAG_LEN;

/// The auctioneer's long-term key pair.
pub struct AuctioneerKeypair {
    secret: Fr,
    public: SubgroupPoint,
}

impl AuctioneerKeypair {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, CryptoError> {
        let secret = random_nonzero_scalar(rng)?;
        Ok(Self::from_secret(secret))
    }

    pub fn from_secret(secret: Fr) -> Self {
        let public = generators().g * secret;
        Self { secret, public }
    }

    /// Restore from a big-endian secret scalar; zero and non-canonical
    /// encodings are rejected.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = scalar_from_be_bytes_canonical(bytes).ok_or(CryptoError::InvalidEncoding)?;
        if secret == Fr::zero() {
            return Err(CryptoError::InvalidEncoding);
        }
        Ok(Self::from_secret(secret))
    }

    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(scalar_to_be_bytes(&self.secret))
    }

    pub fn secret(&self) -> &Fr {
        &self.secret
    }

    pub fn public_key(&self) -> CompressedPoint {
        encode_point(&self.public)
    }

    /// Open a payload sealed to this key pair.
    pub fn open(&self, payload: &EncryptedPayload) -> Result<Opening, CryptoError> {
        decrypt(payload, &self.public_key(), &self.secret)
    }
}

impl std::fmt::Debug for AuctioneerKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctioneerKeypair")
            .field("public", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

fn derive_key(
    shared: &SubgroupPoint,
    ephemeral: &CompressedPoint,
    recipient: &CompressedPoint,
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let shared_bytes = Zeroizing::new(encode_point(shared).0);
    let hk = Hkdf::<Sha256>::new(None, shared_bytes.as_ref());

    let mut info = Vec::with_capacity(KDF_DOMAIN.len() + 64);
    info.extend_from_slice(KDF_DOMAIN);
    info.extend_from_slice(&ephemeral.0);
    info.extend_from_slice(&recipient.0);

    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(&info, key.as_mut())
        .map_err(|_| CryptoError::EncryptionFailed("HKDF expansion failed".to_string()))?;
    Ok(key)
}

fn associated_data(ephemeral: &CompressedPoint, recipient: &CompressedPoint) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(&ephemeral.0);
    aad[32..].copy_from_slice(&recipient.0);
    aad
}

/// Seal an opening to the recipient's public key.
pub fn encrypt<R: RngCore + CryptoRng>(
    value: u32,
    randomness: &Fr,
    recipient_pk: &CompressedPoint,
    rng: &mut R,
) -> Result<EncryptedPayload, CryptoError> {
    let pk = decode_point(&recipient_pk.0)?;

    let e = random_nonzero_scalar(rng)?;
    let ephemeral = encode_point(&(generators().g * e));
    let key = derive_key(&(pk * e), &ephemeral, recipient_pk)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| CryptoError::RandomnessFailure)?;

    let mut plaintext = Zeroizing::new([0u8; PLAINTEXT_LEN]);
    plaintext[..4].copy_from_slice(&value.to_le_bytes());
    plaintext[4..].copy_from_slice(&scalar_to_be_bytes(randomness));

    let cipher = Aes256Gcm::new_from_slice(key.as_ref()).map_err(|e| {
        CryptoError::EncryptionFailed(format!("Failed to create cipher: {}", e))
    })?;
    let aad = associated_data(&ephemeral, recipient_pk);
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext.as_ref(),
                aad: &aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(PAYLOAD_LEN);
    out.extend_from_slice(&ephemeral.0);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(EncryptedPayload(out))
}

/// Decode the ephemeral public key at the head of a payload.
///
/// The identity is rejected: its shared point is public.
pub fn ephemeral_key(payload: &EncryptedPayload) -> Result<SubgroupPoint, CryptoError> {
    if payload.0.len() != PAYLOAD_LEN {
        return Err(CryptoError::InvalidEncoding);
    }
    let point = decode_point(&payload.0[..32])?;
    if bool::from(point.is_identity()) {
        return Err(CryptoError::InvalidPoint);
    }
    Ok(point)
}

/// Open a sealed payload.
///
/// Every failure is `DecryptionFailure`; nothing is returned unless the tag
/// verifies and the plaintext is a well-formed opening.
pub fn decrypt(
    payload: &EncryptedPayload,
    recipient_pk: &CompressedPoint,
    recipient_sk: &Fr,
) -> Result<Opening, CryptoError> {
    let pk = decode_point(&recipient_pk.0).map_err(|_| CryptoError::DecryptionFailure)?;
    if generators().g * recipient_sk != pk {
        return Err(CryptoError::DecryptionFailure);
    }

    let ephemeral = ephemeral_key(payload).map_err(|_| CryptoError::DecryptionFailure)?;
    open_with_shared(payload, recipient_pk, &(ephemeral * recipient_sk))
}

/// Open a payload given the shared point the box key derives from.
pub(crate) fn open_with_shared(
    payload: &EncryptedPayload,
    recipient_pk: &CompressedPoint,
    shared: &SubgroupPoint,
) -> Result<Opening, CryptoError> {
    let bytes = &payload.0;
    if bytes.len() != PAYLOAD_LEN {
        return Err(CryptoError::DecryptionFailure);
    }

    let mut ephemeral = CompressedPoint([0u8; 32]);
    ephemeral.0.copy_from_slice(&bytes[..32]);
    let nonce = Nonce::from_slice(&bytes[32..32 + NONCE_LEN]);
    let ciphertext = &bytes[32 + NONCE_LEN..];

    let key = derive_key(shared, &ephemeral, recipient_pk)
        .map_err(|_| CryptoError::DecryptionFailure)?;
    let cipher =
        Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CryptoError::DecryptionFailure)?;

    let aad = associated_data(&ephemeral, recipient_pk);
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::DecryptionFailure)?,
    );

    if plaintext.len() != PLAINTEXT_LEN {
        return Err(CryptoError::DecryptionFailure);
    }

    let mut value = [0u8; 4];
    value.copy_from_slice(&plaintext[..4]);
    let mut randomness = Zeroizing::new([0u8; 32]);
    randomness.copy_from_slice(&plaintext[4..]);
    let randomness =
        scalar_from_be_bytes_canonical(&randomness).ok_or(CryptoError::DecryptionFailure)?;

    Ok(Opening::new(u32::from_le_bytes(value), randomness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedersen::commit;
    use rand::rngs::OsRng;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let (_, randomness) = commit(1234, &mut rng).unwrap();

        let payload = encrypt(1234, &randomness, &keypair.public_key(), &mut rng).unwrap();
        assert_eq!(payload.0.len(), PAYLOAD_LEN);

        let opening = decrypt(&payload, &keypair.public_key(), keypair.secret()).unwrap();
        assert_eq!(opening.value, 1234);
        assert_eq!(opening.randomness, randomness);
        assert_eq!(keypair.open(&payload).unwrap(), opening);
    }

    #[test]
    fn test_edge_values() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        for value in [0u32, u32::MAX] {
            let randomness = -Fr::one();
            let payload = encrypt(value, &randomness, &keypair.public_key(), &mut rng).unwrap();
            let opening = keypair.open(&payload).unwrap();
            assert_eq!(opening.value, value);
            assert_eq!(opening.randomness, randomness);
        }
    }

    #[test]
    fn test_wrong_secret_key_fails() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let other = AuctioneerKeypair::generate(&mut rng).unwrap();
        let payload = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();

        // Mismatched pair
        assert_eq!(
            decrypt(&payload, &keypair.public_key(), other.secret()),
            Err(CryptoError::DecryptionFailure)
        );
        // Consistent pair, but not the recipient
        assert_eq!(other.open(&payload), Err(CryptoError::DecryptionFailure));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let payload = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();

        for i in [0usize, 33, 50, PAYLOAD_LEN - 1] {
            let mut tampered = payload.clone();
            tampered.0[i] ^= 0x80;
            assert_eq!(keypair.open(&tampered), Err(CryptoError::DecryptionFailure));
        }
    }

    #[test]
    fn test_wrong_length_fails() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let payload = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();

        let mut short = payload.clone();
        short.0.pop();
        assert_eq!(keypair.open(&short), Err(CryptoError::DecryptionFailure));

        let mut long = payload;
        long.0.push(0);
        assert_eq!(keypair.open(&long), Err(CryptoError::DecryptionFailure));

        assert_eq!(
            keypair.open(&EncryptedPayload(vec![])),
            Err(CryptoError::DecryptionFailure)
        );
    }

    #[test]
    fn test_encrypt_to_invalid_key() {
        let mut rng = OsRng;
        assert_eq!(
            encrypt(1, &Fr::one(), &CompressedPoint([0xff; 32]), &mut rng),
            Err(CryptoError::InvalidPoint)
        );
    }

    #[test]
    fn test_ephemeral_keys_fresh() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let p1 = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();
        let p2 = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();
        assert_ne!(p1.0[..32], p2.0[..32]);
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_ephemeral_key() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let payload = encrypt(5, &Fr::one(), &keypair.public_key(), &mut rng).unwrap();
        let ephemeral = ephemeral_key(&payload).unwrap();
        assert_eq!(encode_point(&ephemeral).0[..], payload.0[..32]);

        let mut identity = payload.clone();
        identity.0[..32].copy_from_slice(&encode_point(&SubgroupPoint::identity()).0);
        assert_eq!(ephemeral_key(&identity), Err(CryptoError::InvalidPoint));
        assert_eq!(keypair.open(&identity), Err(CryptoError::DecryptionFailure));

        assert_eq!(
            ephemeral_key(&EncryptedPayload(vec![0u8; 10])),
            Err(CryptoError::InvalidEncoding)
        );
    }

    #[test]
    fn test_secret_bytes_roundtrip() {
        let mut rng = OsRng;
        let keypair = AuctioneerKeypair::generate(&mut rng).unwrap();
        let restored = AuctioneerKeypair::from_secret_bytes(&keypair.secret_bytes()).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());

        assert_eq!(
            AuctioneerKeypair::from_secret_bytes(&[0u8; 32]).unwrap_err(),
            CryptoError::InvalidEncoding
        );
    }
}

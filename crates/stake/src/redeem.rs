//! Authorization of stake redemptions.
//!
//! A redemption is authorized by an ed25519 signature of the stake owner over
//! [`redeem_message`]. Network-2 addresses are base58-encoded ed25519 public keys and signatures
//! travel base64-encoded.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use bitcoin::base58;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::debug;

use crate::{errors::StakeError, record::StakeRecord};

/// Builds the message a user signs to redeem `stake_id`.
///
/// `timestamp` is in milliseconds since the unix epoch.
pub fn redeem_message(stake_id: &str, address: &str, timestamp: i64) -> String {
    format!("Redeem stake: {stake_id}\nAddress: {address}\nTimestamp: {timestamp}")
}

/// A signed request to redeem a stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemAuthorization {
    /// The stake to redeem.
    pub stake_id: String,

    /// The requester's network-2 address.
    pub user_address: String,

    /// Base64 ed25519 signature over [`Self::message`].
    pub signature: String,

    /// The signed message.
    pub message: String,

    /// Milliseconds since the unix epoch at signing time.
    pub timestamp: i64,
}

impl RedeemAuthorization {
    /// Checks freshness, layout and signature of the request.
    ///
    /// The timestamp must not be in the future and must be at most `freshness_window` old at
    /// `now`. Ownership is checked separately by [`Self::authorize`] once the record is loaded.
    pub fn verify(&self, now: DateTime<Utc>, freshness_window: Duration) -> Result<(), StakeError> {
        let age_ms = now.timestamp_millis().saturating_sub(self.timestamp);
        let window_ms = i64::try_from(freshness_window.as_millis()).unwrap_or(i64::MAX);

        if age_ms < 0 || age_ms > window_ms {
            debug!(stake_id = %self.stake_id, %age_ms, "stale redeem timestamp");
            return Err(StakeError::StaleTimestamp);
        }

        if self.message != redeem_message(&self.stake_id, &self.user_address, self.timestamp) {
            return Err(StakeError::MessageMismatch);
        }

        verify_signature(&self.message, &self.signature, &self.user_address)
    }

    /// Checks that the requester owns `record` and that it can still be redeemed.
    pub fn authorize(&self, record: &StakeRecord) -> Result<(), StakeError> {
        if record.user_address() != self.user_address {
            return Err(StakeError::NotOwner);
        }

        if !record.status().is_redeemable() {
            return Err(StakeError::NotRedeemable(record.status()));
        }

        Ok(())
    }
}

/// Verifies a base64 ed25519 `signature` over `message` by the base58 `address`.
pub fn verify_signature(message: &str, signature: &str, address: &str) -> Result<(), StakeError> {
    let key = decode_address(address)?;

    let signature = STANDARD
        .decode(signature)
        .map_err(|_| StakeError::InvalidSignature)?;
    let signature: [u8; 64] = signature
        .try_into()
        .map_err(|_| StakeError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature);

    key.verify(message.as_bytes(), &signature)
        .map_err(|_| StakeError::InvalidSignature)
}

/// Decodes a base58 network-2 address into its ed25519 public key.
pub fn decode_address(address: &str) -> Result<VerifyingKey, StakeError> {
    let invalid = || StakeError::InvalidAddress(address.to_string());

    let bytes = base58::decode(address).map_err(|_| invalid())?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;

    VerifyingKey::from_bytes(&bytes).map_err(|_| invalid())
}

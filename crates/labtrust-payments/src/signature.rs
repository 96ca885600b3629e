//! IPN Signature Verification
//!
//! NOWPayments signs every IPN callback with a hex HMAC-SHA512 keyed by the
//! merchant's IPN secret and sends it in the `x-nowpayments-sig` header.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{PaymentError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the IPN signature
pub const SIGNATURE_HEADER: &str = "x-nowpayments-sig";

#[derive(Clone)]
pub struct IpnVerifier {
    secret: String,
}

impl IpnVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self) -> Result<HmacSha512> {
        HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::Config(format!("IPN secret: {e}")))
    }

    /// Hex signature for a payload
    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a signature header against the raw request body
    ///
    /// The raw body is checked first. The key-sorted JSON form that
    /// NOWPayments documents is accepted as a fallback. Comparison is
    /// constant-time.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<()> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PaymentError::MissingSignature)?;

        let expected = hex::decode(signature).map_err(|_| PaymentError::InvalidSignature)?;

        if self.matches(payload, &expected)? {
            return Ok(());
        }

        match canonical_json(payload) {
            Some(sorted) if sorted != payload && self.matches(&sorted, &expected)? => Ok(()),
            _ => Err(PaymentError::InvalidSignature),
        }
    }

    fn matches(&self, payload: &[u8], expected: &[u8]) -> Result<bool> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(mac.verify_slice(expected).is_ok())
    }
}

impl std::fmt::Debug for IpnVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpnVerifier").finish_non_exhaustive()
    }
}

/// Re-serialize a JSON body with object keys sorted (serde_json's default map
/// is ordered by key)
fn canonical_json(payload: &[u8]) -> Option<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    serde_json::to_vec(&value).ok()
}

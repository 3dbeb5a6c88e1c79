//! Ownership tokens: issue, resolve, revoke.
//!
//! The engine only ever stores a token's fingerprint. Lookups are an index
//! probe on the fingerprint, so raw token bytes are never compared.

use pb_core::{Address, OwnershipToken, RecordKey};
use pb_store::{BindResult, StoreTx};

use crate::error::{PasteError, Result};

/// Fresh tokens drawn before giving up on fingerprint collisions.
const ISSUE_ATTEMPTS: usize = 4;

/// Binds tokens to records by fingerprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipRegistry;

impl OwnershipRegistry {
    /// Create a registry.
    pub fn new() -> Self {
        Self
    }

    /// Bind a new token to `key`.
    ///
    /// `address` is what the caller reports on `Conflict` when the record
    /// already has an owner.
    pub fn issue(
        &self,
        tx: &mut dyn StoreTx,
        key: RecordKey,
        address: Address,
    ) -> Result<OwnershipToken> {
        for _ in 0..ISSUE_ATTEMPTS {
            let token = OwnershipToken::generate();
            match tx.bind_token(&token.fingerprint(), key)? {
                BindResult::Bound => return Ok(token),
                BindResult::RecordTaken => return Err(PasteError::Conflict(address)),
                BindResult::TokenTaken => {
                    tracing::debug!("token fingerprint collision, drawing again");
                }
            }
        }
        Err(PasteError::Conflict(address))
    }

    /// The record a live token is bound to.
    pub fn resolve(&self, tx: &mut dyn StoreTx, token: &OwnershipToken) -> Result<Option<RecordKey>> {
        Ok(tx.token_target(&token.fingerprint())?)
    }

    /// Permanently retire a token. Returns false if it was not live.
    pub fn revoke(&self, tx: &mut dyn StoreTx, token: &OwnershipToken) -> Result<bool> {
        Ok(tx.revoke_token(&token.fingerprint())?)
    }
}

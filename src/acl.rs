use std::collections::HashSet;

use parking_lot::RwLock;
use solana_program::pubkey::Pubkey;

use crate::fhe::Handle;

/// Append-only record of which principals may request disclosure of which
/// ciphertext. Grants never move to a replacement handle on their own.
#[derive(Default)]
pub struct AccessControlList {
    grants: RwLock<HashSet<(Handle, Pubkey)>>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, handle: Handle, principal: Pubkey) {
        self.grants.write().insert((handle, principal));
    }

    pub fn is_granted(&self, handle: &Handle, principal: &Pubkey) -> bool {
        self.grants.read().contains(&(*handle, *principal))
    }

    pub fn grant_count(&self) -> usize {
        self.grants.read().len()
    }
}

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use borsh::{BorshDeserialize, BorshSerialize};
use parking_lot::RwLock;
use solana_program::{hash::hashv, pubkey::Pubkey};

use crate::{
    acl::AccessControlList,
    constants::{HANDLE_DOMAIN, INPUT_PROOF_DOMAIN},
    error::{QuizError, QuizResult},
};

/// Opaque reference to a ciphertext.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    /// Sentinel for "no ciphertext yet".
    pub const NULL: Handle = Handle([0u8; 32]);

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptedBool(pub Handle);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptedU8(pub Handle);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptedU32(pub Handle);

/// Admission proof binding an external ciphertext to a program and sender.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InputProof {
    pub binding: [u8; 32],
}

impl InputProof {
    pub fn bind(handle: &Handle, contract: &Pubkey, sender: &Pubkey) -> Self {
        let binding = hashv(&[
            INPUT_PROOF_DOMAIN,
            &handle.0,
            contract.as_ref(),
            sender.as_ref(),
        ]);
        Self {
            binding: binding.to_bytes(),
        }
    }
}

/// Homomorphic operations over opaque handles. Every call yields a new handle;
/// nothing here ever reveals a plaintext.
pub trait FheExecutor: Send + Sync {
    /// Checks the admission proof for an externally encrypted 8-bit value.
    fn verify_input(
        &self,
        external: Handle,
        proof: &[u8],
        contract: &Pubkey,
        sender: &Pubkey,
    ) -> QuizResult<EncryptedU8>;

    fn trivial_encrypt_u32(&self, value: u32) -> QuizResult<EncryptedU32>;

    fn eq_u8_scalar(&self, a: EncryptedU8, b: u8) -> QuizResult<EncryptedBool>;

    fn and(&self, a: EncryptedBool, b: EncryptedBool) -> QuizResult<EncryptedBool>;

    fn select_u32(
        &self,
        cond: EncryptedBool,
        if_true: EncryptedU32,
        if_false: EncryptedU32,
    ) -> QuizResult<EncryptedU32>;

    /// Saturates at `u32::MAX`.
    fn add_u32(&self, a: EncryptedU32, b: EncryptedU32) -> QuizResult<EncryptedU32>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plaintext {
    Bool(bool),
    U8(u8),
    U32(u32),
}

/// Executor over plaintext values, also acting as client and decryption oracle.
#[derive(Default)]
pub struct PlaintextExecutor {
    values: RwLock<HashMap<Handle, Plaintext>>,
    counter: AtomicU64,
}

impl PlaintextExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, value: Plaintext) -> Handle {
        let nonce = self.counter.fetch_add(1, Ordering::Relaxed);
        let handle = Handle(hashv(&[HANDLE_DOMAIN, &nonce.to_le_bytes()]).to_bytes());
        self.values.write().insert(handle, value);
        handle
    }

    fn load(&self, handle: Handle) -> QuizResult<Plaintext> {
        self.values
            .read()
            .get(&handle)
            .copied()
            .ok_or(QuizError::UnknownCiphertext)
    }

    fn load_bool(&self, handle: Handle) -> QuizResult<bool> {
        match self.load(handle)? {
            Plaintext::Bool(v) => Ok(v),
            _ => Err(QuizError::UnknownCiphertext),
        }
    }

    fn load_u32(&self, handle: Handle) -> QuizResult<u32> {
        match self.load(handle)? {
            Plaintext::U32(v) => Ok(v),
            _ => Err(QuizError::UnknownCiphertext),
        }
    }

    /// Encrypts an answer option for `contract` on behalf of `sender` and
    /// returns the external handle with its encoded admission proof.
    pub fn encrypt_u8(
        &self,
        contract: &Pubkey,
        sender: &Pubkey,
        value: u8,
    ) -> QuizResult<(Handle, Vec<u8>)> {
        let handle = self.store(Plaintext::U8(value));
        let proof = borsh::to_vec(&InputProof::bind(&handle, contract, sender))
            .map_err(|_| QuizError::InvalidInput)?;
        Ok((handle, proof))
    }

    /// Off-chain disclosure of a 32-bit ciphertext, honoured only for
    /// principals the ACL has granted.
    pub fn user_decrypt_u32(
        &self,
        acl: &AccessControlList,
        handle: Handle,
        requester: &Pubkey,
    ) -> QuizResult<u32> {
        if !acl.is_granted(&handle, requester) {
            return Err(QuizError::DecryptionNotAllowed);
        }
        self.load_u32(handle)
    }

    /// Raw plaintext behind a handle, bypassing the ACL.
    pub fn plaintext(&self, handle: Handle) -> Option<Plaintext> {
        self.values.read().get(&handle).copied()
    }
}

impl FheExecutor for PlaintextExecutor {
    fn verify_input(
        &self,
        external: Handle,
        proof: &[u8],
        contract: &Pubkey,
        sender: &Pubkey,
    ) -> QuizResult<EncryptedU8> {
        let proof = InputProof::try_from_slice(proof).map_err(|_| QuizError::InvalidInput)?;
        if proof != InputProof::bind(&external, contract, sender) {
            return Err(QuizError::InvalidInput);
        }
        match self.load(external) {
            Ok(Plaintext::U8(_)) => Ok(EncryptedU8(external)),
            _ => Err(QuizError::InvalidInput),
        }
    }

    fn trivial_encrypt_u32(&self, value: u32) -> QuizResult<EncryptedU32> {
        Ok(EncryptedU32(self.store(Plaintext::U32(value))))
    }

    fn eq_u8_scalar(&self, a: EncryptedU8, b: u8) -> QuizResult<EncryptedBool> {
        let a = match self.load(a.0)? {
            Plaintext::U8(v) => v,
            _ => return Err(QuizError::UnknownCiphertext),
        };
        Ok(EncryptedBool(self.store(Plaintext::Bool(a == b))))
    }

    fn and(&self, a: EncryptedBool, b: EncryptedBool) -> QuizResult<EncryptedBool> {
        let v = self.load_bool(a.0)? && self.load_bool(b.0)?;
        Ok(EncryptedBool(self.store(Plaintext::Bool(v))))
    }

    fn select_u32(
        &self,
        cond: EncryptedBool,
        if_true: EncryptedU32,
        if_false: EncryptedU32,
    ) -> QuizResult<EncryptedU32> {
        let cond = self.load_bool(cond.0)?;
        let (t, f) = (self.load_u32(if_true.0)?, self.load_u32(if_false.0)?);
        Ok(EncryptedU32(self.store(Plaintext::U32(if cond { t } else { f }))))
    }

    fn add_u32(&self, a: EncryptedU32, b: EncryptedU32) -> QuizResult<EncryptedU32> {
        let sum = self.load_u32(a.0)?.saturating_add(self.load_u32(b.0)?);
        Ok(EncryptedU32(self.store(Plaintext::U32(sum))))
    }
}

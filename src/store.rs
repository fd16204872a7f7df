use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};
use solana_program::pubkey::Pubkey;

use crate::{error::QuizResult, state::player_record_address, state::PlayerRecord};

/// `None` until the first committed write for the address.
type Slot = Arc<Mutex<Option<PlayerRecord>>>;

/// Player records keyed by their program-derived address. Each record sits
/// behind its own lock; the index lock is only held to look a slot up.
pub struct PlayerStore {
    program_id: Pubkey,
    slots: RwLock<HashMap<Pubkey, Slot>>,
}

impl PlayerStore {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn existing_slot(&self, player: &Pubkey) -> Option<Slot> {
        let address = player_record_address(&self.program_id, player);
        self.slots.read().get(&address).cloned()
    }

    fn slot(&self, player: &Pubkey) -> Slot {
        let address = player_record_address(&self.program_id, player);
        if let Some(slot) = self.slots.read().get(&address) {
            return slot.clone();
        }
        self.slots.write().entry(address).or_default().clone()
    }

    /// Current record, or the default record for an unseen player.
    pub fn get(&self, player: &Pubkey) -> PlayerRecord {
        self.existing_slot(player)
            .and_then(|slot| {
                let record = slot.lock().clone();
                record
            })
            .unwrap_or_default()
    }

    /// Replaces the whole record.
    pub fn set(&self, player: &Pubkey, record: PlayerRecord) {
        *self.slot(player).lock() = Some(record);
    }

    /// Runs `f` against a working copy of the player's record while holding
    /// that player's lock. The copy replaces the stored record only if `f`
    /// succeeds, and `on_commit` runs before the lock is released.
    pub fn transact<T, F, C>(&self, player: &Pubkey, f: F, on_commit: C) -> QuizResult<T>
    where
        F: FnOnce(&mut PlayerRecord) -> QuizResult<T>,
        C: FnOnce(&T),
    {
        let slot = self.slot(player);
        let mut guard = slot.lock();
        let mut working = guard.clone().unwrap_or_default();
        match f(&mut working) {
            Ok(out) => {
                *guard = Some(working);
                on_commit(&out);
                Ok(out)
            }
            Err(e) => {
                let unmaterialized = guard.is_none();
                drop(guard);
                if unmaterialized {
                    self.release_empty(player, &slot);
                }
                Err(e)
            }
        }
    }

    /// Drops an index entry left behind by a rejected first transaction.
    fn release_empty(&self, player: &Pubkey, slot: &Slot) {
        let address = player_record_address(&self.program_id, player);
        let mut slots = self.slots.write();
        // Index plus `slot`; any other holder may still commit into it.
        let idle = slots
            .get(&address)
            .map(|entry| Arc::ptr_eq(entry, slot) && Arc::strong_count(entry) == 2)
            .unwrap_or(false);
        if idle && slot.lock().is_none() {
            slots.remove(&address);
        }
    }

    /// Number of index entries, materialized or not.
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_materialized(&self, player: &Pubkey) -> bool {
        self.existing_slot(player)
            .map(|slot| {
                let present = slot.lock().is_some();
                present
            })
            .unwrap_or(false)
    }

    /// Number of materialized records.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    constants::{FULL_ANSWERED_MASK, PLAYER_RECORD_SEED, QUESTION_COUNT},
    fhe::Handle,
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub started: bool,
    pub completed: bool,
    pub answered_mask: u8,
    pub score: Handle,
    pub correctness: [Handle; QUESTION_COUNT],
}

impl PlayerRecord {
    pub const SIZE: usize = 1 + 1 + 1 + 32 + 32 * QUESTION_COUNT; // started + completed + mask + score + flags

    pub fn is_answered(&self, question_id: u8) -> bool {
        self.answered_mask & (1 << question_id) != 0
    }

    pub fn mark_answered(&mut self, question_id: u8) {
        self.answered_mask |= 1 << question_id;
    }

    pub fn all_answered(&self) -> bool {
        self.answered_mask == FULL_ANSWERED_MASK
    }

    pub fn phase(&self) -> GamePhase {
        match (self.started, self.completed) {
            (false, _) => GamePhase::Unstarted,
            (true, false) => GamePhase::InProgress,
            (true, true) => GamePhase::Completed,
        }
    }

    pub fn game_state(&self) -> GameState {
        GameState {
            started: self.started,
            completed: self.completed,
            answered_mask: self.answered_mask,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Unstarted,
    InProgress,
    Completed,
}

/// Public, plaintext view of a player's progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub started: bool,
    pub completed: bool,
    pub answered_mask: u8,
}

pub fn player_record_address(program_id: &Pubkey, player: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[PLAYER_RECORD_SEED, player.as_ref()], program_id).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_unstarted_with_null_score() {
        let record = PlayerRecord::default();
        assert_eq!(record.phase(), GamePhase::Unstarted);
        assert!(record.score.is_null());
        assert_eq!(record.game_state(), GameState::default());
    }

    #[test]
    fn mask_tracks_answers() {
        let mut record = PlayerRecord::default();
        record.mark_answered(0);
        record.mark_answered(2);
        assert!(record.is_answered(0));
        assert!(!record.is_answered(1));
        assert_eq!(record.answered_mask, 0b0101);
        assert!(!record.all_answered());
        record.mark_answered(1);
        record.mark_answered(3);
        assert!(record.all_answered());
    }

    #[test]
    fn serialized_size_matches() {
        let record = PlayerRecord::default();
        assert_eq!(borsh::to_vec(&record).unwrap().len(), PlayerRecord::SIZE);
    }

    #[test]
    fn record_address_is_per_player() {
        let program_id = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        assert_eq!(
            player_record_address(&program_id, &alice),
            player_record_address(&program_id, &alice)
        );
        assert_ne!(
            player_record_address(&program_id, &alice),
            player_record_address(&program_id, &bob)
        );
    }
}

/// Number of questions in the quiz.
pub const QUESTION_COUNT: usize = 4;

/// Number of options per question. Options are numbered from 1.
pub const OPTION_COUNT: u8 = 4;

/// Encrypted score every player receives when starting a game.
pub const STARTING_SCORE: u32 = 100;

/// Bonus added once all answers are correct.
pub const PERFECT_BONUS: u32 = 100;

/// Answered mask with every question bit set.
pub const FULL_ANSWERED_MASK: u8 = (1u8 << QUESTION_COUNT) - 1;

/// Seed for the player record address.
pub const PLAYER_RECORD_SEED: &[u8] = b"player_record";

/// Domain separator for admission proof bindings.
pub const INPUT_PROOF_DOMAIN: &[u8] = b"phantom-input";

/// Domain separator for fresh ciphertext handles.
pub const HANDLE_DOMAIN: &[u8] = b"phantom-handle";

use crate::{
    constants::QUESTION_COUNT,
    error::QuizResult,
    fhe::{EncryptedBool, EncryptedU32, EncryptedU8, FheExecutor},
};

/// Encrypted scoring. Nothing in here sees a plaintext answer, flag or score.
pub struct ScoringEngine<'a, E: FheExecutor + ?Sized> {
    fhe: &'a E,
}

impl<'a, E: FheExecutor + ?Sized> ScoringEngine<'a, E> {
    pub fn new(fhe: &'a E) -> Self {
        Self { fhe }
    }

    pub fn initial_score(&self, starting_score: u32) -> QuizResult<EncryptedU32> {
        self.fhe.trivial_encrypt_u32(starting_score)
    }

    /// One encrypted equality test per admitted answer. Points are not added
    /// here; the flag only feeds the completion bonus.
    pub fn score_answer(
        &self,
        answer: EncryptedU8,
        correct_option: u8,
    ) -> QuizResult<EncryptedBool> {
        self.fhe.eq_u8_scalar(answer, correct_option)
    }

    /// `score + (all flags set ? bonus : 0)`, evaluated homomorphically.
    pub fn finalize_bonus(
        &self,
        score: EncryptedU32,
        correctness: &[EncryptedBool; QUESTION_COUNT],
        perfect_bonus: u32,
    ) -> QuizResult<EncryptedU32> {
        let all_correct = correctness[1..]
            .iter()
            .try_fold(correctness[0], |acc, flag| self.fhe.and(acc, *flag))?;

        let bonus = self.fhe.trivial_encrypt_u32(perfect_bonus)?;
        let nothing = self.fhe.trivial_encrypt_u32(0)?;
        let earned = self.fhe.select_u32(all_correct, bonus, nothing)?;
        self.fhe.add_u32(score, earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::{Plaintext, PlaintextExecutor};
    use solana_program::pubkey::Pubkey;

    fn flags(fhe: &PlaintextExecutor, answers: [u8; 4], key: [u8; 4]) -> [EncryptedBool; 4] {
        let contract = Pubkey::new_unique();
        let sender = Pubkey::new_unique();
        let engine = ScoringEngine::new(fhe);
        let mut out = [EncryptedBool(Default::default()); 4];
        for (i, (&answer, &correct)) in answers.iter().zip(key.iter()).enumerate() {
            let (handle, proof) = fhe.encrypt_u8(&contract, &sender, answer).unwrap();
            let input = fhe.verify_input(handle, &proof, &contract, &sender).unwrap();
            out[i] = engine.score_answer(input, correct).unwrap();
        }
        out
    }

    #[test]
    fn perfect_answers_earn_bonus() {
        let fhe = PlaintextExecutor::new();
        let engine = ScoringEngine::new(&fhe);
        let correctness = flags(&fhe, [1, 1, 2, 2], [1, 1, 2, 2]);
        let score = engine.initial_score(100).unwrap();
        let final_score = engine.finalize_bonus(score, &correctness, 100).unwrap();
        assert_eq!(fhe.plaintext(final_score.0), Some(Plaintext::U32(200)));
        assert_ne!(final_score, score);
    }

    #[test]
    fn single_miss_forfeits_bonus() {
        let fhe = PlaintextExecutor::new();
        let engine = ScoringEngine::new(&fhe);
        let correctness = flags(&fhe, [1, 1, 2, 3], [1, 1, 2, 2]);
        assert_eq!(
            fhe.plaintext(correctness[3].0),
            Some(Plaintext::Bool(false))
        );
        let score = engine.initial_score(100).unwrap();
        let final_score = engine.finalize_bonus(score, &correctness, 100).unwrap();
        assert_eq!(fhe.plaintext(final_score.0), Some(Plaintext::U32(100)));
    }

    #[test]
    fn out_of_range_option_is_just_wrong() {
        let fhe = PlaintextExecutor::new();
        let correctness = flags(&fhe, [9, 1, 2, 2], [1, 1, 2, 2]);
        assert_eq!(
            fhe.plaintext(correctness[0].0),
            Some(Plaintext::Bool(false))
        );
    }
}

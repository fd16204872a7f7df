use crate::{
    constants::{OPTION_COUNT, PERFECT_BONUS, QUESTION_COUNT, STARTING_SCORE},
    error::{QuizError, QuizResult},
};

/// Process-wide quiz configuration. The correct options are secret and only
/// ever reach the executor as scalar operands of an encrypted comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub correct_options: [u8; QUESTION_COUNT],
    pub starting_score: u32,
    pub perfect_bonus: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            correct_options: [1, 1, 2, 2],
            starting_score: STARTING_SCORE,
            perfect_bonus: PERFECT_BONUS,
        }
    }
}

impl QuizConfig {
    pub fn new(correct_options: [u8; QUESTION_COUNT]) -> QuizResult<Self> {
        let config = Self {
            correct_options,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QuizResult<()> {
        if self
            .correct_options
            .iter()
            .any(|&option| option == 0 || option > OPTION_COUNT)
        {
            return Err(QuizError::InvalidConfig);
        }
        // Highest reachable score must fit the encrypted integer width.
        self.starting_score
            .checked_add(self.perfect_bonus)
            .ok_or(QuizError::InvalidConfig)?;
        Ok(())
    }

    pub fn correct_option(&self, question_id: u8) -> QuizResult<u8> {
        self.correct_options
            .get(question_id as usize)
            .copied()
            .ok_or(QuizError::InvalidQuestionId)
    }
}

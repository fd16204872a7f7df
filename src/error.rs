use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizError {
    #[error("encrypted input is malformed or not bound to this program and sender")]
    InvalidInput,
    #[error("question id is out of range")]
    InvalidQuestionId,
    #[error("game has not been started")]
    GameNotStarted,
    #[error("game already started")]
    AlreadyStarted,
    #[error("game already completed")]
    GameCompleted,
    #[error("question already answered")]
    QuestionAlreadyAnswered,
    #[error("invalid quiz configuration")]
    InvalidConfig,
    #[error("ciphertext handle is unknown to the executor")]
    UnknownCiphertext,
    #[error("requester is not allowed to decrypt this ciphertext")]
    DecryptionNotAllowed,
}

impl QuizError {
    pub fn code(self) -> u32 {
        match self {
            QuizError::InvalidInput => 0,
            QuizError::InvalidQuestionId => 1,
            QuizError::GameNotStarted => 2,
            QuizError::AlreadyStarted => 3,
            QuizError::GameCompleted => 4,
            QuizError::QuestionAlreadyAnswered => 5,
            QuizError::InvalidConfig => 6,
            QuizError::UnknownCiphertext => 7,
            QuizError::DecryptionNotAllowed => 8,
        }
    }
}

impl From<QuizError> for ProgramError {
    fn from(e: QuizError) -> Self {
        ProgramError::Custom(e.code())
    }
}

pub type QuizResult<T> = Result<T, QuizError>;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::program_error::ProgramError;

use crate::fhe::Handle;

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct SubmitAnswerData {
    pub question_id: u8,
    pub input: Handle,
    pub proof: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizInstruction {
    StartGame,
    SubmitAnswer {
        question_id: u8,
        input: Handle,
        proof: Vec<u8>,
    },
}

const START_GAME: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 0];
const SUBMIT_ANSWER: [u8; 8] = [1, 0, 0, 0, 0, 0, 0, 0];

impl QuizInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.len() < 8 {
            return Err(ProgramError::InvalidInstructionData);
        }

        let (ix_discriminator, rest) = input.split_at(8);

        Ok(match ix_discriminator {
            [0, 0, 0, 0, 0, 0, 0, 0] => {
                if !rest.is_empty() {
                    return Err(ProgramError::InvalidInstructionData);
                }
                Self::StartGame
            }
            [1, 0, 0, 0, 0, 0, 0, 0] => {
                let data = SubmitAnswerData::try_from_slice(rest)
                    .map_err(|_| ProgramError::InvalidInstructionData)?;
                Self::SubmitAnswer {
                    question_id: data.question_id,
                    input: data.input,
                    proof: data.proof,
                }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        let mut buf = Vec::new();
        match self {
            Self::StartGame => buf.extend_from_slice(&START_GAME),
            Self::SubmitAnswer {
                question_id,
                input,
                proof,
            } => {
                buf.extend_from_slice(&SUBMIT_ANSWER);
                SubmitAnswerData {
                    question_id: *question_id,
                    input: *input,
                    proof: proof.clone(),
                }
                .serialize(&mut buf)
                .map_err(|_| ProgramError::InvalidInstructionData)?;
            }
        }
        Ok(buf)
    }
}

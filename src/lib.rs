pub mod acl;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod fhe;
pub mod instruction;
pub mod processor;
pub mod scoring;
pub mod state;
pub mod store;

pub use crate::{
    acl::AccessControlList,
    config::QuizConfig,
    error::{QuizError, QuizResult},
    events::QuizEvent,
    fhe::{FheExecutor, Handle, PlaintextExecutor},
    instruction::QuizInstruction,
    processor::Processor,
    state::{GameState, PlayerRecord},
};

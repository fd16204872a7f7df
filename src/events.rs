use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;
use solana_program::{msg, pubkey::Pubkey};

/// Notifications carry identifiers only; scores stay confidential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizEvent {
    GameStarted { player: Pubkey },
    AnswerSubmitted { player: Pubkey, question_id: u8 },
    GameCompleted { player: Pubkey },
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<QuizEvent>>>,
}

impl EventBus {
    pub fn subscribe(&self) -> Receiver<QuizEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Logs the event and pushes it to every live subscriber. Subscribers
    /// whose receiver is gone are dropped.
    pub fn emit(&self, event: QuizEvent) {
        match &event {
            QuizEvent::GameStarted { player } => msg!("Player {} started the quiz", player),
            QuizEvent::AnswerSubmitted {
                player,
                question_id,
            } => msg!("Player {} answered question {}", player, question_id),
            QuizEvent::GameCompleted { player } => msg!("Player {} completed the quiz", player),
        }
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

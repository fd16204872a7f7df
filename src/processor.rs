use std::sync::mpsc::Receiver;

use solana_program::{entrypoint::ProgramResult, msg, pubkey::Pubkey};

use crate::{
    acl::AccessControlList,
    config::QuizConfig,
    constants::QUESTION_COUNT,
    error::{QuizError, QuizResult},
    events::{EventBus, QuizEvent},
    fhe::{EncryptedBool, EncryptedU32, FheExecutor, Handle},
    instruction::QuizInstruction,
    scoring::ScoringEngine,
    state::{GamePhase, GameState},
    store::PlayerStore,
};

pub struct Processor<E: FheExecutor> {
    program_id: Pubkey,
    config: QuizConfig,
    fhe: E,
    store: PlayerStore,
    acl: AccessControlList,
    events: EventBus,
}

impl<E: FheExecutor> Processor<E> {
    pub fn new(program_id: Pubkey, config: QuizConfig, fhe: E) -> QuizResult<Self> {
        config.validate()?;
        Ok(Self {
            program_id,
            config,
            fhe,
            store: PlayerStore::new(program_id),
            acl: AccessControlList::new(),
            events: EventBus::default(),
        })
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.fhe
    }

    pub fn acl(&self) -> &AccessControlList {
        &self.acl
    }

    pub fn store(&self) -> &PlayerStore {
        &self.store
    }

    pub fn subscribe(&self) -> Receiver<QuizEvent> {
        self.events.subscribe()
    }

    pub fn process_instruction(&self, signer: &Pubkey, instruction_data: &[u8]) -> ProgramResult {
        let instruction = QuizInstruction::unpack(instruction_data)?;

        match instruction {
            QuizInstruction::StartGame => self.start_game(signer)?,
            QuizInstruction::SubmitAnswer {
                question_id,
                input,
                proof,
            } => self.submit_answer(signer, question_id, input, &proof)?,
        }
        Ok(())
    }

    pub fn start_game(&self, player: &Pubkey) -> QuizResult<()> {
        self.store.transact(
            player,
            |record| {
                if record.phase() != GamePhase::Unstarted {
                    return Err(QuizError::AlreadyStarted);
                }

                let engine = ScoringEngine::new(&self.fhe);
                let score = engine.initial_score(self.config.starting_score)?;

                record.started = true;
                record.answered_mask = 0;
                record.correctness = [Handle::NULL; QUESTION_COUNT];
                record.score = score.0;
                self.grant_score(player, score);
                Ok(())
            },
            |_| self.events.emit(QuizEvent::GameStarted { player: *player }),
        )
        .inspect_err(|e| msg!("Player {} start rejected: {}", player, e))
    }

    pub fn submit_answer(
        &self,
        player: &Pubkey,
        question_id: u8,
        input: Handle,
        proof: &[u8],
    ) -> QuizResult<()> {
        self.store.transact(
            player,
            |record| {
                // Plaintext gates first; they cost no homomorphic work.
                if question_id as usize >= QUESTION_COUNT {
                    return Err(QuizError::InvalidQuestionId);
                }
                match record.phase() {
                    GamePhase::Unstarted => return Err(QuizError::GameNotStarted),
                    GamePhase::Completed => return Err(QuizError::GameCompleted),
                    GamePhase::InProgress => {}
                }
                if record.is_answered(question_id) {
                    return Err(QuizError::QuestionAlreadyAnswered);
                }

                let answer = self
                    .fhe
                    .verify_input(input, proof, &self.program_id, player)?;
                let engine = ScoringEngine::new(&self.fhe);
                let correct_option = self.config.correct_option(question_id)?;
                let correct = engine.score_answer(answer, correct_option)?;

                let mut next = record.clone();
                next.correctness[question_id as usize] = correct.0;
                next.mark_answered(question_id);

                if next.all_answered() {
                    let flags = next.correctness.map(EncryptedBool);
                    let score = engine.finalize_bonus(
                        EncryptedU32(next.score),
                        &flags,
                        self.config.perfect_bonus,
                    )?;
                    next.score = score.0;
                    next.completed = true;
                }

                // All homomorphic work succeeded; only now hand out grants.
                self.acl.grant(correct.0, self.program_id);
                self.grant_score(player, EncryptedU32(next.score));
                *record = next;
                Ok(record.completed)
            },
            |&completed| {
                self.events.emit(QuizEvent::AnswerSubmitted {
                    player: *player,
                    question_id,
                });
                if completed {
                    self.events.emit(QuizEvent::GameCompleted { player: *player });
                }
            },
        )
        .map(|_| ())
        .inspect_err(|e| {
            msg!(
                "Player {} answer to question {} rejected: {}",
                player,
                question_id,
                e
            )
        })
    }

    pub fn game_state(&self, player: &Pubkey) -> GameState {
        self.store.get(player).game_state()
    }

    /// Current score handle, `Handle::NULL` if the player never started.
    pub fn score_of(&self, player: &Pubkey) -> Handle {
        self.store.get(player).score
    }

    /// Every score ciphertext is readable by its player and by the program.
    fn grant_score(&self, player: &Pubkey, score: EncryptedU32) {
        self.acl.grant(score.0, *player);
        self.acl.grant(score.0, self.program_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::{EncryptedU8, Plaintext, PlaintextExecutor};
    use parking_lot::Mutex;
    use solana_program::program_error::ProgramError;

    fn processor() -> Processor<PlaintextExecutor> {
        Processor::new(
            Pubkey::new_unique(),
            QuizConfig::default(),
            PlaintextExecutor::new(),
        )
        .unwrap()
    }

    fn answer(
        p: &Processor<PlaintextExecutor>,
        player: &Pubkey,
        q: u8,
        option: u8,
    ) -> QuizResult<()> {
        let (input, proof) = p
            .executor()
            .encrypt_u8(p.program_id(), player, option)
            .unwrap();
        p.submit_answer(player, q, input, &proof)
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum FailOn {
        Nothing,
        And,
        Select,
        Add,
    }

    /// Plaintext executor that can be told to fail one bonus step.
    struct FlakyExecutor {
        inner: PlaintextExecutor,
        fail_on: Mutex<FailOn>,
    }

    impl FlakyExecutor {
        fn check(&self, op: FailOn) -> QuizResult<()> {
            if *self.fail_on.lock() == op {
                return Err(QuizError::UnknownCiphertext);
            }
            Ok(())
        }
    }

    impl FheExecutor for FlakyExecutor {
        fn verify_input(
            &self,
            external: Handle,
            proof: &[u8],
            contract: &Pubkey,
            sender: &Pubkey,
        ) -> QuizResult<EncryptedU8> {
            self.inner.verify_input(external, proof, contract, sender)
        }

        fn trivial_encrypt_u32(&self, value: u32) -> QuizResult<EncryptedU32> {
            self.inner.trivial_encrypt_u32(value)
        }

        fn eq_u8_scalar(&self, a: EncryptedU8, b: u8) -> QuizResult<EncryptedBool> {
            self.inner.eq_u8_scalar(a, b)
        }

        fn and(&self, a: EncryptedBool, b: EncryptedBool) -> QuizResult<EncryptedBool> {
            self.check(FailOn::And)?;
            self.inner.and(a, b)
        }

        fn select_u32(
            &self,
            cond: EncryptedBool,
            if_true: EncryptedU32,
            if_false: EncryptedU32,
        ) -> QuizResult<EncryptedU32> {
            self.check(FailOn::Select)?;
            self.inner.select_u32(cond, if_true, if_false)
        }

        fn add_u32(&self, a: EncryptedU32, b: EncryptedU32) -> QuizResult<EncryptedU32> {
            self.check(FailOn::Add)?;
            self.inner.add_u32(a, b)
        }
    }

    #[test]
    fn failed_bonus_step_rolls_back_final_answer() {
        for step in [FailOn::And, FailOn::Select, FailOn::Add] {
            let fhe = FlakyExecutor {
                inner: PlaintextExecutor::new(),
                fail_on: Mutex::new(FailOn::Nothing),
            };
            let p = Processor::new(Pubkey::new_unique(), QuizConfig::default(), fhe).unwrap();
            let events = p.subscribe();
            let player = Pubkey::new_unique();
            let submit = |q: u8, option: u8| {
                let (input, proof) = p
                    .executor()
                    .inner
                    .encrypt_u8(p.program_id(), &player, option)
                    .unwrap();
                p.submit_answer(&player, q, input, &proof)
            };

            p.start_game(&player).unwrap();
            for (q, option) in [1, 1, 2].into_iter().enumerate() {
                submit(q as u8, option).unwrap();
            }
            let before = p.store().get(&player);
            let grants = p.acl().grant_count();
            let seen = events.try_iter().count();

            *p.executor().fail_on.lock() = step;
            assert_eq!(submit(3, 2), Err(QuizError::UnknownCiphertext));
            let after = p.store().get(&player);
            assert_eq!(after, before);
            assert!(!after.completed);
            assert_eq!(after.answered_mask, 0b0111);
            assert_eq!(p.acl().grant_count(), grants);
            assert_eq!(events.try_iter().count(), 0);
            assert!(seen > 0);

            // the caller may resubmit once the executor recovers
            *p.executor().fail_on.lock() = FailOn::Nothing;
            submit(3, 2).unwrap();
            let state = p.game_state(&player);
            assert!(state.completed);
            assert_eq!(
                p.executor()
                    .inner
                    .user_decrypt_u32(p.acl(), p.score_of(&player), &player),
                Ok(200)
            );
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = QuizConfig {
            correct_options: [1, 2, 3, 7],
            ..QuizConfig::default()
        };
        assert!(matches!(
            Processor::new(Pubkey::new_unique(), config, PlaintextExecutor::new()),
            Err(QuizError::InvalidConfig)
        ));
    }

    #[test]
    fn precondition_order() {
        let p = processor();
        let player = Pubkey::new_unique();

        assert_eq!(answer(&p, &player, 4, 1), Err(QuizError::InvalidQuestionId));
        assert_eq!(answer(&p, &player, 0, 1), Err(QuizError::GameNotStarted));
        assert!(!p.store().is_materialized(&player));

        p.start_game(&player).unwrap();
        for (q, option) in [1, 1, 2, 2].into_iter().enumerate() {
            answer(&p, &player, q as u8, option).unwrap();
        }
        assert_eq!(answer(&p, &player, 0, 1), Err(QuizError::GameCompleted));
        assert_eq!(answer(&p, &player, 9, 1), Err(QuizError::InvalidQuestionId));
    }

    #[test]
    fn bad_proof_changes_nothing() {
        let p = processor();
        let player = Pubkey::new_unique();
        p.start_game(&player).unwrap();
        let before = p.store().get(&player);
        let grants = p.acl().grant_count();

        let (input, _) = p
            .executor()
            .encrypt_u8(p.program_id(), &player, 1)
            .unwrap();
        assert_eq!(
            p.submit_answer(&player, 0, input, &[0u8; 32]),
            Err(QuizError::InvalidInput)
        );

        // proof minted for someone else
        let other = Pubkey::new_unique();
        let (input, proof) = p.executor().encrypt_u8(p.program_id(), &other, 1).unwrap();
        assert_eq!(
            p.submit_answer(&player, 0, input, &proof),
            Err(QuizError::InvalidInput)
        );

        assert_eq!(p.store().get(&player), before);
        assert_eq!(p.acl().grant_count(), grants);
    }

    #[test]
    fn correctness_flags_stay_with_the_program() {
        let p = processor();
        let player = Pubkey::new_unique();
        p.start_game(&player).unwrap();
        answer(&p, &player, 1, 1).unwrap();

        let flag = p.store().get(&player).correctness[1];
        assert!(!flag.is_null());
        assert!(p.acl().is_granted(&flag, p.program_id()));
        assert!(!p.acl().is_granted(&flag, &player));
        assert_eq!(p.executor().plaintext(flag), Some(Plaintext::Bool(true)));
    }

    #[test]
    fn process_instruction_maps_errors() {
        let p = processor();
        let player = Pubkey::new_unique();
        let start = QuizInstruction::StartGame.pack().unwrap();

        p.process_instruction(&player, &start).unwrap();
        assert_eq!(
            p.process_instruction(&player, &start),
            Err(ProgramError::from(QuizError::AlreadyStarted))
        );
        assert_eq!(
            p.process_instruction(&player, &[1, 2]),
            Err(ProgramError::InvalidInstructionData)
        );
    }
}

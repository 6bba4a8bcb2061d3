use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

/// Step of the viewer flow a session is currently on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    /// Game title, description, prize, and the start action.
    Info,
    /// Answering the ordered question list, one at a time.
    Questions {
        /// Cursor into the question order.
        index: usize,
    },
    /// Email and terms form shown after the last question.
    UserForm,
    /// Final score and leaderboard.
    Score,
}

/// Events that can be applied to a viewer flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// Viewer pressed start on the info step.
    Start,
    /// Viewer answered the current question.
    Answer {
        /// Question the answer targets; must match the cursor.
        question_id: Uuid,
        /// Raw submitted answer.
        answer: String,
    },
    /// The attempt was scored and persisted.
    CompleteAttempt {
        /// Computed point total.
        total_score: u32,
    },
    /// Viewer asked to play the same game again.
    TryAgain,
}

/// Errors returned when an event cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// The event is not valid on the current step.
    #[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
    InvalidTransition {
        /// Step the flow was on when the event arrived.
        from: FlowStep,
        /// Rejected event.
        event: FlowEvent,
    },
    /// An answer targeted a question other than the cursor's.
    #[error("answer targets question `{got}`, expected `{expected}`")]
    WrongQuestion {
        /// Question the cursor points at.
        expected: Uuid,
        /// Question the answer named.
        got: Uuid,
    },
    /// No attempts remain for this viewer on this game.
    #[error("entry limit of {limit} attempts reached")]
    AttemptsExhausted {
        /// The game's entry limit.
        limit: u32,
    },
}

/// Latest persisted attempt found when the flow was opened.
#[derive(Debug, Clone, Copy)]
pub struct PriorAttempt {
    /// Point total of that attempt.
    pub total_score: u32,
    /// Attempt number of that attempt.
    pub attempt_number: u32,
    /// Whether that attempt had a confirmed donation.
    pub is_paid: bool,
}

/// One viewer's progression through the active game.
///
/// Owns the transient attempt state — step, cursor, accumulated answers,
/// attempt counter — for the lifetime of a session. Nothing here is
/// persisted; answers are derived into entry/score rows at submission.
#[derive(Debug, Clone)]
pub struct ViewerFlow {
    game_id: Uuid,
    question_ids: Vec<Uuid>,
    step: FlowStep,
    answers: IndexMap<Uuid, String>,
    /// Number the next submitted attempt will carry (1-based).
    attempt_number: u32,
    entry_limit: Option<u32>,
    total_score: Option<u32>,
    has_completed: bool,
    is_paid: bool,
}

impl ViewerFlow {
    /// Open a flow for one (game, viewer) pair.
    ///
    /// When a prior attempt exists the flow starts pre-populated with its
    /// score, and is forced straight to [`FlowStep::Score`] once the attempt
    /// count has reached the entry limit.
    pub fn new(
        game_id: Uuid,
        question_ids: Vec<Uuid>,
        entry_limit: Option<u32>,
        prior: Option<PriorAttempt>,
    ) -> Self {
        let (step, attempt_number, total_score, has_completed, is_paid) = match prior {
            Some(prior) => {
                let exhausted =
                    entry_limit.is_some_and(|limit| prior.attempt_number >= limit);
                let step = if exhausted { FlowStep::Score } else { FlowStep::Info };
                (
                    step,
                    prior.attempt_number + 1,
                    Some(prior.total_score),
                    true,
                    prior.is_paid,
                )
            }
            None => (FlowStep::Info, 1, None, false, false),
        };

        Self {
            game_id,
            question_ids,
            step,
            answers: IndexMap::new(),
            attempt_number,
            entry_limit,
            total_score,
            has_completed,
            is_paid,
        }
    }

    /// Game this flow belongs to.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Current step.
    pub fn step(&self) -> &FlowStep {
        &self.step
    }

    /// Answers recorded so far, in submission order, keyed by question id.
    pub fn answers(&self) -> &IndexMap<Uuid, String> {
        &self.answers
    }

    /// Number the next submitted attempt will carry.
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// Score of the latest completed attempt, if any.
    pub fn total_score(&self) -> Option<u32> {
        self.total_score
    }

    /// Whether the viewer has ever completed this game.
    pub fn has_completed(&self) -> bool {
        self.has_completed
    }

    /// Payment flag inherited by new entries of this session.
    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    /// Total number of questions in the game.
    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    /// Question id at the cursor while on the questions step.
    pub fn current_question_id(&self) -> Option<Uuid> {
        match self.step {
            FlowStep::Questions { index } => self.question_ids.get(index).copied(),
            _ => None,
        }
    }

    /// Whether one more attempt would stay within the entry limit.
    pub fn retry_allowed(&self) -> bool {
        self.within_limit(self.attempt_number + 1)
    }

    /// Record a confirmed donation; entries created afterwards carry the flag.
    pub fn mark_paid(&mut self) {
        self.is_paid = true;
    }

    /// Apply an event, returning the step the flow moved to.
    pub fn apply(&mut self, event: FlowEvent) -> Result<FlowStep, FlowError> {
        let next = match (self.step.clone(), event) {
            (FlowStep::Info, FlowEvent::Start) => {
                if !self.within_limit(self.attempt_number) {
                    // Unreachable through normal construction (an exhausted
                    // flow opens on the score step), kept as a hard guard.
                    return Err(FlowError::AttemptsExhausted {
                        limit: self.entry_limit.unwrap_or_default(),
                    });
                }
                if self.question_ids.is_empty() {
                    FlowStep::UserForm
                } else {
                    FlowStep::Questions { index: 0 }
                }
            }
            (FlowStep::Questions { index }, FlowEvent::Answer { question_id, answer }) => {
                let expected = self.question_ids[index];
                if question_id != expected {
                    return Err(FlowError::WrongQuestion {
                        expected,
                        got: question_id,
                    });
                }
                self.answers.insert(question_id, answer);
                if index + 1 < self.question_ids.len() {
                    FlowStep::Questions { index: index + 1 }
                } else {
                    FlowStep::UserForm
                }
            }
            (FlowStep::UserForm, FlowEvent::CompleteAttempt { total_score }) => {
                self.total_score = Some(total_score);
                self.has_completed = true;
                FlowStep::Score
            }
            (FlowStep::Score, FlowEvent::TryAgain) => {
                let next_attempt = self.attempt_number + 1;
                if !self.within_limit(next_attempt) {
                    return Err(FlowError::AttemptsExhausted {
                        limit: self.entry_limit.unwrap_or_default(),
                    });
                }
                self.attempt_number = next_attempt;
                self.answers.clear();
                FlowStep::Info
            }
            (from, event) => return Err(FlowError::InvalidTransition { from, event }),
        };

        self.step = next.clone();
        Ok(next)
    }

    fn within_limit(&self, attempt: u32) -> bool {
        self.entry_limit.is_none_or(|limit| attempt <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn answer_all(flow: &mut ViewerFlow, questions: &[Uuid]) {
        flow.apply(FlowEvent::Start).unwrap();
        for id in questions {
            flow.apply(FlowEvent::Answer {
                question_id: *id,
                answer: "x".into(),
            })
            .unwrap();
        }
    }

    #[test]
    fn happy_path_walks_every_step() {
        let questions = ids(3);
        let mut flow = ViewerFlow::new(Uuid::new_v4(), questions.clone(), None, None);
        assert_eq!(*flow.step(), FlowStep::Info);

        assert_eq!(
            flow.apply(FlowEvent::Start).unwrap(),
            FlowStep::Questions { index: 0 }
        );
        assert_eq!(flow.current_question_id(), Some(questions[0]));

        for (i, id) in questions.iter().enumerate() {
            let next = flow
                .apply(FlowEvent::Answer {
                    question_id: *id,
                    answer: format!("answer {i}"),
                })
                .unwrap();
            if i + 1 < questions.len() {
                assert_eq!(next, FlowStep::Questions { index: i + 1 });
            } else {
                assert_eq!(next, FlowStep::UserForm);
            }
        }

        assert_eq!(flow.answers().len(), 3);
        assert_eq!(
            flow.apply(FlowEvent::CompleteAttempt { total_score: 2 }).unwrap(),
            FlowStep::Score
        );
        assert_eq!(flow.total_score(), Some(2));
        assert!(flow.has_completed());
    }

    #[test]
    fn unlimited_games_allow_unbounded_retries() {
        let questions = ids(1);
        let mut flow = ViewerFlow::new(Uuid::new_v4(), questions.clone(), None, None);

        for round in 1..=5u32 {
            assert_eq!(flow.attempt_number(), round);
            answer_all(&mut flow, &questions);
            flow.apply(FlowEvent::CompleteAttempt { total_score: 1 }).unwrap();
            assert!(flow.retry_allowed());
            flow.apply(FlowEvent::TryAgain).unwrap();
            assert_eq!(*flow.step(), FlowStep::Info);
            assert!(flow.answers().is_empty());
        }
    }

    #[test]
    fn try_again_stops_at_the_entry_limit() {
        let questions = ids(1);
        let mut flow = ViewerFlow::new(Uuid::new_v4(), questions.clone(), Some(2), None);

        answer_all(&mut flow, &questions);
        flow.apply(FlowEvent::CompleteAttempt { total_score: 0 }).unwrap();
        flow.apply(FlowEvent::TryAgain).unwrap();
        assert_eq!(flow.attempt_number(), 2);

        answer_all(&mut flow, &questions);
        flow.apply(FlowEvent::CompleteAttempt { total_score: 1 }).unwrap();

        assert!(!flow.retry_allowed());
        let err = flow.apply(FlowEvent::TryAgain).unwrap_err();
        assert_eq!(err, FlowError::AttemptsExhausted { limit: 2 });
        // The failed retry is a no-op.
        assert_eq!(*flow.step(), FlowStep::Score);
        assert_eq!(flow.attempt_number(), 2);
    }

    #[test]
    fn prior_attempt_below_limit_resumes_on_info() {
        let flow = ViewerFlow::new(
            Uuid::new_v4(),
            ids(2),
            Some(3),
            Some(PriorAttempt {
                total_score: 2,
                attempt_number: 1,
                is_paid: false,
            }),
        );

        assert_eq!(*flow.step(), FlowStep::Info);
        assert_eq!(flow.attempt_number(), 2);
        assert_eq!(flow.total_score(), Some(2));
        assert!(flow.has_completed());
    }

    #[test]
    fn exhausted_prior_attempts_force_the_score_step() {
        let flow = ViewerFlow::new(
            Uuid::new_v4(),
            ids(2),
            Some(2),
            Some(PriorAttempt {
                total_score: 1,
                attempt_number: 2,
                is_paid: true,
            }),
        );

        assert_eq!(*flow.step(), FlowStep::Score);
        assert!(!flow.retry_allowed());
        assert!(flow.is_paid());
    }

    #[test]
    fn answer_must_match_the_cursor_question() {
        let questions = ids(2);
        let mut flow = ViewerFlow::new(Uuid::new_v4(), questions.clone(), None, None);
        flow.apply(FlowEvent::Start).unwrap();

        let stray = Uuid::new_v4();
        let err = flow
            .apply(FlowEvent::Answer {
                question_id: stray,
                answer: "x".into(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::WrongQuestion {
                expected: questions[0],
                got: stray,
            }
        );
    }

    #[test]
    fn events_out_of_order_are_rejected() {
        let mut flow = ViewerFlow::new(Uuid::new_v4(), ids(1), None, None);

        let err = flow
            .apply(FlowEvent::CompleteAttempt { total_score: 0 })
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { from, .. } if from == FlowStep::Info));

        let err = flow.apply(FlowEvent::TryAgain).unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
    }

    #[test]
    fn games_without_questions_skip_to_the_user_form() {
        let mut flow = ViewerFlow::new(Uuid::new_v4(), Vec::new(), None, None);
        assert_eq!(flow.apply(FlowEvent::Start).unwrap(), FlowStep::UserForm);
    }
}

use tracing::debug;

use crate::bank::{Question, QuestionBank};
use crate::error::SessionError;

/// Seconds a player gets per question.
pub const QUESTION_TIME_SECS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Revealed,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// What became visible when a question was locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub question_index: usize,
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub outcome: Outcome,
    pub timed_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub score: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Completed(Summary),
}

/// One attempt at a category's question sequence.
///
/// Stale or out-of-order commands are ignored rather than reported: they
/// are UI races, not programming errors.
#[derive(Debug, Clone)]
pub struct Session {
    category: String,
    questions: Vec<Question>,
    question_time: u32,
    current_index: usize,
    selected_option: Option<usize>,
    remaining_time: u32,
    timer_running: bool,
    revealed: bool,
    completed: bool,
    score: u32,
    last_reveal: Option<Reveal>,
}

impl Session {
    /// Load `category` from the bank and enter the first question.
    pub fn initialize(
        bank: &QuestionBank,
        category: &str,
        question_time: u32,
    ) -> Result<Self, SessionError> {
        let resolved = bank.resolve(category);
        Self::with_questions(&resolved.id, resolved.questions.clone(), question_time)
    }

    pub fn with_questions(
        category: &str,
        questions: Vec<Question>,
        question_time: u32,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyCategory(category.to_string()));
        }
        // a question never runs longer than the standard countdown
        let question_time = question_time.clamp(1, QUESTION_TIME_SECS);
        debug!(category, questions = questions.len(), "session initialized");

        Ok(Self {
            category: category.to_string(),
            questions,
            question_time,
            current_index: 0,
            selected_option: None,
            remaining_time: question_time,
            timer_running: true,
            revealed: false,
            completed: false,
            score: 0,
            last_reveal: None,
        })
    }

    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else if self.revealed {
            Phase::Revealed
        } else {
            Phase::Active
        }
    }

    /// One second elapsed. Auto-submits whatever is selected when time runs out.
    pub fn on_tick(&mut self) -> Option<Reveal> {
        if !self.timer_running || self.phase() != Phase::Active {
            return None;
        }
        self.remaining_time = self.remaining_time.saturating_sub(1);
        if self.remaining_time > 0 {
            return None;
        }
        debug!(question = self.current_index, "question timed out");
        Some(self.reveal(true))
    }

    /// Record a choice. Returns whether it was accepted.
    pub fn select_option(&mut self, index: usize) -> bool {
        if self.phase() != Phase::Active || index >= self.current_question().options.len() {
            return false;
        }
        self.selected_option = Some(index);
        true
    }

    pub fn submit(&mut self) -> Option<Reveal> {
        if self.phase() != Phase::Active || self.selected_option.is_none() {
            return None;
        }
        Some(self.reveal(false))
    }

    pub fn advance(&mut self) -> Option<Advance> {
        if self.phase() != Phase::Revealed {
            return None;
        }
        if self.current_index + 1 >= self.questions.len() {
            self.completed = true;
            self.timer_running = false;
            debug!(score = self.score, total = self.total(), "session completed");
            return Some(Advance::Completed(Summary {
                score: self.score,
                total: self.total(),
            }));
        }

        self.current_index += 1;
        self.selected_option = None;
        self.remaining_time = self.question_time;
        self.timer_running = true;
        self.revealed = false;
        self.last_reveal = None;
        Some(Advance::Next(self.current_index))
    }

    pub fn start_timer(&mut self) {
        if self.phase() == Phase::Active {
            self.timer_running = true;
        }
    }

    pub fn stop_timer(&mut self) {
        self.timer_running = false;
    }

    // Both the submit and timeout paths go through here; locking first means
    // only one of them can score a given question.
    fn reveal(&mut self, timed_out: bool) -> Reveal {
        self.revealed = true;
        self.timer_running = false;
        if timed_out {
            self.remaining_time = 0;
        }

        let question = &self.questions[self.current_index];
        let outcome = match self.selected_option {
            Some(i) if question.is_correct(i) => Outcome::Correct,
            _ => Outcome::Incorrect,
        };
        if outcome == Outcome::Correct {
            self.score += 1;
        }

        let reveal = Reveal {
            question_index: self.current_index,
            selected: self.selected_option,
            correct_index: question.correct_index,
            outcome,
            timed_out,
        };
        self.last_reveal = Some(reveal);
        reveal
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining_time
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Feedback for the current question once it has been revealed.
    pub fn last_reveal(&self) -> Option<&Reveal> {
        self.last_reveal.as_ref()
    }

    /// Position through the attempt, counting the current question as seen.
    pub fn progress(&self) -> u32 {
        crate::scoring::percentage(self.current_index as u32 + 1, self.total())
    }
}

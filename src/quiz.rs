//! Drives attempts end to end: validates the start request, feeds commands
//! and ticks to the [`Session`], keeps the host timer in step with the session
//! phase and records finished attempts on the leaderboard.

use tracing::{debug, info};

use crate::bank::QuestionBank;
use crate::config::QuizConfig;
use crate::error::{Field, StartError, ValidationErrors};
use crate::leaderboard::{LeaderboardEntry, LeaderboardStore};
use crate::runtime::{Command, QuizEvent, Timer};
use crate::scoring::{self, Grade};
use crate::session::{Advance, Reveal, Session};
use crate::storage::Storage;

pub const MISSING_NAME: &str = "Please enter your name";
pub const MISSING_CATEGORY: &str = "Please select a category";

/// A player's run through one category.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub player_name: String,
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedAttempt {
    pub entry: LeaderboardEntry,
    pub grade: Grade,
    /// Position on the leaderboard, `None` when it did not make the cut.
    pub rank: Option<usize>,
}

/// State change produced by a command or tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Selected(usize),
    Revealed(Reveal),
    NextQuestion(usize),
    Finished(FinishedAttempt),
    Abandoned,
}

pub struct Quiz<'b, S: Storage, T: Timer> {
    bank: &'b QuestionBank,
    config: QuizConfig,
    leaderboard: LeaderboardStore<S>,
    timer: T,
    attempt: Option<Attempt>,
    last_finished: Option<FinishedAttempt>,
}

impl<'b, S: Storage, T: Timer> Quiz<'b, S, T> {
    pub fn new(bank: &'b QuestionBank, config: QuizConfig, storage: S, timer: T) -> Self {
        let leaderboard = LeaderboardStore::open(storage, &config);
        Self {
            bank,
            config,
            leaderboard,
            timer,
            attempt: None,
            last_finished: None,
        }
    }

    /// Validate the picker input and begin a new attempt.
    ///
    /// Both missing fields are reported together. A running attempt is
    /// abandoned without being recorded.
    pub fn start_session(
        &mut self,
        player_name: &str,
        category_id: &str,
    ) -> Result<&Session, StartError> {
        let player_name = player_name.trim();
        let category_id = category_id.trim();

        let mut errors = ValidationErrors::default();
        if player_name.is_empty() {
            errors.push(Field::Name, MISSING_NAME);
        }
        if category_id.is_empty() {
            errors.push(Field::Category, MISSING_CATEGORY);
        }
        if !errors.is_empty() {
            debug!(%errors, "start request rejected");
            return Err(errors.into());
        }

        self.abandon();
        self.last_finished = None;

        let category = if self.bank.contains(category_id) {
            category_id
        } else {
            self.config.default_category.as_str()
        };
        let session = Session::initialize(self.bank, category, self.config.question_time_secs)?;
        info!(
            player = player_name,
            requested = category_id,
            category = session.category(),
            "attempt started"
        );

        self.timer.start();
        let attempt = self.attempt.insert(Attempt {
            player_name: player_name.to_string(),
            session,
        });
        Ok(&attempt.session)
    }

    pub fn handle(&mut self, event: QuizEvent) -> Option<Transition> {
        match event {
            QuizEvent::Tick => self.tick(),
            QuizEvent::Command(Command::Select(i)) => self.select(i),
            QuizEvent::Command(Command::Submit) => self.submit(),
            QuizEvent::Command(Command::Advance) => self.advance(),
            QuizEvent::Command(Command::Next) => self.next(),
            QuizEvent::Command(Command::Abandon) => self.abandon(),
        }
    }

    pub fn tick(&mut self) -> Option<Transition> {
        let reveal = self.attempt.as_mut()?.session.on_tick()?;
        self.timer.stop();
        Some(Transition::Revealed(reveal))
    }

    pub fn select(&mut self, option: usize) -> Option<Transition> {
        let session = &mut self.attempt.as_mut()?.session;
        session.select_option(option).then_some(Transition::Selected(option))
    }

    pub fn submit(&mut self) -> Option<Transition> {
        let reveal = self.attempt.as_mut()?.session.submit()?;
        self.timer.stop();
        Some(Transition::Revealed(reveal))
    }

    pub fn advance(&mut self) -> Option<Transition> {
        let step = self.attempt.as_mut()?.session.advance()?;
        match step {
            Advance::Next(index) => {
                self.timer.start();
                Some(Transition::NextQuestion(index))
            }
            Advance::Completed(summary) => {
                self.timer.stop();
                let attempt = self.attempt.take()?;
                let finished = self.finish(&attempt, summary.score, summary.total);
                Some(Transition::Finished(finished))
            }
        }
    }

    /// The single "next" button: submit an open question, advance a revealed one.
    pub fn next(&mut self) -> Option<Transition> {
        let revealed = self.attempt.as_ref()?.session.is_revealed();
        if revealed {
            self.advance()
        } else {
            self.submit()
        }
    }

    /// Drop the running attempt without touching the leaderboard.
    pub fn abandon(&mut self) -> Option<Transition> {
        let attempt = self.attempt.take()?;
        self.timer.stop();
        info!(
            player = %attempt.player_name,
            category = attempt.session.category(),
            "attempt abandoned"
        );
        Some(Transition::Abandoned)
    }

    fn finish(&mut self, attempt: &Attempt, score: u32, total: u32) -> FinishedAttempt {
        let grade = scoring::grade(score, total, self.config.pass_threshold);
        let name = attempt.player_name.as_str();
        let entry = self
            .leaderboard
            .record(name, score, total, attempt.session.category());
        let rank = self.leaderboard.rank_of(entry.id);
        info!(
            player = name,
            score,
            total,
            percentage = grade.percentage,
            tier = %grade.tier,
            "attempt finished"
        );

        let finished = FinishedAttempt { entry, grade, rank };
        self.last_finished = Some(finished.clone());
        finished
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.attempt.as_ref().map(|a| &a.session)
    }

    /// Result of the most recent finished attempt, for the score screen.
    pub fn last_finished(&self) -> Option<&FinishedAttempt> {
        self.last_finished.as_ref()
    }

    pub fn leaderboard(&self) -> &LeaderboardStore<S> {
        &self.leaderboard
    }

    pub fn clear_leaderboard(&mut self) {
        self.leaderboard.clear();
    }

    pub fn bank(&self) -> &'b QuestionBank {
        self.bank
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{Category, Question};
    use crate::error::SessionError;
    use crate::runtime::ManualTimer;
    use crate::session::{Outcome, Phase, QUESTION_TIME_SECS};
    use crate::storage::MemoryStorage;
    use assert_matches::assert_matches;

    type TestQuiz = Quiz<'static, MemoryStorage, ManualTimer>;

    fn quiz() -> TestQuiz {
        Quiz::new(
            QuestionBank::builtin(),
            QuizConfig::default(),
            MemoryStorage::new(),
            ManualTimer::default(),
        )
    }

    fn correct(quiz: &TestQuiz) -> usize {
        quiz.session().unwrap().current_question().correct_index
    }

    fn play(quiz: &mut TestQuiz, right: usize) -> FinishedAttempt {
        let total = quiz.session().unwrap().total() as usize;
        for i in 0..total {
            let answer = correct(quiz);
            let pick = if i < right { answer } else { (answer + 1) % 4 };
            quiz.select(pick).unwrap();
            quiz.next().unwrap();
            if let Some(Transition::Finished(done)) = quiz.next() {
                return done;
            }
        }
        panic!("attempt did not finish");
    }

    #[test]
    fn start_reports_both_missing_fields() {
        let mut quiz = quiz();
        let err = quiz.start_session("  ", "").unwrap_err();
        let StartError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Name), Some(MISSING_NAME));
        assert_eq!(errors.get(Field::Category), Some(MISSING_CATEGORY));
        assert!(quiz.session().is_none());
        assert_eq!(quiz.timer().starts, 0);
    }

    #[test]
    fn start_reports_single_missing_field() {
        let mut quiz = quiz();
        let err = quiz.start_session("Ada", "").unwrap_err();
        assert_matches!(
            err,
            StartError::Invalid(e) if e.len() == 1 && e.get(Field::Category).is_some()
        );
    }

    #[test]
    fn start_trims_name_and_starts_timer() {
        let mut quiz = quiz();
        let session = quiz.start_session("  Ada  ", "css").unwrap();
        assert_eq!(session.category(), "css");
        assert_eq!(quiz.attempt().unwrap().player_name, "Ada");
        assert!(quiz.timer().is_running());
    }

    #[test]
    fn unknown_category_uses_configured_default() {
        let config = QuizConfig {
            default_category: "js".into(),
            ..QuizConfig::default()
        };
        let mut quiz = Quiz::new(
            QuestionBank::builtin(),
            config,
            MemoryStorage::new(),
            ManualTimer::default(),
        );
        let session = quiz.start_session("Ada", "python").unwrap();
        assert_eq!(session.category(), "js");
    }

    #[test]
    fn empty_category_is_rejected() {
        let bank = QuestionBank::new(
            vec![
                Category {
                    id: "full".into(),
                    name: "Full".into(),
                    description: String::new(),
                    questions: vec![Question {
                        text: "?".into(),
                        options: ["a".into(), "b".into(), "c".into(), "d".into()],
                        correct_index: 0,
                    }],
                },
                Category {
                    id: "empty".into(),
                    name: "Empty".into(),
                    description: String::new(),
                    questions: vec![],
                },
            ],
            "full",
        )
        .unwrap();
        let mut quiz = Quiz::new(
            &bank,
            QuizConfig::default(),
            MemoryStorage::new(),
            ManualTimer::default(),
        );

        let err = quiz.start_session("Ada", "empty").unwrap_err();
        assert_eq!(err, StartError::Session(SessionError::EmptyCategory("empty".into())));
        assert!(!quiz.timer().is_running());
    }

    #[test]
    fn timer_follows_phase() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        quiz.select(correct(&quiz));
        assert_matches!(quiz.submit(), Some(Transition::Revealed(_)));
        assert!(!quiz.timer().is_running());

        assert_eq!(quiz.advance(), Some(Transition::NextQuestion(1)));
        assert!(quiz.timer().is_running());
    }

    #[test]
    fn tick_timeout_reveals_and_stops_timer() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        let reveals: Vec<_> = (0..20).filter_map(|_| quiz.tick()).collect();

        assert_eq!(reveals.len(), 1);
        assert_matches!(
            reveals[0],
            Transition::Revealed(Reveal { timed_out: true, outcome: Outcome::Incorrect, .. })
        );
        assert!(!quiz.timer().is_running());
        assert_eq!(quiz.session().unwrap().score(), 0);
    }

    #[test]
    fn next_without_selection_does_nothing() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        assert_eq!(quiz.next(), None);
        assert_eq!(quiz.session().unwrap().phase(), Phase::Active);
    }

    #[test]
    fn perfect_js_run_is_recorded() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "js").unwrap();
        let done = play(&mut quiz, 10);

        assert_eq!(done.grade.percentage, 100);
        assert!(done.grade.passed);
        assert_eq!(done.grade.tier.to_string(), "A+");
        assert_eq!(done.entry.result.score, 10);
        assert_eq!(done.entry.result.category, "js");
        assert_eq!(done.rank, Some(0));
        assert!(quiz.session().is_none());
        assert!(!quiz.timer().is_running());
        assert_eq!(quiz.leaderboard().len(), 1);
        assert_eq!(quiz.last_finished(), Some(&done));
    }

    #[test]
    fn recorded_name_is_the_trimmed_player_name() {
        let mut quiz = quiz();
        quiz.start_session("\t Grace  ", "html").unwrap();
        let done = play(&mut quiz, 6);
        assert_eq!(done.entry.result.player_name, "Grace");
        assert_eq!(quiz.leaderboard().entries()[0].result.player_name, "Grace");
    }

    #[test]
    fn long_configured_question_time_is_capped() {
        let config = QuizConfig {
            question_time_secs: 60,
            ..QuizConfig::default()
        };
        let mut quiz = Quiz::new(
            QuestionBank::builtin(),
            config,
            MemoryStorage::new(),
            ManualTimer::default(),
        );
        let session = quiz.start_session("Ada", "css").unwrap();
        assert_eq!(session.remaining_time(), QUESTION_TIME_SECS);

        for _ in 0..QUESTION_TIME_SECS - 1 {
            assert_eq!(quiz.tick(), None);
        }
        assert_matches!(quiz.tick(), Some(Transition::Revealed(r)) if r.timed_out);
    }

    #[test]
    fn final_answer_counts_before_recording() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "css").unwrap();
        let total = quiz.session().unwrap().total() as usize;
        for _ in 0..total - 1 {
            let wrong = (correct(&quiz) + 1) % 4;
            quiz.select(wrong);
            quiz.submit();
            quiz.advance();
        }
        quiz.select(correct(&quiz));
        quiz.submit();
        let Some(Transition::Finished(done)) = quiz.advance() else {
            panic!("expected finish");
        };
        assert_eq!(done.entry.result.score, 1);
        assert_eq!(done.entry.result.percentage, 10);
    }

    #[test]
    fn failing_run_grades_f() {
        let mut quiz = quiz();
        quiz.start_session("Bob", "html").unwrap();
        let done = play(&mut quiz, 4);
        assert_eq!(done.grade.percentage, 40);
        assert!(!done.grade.passed);
        assert!(!done.entry.result.passed);
    }

    #[test]
    fn abandon_never_records() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        quiz.select(correct(&quiz));
        quiz.submit();
        assert_eq!(
            quiz.handle(QuizEvent::Command(Command::Abandon)),
            Some(Transition::Abandoned)
        );

        assert!(quiz.session().is_none());
        assert!(quiz.leaderboard().is_empty());
        assert!(!quiz.timer().is_running());
        assert_eq!(quiz.tick(), None);
        assert_eq!(quiz.abandon(), None);
    }

    #[test]
    fn restarting_abandons_running_attempt() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        quiz.start_session("Ada", "css").unwrap();
        assert_eq!(quiz.session().unwrap().category(), "css");
        assert!(quiz.leaderboard().is_empty());
        assert_eq!(quiz.timer().starts, 2);
    }

    #[test]
    fn handle_dispatches_commands() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "html").unwrap();
        assert_eq!(
            quiz.handle(QuizEvent::Command(Command::Select(2))),
            Some(Transition::Selected(2))
        );
        assert_eq!(quiz.handle(QuizEvent::Command(Command::Select(9))), None);
        assert_eq!(quiz.handle(QuizEvent::Tick), None);
        assert_eq!(quiz.session().unwrap().remaining_time(), 14);
        assert_matches!(
            quiz.handle(QuizEvent::Command(Command::Submit)),
            Some(Transition::Revealed(_))
        );
        assert_eq!(
            quiz.handle(QuizEvent::Command(Command::Advance)),
            Some(Transition::NextQuestion(1))
        );
    }

    #[test]
    fn clear_leaderboard_empties_board() {
        let mut quiz = quiz();
        quiz.start_session("Ada", "js").unwrap();
        play(&mut quiz, 10);
        quiz.clear_leaderboard();
        assert!(quiz.leaderboard().is_empty());
    }
}

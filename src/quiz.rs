//! # Quiz Engine Module
//!
//! A fixed bank of ten medical-marketing questions and the per-session
//! progress through it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of options offered for every question
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One question of the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub options: [&'static str; OPTIONS_PER_QUESTION],
    pub correct: usize,
    pub explanation: &'static str,
}

impl Question {
    pub fn correct_option(&self) -> &'static str {
        self.options[self.correct]
    }
}

pub static QUESTIONS: [Question; 10] = [
    Question {
        text: "Який середній CPL (Cost Per Lead) для медичних послуг в Україні?",
        options: ["50-150 грн", "200-800 грн", "1000-2000 грн", "2500+ грн"],
        correct: 1,
        explanation: "Середній CPL для медицини в Україні: 200-800 грн залежно від ніші та регіону.",
    },
    Question {
        text: "Яка мінімальна конверсія лендінгу для медичних послуг вважається прийнятною?",
        options: ["1-3%", "5-10%", "15-20%", "25%+"],
        correct: 1,
        explanation: "Конверсія 5-10% вважається нормальною для медичних лендінгів. Нижче 5% - потрібна оптимізація.",
    },
    Question {
        text: "Яке правило тексту на зображеннях рекомендує Facebook/Meta?",
        options: ["Максимум 10%", "Максимум 20%", "Максимум 50%", "Немає обмежень"],
        correct: 1,
        explanation: "Facebook рекомендує, щоб текст займав не більше 20% площі зображення для кращого охоплення.",
    },
    Question {
        text: "Який ROAS (Return on Ad Spend) вважається прибутковим для медичних клінік?",
        options: ["50-100%", "150-200%", "300-800%", "1000%+"],
        correct: 2,
        explanation: "ROAS 300-800% - стандарт для медицини. Нижче 200% - кампанія збиткова.",
    },
    Question {
        text: "Скільки часу в середньому потрібно для виходу медичного сайту в ТОП Google (локальні запити)?",
        options: ["2-4 тижні", "1-2 місяці", "2-4 місяці", "6-12 місяців"],
        correct: 2,
        explanation: "Для локальних запитів реально вийти в ТОП за 2-4 місяці при правильній SEO-стратегії.",
    },
    Question {
        text: "Яка оптимальна кількість полів у формі запису на консультацію?",
        options: ["1-2 поля", "3-4 поля", "5-7 полів", "8+ полів"],
        correct: 1,
        explanation: "3-4 поля (ім'я, телефон, email, коментар) - оптимум між конверсією та якістю лідів.",
    },
    Question {
        text: "Який відсоток лідів з реклами в середньому стають пацієнтами?",
        options: ["5-10%", "20-40%", "50-60%", "70%+"],
        correct: 1,
        explanation: "20-40% лідів конвертуються в пацієнтів залежно від якості лідів та роботи з ними.",
    },
    Question {
        text: "Яка максимальна швидкість завантаження лендінгу для хорошої конверсії?",
        options: ["До 1 сек", "До 3 сек", "До 5 сек", "До 10 сек"],
        correct: 1,
        explanation: "Оптимально до 3 секунд. Кожна додаткова секунда зменшує конверсію на ~7%.",
    },
    Question {
        text: "Що краще використовувати для медичної реклами на Facebook?",
        options: ["Тільки зображення", "Тільки відео", "Карусель", "A/B тест різних форматів"],
        correct: 3,
        explanation: "Завжди тестуй різні формати! Для кожної ніші може бути свій найкращий варіант.",
    },
    Question {
        text: "Скільки разів на тиждень оптимально публікувати в Instagram медичної клініки?",
        options: ["1-2 рази", "3-5 разів", "Щодня", "2-3 рази на день"],
        correct: 1,
        explanation: "3-5 разів на тиждень - оптимум для медичних клінік. Якість важливіша за кількість.",
    },
];

/// Total number of questions in one attempt
pub fn question_count() -> usize {
    QUESTIONS.len()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("no quiz is running")]
    NotActive,
    #[error("the current question was already answered")]
    AlreadyAnswered,
    #[error("the current question has not been answered yet")]
    NotAnswered,
    #[error("option {0} does not exist")]
    InvalidChoice(usize),
}

/// Answer given to one question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: usize,
    pub choice: usize,
    pub correct: bool,
}

/// Result of [`QuizRun::answer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub question: usize,
    pub correct: bool,
    pub score: u32,
    pub answered: usize,
    pub is_last: bool,
}

/// Qualitative level reached in a finished attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizLevel {
    Expert,
    Advanced,
    Intermediate,
    Beginner,
}

impl QuizLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            QuizLevel::Expert
        } else if percentage >= 70.0 {
            QuizLevel::Advanced
        } else if percentage >= 50.0 {
            QuizLevel::Intermediate
        } else {
            QuizLevel::Beginner
        }
    }
}

/// A finished attempt, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub level: QuizLevel,
    pub answers: Vec<AnswerRecord>,
}

impl QuizSummary {
    fn from_answers(score: u32, answers: Vec<AnswerRecord>) -> Self {
        let max_score = question_count() as u32;
        let percentage = f64::from(score * 100) / f64::from(max_score);
        Self {
            score,
            max_score,
            percentage,
            level: QuizLevel::from_percentage(percentage),
            answers,
        }
    }
}

/// Outcome of [`QuizRun::advance`]
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next(QuizRun),
    Finished(QuizSummary),
}

/// Progress of one running attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRun {
    current: usize,
    score: u32,
    answers: Vec<AnswerRecord>,
}

impl QuizRun {
    /// Start at question 0 with a zero score
    pub fn start() -> Self {
        Self {
            current: 0,
            score: 0,
            answers: Vec::with_capacity(question_count()),
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.current]
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Whether the current question already has an answer
    pub fn is_answered(&self) -> bool {
        self.answers.len() > self.current
    }

    /// Record an answer to the current question.
    ///
    /// Leaves the run untouched on error.
    pub fn answer(&mut self, choice: usize) -> Result<AnswerOutcome, QuizError> {
        if self.is_answered() {
            return Err(QuizError::AlreadyAnswered);
        }
        if choice >= OPTIONS_PER_QUESTION {
            return Err(QuizError::InvalidChoice(choice));
        }

        let correct = choice == self.current_question().correct;
        if correct {
            self.score += 1;
        }
        self.answers.push(AnswerRecord {
            question: self.current,
            choice,
            correct,
        });

        Ok(AnswerOutcome {
            question: self.current,
            correct,
            score: self.score,
            answered: self.answers.len(),
            is_last: self.current + 1 == question_count(),
        })
    }

    /// Move past an answered question, finishing the attempt after the last one
    pub fn advance(self) -> Result<Advance, QuizError> {
        if !self.is_answered() {
            return Err(QuizError::NotAnswered);
        }
        if self.current + 1 < question_count() {
            Ok(Advance::Next(Self {
                current: self.current + 1,
                ..self
            }))
        } else {
            Ok(Advance::Finished(QuizSummary::from_answers(self.score, self.answers)))
        }
    }
}

/// Session-level handle on the quiz: idle until started
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizEngine {
    run: Option<QuizRun>,
}

impl QuizEngine {
    /// Wrap a run restored from a session
    pub fn resume(run: QuizRun) -> Self {
        Self { run: Some(run) }
    }

    pub fn into_run(self) -> Option<QuizRun> {
        self.run
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn run(&self) -> Option<&QuizRun> {
        self.run.as_ref()
    }

    /// Reset to question 0 with a zero score
    pub fn start(&mut self) -> &QuizRun {
        self.run.insert(QuizRun::start())
    }

    pub fn answer(&mut self, choice: usize) -> Result<AnswerOutcome, QuizError> {
        self.run.as_mut().ok_or(QuizError::NotActive)?.answer(choice)
    }

    /// Advance the running attempt; a finished attempt leaves the engine idle
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        let run = self.run.take().ok_or(QuizError::NotActive)?;
        match run.clone().advance() {
            Ok(Advance::Next(next)) => {
                self.run = Some(next.clone());
                Ok(Advance::Next(next))
            }
            Ok(finished) => Ok(finished),
            Err(e) => {
                self.run = Some(run);
                Err(e)
            }
        }
    }
}

//! Conversation state kept per user between updates.
//!
//! Every phase carries only the fields it needs, so a value collected in
//! one phase cannot be read while the user is in another one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::Dialogue;

use crate::analysis::UploadKind;
use crate::profile::BusinessType;
use crate::quiz::QuizRun;
use crate::session::SessionStore;

/// Dialogue handle injected into the handlers, backed by the TTL session store
pub type MediciDialogue = Dialogue<DialogueState, SessionStore>;

/// Upper bound for free-text answers
pub const MAX_TEXT_LEN: usize = 255;

/// Consultation time slots offered after a date is picked
pub const TIME_SLOTS: [&str; 8] = [
    "09:00", "10:00", "11:00", "12:00", "14:00", "15:00", "16:00", "17:00",
];

/// Represents the conversation state of one user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DialogueState {
    /// No conversation running: before `/start`, after `/cancel` or eviction
    #[default]
    Ended,
    MainMenu,
    TopicDialog {
        business: Option<BusinessType>,
    },
    MaterialsMenu,
    AwaitingUpload,
    /// An upload was received, waiting for the user to pick its type
    UploadTypeChosen {
        upload: UploadKind,
    },
    ConsultName,
    ConsultRole {
        name: String,
    },
    ConsultContact {
        name: String,
        role: String,
    },
    ConsultDate {
        details: ContactDetails,
        month: CalendarMonth,
    },
    ConsultTime {
        details: ContactDetails,
        date: NaiveDate,
    },
    CalcCplBudget,
    CalcCplLeads {
        budget: f64,
    },
    CalcRoasSpend,
    CalcRoasRevenue {
        spend: f64,
    },
    QuizQuestion {
        run: QuizRun,
    },
}

impl DialogueState {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DialogueState::Ended => "ended",
            DialogueState::MainMenu => "main_menu",
            DialogueState::TopicDialog { .. } => "topic_dialog",
            DialogueState::MaterialsMenu => "materials_menu",
            DialogueState::AwaitingUpload => "awaiting_upload",
            DialogueState::UploadTypeChosen { .. } => "upload_type_chosen",
            DialogueState::ConsultName => "consult_name",
            DialogueState::ConsultRole { .. } => "consult_role",
            DialogueState::ConsultContact { .. } => "consult_contact",
            DialogueState::ConsultDate { .. } => "consult_date",
            DialogueState::ConsultTime { .. } => "consult_time",
            DialogueState::CalcCplBudget => "calc_cpl_budget",
            DialogueState::CalcCplLeads { .. } => "calc_cpl_leads",
            DialogueState::CalcRoasSpend => "calc_roas_spend",
            DialogueState::CalcRoasRevenue { .. } => "calc_roas_revenue",
            DialogueState::QuizQuestion { .. } => "quiz_question",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DialogueState::Ended)
    }
}

/// Answers collected before the date picker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub role: String,
    pub contact: String,
}

/// Month shown by the inline calendar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { month: self.month + 1, ..self }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { month: self.month - 1, ..self }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(self) -> u32 {
        let next = self.next();
        match (self.first_day(), next.first_day()) {
            (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
            _ => 0,
        }
    }

    /// Monday-first week rows; `None` pads days outside the month
    pub fn weeks(self) -> Vec<[Option<u32>; 7]> {
        let Some(first) = self.first_day() else {
            return Vec::new();
        };
        let offset = first.weekday().num_days_from_monday() as usize;
        let days = self.days_in_month();

        let mut weeks = Vec::new();
        let mut week = [None; 7];
        let mut column = offset;
        for day in 1..=days {
            week[column] = Some(day);
            column += 1;
            if column == 7 {
                weeks.push(week);
                week = [None; 7];
                column = 0;
            }
        }
        if column > 0 {
            weeks.push(week);
        }
        weeks
    }
}

/// Why a free-text answer was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputError {
    Empty,
    TooLong,
}

/// Validates a free-text answer (name, role, contact)
pub fn validate_text_input(input: &str) -> Result<String, TextInputError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TextInputError::Empty);
    }

    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(TextInputError::TooLong);
    }

    Ok(trimmed.to_string())
}

/// Whether `slot` is one of the offered time slots
pub fn is_time_slot(slot: &str) -> bool {
    TIME_SLOTS.contains(&slot)
}

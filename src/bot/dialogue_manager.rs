//! Dialogue Manager module: the conversation state machine.
//!
//! [`transition`] maps the current [`DialogueState`] and one inbound
//! [`Event`] to the next state, at most one reply and the side effects the
//! executor has to perform. It does no I/O.

use chrono::NaiveDate;
use tracing::debug;

use crate::analysis::{MaterialType, UploadKind};
use crate::db::{ConsultationRequest, QuizAttempt};
use crate::dialogue::{
    is_time_slot, validate_text_input, CalendarMonth, ContactDetails, DialogueState,
    TextInputError,
};
use crate::materials::Material;
use crate::metrics::{parse_amount, parse_lead_count, CplReport, MetricError, RoasReport};
use crate::profile::{BusinessType, Counter, ProfileField};
use crate::quiz::{Advance, AnswerOutcome, QuizEngine, QuizRun, QuizSummary};

use super::event::{Button, CalcKind, Command, Event, MenuAction, Topic};

/// Inputs of a transition that come from outside the session
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub today: NaiveDate,
}

/// Calculator field a numeric answer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberField {
    Budget,
    Leads,
    Spend,
    Revenue,
}

/// How long the bot "types" before a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    None,
    Short,
    Normal,
    Long,
}

impl Pause {
    pub fn scale(self, base: std::time::Duration) -> std::time::Duration {
        match self {
            Pause::None => std::time::Duration::ZERO,
            Pause::Short => base / 2,
            Pause::Normal => base,
            Pause::Long => base * 3 / 2,
        }
    }
}

/// Everything the bot can show in reply to an event
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Welcome,
    MainMenu,
    Help,
    Cancelled,
    /// Hint shown when no conversation is running
    Ended,
    UseButtons,
    Unsupported,
    /// Reply to a slash command the bot does not know
    UnknownCommand,
    BusinessChoice,
    TopicMenu { business: BusinessType },
    TopicAnswer(Topic),
    Materials,
    UploadPrompt,
    UploadReprompt,
    UploadReceived,
    Analysis(MaterialType),
    Calculator,
    CplBudgetPrompt,
    CplLeadsPrompt { budget: f64 },
    CplResult(CplReport),
    RoasSpendPrompt,
    RoasRevenuePrompt { spend: f64 },
    RoasResult(RoasReport),
    InvalidNumber(NumberField),
    ZeroLeads,
    TooManyLeads { max: u64 },
    ZeroSpend,
    QuizIntro,
    QuizQuestion { index: usize },
    QuizFeedback(AnswerOutcome),
    QuizResult(QuizSummary),
    ConsultNamePrompt,
    ConsultRolePrompt { name: String },
    ConsultContactPrompt,
    InvalidText(TextInputError),
    DatePicker { month: CalendarMonth },
    /// Calendar navigation: only the keyboard changes
    CalendarPage { month: CalendarMonth },
    PastDate { month: CalendarMonth },
    TimePicker { date: NaiveDate },
    ConsultConfirmed { date: NaiveDate, time: String },
    Stats,
}

impl Screen {
    pub fn pause(&self) -> Pause {
        match self {
            Screen::CalendarPage { .. } | Screen::UseButtons | Screen::Unsupported => Pause::None,
            Screen::CplLeadsPrompt { .. }
            | Screen::RoasRevenuePrompt { .. }
            | Screen::ConsultRolePrompt { .. }
            | Screen::ConsultContactPrompt
            | Screen::InvalidNumber(_)
            | Screen::InvalidText(_)
            | Screen::ZeroLeads
            | Screen::TooManyLeads { .. }
            | Screen::UnknownCommand
            | Screen::ZeroSpend
            | Screen::QuizFeedback(_)
            | Screen::MainMenu
            | Screen::Materials
            | Screen::TimePicker { .. }
            | Screen::PastDate { .. } => Pause::Short,
            Screen::Welcome
            | Screen::Stats
            | Screen::QuizIntro
            | Screen::TopicAnswer(_)
            | Screen::CplResult(_)
            | Screen::RoasResult(_) => Pause::Long,
            _ => Pause::Normal,
        }
    }

    /// Screens whose text depends on the stored profile
    pub fn needs_profile(&self) -> bool {
        matches!(self, Screen::Welcome | Screen::Stats)
    }
}

/// Outbound message of a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Screen(Screen),
    /// Send a material file; falls back to a "not available" text
    Document(Material),
}

/// Profile store write requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    Touch,
    Increment(Counter),
    SetField(ProfileField, String),
}

/// Event log write requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub action: &'static str,
    pub payload: String,
}

/// Immutable record handed to the booking sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Consultation(ConsultationRequest),
    QuizAttempt(QuizAttempt),
}

/// Result of one state machine step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: DialogueState,
    pub reply: Option<Reply>,
    pub profile: Option<ProfileUpdate>,
    pub log: Option<LogEntry>,
    pub record: Option<Record>,
    /// Booking to announce on the operator channel
    pub notify_operator: Option<ConsultationRequest>,
}

impl Transition {
    pub fn to(next: DialogueState) -> Self {
        Self {
            next,
            reply: None,
            profile: None,
            log: None,
            record: None,
            notify_operator: None,
        }
    }

    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.reply = Some(Reply::Screen(screen));
        self
    }

    pub fn with_document(mut self, material: Material) -> Self {
        self.reply = Some(Reply::Document(material));
        self
    }

    pub fn with_profile(mut self, update: ProfileUpdate) -> Self {
        self.profile = Some(update);
        self
    }

    pub fn with_log(mut self, action: &'static str, payload: impl Into<String>) -> Self {
        self.log = Some(LogEntry {
            action,
            payload: payload.into(),
        });
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_operator_notice(mut self, request: ConsultationRequest) -> Self {
        self.notify_operator = Some(request);
        self
    }

    pub fn screen(&self) -> Option<&Screen> {
        match &self.reply {
            Some(Reply::Screen(screen)) => Some(screen),
            _ => None,
        }
    }
}

/// Advance the conversation by one event
pub fn transition(state: DialogueState, event: Event, ctx: &TransitionContext) -> Transition {
    debug!(state = state.name(), event = ?event, "Dialogue transition");
    match event {
        Event::Command(command) => on_command(state, command),
        Event::UnknownCommand(_) => Transition::to(state).with_screen(Screen::UnknownCommand),
        Event::Button(Button::Ignore) => Transition::to(state),
        Event::Button(_) | Event::Text(_) | Event::Upload(_) if !state.is_active() => {
            Transition::to(state).with_screen(Screen::Ended)
        }
        Event::Button(button) => on_button(state, button, ctx),
        Event::Text(text) => on_text(state, text, ctx),
        Event::Upload(upload) => on_upload(state, upload),
        Event::Unsupported => match state {
            DialogueState::AwaitingUpload => Transition::to(state).with_screen(Screen::UploadReprompt),
            other => Transition::to(other).with_screen(Screen::Unsupported),
        },
    }
}

fn on_command(state: DialogueState, command: Command) -> Transition {
    match command {
        Command::Start => Transition::to(DialogueState::MainMenu)
            .with_screen(Screen::Welcome)
            .with_profile(ProfileUpdate::Touch)
            .with_log("start", ""),
        Command::Cancel => {
            let from = state.name();
            Transition::to(DialogueState::Ended)
                .with_screen(Screen::Cancelled)
                .with_log("cancel", from)
        }
        Command::Help => Transition::to(state).with_screen(Screen::Help),
        Command::Menu => Transition::to(DialogueState::MaterialsMenu).with_screen(Screen::Materials),
        Command::Stats => Transition::to(DialogueState::MainMenu).with_screen(Screen::Stats),
        Command::Calculator => {
            Transition::to(DialogueState::MainMenu).with_screen(Screen::Calculator)
        }
        Command::Quiz => Transition::to(DialogueState::MainMenu).with_screen(Screen::QuizIntro),
    }
}

fn on_menu_action(action: MenuAction) -> Transition {
    let (next, screen, code) = match action {
        MenuAction::Topics => (
            DialogueState::TopicDialog { business: None },
            Screen::BusinessChoice,
            "topics",
        ),
        MenuAction::Materials => (DialogueState::MaterialsMenu, Screen::Materials, "materials"),
        MenuAction::Upload => (DialogueState::AwaitingUpload, Screen::UploadPrompt, "upload"),
        MenuAction::Calculator => (DialogueState::MainMenu, Screen::Calculator, "calculator"),
        MenuAction::Consult => (DialogueState::ConsultName, Screen::ConsultNamePrompt, "consult"),
        MenuAction::Quiz => (DialogueState::MainMenu, Screen::QuizIntro, "quiz"),
        MenuAction::Stats => (DialogueState::MainMenu, Screen::Stats, "stats"),
    };
    Transition::to(next)
        .with_screen(screen)
        .with_log("main_menu_click", code)
}

fn on_button(state: DialogueState, button: Button, ctx: &TransitionContext) -> Transition {
    match (state, button) {
        // Navigation works from every phase and drops its sub-state
        (_, Button::BackToMain) => {
            Transition::to(DialogueState::MainMenu).with_screen(Screen::MainMenu)
        }
        (_, Button::Menu(action)) => on_menu_action(action),

        (DialogueState::MainMenu, Button::Calc(CalcKind::Cpl)) => {
            Transition::to(DialogueState::CalcCplBudget)
                .with_screen(Screen::CplBudgetPrompt)
                .with_log("calculator_click", "cpl")
        }
        (DialogueState::MainMenu, Button::Calc(CalcKind::Roas)) => {
            Transition::to(DialogueState::CalcRoasSpend)
                .with_screen(Screen::RoasSpendPrompt)
                .with_log("calculator_click", "roas")
        }
        (DialogueState::MainMenu, Button::QuizStart) => {
            let run = QuizRun::start();
            let index = run.current_index();
            Transition::to(DialogueState::QuizQuestion { run })
                .with_screen(Screen::QuizQuestion { index })
                .with_log("quiz_started", "")
        }

        (DialogueState::TopicDialog { .. }, Button::Business(business)) => {
            Transition::to(DialogueState::TopicDialog {
                business: Some(business),
            })
            .with_screen(Screen::TopicMenu { business })
            .with_profile(ProfileUpdate::SetField(
                ProfileField::BusinessType,
                business.code().to_string(),
            ))
            .with_log("dialog_click", business.code())
        }
        (DialogueState::TopicDialog { business }, Button::Topic(topic)) => {
            Transition::to(DialogueState::TopicDialog { business })
                .with_screen(Screen::TopicAnswer(topic))
                .with_log("dialog_click", topic.code())
        }

        (DialogueState::MaterialsMenu, Button::Material(material)) => {
            Transition::to(DialogueState::MaterialsMenu)
                .with_document(material)
                .with_profile(ProfileUpdate::Increment(Counter::MaterialsDownloaded))
                .with_log("material_click", material.code())
        }

        (DialogueState::UploadTypeChosen { .. }, Button::UploadType(kind)) => {
            Transition::to(DialogueState::MainMenu)
                .with_screen(Screen::Analysis(kind))
                .with_log("upload_type", kind.code())
        }

        (state, Button::QuizAnswer(choice)) => on_quiz_answer(state, choice),
        (state, Button::QuizNext) => on_quiz_next(state),

        (DialogueState::ConsultDate { details, month }, Button::Date(date)) => {
            if date < ctx.today {
                Transition::to(DialogueState::ConsultDate { details, month })
                    .with_screen(Screen::PastDate { month })
            } else {
                Transition::to(DialogueState::ConsultTime { details, date })
                    .with_screen(Screen::TimePicker { date })
                    .with_log("consult_date", date.format("%Y-%m-%d").to_string())
            }
        }
        (DialogueState::ConsultDate { details, .. }, Button::Month(month)) => {
            Transition::to(DialogueState::ConsultDate { details, month })
                .with_screen(Screen::CalendarPage { month })
        }
        (DialogueState::ConsultTime { details, .. }, Button::ChangeDate) => {
            let month = CalendarMonth::of(ctx.today);
            Transition::to(DialogueState::ConsultDate { details, month })
                .with_screen(Screen::DatePicker { month })
        }
        (DialogueState::ConsultTime { details, date }, Button::Time(slot)) => {
            if is_time_slot(&slot) {
                complete_booking(details, date, slot)
            } else {
                Transition::to(DialogueState::ConsultTime { details, date })
            }
        }

        // Buttons of another phase, typically from an old message
        (state, button) => {
            debug!(state = state.name(), button = ?button, "Ignoring stale button");
            Transition::to(state)
        }
    }
}

fn complete_booking(details: ContactDetails, date: NaiveDate, time: String) -> Transition {
    let request = ConsultationRequest {
        name: details.name,
        role: details.role,
        contact: details.contact,
        date,
        time: time.clone(),
    };
    Transition::to(DialogueState::MainMenu)
        .with_log(
            "consult_completed",
            format!("{} {}", date.format("%Y-%m-%d"), time),
        )
        .with_screen(Screen::ConsultConfirmed { date, time })
        .with_profile(ProfileUpdate::Increment(Counter::ConsultationsRequested))
        .with_record(Record::Consultation(request.clone()))
        .with_operator_notice(request)
}

/// Split a state into a quiz engine and the state to restore when the
/// engine refuses the event
fn quiz_engine_for(state: DialogueState) -> (QuizEngine, Option<DialogueState>) {
    match state {
        DialogueState::QuizQuestion { run } => (QuizEngine::resume(run), None),
        other => (QuizEngine::default(), Some(other)),
    }
}

fn restore(engine: QuizEngine, other: Option<DialogueState>) -> DialogueState {
    match (other, engine.into_run()) {
        (Some(state), _) => state,
        (None, Some(run)) => DialogueState::QuizQuestion { run },
        (None, None) => DialogueState::MainMenu,
    }
}

fn on_quiz_answer(state: DialogueState, choice: usize) -> Transition {
    let (mut engine, other) = quiz_engine_for(state);
    match engine.answer(choice) {
        Ok(outcome) if outcome.is_last => match engine.advance() {
            Ok(Advance::Finished(summary)) => finish_quiz(summary),
            unfinished => {
                debug!(result = ?unfinished, "Quiz could not be finalized");
                Transition::to(restore(engine, other))
            }
        },
        Ok(outcome) => Transition::to(restore(engine, other))
            .with_screen(Screen::QuizFeedback(outcome))
            .with_log("quiz_answer", format!("{}:{}", outcome.question, choice)),
        Err(e) => {
            debug!(error = %e, "Quiz answer rejected");
            Transition::to(restore(engine, other))
        }
    }
}

fn on_quiz_next(state: DialogueState) -> Transition {
    let (mut engine, other) = quiz_engine_for(state);
    match engine.advance() {
        Ok(Advance::Next(run)) => {
            let index = run.current_index();
            Transition::to(DialogueState::QuizQuestion { run })
                .with_screen(Screen::QuizQuestion { index })
        }
        Ok(Advance::Finished(summary)) => finish_quiz(summary),
        Err(e) => {
            debug!(error = %e, "Quiz advance rejected");
            Transition::to(restore(engine, other))
        }
    }
}

fn finish_quiz(summary: QuizSummary) -> Transition {
    let attempt = QuizAttempt {
        score: summary.score,
        max_score: summary.max_score,
    };
    Transition::to(DialogueState::MainMenu)
        .with_log(
            "quiz_completed",
            format!("{}/{}", summary.score, summary.max_score),
        )
        .with_screen(Screen::QuizResult(summary))
        .with_profile(ProfileUpdate::Increment(Counter::QuizzesCompleted))
        .with_record(Record::QuizAttempt(attempt))
}

fn on_text(state: DialogueState, text: String, ctx: &TransitionContext) -> Transition {
    match state {
        DialogueState::AwaitingUpload => on_upload(
            DialogueState::AwaitingUpload,
            UploadKind::Text {
                length: text.chars().count(),
            },
        ),

        DialogueState::ConsultName => match validate_text_input(&text) {
            Ok(name) => Transition::to(DialogueState::ConsultRole { name: name.clone() })
                .with_screen(Screen::ConsultRolePrompt { name: name.clone() })
                .with_profile(ProfileUpdate::SetField(ProfileField::Name, name.clone()))
                .with_log("consult_name", name),
            Err(e) => Transition::to(DialogueState::ConsultName).with_screen(Screen::InvalidText(e)),
        },
        DialogueState::ConsultRole { name } => match validate_text_input(&text) {
            Ok(role) => Transition::to(DialogueState::ConsultContact {
                name,
                role: role.clone(),
            })
            .with_screen(Screen::ConsultContactPrompt)
            .with_log("consult_role", role),
            Err(e) => Transition::to(DialogueState::ConsultRole { name })
                .with_screen(Screen::InvalidText(e)),
        },
        DialogueState::ConsultContact { name, role } => match validate_text_input(&text) {
            Ok(contact) => {
                let month = CalendarMonth::of(ctx.today);
                Transition::to(DialogueState::ConsultDate {
                    details: ContactDetails {
                        name,
                        role,
                        contact: contact.clone(),
                    },
                    month,
                })
                .with_screen(Screen::DatePicker { month })
                .with_log("consult_contact", contact)
            }
            Err(e) => Transition::to(DialogueState::ConsultContact { name, role })
                .with_screen(Screen::InvalidText(e)),
        },

        DialogueState::CalcCplBudget => match parse_amount(&text) {
            Ok(budget) => Transition::to(DialogueState::CalcCplLeads { budget })
                .with_screen(Screen::CplLeadsPrompt { budget }),
            Err(_) => Transition::to(DialogueState::CalcCplBudget)
                .with_screen(Screen::InvalidNumber(NumberField::Budget)),
        },
        DialogueState::CalcCplLeads { budget } => {
            let report = parse_lead_count(&text).and_then(|leads| CplReport::compute(budget, leads));
            match report {
                Ok(report) => {
                    let payload = format!("budget={} leads={}", report.budget, report.leads);
                    Transition::to(DialogueState::MainMenu)
                        .with_screen(Screen::CplResult(report))
                        .with_log("calc_cpl", payload)
                }
                Err(MetricError::ZeroLeads) => {
                    Transition::to(DialogueState::CalcCplLeads { budget }).with_screen(Screen::ZeroLeads)
                }
                Err(MetricError::TooLarge(max)) => Transition::to(DialogueState::CalcCplLeads { budget })
                    .with_screen(Screen::TooManyLeads { max }),
                Err(_) => Transition::to(DialogueState::CalcCplLeads { budget })
                    .with_screen(Screen::InvalidNumber(NumberField::Leads)),
            }
        }
        DialogueState::CalcRoasSpend => match parse_amount(&text) {
            Ok(spend) if spend == 0.0 => {
                Transition::to(DialogueState::CalcRoasSpend).with_screen(Screen::ZeroSpend)
            }
            Ok(spend) => Transition::to(DialogueState::CalcRoasRevenue { spend })
                .with_screen(Screen::RoasRevenuePrompt { spend }),
            Err(_) => Transition::to(DialogueState::CalcRoasSpend)
                .with_screen(Screen::InvalidNumber(NumberField::Spend)),
        },
        DialogueState::CalcRoasRevenue { spend } => {
            let report = parse_amount(&text).and_then(|revenue| RoasReport::compute(spend, revenue));
            match report {
                Ok(report) => {
                    let payload = format!("spend={} revenue={}", report.spend, report.revenue);
                    Transition::to(DialogueState::MainMenu)
                        .with_screen(Screen::RoasResult(report))
                        .with_log("calc_roas", payload)
                }
                Err(MetricError::ZeroSpend) => {
                    Transition::to(DialogueState::CalcRoasSpend).with_screen(Screen::ZeroSpend)
                }
                Err(_) => Transition::to(DialogueState::CalcRoasRevenue { spend })
                    .with_screen(Screen::InvalidNumber(NumberField::Revenue)),
            }
        }

        other => Transition::to(other).with_screen(Screen::UseButtons),
    }
}

fn on_upload(state: DialogueState, upload: UploadKind) -> Transition {
    match state {
        DialogueState::AwaitingUpload => {
            let label = upload.label();
            Transition::to(DialogueState::UploadTypeChosen { upload })
                .with_screen(Screen::UploadReceived)
                .with_profile(ProfileUpdate::Increment(Counter::FilesUploaded))
                .with_log("upload_received", label)
        }
        other => Transition::to(other).with_screen(Screen::UseButtons),
    }
}

//! UI Builder module for creating keyboards and formatting messages

use chrono::{Datelike, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::analysis::{progress_bar, MaterialType};
use crate::db::ConsultationRequest;
use crate::dialogue::{CalendarMonth, TextInputError, MAX_TEXT_LEN, TIME_SLOTS};
use crate::localization::{t, t_args};
use crate::materials::Material;
use crate::metrics::{CplBand, CplReport, RoasBand, RoasReport, ROAS_BAR_CELLS};
use crate::profile::{BusinessType, UserProfile};
use crate::quiz::{question_count, AnswerOutcome, QuizLevel, QuizSummary, QUESTIONS};

use super::dialogue_manager::{NumberField, Screen};
use super::event::{Button, CalcKind, MenuAction, Topic};

/// Text and optional inline keyboard of one outbound message
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Rendered {
    fn text(text: String) -> Self {
        Self { text, keyboard: None }
    }

    fn with_keyboard(text: String, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text,
            keyboard: Some(keyboard),
        }
    }
}

/// User data some screens are personalised with
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewContext<'a> {
    pub profile: Option<&'a UserProfile>,
    pub first_name: Option<&'a str>,
}

/// Render a screen to message text and keyboard
pub fn render_screen(screen: &Screen, view: &ViewContext) -> Rendered {
    match screen {
        Screen::Welcome => Rendered::with_keyboard(
            t_args("welcome", &[("name", &display_name(view))]),
            main_menu_keyboard(),
        ),
        Screen::MainMenu => Rendered::with_keyboard(t("main-menu"), main_menu_keyboard()),
        Screen::Help => Rendered::text(t("help")),
        Screen::Cancelled => Rendered::text(t("cancelled")),
        Screen::Ended => Rendered::text(t("ended-hint")),
        Screen::UseButtons => Rendered::text(t("use-buttons")),
        Screen::Unsupported => Rendered::text(t("unsupported")),
        Screen::UnknownCommand => Rendered::text(t("unknown-command")),

        Screen::BusinessChoice => Rendered::with_keyboard(t("business-choice"), business_keyboard()),
        Screen::TopicMenu { business } => Rendered::with_keyboard(
            t_args("topic-menu", &[("business", &business_label(*business))]),
            topics_keyboard(),
        ),
        Screen::TopicAnswer(topic) => Rendered::with_keyboard(
            t(&format!("topic-{}-answer", topic.code())),
            topic_answer_keyboard(),
        ),

        Screen::Materials => Rendered::with_keyboard(t("materials-menu"), materials_keyboard()),

        Screen::UploadPrompt => Rendered::with_keyboard(t("upload-prompt"), back_to_main_keyboard()),
        Screen::UploadReprompt => Rendered::text(t("upload-reprompt")),
        Screen::UploadReceived => Rendered::with_keyboard(t("upload-received"), upload_type_keyboard()),
        Screen::Analysis(kind) => Rendered::with_keyboard(analysis_report_text(*kind), post_analysis_keyboard()),

        Screen::Calculator => Rendered::with_keyboard(t("calculator-menu"), calculator_keyboard()),
        Screen::CplBudgetPrompt => Rendered::text(t("cpl-budget-prompt")),
        Screen::CplLeadsPrompt { budget } => Rendered::text(t_args(
            "cpl-leads-prompt",
            &[("budget", &format_amount(*budget))],
        )),
        Screen::CplResult(report) => Rendered::with_keyboard(cpl_result_text(report), calc_result_keyboard()),
        Screen::RoasSpendPrompt => Rendered::text(t("roas-spend-prompt")),
        Screen::RoasRevenuePrompt { spend } => Rendered::text(t_args(
            "roas-revenue-prompt",
            &[("spend", &format_amount(*spend))],
        )),
        Screen::RoasResult(report) => Rendered::with_keyboard(roas_result_text(report), calc_result_keyboard()),
        Screen::InvalidNumber(field) => Rendered::text(t(match field {
            NumberField::Budget => "invalid-budget",
            NumberField::Leads => "invalid-leads",
            NumberField::Spend => "invalid-spend",
            NumberField::Revenue => "invalid-revenue",
        })),
        Screen::ZeroLeads => Rendered::text(t("zero-leads")),
        Screen::TooManyLeads { max } => Rendered::text(t_args("too-many-leads", &[("max", &max.to_string())])),
        Screen::ZeroSpend => Rendered::text(t("zero-spend")),

        Screen::QuizIntro => Rendered::with_keyboard(
            t_args("quiz-intro", &[("count", &question_count().to_string())]),
            quiz_intro_keyboard(),
        ),
        Screen::QuizQuestion { index } => Rendered::with_keyboard(
            quiz_question_text(*index),
            quiz_question_keyboard(*index),
        ),
        Screen::QuizFeedback(outcome) => Rendered::with_keyboard(
            quiz_feedback_text(outcome),
            single_button_keyboard("btn-quiz-next", Button::QuizNext),
        ),
        Screen::QuizResult(summary) => Rendered::with_keyboard(quiz_result_text(summary), quiz_result_keyboard()),

        Screen::ConsultNamePrompt => Rendered::text(t("consult-name-prompt")),
        Screen::ConsultRolePrompt { name } => Rendered::text(t_args("consult-role-prompt", &[("name", name)])),
        Screen::ConsultContactPrompt => Rendered::text(t("consult-contact-prompt")),
        Screen::InvalidText(TextInputError::Empty) => Rendered::text(t("text-empty")),
        Screen::InvalidText(TextInputError::TooLong) => Rendered::text(t_args(
            "text-too-long",
            &[("max", &MAX_TEXT_LEN.to_string())],
        )),
        Screen::DatePicker { month } | Screen::CalendarPage { month } => {
            Rendered::with_keyboard(t("date-picker"), calendar_keyboard(*month))
        }
        Screen::PastDate { month } => Rendered::with_keyboard(t("past-date"), calendar_keyboard(*month)),
        Screen::TimePicker { date } => Rendered::with_keyboard(
            t_args("time-picker", &[("date", &format_date_long(*date))]),
            time_slots_keyboard(),
        ),
        Screen::ConsultConfirmed { date, time } => Rendered::with_keyboard(
            t_args(
                "consult-confirmed",
                &[("date", &format_date_long(*date)), ("time", time)],
            ),
            back_to_main_keyboard(),
        ),

        Screen::Stats => Rendered::with_keyboard(stats_text(view.profile), back_to_main_keyboard()),
    }
}

/// Greeting name: stored profile name, then Telegram first name
fn display_name(view: &ViewContext) -> String {
    view.profile
        .and_then(|p| p.name.as_deref())
        .or(view.first_name)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| t("default-name"))
}

pub fn business_label(business: BusinessType) -> String {
    t(&format!("business-{}", business.code()))
}

/// Format a money amount rounded to whole units with `,` thousand separators
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `16 жовтня 2026`
pub fn format_date_long(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        t(&format!("month-genitive-{}", date.month())),
        date.year()
    )
}

fn button(key: &str, button: Button) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(t(key), button.data())
}

fn single_button_keyboard(key: &str, target: Button) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(key, target)]])
}

pub fn back_to_main_keyboard() -> InlineKeyboardMarkup {
    single_button_keyboard("btn-main-menu", Button::BackToMain)
}

/// Main menu keyboard
pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("btn-topics", Button::Menu(MenuAction::Topics)),
            button("btn-materials", Button::Menu(MenuAction::Materials)),
        ],
        vec![
            button("btn-upload", Button::Menu(MenuAction::Upload)),
            button("btn-calculator", Button::Menu(MenuAction::Calculator)),
        ],
        vec![
            button("btn-consult", Button::Menu(MenuAction::Consult)),
            button("btn-quiz", Button::Menu(MenuAction::Quiz)),
        ],
        vec![button("btn-stats", Button::Menu(MenuAction::Stats))],
    ])
}

fn business_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = BusinessType::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|b| InlineKeyboardButton::callback(business_label(*b), Button::Business(*b).data()))
                .collect()
        })
        .collect();
    rows.push(vec![button("btn-main-menu", Button::BackToMain)]);
    InlineKeyboardMarkup::new(rows)
}

fn topics_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Topic::ALL
        .iter()
        .map(|topic| {
            vec![InlineKeyboardButton::callback(
                t(&format!("topic-{}-button", topic.code())),
                Button::Topic(*topic).data(),
            )]
        })
        .collect();
    rows.push(vec![button("btn-consult", Button::Menu(MenuAction::Consult))]);
    rows.push(vec![button("btn-main-menu", Button::BackToMain)]);
    InlineKeyboardMarkup::new(rows)
}

fn topic_answer_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("btn-consult", Button::Menu(MenuAction::Consult)),
            button("btn-calculator", Button::Menu(MenuAction::Calculator)),
        ],
        vec![
            button("btn-other-topic", Button::Menu(MenuAction::Topics)),
            button("btn-main-menu", Button::BackToMain),
        ],
    ])
}

/// Materials keyboard, one guide per row
pub fn materials_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Material::ALL
        .iter()
        .map(|material| {
            vec![InlineKeyboardButton::callback(
                format!("📄 {}", t(material.title_key())),
                Button::Material(*material).data(),
            )]
        })
        .collect();
    rows.push(vec![button("btn-back", Button::BackToMain)]);
    InlineKeyboardMarkup::new(rows)
}

fn upload_type_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        MaterialType::ALL
            .iter()
            .map(|kind| vec![button(kind.label_key(), Button::UploadType(*kind))])
            .collect::<Vec<_>>(),
    )
}

fn post_analysis_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("btn-upload-again", Button::Menu(MenuAction::Upload)),
            button("btn-consult", Button::Menu(MenuAction::Consult)),
        ],
        vec![button("btn-main-menu", Button::BackToMain)],
    ])
}

fn calculator_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("btn-calc-cpl", Button::Calc(CalcKind::Cpl))],
        vec![button("btn-calc-roas", Button::Calc(CalcKind::Roas))],
        vec![button("btn-back", Button::BackToMain)],
    ])
}

fn calc_result_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("btn-calculator-again", Button::Menu(MenuAction::Calculator))],
        vec![button("btn-consult", Button::Menu(MenuAction::Consult))],
        vec![button("btn-main-menu", Button::BackToMain)],
    ])
}

fn quiz_intro_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("btn-quiz-start", Button::QuizStart)],
        vec![button("btn-back", Button::BackToMain)],
    ])
}

/// One button per answer option of a question
pub fn quiz_question_keyboard(index: usize) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = QUESTIONS
        .get(index)
        .map(|question| {
            question
                .options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    vec![InlineKeyboardButton::callback(
                        option.to_string(),
                        Button::QuizAnswer(i).data(),
                    )]
                })
                .collect()
        })
        .unwrap_or_default();
    InlineKeyboardMarkup::new(rows)
}

fn quiz_result_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("btn-quiz-again", Button::QuizStart),
            button("btn-materials", Button::Menu(MenuAction::Materials)),
        ],
        vec![button("btn-consult", Button::Menu(MenuAction::Consult))],
        vec![button("btn-main-menu", Button::BackToMain)],
    ])
}

/// Month grid with navigation; empty cells and headers are inert
pub fn calendar_keyboard(month: CalendarMonth) -> InlineKeyboardMarkup {
    let inert = |text: String| InlineKeyboardButton::callback(text, Button::Ignore.data());

    let mut rows = vec![vec![inert(format!(
        "📅 {} {}",
        t(&format!("month-{}", month.month)),
        month.year
    ))]];

    rows.push(
        t("calendar-weekdays")
            .split_whitespace()
            .map(|day| inert(day.to_string()))
            .collect(),
    );

    for week in month.weeks() {
        rows.push(
            week.iter()
                .map(|day| {
                    match day.and_then(|d| NaiveDate::from_ymd_opt(month.year, month.month, d)) {
                        Some(date) => InlineKeyboardButton::callback(
                            date.day().to_string(),
                            Button::Date(date).data(),
                        ),
                        None => inert(" ".to_string()),
                    }
                })
                .collect(),
        );
    }

    rows.push(vec![
        InlineKeyboardButton::callback("◀️", Button::Month(month.prev()).data()),
        button("btn-cancel", Button::BackToMain),
        InlineKeyboardButton::callback("▶️", Button::Month(month.next()).data()),
    ]);

    InlineKeyboardMarkup::new(rows)
}

/// Time slots two per row, then "change date"
pub fn time_slots_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = TIME_SLOTS
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|slot| InlineKeyboardButton::callback(*slot, Button::Time(slot.to_string()).data()))
                .collect()
        })
        .collect();
    rows.push(vec![button("btn-change-date", Button::ChangeDate)]);
    InlineKeyboardMarkup::new(rows)
}

/// One frame of the analysis progress animation
pub fn analysis_progress_text(percent: u8, status: &str) -> String {
    t_args(
        "analysis-progress",
        &[
            ("bar", &format!("[{}]", progress_bar(percent))),
            ("percent", &percent.to_string()),
            ("status", status),
        ],
    )
}

pub fn analysis_report_text(kind: MaterialType) -> String {
    let report = kind.report();
    t_args(
        "analysis-report",
        &[
            ("kind", &t(kind.label_key())),
            ("score", &format!("{:.1}", report.score)),
            ("stars", &report.stars()),
            ("good", &report.good.join("\n")),
            ("improve", &report.improve.join("\n")),
            ("tips", &report.tips.join("\n")),
        ],
    )
}

pub fn cpl_result_text(report: &CplReport) -> String {
    let band = match report.band {
        CplBand::Excellent => "excellent",
        CplBand::Good => "good",
        CplBand::NeedsOptimization => "needs-optimization",
    };
    let roi = match report.forecast_roi {
        Some(roi) => t_args("cpl-roi-value", &[("roi", &format_amount(roi))]),
        None => t("cpl-roi-unavailable"),
    };
    t_args(
        "cpl-result",
        &[
            ("budget", &format_amount(report.budget)),
            ("leads", &report.leads.to_string()),
            ("cpl", &format_amount(report.cpl)),
            ("quality", &t(&format!("cpl-quality-{}", band))),
            ("comment", &t(&format!("cpl-comment-{}", band))),
            ("patients", &report.forecast.patients.to_string()),
            ("revenue", &format_amount(report.forecast.revenue as f64)),
            ("roi", &roi),
        ],
    )
}

pub fn roas_result_text(report: &RoasReport) -> String {
    let band = match report.band {
        RoasBand::Excellent => "excellent",
        RoasBand::Good => "good",
        RoasBand::NeedsImprovement => "needs-improvement",
    };
    let filled = report.bar_cells();
    let bar = format!("[{}{}]", "▓".repeat(filled), "░".repeat(ROAS_BAR_CELLS - filled));
    t_args(
        "roas-result",
        &[
            ("spend", &format_amount(report.spend)),
            ("revenue", &format_amount(report.revenue)),
            ("roas", &format_amount(report.roas)),
            ("quality", &t(&format!("roas-quality-{}", band))),
            ("bar", &bar),
            ("profit", &format_amount(report.profit)),
            ("roi", &format_amount(report.roi)),
            ("comment", &t(&format!("roas-comment-{}", band))),
        ],
    )
}

fn quiz_question_text(index: usize) -> String {
    let question = QUESTIONS.get(index).map(|q| q.text).unwrap_or_default();
    t_args(
        "quiz-question",
        &[
            ("number", &(index + 1).to_string()),
            ("total", &question_count().to_string()),
            ("question", question),
        ],
    )
}

fn quiz_verdict(question: usize, correct: bool) -> String {
    if correct {
        return t("quiz-correct");
    }
    let answer = QUESTIONS.get(question).map(|q| q.correct_option()).unwrap_or_default();
    t_args("quiz-wrong", &[("answer", answer)])
}

pub fn quiz_feedback_text(outcome: &AnswerOutcome) -> String {
    let explanation = QUESTIONS
        .get(outcome.question)
        .map(|q| q.explanation)
        .unwrap_or_default();
    t_args(
        "quiz-feedback",
        &[
            ("verdict", &quiz_verdict(outcome.question, outcome.correct)),
            ("explanation", explanation),
            ("score", &outcome.score.to_string()),
            ("answered", &outcome.answered.to_string()),
        ],
    )
}

pub fn quiz_result_text(summary: &QuizSummary) -> String {
    let level = match summary.level {
        QuizLevel::Expert => "expert",
        QuizLevel::Advanced => "advanced",
        QuizLevel::Intermediate => "intermediate",
        QuizLevel::Beginner => "beginner",
    };
    let advice = if summary.percentage < 70.0 {
        "quiz-advice-learn"
    } else {
        "quiz-advice-launch"
    };
    let last = summary
        .answers
        .last()
        .map(|answer| quiz_verdict(answer.question, answer.correct))
        .unwrap_or_default();
    let missed = summary.max_score.saturating_sub(summary.score) as usize;
    let stars = format!("{}{}", "⭐".repeat(summary.score as usize), "☆".repeat(missed));

    t_args(
        "quiz-result",
        &[
            ("last", &last),
            ("score", &summary.score.to_string()),
            ("total", &summary.max_score.to_string()),
            ("percentage", &format!("{:.0}", summary.percentage)),
            ("stars", &stars),
            ("level", &t(&format!("quiz-level-{}", level))),
            ("comment", &t(&format!("quiz-comment-{}", level))),
            ("advice", &t(advice)),
        ],
    )
}

pub fn stats_text(profile: Option<&UserProfile>) -> String {
    let fallback;
    let profile = match profile {
        Some(profile) => profile,
        None => {
            fallback = UserProfile::default();
            &fallback
        }
    };

    let name = profile.name.clone().unwrap_or_else(|| t("not-specified"));
    let business = match (profile.business(), profile.business_type.as_deref()) {
        (Some(business), _) => business_label(business),
        (None, Some(raw)) if !raw.is_empty() => raw.to_string(),
        _ => t("not-specified"),
    };
    let badges = profile
        .badges()
        .iter()
        .map(|badge| t(badge.key()))
        .collect::<Vec<_>>()
        .join(" ");

    t_args(
        "stats",
        &[
            ("name", &name),
            ("business", &business),
            ("files", &profile.files_uploaded.to_string()),
            ("materials", &profile.materials_downloaded.to_string()),
            ("consultations", &profile.consultations_requested.to_string()),
            ("quizzes", &profile.quizzes_completed.to_string()),
            ("badges", &badges),
        ],
    )
}

/// Caption attached to a delivered material
pub fn material_caption(material: Material) -> String {
    t_args("material-caption", &[("title", &t(material.title_key()))])
}

/// File name shown to the user for a delivered material
pub fn material_file_name(material: Material) -> String {
    format!("{}.pdf", t(material.title_key()))
}

/// Message for the operator channel about a new booking
pub fn operator_notice_text(request: &ConsultationRequest, user_id: i64, username: Option<&str>) -> String {
    let username = match username {
        Some(name) => format!("@{}", name),
        None => t("no-username"),
    };
    t_args(
        "operator-notice",
        &[
            ("name", &request.name),
            ("role", &request.role),
            ("contact", &request.contact),
            ("date", &request.date.format("%Y-%m-%d").to_string()),
            ("time", &request.time),
            ("user_id", &user_id.to_string()),
            ("username", &username),
        ],
    )
}

use anyhow::Result;
use chrono::NaiveDate;

use medici_bot::analysis::{MaterialType, UploadKind};
use medici_bot::bot::dialogue_manager::{
    transition, NumberField, ProfileUpdate, Record, Reply, Screen, Transition, TransitionContext,
};
use medici_bot::bot::event::{Button, CalcKind, Command, Event, MenuAction, Topic};
use medici_bot::db::{ConsultationRequest, QuizAttempt};
use medici_bot::dialogue::{CalendarMonth, ContactDetails, DialogueState, TextInputError};
use medici_bot::materials::Material;
use medici_bot::metrics::{CplBand, RoasBand, MAX_LEADS};
use medici_bot::profile::{BusinessType, Counter, ProfileField};
use medici_bot::quiz::{QuizLevel, QuizRun, QUESTIONS};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn step(state: DialogueState, event: Event) -> Transition {
    transition(state, event, &TransitionContext { today: today() })
}

fn text(input: &str) -> Event {
    Event::Text(input.to_string())
}

fn press(button: Button) -> Event {
    Event::Button(button)
}

fn assert_no_effects(t: &Transition) {
    assert_eq!(t.profile, None);
    assert_eq!(t.log, None);
    assert_eq!(t.record, None);
    assert_eq!(t.notify_operator, None);
}

fn details() -> ContactDetails {
    ContactDetails {
        name: "Олена".to_string(),
        role: "лікар".to_string(),
        contact: "@olena".to_string(),
    }
}

/// /start greets, touches the profile and lands in the main menu
#[test]
fn test_start_enters_main_menu() {
    let t = step(DialogueState::Ended, Event::Command(Command::Start));

    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::Welcome));
    assert_eq!(t.profile, Some(ProfileUpdate::Touch));
    assert_eq!(t.log.as_ref().map(|l| l.action), Some("start"));
}

/// /start in the middle of a flow discards the flow
#[test]
fn test_start_is_reentrant() {
    let t = step(
        DialogueState::CalcCplLeads { budget: 5000.0 },
        Event::Command(Command::Start),
    );
    assert_eq!(t.next, DialogueState::MainMenu);
}

/// /cancel ends the conversation from any state
#[test]
fn test_cancel_from_any_state() {
    let states = vec![
        DialogueState::MainMenu,
        DialogueState::ConsultName,
        DialogueState::CalcRoasRevenue { spend: 100.0 },
        DialogueState::QuizQuestion { run: QuizRun::start() },
        DialogueState::Ended,
    ];
    for state in states {
        let t = step(state, Event::Command(Command::Cancel));
        assert_eq!(t.next, DialogueState::Ended);
        assert_eq!(t.screen(), Some(&Screen::Cancelled));
    }
}

/// An ended conversation only answers with the /start hint
#[test]
fn test_ended_state_hints_start() {
    for event in [
        text("hello"),
        press(Button::Menu(MenuAction::Stats)),
        Event::Upload(UploadKind::Photo),
    ] {
        let t = step(DialogueState::Ended, event);
        assert_eq!(t.next, DialogueState::Ended);
        assert_eq!(t.screen(), Some(&Screen::Ended));
        assert_no_effects(&t);
    }
}

/// Commands work from any state, /help leaves it untouched
#[test]
fn test_commands_from_any_state() {
    let t = step(DialogueState::ConsultName, Event::Command(Command::Help));
    assert_eq!(t.next, DialogueState::ConsultName);
    assert_eq!(t.screen(), Some(&Screen::Help));

    let t = step(DialogueState::Ended, Event::Command(Command::Menu));
    assert_eq!(t.next, DialogueState::MaterialsMenu);
    assert_eq!(t.screen(), Some(&Screen::Materials));

    let t = step(DialogueState::Ended, Event::Command(Command::Stats));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::Stats));

    let t = step(DialogueState::CalcCplBudget, Event::Command(Command::Quiz));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::QuizIntro));

    let t = step(DialogueState::AwaitingUpload, Event::Command(Command::Calculator));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::Calculator));
}

/// Full CPL calculation: budget, leads, report
#[test]
fn test_cpl_flow() -> Result<()> {
    let t = step(DialogueState::MainMenu, press(Button::Calc(CalcKind::Cpl)));
    assert_eq!(t.next, DialogueState::CalcCplBudget);
    assert_eq!(t.screen(), Some(&Screen::CplBudgetPrompt));

    let t = step(t.next, text("5 000"));
    assert_eq!(t.next, DialogueState::CalcCplLeads { budget: 5000.0 });

    let t = step(t.next, text("10"));
    assert_eq!(t.next, DialogueState::MainMenu);
    match t.screen() {
        Some(Screen::CplResult(report)) => {
            assert_eq!(report.cpl, 500.0);
            assert_eq!(report.band, CplBand::Good);
            assert_eq!(report.forecast.patients, 3);
            assert_eq!(report.forecast.revenue, 4500);
            assert_eq!(report.forecast_roi, Some(-10.0));
        }
        other => panic!("Unexpected screen: {:?}", other),
    }
    assert_eq!(t.log.as_ref().map(|l| l.action), Some("calc_cpl"));

    Ok(())
}

/// Bad numbers re-prompt in place without any durable write
#[test]
fn test_invalid_numbers_reprompt() {
    let t = step(DialogueState::CalcCplBudget, text("багато"));
    assert_eq!(t.next, DialogueState::CalcCplBudget);
    assert_eq!(t.screen(), Some(&Screen::InvalidNumber(NumberField::Budget)));
    assert_no_effects(&t);

    let t = step(DialogueState::CalcCplBudget, text("-100"));
    assert_eq!(t.next, DialogueState::CalcCplBudget);

    let t = step(DialogueState::CalcCplLeads { budget: 700.0 }, text("2.5"));
    assert_eq!(t.next, DialogueState::CalcCplLeads { budget: 700.0 });
    assert_eq!(t.screen(), Some(&Screen::InvalidNumber(NumberField::Leads)));

    let t = step(DialogueState::CalcRoasRevenue { spend: 100.0 }, text("x"));
    assert_eq!(t.next, DialogueState::CalcRoasRevenue { spend: 100.0 });
    assert_eq!(t.screen(), Some(&Screen::InvalidNumber(NumberField::Revenue)));
}

/// Zero denominators never reach a division
#[test]
fn test_zero_denominators_are_rejected() {
    let t = step(DialogueState::CalcCplLeads { budget: 700.0 }, text("0"));
    assert_eq!(t.next, DialogueState::CalcCplLeads { budget: 700.0 });
    assert_eq!(t.screen(), Some(&Screen::ZeroLeads));
    assert_no_effects(&t);

    let t = step(DialogueState::CalcRoasSpend, text("0"));
    assert_eq!(t.next, DialogueState::CalcRoasSpend);
    assert_eq!(t.screen(), Some(&Screen::ZeroSpend));
    assert_no_effects(&t);
}

/// A huge lead count re-prompts instead of overflowing the forecast
#[test]
fn test_lead_count_above_cap_reprompts() {
    let t = step(
        DialogueState::CalcCplLeads { budget: 5000.0 },
        Event::from_text("1000000000000000000"),
    );
    assert_eq!(t.next, DialogueState::CalcCplLeads { budget: 5000.0 });
    assert_eq!(t.screen(), Some(&Screen::TooManyLeads { max: MAX_LEADS }));
    assert_no_effects(&t);

    let t = step(t.next, Event::from_text("1 000 000"));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert!(matches!(t.screen(), Some(Screen::CplResult(_))));
}

/// Full ROAS calculation
#[test]
fn test_roas_flow() {
    let t = step(DialogueState::MainMenu, press(Button::Calc(CalcKind::Roas)));
    assert_eq!(t.next, DialogueState::CalcRoasSpend);

    let t = step(t.next, text("10000"));
    assert_eq!(t.next, DialogueState::CalcRoasRevenue { spend: 10000.0 });
    assert_eq!(t.screen(), Some(&Screen::RoasRevenuePrompt { spend: 10000.0 }));

    let t = step(t.next, text("50 000"));
    assert_eq!(t.next, DialogueState::MainMenu);
    match t.screen() {
        Some(Screen::RoasResult(report)) => {
            assert_eq!(report.roas, 500.0);
            assert_eq!(report.band, RoasBand::Excellent);
            assert_eq!(report.profit, 40000.0);
            assert_eq!(report.roi, 400.0);
            assert_eq!(report.bar_cells(), 10);
        }
        other => panic!("Unexpected screen: {:?}", other),
    }
}

/// A perfect quiz run ends in the main menu with a stored attempt
#[test]
fn test_quiz_full_run() {
    let t = step(DialogueState::MainMenu, press(Button::QuizStart));
    assert_eq!(t.screen(), Some(&Screen::QuizQuestion { index: 0 }));
    assert_eq!(t.next, DialogueState::QuizQuestion { run: QuizRun::start() });
    let mut state = t.next;

    for (i, question) in QUESTIONS.iter().enumerate() {
        let t = step(state, press(Button::QuizAnswer(question.correct)));
        if i + 1 < QUESTIONS.len() {
            match t.screen() {
                Some(Screen::QuizFeedback(outcome)) => {
                    assert!(outcome.correct);
                    assert_eq!(outcome.score as usize, i + 1);
                }
                other => panic!("Unexpected screen: {:?}", other),
            }
            assert_eq!(t.record, None);

            let t = step(t.next, press(Button::QuizNext));
            assert_eq!(t.screen(), Some(&Screen::QuizQuestion { index: i + 1 }));
            state = t.next;
        } else {
            assert_eq!(t.next, DialogueState::MainMenu);
            match t.screen() {
                Some(Screen::QuizResult(summary)) => {
                    assert_eq!(summary.score, 10);
                    assert_eq!(summary.level, QuizLevel::Expert);
                }
                other => panic!("Unexpected screen: {:?}", other),
            }
            assert_eq!(
                t.record,
                Some(Record::QuizAttempt(QuizAttempt {
                    score: 10,
                    max_score: 10
                }))
            );
            assert_eq!(t.profile, Some(ProfileUpdate::Increment(Counter::QuizzesCompleted)));
            assert_eq!(t.log.as_ref().map(|l| l.action), Some("quiz_completed"));
            return;
        }
    }
    panic!("Quiz never finished");
}

/// A second answer to the same question is ignored
#[test]
fn test_quiz_double_answer_is_ignored() {
    let t = step(DialogueState::QuizQuestion { run: QuizRun::start() }, press(Button::QuizAnswer(0)));
    let answered = t.next.clone();

    let t = step(answered.clone(), press(Button::QuizAnswer(1)));
    assert_eq!(t.next, answered);
    assert_eq!(t.reply, None);
}

/// Quiz buttons outside a running quiz change nothing
#[test]
fn test_quiz_buttons_without_quiz() {
    let t = step(DialogueState::MainMenu, press(Button::QuizAnswer(1)));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.reply, None);

    let t = step(DialogueState::QuizQuestion { run: QuizRun::start() }, press(Button::QuizNext));
    assert_eq!(t.next, DialogueState::QuizQuestion { run: QuizRun::start() });
    assert_eq!(t.reply, None);
}

/// Name, role, contact, date and time produce one booking
#[test]
fn test_consultation_flow() {
    let t = step(DialogueState::MainMenu, press(Button::Menu(MenuAction::Consult)));
    assert_eq!(t.next, DialogueState::ConsultName);

    let t = step(t.next, text("  Олена "));
    assert_eq!(t.next, DialogueState::ConsultRole { name: "Олена".to_string() });
    assert_eq!(
        t.profile,
        Some(ProfileUpdate::SetField(ProfileField::Name, "Олена".to_string()))
    );

    let t = step(t.next, text("лікар"));
    let t = step(t.next, text("@olena"));
    let october = CalendarMonth::new(2026, 10).unwrap();
    assert_eq!(
        t.next,
        DialogueState::ConsultDate { details: details(), month: october }
    );
    assert_eq!(t.screen(), Some(&Screen::DatePicker { month: october }));

    let t = step(t.next, press(Button::Month(october.next())));
    assert_eq!(t.screen(), Some(&Screen::CalendarPage { month: october.next() }));

    let date = NaiveDate::from_ymd_opt(2026, 11, 3).unwrap();
    let t = step(t.next, press(Button::Date(date)));
    assert_eq!(t.next, DialogueState::ConsultTime { details: details(), date });

    let t = step(t.next, press(Button::Time("13:00".to_string())));
    assert_eq!(t.next, DialogueState::ConsultTime { details: details(), date });
    assert_eq!(t.record, None);

    let t = step(t.next, press(Button::Time("10:00".to_string())));
    let request = ConsultationRequest {
        name: "Олена".to_string(),
        role: "лікар".to_string(),
        contact: "@olena".to_string(),
        date,
        time: "10:00".to_string(),
    };
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.record, Some(Record::Consultation(request.clone())));
    assert_eq!(t.notify_operator, Some(request));
    assert_eq!(t.profile, Some(ProfileUpdate::Increment(Counter::ConsultationsRequested)));
    assert_eq!(t.log.as_ref().map(|l| l.action), Some("consult_completed"));
}

/// Free-text answers are validated before they are kept
#[test]
fn test_consultation_text_validation() {
    let t = step(DialogueState::ConsultName, text("   "));
    assert_eq!(t.next, DialogueState::ConsultName);
    assert_eq!(t.screen(), Some(&Screen::InvalidText(TextInputError::Empty)));
    assert_no_effects(&t);

    let state = DialogueState::ConsultRole { name: "Олена".to_string() };
    let t = step(state.clone(), text(&"x".repeat(300)));
    assert_eq!(t.next, state);
    assert_eq!(t.screen(), Some(&Screen::InvalidText(TextInputError::TooLong)));
}

/// Past dates are refused, today is accepted
#[test]
fn test_past_dates_are_rejected() {
    let month = CalendarMonth::of(today());
    let state = DialogueState::ConsultDate { details: details(), month };

    let yesterday = today().pred_opt().unwrap();
    let t = step(state.clone(), press(Button::Date(yesterday)));
    assert_eq!(t.next, state);
    assert_eq!(t.screen(), Some(&Screen::PastDate { month }));

    let t = step(state, press(Button::Date(today())));
    assert_eq!(t.next, DialogueState::ConsultTime { details: details(), date: today() });
}

/// "Change date" goes back to the calendar of the current month
#[test]
fn test_change_date_returns_to_calendar() {
    let date = NaiveDate::from_ymd_opt(2027, 1, 5).unwrap();
    let t = step(
        DialogueState::ConsultTime { details: details(), date },
        press(Button::ChangeDate),
    );
    let month = CalendarMonth::of(today());
    assert_eq!(t.next, DialogueState::ConsultDate { details: details(), month });
    assert_eq!(t.screen(), Some(&Screen::DatePicker { month }));
}

/// Upload, type choice, analysis
#[test]
fn test_upload_flow() {
    let t = step(DialogueState::MainMenu, press(Button::Menu(MenuAction::Upload)));
    assert_eq!(t.next, DialogueState::AwaitingUpload);

    let t = step(t.next, Event::Upload(UploadKind::Photo));
    assert_eq!(t.next, DialogueState::UploadTypeChosen { upload: UploadKind::Photo });
    assert_eq!(t.profile, Some(ProfileUpdate::Increment(Counter::FilesUploaded)));
    assert_eq!(t.log.as_ref().map(|l| l.payload.as_str()), Some("photo"));

    let t = step(t.next, press(Button::UploadType(MaterialType::Banner)));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::Analysis(MaterialType::Banner)));
}

/// Free text counts as an upload, stickers and the like do not
#[test]
fn test_upload_accepts_text() {
    let t = step(DialogueState::AwaitingUpload, text("Знижка 20% на чистку зубів"));
    assert!(matches!(
        t.next,
        DialogueState::UploadTypeChosen { upload: UploadKind::Text { .. } }
    ));
    assert_eq!(t.profile, Some(ProfileUpdate::Increment(Counter::FilesUploaded)));

    let t = step(DialogueState::AwaitingUpload, Event::Unsupported);
    assert_eq!(t.next, DialogueState::AwaitingUpload);
    assert_eq!(t.screen(), Some(&Screen::UploadReprompt));
    assert_no_effects(&t);
}

/// Business type is stored as its code and kept through topic answers
#[test]
fn test_topic_dialog() {
    let t = step(DialogueState::MainMenu, press(Button::Menu(MenuAction::Topics)));
    assert_eq!(t.next, DialogueState::TopicDialog { business: None });
    assert_eq!(t.screen(), Some(&Screen::BusinessChoice));

    let t = step(t.next, press(Button::Business(BusinessType::Dental)));
    assert_eq!(
        t.profile,
        Some(ProfileUpdate::SetField(ProfileField::BusinessType, "dental".to_string()))
    );

    let t = step(t.next, press(Button::Topic(Topic::Seo)));
    assert_eq!(t.next, DialogueState::TopicDialog { business: Some(BusinessType::Dental) });
    assert_eq!(t.screen(), Some(&Screen::TopicAnswer(Topic::Seo)));
}

/// Picking a material asks for a document delivery
#[test]
fn test_material_request() {
    let t = step(DialogueState::MaterialsMenu, press(Button::Material(Material::CplRoasGuide)));
    assert_eq!(t.next, DialogueState::MaterialsMenu);
    assert_eq!(t.reply, Some(Reply::Document(Material::CplRoasGuide)));
    assert_eq!(t.profile, Some(ProfileUpdate::Increment(Counter::MaterialsDownloaded)));
}

/// Buttons of another phase are dropped silently
#[test]
fn test_stale_buttons_are_ignored() {
    let t = step(DialogueState::MaterialsMenu, press(Button::Calc(CalcKind::Cpl)));
    assert_eq!(t.next, DialogueState::MaterialsMenu);
    assert_eq!(t.reply, None);
    assert_no_effects(&t);

    let t = step(DialogueState::ConsultName, press(Button::Time("10:00".to_string())));
    assert_eq!(t.next, DialogueState::ConsultName);
    assert_eq!(t.reply, None);

    let t = step(DialogueState::MainMenu, press(Button::Ignore));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.reply, None);
}

/// Navigation buttons leave any active flow
#[test]
fn test_navigation_from_active_states() {
    let t = step(DialogueState::CalcCplLeads { budget: 1.0 }, press(Button::BackToMain));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::MainMenu));

    let t = step(
        DialogueState::QuizQuestion { run: QuizRun::start() },
        press(Button::Menu(MenuAction::Materials)),
    );
    assert_eq!(t.next, DialogueState::MaterialsMenu);
}

/// An unknown slash command is never taken as an answer
#[test]
fn test_unknown_command_keeps_state() {
    let states = vec![
        DialogueState::ConsultName,
        DialogueState::ConsultRole { name: "Олена".to_string() },
        DialogueState::AwaitingUpload,
        DialogueState::CalcCplBudget,
    ];
    for state in states {
        let t = step(state.clone(), Event::from_text("/strat"));
        assert_eq!(t.next, state);
        assert_eq!(t.screen(), Some(&Screen::UnknownCommand));
        assert_no_effects(&t);
    }

    let t = step(DialogueState::Ended, Event::from_text("/foo"));
    assert_eq!(t.next, DialogueState::Ended);
    assert_eq!(t.screen(), Some(&Screen::UnknownCommand));
}

/// Typing into a button-driven screen gets a hint
#[test]
fn test_text_in_button_state() {
    let t = step(DialogueState::MainMenu, text("привіт"));
    assert_eq!(t.next, DialogueState::MainMenu);
    assert_eq!(t.screen(), Some(&Screen::UseButtons));
    assert_no_effects(&t);
}

/// Session state survives a serde round trip mid-quiz
#[test]
fn test_state_serialization() -> Result<()> {
    let mut run = QuizRun::start();
    run.answer(2)?;
    let state = DialogueState::QuizQuestion { run };

    let json = serde_json::to_string(&state)?;
    let restored: DialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    Ok(())
}

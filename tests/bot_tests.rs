use anyhow::Result;
use chrono::NaiveDate;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};

use medici_bot::analysis::MaterialType;
use medici_bot::bot::dialogue_manager::Screen;
use medici_bot::bot::event::{Button, MenuAction};
use medici_bot::bot::ui_builder::{
    format_date_long, main_menu_keyboard, materials_keyboard, operator_notice_text,
    quiz_question_keyboard, render_screen, time_slots_keyboard, ViewContext,
};
use medici_bot::db::ConsultationRequest;
use medici_bot::dialogue::{CalendarMonth, TextInputError};
use medici_bot::materials::{Material, MaterialError};
use medici_bot::metrics::{CplReport, RoasReport};
use medici_bot::profile::{Counter, UserProfile};
use medici_bot::quiz::{QuizRun, QUESTIONS};

fn callback_data(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
    keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

fn render(screen: Screen) -> String {
    render_screen(&screen, &ViewContext::default()).text
}

/// Every button of every keyboard decodes back to a known button
#[test]
fn test_keyboards_use_known_callbacks() {
    let month = CalendarMonth::new(2026, 10).unwrap();
    let screens = vec![
        Screen::MainMenu,
        Screen::BusinessChoice,
        Screen::Materials,
        Screen::UploadReceived,
        Screen::Calculator,
        Screen::QuizIntro,
        Screen::QuizQuestion { index: 0 },
        Screen::DatePicker { month },
        Screen::TimePicker {
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        },
        Screen::Stats,
    ];
    for screen in screens {
        let rendered = render_screen(&screen, &ViewContext::default());
        let keyboard = rendered.keyboard.expect("screen has a keyboard");
        for data in callback_data(&keyboard) {
            assert!(data.len() <= 64);
            assert!(Button::parse(&data).is_some(), "unknown callback {data}");
        }
    }
}

/// Main menu offers every section
#[test]
fn test_main_menu_keyboard() {
    let data = callback_data(&main_menu_keyboard());
    for action in [
        MenuAction::Topics,
        MenuAction::Materials,
        MenuAction::Upload,
        MenuAction::Calculator,
        MenuAction::Consult,
        MenuAction::Quiz,
        MenuAction::Stats,
    ] {
        assert!(data.contains(&Button::Menu(action).data()));
    }
}

/// Welcome prefers the stored name over the Telegram first name
#[test]
fn test_welcome_uses_display_name() {
    let profile = UserProfile {
        name: Some("Олена".to_string()),
        ..UserProfile::new(1)
    };

    let text = render_screen(
        &Screen::Welcome,
        &ViewContext {
            profile: Some(&profile),
            first_name: Some("Olena"),
        },
    )
    .text;
    assert!(text.starts_with("Привіт, Олена!"));

    let text = render_screen(
        &Screen::Welcome,
        &ViewContext {
            profile: None,
            first_name: Some("Olena"),
        },
    )
    .text;
    assert!(text.starts_with("Привіт, Olena!"));

    assert!(render(Screen::Welcome).starts_with("Привіт, Користувач!"));
}

/// CPL result shows rounded amounts, band and forecast
#[test]
fn test_cpl_result_text() -> Result<()> {
    let report = CplReport::compute(5000.0, 10)?;
    let text = render(Screen::CplResult(report));

    assert!(text.contains("Бюджет: 5,000 грн"));
    assert!(text.contains("CPL: 500 грн 🟡 Добре"));
    assert!(text.contains("Пацієнтів: ~3"));
    assert!(text.contains("Потенційний дохід: ~4,500 грн"));
    assert!(text.contains("ROI: ~-10%"));

    let text = render(Screen::CplResult(CplReport::compute(0.0, 5)?));
    assert!(text.contains("ROI: —"));

    Ok(())
}

/// ROAS result shows a capped bar
#[test]
fn test_roas_result_text() -> Result<()> {
    let report = RoasReport::compute(1000.0, 20000.0)?;
    let text = render(Screen::RoasResult(report));

    assert!(text.contains("ROAS: 2,000% 🟢 Відмінно!"));
    assert!(text.contains(&format!("[{}]", "▓".repeat(20))));
    assert!(text.contains("Прибуток: 19,000 грн"));

    let text = render(Screen::RoasResult(RoasReport::compute(1000.0, 1500.0)?));
    assert!(text.contains("🔴 Потребує покращення"));
    assert!(text.contains(&format!("[{}{}]", "▓".repeat(3), "░".repeat(17))));

    Ok(())
}

/// A wrong answer reveals the correct option
#[test]
fn test_quiz_feedback_text() -> Result<()> {
    let mut run = QuizRun::start();
    let outcome = run.answer(0)?;
    let text = render(Screen::QuizFeedback(outcome));

    assert!(text.contains(&format!(
        "Правильна відповідь: {}",
        QUESTIONS[0].correct_option()
    )));
    assert!(text.contains("Твій рахунок: 0/1"));

    Ok(())
}

/// Each question has one button per option
#[test]
fn test_quiz_question_keyboard() {
    let keyboard = quiz_question_keyboard(3);
    assert_eq!(keyboard.inline_keyboard.len(), QUESTIONS[3].options.len());
    assert_eq!(callback_data(&keyboard)[2], Button::QuizAnswer(2).data());
    assert!(quiz_question_keyboard(99).inline_keyboard.is_empty());
}

/// Invalid text answers explain the limit
#[test]
fn test_invalid_text_screens() {
    assert!(render(Screen::InvalidText(TextInputError::TooLong)).contains("255"));
    assert!(render(Screen::InvalidText(TextInputError::Empty)).contains("порожньою"));
}

/// Dates are spelled with the genitive month name
#[test]
fn test_format_date_long() {
    let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    assert_eq!(format_date_long(date), "16 жовтня 2026");

    let text = render(Screen::ConsultConfirmed {
        date,
        time: "14:00".to_string(),
    });
    assert!(text.contains("Дата: 16 жовтня 2026"));
    assert!(text.contains("Час: 14:00"));
}

/// Time picker offers every slot and a way back to the calendar
#[test]
fn test_time_slots_keyboard() {
    let data = callback_data(&time_slots_keyboard());
    assert_eq!(data.len(), 9);
    assert!(data.contains(&"time:09:00".to_string()));
    assert_eq!(data.last(), Some(&Button::ChangeDate.data()));
}

/// The operator notice carries every booking field
#[test]
fn test_operator_notice_text() {
    let request = ConsultationRequest {
        name: "Олена".to_string(),
        role: "клініка".to_string(),
        contact: "+380501234567".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        time: "10:00".to_string(),
    };

    let text = operator_notice_text(&request, 12345, Some("olena"));
    assert!(text.contains("Ім'я: Олена"));
    assert!(text.contains("Контакт: +380501234567"));
    assert!(text.contains("Дата: 2026-10-20"));
    assert!(text.contains("Telegram ID: 12345"));
    assert!(text.contains("Username: @olena"));

    let text = operator_notice_text(&request, 12345, None);
    assert!(text.contains("Username: немає"));
}

/// Stats list counters and earned badges
#[test]
fn test_stats_text() {
    let mut profile = UserProfile {
        name: Some("Олена".to_string()),
        business_type: Some("dental".to_string()),
        ..UserProfile::new(1)
    };
    profile.files_uploaded = 1;
    profile.quizzes_completed = 2;

    let text = render_screen(
        &Screen::Stats,
        &ViewContext {
            profile: Some(&profile),
            first_name: None,
        },
    )
    .text;
    assert!(text.contains("Тип бізнесу: 🦷 Стоматологія"));
    assert!(text.contains(&format!("Файлів завантажено: {}", profile.counter(Counter::FilesUploaded))));
    assert!(text.contains("📎 Перший файл"));
    assert!(text.contains("🧠 Ерудит"));
    assert!(!text.contains("Новачок"));

    let text = render(Screen::Stats);
    assert!(text.contains("Ім'я: Не вказано"));
    assert!(text.contains("🌱 Новачок"));
}

/// Analysis report is the canned checklist of the picked type
#[test]
fn test_analysis_report_text() {
    let text = render(Screen::Analysis(MaterialType::Banner));
    assert!(text.contains("🎨 Банер / креатив"));
    assert!(text.contains("Загальна оцінка: 7.5/10"));
}

/// Materials resolve only when the file exists
#[test]
fn test_material_resolution() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let missing = Material::CplRoasGuide.resolve(dir.path());
    assert_eq!(
        missing,
        Err(MaterialError::NotFound(dir.path().join("guide_cpl_roas.pdf")))
    );

    std::fs::write(dir.path().join("guide_cpl_roas.pdf"), b"%PDF-1.4")?;
    let path = Material::CplRoasGuide.resolve(dir.path())?;
    assert!(path.ends_with("guide_cpl_roas.pdf"));

    Ok(())
}

/// Materials menu lists every guide and a back button
#[test]
fn test_materials_keyboard() {
    let data = callback_data(&materials_keyboard());
    assert_eq!(data.len(), Material::ALL.len() + 1);
    assert_eq!(data.last(), Some(&Button::BackToMain.data()));
}

/// Re-prompts for an oversized lead count and an unknown command
#[test]
fn test_reprompt_texts() {
    assert!(render(Screen::TooManyLeads { max: 1_000_000 }).contains("1000000"));
    assert!(render(Screen::UnknownCommand).contains("/help"));
}

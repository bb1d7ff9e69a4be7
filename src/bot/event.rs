//! Inbound events and the callback-data codec for inline buttons.
//!
//! Transport-specific updates are reduced to an [`Event`] before they reach
//! the state machine.

use chrono::NaiveDate;

use crate::analysis::{MaterialType, UploadKind};
use crate::dialogue::CalendarMonth;
use crate::materials::Material;
use crate::profile::BusinessType;

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Help,
    Menu,
    Stats,
    Calculator,
    Quiz,
}

impl Command {
    /// Parse `/name` or `/name@botname`, ignoring trailing arguments
    pub fn parse(text: &str) -> Option<Self> {
        match command_name(text)?.as_str() {
            "start" => Some(Command::Start),
            "cancel" => Some(Command::Cancel),
            "help" => Some(Command::Help),
            "menu" => Some(Command::Menu),
            "stats" => Some(Command::Stats),
            "calculator" => Some(Command::Calculator),
            "quiz" => Some(Command::Quiz),
            _ => None,
        }
    }
}

/// Lowercased name of a `/name` or `/name@botname` command word
fn command_name(text: &str) -> Option<String> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(name.to_lowercase())
}

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Topics,
    Materials,
    Upload,
    Calculator,
    Consult,
    Quiz,
    Stats,
}

impl MenuAction {
    fn code(self) -> &'static str {
        match self {
            MenuAction::Topics => "topics",
            MenuAction::Materials => "materials",
            MenuAction::Upload => "upload",
            MenuAction::Calculator => "calculator",
            MenuAction::Consult => "consult",
            MenuAction::Quiz => "quiz",
            MenuAction::Stats => "stats",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        [
            MenuAction::Topics,
            MenuAction::Materials,
            MenuAction::Upload,
            MenuAction::Calculator,
            MenuAction::Consult,
            MenuAction::Quiz,
            MenuAction::Stats,
        ]
        .into_iter()
        .find(|a| a.code() == code)
    }
}

/// Advice topics of the topic dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Topic {
    GoogleAds,
    MetaAds,
    CplRoas,
    Content,
    Audit,
    Seo,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::GoogleAds,
        Topic::MetaAds,
        Topic::CplRoas,
        Topic::Content,
        Topic::Audit,
        Topic::Seo,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Topic::GoogleAds => "google",
            Topic::MetaAds => "meta",
            Topic::CplRoas => "cpl_roas",
            Topic::Content => "content",
            Topic::Audit => "audit",
            Topic::Seo => "seo",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcKind {
    Cpl,
    Roas,
}

/// A pressed inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    BackToMain,
    Menu(MenuAction),
    Business(BusinessType),
    Topic(Topic),
    Material(Material),
    UploadType(MaterialType),
    Calc(CalcKind),
    QuizStart,
    QuizAnswer(usize),
    QuizNext,
    Date(NaiveDate),
    Month(CalendarMonth),
    ChangeDate,
    Time(String),
    Ignore,
}

impl Button {
    /// Encode as callback data (at most 64 bytes)
    pub fn data(&self) -> String {
        match self {
            Button::BackToMain => "nav:main".to_string(),
            Button::Menu(action) => format!("menu:{}", action.code()),
            Button::Business(business) => format!("biz:{}", business.code()),
            Button::Topic(topic) => format!("topic:{}", topic.code()),
            Button::Material(material) => format!("mat:{}", material.code()),
            Button::UploadType(kind) => format!("upload:{}", kind.code()),
            Button::Calc(CalcKind::Cpl) => "calc:cpl".to_string(),
            Button::Calc(CalcKind::Roas) => "calc:roas".to_string(),
            Button::QuizStart => "quiz:start".to_string(),
            Button::QuizAnswer(choice) => format!("quiz:answer:{choice}"),
            Button::QuizNext => "quiz:next".to_string(),
            Button::Date(date) => format!("cal:date:{}", date.format("%Y-%m-%d")),
            Button::Month(month) => format!("cal:month:{:04}-{:02}", month.year, month.month),
            Button::ChangeDate => "cal:change".to_string(),
            Button::Time(slot) => format!("time:{slot}"),
            Button::Ignore => "ignore".to_string(),
        }
    }

    /// Decode callback data produced by [`Button::data`]
    pub fn parse(data: &str) -> Option<Self> {
        let (prefix, rest) = data.split_once(':').unwrap_or((data, ""));
        match prefix {
            "nav" if rest == "main" => Some(Button::BackToMain),
            "menu" => MenuAction::from_code(rest).map(Button::Menu),
            "biz" => BusinessType::from_code(rest).map(Button::Business),
            "topic" => Topic::from_code(rest).map(Button::Topic),
            "mat" => Material::from_code(rest).map(Button::Material),
            "upload" => MaterialType::from_code(rest).map(Button::UploadType),
            "calc" => match rest {
                "cpl" => Some(Button::Calc(CalcKind::Cpl)),
                "roas" => Some(Button::Calc(CalcKind::Roas)),
                _ => None,
            },
            "quiz" => match rest.split_once(':') {
                Some(("answer", choice)) => choice.parse().ok().map(Button::QuizAnswer),
                None if rest == "start" => Some(Button::QuizStart),
                None if rest == "next" => Some(Button::QuizNext),
                _ => None,
            },
            "cal" => match rest.split_once(':') {
                Some(("date", date)) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .ok()
                    .map(Button::Date),
                Some(("month", month)) => {
                    let (year, month) = month.split_once('-')?;
                    CalendarMonth::new(year.parse().ok()?, month.parse().ok()?).map(Button::Month)
                }
                None if rest == "change" => Some(Button::ChangeDate),
                _ => None,
            },
            "time" if !rest.is_empty() => Some(Button::Time(rest.to_string())),
            "ignore" => Some(Button::Ignore),
            _ => None,
        }
    }
}

/// One inbound update, reduced to what the state machine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// A well-formed slash command the bot does not know
    UnknownCommand(String),
    Button(Button),
    Text(String),
    Upload(UploadKind),
    Unsupported,
}

impl Event {
    /// Classify a text message as a command, an unknown command or free text
    pub fn from_text(text: &str) -> Self {
        match (Command::parse(text), command_name(text)) {
            (Some(command), _) => Event::Command(command),
            (None, Some(name)) => Event::UnknownCommand(name),
            (None, None) => Event::Text(text.to_string()),
        }
    }

    /// Classify callback data; unknown data becomes a no-op button
    pub fn from_callback(data: &str) -> Self {
        Event::Button(Button::parse(data).unwrap_or(Button::Ignore))
    }
}

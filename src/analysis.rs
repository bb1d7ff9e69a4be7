//! Canned review of uploaded advertising materials.
//!
//! The bot does not inspect the uploaded file; it returns a scored
//! checklist for the material type the user selected.

use serde::{Deserialize, Serialize};

/// Progress bar frames shown while the "analysis" runs
pub const PROGRESS_STEPS: [(u8, &str); 6] = [
    (0, "Завантаження файлу..."),
    (20, "Аналіз композиції..."),
    (40, "Перевірка тексту..."),
    (60, "Оцінка візуальної привабливості..."),
    (80, "Генерація рекомендацій..."),
    (100, "Завершення аналізу..."),
];

/// What the user sent for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    Document { file_name: Option<String> },
    Photo,
    Text { length: usize },
}

impl UploadKind {
    /// Payload written to the event log
    pub fn label(&self) -> &'static str {
        match self {
            UploadKind::Document { .. } => "document",
            UploadKind::Photo => "photo",
            UploadKind::Text { .. } => "text",
        }
    }
}

/// Material type picked after the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialType {
    Banner,
    AdText,
    Landing,
    CampaignStats,
}

impl MaterialType {
    pub const ALL: [MaterialType; 4] = [
        MaterialType::Banner,
        MaterialType::AdText,
        MaterialType::Landing,
        MaterialType::CampaignStats,
    ];

    pub fn code(self) -> &'static str {
        match self {
            MaterialType::Banner => "banner",
            MaterialType::AdText => "text",
            MaterialType::Landing => "landing",
            MaterialType::CampaignStats => "stats",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn label_key(self) -> &'static str {
        match self {
            MaterialType::Banner => "upload-type-banner",
            MaterialType::AdText => "upload-type-text",
            MaterialType::Landing => "upload-type-landing",
            MaterialType::CampaignStats => "upload-type-stats",
        }
    }

    pub fn report(self) -> &'static AnalysisReport {
        match self {
            MaterialType::Banner => &BANNER,
            MaterialType::AdText => &AD_TEXT,
            MaterialType::Landing => &LANDING,
            MaterialType::CampaignStats => &CAMPAIGN_STATS,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct AnalysisReport {
    /// Score out of ten
    pub score: f32,
    pub good: &'static [&'static str],
    pub improve: &'static [&'static str],
    pub tips: &'static [&'static str],
}

impl AnalysisReport {
    /// Ten-star rating, one filled star per whole point
    pub fn stars(&self) -> String {
        let filled = (self.score as usize).min(10);
        format!("{}{}", "⭐".repeat(filled), "☆".repeat(10 - filled))
    }
}

/// Text progress bar with ten cells
pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100) / 10);
    format!("{}{}", "▓".repeat(filled), "░".repeat(10 - filled))
}

static BANNER: AnalysisReport = AnalysisReport {
    score: 7.5,
    good: &[
        "✅ Читабельний шрифт",
        "✅ Контрастні кольори",
        "✅ Є логотип/брендинг",
    ],
    improve: &[
        "⚠️ Додайте яскравий заклик до дії (CTA)",
        "⚠️ Збільште розмір основного тексту на 20%",
        "⚠️ Перевірте правило 20% тексту для Facebook",
    ],
    tips: &[
        "💡 Використайте контрастну кнопку для CTA",
        "💡 Додайте емоційний тригер (знижка, термін)",
        "💡 Протестуйте 3-5 варіантів (A/B тест)",
    ],
};

static AD_TEXT: AnalysisReport = AnalysisReport {
    score: 8.0,
    good: &[
        "✅ Чіткий заклик до дії",
        "✅ Опис вигоди для пацієнта",
        "✅ Є контактна інформація",
    ],
    improve: &[
        "⚠️ Додайте конкретні цифри та факти",
        "⚠️ Скоротіть текст до 150 символів",
        "⚠️ Використайте емоційні слова",
    ],
    tips: &[
        "💡 Формула: Проблема → Рішення → Результат → CTA",
        "💡 Додайте термін акції для терміновості",
        "💡 Використайте соціальні докази (відгуки, кількість пацієнтів)",
    ],
};

static LANDING: AnalysisReport = AnalysisReport {
    score: 6.5,
    good: &[
        "✅ Є форма запису",
        "✅ Мобільна версія",
        "✅ Контактна інформація",
    ],
    improve: &[
        "⚠️ Оптимізуйте швидкість завантаження (<3 сек)",
        "⚠️ Спростіть форму (макс 3-4 поля)",
        "⚠️ Додайте соціальні докази (відгуки, сертифікати)",
    ],
    tips: &[
        "💡 Додайте відео-відгуки пацієнтів",
        "💡 Використайте exit-intent popup",
        "💡 Додайте онлайн-чат для консультацій",
    ],
};

static CAMPAIGN_STATS: AnalysisReport = AnalysisReport {
    score: 7.0,
    good: &[
        "✅ CTR вище середнього (>2%)",
        "✅ Налаштовано відстеження конверсій",
    ],
    improve: &[
        "⚠️ Покращіть CR (конверсія < 5%)",
        "⚠️ Оптимізуйте CPL (вартість ліда)",
        "⚠️ Розширте аудиторію (схожі аудиторії)",
    ],
    tips: &[
        "💡 Використайте ремаркетинг для теплої аудиторії",
        "💡 Тестуйте різні пропозиції (offer)",
        "💡 Аналізуйте по годинах доби (time parting)",
    ],
};

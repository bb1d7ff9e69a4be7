//! User profile model: durable engagement counters and badges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters kept per user, incremented by one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counter {
    FilesUploaded,
    MaterialsDownloaded,
    ConsultationsRequested,
    QuizzesCompleted,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::FilesUploaded,
        Counter::MaterialsDownloaded,
        Counter::ConsultationsRequested,
        Counter::QuizzesCompleted,
    ];

    /// Column holding the counter in `user_profiles`
    pub fn column(self) -> &'static str {
        match self {
            Counter::FilesUploaded => "files_uploaded",
            Counter::MaterialsDownloaded => "materials_downloaded",
            Counter::ConsultationsRequested => "consultations_requested",
            Counter::QuizzesCompleted => "quizzes_completed",
        }
    }
}

/// Free-form profile fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileField {
    Name,
    BusinessType,
}

impl ProfileField {
    pub fn column(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::BusinessType => "business_type",
        }
    }
}

/// Kind of medical business a user runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessType {
    Clinic,
    Doctor,
    Dental,
    Lab,
    Pharmacy,
    Fitness,
}

impl BusinessType {
    pub const ALL: [BusinessType; 6] = [
        BusinessType::Clinic,
        BusinessType::Doctor,
        BusinessType::Dental,
        BusinessType::Lab,
        BusinessType::Pharmacy,
        BusinessType::Fitness,
    ];

    /// Stable code stored in the database and used in button data
    pub fn code(self) -> &'static str {
        match self {
            BusinessType::Clinic => "clinic",
            BusinessType::Doctor => "doctor",
            BusinessType::Dental => "dental",
            BusinessType::Lab => "lab",
            BusinessType::Pharmacy => "pharmacy",
            BusinessType::Fitness => "fitness",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.code() == code)
    }
}

/// Durable per-user profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub name: Option<String>,
    pub business_type: Option<String>,
    pub files_uploaded: i64,
    pub materials_downloaded: i64,
    pub consultations_requested: i64,
    pub quizzes_completed: i64,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Empty profile for a user that has never been seen
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            ..Default::default()
        }
    }

    pub fn counter(&self, counter: Counter) -> i64 {
        match counter {
            Counter::FilesUploaded => self.files_uploaded,
            Counter::MaterialsDownloaded => self.materials_downloaded,
            Counter::ConsultationsRequested => self.consultations_requested,
            Counter::QuizzesCompleted => self.quizzes_completed,
        }
    }

    pub fn business(&self) -> Option<BusinessType> {
        self.business_type.as_deref().and_then(BusinessType::from_code)
    }

    /// Badges earned so far, in display order
    pub fn badges(&self) -> Vec<Badge> {
        let mut badges = Vec::new();
        if self.files_uploaded >= 1 {
            badges.push(Badge::FirstFile);
        }
        if self.files_uploaded >= 5 {
            badges.push(Badge::ActiveUser);
        }
        if self.materials_downloaded >= 3 {
            badges.push(Badge::Bookworm);
        }
        if self.consultations_requested >= 1 {
            badges.push(Badge::GoalOriented);
        }
        if self.quizzes_completed >= 1 {
            badges.push(Badge::Erudite);
        }
        if self.quizzes_completed >= 3 {
            badges.push(Badge::Expert);
        }
        if badges.is_empty() {
            badges.push(Badge::Newcomer);
        }
        badges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    FirstFile,
    ActiveUser,
    Bookworm,
    GoalOriented,
    Erudite,
    Expert,
    Newcomer,
}

impl Badge {
    /// Localization key of the badge label
    pub fn key(self) -> &'static str {
        match self {
            Badge::FirstFile => "badge-first-file",
            Badge::ActiveUser => "badge-active-user",
            Badge::Bookworm => "badge-bookworm",
            Badge::GoalOriented => "badge-goal-oriented",
            Badge::Erudite => "badge-erudite",
            Badge::Expert => "badge-expert",
            Badge::Newcomer => "badge-newcomer",
        }
    }
}

//! Downloadable PDF guides offered in the materials menu.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterialError {
    #[error("material file {0} is not available")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    GoogleAdsChecklist,
    DoctorTargetingChecklist,
    CplRoasGuide,
    TenMistakesGuide,
    LandingPageGuide,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::GoogleAdsChecklist,
        Material::DoctorTargetingChecklist,
        Material::CplRoasGuide,
        Material::TenMistakesGuide,
        Material::LandingPageGuide,
    ];

    /// Short code used in button data
    pub fn code(self) -> &'static str {
        match self {
            Material::GoogleAdsChecklist => "ga",
            Material::DoctorTargetingChecklist => "fb",
            Material::CplRoasGuide => "cpl",
            Material::TenMistakesGuide => "mistakes",
            Material::LandingPageGuide => "landing",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// File name inside the materials directory
    pub fn file_name(self) -> &'static str {
        match self {
            Material::GoogleAdsChecklist => "checklist_google_ads.pdf",
            Material::DoctorTargetingChecklist => "checklist_doctor_facebook.pdf",
            Material::CplRoasGuide => "guide_cpl_roas.pdf",
            Material::TenMistakesGuide => "guide_10_mistakes.pdf",
            Material::LandingPageGuide => "guide_landing_page.pdf",
        }
    }

    /// Localization key of the document title
    pub fn title_key(self) -> &'static str {
        match self {
            Material::GoogleAdsChecklist => "material-google-ads",
            Material::DoctorTargetingChecklist => "material-doctor-targeting",
            Material::CplRoasGuide => "material-cpl-roas",
            Material::TenMistakesGuide => "material-ten-mistakes",
            Material::LandingPageGuide => "material-landing",
        }
    }

    /// Locate the file for this material, failing if it is not on disk
    pub fn resolve(self, dir: &Path) -> Result<PathBuf, MaterialError> {
        let path = dir.join(self.file_name());
        if path.is_file() {
            Ok(path)
        } else {
            Err(MaterialError::NotFound(path))
        }
    }
}

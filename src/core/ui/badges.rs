//! Status, severity and type badges.
//!
//! Each enum maps to its badge with an exhaustive `match`, so adding a variant
//! fails to compile until it has a badge. Stored strings go through
//! [`badge_for`], which never fails: an unknown value renders as a default badge
//! carrying the raw text.

use std::str::FromStr;

use super::components::html_escape;
use crate::core::shared::enums::{
    AppRole, AuditStatus, AuditType, DocumentCategory, DocumentStatus, FindingType, KpiFrequency,
    NcSeverity, NcStatus, RiskLevel, RiskStatus, TrainingSessionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeVariant {
    #[default]
    Default,
    Secondary,
    Destructive,
    Outline,
}

impl BadgeVariant {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Default => "badge-default",
            Self::Secondary => "badge-secondary",
            Self::Destructive => "badge-destructive",
            Self::Outline => "badge-outline",
        }
    }
}

/// Text colour layered on top of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Yellow,
    Orange,
    Red,
    Green,
}

impl Tone {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Yellow => "tone-yellow",
            Self::Orange => "tone-orange",
            Self::Red => "tone-red",
            Self::Green => "tone-green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
    pub tone: Option<Tone>,
}

impl Badge {
    pub fn new(label: impl Into<String>, variant: BadgeVariant) -> Self {
        Self {
            label: label.into(),
            variant,
            tone: None,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn render(&self) -> String {
        let tone = self
            .tone
            .map(|t| format!(" {}", t.css_class()))
            .unwrap_or_default();
        format!(
            r#"<span class="badge {}{tone}">{}</span>"#,
            self.variant.css_class(),
            html_escape(&self.label)
        )
    }
}

pub trait BadgeSpec: FromStr {
    fn badge(&self) -> Badge;
}

/// Badge for a stored value.
pub fn badge_for<T: BadgeSpec>(raw: &str) -> Badge {
    match raw.parse::<T>() {
        Ok(value) => value.badge(),
        Err(_) => Badge::new(raw, BadgeVariant::Default),
    }
}

impl BadgeSpec for DocumentStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Draft => Badge::new("Brouillon", BadgeVariant::Secondary),
            Self::UnderReview => Badge::new("En révision", BadgeVariant::Outline),
            Self::Approved => Badge::new("Approuvé", BadgeVariant::Default),
            Self::Obsolete => Badge::new("Obsolète", BadgeVariant::Destructive),
        }
    }
}

impl BadgeSpec for DocumentCategory {
    fn badge(&self) -> Badge {
        Badge::new(self.label(), BadgeVariant::Outline)
    }
}

impl BadgeSpec for NcSeverity {
    fn badge(&self) -> Badge {
        match self {
            Self::Minor => Badge::new(self.label(), BadgeVariant::Secondary).with_tone(Tone::Yellow),
            Self::Major => Badge::new(self.label(), BadgeVariant::Default).with_tone(Tone::Orange),
            Self::Critical => {
                Badge::new(self.label(), BadgeVariant::Destructive).with_tone(Tone::Red)
            }
        }
    }
}

impl BadgeSpec for NcStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Open => Badge::new("Ouverte", BadgeVariant::Destructive),
            Self::InProgress => Badge::new("En cours", BadgeVariant::Outline),
            Self::Resolved => Badge::new("Résolue", BadgeVariant::Secondary),
            Self::Closed => Badge::new("Clôturée", BadgeVariant::Default),
            Self::Rejected => Badge::new("Rejetée", BadgeVariant::Outline),
        }
    }
}

impl BadgeSpec for AuditType {
    fn badge(&self) -> Badge {
        Badge::new(self.label(), BadgeVariant::Outline)
    }
}

impl BadgeSpec for AuditStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Planned => Badge::new("Planifié", BadgeVariant::Outline),
            Self::InProgress => Badge::new("En cours", BadgeVariant::Secondary),
            Self::Completed => Badge::new("Terminé", BadgeVariant::Default),
            Self::Cancelled => Badge::new("Annulé", BadgeVariant::Destructive),
        }
    }
}

impl BadgeSpec for FindingType {
    fn badge(&self) -> Badge {
        match self {
            Self::NonConformity => Badge::new("Non-conformité", BadgeVariant::Destructive),
            Self::Observation => Badge::new("Observation", BadgeVariant::Secondary),
            Self::Opportunity => Badge::new("Piste d'amélioration", BadgeVariant::Outline),
        }
    }
}

impl BadgeSpec for KpiFrequency {
    fn badge(&self) -> Badge {
        Badge::new(self.label(), BadgeVariant::Outline)
    }
}

impl BadgeSpec for RiskStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Identified => Badge::new("Identifié", BadgeVariant::Destructive),
            Self::Assessed => Badge::new("Évalué", BadgeVariant::Outline),
            Self::Treated => Badge::new("Traité", BadgeVariant::Secondary),
            Self::Accepted => Badge::new("Accepté", BadgeVariant::Secondary),
            Self::Closed => Badge::new("Clôturé", BadgeVariant::Default),
        }
    }
}

impl BadgeSpec for RiskLevel {
    fn badge(&self) -> Badge {
        match self {
            Self::Low => Badge::new("Faible", BadgeVariant::Secondary).with_tone(Tone::Green),
            Self::Medium => Badge::new("Moyen", BadgeVariant::Secondary).with_tone(Tone::Yellow),
            Self::High => Badge::new("Élevé", BadgeVariant::Default).with_tone(Tone::Orange),
            Self::Critical => Badge::new("Critique", BadgeVariant::Destructive).with_tone(Tone::Red),
        }
    }
}

impl BadgeSpec for TrainingSessionStatus {
    fn badge(&self) -> Badge {
        match self {
            Self::Planned => Badge::new("Planifiée", BadgeVariant::Outline),
            Self::InProgress => Badge::new("En cours", BadgeVariant::Secondary),
            Self::Completed => Badge::new("Terminée", BadgeVariant::Default),
            Self::Cancelled => Badge::new("Annulée", BadgeVariant::Destructive),
        }
    }
}

impl BadgeSpec for AppRole {
    fn badge(&self) -> Badge {
        let variant = match self {
            Self::Admin => BadgeVariant::Destructive,
            Self::QualityManager => BadgeVariant::Default,
            Self::Auditor => BadgeVariant::Secondary,
            Self::User => BadgeVariant::Outline,
        };
        Badge::new(self.label(), variant)
    }
}

//! Enumerated values stored in TEXT columns.
//!
//! The database keeps these as text guarded by `CHECK` constraints. New rows are
//! always built from these closed enums; rows read back keep the raw string so
//! an unexpected value still renders (see `core::ui::badges`).

use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!("Unknown {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

// ============================================================================
// ACCESS
// ============================================================================

text_enum! {
    pub enum AppRole {
        Admin => "admin",
        QualityManager => "quality_manager",
        Auditor => "auditor",
        User => "user",
    }
}

impl AppRole {
    /// Lower is more privileged.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Admin => 0,
            Self::QualityManager => 1,
            Self::Auditor => 2,
            Self::User => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrateur",
            Self::QualityManager => "Responsable qualité",
            Self::Auditor => "Auditeur",
            Self::User => "Utilisateur",
        }
    }
}

impl Default for AppRole {
    fn default() -> Self {
        Self::User
    }
}

// ============================================================================
// DOCUMENTS
// ============================================================================

text_enum! {
    pub enum DocumentStatus {
        Draft => "draft",
        UnderReview => "under_review",
        Approved => "approved",
        Obsolete => "obsolete",
    }
}

text_enum! {
    pub enum DocumentCategory {
        Procedure => "procedure",
        Instruction => "instruction",
        Form => "formulaire",
        Record => "enregistrement",
        Policy => "politique",
        Manual => "manuel",
    }
}

impl DocumentCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Procedure => "Procédure",
            Self::Instruction => "Instruction",
            Self::Form => "Formulaire",
            Self::Record => "Enregistrement",
            Self::Policy => "Politique",
            Self::Manual => "Manuel",
        }
    }
}

// ============================================================================
// NON-CONFORMITIES
// ============================================================================

text_enum! {
    pub enum NcSeverity {
        Minor => "minor",
        Major => "major",
        Critical => "critical",
    }
}

text_enum! {
    pub enum NcStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
        Rejected => "rejected",
    }
}

impl NcSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Minor => "Mineure",
            Self::Major => "Majeure",
            Self::Critical => "Critique",
        }
    }
}

// ============================================================================
// AUDITS
// ============================================================================

text_enum! {
    pub enum AuditType {
        Internal => "internal",
        External => "external",
        Certification => "certification",
        Surveillance => "surveillance",
    }
}

text_enum! {
    pub enum AuditStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    pub enum FindingType {
        NonConformity => "non_conformity",
        Observation => "observation",
        Opportunity => "opportunity",
    }
}

impl AuditType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Internal => "Interne",
            Self::External => "Externe",
            Self::Certification => "Certification",
            Self::Surveillance => "Surveillance",
        }
    }
}

// ============================================================================
// KPIS
// ============================================================================

text_enum! {
    pub enum KpiFrequency {
        Monthly => "monthly",
        Quarterly => "quarterly",
        Semiannual => "semiannual",
        Yearly => "yearly",
    }
}

impl KpiFrequency {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "Mensuel",
            Self::Quarterly => "Trimestriel",
            Self::Semiannual => "Semestriel",
            Self::Yearly => "Annuel",
        }
    }
}

text_enum! {
    pub enum TargetOperator {
        AtLeast => ">=",
        AtMost => "<=",
        Exactly => "=",
    }
}

impl TargetOperator {
    pub fn meets(&self, actual: f64, target: f64) -> bool {
        match self {
            Self::AtLeast => actual >= target,
            Self::AtMost => actual <= target,
            Self::Exactly => (actual - target).abs() < f64::EPSILON,
        }
    }
}

impl Default for TargetOperator {
    fn default() -> Self {
        Self::AtLeast
    }
}

// ============================================================================
// RISKS
// ============================================================================

text_enum! {
    pub enum RiskStatus {
        Identified => "identified",
        Assessed => "assessed",
        Treated => "treated",
        Accepted => "accepted",
        Closed => "closed",
    }
}

text_enum! {
    pub enum RiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

impl RiskLevel {
    /// Bands over `probability * impact` (1..=25).
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=4 => Self::Low,
            5..=9 => Self::Medium,
            10..=14 => Self::High,
            _ => Self::Critical,
        }
    }
}

// ============================================================================
// TRAINING
// ============================================================================

text_enum! {
    pub enum TrainingSessionStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        for status in NcStatus::ALL {
            assert_eq!(status.as_str().parse::<NcStatus>(), Ok(*status));
        }
        assert_eq!(">=".parse::<TargetOperator>(), Ok(TargetOperator::AtLeast));
        assert!("pending".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_stored_text() {
        let json = serde_json::to_string(&DocumentStatus::UnderReview).unwrap();
        assert_eq!(json, "\"under_review\"");
        let category: DocumentCategory = serde_json::from_str("\"formulaire\"").unwrap();
        assert_eq!(category, DocumentCategory::Form);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(12), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(15), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Critical);
    }

    #[test]
    fn test_target_operator() {
        assert!(TargetOperator::AtLeast.meets(95.0, 90.0));
        assert!(!TargetOperator::AtMost.meets(95.0, 90.0));
        assert!(TargetOperator::Exactly.meets(3.0, 3.0));
    }

    #[test]
    fn test_role_rank() {
        assert!(AppRole::Admin.rank() < AppRole::User.rank());
        assert_eq!(AppRole::default(), AppRole::User);
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical control family label (e.g., `AC-Access_Control`).
///
/// Used only as a grouping key. The empty string is a valid value: it is the
/// partition for family labels that did not map to a known NIST family.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Family(pub String);

impl Family {
    /// The partition used for unrecognized family labels.
    pub fn unmapped() -> Self {
        Self(String::new())
    }

    pub fn is_unmapped(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<FamilyCode> for Family {
    fn from(code: FamilyCode) -> Self {
        Family(code.as_str().to_string())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical identifier of a control or sub-control (`AC-1`, `AC-2 (21)`).
///
/// Never carries an enhancement suffix; enhancements live in the narrative.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlKey(pub String);

impl ControlKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The 18 NIST 800-53 control families recognized by the normalizer.
///
/// `token()` is the underscore-joined spreadsheet label, `as_str()` the
/// OpenControl family code written to the catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FamilyCode {
    AccessControl,
    AuditAndAccountability,
    AwarenessAndTraining,
    ConfigurationManagement,
    ContingencyPlanning,
    IdentificationAndAuthentication,
    IncidentResponse,
    Maintenance,
    MediaProtection,
    PersonnelSecurity,
    PhysicalAndEnvironmentalProtection,
    Planning,
    ProgramManagement,
    RiskAssessment,
    SecurityAssessmentAndAuthorization,
    SystemAndCommunicationsProtection,
    SystemAndInformationIntegrity,
    SystemAndServicesAcquisition,
}

impl FamilyCode {
    pub const ALL: [FamilyCode; 18] = [
        FamilyCode::AccessControl,
        FamilyCode::AuditAndAccountability,
        FamilyCode::AwarenessAndTraining,
        FamilyCode::ConfigurationManagement,
        FamilyCode::ContingencyPlanning,
        FamilyCode::IdentificationAndAuthentication,
        FamilyCode::IncidentResponse,
        FamilyCode::Maintenance,
        FamilyCode::MediaProtection,
        FamilyCode::PersonnelSecurity,
        FamilyCode::PhysicalAndEnvironmentalProtection,
        FamilyCode::Planning,
        FamilyCode::ProgramManagement,
        FamilyCode::RiskAssessment,
        FamilyCode::SecurityAssessmentAndAuthorization,
        FamilyCode::SystemAndCommunicationsProtection,
        FamilyCode::SystemAndInformationIntegrity,
        FamilyCode::SystemAndServicesAcquisition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyCode::AccessControl => "AC-Access_Control",
            FamilyCode::AuditAndAccountability => "AU-Audit_and_Accountability",
            FamilyCode::AwarenessAndTraining => "AT-Awareness_and_Training",
            FamilyCode::ConfigurationManagement => "CM-Configuration_Management",
            FamilyCode::ContingencyPlanning => "CP-Contingency_Planning",
            FamilyCode::IdentificationAndAuthentication => "IA-Identification_and_Authentication",
            FamilyCode::IncidentResponse => "IR-Incident_Response",
            FamilyCode::Maintenance => "MA-Maintenance",
            FamilyCode::MediaProtection => "MP-Media_Protection",
            FamilyCode::PersonnelSecurity => "PS-Personnel_Security",
            FamilyCode::PhysicalAndEnvironmentalProtection => {
                "PE-Physical_and_Environmental_Protection"
            }
            FamilyCode::Planning => "PL-Planning",
            FamilyCode::ProgramManagement => "PM-Program_Management",
            FamilyCode::RiskAssessment => "RA-Risk_Assessment",
            FamilyCode::SecurityAssessmentAndAuthorization => {
                "CA-Security_Assessment_and_Authorization"
            }
            FamilyCode::SystemAndCommunicationsProtection => {
                "SC-System_and_Communications_Protection"
            }
            FamilyCode::SystemAndInformationIntegrity => "SI-System_and_Information_Integrity",
            FamilyCode::SystemAndServicesAcquisition => "SA-System_and_Services_Acquisition",
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            FamilyCode::AccessControl => "ACCESS_CONTROL",
            FamilyCode::AuditAndAccountability => "AUDIT_AND_ACCOUNTABILITY",
            FamilyCode::AwarenessAndTraining => "AWARENESS_AND_TRAINING",
            FamilyCode::ConfigurationManagement => "CONFIGURATION_MANAGEMENT",
            FamilyCode::ContingencyPlanning => "CONTINGENCY_PLANNING",
            FamilyCode::IdentificationAndAuthentication => "IDENTIFICATION_AND_AUTHENTICATION",
            FamilyCode::IncidentResponse => "INCIDENT_RESPONSE",
            FamilyCode::Maintenance => "MAINTENANCE",
            FamilyCode::MediaProtection => "MEDIA_PROTECTION",
            FamilyCode::PersonnelSecurity => "PERSONNEL_SECURITY",
            FamilyCode::PhysicalAndEnvironmentalProtection => {
                "PHYSICAL_AND_ENVIRONMENTAL_PROTECTION"
            }
            FamilyCode::Planning => "PLANNING",
            FamilyCode::ProgramManagement => "PROGRAM_MANAGEMENT",
            FamilyCode::RiskAssessment => "RISK_ASSESSMENT",
            FamilyCode::SecurityAssessmentAndAuthorization => {
                "SECURITY_ASSESSMENT_AND_AUTHORIZATION"
            }
            FamilyCode::SystemAndCommunicationsProtection => {
                "SYSTEM_AND_COMMUNICATIONS_PROTECTION"
            }
            FamilyCode::SystemAndInformationIntegrity => "SYSTEM_AND_INFORMATION_INTEGRITY",
            FamilyCode::SystemAndServicesAcquisition => "SYSTEM_AND_SERVICES_ACQUISITION",
        }
    }

    /// Look up a family by its underscore-joined label. Exact match only.
    pub fn from_token(token: &str) -> Option<Self> {
        FamilyCode::ALL.into_iter().find(|code| code.token() == token)
    }
}

impl Serialize for FamilyCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FamilyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        FamilyCode::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown family code '{value}'")))
    }
}

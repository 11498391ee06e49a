//! Status catalog and aggregate status derivation.
//!
//! The severity table lives here and only here; both the public status-page
//! payload and any badge/sort logic consume it through this module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Current health of a single service, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Operational,
    UnderMaintenance,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 5] = [
        ServiceStatus::Operational,
        ServiceStatus::UnderMaintenance,
        ServiceStatus::DegradedPerformance,
        ServiceStatus::PartialOutage,
        ServiceStatus::MajorOutage,
    ];

    /// Severity rank; higher wins when deriving an organization's overall
    /// status.
    pub fn severity(&self) -> u8 {
        match self {
            ServiceStatus::Operational => 1,
            ServiceStatus::UnderMaintenance => 2,
            ServiceStatus::DegradedPerformance => 3,
            ServiceStatus::PartialOutage => 4,
            ServiceStatus::MajorOutage => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Operational => "operational",
            ServiceStatus::UnderMaintenance => "under_maintenance",
            ServiceStatus::DegradedPerformance => "degraded_performance",
            ServiceStatus::PartialOutage => "partial_outage",
            ServiceStatus::MajorOutage => "major_outage",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" => Ok(ServiceStatus::Operational),
            "under_maintenance" => Ok(ServiceStatus::UnderMaintenance),
            "degraded_performance" => Ok(ServiceStatus::DegradedPerformance),
            "partial_outage" => Ok(ServiceStatus::PartialOutage),
            "major_outage" => Ok(ServiceStatus::MajorOutage),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status value: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// Incident lifecycle status. Any order of non-terminal transitions is
/// allowed; "resolved" pins `resolved_at` permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "investigating" => Ok(IncidentStatus::Investigating),
            "identified" => Ok(IncidentStatus::Identified),
            "monitoring" => Ok(IncidentStatus::Monitoring),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Minor,
    Major,
    Critical,
}

impl IncidentSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentSeverity::Minor => "minor",
            IncidentSeverity::Major => "major",
            IncidentSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentSeverity {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(IncidentSeverity::Minor),
            "major" => Ok(IncidentSeverity::Major),
            "critical" => Ok(IncidentSeverity::Critical),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Incident,
    Maintenance,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Incident => "incident",
            IncidentKind::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentKind {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incident" => Ok(IncidentKind::Incident),
            "maintenance" => Ok(IncidentKind::Maintenance),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Result of [`derive_overall_status`]. `unknown` carries any raw values that
/// did not parse; callers log them as a data-integrity warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStatus {
    pub status: ServiceStatus,
    pub unknown: Vec<String>,
}

/// Derive an organization's overall status from its services' raw status
/// strings: the highest-severity known status wins; an empty input derives
/// `operational`. Unknown strings count as severity 1 instead of failing so
/// the page stays available with corrupted rows; they are reported back.
pub fn derive_overall_status<'a, I>(statuses: I) -> OverallStatus
where
    I: IntoIterator<Item = &'a str>,
{
    let mut overall = ServiceStatus::Operational;
    let mut unknown = Vec::new();

    for raw in statuses {
        match raw.parse::<ServiceStatus>() {
            Ok(status) => {
                if status.severity() > overall.severity() {
                    overall = status;
                }
            }
            Err(UnknownStatus(value)) => unknown.push(value),
        }
    }

    OverallStatus {
        status: overall,
        unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_table_is_strictly_ordered() {
        let mut ranks: Vec<u8> = ServiceStatus::ALL.iter().map(|s| s.severity()).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(ServiceStatus::MajorOutage.severity(), 5);
        assert_eq!(ServiceStatus::Operational.severity(), 1);
    }

    #[test]
    fn round_trips_through_strings() {
        for status in ServiceStatus::ALL {
            assert_eq!(status.as_str().parse::<ServiceStatus>().unwrap(), status);
        }
    }

    #[test]
    fn empty_list_is_operational() {
        let overall = derive_overall_status(std::iter::empty());
        assert_eq!(overall.status, ServiceStatus::Operational);
        assert!(overall.unknown.is_empty());
    }

    #[test]
    fn worst_status_wins() {
        let overall =
            derive_overall_status(["operational", "degraded_performance", "major_outage"]);
        assert_eq!(overall.status, ServiceStatus::MajorOutage);
    }

    #[test]
    fn all_operational_stays_operational() {
        let overall = derive_overall_status(["operational", "operational"]);
        assert_eq!(overall.status, ServiceStatus::Operational);
    }

    #[test]
    fn maintenance_beats_operational_but_not_outage() {
        let overall = derive_overall_status(["operational", "under_maintenance"]);
        assert_eq!(overall.status, ServiceStatus::UnderMaintenance);

        let overall = derive_overall_status(["partial_outage", "under_maintenance"]);
        assert_eq!(overall.status, ServiceStatus::PartialOutage);
    }

    #[test]
    fn unknown_values_count_as_operational_and_are_reported() {
        let overall = derive_overall_status(["garbage", "degraded_performance"]);
        assert_eq!(overall.status, ServiceStatus::DegradedPerformance);
        assert_eq!(overall.unknown, vec!["garbage".to_string()]);

        // Unknown alone never escalates above operational
        let overall = derive_overall_status(["garbage"]);
        assert_eq!(overall.status, ServiceStatus::Operational);
    }

    #[test]
    fn incident_enums_parse_and_print() {
        assert_eq!(
            "investigating".parse::<IncidentStatus>().unwrap(),
            IncidentStatus::Investigating
        );
        assert_eq!(IncidentStatus::Resolved.to_string(), "resolved");
        assert!("fixed".parse::<IncidentStatus>().is_err());

        assert_eq!(
            "maintenance".parse::<IncidentKind>().unwrap(),
            IncidentKind::Maintenance
        );
        assert_eq!(
            "critical".parse::<IncidentSeverity>().unwrap(),
            IncidentSeverity::Critical
        );
    }
}

//! Arbitration topics for a race
//!
//! Every race is summarized per topic: one overview, one entry per
//! candidate, and one per canonical issue.

use serde::{Deserialize, Serialize};

/// Fixed set of policy topics each race is summarized against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalIssue {
    Healthcare,
    Economy,
    ClimateEnergy,
    ReproductiveRights,
    Immigration,
    GunsSafety,
    ForeignPolicy,
    SocialJustice,
    Education,
    TechAi,
    ElectionReform,
}

impl CanonicalIssue {
    /// All canonical issues in publication order
    pub fn all() -> &'static [CanonicalIssue] {
        &[
            CanonicalIssue::Healthcare,
            CanonicalIssue::Economy,
            CanonicalIssue::ClimateEnergy,
            CanonicalIssue::ReproductiveRights,
            CanonicalIssue::Immigration,
            CanonicalIssue::GunsSafety,
            CanonicalIssue::ForeignPolicy,
            CanonicalIssue::SocialJustice,
            CanonicalIssue::Education,
            CanonicalIssue::TechAi,
            CanonicalIssue::ElectionReform,
        ]
    }

    /// Human-facing name
    pub fn display_name(&self) -> &'static str {
        match self {
            CanonicalIssue::Healthcare => "Healthcare",
            CanonicalIssue::Economy => "Economy",
            CanonicalIssue::ClimateEnergy => "Climate/Energy",
            CanonicalIssue::ReproductiveRights => "Reproductive Rights",
            CanonicalIssue::Immigration => "Immigration",
            CanonicalIssue::GunsSafety => "Guns & Safety",
            CanonicalIssue::ForeignPolicy => "Foreign Policy",
            CanonicalIssue::SocialJustice => "Social Justice",
            CanonicalIssue::Education => "Education",
            CanonicalIssue::TechAi => "Tech & AI",
            CanonicalIssue::ElectionReform => "Election Reform",
        }
    }

    /// Stable snake_case key
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalIssue::Healthcare => "healthcare",
            CanonicalIssue::Economy => "economy",
            CanonicalIssue::ClimateEnergy => "climate_energy",
            CanonicalIssue::ReproductiveRights => "reproductive_rights",
            CanonicalIssue::Immigration => "immigration",
            CanonicalIssue::GunsSafety => "guns_safety",
            CanonicalIssue::ForeignPolicy => "foreign_policy",
            CanonicalIssue::SocialJustice => "social_justice",
            CanonicalIssue::Education => "education",
            CanonicalIssue::TechAi => "tech_ai",
            CanonicalIssue::ElectionReform => "election_reform",
        }
    }
}

impl std::fmt::Display for CanonicalIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Scope of a single arbitration call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topic {
    /// The race as a whole
    RaceOverview,
    /// One candidate's profile
    Candidate { name: String },
    /// Candidates' positions on one canonical issue
    Issue { issue: CanonicalIssue },
}

impl Topic {
    /// Overview, then candidates, then every canonical issue
    pub fn for_race(candidates: &[String]) -> Vec<Topic> {
        let mut topics = Vec::with_capacity(1 + candidates.len() + CanonicalIssue::all().len());
        topics.push(Topic::RaceOverview);
        for name in candidates {
            topics.push(Topic::Candidate { name: name.clone() });
        }
        for &issue in CanonicalIssue::all() {
            topics.push(Topic::Issue { issue });
        }
        topics
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::RaceOverview => write!(f, "race_overview"),
            Topic::Candidate { name } => write!(f, "candidate:{}", name),
            Topic::Issue { issue } => write!(f, "issue:{}", issue),
        }
    }
}

// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are
// used in one file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Caller-input errors. All of these are raised eagerly and synchronously; the
/// engine never retries or recovers from them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(
        "invalid inheritance type '{0}': expected autosomal_recessive, autosomal_dominant, or x_linked"
    )]
    InvalidInheritanceType(String),

    #[error("invalid sex '{0}': expected male or female")]
    InvalidSex(String),

    #[error("invalid status '{0}': expected affected, carrier, unaffected, or unknown")]
    InvalidStatus(String),

    #[error("unsupported generation count {0}: must be 2 or 3")]
    UnsupportedGenerationCount(u64),

    #[error("pedigree shape does not match the {expected}-generation model")]
    MismatchedPedigree { expected: u8 },
}

/// Observed or inferred phenotype category for one pedigree member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Affected,
    Carrier,
    Unaffected,
    Unknown,
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown
    }
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Affected => "affected",
            Status::Carrier => "carrier",
            Status::Unaffected => "unaffected",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "affected" => Ok(Status::Affected),
            "carrier" => Ok(Status::Carrier),
            "unaffected" => Ok(Status::Unaffected),
            "unknown" => Ok(Status::Unknown),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(ModelError::InvalidSex(other.to_string())),
        }
    }
}

/// Inheritance pattern, fixed at request time. Selects which genotype space and
/// rule table applies to every member of the pedigree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritancePattern {
    AutosomalRecessive,
    AutosomalDominant,
    XLinked,
}

impl InheritancePattern {
    pub fn as_str(self) -> &'static str {
        match self {
            InheritancePattern::AutosomalRecessive => "autosomal_recessive",
            InheritancePattern::AutosomalDominant => "autosomal_dominant",
            InheritancePattern::XLinked => "x_linked",
        }
    }
}

impl fmt::Display for InheritancePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InheritancePattern {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "autosomal_recessive" => Ok(InheritancePattern::AutosomalRecessive),
            "autosomal_dominant" => Ok(InheritancePattern::AutosomalDominant),
            "x_linked" => Ok(InheritancePattern::XLinked),
            other => Err(ModelError::InvalidInheritanceType(other.to_string())),
        }
    }
}

/// Discrete genotype label at the locus of interest. The set of valid labels is
/// determined by the inheritance pattern and, for X-linked loci, by sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Genotype {
    /// `AA` — homozygous normal.
    HomNormal,
    /// `Aa` — heterozygous: carrier under recessive, affected under dominant.
    Het,
    /// `aa` — homozygous mutant.
    HomMutant,
    /// `XY` — unaffected male.
    MaleNormal,
    /// `XrY` — affected male.
    MaleMutant,
    /// `XX` — unaffected female.
    FemaleNormal,
    /// `XrX` — carrier female.
    FemaleCarrier,
    /// `XrXr` — affected female.
    FemaleMutant,
}

impl Genotype {
    /// Wire label, also used as the key in posterior maps.
    pub fn label(self) -> &'static str {
        match self {
            Genotype::HomNormal => "AA",
            Genotype::Het => "Aa",
            Genotype::HomMutant => "aa",
            Genotype::MaleNormal => "XY",
            Genotype::MaleMutant => "XrY",
            Genotype::FemaleNormal => "XX",
            Genotype::FemaleCarrier => "XrX",
            Genotype::FemaleMutant => "XrXr",
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pedigree member. Explicit probability overrides, when present, always
/// take precedence over status-derived defaults.
///
/// Persons are value types: engines clone them before any update so the
/// caller's originals are never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub status: Status,
    /// Prior probability of being heterozygous (`Aa` / `XrX`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_probability: Option<f64>,
    /// Prior probability of being affected-genotype (`aa` / `XrXr` / `XrY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_probability: Option<f64>,
    /// Full genotype distribution, keyed by genotype label. Wins over
    /// everything else when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genotype_probabilities: Option<BTreeMap<String, f64>>,
}

impl Person {
    pub fn with_status(status: Status) -> Self {
        Person {
            status,
            ..Person::default()
        }
    }

    pub fn unknown() -> Self {
        Person::default()
    }
}

/// The pedigree shapes the engines accept. The 3-generation form is a single
/// lineage chain: the co-parent at each step is external to the model and only
/// enters through default population priors.
#[derive(Debug, Clone, PartialEq)]
pub enum Pedigree {
    /// `father` = parent1, `mother` = parent2, by the original convention.
    TwoGeneration { father: Person, mother: Person },
    ThreeGeneration {
        grandparent: Person,
        parent: Person,
        child: Person,
    },
}

/// Request-time parameters shared by both engines. The two-generation engine
/// ignores the grandparent/parent sexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelParams {
    pub inheritance: InheritancePattern,
    pub child_sex: Sex,
    pub grandparent_sex: Sex,
    pub parent_sex: Sex,
}

impl ModelParams {
    /// Defaults follow the maternal-lineage convention: grandparent and parent
    /// are female unless overridden.
    pub fn new(inheritance: InheritancePattern, child_sex: Sex) -> Self {
        ModelParams {
            inheritance,
            child_sex,
            grandparent_sex: Sex::Female,
            parent_sex: Sex::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

/// Per-role marginal genotype posteriors, keyed by genotype label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginalPosteriors {
    pub grandparent: BTreeMap<String, f64>,
    pub parent: BTreeMap<String, f64>,
    pub child: BTreeMap<String, f64>,
}

/// The structured output of a forward risk computation.
///
/// `min == max` for every point-estimate case; the two-generation X-linked
/// daughter case with an undetermined father is the one genuine interval.
/// `factors` is a short list of plain-text justifications for the downstream
/// explanation layer; this engine never emits prose beyond those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub min: f64,
    pub max: f64,
    pub confidence: Confidence,
    /// Model identifier, e.g. `autosomal_recessive` or `three_generation`.
    pub model: String,
    pub factors: Vec<String>,
    /// Joint genotype posteriors keyed `"<gp>_<p>_<c>"` (3-generation only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_posteriors: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_posteriors: Option<MarginalPosteriors>,
    /// Present only when an observed child outcome triggered a reverse update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bayesian_update: Option<Box<BayesianUpdate>>,
}

/// Summary of a reverse (Bayesian) update, embedded into the forward result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianUpdate {
    pub observed_outcome: Status,
    pub parent1_original_status: Status,
    pub parent2_original_status: Status,
    pub parent1_carrier_probability: f64,
    pub parent2_carrier_probability: f64,
    /// The forward formula re-applied to the updated priors.
    pub updated_risk: RiskResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_posteriors: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_posteriors: Option<MarginalPosteriors>,
}

/// A scalar posterior for one role, or a carrier/affected pair where the
/// pattern distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PosteriorProbability {
    Scalar(f64),
    CarrierAffected {
        carrier_probability: f64,
        affected_probability: f64,
    },
}

/// Engine-level output of `bayesian_update`: refreshed per-role priors plus
/// the posterior summaries they were derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BayesianUpdateResult {
    pub updated_priors: BTreeMap<String, Person>,
    pub posterior_probabilities: BTreeMap<String, PosteriorProbability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_posteriors: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marginal_posteriors: Option<MarginalPosteriors>,
}

/// Observed phenotypes supplied to a reverse update. The two-generation engine
/// reads only `child`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observations {
    pub grandparent: Option<Status>,
    pub parent: Option<Status>,
    pub child: Option<Status>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_parsing_accepts_wire_values() {
        assert_eq!("affected".parse::<Status>().unwrap(), Status::Affected);
        assert_eq!("unknown".parse::<Status>().unwrap(), Status::Unknown);
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(
            "x_linked".parse::<InheritancePattern>().unwrap(),
            InheritancePattern::XLinked
        );
    }

    #[test]
    fn enum_parsing_rejects_anything_else() {
        assert_eq!(
            "sick".parse::<Status>().unwrap_err(),
            ModelError::InvalidStatus("sick".to_string())
        );
        assert_eq!(
            "other".parse::<Sex>().unwrap_err(),
            ModelError::InvalidSex("other".to_string())
        );
        assert_eq!(
            "mitochondrial".parse::<InheritancePattern>().unwrap_err(),
            ModelError::InvalidInheritanceType("mitochondrial".to_string())
        );
    }

    #[test]
    fn person_round_trips_through_json() {
        let raw = r#"{"status":"carrier","carrier_probability":0.25}"#;
        let person: Person = serde_json::from_str(raw).unwrap();
        assert_eq!(person.status, Status::Carrier);
        assert_eq!(person.carrier_probability, Some(0.25));
        assert!(person.genotype_probabilities.is_none());

        let back = serde_json::to_string(&person).unwrap();
        let again: Person = serde_json::from_str(&back).unwrap();
        assert_eq!(person, again);
    }

    #[test]
    fn missing_status_defaults_to_unknown() {
        let person: Person = serde_json::from_str("{}").unwrap();
        assert_eq!(person.status, Status::Unknown);
    }
}

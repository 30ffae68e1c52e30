//! Two-Generation Closed-Form Risk Model
//!
//! Forward risk for a parent → child pedigree reduces to a per-parent
//! "mutant allele transmission probability" and a pattern-specific closed
//! form:
//!
//! - autosomal recessive: `risk = p_father · p_mother` (both alleles needed),
//! - autosomal dominant: `risk = 1 − (1 − p_father)(1 − p_mother)` (one
//!   allele suffices, affected individuals treated as heterozygous),
//! - X-linked recessive: sons inherit their single X from the mother
//!   (`risk = p_mother`); daughters need a mutant X from both parents.
//!
//! An `unknown` parent's transmission probability is the population-prior
//! expectation `P(het) · 0.5 + P(affected) · 1.0`.
//!
//! The reverse direction (`reverse_update`) refines parental probabilities
//! once a child outcome has been observed, using per-pattern posterior-odds
//! updates. It never touches caller-owned records: the caller passes clones
//! and re-runs the forward formula on them for the updated risk.

use crate::rules::{ParentRole, PatternRules};
use crate::types::{Confidence, InheritancePattern, Person, RiskResult, Sex, Status};

/// Stateless two-generation engine; holds only the immutable rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoGenEngine {
    rules: PatternRules,
}

/// Best point estimate of a person's carrier probability after an update:
/// explicit overrides first, then the observed status.
pub fn carrier_probability_estimate(person: &Person) -> f64 {
    if let Some(p) = person.carrier_probability {
        return p;
    }
    if let Some(p) = person.affected_probability {
        return p;
    }
    match person.status {
        Status::Carrier | Status::Affected => 1.0,
        Status::Unaffected | Status::Unknown => 0.0,
    }
}

fn confidence_level(min: f64, max: f64) -> Confidence {
    if min == max {
        Confidence::High
    } else if (max - min) <= 0.2 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

impl TwoGenEngine {
    pub fn new() -> Self {
        TwoGenEngine::default()
    }

    pub fn with_rules(rules: PatternRules) -> Self {
        TwoGenEngine { rules }
    }

    pub fn model_name(&self) -> &'static str {
        "two_generation"
    }

    pub fn generation_count(&self) -> u8 {
        2
    }

    /// Forward risk for the target child. `father` is parent1 and `mother`
    /// parent2 throughout; this consistent ordering avoids ambiguous swaps.
    pub fn compute_risk(
        &self,
        father: &Person,
        mother: &Person,
        pattern: InheritancePattern,
        child_sex: Sex,
    ) -> RiskResult {
        match pattern {
            InheritancePattern::AutosomalRecessive => self.autosomal_recessive_risk(father, mother),
            InheritancePattern::AutosomalDominant => self.autosomal_dominant_risk(father, mother),
            InheritancePattern::XLinked => self.x_linked_risk(father, mother, child_sex),
        }
    }

    fn autosomal_recessive_risk(&self, father: &Person, mother: &Person) -> RiskResult {
        let p_f = self.transmit_recessive(father, InheritancePattern::AutosomalRecessive, ParentRole::Father);
        let p_m = self.transmit_recessive(mother, InheritancePattern::AutosomalRecessive, ParentRole::Mother);
        let risk = p_f * p_m;
        point_result(
            risk,
            "autosomal_recessive",
            vec![
                format!("Father status: {}", father.status),
                format!("Mother status: {}", mother.status),
                "Both parents must transmit a mutant allele".to_string(),
            ],
        )
    }

    fn autosomal_dominant_risk(&self, father: &Person, mother: &Person) -> RiskResult {
        let p_f = self.transmit_dominant(father);
        let p_m = self.transmit_dominant(mother);
        // Child is affected if at least one parent transmits the dominant allele.
        let risk = 1.0 - (1.0 - p_f) * (1.0 - p_m);
        point_result(
            risk,
            "autosomal_dominant",
            vec![
                format!("Father status: {}", father.status),
                format!("Mother status: {}", mother.status),
                "Single dominant allele causes disease in child".to_string(),
            ],
        )
    }

    fn x_linked_risk(&self, father: &Person, mother: &Person, child_sex: Sex) -> RiskResult {
        let p_m = self.transmit_recessive(mother, InheritancePattern::XLinked, ParentRole::Mother);

        if child_sex == Sex::Male {
            return point_result(
                p_m,
                "x_linked_recessive",
                vec![
                    format!("Father status: {}", father.status),
                    format!("Mother status: {}", mother.status),
                    "Male child receives X only from mother".to_string(),
                ],
            );
        }

        // A daughter is affected only with a mutant X from both parents. An
        // affected father transmits his mutant X to every daughter; an
        // unaffected father never does. Otherwise an explicit affected
        // probability pins the paternal contribution to a point; without one
        // it stays undetermined and the risk is a genuine interval.
        let (f_low, f_high) = match father.status {
            Status::Affected => (1.0, 1.0),
            Status::Unaffected => (0.0, 0.0),
            Status::Carrier | Status::Unknown => match father.affected_probability {
                Some(p) => (p, p),
                None => (0.0, 1.0),
            },
        };
        let min = p_m * f_low;
        let max = p_m * f_high;

        let mut factors = vec![
            format!("Father status: {}", father.status),
            format!("Mother status: {}", mother.status),
            "Female child requires mutant X from both parents to be affected".to_string(),
        ];
        if min != max {
            factors.push(
                "Father carrier state undetermined: bounds span non-carrier to affected father"
                    .to_string(),
            );
        }

        RiskResult {
            min,
            max,
            confidence: confidence_level(min, max),
            model: "x_linked_recessive".to_string(),
            factors,
            joint_posteriors: None,
            marginal_posteriors: None,
            bayesian_update: None,
        }
    }

    /// Mutant-allele transmission probability under recessive segregation
    /// (also used for the maternal X). Unknown parents fall back to
    /// `P(het)·0.5 + P(affected)·1.0` from the resolved priors.
    fn transmit_recessive(
        &self,
        person: &Person,
        pattern: InheritancePattern,
        role: ParentRole,
    ) -> f64 {
        match person.status {
            Status::Affected => 1.0,
            Status::Carrier => 0.5,
            Status::Unaffected => 0.0,
            Status::Unknown => {
                let priors = self.rules.parent_priors(person, pattern, role);
                priors.carrier * 0.5 + priors.affected
            }
        }
    }

    /// Dominant transmission treats an observed affected (or carrier) parent
    /// as heterozygous: transmission probability 0.5.
    fn transmit_dominant(&self, person: &Person) -> f64 {
        match person.status {
            Status::Affected | Status::Carrier => 0.5,
            Status::Unaffected => 0.0,
            Status::Unknown => {
                let priors = self.rules.parent_priors(
                    person,
                    InheritancePattern::AutosomalDominant,
                    ParentRole::Father,
                );
                priors.affected * 0.5
            }
        }
    }

    /// Reverse Bayesian update of parental probabilities given an observed
    /// child outcome. Mutates the passed records in place — callers hand in
    /// clones, never their originals. Outcomes other than
    /// affected/unaffected are ignored.
    pub fn reverse_update(
        &self,
        pattern: InheritancePattern,
        child_outcome: Status,
        father: &mut Person,
        mother: &mut Person,
        child_sex: Sex,
    ) {
        if !matches!(child_outcome, Status::Affected | Status::Unaffected) {
            return;
        }

        match pattern {
            InheritancePattern::AutosomalRecessive => {
                self.reverse_autosomal_recessive(child_outcome, father, mother)
            }
            InheritancePattern::AutosomalDominant => {
                self.reverse_autosomal_dominant(child_outcome, father, mother)
            }
            InheritancePattern::XLinked => {
                self.reverse_x_linked(child_outcome, father, mother, child_sex)
            }
        }
    }

    fn reverse_autosomal_recessive(
        &self,
        child_outcome: Status,
        father: &mut Person,
        mother: &mut Person,
    ) {
        match child_outcome {
            Status::Affected => {
                // An affected child received a mutant allele from each parent,
                // so each parent is at least a carrier. A parent observed
                // unaffected contradicts that; the contradiction is retained
                // as a forced zero, not corrected.
                for parent in [father, mother] {
                    if parent.status != Status::Unaffected {
                        parent.carrier_probability = Some(1.0);
                        parent.affected_probability = Some(0.0);
                    } else {
                        parent.carrier_probability = Some(0.0);
                    }
                }
            }
            Status::Unaffected => {
                // P(unaffected | carrier) = 0.75, P(unaffected | non-carrier) = 1.0.
                let prior_f = self
                    .rules
                    .parent_priors(father, InheritancePattern::AutosomalRecessive, ParentRole::Father)
                    .carrier;
                let prior_m = self
                    .rules
                    .parent_priors(mother, InheritancePattern::AutosomalRecessive, ParentRole::Mother)
                    .carrier;
                if let Some(posterior) = odds_update(prior_f, 0.75, 1.0) {
                    father.carrier_probability = Some(posterior);
                }
                if let Some(posterior) = odds_update(prior_m, 0.75, 1.0) {
                    mother.carrier_probability = Some(posterior);
                }
            }
            _ => {}
        }
    }

    fn reverse_autosomal_dominant(
        &self,
        child_outcome: Status,
        father: &mut Person,
        mother: &mut Person,
    ) {
        let prior_f = self.dominant_prior(father);
        let prior_m = self.dominant_prior(mother);

        match child_outcome {
            Status::Affected => {
                if prior_f == 0.0 && prior_m == 0.0 {
                    // Both parents unaffected yet the child is affected: the
                    // only remaining route is a de novo mutation.
                    father.affected_probability = Some(0.01);
                    mother.affected_probability = Some(0.01);
                } else if prior_f == 1.0 || prior_m == 1.0 {
                    // One parent definitely affected; Bayes-update the other.
                    // P(child affected | other affected too) = 1 − 0.5·0.5 = 0.75
                    // P(child affected) = 0.5 + 0.25·prior_other
                    if prior_f == 1.0 && is_interior(prior_m) {
                        let p_child_affected = 0.5 + 0.25 * prior_m;
                        let posterior = (prior_m * 0.75) / p_child_affected;
                        mother.affected_probability = Some(posterior.clamp(0.0, 1.0));
                    }
                    if prior_m == 1.0 && is_interior(prior_f) {
                        let p_child_affected = 0.5 + 0.25 * prior_f;
                        let posterior = (prior_f * 0.75) / p_child_affected;
                        father.affected_probability = Some(posterior.clamp(0.0, 1.0));
                    }
                } else {
                    // General two-parent formula:
                    // P(child affected) = 1 − (1 − 0.5·p_f)(1 − 0.5·p_m)
                    // P(child affected | parent i affected) = 0.5 + 0.25·p_other
                    let p_child_affected =
                        1.0 - (1.0 - 0.5 * prior_f) * (1.0 - 0.5 * prior_m);
                    if p_child_affected > 0.0 {
                        let posterior_f = (prior_f * (0.5 + 0.25 * prior_m)) / p_child_affected;
                        let posterior_m = (prior_m * (0.5 + 0.25 * prior_f)) / p_child_affected;
                        father.affected_probability = Some(posterior_f.clamp(0.0, 1.0));
                        mother.affected_probability = Some(posterior_m.clamp(0.0, 1.0));
                    }
                }
            }
            Status::Unaffected => {
                // P(child unaffected) = (1 − 0.5·p_f)(1 − 0.5·p_m)
                // P(child unaffected | parent i affected) = 0.5·(1 − 0.5·p_other)
                let p_child_unaffected = (1.0 - 0.5 * prior_f) * (1.0 - 0.5 * prior_m);
                if p_child_unaffected > 0.0 {
                    if is_interior(prior_f) {
                        let posterior =
                            (prior_f * 0.5 * (1.0 - 0.5 * prior_m)) / p_child_unaffected;
                        father.affected_probability = Some(posterior.clamp(0.0, 1.0));
                    }
                    if is_interior(prior_m) {
                        let posterior =
                            (prior_m * 0.5 * (1.0 - 0.5 * prior_f)) / p_child_unaffected;
                        mother.affected_probability = Some(posterior.clamp(0.0, 1.0));
                    }
                }
            }
            _ => {}
        }
    }

    fn reverse_x_linked(
        &self,
        child_outcome: Status,
        father: &mut Person,
        mother: &mut Person,
        child_sex: Sex,
    ) {
        match (child_outcome, child_sex) {
            (Status::Affected, Sex::Male) => {
                force_obligate_carrier(mother);
            }
            (Status::Affected, Sex::Female) => {
                // An affected daughter received a mutant X from each parent.
                if father.status != Status::Unaffected {
                    father.affected_probability = Some(1.0);
                } else {
                    father.affected_probability = Some(0.0);
                }
                force_obligate_carrier(mother);
            }
            (Status::Unaffected, sex) => {
                // An unaffected child is weak evidence against a carrier
                // mother: an unaffected son halves her odds, an unaffected
                // daughter (who could carry silently) is weaker still. The
                // down-weighting factors are 0.2 for sons and 0.5 for
                // daughters, applied only to interior priors.
                let factor = match sex {
                    Sex::Male => 0.2,
                    Sex::Female => 0.5,
                };
                let prior = self
                    .rules
                    .parent_priors(mother, InheritancePattern::XLinked, ParentRole::Mother)
                    .carrier;
                if is_interior(prior) {
                    mother.carrier_probability = Some((prior * factor).clamp(0.0, 1.0));
                }
            }
            _ => {}
        }
    }

    /// Prior that a parent carries the dominant allele: definite when the
    /// phenotype is observed, otherwise the override or population default.
    fn dominant_prior(&self, person: &Person) -> f64 {
        match person.status {
            Status::Affected | Status::Carrier => 1.0,
            Status::Unaffected => 0.0,
            Status::Unknown => self
                .rules
                .parent_priors(person, InheritancePattern::AutosomalDominant, ParentRole::Father)
                .affected,
        }
    }
}

/// Posterior for a binary hypothesis given one likelihood per branch;
/// `None` when the prior is not interior (definite priors stay definite).
fn odds_update(prior: f64, likelihood_true: f64, likelihood_false: f64) -> Option<f64> {
    if !is_interior(prior) {
        return None;
    }
    let numerator = likelihood_true * prior;
    Some(numerator / (numerator + likelihood_false * (1.0 - prior)))
}

fn is_interior(p: f64) -> bool {
    p > 0.0 && p < 1.0
}

/// An affected child makes this mother an obligate carrier, unless she was
/// observed unaffected, in which case the contradiction is kept as a zero.
fn force_obligate_carrier(mother: &mut Person) {
    if mother.status != Status::Unaffected {
        mother.carrier_probability = Some(1.0);
        mother.affected_probability = Some(0.0);
    } else {
        mother.carrier_probability = Some(0.0);
    }
}

fn point_result(risk: f64, model: &str, factors: Vec<String>) -> RiskResult {
    RiskResult {
        min: risk,
        max: risk,
        confidence: confidence_level(risk, risk),
        model: model.to_string(),
        factors,
        joint_posteriors: None,
        marginal_posteriors: None,
        bayesian_update: None,
    }
}

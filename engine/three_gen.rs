//! Three-Generation Joint-Genotype Bayesian Model
//!
//! Exact inference over a grandparent → parent → child lineage chain by
//! enumerating the full Cartesian product of the three genotype spaces
//! (3×3×3 for autosomal patterns, down to 2×3×2 for mixed-sex X-linked
//! chains; small enough that exact enumeration beats any approximation).
//!
//! For each triple the joint prior combines four independent terms:
//!
//! 1. the grandparent's observation-based genotype prior,
//! 2. Mendelian transmission grandparent → parent, marginalizing the
//!    parent's external co-parent over default population priors,
//! 3. the parent's own observation-based prior — an independent line of
//!    evidence on the same node, combined multiplicatively,
//! 4. Mendelian transmission parent → child, marginalizing the child's
//!    external co-parent the same way.
//!
//! Phenotype likelihoods for all three members then turn the joint prior
//! into an unnormalized joint posterior. Normalizing by the total posterior
//! mass yields the core invariant: the normalized joint posteriors sum to 1
//! over all enumerated triples. Marginals per generation fall out by
//! summation, the child's affected-genotype mass is the reported risk, and
//! the normalized Shannon entropy of the child's marginal drives the
//! confidence label.
//!
//! Observations that are mutually inconsistent under the model leave no
//! posterior mass; that case degrades to an explicit zero-risk,
//! low-confidence result rather than an error.

use crate::rules::PatternRules;
use crate::types::{
    BayesianUpdateResult, Confidence, Genotype, MarginalPosteriors, ModelParams, Observations,
    Person, PosteriorProbability, RiskResult,
};
use itertools::iproduct;
use std::collections::BTreeMap;

/// Default numerical-stability epsilon: triples below this mass are skipped
/// and a total posterior below it is treated as contradictory.
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Stateless three-generation engine; configuration only.
#[derive(Debug, Clone, Copy)]
pub struct ThreeGenEngine {
    epsilon: f64,
    rules: PatternRules,
}

impl Default for ThreeGenEngine {
    fn default() -> Self {
        ThreeGenEngine {
            epsilon: DEFAULT_EPSILON,
            rules: PatternRules::default(),
        }
    }
}

impl ThreeGenEngine {
    pub fn new() -> Self {
        ThreeGenEngine::default()
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        ThreeGenEngine {
            epsilon,
            ..ThreeGenEngine::default()
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn model_name(&self) -> &'static str {
        "three_generation"
    }

    pub fn generation_count(&self) -> u8 {
        3
    }

    /// Forward computation: enumerate, weigh, normalize, marginalize.
    pub fn compute_risk(
        &self,
        grandparent: &Person,
        parent: &Person,
        child: &Person,
        params: &ModelParams,
    ) -> RiskResult {
        let pattern = params.inheritance;
        let gp_space = PatternRules::genotype_space(pattern, params.grandparent_sex);
        let p_space = PatternRules::genotype_space(pattern, params.parent_sex);
        let c_space = PatternRules::genotype_space(pattern, params.child_sex);

        // The external co-parent at each step is the spouse of the chain
        // member above, so its sex is the opposite of the transmitting
        // parent's. Only X-linked tables depend on it.
        let external_for_parent =
            PatternRules::external_parent_distribution(pattern, opposite(params.grandparent_sex));
        let external_for_child =
            PatternRules::external_parent_distribution(pattern, opposite(params.parent_sex));

        let mut joint: Vec<((Genotype, Genotype, Genotype), f64)> = Vec::new();
        let mut total_posterior = 0.0_f64;

        for (&gp_gt, &p_gt, &c_gt) in iproduct!(gp_space, p_space, c_space) {
            let gp_prior =
                self.rules
                    .genotype_prior(grandparent, pattern, params.grandparent_sex, gp_gt);
            if gp_prior < self.epsilon {
                continue;
            }

            let trans_gp_p = self.rules.transmission(
                pattern,
                gp_gt,
                params.grandparent_sex,
                p_gt,
                params.parent_sex,
                external_for_parent,
            );
            if trans_gp_p < self.epsilon {
                continue;
            }

            let p_prior = self
                .rules
                .genotype_prior(parent, pattern, params.parent_sex, p_gt);

            let trans_p_c = self.rules.transmission(
                pattern,
                p_gt,
                params.parent_sex,
                c_gt,
                params.child_sex,
                external_for_child,
            );
            if trans_p_c < self.epsilon {
                continue;
            }

            let joint_prior = gp_prior * trans_gp_p * p_prior * trans_p_c;
            let likelihood = PatternRules::phenotype_likelihood(
                pattern,
                params.grandparent_sex,
                gp_gt,
                grandparent.status,
            ) * PatternRules::phenotype_likelihood(
                pattern,
                params.parent_sex,
                p_gt,
                parent.status,
            ) * PatternRules::phenotype_likelihood(
                pattern,
                params.child_sex,
                c_gt,
                child.status,
            );

            let joint_posterior = joint_prior * likelihood;
            joint.push(((gp_gt, p_gt, c_gt), joint_posterior));
            total_posterior += joint_posterior;
        }

        log::debug!(
            "three-gen enumeration: {} triples retained, total posterior {:.3e}",
            joint.len(),
            total_posterior
        );

        if total_posterior < self.epsilon {
            // No genotype assignment is consistent with the observations.
            // This is a valid (flagged) result, not an error.
            return RiskResult {
                min: 0.0,
                max: 0.0,
                confidence: Confidence::Low,
                model: self.model_name().to_string(),
                factors: vec![
                    "No valid genotype combinations match observed phenotypes".to_string(),
                ],
                joint_posteriors: Some(BTreeMap::new()),
                marginal_posteriors: Some(MarginalPosteriors::default()),
                bayesian_update: None,
            };
        }

        let mut joint_posteriors = BTreeMap::new();
        let mut marginals = MarginalPosteriors::default();
        let mut child_risk = 0.0_f64;

        for ((gp_gt, p_gt, c_gt), mass) in joint {
            let normalized = mass / total_posterior;
            joint_posteriors.insert(format!("{gp_gt}_{p_gt}_{c_gt}"), normalized);
            *marginals
                .grandparent
                .entry(gp_gt.label().to_string())
                .or_insert(0.0) += normalized;
            *marginals
                .parent
                .entry(p_gt.label().to_string())
                .or_insert(0.0) += normalized;
            *marginals
                .child
                .entry(c_gt.label().to_string())
                .or_insert(0.0) += normalized;
            if PatternRules::is_affected_genotype(pattern, params.child_sex, c_gt) {
                child_risk += normalized;
            }
        }

        let confidence = entropy_confidence(&marginals.child, c_space.len(), self.epsilon);

        RiskResult {
            min: child_risk,
            max: child_risk,
            confidence,
            model: self.model_name().to_string(),
            factors: vec![
                format!("Grandparent status: {}", grandparent.status),
                format!("Parent status: {}", parent.status),
                format!("Child status: {}", child.status),
                format!("Inheritance: {}", pattern),
                "Joint genotype enumeration across 3 generations".to_string(),
            ],
            joint_posteriors: Some(joint_posteriors),
            marginal_posteriors: Some(marginals),
            bayesian_update: None,
        }
    }

    /// Reverse inference. The forward computation already applies phenotype
    /// likelihoods, so the update is the same computation with observations
    /// overlaid on the priors; its marginals are then repackaged as refreshed
    /// per-role priors.
    pub fn bayesian_update(
        &self,
        observations: &Observations,
        grandparent: &Person,
        parent: &Person,
        child: &Person,
        params: &ModelParams,
    ) -> BayesianUpdateResult {
        let mut grandparent = grandparent.clone();
        let mut parent = parent.clone();
        let mut child = child.clone();
        if let Some(status) = observations.grandparent {
            grandparent.status = status;
        }
        if let Some(status) = observations.parent {
            parent.status = status;
        }
        if let Some(status) = observations.child {
            child.status = status;
        }

        let result = self.compute_risk(&grandparent, &parent, &child, params);
        let marginals = result.marginal_posteriors.unwrap_or_default();
        let joint = result.joint_posteriors.unwrap_or_default();

        let mut updated_priors = BTreeMap::new();
        let mut posterior_probabilities = BTreeMap::new();

        for (role, marginal) in [
            ("grandparent", &marginals.grandparent),
            ("parent", &marginals.parent),
            ("child", &marginals.child),
        ] {
            if marginal.is_empty() {
                continue;
            }
            let mut person = Person::unknown();
            person.genotype_probabilities = Some(marginal.clone());
            updated_priors.insert(role.to_string(), person);
        }

        // Carrier/affected scalars are only well-defined for the autosomal
        // recessive ancestor roles.
        if params.inheritance == crate::types::InheritancePattern::AutosomalRecessive {
            for (role, marginal) in [
                ("grandparent", &marginals.grandparent),
                ("parent", &marginals.parent),
            ] {
                if marginal.is_empty() {
                    continue;
                }
                posterior_probabilities.insert(
                    role.to_string(),
                    PosteriorProbability::CarrierAffected {
                        carrier_probability: marginal.get("Aa").copied().unwrap_or(0.0),
                        affected_probability: marginal.get("aa").copied().unwrap_or(0.0),
                    },
                );
            }
        }

        BayesianUpdateResult {
            updated_priors,
            posterior_probabilities,
            joint_posteriors: Some(joint),
            marginal_posteriors: Some(marginals),
        }
    }
}

fn opposite(sex: crate::types::Sex) -> crate::types::Sex {
    match sex {
        crate::types::Sex::Male => crate::types::Sex::Female,
        crate::types::Sex::Female => crate::types::Sex::Male,
    }
}

/// Confidence from the normalized Shannon entropy of the child's marginal:
/// `H = −Σ p·ln(p + ε)` over positive masses, divided by `ln |space|`.
/// A concentrated marginal (low entropy) is high confidence; a near-uniform
/// one is low.
pub fn entropy_confidence(
    child_marginal: &BTreeMap<String, f64>,
    space_size: usize,
    epsilon: f64,
) -> Confidence {
    let max_entropy = (space_size as f64).ln();
    if max_entropy <= 0.0 {
        return Confidence::High;
    }
    let entropy: f64 = child_marginal
        .values()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * (p + epsilon).ln())
        .sum();
    let normalized = entropy / max_entropy;
    if normalized < 0.3 {
        Confidence::High
    } else if normalized < 0.7 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

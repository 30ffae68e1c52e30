//! Model Selection and the Request Entry Point
//!
//! A single polymorphic surface over the two concrete engines. Dispatch is a
//! tagged variant rather than open-ended dynamic typing: the factory decides
//! once, by requested generation count, and everything downstream is a plain
//! match.
//!
//! `evaluate` is the boundary the transport layer calls: it runs the forward
//! computation and, when a child outcome was observed, the reverse update as
//! well, embedding the update summary into the forward result.

use crate::three_gen::{DEFAULT_EPSILON, ThreeGenEngine};
use crate::two_gen::{TwoGenEngine, carrier_probability_estimate};
use crate::types::{
    BayesianUpdate, BayesianUpdateResult, ModelError, ModelParams, Observations, Pedigree, Person,
    PosteriorProbability, RiskResult, Status,
};
use serde::{Deserialize, Serialize};

/// The two concrete risk models behind one dispatch point.
#[derive(Debug, Clone, Copy)]
pub enum RiskModel {
    TwoGeneration(TwoGenEngine),
    ThreeGeneration(ThreeGenEngine),
}

impl RiskModel {
    pub fn model_name(&self) -> &'static str {
        match self {
            RiskModel::TwoGeneration(engine) => engine.model_name(),
            RiskModel::ThreeGeneration(engine) => engine.model_name(),
        }
    }

    pub fn generation_count(&self) -> u8 {
        match self {
            RiskModel::TwoGeneration(engine) => engine.generation_count(),
            RiskModel::ThreeGeneration(engine) => engine.generation_count(),
        }
    }

    /// Forward risk computation. The pedigree shape must match the model the
    /// factory selected.
    pub fn compute_risk(
        &self,
        pedigree: &Pedigree,
        params: &ModelParams,
    ) -> Result<RiskResult, ModelError> {
        match (self, pedigree) {
            (RiskModel::TwoGeneration(engine), Pedigree::TwoGeneration { father, mother }) => {
                Ok(engine.compute_risk(father, mother, params.inheritance, params.child_sex))
            }
            (
                RiskModel::ThreeGeneration(engine),
                Pedigree::ThreeGeneration {
                    grandparent,
                    parent,
                    child,
                },
            ) => Ok(engine.compute_risk(grandparent, parent, child, params)),
            (RiskModel::TwoGeneration(_), _) => Err(ModelError::MismatchedPedigree { expected: 2 }),
            (RiskModel::ThreeGeneration(_), _) => {
                Err(ModelError::MismatchedPedigree { expected: 3 })
            }
        }
    }

    /// Reverse Bayesian update. Caller-supplied priors are never modified;
    /// all updates land in the returned records.
    pub fn bayesian_update(
        &self,
        observations: &Observations,
        priors: &Pedigree,
        params: &ModelParams,
    ) -> Result<BayesianUpdateResult, ModelError> {
        match (self, priors) {
            (RiskModel::TwoGeneration(engine), Pedigree::TwoGeneration { father, mother }) => {
                let mut father = father.clone();
                let mut mother = mother.clone();
                if let Some(outcome) = observations.child {
                    engine.reverse_update(
                        params.inheritance,
                        outcome,
                        &mut father,
                        &mut mother,
                        params.child_sex,
                    );
                }
                let mut result = BayesianUpdateResult::default();
                result.posterior_probabilities.insert(
                    "parent1".to_string(),
                    PosteriorProbability::Scalar(carrier_probability_estimate(&father)),
                );
                result.posterior_probabilities.insert(
                    "parent2".to_string(),
                    PosteriorProbability::Scalar(carrier_probability_estimate(&mother)),
                );
                result.updated_priors.insert("parent1".to_string(), father);
                result.updated_priors.insert("parent2".to_string(), mother);
                Ok(result)
            }
            (
                RiskModel::ThreeGeneration(engine),
                Pedigree::ThreeGeneration {
                    grandparent,
                    parent,
                    child,
                },
            ) => Ok(engine.bayesian_update(observations, grandparent, parent, child, params)),
            (RiskModel::TwoGeneration(_), _) => Err(ModelError::MismatchedPedigree { expected: 2 }),
            (RiskModel::ThreeGeneration(_), _) => {
                Err(ModelError::MismatchedPedigree { expected: 3 })
            }
        }
    }
}

/// Factory: 2 → closed-form model, 3 → joint-enumeration model with the
/// default epsilon; anything else is a caller-input error.
pub fn create_model(generations: u64) -> Result<RiskModel, ModelError> {
    create_model_with_epsilon(generations, DEFAULT_EPSILON)
}

/// Same as [`create_model`], with an explicit numerical-stability epsilon for
/// the three-generation model.
pub fn create_model_with_epsilon(generations: u64, epsilon: f64) -> Result<RiskModel, ModelError> {
    match generations {
        2 => Ok(RiskModel::TwoGeneration(TwoGenEngine::new())),
        3 => Ok(RiskModel::ThreeGeneration(ThreeGenEngine::with_epsilon(
            epsilon,
        ))),
        other => Err(ModelError::UnsupportedGenerationCount(other)),
    }
}

/// The structured request consumed from the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRequest {
    pub inheritance_type: crate::types::InheritancePattern,
    pub parent1: Person,
    pub parent2: Person,
    pub child_sex: crate::types::Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_child_outcome: Option<Status>,
    #[serde(default = "default_generations")]
    pub generations: u64,
}

fn default_generations() -> u64 {
    2
}

/// Evaluate one request end to end: forward computation, plus the reverse
/// update when a definite child outcome was observed. Pure in its inputs.
pub fn evaluate(request: &RiskRequest) -> Result<RiskResult, ModelError> {
    let model = create_model(request.generations)?;
    log::info!(
        "dispatching {} request to the {} model",
        request.inheritance_type,
        model.model_name()
    );
    match model {
        RiskModel::TwoGeneration(engine) => Ok(evaluate_two_gen(&engine, request)),
        RiskModel::ThreeGeneration(engine) => Ok(evaluate_three_gen(&engine, request)),
    }
}

fn evaluate_two_gen(engine: &TwoGenEngine, request: &RiskRequest) -> RiskResult {
    let pattern = request.inheritance_type;
    let mut result = engine.compute_risk(
        &request.parent1,
        &request.parent2,
        pattern,
        request.child_sex,
    );

    if let Some(outcome) = definite_outcome(request.observed_child_outcome) {
        // The update operates on clones; the request's records stay intact.
        let mut father = request.parent1.clone();
        let mut mother = request.parent2.clone();
        engine.reverse_update(pattern, outcome, &mut father, &mut mother, request.child_sex);
        let updated_risk = engine.compute_risk(&father, &mother, pattern, request.child_sex);

        result.bayesian_update = Some(Box::new(BayesianUpdate {
            observed_outcome: outcome,
            parent1_original_status: request.parent1.status,
            parent2_original_status: request.parent2.status,
            parent1_carrier_probability: carrier_probability_estimate(&father),
            parent2_carrier_probability: carrier_probability_estimate(&mother),
            updated_risk,
            joint_posteriors: None,
            marginal_posteriors: None,
        }));
    }

    result
}

/// Three-generation requests reuse the two-parent wire shape: parent1 is the
/// grandparent of the lineage, parent2 the parent, and the target child is
/// unknown until an outcome is observed.
fn evaluate_three_gen(engine: &ThreeGenEngine, request: &RiskRequest) -> RiskResult {
    let params = ModelParams::new(request.inheritance_type, request.child_sex);
    let grandparent = request.parent1.clone();
    let parent = request.parent2.clone();
    let child = Person::unknown();

    let mut result = engine.compute_risk(&grandparent, &parent, &child, &params);

    if let Some(outcome) = definite_outcome(request.observed_child_outcome) {
        let observations = Observations {
            grandparent: Some(grandparent.status),
            parent: Some(parent.status),
            child: Some(outcome),
        };
        let update = engine.bayesian_update(&observations, &grandparent, &parent, &child, &params);

        let mut updated_grandparent = grandparent.clone();
        let mut updated_parent = parent.clone();
        if let Some(person) = update.updated_priors.get("grandparent") {
            updated_grandparent.genotype_probabilities = person.genotype_probabilities.clone();
        }
        if let Some(person) = update.updated_priors.get("parent") {
            updated_parent.genotype_probabilities = person.genotype_probabilities.clone();
        }
        let observed_child = Person::with_status(outcome);
        let updated_risk =
            engine.compute_risk(&updated_grandparent, &updated_parent, &observed_child, &params);

        result.bayesian_update = Some(Box::new(BayesianUpdate {
            observed_outcome: outcome,
            parent1_original_status: request.parent1.status,
            parent2_original_status: request.parent2.status,
            parent1_carrier_probability: carrier_scalar(&update, "grandparent"),
            parent2_carrier_probability: carrier_scalar(&update, "parent"),
            updated_risk,
            joint_posteriors: update.joint_posteriors,
            marginal_posteriors: update.marginal_posteriors,
        }));
    }

    result
}

fn definite_outcome(outcome: Option<Status>) -> Option<Status> {
    outcome.filter(|status| *status != Status::Unknown)
}

fn carrier_scalar(update: &BayesianUpdateResult, role: &str) -> f64 {
    match update.posterior_probabilities.get(role) {
        Some(PosteriorProbability::CarrierAffected {
            carrier_probability,
            ..
        }) => *carrier_probability,
        Some(PosteriorProbability::Scalar(p)) => *p,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InheritancePattern, Sex};
    use approx::assert_relative_eq;

    fn request(
        pattern: InheritancePattern,
        father: Status,
        mother: Status,
        child_sex: Sex,
    ) -> RiskRequest {
        RiskRequest {
            inheritance_type: pattern,
            parent1: Person::with_status(father),
            parent2: Person::with_status(mother),
            child_sex,
            observed_child_outcome: None,
            generations: 2,
        }
    }

    #[test]
    fn factory_dispatches_by_generation_count() {
        let two = create_model(2).unwrap();
        assert_eq!(two.model_name(), "two_generation");
        assert_eq!(two.generation_count(), 2);

        let three = create_model(3).unwrap();
        assert_eq!(three.model_name(), "three_generation");
        assert_eq!(three.generation_count(), 3);
    }

    #[test]
    fn factory_rejects_other_generation_counts() {
        for generations in [0, 1, 4, 7] {
            assert_eq!(
                create_model(generations).unwrap_err(),
                ModelError::UnsupportedGenerationCount(generations)
            );
        }
    }

    #[test]
    fn mismatched_pedigree_shape_is_an_error() {
        let model = create_model(2).unwrap();
        let pedigree = Pedigree::ThreeGeneration {
            grandparent: Person::unknown(),
            parent: Person::unknown(),
            child: Person::unknown(),
        };
        let params = ModelParams::new(InheritancePattern::AutosomalRecessive, Sex::Male);
        assert_eq!(
            model.compute_risk(&pedigree, &params).unwrap_err(),
            ModelError::MismatchedPedigree { expected: 2 }
        );
    }

    #[test]
    fn evaluate_without_observation_has_no_update() {
        let req = request(
            InheritancePattern::AutosomalRecessive,
            Status::Carrier,
            Status::Carrier,
            Sex::Male,
        );
        let result = evaluate(&req).unwrap();
        assert_relative_eq!(result.min, 0.25);
        assert!(result.bayesian_update.is_none());
    }

    #[test]
    fn evaluate_embeds_the_reverse_update() {
        let mut req = request(
            InheritancePattern::AutosomalRecessive,
            Status::Unknown,
            Status::Unknown,
            Sex::Male,
        );
        req.observed_child_outcome = Some(Status::Affected);

        let result = evaluate(&req).unwrap();
        let update = result.bayesian_update.as_ref().unwrap();
        assert_eq!(update.observed_outcome, Status::Affected);
        assert_eq!(update.parent1_original_status, Status::Unknown);
        assert_relative_eq!(update.parent1_carrier_probability, 1.0);
        assert_relative_eq!(update.parent2_carrier_probability, 1.0);
        assert_relative_eq!(update.updated_risk.min, 0.25);

        // Request inputs stay untouched.
        assert!(req.parent1.carrier_probability.is_none());
        assert!(req.parent2.carrier_probability.is_none());
    }

    #[test]
    fn evaluate_unknown_outcome_is_a_no_op() {
        let mut req = request(
            InheritancePattern::XLinked,
            Status::Unknown,
            Status::Carrier,
            Sex::Male,
        );
        req.observed_child_outcome = Some(Status::Unknown);
        let result = evaluate(&req).unwrap();
        assert!(result.bayesian_update.is_none());
    }

    #[test]
    fn evaluate_three_generations_reports_posteriors() {
        let mut req = request(
            InheritancePattern::AutosomalRecessive,
            Status::Carrier,
            Status::Unknown,
            Sex::Male,
        );
        req.generations = 3;
        req.observed_child_outcome = Some(Status::Affected);

        let result = evaluate(&req).unwrap();
        assert_eq!(result.model, "three_generation");

        let update = result.bayesian_update.as_ref().unwrap();
        assert!(update.joint_posteriors.is_some());
        let marginals = update.marginal_posteriors.as_ref().unwrap();
        let sum: f64 = marginals.child.values().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        // The affected grandchild pulls the lineage toward carrier states.
        assert!(update.parent2_carrier_probability > 0.5);
    }

    #[test]
    fn two_gen_bayesian_update_never_mutates_priors() {
        let model = create_model(2).unwrap();
        let father = Person::with_status(Status::Unknown);
        let mother = Person::with_status(Status::Unknown);
        let pedigree = Pedigree::TwoGeneration {
            father: father.clone(),
            mother: mother.clone(),
        };
        let params = ModelParams::new(InheritancePattern::AutosomalRecessive, Sex::Male);
        let observations = Observations {
            child: Some(Status::Affected),
            ..Observations::default()
        };

        let update = model
            .bayesian_update(&observations, &pedigree, &params)
            .unwrap();
        assert_eq!(
            update.updated_priors.get("parent1").unwrap().carrier_probability,
            Some(1.0)
        );
        assert_eq!(
            pedigree,
            Pedigree::TwoGeneration {
                father,
                mother,
            }
        );
    }

    #[test]
    fn request_json_defaults_to_two_generations() {
        let raw = r#"{
            "inheritance_type": "autosomal_recessive",
            "parent1": {"status": "carrier"},
            "parent2": {"status": "carrier"},
            "child_sex": "male"
        }"#;
        let req: RiskRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.generations, 2);
        assert!(req.observed_child_outcome.is_none());
        let result = evaluate(&req).unwrap();
        assert_relative_eq!(result.min, 0.25);
    }
}

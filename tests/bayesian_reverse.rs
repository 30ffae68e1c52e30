// End-to-end reverse-update behavior through the public `evaluate` entry
// point: an observed child outcome refines the parental probabilities and the
// refined forward risk is embedded alongside the original.

use approx::assert_relative_eq;
use mendel::model::{RiskRequest, evaluate};
use mendel::types::{InheritancePattern, Person, Sex, Status};

fn request_with_outcome(
    pattern: InheritancePattern,
    father: Status,
    mother: Status,
    child_sex: Sex,
    outcome: Status,
) -> RiskRequest {
    RiskRequest {
        inheritance_type: pattern,
        parent1: Person::with_status(father),
        parent2: Person::with_status(mother),
        child_sex,
        observed_child_outcome: Some(outcome),
        generations: 2,
    }
}

#[test]
fn affected_child_of_unknown_parents_reveals_obligate_carriers() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalRecessive,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    // The forward risk still reflects the priors from before the observation.
    let prior_transmit = 0.01 * 0.5 + 0.0001;
    assert_relative_eq!(result.min, prior_transmit * prior_transmit, epsilon = 1e-12);

    let update = result.bayesian_update.as_ref().unwrap();
    assert_eq!(update.observed_outcome, Status::Affected);
    assert_eq!(update.parent1_original_status, Status::Unknown);
    assert_eq!(update.parent2_original_status, Status::Unknown);
    assert_relative_eq!(update.parent1_carrier_probability, 1.0);
    assert_relative_eq!(update.parent2_carrier_probability, 1.0);

    // Two obligate carriers put the next pregnancy at the classic 1 in 4.
    assert_relative_eq!(update.updated_risk.min, 0.25, epsilon = 1e-12);
    assert_relative_eq!(update.updated_risk.max, 0.25, epsilon = 1e-12);
}

#[test]
fn unaffected_child_shrinks_recessive_carrier_odds() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalRecessive,
        Status::Unknown,
        Status::Unknown,
        Sex::Female,
        Status::Unaffected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    // Posterior odds with P(unaffected | carrier) = 0.75 against 1.0.
    let expected = (0.75 * 0.01) / (0.75 * 0.01 + 0.99);
    assert_relative_eq!(update.parent1_carrier_probability, expected, epsilon = 1e-12);
    assert_relative_eq!(update.parent2_carrier_probability, expected, epsilon = 1e-12);
    assert!(update.updated_risk.min < result.min);
}

#[test]
fn dominant_affected_child_of_unknown_parents() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalDominant,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    let prior = 0.001;
    let p_child = 1.0 - (1.0 - 0.5 * prior) * (1.0 - 0.5 * prior);
    let expected = (prior * (0.5 + 0.25 * prior)) / p_child;
    assert_relative_eq!(update.parent1_carrier_probability, expected, epsilon = 1e-12);
    assert_relative_eq!(update.parent2_carrier_probability, expected, epsilon = 1e-12);
    // An affected child is strong evidence for a transmitting parent.
    assert!(expected > 0.5);
    assert!(update.updated_risk.min > result.min);
}

#[test]
fn dominant_de_novo_fallback_for_unaffected_parents() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalDominant,
        Status::Unaffected,
        Status::Unaffected,
        Sex::Female,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    assert_relative_eq!(update.parent1_carrier_probability, 0.01);
    assert_relative_eq!(update.parent2_carrier_probability, 0.01);
}

#[test]
fn x_linked_affected_son_marks_the_mother() {
    let req = request_with_outcome(
        InheritancePattern::XLinked,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    assert_relative_eq!(update.parent2_carrier_probability, 1.0);
    // The father contributes no X to a son; his estimate is untouched.
    assert_relative_eq!(update.parent1_carrier_probability, 0.0);
    assert_relative_eq!(update.updated_risk.min, 0.5, epsilon = 1e-12);
}

#[test]
fn x_linked_affected_daughter_marks_both_parents() {
    let req = request_with_outcome(
        InheritancePattern::XLinked,
        Status::Unknown,
        Status::Unknown,
        Sex::Female,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    // An affected daughter received a mutant X from each parent: the father
    // is affected and the mother an obligate carrier.
    assert_relative_eq!(update.parent1_carrier_probability, 1.0);
    assert_relative_eq!(update.parent2_carrier_probability, 1.0);

    // The recomputed risk must be the 0.5 point, not an interval: the
    // forced paternal probability pins the daughter's paternal X.
    assert_relative_eq!(update.updated_risk.min, 0.5, epsilon = 1e-12);
    assert_relative_eq!(update.updated_risk.max, 0.5, epsilon = 1e-12);
}

#[test]
fn dominant_unaffected_child_shrinks_both_parents() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalDominant,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Unaffected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    // P(child unaffected | parent affected) = 0.5·(1 − 0.5·p_other),
    // P(child unaffected) = (1 − 0.5·p_f)(1 − 0.5·p_m).
    let prior = 0.001;
    let p_child = (1.0 - 0.5 * prior) * (1.0 - 0.5 * prior);
    let expected = (prior * 0.5 * (1.0 - 0.5 * prior)) / p_child;
    assert_relative_eq!(update.parent1_carrier_probability, expected, epsilon = 1e-12);
    assert_relative_eq!(update.parent2_carrier_probability, expected, epsilon = 1e-12);
    // An unaffected child is mild evidence against a transmitting parent.
    assert!(expected < prior);
    assert!(update.updated_risk.min < result.min);
}

#[test]
fn x_linked_unaffected_children_downweight_the_mother() {
    let son = evaluate(&request_with_outcome(
        InheritancePattern::XLinked,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Unaffected,
    ))
    .unwrap();
    let daughter = evaluate(&request_with_outcome(
        InheritancePattern::XLinked,
        Status::Unknown,
        Status::Unknown,
        Sex::Female,
        Status::Unaffected,
    ))
    .unwrap();

    let son_update = son.bayesian_update.as_ref().unwrap();
    let daughter_update = daughter.bayesian_update.as_ref().unwrap();
    assert_relative_eq!(son_update.parent2_carrier_probability, 0.01 * 0.2, epsilon = 1e-12);
    assert_relative_eq!(
        daughter_update.parent2_carrier_probability,
        0.01 * 0.5,
        epsilon = 1e-12
    );
    // An unaffected son is the stronger evidence of the two.
    assert!(
        son_update.parent2_carrier_probability < daughter_update.parent2_carrier_probability
    );
}

#[test]
fn contradictory_observation_is_retained_not_corrected() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalRecessive,
        Status::Unaffected,
        Status::Unknown,
        Sex::Male,
        Status::Affected,
    );
    let result = evaluate(&req).unwrap();

    let update = result.bayesian_update.as_ref().unwrap();
    // The unaffected father cannot have transmitted, so his posterior is a
    // forced zero and the updated risk collapses with it.
    assert_relative_eq!(update.parent1_carrier_probability, 0.0);
    assert_relative_eq!(update.parent2_carrier_probability, 1.0);
    assert_relative_eq!(update.updated_risk.min, 0.0, epsilon = 1e-12);
}

#[test]
fn unknown_outcome_triggers_no_update() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalRecessive,
        Status::Carrier,
        Status::Carrier,
        Sex::Male,
        Status::Unknown,
    );
    let result = evaluate(&req).unwrap();
    assert!(result.bayesian_update.is_none());
}

#[test]
fn request_records_are_never_mutated() {
    let req = request_with_outcome(
        InheritancePattern::AutosomalRecessive,
        Status::Unknown,
        Status::Unknown,
        Sex::Male,
        Status::Affected,
    );
    let snapshot = req.clone();
    let _ = evaluate(&req).unwrap();
    assert_eq!(req, snapshot);
    assert!(req.parent1.carrier_probability.is_none());
    assert!(req.parent2.carrier_probability.is_none());
}

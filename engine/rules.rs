//! Mendelian Pattern Rules
//!
//! Static knowledge of genotype spaces, transmission rules, and
//! phenotype-likelihood rules for the three supported inheritance patterns
//! (autosomal recessive, autosomal dominant, X-linked recessive). Both
//! engines consume this module and nothing else encodes Mendelian genetics.
//!
//! # Background
//!
//! Transmission follows classic Mendelian segregation: an autosomal parent
//! contributes one of its two alleles with equal probability, an X-linked
//! mother contributes one of her two X alleles with equal probability, and an
//! X-linked father contributes Y to sons and his single X allele to
//! daughters. When a child's co-parent is not part of the modeled pedigree,
//! its contribution is marginalized over a documented default population
//! genotype distribution.
//!
//! # A note on the external tables
//!
//! The default external co-parent distributions are fixed constants of the
//! model. The autosomal table sums to 1.0001 rather than 1; both allele
//! masses are therefore computed by direct summation over the table, never by
//! complementation, and the enumeration engine's normalization step absorbs
//! the excess.

use crate::types::{Genotype, InheritancePattern, Person, Sex, Status};

/// Genotype space for both autosomal patterns, either sex.
pub const AUTOSOMAL_GENOTYPES: [Genotype; 3] =
    [Genotype::HomNormal, Genotype::Het, Genotype::HomMutant];

/// Genotype space for X-linked males.
pub const X_LINKED_MALE_GENOTYPES: [Genotype; 2] = [Genotype::MaleNormal, Genotype::MaleMutant];

/// Genotype space for X-linked females.
pub const X_LINKED_FEMALE_GENOTYPES: [Genotype; 3] = [
    Genotype::FemaleNormal,
    Genotype::FemaleCarrier,
    Genotype::FemaleMutant,
];

const EXTERNAL_AUTOSOMAL: [(Genotype, f64); 3] = [
    (Genotype::HomNormal, 0.99),
    (Genotype::Het, 0.01),
    (Genotype::HomMutant, 0.0001),
];

const EXTERNAL_X_FEMALE: [(Genotype, f64); 3] = [
    (Genotype::FemaleNormal, 0.99),
    (Genotype::FemaleCarrier, 0.01),
    (Genotype::FemaleMutant, 0.0001),
];

const EXTERNAL_X_MALE: [(Genotype, f64); 2] =
    [(Genotype::MaleNormal, 0.9995), (Genotype::MaleMutant, 0.0005)];

/// Default population priors for rare Mendelian disorders. Conservative, and
/// overridable per person via `carrier_probability` / `affected_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationPriors {
    /// P(parent is heterozygous Aa), autosomal recessive.
    pub ar_carrier: f64,
    /// P(parent is aa), autosomal recessive.
    pub ar_affected: f64,
    /// P(parent is affected, i.e. heterozygous), autosomal dominant.
    pub ad_affected: f64,
    pub x_mother_carrier: f64,
    pub x_mother_affected: f64,
    pub x_father_affected: f64,
}

impl Default for PopulationPriors {
    fn default() -> Self {
        PopulationPriors {
            ar_carrier: 0.01,
            ar_affected: 0.0001,
            ad_affected: 0.001,
            x_mother_carrier: 0.01,
            x_mother_affected: 0.0001,
            x_father_affected: 0.0005,
        }
    }
}

/// Scalar carrier/affected priors for one parent, already resolved against
/// per-person overrides. The two-generation formulas consume these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentPriors {
    pub carrier: f64,
    pub affected: f64,
}

/// Role of a parent in the two-generation pedigree. Only X-linked rules
/// distinguish the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRole {
    Father,
    Mother,
}

/// Immutable rule table shared by both engines. Holds only configuration; all
/// methods are pure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PatternRules {
    priors: PopulationPriors,
}

impl PatternRules {
    pub fn new(priors: PopulationPriors) -> Self {
        PatternRules { priors }
    }

    pub fn priors(&self) -> &PopulationPriors {
        &self.priors
    }

    /// The fixed, exhaustive genotype set for a pattern and sex.
    pub fn genotype_space(pattern: InheritancePattern, sex: Sex) -> &'static [Genotype] {
        match pattern {
            InheritancePattern::AutosomalRecessive | InheritancePattern::AutosomalDominant => {
                &AUTOSOMAL_GENOTYPES
            }
            InheritancePattern::XLinked => match sex {
                Sex::Male => &X_LINKED_MALE_GENOTYPES,
                Sex::Female => &X_LINKED_FEMALE_GENOTYPES,
            },
        }
    }

    /// Default genotype distribution for a co-parent that is external to the
    /// modeled lineage. `sex` is the sex of that external co-parent; it only
    /// matters for X-linked loci.
    pub fn external_parent_distribution(
        pattern: InheritancePattern,
        sex: Sex,
    ) -> &'static [(Genotype, f64)] {
        match pattern {
            InheritancePattern::AutosomalRecessive | InheritancePattern::AutosomalDominant => {
                &EXTERNAL_AUTOSOMAL
            }
            InheritancePattern::XLinked => match sex {
                Sex::Male => &EXTERNAL_X_MALE,
                Sex::Female => &EXTERNAL_X_FEMALE,
            },
        }
    }

    /// Resolved scalar priors for a two-generation parent.
    pub fn parent_priors(
        &self,
        person: &Person,
        pattern: InheritancePattern,
        role: ParentRole,
    ) -> ParentPriors {
        match pattern {
            InheritancePattern::AutosomalRecessive => ParentPriors {
                carrier: person.carrier_probability.unwrap_or(self.priors.ar_carrier),
                affected: person
                    .affected_probability
                    .unwrap_or(self.priors.ar_affected),
            },
            InheritancePattern::AutosomalDominant => ParentPriors {
                carrier: 0.0,
                affected: person
                    .affected_probability
                    .unwrap_or(self.priors.ad_affected),
            },
            InheritancePattern::XLinked => match role {
                ParentRole::Mother => ParentPriors {
                    carrier: person
                        .carrier_probability
                        .unwrap_or(self.priors.x_mother_carrier),
                    affected: person
                        .affected_probability
                        .unwrap_or(self.priors.x_mother_affected),
                },
                ParentRole::Father => ParentPriors {
                    carrier: 0.0,
                    affected: person
                        .affected_probability
                        .unwrap_or(self.priors.x_father_affected),
                },
            },
        }
    }

    /// Prior probability of `genotype` for one person, given their observed
    /// status. An explicit `genotype_probabilities` map wins outright.
    pub fn genotype_prior(
        &self,
        person: &Person,
        pattern: InheritancePattern,
        sex: Sex,
        genotype: Genotype,
    ) -> f64 {
        if let Some(map) = &person.genotype_probabilities {
            return map.get(genotype.label()).copied().unwrap_or(0.0);
        }

        match pattern {
            InheritancePattern::AutosomalRecessive => match person.status {
                Status::Affected => indicator(genotype, Genotype::HomMutant),
                Status::Carrier => indicator(genotype, Genotype::Het),
                Status::Unaffected => indicator(genotype, Genotype::HomNormal),
                Status::Unknown => {
                    let carrier = person.carrier_probability.unwrap_or(self.priors.ar_carrier);
                    let affected = person
                        .affected_probability
                        .unwrap_or(self.priors.ar_affected);
                    match genotype {
                        Genotype::HomNormal => 1.0 - carrier - affected,
                        Genotype::Het => carrier,
                        Genotype::HomMutant => affected,
                        _ => 0.0,
                    }
                }
            },
            InheritancePattern::AutosomalDominant => match person.status {
                // Affected dominant individuals are overwhelmingly heterozygous;
                // homozygous mutants exist but are rare.
                Status::Affected | Status::Carrier => match genotype {
                    Genotype::Het => 0.99,
                    Genotype::HomMutant => 0.01,
                    _ => 0.0,
                },
                Status::Unaffected => indicator(genotype, Genotype::HomNormal),
                Status::Unknown => {
                    let affected = person
                        .affected_probability
                        .unwrap_or(self.priors.ad_affected);
                    match genotype {
                        Genotype::HomNormal => 1.0 - affected,
                        Genotype::Het => affected * 0.99,
                        Genotype::HomMutant => affected * 0.01,
                        _ => 0.0,
                    }
                }
            },
            InheritancePattern::XLinked => match sex {
                Sex::Female => match person.status {
                    Status::Affected => indicator(genotype, Genotype::FemaleMutant),
                    Status::Carrier => indicator(genotype, Genotype::FemaleCarrier),
                    Status::Unaffected => indicator(genotype, Genotype::FemaleNormal),
                    Status::Unknown => {
                        let carrier = person
                            .carrier_probability
                            .unwrap_or(self.priors.x_mother_carrier);
                        let affected = person
                            .affected_probability
                            .unwrap_or(self.priors.x_mother_affected);
                        match genotype {
                            Genotype::FemaleNormal => 1.0 - carrier - affected,
                            Genotype::FemaleCarrier => carrier,
                            Genotype::FemaleMutant => affected,
                            _ => 0.0,
                        }
                    }
                },
                Sex::Male => match person.status {
                    Status::Affected => indicator(genotype, Genotype::MaleMutant),
                    Status::Unaffected => indicator(genotype, Genotype::MaleNormal),
                    // A hemizygous male has no carrier state; the status is
                    // inconsistent with every male genotype.
                    Status::Carrier => 0.0,
                    Status::Unknown => {
                        let affected = person
                            .affected_probability
                            .unwrap_or(self.priors.x_father_affected);
                        match genotype {
                            Genotype::MaleNormal => 1.0 - affected,
                            Genotype::MaleMutant => affected,
                            _ => 0.0,
                        }
                    }
                },
            },
        }
    }

    /// Mendelian transmission probability `P(child_genotype | parent_genotype)`,
    /// marginalizing the child's other parent over `other` (a genotype
    /// distribution, normally one of the external tables).
    pub fn transmission(
        &self,
        pattern: InheritancePattern,
        parent_genotype: Genotype,
        parent_sex: Sex,
        child_genotype: Genotype,
        child_sex: Sex,
        other: &[(Genotype, f64)],
    ) -> f64 {
        match pattern {
            InheritancePattern::AutosomalRecessive | InheritancePattern::AutosomalDominant => {
                let Some((p_normal, p_mutant)) = autosomal_allele_mass(parent_genotype) else {
                    return 0.0;
                };
                let (o_normal, o_mutant) = weighted_mass(other, autosomal_allele_mass);
                match child_genotype {
                    Genotype::HomNormal => p_normal * o_normal,
                    Genotype::Het => p_normal * o_mutant + p_mutant * o_normal,
                    Genotype::HomMutant => p_mutant * o_mutant,
                    _ => 0.0,
                }
            }
            InheritancePattern::XLinked => {
                // Resolve which side of the cross each X allele comes from.
                let (mother_side, father_side) = match parent_sex {
                    Sex::Female => {
                        let Some(own) = female_x_mass(parent_genotype) else {
                            return 0.0;
                        };
                        (own, weighted_mass(other, male_x_mass))
                    }
                    Sex::Male => {
                        let Some(own) = male_x_mass(parent_genotype) else {
                            return 0.0;
                        };
                        (weighted_mass(other, female_x_mass), own)
                    }
                };
                match child_sex {
                    // Sons get Y from the paternal side; their X is maternal.
                    Sex::Male => match child_genotype {
                        Genotype::MaleNormal => mother_side.0,
                        Genotype::MaleMutant => mother_side.1,
                        _ => 0.0,
                    },
                    Sex::Female => match child_genotype {
                        Genotype::FemaleNormal => father_side.0 * mother_side.0,
                        Genotype::FemaleCarrier => {
                            father_side.0 * mother_side.1 + father_side.1 * mother_side.0
                        }
                        Genotype::FemaleMutant => father_side.1 * mother_side.1,
                        _ => 0.0,
                    },
                }
            }
        }
    }

    /// Phenotype likelihood `P(observed status | genotype)`: 1.0 for an
    /// unknown status, otherwise an indicator per the classic
    /// phenotype-genotype correspondence.
    pub fn phenotype_likelihood(
        pattern: InheritancePattern,
        sex: Sex,
        genotype: Genotype,
        observed: Status,
    ) -> f64 {
        if observed == Status::Unknown {
            return 1.0;
        }

        match pattern {
            InheritancePattern::AutosomalRecessive => match observed {
                Status::Affected => indicator(genotype, Genotype::HomMutant),
                Status::Carrier => indicator(genotype, Genotype::Het),
                Status::Unaffected => indicator(genotype, Genotype::HomNormal),
                Status::Unknown => 1.0,
            },
            InheritancePattern::AutosomalDominant => match observed {
                Status::Affected | Status::Carrier => {
                    if matches!(genotype, Genotype::Het | Genotype::HomMutant) {
                        1.0
                    } else {
                        0.0
                    }
                }
                Status::Unaffected => indicator(genotype, Genotype::HomNormal),
                Status::Unknown => 1.0,
            },
            InheritancePattern::XLinked => match sex {
                Sex::Male => match observed {
                    Status::Affected => indicator(genotype, Genotype::MaleMutant),
                    Status::Unaffected => indicator(genotype, Genotype::MaleNormal),
                    Status::Carrier => 0.0,
                    Status::Unknown => 1.0,
                },
                Sex::Female => match observed {
                    Status::Affected => indicator(genotype, Genotype::FemaleMutant),
                    Status::Carrier => indicator(genotype, Genotype::FemaleCarrier),
                    Status::Unaffected => indicator(genotype, Genotype::FemaleNormal),
                    Status::Unknown => 1.0,
                },
            },
        }
    }

    /// Whether a genotype is classified as affected for the pattern and sex.
    pub fn is_affected_genotype(pattern: InheritancePattern, sex: Sex, genotype: Genotype) -> bool {
        match pattern {
            InheritancePattern::AutosomalRecessive => genotype == Genotype::HomMutant,
            InheritancePattern::AutosomalDominant => {
                matches!(genotype, Genotype::Het | Genotype::HomMutant)
            }
            InheritancePattern::XLinked => match sex {
                Sex::Male => genotype == Genotype::MaleMutant,
                Sex::Female => genotype == Genotype::FemaleMutant,
            },
        }
    }
}

fn indicator(genotype: Genotype, expected: Genotype) -> f64 {
    if genotype == expected {
        1.0
    } else {
        0.0
    }
}

/// (normal, mutant) allele transmission mass for an autosomal genotype.
fn autosomal_allele_mass(genotype: Genotype) -> Option<(f64, f64)> {
    match genotype {
        Genotype::HomNormal => Some((1.0, 0.0)),
        Genotype::Het => Some((0.5, 0.5)),
        Genotype::HomMutant => Some((0.0, 1.0)),
        _ => None,
    }
}

/// (normal, mutant) X-allele transmission mass for a female genotype.
fn female_x_mass(genotype: Genotype) -> Option<(f64, f64)> {
    match genotype {
        Genotype::FemaleNormal => Some((1.0, 0.0)),
        Genotype::FemaleCarrier => Some((0.5, 0.5)),
        Genotype::FemaleMutant => Some((0.0, 1.0)),
        _ => None,
    }
}

/// (normal, mutant) X-allele mass a male contributes to daughters.
fn male_x_mass(genotype: Genotype) -> Option<(f64, f64)> {
    match genotype {
        Genotype::MaleNormal => Some((1.0, 0.0)),
        Genotype::MaleMutant => Some((0.0, 1.0)),
        _ => None,
    }
}

/// Allele mass of a genotype distribution; genotypes outside the relevant
/// category contribute nothing.
fn weighted_mass(
    distribution: &[(Genotype, f64)],
    mass: fn(Genotype) -> Option<(f64, f64)>,
) -> (f64, f64) {
    let mut normal = 0.0;
    let mut mutant = 0.0;
    for &(genotype, weight) in distribution {
        if let Some((n, m)) = mass(genotype) {
            normal += weight * n;
            mutant += weight * m;
        }
    }
    (normal, mutant)
}

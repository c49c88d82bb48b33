//! Expected entry counts, derived from the tables independently of the
//! translator so a produced document can be cross-checked against them

use clinprot_parser::{DosimetricParameter, PrescriptionTables, parse_dosimetric_parameter};

/// Number of entries a translated document should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedCounts {
    pub plan_objectives: usize,
    pub quality_indices: usize,
}

/// Whether a matched shape contributes a quality index
fn shape_yields_index(matched: &DosimetricParameter) -> bool {
    !matches!(
        matched,
        DosimetricParameter::DosePctAtVolumeCc { .. }
            | DosimetricParameter::DosePctAtVolumePct { .. }
    )
}

/// Count the entries translation would emit for these tables.
///
/// The counting walks the tables the same way the translator does but never
/// touches dose arithmetic, so it stays valid as an independent cross-check
/// on a built document.
pub fn expected_counts(tables: &PrescriptionTables) -> ExpectedCounts {
    let mut plan_objectives = 0;
    let mut quality_indices = 0;

    for target in &tables.target_volumes {
        let Some(volume) = target.volume.as_deref() else {
            continue;
        };
        let Some(coverage) = tables
            .coverage
            .iter()
            .find(|cc| cc.volume.as_deref() == Some(volume))
        else {
            continue;
        };
        if coverage.at_least.is_some() {
            plan_objectives += 1;
            quality_indices += 1;
        }
        if coverage.no_more.is_some() {
            plan_objectives += 1;
            quality_indices += 1;
        }
    }

    for organ in &tables.organs {
        if organ.organ.is_none() {
            continue;
        }
        if organ.mean_dose_gy.is_some() {
            plan_objectives += 1;
        }
        if organ.max_dose_gy.is_some() {
            plan_objectives += 1;
        }
        for parameter in &organ.dosimetric_parameters {
            for matched in parse_dosimetric_parameter(parameter) {
                if matches!(matched, DosimetricParameter::VolumePctAtDose { .. }) {
                    plan_objectives += 1;
                }
                if shape_yields_index(&matched) {
                    quality_indices += 1;
                }
            }
        }
    }

    ExpectedCounts {
        plan_objectives,
        quality_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;
    use clinprot_parser::{CoverageConstraint, CoveragePoint, OrganAtRisk, TargetVolume};
    use pretty_assertions::assert_eq;

    fn tables() -> PrescriptionTables {
        PrescriptionTables {
            target_volumes: vec![TargetVolume {
                volume: Some("PTV_60".to_string()),
                total_dose_gy: Some(60.0),
                fraction_dose_gy: Some(2.0),
            }],
            coverage: vec![CoverageConstraint {
                volume: Some("PTV_60".to_string()),
                min_dose_gy: Some(57.0),
                max_dose_gy: Some(64.2),
                at_least: Some(CoveragePoint {
                    volume_pct: 95.0,
                    dose_pct: 95.0,
                }),
                no_more: None,
            }],
            organs: vec![
                OrganAtRisk {
                    organ: Some("SpinalCord".to_string()),
                    mean_dose_gy: None,
                    max_dose_gy: Some(45.0),
                    dosimetric_parameters: vec![
                        "D2%$44Gy".to_string(),
                        "ALARA".to_string(),
                    ],
                },
                OrganAtRisk {
                    organ: Some("Parotid_L".to_string()),
                    mean_dose_gy: Some(26.0),
                    max_dose_gy: None,
                    dosimetric_parameters: vec!["V30$50%".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_counts_match_translation() {
        let tables = tables();
        let counts = expected_counts(&tables);
        let translation = translate(&tables).unwrap();
        assert_eq!(counts.plan_objectives, translation.plan_objectives.len());
        assert_eq!(counts.quality_indices, translation.quality_indices.len());
    }

    #[test]
    fn test_counts_by_hand() {
        // at_least 1 PO + 1 QI; cord max 1 PO, D2% 1 QI; parotid mean 1 PO,
        // V30 1 PO + 1 QI; ALARA nothing
        let counts = expected_counts(&tables());
        assert_eq!(
            counts,
            ExpectedCounts {
                plan_objectives: 4,
                quality_indices: 3
            }
        );
    }
}

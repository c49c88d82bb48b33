//! Business rules mapping decomposed tables to protocol entries

use crate::entries::{
    IndexModifier, ObjectiveModifier, PlanObjectiveEntry, QualityIndexEntry, QualityIndexType,
};
use clinprot_diagnostics::{ACP0002, ACP0003, ClinProtError, Diagnostic, Result};
use clinprot_parser::{
    CoverageConstraint, DosimetricParameter, OrganAtRisk, PrescriptionTables, TargetVolume,
    parse_dosimetric_parameter,
};

/// The translated prescription
///
/// Entry order is significant and fixed: plan objectives for target volumes,
/// then for organs, then quality indices for target volumes, then for organs,
/// each group in table row order. Documents are compared against historical
/// exports entry by entry, so the order must not change.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Fraction count derived from the first target volume
    pub fraction_count: u32,
    pub plan_objectives: Vec<PlanObjectiveEntry>,
    pub quality_indices: Vec<QualityIndexEntry>,
    /// Review trail: dosimetric parameters matching none of the shapes and
    /// organ blocks without a usable name
    pub unrecognized: Vec<Diagnostic>,
}

/// The dose the treatment is prescribed at: the highest total dose over all
/// target volumes
pub fn treatment_dose_prescription(tables: &PrescriptionTables) -> Option<f64> {
    tables
        .target_volumes
        .iter()
        .filter_map(|tv| tv.total_dose_gy)
        .fold(None, |acc, dose| match acc {
            Some(max) if max >= dose => Some(max),
            _ => Some(dose),
        })
}

/// Derive the fraction count from the first target volume.
///
/// The ratio is truncated to an integer and must be positive; a fractional
/// remainder is accepted (hypofractionated boosts legitimately divide
/// unevenly) but a count of zero is not.
fn fraction_count(tables: &PrescriptionTables) -> Result<u32> {
    let first = tables
        .target_volumes
        .first()
        .ok_or(ClinProtError::IncompleteTargetVolume { volume: None })?;
    let (total, fraction) = match (first.total_dose_gy, first.fraction_dose_gy) {
        (Some(total), Some(fraction)) => (total, fraction),
        _ => {
            return Err(ClinProtError::IncompleteTargetVolume {
                volume: first.volume.clone(),
            });
        }
    };
    let count = (total / fraction).trunc();
    if count >= 1.0 && count.is_finite() {
        Ok(count as u32)
    } else {
        Err(ClinProtError::InvalidFractionCount {
            total_dose_gy: total,
            fraction_dose_gy: fraction,
        })
    }
}

/// Translate decomposed prescription tables into protocol entries
pub fn translate(tables: &PrescriptionTables) -> Result<Translation> {
    let fraction_count = fraction_count(tables)?;
    let n = f64::from(fraction_count);

    let mut plan_objectives = Vec::new();
    let mut quality_indices = Vec::new();
    let mut unrecognized = Vec::new();

    for target in &tables.target_volumes {
        target_objectives(target, tables, &mut plan_objectives)?;
    }
    for organ in &tables.organs {
        organ_objectives(organ, n, &mut plan_objectives, &mut unrecognized);
    }
    for target in &tables.target_volumes {
        target_indices(target, tables, &mut quality_indices);
    }
    for organ in &tables.organs {
        organ_indices(organ, &mut quality_indices, &mut unrecognized);
    }

    Ok(Translation {
        fraction_count,
        plan_objectives,
        quality_indices,
        unrecognized,
    })
}

fn coverage_for<'a>(
    tables: &'a PrescriptionTables,
    volume: &str,
) -> Option<&'a CoverageConstraint> {
    tables
        .coverage
        .iter()
        .find(|cc| cc.volume.as_deref() == Some(volume))
}

/// Both dose fields of a target volume, required once one of its coverage
/// clauses is to be translated
fn target_doses(target: &TargetVolume) -> Result<(f64, f64)> {
    match (target.total_dose_gy, target.fraction_dose_gy) {
        (Some(total), Some(fraction)) => Ok((total, fraction)),
        _ => Err(ClinProtError::IncompleteTargetVolume {
            volume: target.volume.clone(),
        }),
    }
}

fn target_objectives(
    target: &TargetVolume,
    tables: &PrescriptionTables,
    out: &mut Vec<PlanObjectiveEntry>,
) -> Result<()> {
    let Some(volume) = target.volume.as_deref() else {
        return Ok(());
    };
    let Some(coverage) = coverage_for(tables, volume) else {
        return Ok(());
    };

    if let Some(point) = coverage.at_least {
        let (total, fraction) = target_doses(target)?;
        out.push(PlanObjectiveEntry {
            structure_id: volume.to_string(),
            modifier: ObjectiveModifier::AtLeast,
            parameter: point.volume_pct,
            dose_gy: fraction * point.dose_pct / 100.0,
            total_dose_gy: total * point.dose_pct / 100.0,
            primary: false,
        });
    }
    if let Some(point) = coverage.no_more {
        let (total, fraction) = target_doses(target)?;
        out.push(PlanObjectiveEntry {
            structure_id: volume.to_string(),
            modifier: ObjectiveModifier::AtMost,
            parameter: point.volume_pct,
            dose_gy: fraction * point.dose_pct / 100.0,
            total_dose_gy: total * point.dose_pct / 100.0,
            primary: false,
        });
    }
    Ok(())
}

fn target_indices(
    target: &TargetVolume,
    tables: &PrescriptionTables,
    out: &mut Vec<QualityIndexEntry>,
) {
    let Some(volume) = target.volume.as_deref() else {
        return;
    };
    let Some(coverage) = coverage_for(tables, volume) else {
        return;
    };
    let Some(total) = target.total_dose_gy else {
        return;
    };

    if let Some(point) = coverage.at_least {
        out.push(QualityIndexEntry {
            structure_id: volume.to_string(),
            index_type: QualityIndexType::VolumeAtAbsoluteDose,
            modifier: IndexModifier::IsMoreThan,
            value: point.volume_pct,
            type_specifier: total * point.dose_pct / 100.0,
            absolute_units: false,
        });
    }
    if let Some(point) = coverage.no_more {
        out.push(QualityIndexEntry {
            structure_id: volume.to_string(),
            index_type: QualityIndexType::VolumeAtAbsoluteDose,
            modifier: IndexModifier::IsLessThan,
            value: point.volume_pct,
            type_specifier: total * point.dose_pct / 100.0,
            absolute_units: false,
        });
    }
}

/// Report an organ block whose header yielded no name; its constraints
/// cannot be keyed to a structure.
fn unnamed_organ(organ: &OrganAtRisk, unrecognized: &mut Vec<Diagnostic>) {
    unrecognized.push(
        Diagnostic::warning(ACP0002, "organ block without a usable name, skipped")
            .with_source_text(organ.dosimetric_parameters.join("; ")),
    );
}

fn organ_objectives(
    organ: &OrganAtRisk,
    n: f64,
    out: &mut Vec<PlanObjectiveEntry>,
    unrecognized: &mut Vec<Diagnostic>,
) {
    let Some(name) = organ.organ.as_deref() else {
        if organ.mean_dose_gy.is_some()
            || organ.max_dose_gy.is_some()
            || !organ.dosimetric_parameters.is_empty()
        {
            unnamed_organ(organ, unrecognized);
        }
        return;
    };

    if let Some(mean) = organ.mean_dose_gy {
        out.push(PlanObjectiveEntry {
            structure_id: name.to_string(),
            modifier: ObjectiveModifier::MeanIsLessThan,
            parameter: 0.0,
            dose_gy: mean / n,
            total_dose_gy: mean,
            primary: false,
        });
    }
    if let Some(max) = organ.max_dose_gy {
        out.push(PlanObjectiveEntry {
            structure_id: name.to_string(),
            modifier: ObjectiveModifier::MaxIsLessThan,
            parameter: 0.0,
            dose_gy: max / n,
            total_dose_gy: max,
            primary: false,
        });
    }
    for parameter in &organ.dosimetric_parameters {
        for matched in parse_dosimetric_parameter(parameter) {
            if let DosimetricParameter::VolumePctAtDose {
                dose_gy,
                volume_pct,
            } = matched
            {
                out.push(PlanObjectiveEntry {
                    structure_id: name.to_string(),
                    modifier: ObjectiveModifier::AtMost,
                    parameter: volume_pct,
                    dose_gy: dose_gy / n,
                    total_dose_gy: dose_gy,
                    primary: false,
                });
            }
        }
    }
}

fn organ_indices(
    organ: &OrganAtRisk,
    out: &mut Vec<QualityIndexEntry>,
    unrecognized: &mut Vec<Diagnostic>,
) {
    let Some(name) = organ.organ.as_deref() else {
        return;
    };

    for parameter in &organ.dosimetric_parameters {
        let matches = parse_dosimetric_parameter(parameter);
        if matches.is_empty() {
            unrecognized.push(
                Diagnostic::warning(
                    ACP0003,
                    format!("unrecognized dosimetric parameter for {name}"),
                )
                .with_source_text(parameter.clone()),
            );
            continue;
        }
        for matched in matches {
            if let Some(entry) = index_for_shape(name, &matched) {
                out.push(entry);
            }
        }
    }
}

/// The quality index one matched shape contributes, if any.
///
/// Dxxcc and Dxx% matches carry no dose value and produce nothing on their
/// own; they only occur alongside the Gy-suffixed shapes that do.
fn index_for_shape(name: &str, matched: &DosimetricParameter) -> Option<QualityIndexEntry> {
    let entry = match *matched {
        DosimetricParameter::VolumePctAtDose {
            dose_gy,
            volume_pct,
        } => QualityIndexEntry {
            structure_id: name.to_string(),
            index_type: QualityIndexType::VolumeAtAbsoluteDose,
            modifier: IndexModifier::IsLessThan,
            value: volume_pct,
            type_specifier: dose_gy,
            absolute_units: false,
        },
        DosimetricParameter::VolumeCcAtDose { dose_gy, volume_cc } => QualityIndexEntry {
            structure_id: name.to_string(),
            index_type: QualityIndexType::VolumeAtAbsoluteDose,
            modifier: IndexModifier::IsLessThan,
            // reported in mm3
            value: volume_cc * 1000.0,
            type_specifier: dose_gy,
            absolute_units: true,
        },
        DosimetricParameter::DoseGyAtVolume { volume, dose_gy } => QualityIndexEntry {
            structure_id: name.to_string(),
            index_type: QualityIndexType::DoseAtAbsoluteVolume,
            modifier: IndexModifier::IsLessThan,
            value: dose_gy,
            type_specifier: volume,
            absolute_units: true,
        },
        DosimetricParameter::DoseGyAtVolumeCc { volume_cc, dose_gy } => QualityIndexEntry {
            structure_id: name.to_string(),
            index_type: QualityIndexType::DoseAtAbsoluteVolume,
            modifier: IndexModifier::IsLessThan,
            value: dose_gy,
            type_specifier: volume_cc,
            absolute_units: true,
        },
        DosimetricParameter::DoseGyAtVolumePct { volume_pct, dose_gy } => QualityIndexEntry {
            structure_id: name.to_string(),
            index_type: QualityIndexType::DoseAtRelativeVolume,
            modifier: IndexModifier::IsLessThan,
            value: dose_gy,
            type_specifier: volume_pct,
            absolute_units: true,
        },
        DosimetricParameter::DosePctAtVolumeCc { .. }
        | DosimetricParameter::DosePctAtVolumePct { .. } => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinprot_parser::{CoveragePoint, TargetVolume};
    use pretty_assertions::assert_eq;

    fn target(volume: &str, total: f64, fraction: f64) -> TargetVolume {
        TargetVolume {
            volume: Some(volume.to_string()),
            total_dose_gy: Some(total),
            fraction_dose_gy: Some(fraction),
        }
    }

    fn coverage(
        volume: &str,
        at_least: Option<CoveragePoint>,
        no_more: Option<CoveragePoint>,
    ) -> CoverageConstraint {
        CoverageConstraint {
            volume: Some(volume.to_string()),
            min_dose_gy: None,
            max_dose_gy: None,
            at_least,
            no_more,
        }
    }

    fn tables() -> PrescriptionTables {
        PrescriptionTables {
            target_volumes: vec![target("PTV_54", 54.0, 1.8)],
            coverage: vec![coverage(
                "PTV_54",
                Some(CoveragePoint {
                    volume_pct: 95.0,
                    dose_pct: 95.0,
                }),
                Some(CoveragePoint {
                    volume_pct: 2.0,
                    dose_pct: 107.0,
                }),
            )],
            organs: vec![OrganAtRisk {
                organ: Some("SpinalCord".to_string()),
                mean_dose_gy: None,
                max_dose_gy: Some(45.0),
                dosimetric_parameters: vec!["D2%$44Gy".to_string()],
            }],
        }
    }

    #[test]
    fn test_fraction_count_truncates() {
        let translation = translate(&tables()).unwrap();
        assert_eq!(translation.fraction_count, 30);

        let mut uneven = tables();
        uneven.target_volumes[0] = target("PTV_54", 54.0, 1.6);
        assert_eq!(translate(&uneven).unwrap().fraction_count, 33);
    }

    #[test]
    fn test_missing_target_dose_is_incomplete() {
        let mut tables = tables();
        tables.target_volumes[0].fraction_dose_gy = None;
        let err = translate(&tables).unwrap_err();
        assert!(matches!(err, ClinProtError::IncompleteTargetVolume { .. }));
    }

    #[test]
    fn test_zero_fraction_count_rejected() {
        let mut tables = tables();
        tables.target_volumes[0] = target("PTV_54", 1.8, 54.0);
        let err = translate(&tables).unwrap_err();
        assert!(matches!(err, ClinProtError::InvalidFractionCount { .. }));
    }

    #[test]
    fn test_coverage_objectives_and_indices() {
        let translation = translate(&tables()).unwrap();

        let at_least = &translation.plan_objectives[0];
        assert_eq!(at_least.structure_id, "PTV_54");
        assert_eq!(at_least.modifier, ObjectiveModifier::AtLeast);
        assert_eq!(at_least.parameter, 95.0);
        assert!((at_least.total_dose_gy - 51.3).abs() < 1e-9);
        assert!((at_least.dose_gy - 1.71).abs() < 1e-9);

        let no_more = &translation.plan_objectives[1];
        assert_eq!(no_more.modifier, ObjectiveModifier::AtMost);
        assert!((no_more.total_dose_gy - 57.78).abs() < 1e-9);

        let qi = &translation.quality_indices[0];
        assert_eq!(qi.index_type, QualityIndexType::VolumeAtAbsoluteDose);
        assert_eq!(qi.modifier, IndexModifier::IsMoreThan);
        assert_eq!(qi.value, 95.0);
        assert!((qi.type_specifier - 51.3).abs() < 1e-9);
        assert!(!qi.absolute_units);
    }

    #[test]
    fn test_organ_mean_and_max_objectives() {
        let mut tables = tables();
        tables.organs[0].mean_dose_gy = Some(30.0);
        let translation = translate(&tables).unwrap();

        // target objectives first, then the organ's mean and max
        let mean = &translation.plan_objectives[2];
        assert_eq!(mean.structure_id, "SpinalCord");
        assert_eq!(mean.modifier, ObjectiveModifier::MeanIsLessThan);
        assert_eq!(mean.parameter, 0.0);
        assert_eq!(mean.total_dose_gy, 30.0);
        assert_eq!(mean.dose_gy, 1.0);

        let max = &translation.plan_objectives[3];
        assert_eq!(max.modifier, ObjectiveModifier::MaxIsLessThan);
        assert_eq!(max.total_dose_gy, 45.0);
        assert_eq!(max.dose_gy, 1.5);
    }

    #[test]
    fn test_volume_pct_parameter_emits_objective_and_index() {
        let mut tables = tables();
        tables.organs[0].dosimetric_parameters = vec!["V30$50%".to_string()];
        let translation = translate(&tables).unwrap();

        let po = translation
            .plan_objectives
            .iter()
            .find(|po| po.structure_id == "SpinalCord")
            .unwrap();
        assert_eq!(po.modifier, ObjectiveModifier::AtMost);
        assert_eq!(po.parameter, 50.0);
        assert_eq!(po.total_dose_gy, 30.0);
        assert_eq!(po.dose_gy, 1.0);

        let qi = translation
            .quality_indices
            .iter()
            .find(|qi| qi.structure_id == "SpinalCord")
            .unwrap();
        assert_eq!(qi.index_type, QualityIndexType::VolumeAtAbsoluteDose);
        assert_eq!(qi.modifier, IndexModifier::IsLessThan);
        assert_eq!(qi.value, 50.0);
        assert_eq!(qi.type_specifier, 30.0);
        assert!(!qi.absolute_units);
    }

    #[test]
    fn test_volume_cc_parameter_reports_cubic_millimeters() {
        let mut tables = tables();
        tables.organs[0].dosimetric_parameters = vec!["V60$3cc".to_string()];
        let translation = translate(&tables).unwrap();

        // quality index only, no plan objective
        assert_eq!(translation.plan_objectives.len(), 3);
        let qi = translation.quality_indices.last().unwrap();
        assert_eq!(qi.value, 3000.0);
        assert_eq!(qi.type_specifier, 60.0);
        assert!(qi.absolute_units);
    }

    #[test]
    fn test_dose_at_volume_indices() {
        let mut tables = tables();
        tables.organs[0].dosimetric_parameters = vec![
            "D1500$12.5Gy".to_string(),
            "D950cc$7.2Gy".to_string(),
            "D40%$7.3Gy".to_string(),
        ];
        let translation = translate(&tables).unwrap();
        let organ_qis: Vec<_> = translation
            .quality_indices
            .iter()
            .filter(|qi| qi.structure_id == "SpinalCord")
            .collect();
        assert_eq!(organ_qis.len(), 3);

        assert_eq!(organ_qis[0].index_type, QualityIndexType::DoseAtAbsoluteVolume);
        assert_eq!(organ_qis[0].value, 12.5);
        assert_eq!(organ_qis[0].type_specifier, 1500.0);

        assert_eq!(organ_qis[1].index_type, QualityIndexType::DoseAtAbsoluteVolume);
        assert_eq!(organ_qis[1].value, 7.2);
        assert_eq!(organ_qis[1].type_specifier, 950.0);

        assert_eq!(organ_qis[2].index_type, QualityIndexType::DoseAtRelativeVolume);
        assert_eq!(organ_qis[2].value, 7.3);
        assert_eq!(organ_qis[2].type_specifier, 40.0);
    }

    #[test]
    fn test_unrecognized_parameter_is_surfaced_not_fatal() {
        let mut tables = tables();
        tables.organs[0].dosimetric_parameters =
            vec!["keep dose as low as possible".to_string()];
        let translation = translate(&tables).unwrap();
        assert_eq!(translation.unrecognized.len(), 1);
        assert_eq!(
            translation.unrecognized[0].source_text.as_deref(),
            Some("keep dose as low as possible")
        );
    }

    #[test]
    fn test_unnamed_organ_with_constraints_is_surfaced() {
        let mut tables = tables();
        tables.organs[0].organ = None;
        let translation = translate(&tables).unwrap();
        assert_eq!(translation.plan_objectives.len(), 2);
        assert_eq!(translation.unrecognized.len(), 1);
    }

    #[test]
    fn test_entry_order_targets_before_organs() {
        let mut tables = tables();
        tables.organs[0].mean_dose_gy = Some(30.0);
        let translation = translate(&tables).unwrap();
        let owners: Vec<_> = translation
            .plan_objectives
            .iter()
            .map(|po| po.structure_id.as_str())
            .collect();
        assert_eq!(owners, vec!["PTV_54", "PTV_54", "SpinalCord", "SpinalCord"]);
    }

    #[test]
    fn test_treatment_dose_prescription_is_max_total() {
        let mut tables = tables();
        tables.target_volumes.push(target("PTV_60", 60.0, 2.0));
        assert_eq!(treatment_dose_prescription(&tables), Some(60.0));
        tables.target_volumes.clear();
        assert_eq!(treatment_dose_prescription(&tables), None);
    }
}

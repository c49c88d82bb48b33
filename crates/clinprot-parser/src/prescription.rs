//! Prescription decomposer
//!
//! Splits one prescription record into three structured tables: target-volume
//! prescriptions (from `PrescribedTo`), coverage constraints (from
//! `CoverageConstraints`) and organ-at-risk blocks (from `OrgansAtRisk`).

use crate::dose::parse_dose_phrase;
use crate::record::PrescriptionRecord;
use clinprot_diagnostics::{ClinProtError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One prescribed target volume
///
/// A segment that matches the grammar only partially still yields a record;
/// missing fields stay `None` and downstream callers must tolerate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetVolume {
    /// Structure name the dose is prescribed to
    pub volume: Option<String>,
    /// Total prescribed dose in Gy
    pub total_dose_gy: Option<f64>,
    /// Dose per fraction in Gy
    pub fraction_dose_gy: Option<f64>,
}

/// A relative dose/volume point from an At Least / No More Than clause
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoveragePoint {
    /// Volume percentage the clause applies to
    pub volume_pct: f64,
    /// Dose percentage relative to the volume's prescription
    pub dose_pct: f64,
}

/// Coverage constraints for one target volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageConstraint {
    /// Volume header of the segment (foreign key into the target table)
    pub volume: Option<String>,
    /// Minimum dose in Gy, informational only
    pub min_dose_gy: Option<f64>,
    /// Maximum dose in Gy, informational only
    pub max_dose_gy: Option<f64>,
    /// At Least clause, at most one per volume
    pub at_least: Option<CoveragePoint>,
    /// No More Than clause, at most one per volume
    pub no_more: Option<CoveragePoint>,
}

/// One organ-at-risk block
///
/// `dosimetric_parameters` stays un-parsed until translation time; the
/// translator decodes each entry with the shape grammars and reports the ones
/// it cannot recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganAtRisk {
    /// Organ name from the block header
    pub organ: Option<String>,
    /// Mean-dose constraint in Gy
    pub mean_dose_gy: Option<f64>,
    /// Max-dose constraint in Gy
    pub max_dose_gy: Option<f64>,
    /// Raw constraint lines of the block, trimmed, in encounter order
    pub dosimetric_parameters: Vec<String>,
}

/// The three decomposed tables of one prescription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionTables {
    pub target_volumes: Vec<TargetVolume>,
    pub coverage: Vec<CoverageConstraint>,
    pub organs: Vec<OrganAtRisk>,
}

/// How to treat At Least / No More Than clauses that the segment's volume
/// guard would otherwise drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoverageStrictness {
    /// Keep the first clause matching the segment's volume header and drop
    /// the rest, the way the export tooling behaves
    #[default]
    Lenient,
    /// Fail with an ambiguous-constraint error when a clause would be dropped
    Strict,
}

/// Options for [`decompose`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DecomposeOptions {
    pub coverage_strictness: CoverageStrictness,
}

// Target-volume grammar: "Volume <name>  <total> Gy  <fx> Gy/Frac"
static PV_VOLUME_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Volume (?P<vol>.+)  \d+\.\d+ Gy ").expect("volume grammar"));
static PV_DOSE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"  (?P<dose>\d+\.\d+) Gy").expect("total dose grammar"));
static PV_FX_DOSE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"  (?P<fx>\d+\.\d+) Gy/Frac").expect("fraction dose grammar"));

// Coverage-constraint grammar, five patterns per segment
static CC_VOLUME_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Volume / Structure :(?P<vol>.*) Min Dose").expect("cc volume grammar"));
static CC_MIN_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Min Dose:(?P<min>.*) Gy Max").expect("cc min grammar"));
static CC_MAX_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Max Dose:(?P<max>.*) Gy At").expect("cc max grammar"));
static CC_AT_LEAST_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"At Least (?P<volpct>.*) % of (?P<vol>.*) at (?P<dosepct>.*) % (?P<dose>.*) Gy No More Than")
        .expect("at-least grammar")
});
static CC_NO_MORE_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"No More Than (?P<volpct>.*) % of (?P<vol>.*) at (?P<dosepct>.*) % (?P<dose>.*) Gy")
        .expect("no-more grammar")
});

// Organ-at-risk header grammar
static OAR_ORGAN_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Organ :(?P<organ>.*) Mean").expect("organ grammar"));
static OAR_MEAN_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Mean :(?P<mean>.*) Max Dose").expect("mean grammar"));
static OAR_MAX_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Max Dose :(?P<max>.*)$").expect("max grammar"));

/// Decompose one prescription record into its three tables.
///
/// Fatal grammar failures (a dose phrase that cannot be decoded, an ambiguous
/// coverage clause under [`CoverageStrictness::Strict`]) abort the record;
/// everything else decomposes into partial rows that downstream code must
/// tolerate.
pub fn decompose(
    record: &PrescriptionRecord,
    options: &DecomposeOptions,
) -> Result<PrescriptionTables> {
    let target_volumes = record
        .prescribed_to
        .split('|')
        .map(parse_target_segment)
        .collect();

    let coverage = record
        .coverage_constraints
        .split('|')
        .map(|segment| parse_coverage_segment(segment, options.coverage_strictness))
        .collect::<Result<Vec<_>>>()?;

    let organs = match record.organs_at_risk.as_deref() {
        Some(text) if !text.trim().is_empty() => parse_organ_blocks(text)?,
        _ => Vec::new(),
    };

    Ok(PrescriptionTables {
        target_volumes,
        coverage,
        organs,
    })
}

fn parse_target_segment(segment: &str) -> TargetVolume {
    let volume = PV_VOLUME_RX
        .captures(segment)
        .map(|caps| caps["vol"].trim().to_string());
    let total_dose_gy = PV_DOSE_RX
        .captures(segment)
        .and_then(|caps| caps["dose"].parse::<f64>().ok());
    let fraction_dose_gy = PV_FX_DOSE_RX
        .captures(segment)
        .and_then(|caps| caps["fx"].parse::<f64>().ok());

    TargetVolume {
        volume,
        total_dose_gy,
        fraction_dose_gy,
    }
}

/// Parse one `|`-separated coverage segment.
///
/// The "current volume" context is scoped to this segment: the At Least and
/// No More Than clauses only count when their embedded volume name equals the
/// segment's own Volume header, which guards against clauses referring to a
/// different volume in the same free-text blob.
fn parse_coverage_segment(
    segment: &str,
    strictness: CoverageStrictness,
) -> Result<CoverageConstraint> {
    let volume = CC_VOLUME_RX
        .captures(segment)
        .map(|caps| caps["vol"].trim().to_string());
    let min_dose_gy = CC_MIN_RX
        .captures(segment)
        .and_then(|caps| caps["min"].trim().parse::<f64>().ok());
    let max_dose_gy = CC_MAX_RX
        .captures(segment)
        .and_then(|caps| caps["max"].trim().parse::<f64>().ok());

    let at_least = select_clause(&CC_AT_LEAST_RX, "At Least", segment, volume.as_deref(), strictness)?;
    let no_more = select_clause(&CC_NO_MORE_RX, "No More Than", segment, volume.as_deref(), strictness)?;

    Ok(CoverageConstraint {
        volume,
        min_dose_gy,
        max_dose_gy,
        at_least,
        no_more,
    })
}

fn select_clause(
    rx: &Regex,
    clause: &str,
    segment: &str,
    current_volume: Option<&str>,
    strictness: CoverageStrictness,
) -> Result<Option<CoveragePoint>> {
    let mut selected = None;
    for caps in rx.captures_iter(segment) {
        let embedded = caps["vol"].trim().to_string();
        let matches_current = current_volume == Some(embedded.as_str());
        if matches_current && selected.is_none() {
            selected = Some(parse_coverage_point(&caps, clause, segment)?);
        } else if strictness == CoverageStrictness::Strict {
            // Either a second clause for the same volume or a clause for a
            // volume other than the segment header; both would be dropped.
            return Err(ClinProtError::AmbiguousConstraint {
                clause: clause.to_string(),
                volume: embedded,
            });
        }
    }
    Ok(selected)
}

fn parse_coverage_point(
    caps: &regex::Captures<'_>,
    clause: &str,
    segment: &str,
) -> Result<CoveragePoint> {
    let volume_pct = caps["volpct"]
        .trim()
        .parse::<f64>()
        .map_err(|_| ClinProtError::malformed(clause, segment))?;
    let dose_pct = caps["dosepct"]
        .trim()
        .parse::<f64>()
        .map_err(|_| ClinProtError::malformed(clause, segment))?;
    Ok(CoveragePoint {
        volume_pct,
        dose_pct,
    })
}

fn is_oar_header(line: &str) -> bool {
    OAR_ORGAN_RX.is_match(line) || OAR_MEAN_RX.is_match(line) || OAR_MAX_RX.is_match(line)
}

/// Group the `OrgansAtRisk` lines into per-organ blocks.
///
/// A new block starts at every line matching the Organ/Mean/Max header
/// grammar. Within a block the header line and the one auxiliary line after
/// it ("Constraints :") are skipped; the remaining trimmed, non-empty lines
/// are the organ's raw dosimetric parameters.
fn parse_organ_blocks(text: &str) -> Result<Vec<OrganAtRisk>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in text.split('\n') {
        if is_oar_header(line) {
            blocks.push(vec![line]);
        } else if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }

    blocks.into_iter().map(|block| parse_organ_block(&block)).collect()
}

fn parse_organ_block(block: &[&str]) -> Result<OrganAtRisk> {
    let header = block[0];

    let organ = OAR_ORGAN_RX
        .captures(header)
        .map(|caps| caps["organ"].trim().to_string());
    let mean_dose_gy = header_dose(&OAR_MEAN_RX, "mean", "Mean", header)?;
    let max_dose_gy = header_dose(&OAR_MAX_RX, "max", "Max Dose", header)?;

    let dosimetric_parameters = block
        .iter()
        .skip(2)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    Ok(OrganAtRisk {
        organ,
        mean_dose_gy,
        max_dose_gy,
        dosimetric_parameters,
    })
}

/// Decode a Mean/Max dose phrase from a block header. A blank capture means
/// the constraint is absent; a non-blank capture that is not a dose phrase is
/// a malformed record.
fn header_dose(rx: &Regex, group: &str, field: &str, header: &str) -> Result<Option<f64>> {
    match rx.captures(header) {
        Some(caps) => {
            let raw = caps[group].trim().to_string();
            if raw.is_empty() {
                Ok(None)
            } else {
                parse_dose_phrase(&raw)
                    .map(Some)
                    .map_err(|_| ClinProtError::malformed(field, header))
            }
        }
        None => Ok(None),
    }
}

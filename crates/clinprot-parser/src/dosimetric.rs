//! Dosimetric-parameter micro-parser
//!
//! An organ-at-risk constraint line encodes one dose/volume point in a compact
//! shorthand, with a `$` separating the quantity named in the shorthand from
//! its constraint value: `V36$42%` reads "the volume receiving 36 Gy must stay
//! below 42%", `D950cc$7.2Gy` reads "the dose to 950 cc must stay below
//! 7.2 Gy".
//!
//! Seven fixed token grammars are tried in a fixed priority order and every
//! successful match is kept: overlapping patterns (`Dxxcc` vs `Dxxcc Gy`) may
//! legitimately both fire for one string, and the translator picks the shapes
//! it acts on. A string matching no grammar yields an empty result, not an
//! error; callers report it for manual review instead of aborting the record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The shape families a dosimetric-parameter token can match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DosimetricShape {
    /// `Vxx%` - relative volume (%) receiving an absolute dose (Gy)
    VxxPct,
    /// `Vxxcc` - absolute volume (cc) receiving an absolute dose (Gy)
    VxxCc,
    /// `Dxxcc` - relative dose (%) to an absolute volume (cc)
    DxxCc,
    /// `Dxx%` - relative dose (%) to a relative volume (%)
    DxxPct,
    /// `Dxx Gy` - absolute dose (Gy) to an absolute volume
    DxxGy,
    /// `Dxxcc Gy` - absolute dose (Gy) to an absolute volume (cc)
    DxxCcGy,
    /// `Dxx% Gy` - absolute dose (Gy) to a relative volume (%)
    DxxPctGy,
}

/// A parsed dosimetric parameter, one variant per shape family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DosimetricParameter {
    /// `Vxx%`
    VolumePctAtDose { dose_gy: f64, volume_pct: f64 },
    /// `Vxxcc`
    VolumeCcAtDose { dose_gy: f64, volume_cc: f64 },
    /// `Dxxcc`
    DosePctAtVolumeCc { volume_cc: f64, dose_pct: f64 },
    /// `Dxx%`
    DosePctAtVolumePct { volume_pct: f64, dose_pct: f64 },
    /// `Dxx Gy`
    DoseGyAtVolume { volume: f64, dose_gy: f64 },
    /// `Dxxcc Gy`
    DoseGyAtVolumeCc { volume_cc: f64, dose_gy: f64 },
    /// `Dxx% Gy`
    DoseGyAtVolumePct { volume_pct: f64, dose_gy: f64 },
}

impl DosimetricParameter {
    /// The shape family this parameter matched
    pub fn shape(&self) -> DosimetricShape {
        match self {
            Self::VolumePctAtDose { .. } => DosimetricShape::VxxPct,
            Self::VolumeCcAtDose { .. } => DosimetricShape::VxxCc,
            Self::DosePctAtVolumeCc { .. } => DosimetricShape::DxxCc,
            Self::DosePctAtVolumePct { .. } => DosimetricShape::DxxPct,
            Self::DoseGyAtVolume { .. } => DosimetricShape::DxxGy,
            Self::DoseGyAtVolumeCc { .. } => DosimetricShape::DxxCcGy,
            Self::DoseGyAtVolumePct { .. } => DosimetricShape::DxxPctGy,
        }
    }
}

// One regex per shape. Numbers are `\d+` with an optional decimal part and
// whitespace around numbers and units is tolerated. The `Vxx` grammars anchor
// at the end of the token; the `Dxx` grammars search anywhere, matching the
// export's looser phrasing.
static VXX_PCT_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"V\s*(?P<dose>\d+\.?\d*)\s*(?:Gy)?\$(?P<vol>\d+\.?\d*)\s*%?$").expect("Vxx% grammar")
});
static VXX_CC_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"V\s*(?P<dose>\d+\.?\d*)\s*(?:Gy)?\$(?P<vol>\d+\.?\d*)\s*cc$").expect("Vxxcc grammar")
});
static DXX_CC_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"D\s*(?P<vol>\d+\.?\d*)cc\$(?P<dose>\d+\.?\d*)\s*%?").expect("Dxxcc grammar")
});
static DXX_PCT_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"D\s*(?P<vol>\d+\.?\d*)%\$(?P<dose>\d+\.?\d*)\s*%?").expect("Dxx% grammar")
});
static DXX_GY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"D\s*(?P<vol>\d+\.?\d*)\$(?P<dose>\d+\.?\d*)\s*(?:Gy)?").expect("Dxx Gy grammar")
});
static DXX_CC_GY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"D\s*(?P<vol>\d+\.?\d*).*?cc\$(?P<dose>\d+\.?\d*)\s*(?:Gy)?")
        .expect("Dxxcc Gy grammar")
});
static DXX_PCT_GY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"D\s*(?P<vol>\d+\.?\d*)%\$(?P<dose>\d+\.?\d*)\s*(?:Gy)?").expect("Dxx% Gy grammar")
});

fn captured_pair(rx: &Regex, text: &str) -> Option<(f64, f64)> {
    let caps = rx.captures(text)?;
    let vol_or_dose = caps["dose"].parse::<f64>().ok()?;
    let other = caps["vol"].parse::<f64>().ok()?;
    Some((vol_or_dose, other))
}

/// Try all seven shape grammars against `text` and collect every match.
///
/// Matches are returned in the fixed priority order `Vxx%`, `Vxxcc`, `Dxxcc`,
/// `Dxx%`, `Dxx Gy`, `Dxxcc Gy`, `Dxx% Gy`. An unrecognized token yields an
/// empty vector.
pub fn parse_dosimetric_parameter(text: &str) -> Vec<DosimetricParameter> {
    let mut matches = Vec::new();

    if let Some((dose_gy, volume_pct)) = captured_pair(&VXX_PCT_RX, text) {
        matches.push(DosimetricParameter::VolumePctAtDose { dose_gy, volume_pct });
    }
    if let Some((dose_gy, volume_cc)) = captured_pair(&VXX_CC_RX, text) {
        matches.push(DosimetricParameter::VolumeCcAtDose { dose_gy, volume_cc });
    }
    if let Some(caps) = DXX_CC_RX.captures(text) {
        if let (Ok(volume_cc), Ok(dose_pct)) =
            (caps["vol"].parse::<f64>(), caps["dose"].parse::<f64>())
        {
            matches.push(DosimetricParameter::DosePctAtVolumeCc { volume_cc, dose_pct });
        }
    }
    if let Some(caps) = DXX_PCT_RX.captures(text) {
        if let (Ok(volume_pct), Ok(dose_pct)) =
            (caps["vol"].parse::<f64>(), caps["dose"].parse::<f64>())
        {
            matches.push(DosimetricParameter::DosePctAtVolumePct { volume_pct, dose_pct });
        }
    }
    if let Some(caps) = DXX_GY_RX.captures(text) {
        if let (Ok(volume), Ok(dose_gy)) = (caps["vol"].parse::<f64>(), caps["dose"].parse::<f64>())
        {
            matches.push(DosimetricParameter::DoseGyAtVolume { volume, dose_gy });
        }
    }
    if let Some(caps) = DXX_CC_GY_RX.captures(text) {
        if let (Ok(volume_cc), Ok(dose_gy)) =
            (caps["vol"].parse::<f64>(), caps["dose"].parse::<f64>())
        {
            matches.push(DosimetricParameter::DoseGyAtVolumeCc { volume_cc, dose_gy });
        }
    }
    if let Some(caps) = DXX_PCT_GY_RX.captures(text) {
        if let (Ok(volume_pct), Ok(dose_gy)) =
            (caps["vol"].parse::<f64>(), caps["dose"].parse::<f64>())
        {
            matches.push(DosimetricParameter::DoseGyAtVolumePct { volume_pct, dose_gy });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_match(text: &str, shape: DosimetricShape) -> DosimetricParameter {
        parse_dosimetric_parameter(text)
            .into_iter()
            .find(|m| m.shape() == shape)
            .unwrap_or_else(|| panic!("no {:?} match for {:?}", shape, text))
    }

    #[test]
    fn test_vxx_pct_basic() {
        let m = shape_match("V36$42%", DosimetricShape::VxxPct);
        assert_eq!(
            m,
            DosimetricParameter::VolumePctAtDose { dose_gy: 36.0, volume_pct: 42.0 }
        );
    }

    #[test]
    fn test_vxx_pct_with_unit() {
        let m = shape_match("V35Gy$67%", DosimetricShape::VxxPct);
        assert_eq!(
            m,
            DosimetricParameter::VolumePctAtDose { dose_gy: 35.0, volume_pct: 67.0 }
        );
    }

    #[test]
    fn test_vxx_cc() {
        let m = shape_match("V60$3cc", DosimetricShape::VxxCc);
        assert_eq!(
            m,
            DosimetricParameter::VolumeCcAtDose { dose_gy: 60.0, volume_cc: 3.0 }
        );
    }

    #[test]
    fn test_dxx_gy() {
        let m = shape_match("D1500$12.5Gy", DosimetricShape::DxxGy);
        assert_eq!(
            m,
            DosimetricParameter::DoseGyAtVolume { volume: 1500.0, dose_gy: 12.5 }
        );
    }

    #[test]
    fn test_dxx_cc_gy() {
        let m = shape_match("D950cc$7.2Gy", DosimetricShape::DxxCcGy);
        assert_eq!(
            m,
            DosimetricParameter::DoseGyAtVolumeCc { volume_cc: 950.0, dose_gy: 7.2 }
        );
    }

    #[test]
    fn test_dxx_cc_gy_also_matches_dxx_cc() {
        // Overlapping grammars both fire; the caller picks by shape.
        let shapes: Vec<_> = parse_dosimetric_parameter("D950cc$7.2Gy")
            .iter()
            .map(DosimetricParameter::shape)
            .collect();
        assert!(shapes.contains(&DosimetricShape::DxxCc));
        assert!(shapes.contains(&DosimetricShape::DxxCcGy));
        assert!(!shapes.contains(&DosimetricShape::DxxGy));
    }

    #[test]
    fn test_dxx_pct_gy() {
        let m = shape_match("D40%$7.3Gy", DosimetricShape::DxxPctGy);
        assert_eq!(
            m,
            DosimetricParameter::DoseGyAtVolumePct { volume_pct: 40.0, dose_gy: 7.3 }
        );
    }

    #[test]
    fn test_unrecognized_is_empty_not_error() {
        assert!(parse_dosimetric_parameter("CTV boost as discussed").is_empty());
        assert!(parse_dosimetric_parameter("").is_empty());
    }

    #[test]
    fn test_vxx_cc_does_not_leak_into_vxx_pct() {
        let shapes: Vec<_> = parse_dosimetric_parameter("V60$3cc")
            .iter()
            .map(DosimetricParameter::shape)
            .collect();
        assert!(!shapes.contains(&DosimetricShape::VxxPct));
    }
}

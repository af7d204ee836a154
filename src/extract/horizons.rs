//! Rule chains for the layouts HORIZONS uses.
//!
//! The physical-data page differs from body to body (units, precision,
//! uncertainty notation), so each physical field has several rules. The
//! osculating-element block has a single stable layout.

use std::f64::consts::TAU;

use regex::Captures;

use super::rule::{Rule, RuleChain, Transform};
use crate::record::Field;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Decimal number with an optional fraction, e.g. `12345`, `12345.0`.
const DECIMAL: &str = r"(\d+(?:\.\d*)?)";
/// Mantissa as printed next to a power-of-ten unit, e.g. `5.43`, `.19`.
const MANTISSA: &str = r"(\d*\.?\d+)";
/// Signed period value.
const PERIOD: &str = r"(-?\d*\.?\d+)";
/// Period unit tag.
const PERIOD_UNIT: &str = r"(days?|d|hours?|hrs?|h)\b";
/// Osculating element value, plain or with an `E±NN` exponent.
const ELEMENT: &str = r"(-?\d+\.\d+(?:[eE][-+]?\d+)?)";

/// Combine mantissa and decimal exponent as text, then parse once.
pub fn scaled(mantissa: &str, exponent: i32) -> Option<f64> {
    format!("{}e{}", mantissa, exponent).parse().ok()
}

/// Angular rate in rad/s for a rotation period with a unit tag.
pub fn rate_from_period(period: f64, unit: &str) -> Option<f64> {
    let seconds = match unit {
        "d" | "day" | "days" => SECONDS_PER_DAY,
        "h" | "hr" | "hrs" | "hour" | "hours" => SECONDS_PER_HOUR,
        _ => return None,
    };
    if period == 0.0 || !period.is_finite() {
        return None;
    }
    Some(TAU / (period * seconds))
}

fn plain(caps: &Captures<'_>) -> Option<f64> {
    caps.get(1)?.as_str().parse().ok()
}

fn km_to_m(caps: &Captures<'_>) -> Option<f64> {
    scaled(caps.get(1)?.as_str(), 3)
}

/// `Mass, 10^E kg = M`: group 1 exponent, group 2 mantissa.
fn mass_kg(caps: &Captures<'_>) -> Option<f64> {
    let exponent: i32 = caps.get(1)?.as_str().parse().ok()?;
    scaled(caps.get(2)?.as_str(), exponent)
}

/// Same layout with the mass given in grams.
fn mass_g(caps: &Captures<'_>) -> Option<f64> {
    let exponent: i32 = caps.get(1)?.as_str().parse().ok()?;
    scaled(caps.get(2)?.as_str(), exponent - 3)
}

/// `... = P unit`
fn period_then_unit(caps: &Captures<'_>) -> Option<f64> {
    let period: f64 = caps.get(1)?.as_str().parse().ok()?;
    rate_from_period(period, caps.get(2)?.as_str())
}

/// `..., unit = P`
fn unit_then_period(caps: &Captures<'_>) -> Option<f64> {
    let period: f64 = caps.get(2)?.as_str().parse().ok()?;
    rate_from_period(period, caps.get(1)?.as_str())
}

/// Build a rule from a constant pattern.
fn rule(label: &'static str, pattern: &str, transform: Transform) -> Rule {
    Rule::new(label, pattern, transform).expect("Invalid built-in extraction pattern")
}

/// Mean radius in metres.
pub fn radius_chain() -> RuleChain {
    RuleChain::new(Field::Radius)
        .with(rule(
            "vol_mean_radius",
            &format!(r"Vol\. [Mm]ean [Rr]adius,?\s*\(?km\)?\s*=\s*{}", DECIMAL),
            km_to_m,
        ))
        .with(rule(
            "mean_radius_comma",
            &format!(r"Mean radius, km\s*=\s*{}", DECIMAL),
            km_to_m,
        ))
        .with(rule(
            "radius_comma",
            &format!(r"Radius, km\s*=\s*{}", DECIMAL),
            km_to_m,
        ))
        .with(rule(
            "mean_radius_paren",
            &format!(r"Mean radius \(km\)\s*=\s*{}", DECIMAL),
            km_to_m,
        ))
        .with(rule(
            "equatorial_radius",
            &format!(
                r"Equat\. radius \(1 bar\)\s*=\s*{}(?:\s*\+-\s*[\d.]+)?\s*km",
                DECIMAL
            ),
            km_to_m,
        ))
        .with(rule(
            "radius_paren",
            &format!(r"Radius \(km\)\s*=\s*{}", DECIMAL),
            km_to_m,
        ))
}

/// Mass in kilograms.
pub fn mass_chain() -> RuleChain {
    RuleChain::new(Field::Mass)
        .with(rule(
            "mass_comma",
            &format!(r"Mass,\s*10\^(\d+)\s*kg\s*=\s*{}", MANTISSA),
            mass_kg,
        ))
        .with(rule(
            "mass_paren",
            &format!(r"Mass\s*\(10\^(\d+)\s*kg\s*\)\s*=\s*{}", MANTISSA),
            mass_kg,
        ))
        .with(rule(
            "mass_times_kg",
            &format!(r"Mass\s*x\s*10\^(\d+)\s*\(kg\)\s*=\s*{}", MANTISSA),
            mass_kg,
        ))
        .with(rule(
            "mass_times_g",
            &format!(r"Mass\s*x\s*10\^(\d+)\s*\(g\)\s*=\s*{}", MANTISSA),
            mass_g,
        ))
}

/// Sidereal rotation rate in rad/s.
pub fn rotation_chain() -> RuleChain {
    RuleChain::new(Field::Rotation)
        .with(rule(
            "rotation_rate",
            r"(?i:rot\.\s*rate),?\s*\(?rad/s\)?\s*=\s*(-?\d*\.?\d+(?:[eE][-+]?\d+)?)",
            plain,
        ))
        .with(rule(
            "sidereal_period_unit_first",
            &format!(
                r"Sid(?:ereal|\.)\s*rot\.\s*period\s*\((days?|d|hr|h)\)\s*=\s*{}",
                PERIOD
            ),
            unit_then_period,
        ))
        .with(rule(
            "sidereal_period",
            &format!(
                r"Sid(?:ereal|\.)\s*rot\.\s*period(?:\s*\([^)]*\))?\s*=\s*{}\s*{}",
                PERIOD, PERIOD_UNIT
            ),
            period_then_unit,
        ))
        .with(rule(
            "mean_sidereal_day",
            &format!(r"Mean sidereal day,\s*(hr|h|d)\s*=\s*{}", PERIOD),
            unit_then_period,
        ))
        .with(rule(
            "rotation_period",
            &format!(r"Rotation period\s*=\s*{}\s*{}", PERIOD, PERIOD_UNIT),
            period_then_unit,
        ))
}

fn element_chain(field: Field, label: &'static str) -> RuleChain {
    RuleChain::new(field).with(rule(
        label,
        &format!(r"\b{}\s*=\s*{}", label, ELEMENT),
        plain,
    ))
}

/// All built-in chains.
pub fn chains() -> Vec<RuleChain> {
    vec![
        radius_chain(),
        mass_chain(),
        rotation_chain(),
        element_chain(Field::Eccentricity, "EC"),
        element_chain(Field::AscendingNode, "OM"),
        element_chain(Field::Perifocus, "W"),
        element_chain(Field::MeanMotion, "N"),
        element_chain(Field::TrueAnomaly, "TA"),
        element_chain(Field::SemiMajorAxis, "A"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS_M: f64 = 12_345_000.0;
    const MASS_KG: f64 = 543e21;

    #[test]
    fn test_radius_layouts_normalize_to_metres() {
        let chain = radius_chain();
        let layouts = [
            " Mean radius, km          = 12345.0+-0.01 ",
            " Radius, km            = 12345.00+-0.03 ",
            " Mean radius (km)      =  12345(+-1) ",
            " Equat. radius (1 bar) = 12345+-4 km ",
            " Vol. Mean Radius (km)    = 12345+-0.02 ",
            " Radius (km)             =   12345.000 ",
        ];
        for text in layouts {
            assert_eq!(chain.extract(text), Some(RADIUS_M), "layout: {}", text);
        }
    }

    #[test]
    fn test_mass_layouts_normalize_to_kilograms() {
        let chain = mass_chain();
        let layouts = [
            " Mass, 10^23 kg = 5.43+-0.0006 ",
            " Mass (10^23 kg )      =     5.43",
            " Mass (10^23 kg)       =  5.43+-.19 ",
            " Mass x10^23 (kg)= 5.43 ",
            " Mass x 10^26 (g)      = 5.43 ",
        ];
        for text in layouts {
            assert_eq!(chain.extract(text), Some(MASS_KG), "layout: {}", text);
        }
    }

    #[test]
    fn test_combined_object_pages() {
        let radius = radius_chain();
        let mass = mass_chain();
        let samples = [
            " Mean radius, km          = 12345.0+-0.01 \
                        Mass, 10^23 kg = 5.43+-0.0006 ",
            " Radius, km            = 12345.00+-0.03 \
                        Mass, 10^23 kg = 5.43 ",
            " Mean radius (km)      =  12345(+-1) \
                        Mass (10^23 kg )      =     5.43",
            " Equat. radius (1 bar) = 12345+-4 km \
                        Mass (10^23 kg)       =  5.43+-.19 ",
        ];
        for text in samples {
            assert_eq!(radius.extract(text), Some(RADIUS_M));
            assert_eq!(mass.extract(text), Some(MASS_KG));
        }
    }

    #[test]
    fn test_rotation_from_hours_and_days() {
        let chain = rotation_chain();

        let hours = chain.extract(" Sidereal rot. period  =   24 hr ").unwrap();
        assert!((hours - TAU / 86_400.0).abs() < 1e-18);

        let days = chain.extract(" Sidereal rot. period  =  1 d ").unwrap();
        assert_eq!(days, hours);

        let jupiter = chain.extract(" Sid. rot. period (III)= 9.925 h ").unwrap();
        assert!((jupiter - TAU / (9.925 * 3600.0)).abs() < 1e-15);

        let mean_day = chain.extract(" Mean sidereal day, hr = 23.9344695944 ").unwrap();
        assert!((mean_day - TAU / (23.9344695944 * 3600.0)).abs() < 1e-15);

        let venus = chain.extract(" Rotation period = -243.0185 d ").unwrap();
        assert!(venus < 0.0);
    }

    #[test]
    fn test_rotation_unit_in_parentheses() {
        let chain = rotation_chain();
        let text = " Sidereal rot. period (hr)= 23.93419          Mass ratio = 1 ";

        let rate = chain.extract(text).unwrap();
        assert!((rate - TAU / (23.93419 * 3600.0)).abs() < 1e-15);
        assert_eq!(
            chain.matching_rule(text).unwrap().label(),
            "sidereal_period_unit_first"
        );

        let days = chain.extract(" Sid. rot. period (d) = 25.38 ").unwrap();
        assert!((days - TAU / (25.38 * 86_400.0)).abs() < 1e-18);
    }

    #[test]
    fn test_lowercase_rotation_rate() {
        let chain = rotation_chain();
        let text = " Sid. rot. rate, rad/s = 0.0000028653 ";

        assert_eq!(chain.extract(text), Some(0.0000028653));
        assert_eq!(chain.matching_rule(text).unwrap().label(), "rotation_rate");

        let sun = " Sidereal rot. period  =   25.38 days        Sid. rot. rate, rad/s = 0.0000028653 ";
        assert_eq!(chain.extract(sun), Some(0.0000028653));
    }

    #[test]
    fn test_rotation_rate_takes_precedence() {
        let chain = rotation_chain();
        let text = " Sidereal rot. period = 23.93419 hr   Rot. Rate (rad/s)= 0.00007292115 ";

        assert_eq!(chain.extract(text), Some(0.00007292115));
        assert_eq!(chain.matching_rule(text).unwrap().label(), "rotation_rate");
    }

    #[test]
    fn test_elements_parse() {
        let text = " EC= 1.721107296809000E-02 QR= 1.468975648085326E+08 IN= 1.356373174557279E-03\n \
                    OM= 1.245752380286001E+02 W = 3.361773303000747E+02 Tp=  2457024.308695656713\n \
                    N = 1.142214289946943E-05 MA= 1.215741901404047E+02 TA= 1.232355108860352E+02\n \
                    A = 1.494701057043585E+08 AD= 1.520426466001843E+08 PR= 3.151772860561238E+07\n";

        let expected = [
            (Field::Eccentricity, 1.721107296809000E-02),
            (Field::AscendingNode, 1.245752380286001E+02),
            (Field::Perifocus, 3.361773303000747E+02),
            (Field::MeanMotion, 1.142214289946943E-05),
            (Field::TrueAnomaly, 1.232355108860352E+02),
            (Field::SemiMajorAxis, 1.494701057043585E+08),
        ];
        let chains = chains();
        for (field, value) in expected {
            let chain = chains.iter().find(|c| c.field() == field).unwrap();
            assert_eq!(chain.extract(text), Some(value), "field {}", field);
        }
    }

    #[test]
    fn test_rate_from_period_rejects_bad_input() {
        assert!(rate_from_period(1.0, "weeks").is_none());
        assert!(rate_from_period(0.0, "d").is_none());
        assert_eq!(scaled("5.43", 23), Some(543e21));
        assert_eq!(scaled("x", 1), None);
    }
}

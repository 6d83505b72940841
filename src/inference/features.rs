//! Raw feature metadata shared with the front-end contract

/// The eight raw features, in request order
pub const FEATURE_NAMES: [&str; 8] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "pedigree",
    "age",
];

/// Allowed (min, max) range for one feature
pub fn feature_range(name: &str) -> Option<(f64, f64)> {
    match name {
        "pregnancies" => Some((0.0, 17.0)),
        "glucose" => Some((0.0, 199.0)),
        "blood_pressure" => Some((0.0, 122.0)),
        "skin_thickness" => Some((0.0, 99.0)),
        "insulin" => Some((0.0, 846.0)),
        "bmi" => Some((0.0, 67.1)),
        "pedigree" => Some((0.078, 2.42)),
        "age" => Some((21.0, 81.0)),
        _ => None,
    }
}

/// Korean display label for one feature
pub fn feature_label(name: &str) -> Option<&'static str> {
    match name {
        "pregnancies" => Some("임신횟수"),
        "glucose" => Some("혈당"),
        "blood_pressure" => Some("혈압"),
        "skin_thickness" => Some("피부두께"),
        "insulin" => Some("인슐린"),
        "bmi" => Some("BMI"),
        "pedigree" => Some("가족력지표"),
        "age" => Some("나이"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_feature_has_range_and_label() {
        for name in FEATURE_NAMES {
            assert!(feature_range(name).is_some(), "{name}");
            assert!(feature_label(name).is_some(), "{name}");
        }
    }

    #[test]
    fn test_unknown_feature_is_none() {
        assert!(feature_range("cholesterol").is_none());
    }
}

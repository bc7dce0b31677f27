use crate::types::RiskLevel;

/// Normalizes the model's risk signal. Anything missing or unrecognized
/// lands on Caution so a dropped signal can never skip confirmation.
pub fn classify(model_risk: Option<&str>) -> RiskLevel {
    match model_risk.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("safe") => RiskLevel::Safe,
        Some("caution") => RiskLevel::Caution,
        Some("dangerous") => RiskLevel::Dangerous,
        _ => RiskLevel::Caution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_levels_pass_through() {
        assert_eq!(classify(Some("safe")), RiskLevel::Safe);
        assert_eq!(classify(Some("caution")), RiskLevel::Caution);
        assert_eq!(classify(Some("dangerous")), RiskLevel::Dangerous);
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(classify(Some(" Safe ")), RiskLevel::Safe);
        assert_eq!(classify(Some("DANGEROUS")), RiskLevel::Dangerous);
    }

    #[test]
    fn absent_signal_never_resolves_to_safe() {
        assert_eq!(classify(None), RiskLevel::Caution);
        assert_eq!(classify(Some("")), RiskLevel::Caution);
        assert_eq!(classify(Some("low")), RiskLevel::Caution);
        assert_eq!(classify(Some("unknown")), RiskLevel::Caution);
    }
}

use std::fmt;

/// Non-fatal anomalies collected while a run completes. These mark data gaps
/// for manual follow-up; the affected field stays unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnknownRarity {
        set: String,
        number: String,
        card: String,
        label: String,
    },
    MissingVersion {
        set: String,
        number: String,
        card: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRarity {
                set,
                number,
                card,
                label,
            } => write!(
                formatter,
                "rarity \"{label}\" for card {set} {number} {card} not found"
            ),
            Self::MissingVersion { set, number, card } => write!(
                formatter,
                "version for card {set} {number} {card} not found"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOutcome {
    pub id: String,
    pub name: String,
    pub total: usize,
    pub skipped_cards: usize,
}

/// Per-run accumulator passed through the pipeline instead of ambient state.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub sets: Vec<SetOutcome>,
    pub skipped_sets: usize,
    pub warnings: Vec<Warning>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn total_cards(&self) -> usize {
        self.sets.iter().map(|set| set.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_render_with_card_context() {
        let warning = Warning::UnknownRarity {
            set: "Genetic Apex".to_string(),
            number: "286".to_string(),
            card: "Mewtwo ex".to_string(),
            label: "Mystery Rare".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "rarity \"Mystery Rare\" for card Genetic Apex 286 Mewtwo ex not found"
        );

        let warning = Warning::MissingVersion {
            set: "Genetic Apex".to_string(),
            number: "267".to_string(),
            card: "Pikachu ex".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "version for card Genetic Apex 267 Pikachu ex not found"
        );
    }

    #[test]
    fn report_totals_sum_over_sets() {
        let mut report = ImportReport::new();
        report.sets.push(SetOutcome {
            id: "tcgpa1".to_string(),
            name: "Genetic Apex".to_string(),
            total: 226,
            skipped_cards: 0,
        });
        report.sets.push(SetOutcome {
            id: "tcgpa1a".to_string(),
            name: "Mythical Island".to_string(),
            total: 68,
            skipped_cards: 1,
        });
        assert_eq!(report.total_cards(), 294);
    }
}

use crate::catalog::Rarity;
use crate::extract::{CardVersion, RarityLabel};

/// Rarity-mark symbol counts as printed on single-art cards. The convention is
/// inferred from the data, so anything outside this table is unknown rather
/// than guessed.
const SYMBOL_RARITIES: [(&str, u32, Rarity); 10] = [
    ("Diamond", 1, Rarity::Common),
    ("Diamond", 2, Rarity::Uncommon),
    ("Diamond", 3, Rarity::Rare),
    ("Diamond", 4, Rarity::RareDouble),
    ("Star", 1, Rarity::RareIllustration),
    ("Star", 2, Rarity::RareSuper),
    ("Star", 3, Rarity::Immersive),
    ("Crown", 1, Rarity::RareUltra),
    ("Shiny", 1, Rarity::ShinyRareDouble),
    ("Shiny", 2, Rarity::ShinyRareSuper),
];

/// Wiki tab captions mapped to catalog rarity names.
const NAMED_RARITIES: [(&str, Rarity); 7] = [
    ("Double Rare", Rarity::RareDouble),
    ("Illustration Rare", Rarity::RareIllustration),
    ("Super Rare", Rarity::RareSuper),
    ("Special Illustration Rare", Rarity::RareSpecialIllustration),
    ("Ultra Rare", Rarity::RareUltra),
    ("Shiny Rare", Rarity::ShinyRareDouble),
    ("Shiny Super Rare", Rarity::ShinyRareSuper),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RarityIssue {
    UnknownLabel { label: String },
    MissingVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRarity {
    pub artist: Option<String>,
    pub rarity: Option<Rarity>,
    pub issue: Option<RarityIssue>,
}

fn symbol_rarity(label: &str, count: u32) -> Option<Rarity> {
    SYMBOL_RARITIES
        .iter()
        .find(|(mark, mark_count, _)| *mark == label && *mark_count == count)
        .map(|(_, _, rarity)| *rarity)
}

fn named_rarity(caption: &str) -> Option<Rarity> {
    NAMED_RARITIES
        .iter()
        .find(|(name, _)| *name == caption)
        .map(|(_, rarity)| *rarity)
}

/// Resolve artist and rarity for one card number.
///
/// Cards with at most one art version use the page-level illustrator and the
/// symbol-count encoding (no label at all means a promo print). Cards with
/// several versions take both from the version entry matching the requested
/// number. Every gap degrades to an unset field plus an issue; this never
/// fails.
pub fn resolve(
    illustrator: Option<&str>,
    label: Option<&RarityLabel>,
    versions: &[CardVersion],
    card_number: &str,
) -> ResolvedRarity {
    if versions.len() < 2 {
        let artist = illustrator.map(str::to_string);
        return match label {
            None => ResolvedRarity {
                artist,
                rarity: Some(Rarity::Promo),
                issue: None,
            },
            Some(label) => match symbol_rarity(&label.label, label.count) {
                Some(rarity) => ResolvedRarity {
                    artist,
                    rarity: Some(rarity),
                    issue: None,
                },
                None => ResolvedRarity {
                    artist,
                    rarity: None,
                    issue: Some(RarityIssue::UnknownLabel {
                        label: format!("{} {}", label.label, label.count),
                    }),
                },
            },
        };
    }

    let Some(version) = versions.iter().find(|version| version.number == card_number) else {
        return ResolvedRarity {
            artist: None,
            rarity: None,
            issue: Some(RarityIssue::MissingVersion),
        };
    };
    let artist = Some(version.illustrator.clone());
    match Rarity::parse(&version.caption).or_else(|| named_rarity(&version.caption)) {
        Some(rarity) => ResolvedRarity {
            artist,
            rarity: Some(rarity),
            issue: None,
        },
        None => ResolvedRarity {
            artist,
            rarity: None,
            issue: Some(RarityIssue::UnknownLabel {
                label: version.caption.clone(),
            }),
        },
    }
}

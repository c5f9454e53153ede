use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::catalog::{
    Ability, Attack, Card, CardSet, EX_RULE, EnergyType, ITEM_RULE, Legalities, SERIES,
    SUPPORTER_RULE, Subtype, Supertype, WEAKNESS_VALUE, Weakness, card_images, set_images,
};
use crate::evolution::EvolutionGraph;
use crate::extract::{AttackRecord, CardMetadata, SetMetadata};
use crate::rarity::{self, RarityIssue};
use crate::report::{ImportReport, Warning};

// Link templates like {{TCG|Item}} reduce to their display text.
static LINK_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{.+?\|(.+?)\}\}").expect("link template pattern"));

// Energy names embedded in a cost string, e.g. {{e|Grass}}{{e|Colorless}}.
static COST_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]\w+").expect("cost token pattern"));

fn collapse_templates(text: &str) -> String {
    LINK_TEMPLATE.replace_all(text, "$1").into_owned()
}

fn rules_text(effect: &str) -> String {
    collapse_templates(effect).replace("<br>", " ")
}

fn cost_tokens(cost: Option<&str>) -> Vec<EnergyType> {
    let Some(cost) = cost else {
        return Vec::new();
    };
    COST_TOKEN
        .find_iter(cost)
        .filter_map(|token| EnergyType::parse(token.as_str()))
        .collect()
}

fn normalize_attack(attack: &AttackRecord) -> Attack {
    let cost = cost_tokens(attack.cost.as_deref());
    Attack {
        name: attack.name.clone(),
        converted_energy_cost: cost.len(),
        cost,
        damage: attack.damage.clone().unwrap_or_default(),
        text: attack
            .effect
            .as_deref()
            .map(collapse_templates)
            .unwrap_or_default(),
    }
}

/// Assemble the finished card record for one card number.
///
/// Must run after the set's full evolution pass; the graph is read-only here.
/// Rarity gaps are reported as warnings on `report` and never fail the card.
pub fn normalize_card(
    set: &SetMetadata,
    card_name: &str,
    card_number: &str,
    metadata: &CardMetadata,
    evolutions: &EvolutionGraph,
    report: &mut ImportReport,
) -> Result<Card> {
    let mut subtypes = Vec::new();
    let mut rules = Vec::new();
    let mut hp = None;
    let mut types = None;
    let mut evolves_from = None;
    let mut evolves_to = None;
    let mut abilities = None;
    let mut attacks = None;
    let mut weaknesses = None;
    let mut retreat_cost = None;
    let mut converted_retreat_cost = None;
    let mut flavor_text = None;

    let supertype = match metadata {
        CardMetadata::Pokemon(card) => {
            let stage = card
                .evolution_stage
                .as_deref()
                .and_then(Subtype::parse)
                .unwrap_or(Subtype::Basic);
            subtypes.push(stage);
            if card.is_ex {
                subtypes.push(Subtype::Ex);
                rules.push(EX_RULE.to_string());
            }

            let element = EnergyType::parse(&card.element_type)
                .with_context(|| format!("unrecognized energy type `{}`", card.element_type))?;
            types = Some(vec![element]);
            hp = Some(card.hp.clone());

            let resolved = evolutions.resolve(&card.species);
            evolves_from = resolved.evolves_from;
            // EX prints are terminal for forward-evolution display.
            if !card.is_ex && !resolved.evolves_to.is_empty() {
                evolves_to = Some(resolved.evolves_to);
            }

            if !card.abilities.is_empty() {
                abilities = Some(
                    card.abilities
                        .iter()
                        .map(|ability| Ability {
                            name: ability.name.clone(),
                            text: collapse_templates(&ability.effect),
                            kind: ability.kind.clone(),
                        })
                        .collect(),
                );
            }
            if !card.attacks.is_empty() {
                attacks = Some(card.attacks.iter().map(normalize_attack).collect());
            }
            if let Some(weakness) = card.weakness.as_deref().and_then(EnergyType::parse) {
                weaknesses = Some(vec![Weakness {
                    energy: weakness,
                    value: WEAKNESS_VALUE.to_string(),
                }]);
            }

            let count: u32 = card
                .retreat_cost
                .trim()
                .parse()
                .with_context(|| format!("invalid retreat cost `{}`", card.retreat_cost))?;
            retreat_cost = Some(vec![EnergyType::Colorless; count as usize]);
            converted_retreat_cost = Some(count);
            flavor_text = card.flavor_text.clone();
            Supertype::Pokemon
        }
        CardMetadata::Trainer(card) => {
            let subtype = Subtype::parse(&card.subtype)
                .with_context(|| format!("unrecognized Trainer subtype `{}`", card.subtype))?;
            subtypes.push(subtype);
            rules.push(rules_text(&card.effect));
            if subtype == Subtype::Item {
                rules.push(ITEM_RULE.to_string());
            }
            if subtype == Subtype::Supporter {
                rules.push(SUPPORTER_RULE.to_string());
            }
            hp = card.hp.clone();
            Supertype::Trainer
        }
    };

    let resolved = rarity::resolve(
        metadata.illustrator(),
        metadata.rarity_label(),
        metadata.versions(),
        card_number,
    );
    if let Some(issue) = resolved.issue {
        report.warn(match issue {
            RarityIssue::UnknownLabel { label } => Warning::UnknownRarity {
                set: set.name.clone(),
                number: card_number.to_string(),
                card: card_name.to_string(),
                label,
            },
            RarityIssue::MissingVersion => Warning::MissingVersion {
                set: set.name.clone(),
                number: card_number.to_string(),
                card: card_name.to_string(),
            },
        });
    }

    Ok(Card {
        id: format!("{}-{}", set.long_id, card_number),
        name: card_name.to_string(),
        supertype,
        subtypes,
        hp,
        types,
        evolves_from,
        evolves_to,
        rules: if rules.is_empty() { None } else { Some(rules) },
        abilities,
        attacks,
        weaknesses,
        retreat_cost,
        converted_retreat_cost,
        number: card_number.to_string(),
        artist: resolved.artist,
        rarity: resolved.rarity,
        flavor_text,
        regulation_mark: set.regulation_mark.clone(),
        images: card_images(&set.long_id, card_number),
    })
}

/// Aggregate set metadata once every card of the set is normalized.
pub fn normalize_set(
    set: &SetMetadata,
    total: usize,
    generated_at: DateTime<Utc>,
) -> Result<CardSet> {
    let release = NaiveDate::parse_from_str(&set.release_date, "%B %d, %Y")
        .with_context(|| format!("unparseable release date `{}`", set.release_date))?;
    Ok(CardSet {
        id: set.long_id.clone(),
        name: set.name.clone(),
        series: SERIES.to_string(),
        printed_total: set.printed_total.unwrap_or(total as u32),
        total: total as u32,
        legalities: Legalities::default(),
        ptcgo_code: set.ptcgo_code.clone(),
        release_date: release.format("%Y/%m/%d").to_string(),
        updated_at: generated_at.format("%Y/%m/%d %H:%M:%S").to_string(),
        images: set_images(&set.long_id),
    })
}

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

const POKEMON_MARKER: &str = "{{TCG Card Infobox/Pokémon/Pocket";
const TRAINER_MARKER: &str = "{{TCG Card Infobox/Trainer/Pocket";
const TRAINER_TEXT_MARKER: &str = "{{TCGTrainerText";
const EX_MARKER: &str = "{{Cardtext/Pocket ex";

static CARD_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\|\| \{\{TCG ID\|[^|}\n]*\|([^|}\n]+)\|([^|}\n]+)")
        .expect("card list pattern")
});

static EXPANSION_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{TCG Card Infobox/Expansion Entry[^\n]*?\|rarity=([^|}\n]+)\|rarity count=(\d+)")
        .expect("expansion entry pattern")
});

static VERSION_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{TCG Card Infobox/Tabbed Image/Pocket\|image=[^|\n]*?(\d+)\.png\|illustrator=([^|\n]*)\|tab caption=([^|}\n]*)",
    )
    .expect("tabbed image pattern")
});

static ABILITY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)\{\{Cardtext/Ability(?:/Pocket)?\n(.*?)^\}\}").expect("ability pattern")
});

static ATTACK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)\{\{Cardtext/Attack(?:/Pocket)?\n(.*?)^\}\}").expect("attack pattern")
});

static RELEASE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]\w+ \d+, \d+").expect("release date pattern"));

static PRINTED_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|cards=\d+ \((\d+)").expect("printed total pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMetadata {
    pub name: String,
    pub short_code: String,
    pub long_id: String,
    pub release_date: String,
    pub printed_total: Option<u32>,
    pub regulation_mark: String,
    pub ptcgo_code: String,
}

impl SetMetadata {
    fn new(name: &str, short_code: &str, release_date: &str, printed_total: Option<u32>) -> Self {
        // Promo set codes carry a leading "P"; everything else passes through.
        let regulation_mark = match short_code.strip_prefix('P') {
            Some(rest) => format!("PROMO-{rest}"),
            None => short_code.to_string(),
        };
        let ptcgo_code = match short_code.strip_prefix('P') {
            Some(rest) => format!("PR-{rest}"),
            None => short_code.to_string(),
        };
        Self {
            name: name.to_string(),
            long_id: format!("tcgp{}", short_code.to_lowercase()),
            short_code: short_code.to_string(),
            release_date: release_date.to_string(),
            printed_total,
            regulation_mark,
            ptcgo_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub name: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarityLabel {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardVersion {
    pub number: String,
    pub illustrator: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityRecord {
    pub kind: String,
    pub name: String,
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackRecord {
    pub name: String,
    pub cost: Option<String>,
    pub damage: Option<String>,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonCard {
    pub species: String,
    pub element_type: String,
    pub illustrator: Option<String>,
    pub rarity: Option<RarityLabel>,
    pub hp: String,
    pub weakness: Option<String>,
    pub retreat_cost: String,
    pub evolution_stage: Option<String>,
    pub prevo_name: Option<String>,
    pub abilities: Vec<AbilityRecord>,
    pub attacks: Vec<AttackRecord>,
    pub flavor_text: Option<String>,
    pub is_ex: bool,
    pub versions: Vec<CardVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerCard {
    pub subtype: String,
    pub illustrator: Option<String>,
    pub rarity: Option<RarityLabel>,
    pub hp: Option<String>,
    pub effect: String,
    pub versions: Vec<CardVersion>,
}

/// Extracted card fields, shaped by the infobox variant the page uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardMetadata {
    Pokemon(PokemonCard),
    Trainer(TrainerCard),
}

impl CardMetadata {
    pub fn versions(&self) -> &[CardVersion] {
        match self {
            Self::Pokemon(card) => &card.versions,
            Self::Trainer(card) => &card.versions,
        }
    }

    pub fn illustrator(&self) -> Option<&str> {
        match self {
            Self::Pokemon(card) => card.illustrator.as_deref(),
            Self::Trainer(card) => card.illustrator.as_deref(),
        }
    }

    pub fn rarity_label(&self) -> Option<&RarityLabel> {
        match self {
            Self::Pokemon(card) => card.rarity.as_ref(),
            Self::Trainer(card) => card.rarity.as_ref(),
        }
    }
}

/// First `|name=value` occurrence, value running to end of line. Empty values
/// count as absent.
fn param<'a>(wikitext: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("|{name}=");
    let start = wikitext.find(&needle)? + needle.len();
    let value = wikitext[start..].lines().next().unwrap_or("").trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Like [`param`], but skips occurrences whose value is followed by further
/// template arguments on the same line. The top-level `|illustrator=` line
/// must not be confused with the inline one inside a Tabbed Image entry.
fn clean_param<'a>(wikitext: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("|{name}=");
    let mut rest = wikitext;
    while let Some(pos) = rest.find(&needle) {
        let after = &rest[pos + needle.len()..];
        let value = after.lines().next().unwrap_or("").trim();
        if !value.is_empty() && !value.contains('|') && !value.contains('}') {
            return Some(value);
        }
        rest = after;
    }
    None
}

fn required_param<'a>(wikitext: &'a str, name: &str) -> Result<&'a str> {
    param(wikitext, name).with_context(|| format!("missing required field `{name}`"))
}

/// Parse set-page metadata. Required: set name, logo code, release date.
pub fn extract_set(wikitext: &str) -> Result<SetMetadata> {
    let name = required_param(wikitext, "setname")?;
    let logo = required_param(wikitext, "setlogo")?;
    let short_code = logo
        .split_whitespace()
        .next()
        .context("empty `setlogo` value")?;
    let release_date = release_date(wikitext)?;
    let printed_total = PRINTED_TOTAL
        .captures(wikitext)
        .and_then(|captures| captures[1].parse().ok());
    Ok(SetMetadata::new(name, short_code, release_date, printed_total))
}

// The release line lists one date per region; the last one is the global release.
fn release_date(wikitext: &str) -> Result<&str> {
    let line = wikitext
        .lines()
        .find_map(|line| line.split_once("|release=").map(|(_, rest)| rest))
        .context("missing required field `release`")?;
    let date = RELEASE_DATE
        .find_iter(line)
        .last()
        .context("no date found on the `release` line")?;
    Ok(date.as_str())
}

/// All card rows of a set listing page, in listing order.
pub fn set_card_entries(wikitext: &str) -> Vec<CardEntry> {
    CARD_LIST
        .captures_iter(wikitext)
        .map(|captures| CardEntry {
            name: captures[1].trim().to_string(),
            number: captures[2].trim().to_string(),
        })
        .collect()
}

/// Parse card-page metadata, branching on the infobox variant.
pub fn extract_card(wikitext: &str) -> Result<CardMetadata> {
    if wikitext.trim_start().starts_with("#REDIRECT") {
        bail!("page is a redirect");
    }
    if wikitext.contains(POKEMON_MARKER) {
        return Ok(CardMetadata::Pokemon(extract_pokemon(wikitext)?));
    }
    if wikitext.contains(TRAINER_MARKER) {
        return Ok(CardMetadata::Trainer(extract_trainer(wikitext)?));
    }
    bail!("card page matches no known infobox layout")
}

fn extract_pokemon(wikitext: &str) -> Result<PokemonCard> {
    Ok(PokemonCard {
        species: required_param(wikitext, "species")?.to_string(),
        element_type: required_param(wikitext, "type")?.to_string(),
        illustrator: clean_param(wikitext, "illustrator").map(str::to_string),
        rarity: rarity_label(wikitext),
        hp: required_param(wikitext, "hp")?.to_string(),
        weakness: param(wikitext, "weakness").map(str::to_string),
        retreat_cost: required_param(wikitext, "retreat cost")?.to_string(),
        evolution_stage: param(wikitext, "evo stage").map(str::to_string),
        prevo_name: param(wikitext, "prevo name").map(str::to_string),
        abilities: extract_abilities(wikitext),
        attacks: extract_attacks(wikitext),
        flavor_text: param(wikitext, "dex").map(str::to_string),
        is_ex: wikitext.contains(EX_MARKER),
        versions: extract_versions(wikitext),
    })
}

fn extract_trainer(wikitext: &str) -> Result<TrainerCard> {
    // The effect lives in the TCGTrainerText block, after the infobox.
    let effect = wikitext
        .find(TRAINER_TEXT_MARKER)
        .and_then(|pos| param(&wikitext[pos..], "effect"))
        .context("missing required field `effect`")?;
    Ok(TrainerCard {
        subtype: required_param(wikitext, "subtype")?.to_string(),
        illustrator: clean_param(wikitext, "illustrator").map(str::to_string),
        rarity: rarity_label(wikitext),
        hp: param(wikitext, "hp").map(str::to_string),
        effect: effect.to_string(),
        versions: extract_versions(wikitext),
    })
}

fn rarity_label(wikitext: &str) -> Option<RarityLabel> {
    let captures = EXPANSION_ENTRY.captures(wikitext)?;
    let count = captures[2].parse().ok()?;
    Some(RarityLabel {
        label: captures[1].trim().to_string(),
        count,
    })
}

/// Ability blocks in page order. Blocks missing a required field are skipped.
pub fn extract_abilities(wikitext: &str) -> Vec<AbilityRecord> {
    ABILITY_BLOCK
        .captures_iter(wikitext)
        .filter_map(|captures| {
            let body = captures.get(1)?.as_str();
            Some(AbilityRecord {
                kind: param(body, "type")?.to_string(),
                name: param(body, "name")?.to_string(),
                effect: param(body, "effect")?.to_string(),
            })
        })
        .collect()
}

/// Attack blocks in page order. Cost, damage and effect are all optional;
/// some attacks are free.
pub fn extract_attacks(wikitext: &str) -> Vec<AttackRecord> {
    ATTACK_BLOCK
        .captures_iter(wikitext)
        .filter_map(|captures| {
            let body = captures.get(1)?.as_str();
            Some(AttackRecord {
                name: param(body, "name")?.to_string(),
                cost: param(body, "cost").map(str::to_string),
                damage: param(body, "damage").map(str::to_string),
                effect: param(body, "effect").map(str::to_string),
            })
        })
        .collect()
}

/// Alternate-art entries for cards printed at several rarities. The caption is
/// trimmed of any trailing parenthetical.
pub fn extract_versions(wikitext: &str) -> Vec<CardVersion> {
    VERSION_ENTRY
        .captures_iter(wikitext)
        .map(|captures| {
            let caption = captures[3].split(" (").next().unwrap_or("").trim();
            CardVersion {
                number: captures[1].to_string(),
                illustrator: captures[2].trim().to_string(),
                caption: caption.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET_PAGE: &str = "\
{{SetInfoboxTCGPocket
|setname=Genetic Apex
|setlogo=A1 SetLogo.png
|cards=286 (226 in the base set)
|release=September 26, 2024 (New Zealand) September 30, 2024
}}
{| class=\"roundy\"
|- style=\"background:#FFF\"
|| {{TCG ID|Genetic Apex|Bulbasaur|001}}
|- style=\"background:#FFF\"
|| {{TCG ID|Genetic Apex|Ivysaur|002|Uncommon}}
|}
";

    const BULBASAUR_PAGE: &str = "\
{{TCG Card Infobox/Pokémon/Pocket
|cardname=Bulbasaur
|species=Bulbasaur
|type=Grass
|image=GeneticApexBulbasaur001.png
|illustrator=Narumi Sato
|hp=70
|weakness=Fire
|retreat cost=1
|evo stage=Basic
|dex=There is a plant seed on its back right from the day this Pokémon is born.
}}
{{TCG Card Infobox/Expansion Entry|expansion=Genetic Apex|rarity=Diamond|rarity count=1|number=001}}
{{Cardtext/Attack/Pocket
|cost={{e|Grass}}{{e|Colorless}}
|name=Vine Whip
|damage=40
|effect=
}}
";

    const BUTTERFREE_PAGE: &str = "\
{{TCG Card Infobox/Pokémon/Pocket
|species=Butterfree
|type=Grass
|illustrator=Midori Harada
|hp=120
|weakness=Fire
|retreat cost=1
|evo stage=Stage 2
|prevo name=Metapod
}}
{{TCG Card Infobox/Expansion Entry|expansion=Genetic Apex|rarity=Diamond|rarity count=3|number=006}}
{{Cardtext/Ability/Pocket
|type=Ability
|name=Powder Heal
|effect=Once during your turn, you may heal 20 damage from each of your {{TCG|Pokémon}}.
}}
{{Cardtext/Attack/Pocket
|cost={{e|Grass}}{{e|Colorless}}{{e|Colorless}}
|name=Gust
|damage=60
|effect=
}}
";

    const MEWTWO_EX_PAGE: &str = "\
{{TCG Card Infobox/Pokémon/Pocket
|species=Mewtwo
|type=Psychic
|hp=150
|retreat cost=2
|evo stage=Basic
}}
{{TCG Card Infobox/Tabbed Image/Pocket|image=GeneticApexMewtwoex286.png|illustrator=PLANETA Mochizuki|tab caption=Ultra Rare}}
{{TCG Card Infobox/Tabbed Image/Pocket|image=GeneticApexMewtwoex262.png|illustrator=komiya|tab caption=Illustration Rare (holo)}}
{{Cardtext/Pocket ex}}
{{Cardtext/Attack/Pocket
|cost={{e|Psychic}}{{e|Psychic}}{{e|Colorless}}{{e|Colorless}}
|name=Psydrive
|damage=150
|effect=Discard 2 {{e|Psychic}} Energy from this Pokémon.
}}
";

    const POTION_PAGE: &str = "\
{{TCG Card Infobox/Trainer/Pocket
|cardname=Potion
|subtype=Item
|illustrator=Ryo Ueda
}}
{{TCG Card Infobox/Expansion Entry|expansion=Genetic Apex|rarity=Diamond|rarity count=1|number=219}}
{{TCGTrainerText
|effect=Heal 20 damage from 1 of your {{TCG|Pokémon}}.
}}
";

    #[test]
    fn set_metadata_extracts_required_and_derived_fields() {
        let set = extract_set(SET_PAGE).expect("set");
        assert_eq!(set.name, "Genetic Apex");
        assert_eq!(set.short_code, "A1");
        assert_eq!(set.long_id, "tcgpa1");
        assert_eq!(set.printed_total, Some(226));
        assert_eq!(set.regulation_mark, "A1");
        assert_eq!(set.ptcgo_code, "A1");
    }

    #[test]
    fn set_release_date_is_the_last_date_on_the_release_line() {
        let set = extract_set(SET_PAGE).expect("set");
        assert_eq!(set.release_date, "September 30, 2024");
    }

    #[test]
    fn promo_set_codes_gain_prefixed_marks() {
        let set = extract_set(
            "|setname=Promo-A\n|setlogo=PA logo.png\n|release=October 30, 2024\n",
        )
        .expect("set");
        assert_eq!(set.long_id, "tcgppa");
        assert_eq!(set.regulation_mark, "PROMO-A");
        assert_eq!(set.ptcgo_code, "PR-A");
        assert_eq!(set.printed_total, None);
    }

    #[test]
    fn set_without_name_is_rejected() {
        let error = extract_set("|setlogo=A1 logo.png\n|release=May 1, 2025\n")
            .expect_err("must fail");
        assert!(error.to_string().contains("setname"));
    }

    #[test]
    fn card_entries_come_back_in_listing_order() {
        let entries = set_card_entries(SET_PAGE);
        assert_eq!(
            entries,
            vec![
                CardEntry {
                    name: "Bulbasaur".to_string(),
                    number: "001".to_string()
                },
                CardEntry {
                    name: "Ivysaur".to_string(),
                    number: "002".to_string()
                },
            ]
        );
    }

    #[test]
    fn pokemon_card_extracts_all_fields() {
        let CardMetadata::Pokemon(card) = extract_card(BULBASAUR_PAGE).expect("card") else {
            panic!("expected a Pokémon card");
        };
        assert_eq!(card.species, "Bulbasaur");
        assert_eq!(card.element_type, "Grass");
        assert_eq!(card.illustrator.as_deref(), Some("Narumi Sato"));
        assert_eq!(card.hp, "70");
        assert_eq!(card.weakness.as_deref(), Some("Fire"));
        assert_eq!(card.retreat_cost, "1");
        assert_eq!(card.evolution_stage.as_deref(), Some("Basic"));
        assert_eq!(card.prevo_name, None);
        assert!(!card.is_ex);
        assert_eq!(
            card.rarity,
            Some(RarityLabel {
                label: "Diamond".to_string(),
                count: 1
            })
        );
        assert!(card.flavor_text.as_deref().is_some_and(|dex| dex.starts_with("There is")));
        assert!(card.abilities.is_empty());
        assert_eq!(card.attacks.len(), 1);
        assert!(card.versions.is_empty());
    }

    #[test]
    fn evolution_fields_are_absent_tolerant() {
        let CardMetadata::Pokemon(card) = extract_card(BUTTERFREE_PAGE).expect("card") else {
            panic!("expected a Pokémon card");
        };
        assert_eq!(card.evolution_stage.as_deref(), Some("Stage 2"));
        assert_eq!(card.prevo_name.as_deref(), Some("Metapod"));
    }

    #[test]
    fn ex_marker_is_detected_anywhere_in_the_page() {
        let CardMetadata::Pokemon(card) = extract_card(MEWTWO_EX_PAGE).expect("card") else {
            panic!("expected a Pokémon card");
        };
        assert!(card.is_ex);
        assert_eq!(card.illustrator, None);
        assert_eq!(card.rarity, None);
    }

    #[test]
    fn ability_blocks_parse_type_name_and_effect() {
        let abilities = extract_abilities(BUTTERFREE_PAGE);
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].kind, "Ability");
        assert_eq!(abilities[0].name, "Powder Heal");
        assert!(abilities[0].effect.contains("{{TCG|Pokémon}}"));
    }

    #[test]
    fn attack_blocks_keep_the_raw_cost_string() {
        let attacks = extract_attacks(BULBASAUR_PAGE);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].name, "Vine Whip");
        assert_eq!(attacks[0].cost.as_deref(), Some("{{e|Grass}}{{e|Colorless}}"));
        assert_eq!(attacks[0].damage.as_deref(), Some("40"));
        assert_eq!(attacks[0].effect, None);
    }

    #[test]
    fn attack_without_cost_line_is_free_not_an_error() {
        let attacks = extract_attacks(
            "{{Cardtext/Attack/Pocket\n|name=Splash About\n|damage=10\n}}\n",
        );
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].cost, None);
    }

    #[test]
    fn version_entries_trim_trailing_parentheticals() {
        let versions = extract_versions(MEWTWO_EX_PAGE);
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].number, "286");
        assert_eq!(versions[0].illustrator, "PLANETA Mochizuki");
        assert_eq!(versions[0].caption, "Ultra Rare");
        assert_eq!(versions[1].number, "262");
        assert_eq!(versions[1].caption, "Illustration Rare");
    }

    #[test]
    fn trainer_card_extracts_subtype_and_effect() {
        let CardMetadata::Trainer(card) = extract_card(POTION_PAGE).expect("card") else {
            panic!("expected a Trainer card");
        };
        assert_eq!(card.subtype, "Item");
        assert_eq!(card.illustrator.as_deref(), Some("Ryo Ueda"));
        assert_eq!(card.hp, None);
        assert_eq!(card.effect, "Heal 20 damage from 1 of your {{TCG|Pokémon}}.");
    }

    #[test]
    fn trainer_without_effect_is_rejected() {
        let error = extract_card(
            "{{TCG Card Infobox/Trainer/Pocket\n|subtype=Item\n}}\n",
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("effect"));
    }

    #[test]
    fn pokemon_without_hp_is_rejected() {
        let error = extract_card(
            "{{TCG Card Infobox/Pokémon/Pocket\n|species=Mew\n|type=Psychic\n|retreat cost=1\n}}\n",
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("hp"));
    }

    #[test]
    fn unknown_layouts_and_redirects_are_rejected() {
        assert!(extract_card("{{Some other template}}").is_err());
        assert!(extract_card("#REDIRECT [[Pikachu (Genetic Apex 094)]]").is_err());
    }
}

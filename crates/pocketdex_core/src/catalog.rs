use serde::Serialize;

pub const SERIES: &str = "TCG Pocket";
pub const IMAGE_HOST: &str = "https://images.pokemontcg.io";

pub const EX_RULE: &str =
    "ex rule: When your Pokémon ex is Knocked Out, your opponent gets 2 points.";
pub const ITEM_RULE: &str = "You may play any number of Item cards during your turn.";
pub const SUPPORTER_RULE: &str = "You may play only 1 Supporter card during your turn.";

/// The source never states a numeric weakness bonus; the catalog convention is a flat +20.
pub const WEAKNESS_VALUE: &str = "+20";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Supertype {
    #[serde(rename = "Pokémon")]
    Pokemon,
    Trainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Subtype {
    Basic,
    #[serde(rename = "EX")]
    Ex,
    Item,
    #[serde(rename = "Stage 1")]
    StageOne,
    #[serde(rename = "Stage 2")]
    StageTwo,
    Supporter,
}

impl Subtype {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Basic" => Some(Self::Basic),
            "EX" => Some(Self::Ex),
            "Item" => Some(Self::Item),
            "Stage 1" => Some(Self::StageOne),
            "Stage 2" => Some(Self::StageTwo),
            "Supporter" => Some(Self::Supporter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyType {
    Grass,
    Fire,
    Water,
    Lightning,
    Psychic,
    Fighting,
    Darkness,
    Metal,
    Dragon,
    Colorless,
}

impl EnergyType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Grass" => Some(Self::Grass),
            "Fire" => Some(Self::Fire),
            "Water" => Some(Self::Water),
            "Lightning" => Some(Self::Lightning),
            "Psychic" => Some(Self::Psychic),
            "Fighting" => Some(Self::Fighting),
            "Darkness" => Some(Self::Darkness),
            "Metal" => Some(Self::Metal),
            "Dragon" => Some(Self::Dragon),
            "Colorless" => Some(Self::Colorless),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Rare Double")]
    RareDouble,
    #[serde(rename = "Rare Illustration")]
    RareIllustration,
    #[serde(rename = "Rare Super")]
    RareSuper,
    #[serde(rename = "Rare Special Illustration")]
    RareSpecialIllustration,
    Immersive,
    #[serde(rename = "Rare Ultra")]
    RareUltra,
    #[serde(rename = "Shiny Rare Double")]
    ShinyRareDouble,
    #[serde(rename = "Shiny Rare Super")]
    ShinyRareSuper,
    Promo,
}

impl Rarity {
    /// Parse a caption that already uses the catalog's own rarity vocabulary.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Common" => Some(Self::Common),
            "Uncommon" => Some(Self::Uncommon),
            "Rare" => Some(Self::Rare),
            "Rare Double" => Some(Self::RareDouble),
            "Rare Illustration" => Some(Self::RareIllustration),
            "Rare Super" => Some(Self::RareSuper),
            "Rare Special Illustration" => Some(Self::RareSpecialIllustration),
            "Immersive" => Some(Self::Immersive),
            "Rare Ultra" => Some(Self::RareUltra),
            "Shiny Rare Double" => Some(Self::ShinyRareDouble),
            "Shiny Rare Super" => Some(Self::ShinyRareSuper),
            "Promo" => Some(Self::Promo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ability {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub name: String,
    pub cost: Vec<EnergyType>,
    pub converted_energy_cost: usize,
    pub damage: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Weakness {
    #[serde(rename = "type")]
    pub energy: EnergyType,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardImages {
    pub small: String,
    pub large: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetImages {
    pub symbol: String,
    pub logo: String,
}

pub fn card_images(set_id: &str, card_number: &str) -> CardImages {
    CardImages {
        small: format!("{IMAGE_HOST}/{set_id}/{card_number}.png"),
        large: format!("{IMAGE_HOST}/{set_id}/{card_number}_hires.png"),
    }
}

pub fn set_images(set_id: &str) -> SetImages {
    SetImages {
        symbol: format!("{IMAGE_HOST}/{set_id}/symbol.png"),
        logo: format!("{IMAGE_HOST}/{set_id}/logo.png"),
    }
}

/// Downstream consumers expect the key to exist even though TCG Pocket has no
/// format legality data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Legalities {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub supertype: Supertype,
    pub subtypes: Vec<Subtype>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<EnergyType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evolves_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evolves_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abilities: Option<Vec<Ability>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attacks: Option<Vec<Attack>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<Weakness>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retreat_cost: Option<Vec<EnergyType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_retreat_cost: Option<u32>,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
    pub regulation_mark: String,
    pub images: CardImages,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub id: String,
    pub name: String,
    pub series: String,
    pub printed_total: u32,
    pub total: u32,
    pub legalities: Legalities,
    pub ptcgo_code: String,
    pub release_date: String,
    pub updated_at: String,
    pub images: SetImages,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_serializes_to_catalog_strings() {
        assert_eq!(
            serde_json::to_string(&Supertype::Pokemon).expect("json"),
            "\"Pokémon\""
        );
        assert_eq!(
            serde_json::to_string(&Subtype::StageOne).expect("json"),
            "\"Stage 1\""
        );
        assert_eq!(serde_json::to_string(&Subtype::Ex).expect("json"), "\"EX\"");
        assert_eq!(
            serde_json::to_string(&Rarity::RareSpecialIllustration).expect("json"),
            "\"Rare Special Illustration\""
        );
        assert_eq!(
            serde_json::to_string(&EnergyType::Lightning).expect("json"),
            "\"Lightning\""
        );
    }

    #[test]
    fn rarity_parse_round_trips_catalog_names() {
        for rarity in [
            Rarity::Common,
            Rarity::RareDouble,
            Rarity::Immersive,
            Rarity::RareUltra,
            Rarity::ShinyRareSuper,
            Rarity::Promo,
        ] {
            let rendered = serde_json::to_string(&rarity).expect("json");
            let name = rendered.trim_matches('"');
            assert_eq!(Rarity::parse(name), Some(rarity));
        }
        assert_eq!(Rarity::parse("Ultra Rare"), None);
    }

    #[test]
    fn image_urls_follow_fixed_templates() {
        let images = card_images("tcgpa1", "001");
        assert_eq!(images.small, "https://images.pokemontcg.io/tcgpa1/001.png");
        assert_eq!(
            images.large,
            "https://images.pokemontcg.io/tcgpa1/001_hires.png"
        );
        let images = set_images("tcgpa1");
        assert_eq!(images.symbol, "https://images.pokemontcg.io/tcgpa1/symbol.png");
        assert_eq!(images.logo, "https://images.pokemontcg.io/tcgpa1/logo.png");
    }

    #[test]
    fn card_serialization_uses_camel_case_and_skips_absent_fields() {
        let card = Card {
            id: "tcgpa1-001".to_string(),
            name: "Bulbasaur".to_string(),
            supertype: Supertype::Pokemon,
            subtypes: vec![Subtype::Basic],
            hp: Some("70".to_string()),
            types: Some(vec![EnergyType::Grass]),
            evolves_from: None,
            evolves_to: None,
            rules: None,
            abilities: None,
            attacks: None,
            weaknesses: None,
            retreat_cost: Some(vec![EnergyType::Colorless]),
            converted_retreat_cost: Some(1),
            number: "001".to_string(),
            artist: None,
            rarity: Some(Rarity::Common),
            flavor_text: None,
            regulation_mark: "A1".to_string(),
            images: card_images("tcgpa1", "001"),
        };
        let value = serde_json::to_value(&card).expect("json");
        assert_eq!(value["convertedRetreatCost"], 1);
        assert_eq!(value["regulationMark"], "A1");
        assert!(value.get("evolvesFrom").is_none());
        assert!(value.get("flavorText").is_none());
    }

    #[test]
    fn legalities_serialize_to_empty_object() {
        assert_eq!(
            serde_json::to_string(&Legalities::default()).expect("json"),
            "{}"
        );
    }
}

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;

use crate::api::PageStore;
use crate::catalog::CardSet;
use crate::config::PocketdexConfig;
use crate::evolution::EvolutionGraph;
use crate::export;
use crate::extract::{self, CardEntry, CardMetadata};
use crate::normalize;
use crate::report::{ImportReport, SetOutcome};
use crate::runtime::ResolvedPaths;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub merge_base: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { merge_base: true }
    }
}

/// Run the full import: discover sets, extract and normalize every card, and
/// write the per-set card files plus the aggregate sets index.
///
/// A malformed page only loses that one set or card; the run keeps going.
pub fn run_import(
    store: &PageStore,
    config: &PocketdexConfig,
    paths: &ResolvedPaths,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let mut report = ImportReport::new();
    let suffix = config.page_suffix();
    let titles: Vec<String> = store
        .set_titles(config.category())?
        .into_iter()
        .filter(|title| title.ends_with(suffix))
        .collect();

    let mut exported_sets = Vec::new();
    for title in &titles {
        match import_set(store, paths, title, &mut report) {
            Ok(set) => exported_sets.push(set),
            Err(error) => {
                eprintln!("skipping set \"{title}\": {error:#}");
                report.skipped_sets += 1;
            }
        }
    }

    let base = load_base_sets(store, config, options);
    let merged = export::merge_base_sets(base, &exported_sets)?;
    export::write_sets_index(&paths.sets_out_dir, &merged)?;
    Ok(report)
}

fn import_set(
    store: &PageStore,
    paths: &ResolvedPaths,
    title: &str,
    report: &mut ImportReport,
) -> Result<CardSet> {
    let page = store.set_page(title)?;
    let set = extract::extract_set(&page.text)?;
    let entries = extract::set_card_entries(&page.text);
    println!(
        "set \"{}\": {} cards ({})",
        set.name,
        entries.len(),
        source(page.from_cache)
    );

    let mut extracted: Vec<(CardEntry, CardMetadata)> = Vec::new();
    let mut skipped_cards = 0usize;
    for (index, entry) in entries.iter().enumerate() {
        let page_title = format!("{} ({} {})", entry.name, set.name, entry.number);
        let card = store.card_page(&page_title).and_then(|page| {
            println!(
                "  [{}/{}] {} {} ({})",
                index + 1,
                entries.len(),
                entry.number,
                entry.name,
                source(page.from_cache)
            );
            extract::extract_card(&page.text)
        });
        match card {
            Ok(card) => extracted.push((entry.clone(), card)),
            Err(error) => {
                eprintln!("  skipping card \"{page_title}\": {error:#}");
                skipped_cards += 1;
            }
        }
    }

    // A card may reference a predecessor that appears later in the listing, so
    // the graph is filled from the whole set before any card is finished.
    let mut evolutions = EvolutionGraph::new();
    for (_, card) in &extracted {
        if let CardMetadata::Pokemon(pokemon) = card {
            evolutions.observe(&pokemon.species, pokemon.prevo_name.as_deref());
        }
    }

    let mut cards = Vec::new();
    for (entry, card) in &extracted {
        match normalize::normalize_card(&set, &entry.name, &entry.number, card, &evolutions, report)
        {
            Ok(card) => cards.push(card),
            Err(error) => {
                eprintln!("  skipping card \"{} {}\": {error:#}", entry.number, entry.name);
                skipped_cards += 1;
            }
        }
    }

    let card_set = normalize::normalize_set(&set, cards.len(), Utc::now())?;
    export::write_set_cards(&paths.cards_out_dir, &card_set.id, &cards)?;
    report.sets.push(SetOutcome {
        id: card_set.id.clone(),
        name: set.name.clone(),
        total: cards.len(),
        skipped_cards,
    });
    Ok(card_set)
}

// Losing the base catalog only degrades the index to generated sets; the run
// itself still completes.
fn load_base_sets(
    store: &PageStore,
    config: &PocketdexConfig,
    options: &ImportOptions,
) -> Vec<Value> {
    if !options.merge_base {
        return Vec::new();
    }
    let Some(client) = store.client() else {
        return Vec::new();
    };
    match client.fetch_json(config.base_catalog_url()) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            eprintln!("base catalog is not a JSON array; writing generated sets only");
            Vec::new()
        }
        Err(error) => {
            eprintln!("failed to fetch base catalog: {error:#}; writing generated sets only");
            Vec::new()
        }
    }
}

fn source(from_cache: bool) -> &'static str {
    if from_cache { "cached" } else { "fetched" }
}

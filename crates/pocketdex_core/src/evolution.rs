use std::collections::BTreeMap;

/// Evolution links for one expansion.
///
/// Cards reference their predecessor by species name, and either side of a
/// pair may be listed first, so the graph is filled during a full pass over
/// the set and only read once that pass is complete.
#[derive(Debug, Default)]
pub struct EvolutionGraph {
    nodes: BTreeMap<String, EvolutionNode>,
}

#[derive(Debug, Default, Clone)]
struct EvolutionNode {
    evolves_from: Option<String>,
    evolves_to: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedEvolution {
    pub evolves_from: Option<String>,
    pub evolves_to: Vec<String>,
}

impl EvolutionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one card sighting. Creates entries for the species and its
    /// predecessor as needed; repeated identical edges are no-ops.
    pub fn observe(&mut self, species: &str, prevo_name: Option<&str>) {
        self.nodes.entry(species.to_string()).or_default();
        let Some(prevo) = prevo_name.map(str::trim).filter(|name| !name.is_empty()) else {
            return;
        };
        let parent = self.nodes.entry(prevo.to_string()).or_default();
        if !parent.evolves_to.iter().any(|name| name == species) {
            parent.evolves_to.push(species.to_string());
        }
        if let Some(child) = self.nodes.get_mut(species) {
            child.evolves_from = Some(prevo.to_string());
        }
    }

    /// Look up both link directions. Only meaningful after every card of the
    /// set has been observed.
    pub fn resolve(&self, species: &str) -> ResolvedEvolution {
        match self.nodes.get(species) {
            Some(node) => ResolvedEvolution {
                evolves_from: node.evolves_from.clone(),
                evolves_to: node.evolves_to.clone(),
            },
            None => ResolvedEvolution::default(),
        }
    }
}

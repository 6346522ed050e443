use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use tower_lsp::lsp_types::Url;

use crate::ast::simple_name_of;

use super::source_id_stem;

/// Maps each source to the set of external names it references, and answers
/// the reverse question: which sources are affected when one changes.
///
/// Names are stored normalized: star imports keep their `pkg.*` form, every
/// other name is reduced to its simple class name so that package-less
/// references still match.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: RwLock<HashMap<Url, HashSet<String>>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full edge set for `source_id`.
    pub fn update(&self, source_id: &Url, names: impl IntoIterator<Item = String>) {
        if let Ok(mut edges) = self.edges.write() {
            edges.insert(source_id.clone(), names.into_iter().collect());
        }
    }

    pub fn remove(&self, source_id: &Url) {
        if let Ok(mut edges) = self.edges.write() {
            edges.remove(source_id);
        }
    }

    /// Sources that transitively depend on `changed`, via reverse BFS.
    ///
    /// The changed source itself is excluded; every other source appears at
    /// most once. The whole enumeration runs under one read lock so the
    /// closure reflects a consistent snapshot.
    pub fn affected(&self, changed: &Url) -> Vec<Url> {
        let Ok(edges) = self.edges.read() else {
            return Vec::new();
        };

        let mut result: Vec<Url> = Vec::new();
        let mut seen: HashSet<&Url> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(source_id_stem(changed));

        while let Some(class_name) = queue.pop_front() {
            for (source, names) in edges.iter() {
                if source == changed || seen.contains(source) {
                    continue;
                }
                if references_name(names, &class_name) {
                    seen.insert(source);
                    result.push(source.clone());
                    queue.push_back(source_id_stem(source));
                }
            }
        }

        result
    }

    pub fn dependencies_of(&self, source_id: &Url) -> HashSet<String> {
        self.edges
            .read()
            .ok()
            .and_then(|edges| edges.get(source_id).cloned())
            .unwrap_or_default()
    }
}

/// A dependency edge matches when it names the class directly or, for edges
/// that kept a qualified form, when its simple name does. Star imports never
/// match by name.
fn references_name(names: &HashSet<String>, class_name: &str) -> bool {
    if names.contains(class_name) {
        return true;
    }
    names
        .iter()
        .any(|name| !name.ends_with(".*") && simple_name_of(name) == class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///src/{name}.groovy")).unwrap()
    }

    #[test]
    fn direct_dependency_is_affected() {
        let graph = DependencyGraph::new();
        graph.update(&uri("Consumer"), ["Utils".to_string()]);
        graph.update(&uri("Bystander"), ["Helper".to_string()]);

        let affected = graph.affected(&uri("Utils"));
        assert_eq!(affected, vec![uri("Consumer")]);
    }

    #[test]
    fn transitive_closure_without_duplicates() {
        let graph = DependencyGraph::new();
        // C -> B -> A, and D depends on both A and B.
        graph.update(&uri("B"), ["A".to_string()]);
        graph.update(&uri("C"), ["B".to_string()]);
        graph.update(&uri("D"), ["A".to_string(), "B".to_string()]);

        let affected = graph.affected(&uri("A"));
        let set: HashSet<_> = affected.iter().cloned().collect();
        assert_eq!(affected.len(), set.len(), "no duplicates");
        assert_eq!(set, HashSet::from([uri("B"), uri("C"), uri("D")]));
    }

    #[test]
    fn changed_source_is_never_in_its_own_result() {
        let graph = DependencyGraph::new();
        // Self-edge and a mutual cycle.
        graph.update(&uri("A"), ["A".to_string(), "B".to_string()]);
        graph.update(&uri("B"), ["A".to_string()]);

        let affected = graph.affected(&uri("A"));
        assert_eq!(affected, vec![uri("B")]);
    }

    #[test]
    fn qualified_edges_match_by_simple_name() {
        let graph = DependencyGraph::new();
        graph.update(&uri("Consumer"), ["com.example.Utils".to_string()]);

        assert_eq!(graph.affected(&uri("Utils")), vec![uri("Consumer")]);
    }

    #[test]
    fn star_imports_are_kept_verbatim_and_do_not_match_by_name() {
        let graph = DependencyGraph::new();
        graph.update(&uri("Consumer"), ["com.example.*".to_string()]);

        assert!(
            graph
                .dependencies_of(&uri("Consumer"))
                .contains("com.example.*")
        );
        // `example` is the star import's last segment but not a class match.
        assert!(graph.affected(&uri("example")).is_empty());
    }

    #[test]
    fn update_replaces_prior_edges() {
        let graph = DependencyGraph::new();
        graph.update(&uri("Consumer"), ["Utils".to_string()]);
        graph.update(&uri("Consumer"), ["Other".to_string()]);

        assert!(graph.affected(&uri("Utils")).is_empty());
        assert_eq!(graph.affected(&uri("Other")), vec![uri("Consumer")]);
    }

    #[test]
    fn remove_drops_source() {
        let graph = DependencyGraph::new();
        graph.update(&uri("Consumer"), ["Utils".to_string()]);
        graph.remove(&uri("Consumer"));

        assert!(graph.affected(&uri("Utils")).is_empty());
    }
}

use serde::{Deserialize, Serialize};

/// A stage of the Groovy compilation frontend.
///
/// Phases are totally ordered: a tree produced at phase `P` is valid for any
/// query requiring phase `Q <= P`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum CompilationPhase {
    Init,
    Parsing,
    Convert,
    #[default]
    Semantic,
    Canonical,
    Instruction,
    ClassGen,
    Output,
    Finalize,
}

impl CompilationPhase {
    /// Phases before `Convert` never produce a usable tree; requests for them
    /// are coerced upward.
    pub fn coerced_for_tree(self) -> Self {
        if self < CompilationPhase::Convert {
            CompilationPhase::Convert
        } else {
            self
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompilationPhase::Init => "init",
            CompilationPhase::Parsing => "parsing",
            CompilationPhase::Convert => "convert",
            CompilationPhase::Semantic => "semantic",
            CompilationPhase::Canonical => "canonical",
            CompilationPhase::Instruction => "instruction",
            CompilationPhase::ClassGen => "classGen",
            CompilationPhase::Output => "output",
            CompilationPhase::Finalize => "finalize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_totally_ordered() {
        assert!(CompilationPhase::Init < CompilationPhase::Parsing);
        assert!(CompilationPhase::Parsing < CompilationPhase::Convert);
        assert!(CompilationPhase::Convert < CompilationPhase::Semantic);
        assert!(CompilationPhase::Semantic < CompilationPhase::Canonical);
        assert!(CompilationPhase::Canonical < CompilationPhase::Instruction);
        assert!(CompilationPhase::Instruction < CompilationPhase::ClassGen);
        assert!(CompilationPhase::ClassGen < CompilationPhase::Output);
        assert!(CompilationPhase::Output < CompilationPhase::Finalize);
    }

    #[test]
    fn pre_tree_phases_coerce_to_convert() {
        assert_eq!(
            CompilationPhase::Init.coerced_for_tree(),
            CompilationPhase::Convert
        );
        assert_eq!(
            CompilationPhase::Parsing.coerced_for_tree(),
            CompilationPhase::Convert
        );
        assert_eq!(
            CompilationPhase::Convert.coerced_for_tree(),
            CompilationPhase::Convert
        );
        assert_eq!(
            CompilationPhase::Semantic.coerced_for_tree(),
            CompilationPhase::Semantic
        );
    }
}

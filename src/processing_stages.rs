//! `--stage`/`--format` registries for the CLI's debug-dump flags.
//!
//! The compiler proper never consults these; only `bin/shaderxc.rs`'s
//! `--stage`/`--format` combination does, to decide which intermediate
//! representation to dump and how to render it. Kept as a registry rather
//! than a fixed `match` so a new stage or format can be added in one place
//! without touching the CLI's argument-parsing code.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use once_cell::sync::Lazy;

/// One pipeline checkpoint the CLI can dump instead of running the full
/// compile (`spec.md` §2's stage list, minus the stages that don't produce
/// an independently inspectable value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stage {
    pub name: &'static str,
    pub description: &'static str,
    pub data_structure: &'static str,
}

/// A rendering of a dumped stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Format {
    pub name: &'static str,
    pub description: &'static str,
}

pub struct StageRegistry {
    stages: HashMap<&'static str, Stage>,
}

impl StageRegistry {
    fn new() -> Self {
        Self { stages: HashMap::new() }
    }

    pub fn register(&mut self, stage: Stage) {
        self.stages.insert(stage.name, stage);
    }

    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    pub fn list(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.values().collect();
        stages.sort_by_key(|s| s.name);
        stages
    }
}

pub struct FormatRegistry {
    formats: HashMap<&'static str, Format>,
}

impl FormatRegistry {
    fn new() -> Self {
        Self { formats: HashMap::new() }
    }

    pub fn register(&mut self, format: Format) {
        self.formats.insert(format.name, format);
    }

    pub fn get(&self, name: &str) -> Option<&Format> {
        self.formats.get(name)
    }

    pub fn list(&self) -> Vec<&Format> {
        let mut formats: Vec<&Format> = self.formats.values().collect();
        formats.sort_by_key(|f| f.name);
        formats
    }
}

/// Which formats a given stage's underlying data structure can be rendered
/// as; keyed by `Stage::data_structure` rather than `Stage::name` so stages
/// that share a representation (e.g. two token-stream checkpoints) share
/// their format list too.
pub struct ConversionFactory {
    conversions: HashMap<&'static str, HashSet<&'static str>>,
}

impl ConversionFactory {
    fn new() -> Self {
        Self { conversions: HashMap::new() }
    }

    pub fn register(&mut self, data_structure: &'static str, formats: Vec<&'static str>) {
        self.conversions.insert(data_structure, formats.into_iter().collect());
    }

    pub fn is_supported(&self, stage_name: &str, format_name: &str, stages: &StageRegistry) -> bool {
        if let Some(stage) = stages.get(stage_name) {
            if let Some(supported) = self.conversions.get(stage.data_structure) {
                return supported.contains(format_name);
            }
        }
        false
    }
}

pub static STAGE_REGISTRY: Lazy<Mutex<StageRegistry>> = Lazy::new(|| Mutex::new(StageRegistry::new()));
pub static FORMAT_REGISTRY: Lazy<Mutex<FormatRegistry>> = Lazy::new(|| Mutex::new(FormatRegistry::new()));
pub static CONVERSION_FACTORY: Lazy<Mutex<ConversionFactory>> =
    Lazy::new(|| Mutex::new(ConversionFactory::new()));

/// Populates the three registries. Called once from `bin/shaderxc.rs` and
/// `bin/shaderxc-ast.rs` before either consults `--stage`/`--format`.
pub fn initialize_registries() {
    let mut stages = STAGE_REGISTRY.lock().unwrap();
    let mut formats = FORMAT_REGISTRY.lock().unwrap();
    let mut conversions = CONVERSION_FACTORY.lock().unwrap();

    stages.register(Stage {
        name: "tokens",
        description: "Raw lexer output, before preprocessing",
        data_structure: "token-stream",
    });
    stages.register(Stage {
        name: "preprocessed",
        description: "Token stream after directive/macro expansion",
        data_structure: "token-stream",
    });
    stages.register(Stage {
        name: "ast",
        description: "Parsed, pre-analysis AST",
        data_structure: "ast",
    });
    stages.register(Stage {
        name: "analyzed-ast",
        description: "AST decorated by semantic analysis and transforms",
        data_structure: "ast",
    });
    stages.register(Stage {
        name: "reflection",
        description: "Extracted bindings and entry-point layout",
        data_structure: "reflection",
    });

    formats.register(Format {
        name: "json",
        description: "Machine-readable JSON dump",
    });
    formats.register(Format {
        name: "pretty",
        description: "Indented, human-readable text dump",
    });

    conversions.register("token-stream", vec!["json", "pretty"]);
    conversions.register("ast", vec!["json", "pretty"]);
    conversions.register("reflection", vec!["json", "pretty"]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_populate_and_support_lookups() {
        initialize_registries();
        let stages = STAGE_REGISTRY.lock().unwrap();
        let formats = FORMAT_REGISTRY.lock().unwrap();
        let conversions = CONVERSION_FACTORY.lock().unwrap();

        assert!(stages.get("ast").is_some());
        assert!(formats.get("json").is_some());
        assert!(conversions.is_supported("ast", "json", &stages));
        assert!(!conversions.is_supported("ast", "nonexistent-format", &stages));
    }
}

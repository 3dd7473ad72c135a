use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which shape gene-symbol nodes have in the target database.
///
/// Two deployments disagree on this, so both are supported. Every query
/// fragment returned here is a fixed string; nothing user-supplied ever
/// lands in Cypher text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneSchema {
    /// `(:GeneSymbol {sid})`
    #[default]
    GeneSymbol,
    /// `(:Gene {type: 'symbol', sid})`
    TypedGene,
}

impl GeneSchema {
    /// Node pattern binding the gene symbol to `gs`.
    pub fn node_pattern(self) -> &'static str {
        match self {
            GeneSchema::GeneSymbol => "(gs:GeneSymbol)",
            GeneSchema::TypedGene => "(gs:Gene {type: 'symbol'})",
        }
    }

    /// Analyzer the index is built with unless overridden.
    pub fn default_analyzer(self) -> &'static str {
        match self {
            GeneSchema::GeneSymbol => "german",
            GeneSchema::TypedGene => "synonym",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeneSchema::GeneSymbol => "gene-symbol",
            GeneSchema::TypedGene => "typed-gene",
        }
    }
}

impl fmt::Display for GeneSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneSchema {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gene-symbol" | "genesymbol" | "gene_symbol" => Ok(GeneSchema::GeneSymbol),
            "typed-gene" | "gene" | "typed_gene" => Ok(GeneSchema::TypedGene),
            _ => Err(ConfigError::UnknownSchema(s.to_string())),
        }
    }
}

/// Exclusion tags applied to gene symbols before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagRule {
    SpecialChar,
    Length,
    CommonWord,
}

impl TagRule {
    pub const ALL: [TagRule; 3] = [TagRule::SpecialChar, TagRule::Length, TagRule::CommonWord];

    pub fn label(self) -> &'static str {
        match self {
            TagRule::SpecialChar => "OmitSpecialChar",
            TagRule::Length => "OmitLength",
            TagRule::CommonWord => "OmitWord",
        }
    }

    /// `WHERE` fragment selecting symbols bound to `gs` that carry none of the tags.
    pub fn untagged_predicate() -> String {
        Self::ALL
            .iter()
            .map(|rule| format!("NOT gs:{}", rule.label()))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl fmt::Display for TagRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

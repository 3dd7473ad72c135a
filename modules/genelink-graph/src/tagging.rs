use genelink_common::{Config, GeneSchema, TagRule};
use neo4rs::{query, Graph, Query};
use tracing::info;

use crate::error::LinkError;

/// Cypher for one tagging rule. Idempotent: re-adding a label is a no-op,
/// so the count returned is the same on every run over unchanged data.
pub fn tag_cypher(rule: TagRule, schema: GeneSchema) -> String {
    let pattern = schema.node_pattern();
    let label = rule.label();
    match rule {
        TagRule::SpecialChar => format!(
            "MATCH {pattern}
             WHERE any(c IN $chars WHERE gs.sid CONTAINS c)
             SET gs:{label}
             RETURN count(DISTINCT gs) AS tagged"
        ),
        TagRule::Length => format!(
            "MATCH {pattern}
             WHERE size(gs.sid) < $min_length
             SET gs:{label}
             RETURN count(DISTINCT gs) AS tagged"
        ),
        TagRule::CommonWord => format!(
            "MATCH (w:Word) WHERE w.match11 = true
             WITH collect(DISTINCT toLower(w.value)) AS words
             MATCH {pattern}
             WHERE toLower(gs.sid) IN words
             SET gs:{label}
             RETURN count(DISTINCT gs) AS tagged"
        ),
    }
}

fn tag_query(rule: TagRule, config: &Config) -> Query {
    let q = query(&tag_cypher(rule, config.schema));
    match rule {
        TagRule::SpecialChar => q.param("chars", config.special_chars.clone()),
        TagRule::Length => q.param("min_length", config.min_symbol_length),
        TagRule::CommonWord => q,
    }
}

pub async fn tag(g: &Graph, rule: TagRule, config: &Config) -> Result<i64, LinkError> {
    match rule {
        TagRule::SpecialChar => info!("Tagging gene symbols with special characters"),
        TagRule::Length => info!(
            min_length = config.min_symbol_length,
            "Tagging gene symbols that are too short"
        ),
        TagRule::CommonWord => info!("Tagging gene symbols that are common words"),
    }

    let mut stream = g.execute(tag_query(rule, config)).await?;
    let tagged = match stream.next().await? {
        Some(row) => row.get::<i64>("tagged")?,
        None => 0,
    };

    info!(label = rule.label(), tagged, "Tagging complete");
    Ok(tagged)
}

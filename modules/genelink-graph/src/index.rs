use neo4rs::{query, Graph, Query};
use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::poller::IndexStatus;
use crate::store::IndexCreation;

pub const FRAGMENT_LABEL: &str = "Fragment";
pub const FRAGMENT_TEXT_PROPERTY: &str = "text";

/// Names of the full-text analyzers the server can build indexes with.
pub async fn list_analyzers(g: &Graph) -> Result<Vec<String>, LinkError> {
    info!("Listing available full-text analyzers");

    let q = query("CALL db.index.fulltext.listAvailableAnalyzers() YIELD analyzer RETURN analyzer");
    let mut stream = g.execute(q).await?;

    let mut analyzers = Vec::new();
    while let Some(row) = stream.next().await? {
        analyzers.push(row.get::<String>("analyzer")?);
    }
    debug!(count = analyzers.len(), ?analyzers, "Analyzers available");
    Ok(analyzers)
}

const CREATE_INDEX: &str =
    "CALL db.index.fulltext.createNodeIndex($name, $labels, $properties, {analyzer: $analyzer})";

fn create_index_query(name: &str, analyzer: &str) -> Query {
    query(CREATE_INDEX)
        .param("name", name)
        .param("labels", vec![FRAGMENT_LABEL.to_string()])
        .param("properties", vec![FRAGMENT_TEXT_PROPERTY.to_string()])
        .param("analyzer", analyzer)
}

/// Create the fragment full-text index. An index that already exists is
/// left alone; if it was built with a different analyzer that only shows
/// up later as poor matches.
pub async fn create_fulltext_index(
    g: &Graph,
    name: &str,
    analyzer: &str,
) -> Result<IndexCreation, LinkError> {
    info!(index = name, analyzer, "Creating full-text index");
    match g.run(create_index_query(name, analyzer)).await {
        Ok(()) => Ok(IndexCreation::Created),
        Err(e) if is_already_exists(&e) => {
            warn!(index = name, error = %e, "Index create failed, it likely exists already");
            Ok(IndexCreation::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// One row per index, whatever its type.
pub async fn list_indexes(g: &Graph) -> Result<Vec<IndexStatus>, LinkError> {
    let q = query(
        "CALL db.indexes() YIELD name, state, populationPercent
         RETURN name, state, populationPercent",
    );
    let mut stream = g.execute(q).await?;

    let mut rows = Vec::new();
    while let Some(row) = stream.next().await? {
        rows.push(IndexStatus {
            name: row.get("name")?,
            state: row.get("state")?,
            population_percent: row.get("populationPercent")?,
        });
    }
    Ok(rows)
}

fn is_already_exists(e: &neo4rs::Error) -> bool {
    is_already_exists_message(&e.to_string())
}

fn is_already_exists_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("already exists") || msg.contains("equivalent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_index_takes_everything_as_parameters() {
        for param in ["$name", "$labels", "$properties", "$analyzer"] {
            assert!(CREATE_INDEX.contains(param), "missing {param}");
        }
        assert!(!CREATE_INDEX.contains(FRAGMENT_LABEL));
    }

    #[test]
    fn existing_index_messages_are_recognised() {
        assert!(is_already_exists_message(
            "There already exists an index called 'fragmentGeneSymbol'."
        ));
        assert!(is_already_exists_message(
            "An equivalent index already exists, 'Index( id=3, name='fragmentGeneSymbol' )'."
        ));
        assert!(is_already_exists_message("ALREADY EXISTS"));
    }

    #[test]
    fn other_errors_are_not_swallowed() {
        assert!(!is_already_exists_message(
            "There is no such fulltext analyzer: 'klingon'"
        ));
        assert!(!is_already_exists_message(
            "There is no procedure with the name `db.index.fulltext.createNodeIndex` registered"
        ));

        let unrelated = neo4rs::Error::UnexpectedMessage("connection reset by peer".into());
        assert!(!is_already_exists(&unrelated));
    }
}

//! Smoke test: connect to Neo4j via bolt:// and list analyzers.
//! Run with: cargo test -p genelink-graph --test cloud_connect -- --ignored

use genelink_common::Neo4jConnection;
use genelink_graph::{query, GraphClient, LinkStore};

#[tokio::test]
#[ignore] // requires live Neo4j credentials
async fn cloud_connect() {
    let conn = Neo4jConnection::from_lookup(&|key: &str| std::env::var(key).ok())
        .expect("Invalid connection env");

    let client = GraphClient::connect_with(&conn)
        .await
        .expect("Failed to connect");

    let mut result = client
        .inner()
        .execute(query("RETURN 1 AS ping"))
        .await
        .unwrap();
    let row = result.next().await.unwrap().expect("No result row");
    let ping: i64 = row.get("ping").unwrap();
    assert_eq!(ping, 1);

    let analyzers = client.list_analyzers().await.unwrap();
    assert!(!analyzers.is_empty());
}

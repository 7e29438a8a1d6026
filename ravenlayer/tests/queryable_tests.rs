use pretty_assertions::assert_eq;
use ravenlayer::{memory::InMemoryTransport, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    company: String,
    freight: f64,
}

async fn orders() -> Loaded {
    let transport = InMemoryTransport::new();

    for (id, company, freight, shipped) in [
        ("orders/1", "companies/85", 32.38, true),
        ("orders/2", "companies/79", 11.61, false),
        ("orders/3", "companies/34", 65.83, true),
        ("orders/4", "companies/84", 41.34, true),
    ] {
        transport
            .put(
                "Northwind",
                id,
                json!({ "Company": company, "Freight": freight, "Shipped": shipped }),
            )
            .await
            .unwrap();
    }
    transport
        .put("Northwind", "orders/5", json!({ "Company": "companies/76" }))
        .await
        .unwrap();

    DocumentStore::new(transport, ConnectionInfo::new("localhost", 8080, "Northwind"))
        .open_session()
        .load(["orders/1", "orders/2", "orders/3", "orders/4", "orders/5"])
        .await
        .unwrap()
}

fn shipped(document: &Document) -> bool {
    document.get("Shipped") == Some(json!(true))
}

#[tokio::test]
async fn results_can_be_filtered_and_counted() {
    let results = orders().await.results;

    assert_eq!(results.count(), 5);
    assert_eq!(results.count_where(shipped), 3);
    assert_eq!(results.filter(shipped).ids(), vec!["orders/1", "orders/3", "orders/4"]);
    assert!(results.any(shipped));
    assert!(!results.all(shipped));
    assert!(results.exists(|d| d.id() == "orders/5"));
    assert!(!results.empty());
}

#[tokio::test]
async fn results_order_by_field_with_missing_values_first() {
    let results = orders().await.results;

    assert_eq!(
        results.order_by("Freight").ids(),
        vec!["orders/5", "orders/2", "orders/1", "orders/4", "orders/3"]
    );
    assert_eq!(results.order_by("Freight").last().unwrap().id(), "orders/3");
}

#[tokio::test]
async fn results_project_fields() {
    let results = orders().await.results;

    assert_eq!(
        results.filter(|d| !shipped(d)).select_field("Freight").into_vec(),
        vec![json!(11.61), Value::Null]
    );
    assert_eq!(
        results.first().unwrap().to_entity::<Order>().unwrap(),
        Order {
            company: "companies/85".to_string(),
            freight: 32.38,
        }
    );
}

#[tokio::test]
async fn positional_queries() {
    let results = orders().await.results;

    assert_eq!(results.element_at(1).unwrap().id(), "orders/2");
    assert!(results.element_at(5).is_none());
    assert_eq!(results.first_where(|d| !shipped(d)).unwrap().id(), "orders/2");
    assert_eq!(results.last_where(shipped).unwrap().id(), "orders/4");

    let picked = results.random_where(shipped).unwrap();
    assert!(shipped(picked));
}

#[tokio::test]
async fn single_rejects_ambiguous_matches() {
    let results = orders().await.results;

    assert_eq!(
        results.single(|d| d.id() == "orders/3").unwrap().unwrap().id(),
        "orders/3"
    );
    assert_eq!(results.single(|d| d.id() == "orders/9").unwrap(), None);
    assert_eq!(results.single(shipped), Err(ClientError::MultipleResults));
}

#[tokio::test]
async fn empty_includes_answer_conservatively() {
    let includes = orders().await.includes;

    assert!(includes.empty());
    assert!(includes.all(shipped));
    assert!(!includes.any(shipped));
    assert!(includes.first().is_none());
    assert!(includes.random().is_none());
    assert_eq!(includes.single(shipped), Ok(None));
}

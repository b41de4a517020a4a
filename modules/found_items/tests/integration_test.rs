use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use db::{ConnectOpts, DbHandle};
use found_items::{
    api::odata::handlers::ODataSettings,
    contract::model::{
        FoundItemPatch, ItemInput, ItemStatus, ListFilters, MunicipalityInfo, NewFoundItem,
        PickupInfo,
    },
    domain::{
        error::DomainError,
        service::{Service, ServiceConfig},
    },
    infra::storage::{fields, migrations, sqlx_repo::SqlxFoundItemsRepository},
};
use odata_core::{ODataPaging, PageLimits, RestPaging};

const CONTEXT_URL: &str = "https://api.zguba.gov/odata/$metadata";

/// Create a fresh test database for each test
async fn create_test_db() -> DbHandle {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");

    migrations::run(&db)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create a test domain service
async fn create_test_service() -> Arc<Service> {
    create_test_service_on(create_test_db().await)
}

fn create_test_service_on(db: DbHandle) -> Arc<Service> {
    let repo = SqlxFoundItemsRepository::new(db);
    Arc::new(Service::new(
        Arc::new(repo),
        fields::allow_lists(),
        ServiceConfig::default(),
    ))
}

fn router_for(service: Arc<Service>) -> Router {
    let router = found_items::api::rest::routes::register_routes(Router::new(), service.clone())
        .expect("Failed to register REST routes");
    found_items::api::odata::register_routes(
        router,
        service,
        ODataSettings {
            context_url: CONTEXT_URL.to_owned(),
        },
    )
    .expect("Failed to register OData routes")
}

fn new_item(municipality: &str, name: &str, category: &str) -> NewFoundItem {
    NewFoundItem {
        municipality: MunicipalityInfo {
            name: municipality.into(),
            kind: "city".into(),
            contact_email: "rzeczy@example.gov.pl".into(),
        },
        item: ItemInput {
            name: name.into(),
            category: category.into(),
            date: "2025-05-01".into(),
            location: "Central station".into(),
            status: None,
            description: Some(format!("{name} left on a bench")),
        },
        pickup: PickupInfo {
            deadline_days: 30,
            location: "Town hall, room 4".into(),
            hours: Some("8:00-15:00".into()),
            contact: None,
        },
        categories: vec![category.into()],
    }
}

fn create_body(municipality: &str, name: &str, category: &str) -> Value {
    json!({
        "municipality": { "name": municipality, "type": "city", "contactEmail": "biuro@example.gov.pl" },
        "item": {
            "name": name,
            "category": category,
            "date": "2025-06-12",
            "location": "Bus 175",
            "description": "found under a seat"
        },
        "pickup": { "deadline": 90, "location": "ul. Długa 1", "hours": "9-17" },
        "categories": [category, "public-transport"]
    })
}

/// `'` and spaces must be percent-encoded in a request URI.
fn odata_uri(query: &str) -> String {
    format!(
        "/odata/FoundItems?{}",
        query.replace(' ', "%20").replace('\'', "%27")
    )
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn put_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_domain_service_crud() -> Result<()> {
    let service = create_test_service().await;

    let created = service
        .create_item(new_item("Wrocław", "Black umbrella", "other"))
        .await?;
    assert_eq!(created.item.status, ItemStatus::Available);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = service.get_item(&created.id).await?;
    assert_eq!(fetched, created);

    let updated = service
        .update_item(
            &created.id,
            FoundItemPatch {
                item: Some(ItemInput {
                    status: Some("claimed".into()),
                    ..new_item("Wrocław", "Black umbrella", "other").item
                }),
                categories: Some(vec!["rain".into()]),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.item.status, ItemStatus::Claimed);
    assert_eq!(updated.categories, vec!["rain"]);
    assert_eq!(updated.municipality, created.municipality);
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(service.get_item(&created.id).await?, updated);

    service.delete_item(&created.id).await?;
    assert!(matches!(
        service.get_item(&created.id).await,
        Err(DomainError::ItemNotFound { .. })
    ));
    assert!(matches!(
        service.delete_item(&created.id).await,
        Err(DomainError::ItemNotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_update_without_status_keeps_current() -> Result<()> {
    let service = create_test_service().await;
    let mut input = new_item("Gdynia", "Scarf", "clothing");
    input.item.status = Some("expired".into());
    let created = service.create_item(input).await?;

    let updated = service
        .update_item(
            &created.id,
            FoundItemPatch {
                item: Some(ItemInput {
                    name: "Red scarf".into(),
                    ..new_item("Gdynia", "Scarf", "clothing").item
                }),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.item.name, "Red scarf");
    assert_eq!(updated.item.status, ItemStatus::Expired);

    let unchanged = service
        .update_item(&created.id, FoundItemPatch::default())
        .await?;
    assert_eq!(unchanged, updated);
    Ok(())
}

#[tokio::test]
async fn test_validation_rejects_before_store() -> Result<()> {
    let service = create_test_service().await;

    let mut bad = new_item("Opole", "Phone", "electronics");
    bad.item.status = Some("stolen".into());
    let err = service.create_item(bad).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "item.status"));

    let mut bad = new_item("Opole", "Phone", "electronics");
    bad.municipality.contact_email = "nobody".into();
    assert!(service.create_item(bad).await.is_err());

    let listed = service
        .list_items(ListFilters::default(), RestPaging::default())
        .await?;
    assert!(listed.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_service_list_filters() -> Result<()> {
    let service = create_test_service().await;
    service
        .create_item(new_item("Kraków", "Laptop Dell", "electronics"))
        .await?;
    service
        .create_item(new_item("Krakowiany", "House keys", "keys"))
        .await?;
    service
        .create_item(new_item("Gdańsk", "Car keys", "keys"))
        .await?;

    let by_category = service
        .list_items(
            ListFilters {
                category: Some("keys".into()),
                ..Default::default()
            },
            RestPaging::default(),
        )
        .await?;
    assert_eq!(by_category.len(), 2);

    let by_municipality = service
        .list_items(
            ListFilters {
                municipality: Some("KRAK".into()),
                ..Default::default()
            },
            RestPaging::default(),
        )
        .await?;
    assert_eq!(by_municipality.len(), 2);

    let by_search = service
        .list_items(
            ListFilters {
                search: Some("dell".into()),
                ..Default::default()
            },
            RestPaging::default(),
        )
        .await?;
    assert_eq!(by_search.len(), 1);
    assert_eq!(by_search[0].item.name, "Laptop Dell");

    let paged = service
        .list_items(
            ListFilters::default(),
            RestPaging::parse(Some("1"), Some("1"), PageLimits::default()),
        )
        .await?;
    assert_eq!(paged.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_service_odata_query_and_count() -> Result<()> {
    let service = create_test_service().await;
    for i in 0..5 {
        service
            .create_item(new_item("Lublin", &format!("Key ring {i}"), "keys"))
            .await?;
    }
    service
        .create_item(new_item("Lublin", "Laptop", "electronics"))
        .await?;

    let page = service
        .query_items(
            "item_category eq 'keys'",
            "item_name asc",
            ODataPaging::parse(Some("1"), Some("2"), Some("true"), PageLimits::default()),
        )
        .await?;
    assert_eq!(page.count, Some(5));
    let names: Vec<_> = page.items.iter().map(|i| i.item.name.as_str()).collect();
    assert_eq!(names, ["Key ring 1", "Key ring 2"]);

    let err = service
        .query_items("municipality_email eq 'x'", "", ODataPaging::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Query(odata_core::Error::InvalidFilterField(ref f)) if f == "municipality_email"
    ));
    Ok(())
}

#[tokio::test]
async fn test_rest_crud_round_trip() -> Result<()> {
    let router = router_for(create_test_service().await);

    let (status, created) = post_json(
        &router,
        "/api/found-items",
        &create_body("Szczecin", "Blue backpack", "bags"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["item"]["status"], "available");
    assert_eq!(created["municipality"]["type"], "city");
    assert_eq!(created["pickup"]["deadline"], 90);
    assert_eq!(created["categories"], json!(["bags", "public-transport"]));
    assert!(created["pickup"].get("contact").is_none());
    let id = created["id"].as_str().unwrap().to_owned();

    let (status, fetched) = get(&router, &format!("/api/found-items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = put_json(
        &router,
        &format!("/api/found-items/{id}"),
        &json!({ "pickup": { "deadline": 14, "location": "ul. Krótka 2" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["pickup"]["deadline"], 14);
    assert!(updated["pickup"].get("hours").is_none());
    assert_eq!(updated["item"], created["item"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let (status, listed) = get(&router, "/api/found-items?limit=0&skip=-3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/found-items/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, problem) = get(&router, &format!("/api/found-items/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["code"], "FOUND_ITEMS_NOT_FOUND");
    assert_eq!(problem["instance"], format!("/api/found-items/{id}"));
    Ok(())
}

#[tokio::test]
async fn test_rest_validation_problem() {
    let router = router_for(create_test_service().await);
    let mut body = create_body("Toruń", "Gloves", "clothing");
    body["item"]["status"] = json!("lost");

    let (status, problem) = post_json(&router, "/api/found-items", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "FOUND_ITEMS_VALIDATION");
    assert_eq!(problem["errors"][0]["pointer"], "/item/status");

    let (status, _) = put_json(&router, "/api/found-items/missing", &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rest_categories_and_stats() {
    let router = router_for(create_test_service().await);
    for (m, name, cat) in [
        ("Kraków", "Wallet", "wallets"),
        ("Kraków", "Purse", "wallets"),
        ("Kielce", "Phone", "electronics"),
    ] {
        let (status, _) = post_json(&router, "/api/found-items", &create_body(m, name, cat)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, cats) = get(&router, "/api/found-items/categories/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        cats,
        json!([
            { "value": "electronics", "label": "Electronics" },
            { "value": "wallets", "label": "Wallets" }
        ])
    );

    let (status, stats) = get(&router, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats["foundItems"],
        json!({ "total": 3, "available": 3, "claimed": 0 })
    );
    assert_eq!(
        stats["topCategories"][0],
        json!({ "category": "wallets", "count": 2 })
    );
    assert_eq!(
        stats["topMunicipalities"][0],
        json!({ "name": "Kraków", "count": 2 })
    );
}

#[tokio::test]
async fn test_odata_round_trip_and_count() {
    let router = router_for(create_test_service().await);
    for (name, cat) in [
        ("Laptop Lenovo", "electronics"),
        ("Lamp", "home"),
        ("Keys", "keys"),
    ] {
        post_json(&router, "/api/found-items", &create_body("Bydgoszcz", name, cat)).await;
    }

    let (status, body) = get(
        &router,
        &odata_uri("$filter=startswith(item_name,'La')&$orderby=item_name desc&$count=true&$top=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["odata.context"], CONTEXT_URL);
    assert_eq!(body["odata.count"], 2);
    let value = body["value"].as_array().unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value[0]["item_name"], "Laptop Lenovo");
    assert_eq!(value[0]["municipality_name"], "Bydgoszcz");
    assert_eq!(value[0]["pickup_contact"], "");
    assert_eq!(value[0]["pickup_deadline"], 90);

    let (_, body) = get(
        &router,
        &odata_uri("$filter=contains(item_name,'top') and item_category eq 'home'"),
    )
    .await;
    assert_eq!(body["value"], json!([]));
    assert!(body.get("odata.count").is_none());
}

#[tokio::test]
async fn test_odata_top_is_clamped() -> Result<()> {
    let service = create_test_service().await;
    for i in 0..105 {
        service
            .create_item(new_item("Radom", &format!("Pen {i:03}"), "stationery"))
            .await?;
    }
    let router = router_for(service);

    let (_, body) = get(&router, "/odata/FoundItems?$top=500&$count=true").await;
    assert_eq!(body["value"].as_array().map(Vec::len), Some(100));
    assert_eq!(body["odata.count"], 105);

    let (_, body) = get(&router, "/odata/FoundItems?$top=0").await;
    assert_eq!(body["value"].as_array().map(Vec::len), Some(50));

    let (_, body) = get(&router, "/odata/FoundItems?$skip=100&$top=abc").await;
    assert_eq!(body["value"].as_array().map(Vec::len), Some(5));
    Ok(())
}

#[tokio::test]
async fn test_odata_rejects_unknown_field() {
    let router = router_for(create_test_service().await);

    let (status, problem) = get(&router, &odata_uri("$filter=pickup_contact eq 'x'")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "ODATA_FILTER_FIELD_INVALID");
    assert!(problem["detail"].as_str().unwrap().contains("pickup_contact"));

    let (status, problem) = get(
        &router,
        &odata_uri("$filter=item_status eq 'available' or item_status eq 'claimed'"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["code"], "ODATA_FILTER_INVALID");
}

#[tokio::test]
async fn test_odata_metadata_document() {
    let router = router_for(create_test_service().await);
    let resp = router
        .oneshot(
            Request::builder()
                .uri("/odata/$metadata")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let xml = String::from_utf8(body.to_vec()).unwrap();
    assert!(xml.contains(r#"<EntityType Name="FoundItem">"#));
}

/// Rows written by other tools, bypassing validation.
async fn insert_raw(db: &DbHandle, id: &str, name: &str, status: &str) {
    sqlx::query(
        "INSERT INTO found_items (id, municipality_name, municipality_type, municipality_email, \
         item_name, item_category, item_date, item_location, item_status, pickup_deadline, pickup_location) \
         VALUES (?, 'Opole', 'city', 'biuro@example.gov.pl', ?, 'other', '2025-04-01', 'Park', ?, 14, 'Town hall')",
    )
    .bind(id)
    .bind(name)
    .bind(status)
    .execute(db.sqlx_sqlite())
    .await
    .expect("Failed to insert raw row");
}

#[tokio::test]
async fn test_unknown_stored_status_is_listed() {
    let db = create_test_db().await;
    insert_raw(&db, "a", "Scarf", "available").await;
    insert_raw(&db, "b", "Helmet", "returned").await;
    let router = router_for(create_test_service_on(db));

    let (status, body) = get(&router, "/odata/FoundItems?$orderby=item_name").await;
    assert_eq!(status, StatusCode::OK);
    let value = body["value"].as_array().unwrap();
    assert_eq!(value.len(), 2);
    assert_eq!(value[0]["item_name"], "Helmet");
    assert_eq!(value[0]["item_status"], "returned");

    let (status, body) = get(&router, &odata_uri("$filter=item_status eq 'returned'")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"][0]["id"], "b");

    let (status, body) = get(&router, "/api/found-items").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    let helmet = items.iter().find(|i| i["id"] == "b").unwrap();
    assert_eq!(helmet["item"]["status"], "returned");

    let (status, body) = get(&router, "/api/found-items/b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["name"], "Helmet");
}

#[tokio::test]
async fn test_odata_repeated_option_keeps_filter() {
    let router = router_for(create_test_service().await);
    for name in ["Wallet", "Phone", "Keys"] {
        let (status, _) = post_json(
            &router,
            "/api/found-items",
            &create_body("Lublin", name, "other"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get(
        &router,
        &odata_uri("$top=1&$top=2&$filter=item_name eq 'nope'&$count=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!([]));
    assert_eq!(body["odata.count"], 0);

    let (_, body) = get(&router, "/odata/FoundItems?$top=1&$top=2").await;
    assert_eq!(body["value"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_store_failure_reports_driver_message() {
    let db = create_test_db().await;
    sqlx::query("DROP TABLE found_items")
        .execute(db.sqlx_sqlite())
        .await
        .expect("Failed to drop table");
    let router = router_for(create_test_service_on(db));

    for uri in ["/api/found-items", "/odata/FoundItems"] {
        let (status, problem) = get(&router, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(problem["code"], "FOUND_ITEMS_QUERY_FAILED");
        let detail = problem["detail"].as_str().unwrap();
        assert!(detail.contains("no such table"), "{detail}");
        assert!(!detail.contains("SELECT"), "{detail}");
    }
}

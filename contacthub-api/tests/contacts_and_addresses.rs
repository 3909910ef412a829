/// Integration tests for contacts and addresses
///
/// Ownership rules, cascading deletes and field validation.

mod common;

use axum::http::StatusCode;
use common::{address_body, contact_body, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_contact() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;

    let (status, body) = ctx
        .post(
            "/api/contacts",
            Some(&ada.access_token),
            contact_body("Charles", "Babbage"),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["first_name"], "Charles");
    assert_eq!(body["user_id"], ada.id.as_str());
    assert_eq!(body["email"], "charles@example.com");
}

#[tokio::test]
async fn test_contacts_require_token() {
    let ctx = TestContext::new();

    let (status, _) = ctx.get("/api/contacts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post("/api/contacts", None, contact_body("Charles", "Babbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_contact_validation() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;

    let (status, body) = ctx
        .post(
            "/api/contacts",
            Some(&ada.access_token),
            json!({
                "first_name": "Charles",
                "last_name": "Babbage",
                "phone_number": "call me maybe",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "phone_number");
}

#[tokio::test]
async fn test_contact_email_is_optional() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;

    let (status, body) = ctx
        .post(
            "/api/contacts",
            Some(&ada.access_token),
            json!({
                "first_name": "Charles",
                "last_name": "Babbage",
                "phone_number": "555-0100",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn test_list_contacts_sorted_and_scoped() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let bob = ctx.signed_in_user("bob").await;

    for (first, last) in [("Mary", "Somerville"), ("Charles", "Babbage"), ("Augustus", "De Morgan")] {
        ctx.post("/api/contacts", Some(&ada.access_token), contact_body(first, last))
            .await;
    }
    ctx.create_contact(&bob, "Someone").await;

    let (status, body) = ctx.get("/api/contacts", Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["last_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Babbage", "De Morgan", "Somerville"]);

    let (_, body) = ctx.get("/api/contacts", Some(&bob.access_token)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_update_delete_contact() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let id = ctx.create_contact(&ada, "Charles").await;
    let uri = format!("/api/contacts/{}", id);

    let (status, body) = ctx.get(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, body) = ctx
        .put(&uri, Some(&ada.access_token), contact_body("Chas", "Babbage"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Chas");

    let (status, _) = ctx.delete(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_contact_is_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let uri = format!("/api/contacts/{}", Uuid::new_v4());

    let (status, _) = ctx.get(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .put(&uri, Some(&ada.access_token), contact_body("Charles", "Babbage"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_contact_is_unauthorized() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let bob = ctx.signed_in_user("bob").await;
    let id = ctx.create_contact(&ada, "Charles").await;
    let uri = format!("/api/contacts/{}", id);

    let (status, _) = ctx.get(&uri, Some(&bob.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .put(&uri, Some(&bob.access_token), contact_body("Mallory", "X"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.delete(&uri, Some(&bob.access_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Untouched
    let (_, body) = ctx.get(&uri, Some(&ada.access_token)).await;
    assert_eq!(body["first_name"], "Charles");
}

#[tokio::test]
async fn test_create_and_list_addresses() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;

    let (status, body) = ctx
        .post(
            "/api/addresses",
            Some(&ada.access_token),
            address_body(&contact_id, "work"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["address_type"], "work");
    assert_eq!(body["contact_id"], contact_id.as_str());

    ctx.create_address(&ada, &contact_id).await;

    let (status, body) = ctx
        .get(
            &format!("/api/contacts/{}/addresses", contact_id),
            Some(&ada.access_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_address_validation() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;

    let (status, body) = ctx
        .post(
            "/api/addresses",
            Some(&ada.access_token),
            address_body(&contact_id, "holiday"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "address_type");

    let mut missing_contact = address_body(&contact_id, "home");
    missing_contact.as_object_mut().unwrap().remove("contact_id");
    let (status, body) = ctx
        .post("/api/addresses", Some(&ada.access_token), missing_contact)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "contact_id");

    let (status, _) = ctx
        .post(
            "/api/addresses",
            Some(&ada.access_token),
            address_body(&Uuid::new_v4().to_string(), "home"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_address() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;
    let id = ctx.create_address(&ada, &contact_id).await;
    let uri = format!("/api/addresses/{}", id);

    let mut update = address_body(&contact_id, "billing");
    update["city"] = json!("Cambridge");
    let (status, body) = ctx.put(&uri, Some(&ada.access_token), update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["address_type"], "billing");
    assert_eq!(body["city"], "Cambridge");

    let (status, _) = ctx.delete(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get(&uri, Some(&ada.access_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_address_cannot_move_between_contacts() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let first = ctx.create_contact(&ada, "Charles").await;
    let second = ctx.create_contact(&ada, "Mary").await;
    let id = ctx.create_address(&ada, &first).await;

    let (status, body) = ctx
        .put(
            &format!("/api/addresses/{}", id),
            Some(&ada.access_token),
            address_body(&second, "home"),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "contact_id");
}

#[tokio::test]
async fn test_other_users_address_is_unauthorized() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let bob = ctx.signed_in_user("bob").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;
    let id = ctx.create_address(&ada, &contact_id).await;

    let (status, _) = ctx
        .get(&format!("/api/addresses/{}", id), Some(&bob.access_token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .get(
            &format!("/api/contacts/{}/addresses", contact_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post(
            "/api/addresses",
            Some(&bob.access_token),
            address_body(&contact_id, "home"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .delete(&format!("/api/addresses/{}", id), Some(&bob.access_token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleting_contact_removes_addresses() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;
    let id = ctx.create_address(&ada, &contact_id).await;
    ctx.create_address(&ada, &contact_id).await;
    assert_eq!(ctx.store.address_count().await, 2);

    let (status, _) = ctx
        .delete(&format!("/api/contacts/{}", contact_id), Some(&ada.access_token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ctx.store.address_count().await, 0);

    let (status, _) = ctx
        .get(&format!("/api/addresses/{}", id), Some(&ada.access_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_user_removes_contacts() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;
    let contact_id = ctx.create_contact(&ada, "Charles").await;
    ctx.create_address(&ada, &contact_id).await;

    let (status, _) = ctx
        .delete(&format!("/api/users/{}", ada.id), Some(&ada.access_token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ctx.store.address_count().await, 0);

    let (status, _) = ctx
        .get(&format!("/api/contacts/{}", contact_id), Some(&ada.access_token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_and_oversized_fields_rejected() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in_user("ada").await;

    let (status, body) = ctx
        .post(
            "/api/contacts",
            Some(&ada.access_token),
            contact_body("   ", "Babbage"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "first_name");

    let mut padded_phone = contact_body("Charles", "Babbage");
    padded_phone["phone_number"] = json!(format!("+1 (555) 010-9999{}0", " ".repeat(20)));
    let (status, body) = ctx
        .post("/api/contacts", Some(&ada.access_token), padded_phone)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "phone_number");
}

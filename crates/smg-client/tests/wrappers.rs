//! Wrapper-level tests against a local mock backend.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use smg_client::{
    ApiClient, ApiError, BlogQuery, ClientConfig, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE,
};
use smg_core::{ContactMessage, NotificationPreferences, ReviewSubmission, ServiceQuery, SupportTicket};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientConfig::for_base_url(server.base_url())).expect("client builds")
}

#[tokio::test(flavor = "multi_thread")]
async fn services_fall_back_to_second_candidate_on_404() {
    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(GET).path("/services");
        then.status(404).json_body(json!({"message": "no such route"}));
    });
    let secondary = server.mock(|when, then| {
        when.method(GET)
            .path("/service")
            .query_param("type", "followers")
            .query_param("active", "true");
        then.status(200).json_body(json!([{
            "id": "svc-1",
            "name": "Instagram Followers",
            "type": "followers",
            "active": true
        }]));
    });

    let client = client_for(&server);
    let query = ServiceQuery {
        service_type: Some("followers".to_string()),
        active: Some(true),
        ..Default::default()
    };
    let services = client.list_services(&query).await.expect("fallback succeeds");

    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id, "svc-1");
    assert_eq!(services[0].service_type.as_deref(), Some("followers"));
    primary.assert();
    secondary.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn services_non_404_failure_does_not_try_second_candidate() {
    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(GET).path("/services");
        then.status(500).json_body(json!({"error": "boom"}));
    });
    let secondary = server.mock(|when, then| {
        when.method(GET).path("/service");
        then.status(200).json_body(json!([]));
    });

    let client = client_for(&server);
    let err = client
        .list_services(&ServiceQuery::default())
        .await
        .expect_err("500 propagates");

    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.user_message(), "boom");
    primary.assert();
    secondary.assert_hits(0);
}

#[tokio::test(flavor = "multi_thread")]
async fn blog_listing_falls_through_on_401_with_category_id_encoding() {
    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(GET).path("/blog/published");
        then.status(401).json_body(json!({"error": "auth required"}));
    });
    let secondary = server.mock(|when, then| {
        when.method(GET)
            .path("/blog/posts/published")
            .query_param("limit", "5")
            .query_param("categoryId", "instagram");
        then.status(200)
            .json_body(json!({"data": [{"id": "post-1", "title": "Growth tips"}]}));
    });

    let client = client_for(&server);
    let query = BlogQuery {
        limit: Some(5),
        category: Some("instagram".to_string()),
    };
    let posts = client
        .list_published_posts(&query)
        .await
        .expect("second candidate succeeds");

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "post-1");
    primary.assert();
    secondary.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn post_by_id_scans_every_candidate_then_reports_not_found() {
    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(GET).path("/blog/published");
        then.status(200).json_body(json!([{"id": "post-1", "title": "One"}]));
    });
    let secondary = server.mock(|when, then| {
        when.method(GET).path("/blog/posts/published");
        then.status(200)
            .json_body(json!({"data": [{"id": "post-1", "title": "One"}]}));
    });

    let client = client_for(&server);
    let err = client.get_post_by_id("missing").await.expect_err("no match");

    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(err.to_string().contains("missing"));
    primary.assert();
    secondary.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn post_by_id_stops_at_the_first_candidate_containing_the_id() {
    let server = MockServer::start();
    let primary = server.mock(|when, then| {
        when.method(GET).path("/blog/published");
        then.status(200)
            .json_body(json!([{"id": "post-7", "title": "Seven", "tags": ["growth"]}]));
    });
    let secondary = server.mock(|when, then| {
        when.method(GET).path("/blog/posts/published");
        then.status(200).json_body(json!([]));
    });

    let client = client_for(&server);
    let post = client.get_post_by_id("post-7").await.expect("found on primary");

    assert_eq!(post.title, "Seven");
    primary.assert();
    secondary.assert_hits(0);
}

#[tokio::test(flavor = "multi_thread")]
async fn review_submission_sends_backend_field_names() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/leavereview").json_body(json!({
            "username": "Jo",
            "email": "jo@x.com",
            "serviceUsed": "IG Likes",
            "rating": 5,
            "reviewTitle": "Great",
            "content": "Nice"
        }));
        then.status(201)
            .json_body(json!({"success": true, "message": "thanks"}));
    });

    let client = client_for(&server);
    let outcome = client
        .submit_review(&ReviewSubmission {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            service: "IG Likes".to_string(),
            rating: 5,
            title: "Great".to_string(),
            review: "Nice".to_string(),
        })
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "thanks");
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn helpful_vote_hits_the_per_review_path() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT).path("/leavereview/rev-9/helpful");
        then.status(200)
            .json_body(json!({"success": true, "helpfulCount": 3}));
    });

    let client = client_for(&server);
    let outcome = client.mark_review_helpful("rev-9").await;

    assert!(outcome.success);
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn public_reviews_decode_from_listing_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/leavereview/public");
        then.status(200).json_body(json!([{
            "id": "r1",
            "username": "Jo",
            "serviceUsed": "IG Likes",
            "rating": 5,
            "helpfulCount": 2
        }]));
    });

    let client = client_for(&server);
    let reviews = client.list_public_reviews().await.expect("listing decodes");

    assert_eq!(reviews[0].rating, 5);
    assert_eq!(reviews[0].helpful_count, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn contact_error_without_message_fields_uses_generic_fallback() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/contact");
        then.status(500).json_body(json!({}));
    });

    let client = client_for(&server);
    let outcome = client
        .send_contact_message(&ContactMessage {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            subject: "Hi".to_string(),
            message: "Hello".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, GENERIC_ERROR_MESSAGE);
}

#[tokio::test(flavor = "multi_thread")]
async fn support_error_extracts_detail_field() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/support");
        then.status(400)
            .json_body(json!({"detail": "order number unknown"}));
    });

    let client = client_for(&server);
    let outcome = client
        .submit_support_ticket(&SupportTicket {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            order_number: "SMG-9".to_string(),
            category: "orders".to_string(),
            subject: "Stuck".to_string(),
            message: "Order stalled".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "order number unknown");
}

#[tokio::test(flavor = "multi_thread")]
async fn preferences_request_strips_token_quotes_before_bearer_auth() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/notification-preferences")
            .header("authorization", "Bearer tok-123");
        then.status(200).json_body(json!({
            "data": {"orderUpdates": true, "promotions": false, "newsletter": true}
        }));
    });

    let config =
        ClientConfig::for_base_url(server.base_url()).with_auth_token("\"tok-123\"");
    let client = ApiClient::new(&config).expect("client builds");
    let outcome = client.notification_preferences().await;

    assert!(outcome.success);
    let preferences: NotificationPreferences = outcome.decode().expect("typed decode");
    assert!(preferences.order_updates);
    assert!(preferences.newsletter);
    assert!(!preferences.promotions);
    mock.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn no_response_failure_is_absorbed_with_the_fixed_network_message() {
    let mut config = ClientConfig::for_base_url("http://127.0.0.1:9");
    config.timeout = Duration::from_millis(500);
    let client = ApiClient::new(&config).expect("client builds");

    let outcome = client
        .send_contact_message(&ContactMessage {
            name: "Jo".to_string(),
            email: "jo@x.com".to_string(),
            subject: "Hi".to_string(),
            message: "Hello".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, NETWORK_ERROR_MESSAGE);
}

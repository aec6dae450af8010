mod common;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use trellis::{HandlebarsRenderer, Phase, Reply, RequestContext, Route};
use trellis_core::AppError;

use common::{HTML, JSON, TestRequest, test_app, test_builder};

// ============================================================================
// JSON responses
// ============================================================================

#[tokio::test]
async fn test_find_returns_json_page() {
    let app = test_app();

    let res = TestRequest::get("/urls?limit=2")
        .accept(JSON)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["slug"], "docs");
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["limit"], 2);
    assert_eq!(body["meta"]["has_more"], true);
}

#[tokio::test]
async fn test_second_page() {
    let app = test_app();

    let res = TestRequest::get("/urls?limit=2&page=2")
        .accept(JSON)
        .roles("viewer")
        .send(app.router())
        .await;

    let body = res.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["slug"], "jobs");
    assert_eq!(body["meta"]["has_more"], false);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = test_app();

    let res = TestRequest::get("/urls?page=9223372036854775807&limit=100")
        .accept(JSON)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["has_more"], false);
}

#[tokio::test]
async fn test_missing_accept_uses_default_content_type() {
    let app = test_app();

    let res = TestRequest::get("/urls/1").roles("viewer").send(app.router()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.content_type.as_ref().unwrap().starts_with(JSON));
    assert_eq!(res.json()["target"], "https://example.com/docs");
}

#[tokio::test]
async fn test_quality_values_pick_json() {
    let app = test_app();

    let res = TestRequest::get("/urls/1")
        .accept("text/html;q=0.5, application/json")
        .roles("viewer")
        .send(app.router())
        .await;

    assert!(res.content_type.as_ref().unwrap().starts_with(JSON));
}

#[tokio::test]
async fn test_create_returns_201() {
    let app = test_app();
    let router = app.router();

    let res = TestRequest::new("POST", "/urls")
        .accept(JSON)
        .roles("editor")
        .json(json!({"slug": "careers", "target": "https://example.com/careers"}))
        .send(router.clone())
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["id"], 4);

    let res = TestRequest::get("/urls-count")
        .accept(JSON)
        .roles("viewer")
        .send(router)
        .await;
    assert_eq!(res.json(), json!({"count": 4}));
}

#[tokio::test]
async fn test_delete_returns_empty_204() {
    let app = test_app();

    let res = TestRequest::new("DELETE", "/urls/2")
        .accept(JSON)
        .roles("editor")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());
}

// ============================================================================
// Error responses
// ============================================================================

#[tokio::test]
async fn test_forbidden_json() {
    let app = test_app();

    let res = TestRequest::get("/urls")
        .accept(JSON)
        .roles("guest")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({"code": 403, "message": "Forbidden"}));
}

#[tokio::test]
async fn test_no_roles_is_forbidden() {
    let app = test_app();

    let res = TestRequest::get("/urls").accept(JSON).send(app.router()).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_record_not_found_json() {
    let app = test_app();

    let res = TestRequest::get("/urls/999")
        .accept(JSON)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({"code": 404, "message": "Not Found"}));
}

#[tokio::test]
async fn test_validation_errors() {
    let app = test_app();

    let res = TestRequest::new("POST", "/urls")
        .accept(JSON)
        .roles("editor")
        .json(json!({"slug": "ab", "target": "nope"}))
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "slug");
    assert_eq!(errors[0]["tag"], "length");
    assert_eq!(errors[0]["message"], "slug must be 3 to 32 characters");
    assert_eq!(errors[1]["field"], "target");
    assert_eq!(errors[1]["message"], "target must be a URL");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();

    let res = TestRequest::new("POST", "/urls")
        .accept(JSON)
        .roles("editor")
        .header("content-type", JSON)
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], 400);
}

#[tokio::test]
async fn test_internal_error_hides_cause() {
    let app = test_app();

    let res = TestRequest::get("/boom").accept(JSON).send(app.router()).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json(),
        json!({"code": 500, "message": "Internal Server Error"})
    );
    assert!(!res.body.contains("hunter2"));
}

#[tokio::test]
async fn test_unmapped_status_keeps_code_and_message() {
    let app = test_app();

    let res = TestRequest::get("/teapot").accept(JSON).send(app.router()).await;

    assert_eq!(res.status, StatusCode::IM_A_TEAPOT);
    assert_eq!(res.json(), json!({"code": 418, "message": "short and stout"}));
}

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let app = test_app();

    let res = TestRequest::get("/nowhere").accept(JSON).send(app.router()).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({"code": 404, "message": "Not Found"}));
}

#[tokio::test]
async fn test_unbound_method_is_method_not_allowed() {
    let app = test_app();
    let router = app.router();

    let res = TestRequest::new("PATCH", "/urls")
        .accept(JSON)
        .roles("editor")
        .send(router.clone())
        .await;

    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.content_type.as_ref().unwrap().starts_with(JSON));
    assert_eq!(
        res.json(),
        json!({"code": 405, "message": "Method Not Allowed"})
    );

    let res = TestRequest::new("PATCH", "/urls").accept(HTML).send(router).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.body.contains("<h1>Something broke (405)</h1>"));
}

// ============================================================================
// HTML responses
// ============================================================================

#[tokio::test]
async fn test_html_success_renders_route_template_in_layout() {
    let app = test_app();

    let res = TestRequest::get("/urls/1")
        .accept(HTML)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.content_type.as_ref().unwrap().starts_with(HTML));
    assert_eq!(
        res.body,
        "<html><title></title><body><a href=\"https://example.com/docs\">docs</a></body></html>"
    );
}

#[tokio::test]
async fn test_html_find_renders_query_template() {
    let app = test_app();

    let res = TestRequest::get("/urls")
        .accept(HTML)
        .roles("viewer")
        .send(app.router())
        .await;

    assert!(res.body.contains("<li>docs</li><li>blog</li><li>jobs</li>"));
}

#[tokio::test]
async fn test_context_template_and_route_layout_override() {
    let app = test_app();

    let res = TestRequest::get("/card").accept(HTML).send(app.router()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "<div><p>docs</p></div>");
}

#[tokio::test]
async fn test_handler_response_message_is_rendered() {
    let app = test_app();

    let res = TestRequest::get("/notice").accept(HTML).send(app.router()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        "<html><title></title><body><div>success: Link saved</div><p>docs</p></body></html>"
    );
}

#[tokio::test]
async fn test_html_not_found_page() {
    let app = test_app();

    let res = TestRequest::get("/urls/999")
        .accept(HTML)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body.contains("<title>Not found</title>"));
    assert!(res.body.contains("<h1>Nothing at /urls/999</h1>"));
}

#[tokio::test]
async fn test_html_forbidden_page() {
    let app = test_app();

    let res = TestRequest::get("/urls").accept(HTML).send(app.router()).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.contains("<title>Forbidden</title>"));
    assert!(res.body.contains("<h1>Not for you</h1>"));
}

#[tokio::test]
async fn test_html_validation_page_lists_fields() {
    let app = test_app();

    let res = TestRequest::new("POST", "/urls")
        .accept(HTML)
        .roles("editor")
        .json(json!({"slug": "ab", "target": "https://example.com"}))
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("<title>Bad request</title>"));
    assert!(res.body.contains("<ul><li>slug</li></ul>"));
}

#[tokio::test]
async fn test_html_unmapped_status_uses_500_template() {
    let app = test_app();

    let res = TestRequest::get("/teapot").accept(HTML).send(app.router()).await;

    assert_eq!(res.status, StatusCode::IM_A_TEAPOT);
    assert!(res.body.contains("<h1>Something broke (418)</h1>"));
    assert!(res.body.contains("<title>Internal server error</title>"));
}

#[tokio::test]
async fn test_html_error_without_templates_falls_back_to_text() {
    let mut builder = test_builder();
    builder.set_template_renderer(HandlebarsRenderer::empty("site"));
    let app = builder.bootstrap().unwrap();

    let res = TestRequest::get("/nowhere").accept(HTML).send(app.router()).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.content_type.as_ref().unwrap().starts_with("text/plain"));
    assert_eq!(res.body, "Not Found");
}

// ============================================================================
// Formatters and content restrictions
// ============================================================================

#[tokio::test]
async fn test_missing_formatter_is_internal_error() {
    let mut builder = test_builder();
    builder.on(Phase::BindRoutes, |app| {
        app.remove_response_formatter(HTML);
        Ok(())
    });
    let app = builder.bootstrap().unwrap();

    let res = TestRequest::get("/urls/1")
        .accept(HTML)
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body.contains("<h1>Something broke (500)</h1>"));
}

#[tokio::test]
async fn test_custom_formatter() {
    let mut builder = test_builder();
    builder.config_mut().content_types.push("text/plain".to_string());
    builder.set_response_formatter(
        "text/plain",
        |_ctx: &RequestContext, route: &Route, reply: Reply| -> Result<Response, AppError> {
            Ok((reply.status, format!("{}: {}", route.name, reply.data)).into_response())
        },
    );
    let app = builder.bootstrap().unwrap();

    let res = TestRequest::get("/urls-count")
        .accept("text/plain")
        .roles("viewer")
        .send(app.router())
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, r#"count_url: {"count":3}"#);
}

#[tokio::test]
async fn test_accept_only_route() {
    let app = test_app();
    let router = app.router();

    let res = TestRequest::get("/api/status").accept(JSON).send(router.clone()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"status": "up"}));

    let res = TestRequest::get("/api/status").accept(HTML).send(router).await;
    assert_eq!(res.status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let res = TestRequest::get("/health").send(app.router()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "ok");
}

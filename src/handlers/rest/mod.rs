use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, put, post},
};
use axum_macros::debug_handler;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    dto::{FormSubmission, FormUpdate, QuerySnapshot, StoreSnapshot, SubmitResponse},
    models::{QueryType, RequestToken},
    render,
    service::AnnoStore,
};

#[derive(OpenApi)]
#[openapi(
    paths(get_state, update_form, submit_query),
    components(schemas(
        StoreSnapshot,
        QuerySnapshot,
        FormUpdate,
        SubmitResponse,
        QueryType,
        RequestToken
    )),
    tags(
        (name = "form", description = "Annotation form state and submission")
    )
)]
pub struct ApiDoc;

pub fn router(store: Arc<AnnoStore>) -> Router {
    Router::new()
        .route("/", get(form_page).post(submit_form))
        .route("/api/state", get(get_state))
        .route("/api/form", put(update_form))
        .route("/api/submit", post(submit_query))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(store)
        .layer(TraceLayer::new_for_http())
}

#[debug_handler]
pub async fn form_page(State(store): State<Arc<AnnoStore>>) -> Html<String> {
    Html(render::page(&store.snapshot().await))
}

#[debug_handler]
pub async fn submit_form(
    State(store): State<Arc<AnnoStore>>,
    Form(submission): Form<FormSubmission>,
) -> Response {
    let query_type = match submission.query_type.parse::<QueryType>() {
        Ok(query_type) => query_type,
        Err(e) => {
            tracing::warn!("rejected form post: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    store
        .edit(FormUpdate {
            secret: Some(submission.secret),
            id: Some(submission.id),
            query_type: Some(query_type),
            annotation: Some(submission.annotation),
        })
        .await;
    store.submit().await;

    Redirect::to("/").into_response()
}

#[utoipa::path(
    get,
    path = "/api/state",
    responses(
        (status = 200, description = "Current form and query panel", body = StoreSnapshot)
    ),
    tag = "form"
)]
#[debug_handler]
pub async fn get_state(State(store): State<Arc<AnnoStore>>) -> Response {
    (StatusCode::OK, Json(store.snapshot().await)).into_response()
}

#[utoipa::path(
    put,
    path = "/api/form",
    request_body = FormUpdate,
    responses(
        (status = 200, description = "Fields updated", body = StoreSnapshot)
    ),
    tag = "form"
)]
#[debug_handler]
pub async fn update_form(
    State(store): State<Arc<AnnoStore>>,
    Json(payload): Json<FormUpdate>,
) -> Response {
    store.edit(payload).await;
    (StatusCode::OK, Json(store.snapshot().await)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/submit",
    responses(
        (status = 202, description = "Query submitted", body = SubmitResponse)
    ),
    tag = "form"
)]
#[debug_handler]
pub async fn submit_query(State(store): State<Arc<AnnoStore>>) -> Response {
    let (token, _) = store.submit().await;
    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            query_timestamp: token,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::QueryPayload;
    use crate::transport::{AnnotationTransport, TransportError};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FailingTransport;

    #[async_trait]
    impl AnnotationTransport for FailingTransport {
        async fn post(&self, _url: &str, _payload: &QueryPayload) -> Result<Value, TransportError> {
            Err("network down".into())
        }
    }

    fn app(endpoint: Option<&str>) -> (Router, Arc<AnnoStore>) {
        let store = Arc::new(AnnoStore::new(
            endpoint.map(str::to_string),
            Arc::new(FailingTransport),
        ));
        (router(store.clone()), store)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn settle(store: &AnnoStore) {
        let mut results = store.subscribe();
        if store.last_result().is_none() {
            results.changed().await.unwrap();
        }
    }

    #[tokio::test]
    async fn page_without_endpoint() {
        let (app, _) = app(None);
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(render::NO_ENDPOINT_PAGE));
    }

    #[tokio::test]
    async fn fresh_page_is_waiting() {
        let (app, _) = app(Some("https://x/api/"));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("query result: waiting for queries"));
        assert!(html.contains(r#"name="annotation""#));
    }

    #[tokio::test]
    async fn form_post_submits_and_redirects() {
        let (app, store) = app(Some("https://x/api/"));
        let response = app
            .clone()
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("secret=abc&id=&query_type=save&annotation=%7B%7D"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        settle(&store).await;

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("query error: network down"));
        assert!(html.contains("query: https://x/api/save"));
    }

    #[tokio::test]
    async fn form_post_without_secret_shows_error() {
        let (app, store) = app(Some("https://x/api/"));
        app.oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("secret=&query_type=delete&annotation="))
                .unwrap(),
        )
        .await
        .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.query.error.as_deref(), Some("no secret specified"));
        assert!(snapshot.query_timestamp.is_some());
    }

    #[tokio::test]
    async fn unknown_query_type_is_rejected() {
        let (app, store) = app(Some("https://x/api/"));
        let response = app
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("secret=abc&query_type=purge"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.snapshot().await.query_timestamp.is_none());
    }

    #[tokio::test]
    async fn json_api_edit_then_submit() {
        let (app, store) = app(Some("https://x/api/"));
        let response = app
            .clone()
            .oneshot(
                Request::put("/api/form")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "secret": "abc", "query_type": "edit" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let state: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(state["query_type"], "edit");
        assert!(state["query_timestamp"].is_null());

        let response = app
            .oneshot(Request::post("/api/submit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let submitted: Value = serde_json::from_str(&body_text(response).await).unwrap();

        settle(&store).await;
        let snapshot = store.snapshot().await;
        assert_eq!(
            submitted["query_timestamp"].as_str(),
            snapshot.query_timestamp.as_ref().map(RequestToken::as_str)
        );
        assert_eq!(snapshot.query.query_url.as_deref(), Some("https://x/api/edit"));
    }
}

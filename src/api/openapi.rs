//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::{assessment, error, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Skill Assessment API",
        description = "Self-ratings, generated follow-up questions, scoring and stored assessment records"
    ),
    paths(
        assessment::list_applications,
        assessment::list_static_questions,
        assessment::submit_self_assessment,
        assessment::get_session,
        assessment::request_generated_questions,
        assessment::submit_answers,
        assessment::finalize_score,
        assessment::manager_view,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            assessment::SelfAssessmentRequest,
            assessment::AnswersRequest,
            assessment::ApplicationsResponse,
            assessment::StaticQuestionsResponse,
            assessment::GeneratedQuestionsResponse,
            assessment::ScoreResponse,
            assessment::ManagerViewResponse,
            error::ErrorResponse,
            crate::model::AssessmentSession,
            crate::model::SessionStatus,
            crate::model::ManagerViewRow,
        )
    ),
    tags(
        (name = "assessments", description = "Skill verification lifecycle"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}

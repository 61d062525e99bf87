//! REST API endpoints for skill assessments

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorResponse};
use crate::model::{
    AssessmentSession, ManagerViewRow, ScoreResult, SessionId, SessionState, SessionStatus,
};
use crate::service::AssessmentService;

/// Self-assessment submission: one rating per static question, in order
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelfAssessmentRequest {
    pub user: String,
    pub application: String,
    /// Integers in [1, 5]
    pub ratings: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswersRequest {
    /// One answer per generated question, in question order
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationsResponse {
    pub applications: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaticQuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedQuestionsResponse {
    pub session_id: uuid::Uuid,
    pub state: SessionState,
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub session_id: uuid::Uuid,
    pub state: SessionState,
    pub score: ScoreResult,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagerViewResponse {
    pub assessments: Vec<ManagerViewRow>,
}

/// List applications available for assessment
#[utoipa::path(
    get,
    path = "/v1/applications",
    responses(
        (status = 200, description = "Application names in sorted order", body = ApplicationsResponse),
        (status = 500, description = "Data source error", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[get("/v1/applications")]
pub async fn list_applications(
    service: web::Data<AssessmentService>,
) -> Result<HttpResponse, ApiError> {
    let applications = service.list_applications().await?;
    Ok(HttpResponse::Ok().json(ApplicationsResponse { applications }))
}

/// List the fixed self-rating questions
#[utoipa::path(
    get,
    path = "/v1/static-questions",
    responses(
        (status = 200, description = "Static self-rating questions", body = StaticQuestionsResponse)
    ),
    tag = "assessments"
)]
#[get("/v1/static-questions")]
pub async fn list_static_questions(service: web::Data<AssessmentService>) -> HttpResponse {
    HttpResponse::Ok().json(StaticQuestionsResponse {
        questions: service.list_static_questions().to_vec(),
    })
}

/// Start an assessment with self-ratings
#[utoipa::path(
    post,
    path = "/v1/assessments",
    request_body = SelfAssessmentRequest,
    responses(
        (status = 201, description = "Session created and self-rated", body = SessionStatus),
        (status = 400, description = "Invalid ratings", body = ErrorResponse),
        (status = 404, description = "Unknown application", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[post("/v1/assessments")]
pub async fn submit_self_assessment(
    service: web::Data<AssessmentService>,
    body: web::Json<SelfAssessmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let status = service
        .submit_self_assessment(&body.user, &body.application, &body.ratings)
        .await?;
    Ok(HttpResponse::Created().json(status))
}

/// Get the last committed state of a session
#[utoipa::path(
    get,
    path = "/v1/assessments/{id}",
    params(
        ("id" = uuid::Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session snapshot", body = AssessmentSession),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[get("/v1/assessments/{id}")]
pub async fn get_session(
    service: web::Data<AssessmentService>,
    path: web::Path<SessionId>,
) -> Result<HttpResponse, ApiError> {
    let session = service.get_session(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Generate follow-up questions for a self-rated session
#[utoipa::path(
    post,
    path = "/v1/assessments/{id}/questions",
    params(
        ("id" = uuid::Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Questions generated", body = GeneratedQuestionsResponse),
        (status = 404, description = "Session or application profile not found", body = ErrorResponse),
        (status = 409, description = "Wrong state or session busy", body = ErrorResponse),
        (status = 502, description = "Generation failed or was empty", body = ErrorResponse),
        (status = 504, description = "Generation timed out", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[post("/v1/assessments/{id}/questions")]
pub async fn request_generated_questions(
    service: web::Data<AssessmentService>,
    path: web::Path<SessionId>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let questions = service.request_generated_questions(session_id).await?;
    Ok(HttpResponse::Ok().json(GeneratedQuestionsResponse {
        session_id,
        state: SessionState::QuestionsGenerated,
        questions,
    }))
}

/// Submit answers to the generated questions
#[utoipa::path(
    post,
    path = "/v1/assessments/{id}/answers",
    params(
        ("id" = uuid::Uuid, Path, description = "Session ID")
    ),
    request_body = AnswersRequest,
    responses(
        (status = 200, description = "Answers accepted", body = SessionStatus),
        (status = 400, description = "Answer count does not match questions", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Wrong state or session busy", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[post("/v1/assessments/{id}/answers")]
pub async fn submit_answers(
    service: web::Data<AssessmentService>,
    path: web::Path<SessionId>,
    body: web::Json<AnswersRequest>,
) -> Result<HttpResponse, ApiError> {
    let status = service
        .submit_answers(path.into_inner(), body.into_inner().answers)
        .await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Score the answers and store the assessment
#[utoipa::path(
    post,
    path = "/v1/assessments/{id}/score",
    params(
        ("id" = uuid::Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Scored and stored", body = ScoreResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Wrong state or session busy", body = ErrorResponse),
        (status = 500, description = "Store failed, session stays scored", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[post("/v1/assessments/{id}/score")]
pub async fn finalize_score(
    service: web::Data<AssessmentService>,
    path: web::Path<SessionId>,
) -> Result<HttpResponse, ApiError> {
    let session_id = path.into_inner();
    let score = service.finalize_score(session_id).await?;
    Ok(HttpResponse::Ok().json(ScoreResponse {
        session_id,
        state: SessionState::Stored,
        score,
    }))
}

/// Stored assessments in the order they were completed
#[utoipa::path(
    get,
    path = "/v1/manager-view",
    responses(
        (status = 200, description = "Stored assessments", body = ManagerViewResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "assessments"
)]
#[get("/v1/manager-view")]
pub async fn manager_view(
    service: web::Data<AssessmentService>,
) -> Result<HttpResponse, ApiError> {
    let assessments = service.manager_view().await?;
    Ok(HttpResponse::Ok().json(ManagerViewResponse { assessments }))
}

/// Configure assessment routes
///
/// Malformed bodies and session ids are answered with the same error body
/// as engine failures.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(err.to_string()).into()
    }))
    .service(list_applications)
        .service(list_static_questions)
        .service(submit_self_assessment)
        .service(get_session)
        .service(request_generated_questions)
        .service(submit_answers)
        .service(finalize_score)
        .service(manager_view);
}

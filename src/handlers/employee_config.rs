use actix_web::{
    HttpResponse,
    web::{self, Data},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    database::models::{CreateEmployeeConfigInput, UpdateEmployeeConfigInput},
    error::AppError,
    handlers::shared::ApiResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConfigQuery {
    pub as_of: Option<NaiveDate>,
}

/// Create a new config period for an employee of the tenant.
pub async fn create_config(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<CreateEmployeeConfigInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let config = state
        .employee_configs
        .create_config(&company_id, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(config)))
}

/// Start a fresh period on the first of next month.
pub async fn recreate_config(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<CreateEmployeeConfigInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let config = state
        .employee_configs
        .recreate_config(&company_id, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(config)))
}

pub async fn update_config(
    path: web::Path<(String, Uuid)>,
    state: Data<AppState>,
    input: web::Json<UpdateEmployeeConfigInput>,
) -> Result<HttpResponse, AppError> {
    let (company_id, id) = path.into_inner();
    let config = state
        .employee_configs
        .update_config(&company_id, id, input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(config)))
}

pub async fn get_config(
    path: web::Path<(String, Uuid)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, id) = path.into_inner();
    let config = state.employee_configs.get_by_id(&company_id, id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(config)))
}

/// Current roster: the open-ended config of every employee.
pub async fn get_all_latest(
    path: web::Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let configs = state.employee_configs.get_all_latest(&company_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(configs)))
}

/// Per-employee config in effect during the given month.
pub async fn get_configs_for_period(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, month_year) = path.into_inner();
    let configs = state
        .employee_configs
        .get_configs_for_period(&company_id, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(configs)))
}

pub async fn get_history(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let configs = state
        .employee_configs
        .get_history(&company_id, &iqama_no)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(configs)))
}

pub async fn get_active_config(
    path: web::Path<(String, String)>,
    query: web::Query<ActiveConfigQuery>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let config = state
        .employee_configs
        .get_active_config(&company_id, &iqama_no, query.as_of)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(config)))
}

/// Delete the open-ended period and reopen its predecessor.
pub async fn delete_latest_config(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    state
        .employee_configs
        .delete_latest_config(&company_id, &iqama_no)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Latest config period deleted",
    )))
}

use actix_web::{
    HttpResponse,
    web::{self, Data},
};

use crate::{
    AppState,
    database::models::UpsertFixedSalaryInput,
    error::AppError,
    handlers::shared::ApiResponse,
    services::require_tenant,
};

pub async fn get_defaults(
    path: web::Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let tenant = require_tenant(&company_id)?;

    let defaults = state.fixed_salary.find(tenant).await?.ok_or_else(|| {
        AppError::not_found(format!("No fixed salary defaults configured for {}", tenant))
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(defaults)))
}

pub async fn upsert_defaults(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<UpsertFixedSalaryInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let tenant = require_tenant(&company_id)?;

    let defaults = state.fixed_salary.upsert(tenant, &input.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(defaults)))
}

pub async fn delete_defaults(
    path: web::Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let tenant = require_tenant(&company_id)?;

    let deleted = state.fixed_salary.delete(tenant).await?;
    if deleted == 0 {
        return Err(AppError::not_found(format!(
            "No fixed salary defaults configured for {}",
            tenant
        )));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Fixed salary defaults deleted",
    )))
}

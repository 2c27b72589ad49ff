use actix_web::{
    HttpResponse,
    web::{self, Data},
};
use serde::Deserialize;

use crate::{
    AppState,
    database::models::{CreateAttendanceInput, UpdateAttendanceInput},
    error::AppError,
    handlers::shared::ApiResponse,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceInput {
    pub month_year: String,
    pub iqama_nos: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMonthInput {
    pub days_present: Option<i32>,
    pub remarks: Option<String>,
}

pub async fn create_attendance(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<CreateAttendanceInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let record = state
        .attendance
        .create_attendance(&company_id, input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

pub async fn update_attendance(
    path: web::Path<(String, String, String)>,
    state: Data<AppState>,
    input: web::Json<UpdateAttendanceInput>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no, month_year) = path.into_inner();
    let record = state
        .attendance
        .update_attendance(&company_id, &iqama_no, &month_year, input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

pub async fn delete_attendance(
    path: web::Path<(String, String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no, month_year) = path.into_inner();
    state
        .attendance
        .delete_attendance(&company_id, &iqama_no, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Attendance record deleted",
    )))
}

pub async fn get_attendance(
    path: web::Path<(String, String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no, month_year) = path.into_inner();
    let record = state
        .attendance
        .get_attendance(&company_id, &iqama_no, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

pub async fn get_all_for_employee(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let records = state
        .attendance
        .get_all_for_employee(&company_id, &iqama_no)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_for_month(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, month_year) = path.into_inner();
    let records = state
        .attendance
        .get_for_month(&company_id, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

/// Months still missing an attendance record, as label strings.
pub async fn get_pending_months(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let months: Vec<String> = state
        .attendance
        .pending_months(&company_id, &iqama_no)
        .await?
        .into_iter()
        .map(|month| month.to_string())
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(months)))
}

pub async fn backfill_pending_months(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let records = state
        .attendance
        .create_for_pending_months(&company_id, &iqama_no)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(records)))
}

pub async fn create_for_current_month(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
    input: web::Json<CurrentMonthInput>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let input = input.into_inner();
    let record = state
        .attendance
        .create_for_current_month(&company_id, &iqama_no, input.days_present, input.remarks)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

pub async fn bulk_create(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<BulkAttendanceInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let input = input.into_inner();
    let report = state
        .attendance
        .bulk_create(&company_id, &input.month_year, input.iqama_nos)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

use actix_web::{
    HttpResponse,
    web::{self, Data},
};

use crate::{
    AppState,
    database::models::{BulkGenerateInput, GenerateInvoiceInput},
    error::AppError,
    handlers::shared::ApiResponse,
};

pub async fn generate_invoice(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<GenerateInvoiceInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let invoice = state
        .invoices
        .generate_invoice(&company_id, input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(invoice)))
}

pub async fn bulk_generate(
    path: web::Path<String>,
    state: Data<AppState>,
    input: web::Json<BulkGenerateInput>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let report = state
        .invoices
        .bulk_generate(&company_id, input.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

/// Run the finalization sweep on demand.
pub async fn finalize_invoices(
    path: web::Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let report = state.invoices.manually_finalize(&company_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

pub async fn get_finalization_stats(
    path: web::Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let company_id = path.into_inner();
    let stats = state.invoices.get_finalization_stats(&company_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

pub async fn get_invoice(
    path: web::Path<(String, String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no, month_year) = path.into_inner();
    let invoice = state
        .invoices
        .get_invoice(&company_id, &iqama_no, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(invoice)))
}

pub async fn get_invoices_for_employee(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no) = path.into_inner();
    let invoices = state
        .invoices
        .get_invoices_for_employee(&company_id, &iqama_no)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(invoices)))
}

pub async fn get_invoices_for_month(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, month_year) = path.into_inner();
    let invoices = state
        .invoices
        .get_invoices_for_month(&company_id, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(invoices)))
}

/// Generation dashboard: per-employee invoice/attendance presence for a month.
pub async fn get_status_for_month(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, month_year) = path.into_inner();
    let statuses = state
        .invoices
        .get_status_for_all_employees(&company_id, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(statuses)))
}

pub async fn delete_invoice(
    path: web::Path<(String, String, String)>,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (company_id, iqama_no, month_year) = path.into_inner();
    state
        .invoices
        .delete_invoice(&company_id, &iqama_no, &month_year)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Invoice and its attendance record deleted",
    )))
}

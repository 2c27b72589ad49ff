use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use payroll_be::database::init_database;
use payroll_be::handlers::{attendance, employee_config, fixed_salary, invoice};
use payroll_be::{AppState, Config};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("Payroll API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    println!("🚀 Starting Payroll API server...");

    // Load configuration
    let config = Config::from_env()?;
    println!(
        "📋 Configuration loaded (environment: {})",
        config.environment
    );

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    println!("✅ Database initialized");

    let app_state = web::Data::new(AppState::new(pool));

    let server_address = config.server_address();
    println!("🌐 Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(hello)
            .service(health)
            .service(
                web::scope("/api/v1/companies/{company_id}")
                    .service(
                        web::scope("/employee-configs")
                            .route("", web::post().to(employee_config::create_config))
                            .route("", web::get().to(employee_config::get_all_latest))
                            .route(
                                "/recreate",
                                web::post().to(employee_config::recreate_config),
                            )
                            .route(
                                "/period/{month_year}",
                                web::get().to(employee_config::get_configs_for_period),
                            )
                            .route(
                                "/employee/{iqama_no}/history",
                                web::get().to(employee_config::get_history),
                            )
                            .route(
                                "/employee/{iqama_no}/active",
                                web::get().to(employee_config::get_active_config),
                            )
                            .route(
                                "/employee/{iqama_no}/latest",
                                web::delete().to(employee_config::delete_latest_config),
                            )
                            .route("/{id}", web::get().to(employee_config::get_config))
                            .route("/{id}", web::put().to(employee_config::update_config)),
                    )
                    .service(
                        web::scope("/attendance")
                            .route("", web::post().to(attendance::create_attendance))
                            .route("/bulk", web::post().to(attendance::bulk_create))
                            .route(
                                "/month/{month_year}",
                                web::get().to(attendance::get_for_month),
                            )
                            .route(
                                "/employee/{iqama_no}",
                                web::get().to(attendance::get_all_for_employee),
                            )
                            .route(
                                "/employee/{iqama_no}/pending-months",
                                web::get().to(attendance::get_pending_months),
                            )
                            .route(
                                "/employee/{iqama_no}/backfill",
                                web::post().to(attendance::backfill_pending_months),
                            )
                            .route(
                                "/employee/{iqama_no}/current",
                                web::post().to(attendance::create_for_current_month),
                            )
                            .route(
                                "/employee/{iqama_no}/{month_year}",
                                web::get().to(attendance::get_attendance),
                            )
                            .route(
                                "/employee/{iqama_no}/{month_year}",
                                web::put().to(attendance::update_attendance),
                            )
                            .route(
                                "/employee/{iqama_no}/{month_year}",
                                web::delete().to(attendance::delete_attendance),
                            ),
                    )
                    .service(
                        web::scope("/invoices")
                            .route("/generate", web::post().to(invoice::generate_invoice))
                            .route("/bulk-generate", web::post().to(invoice::bulk_generate))
                            .route("/finalize", web::post().to(invoice::finalize_invoices))
                            .route("/stats", web::get().to(invoice::get_finalization_stats))
                            .route(
                                "/month/{month_year}",
                                web::get().to(invoice::get_invoices_for_month),
                            )
                            .route(
                                "/status/{month_year}",
                                web::get().to(invoice::get_status_for_month),
                            )
                            .route(
                                "/employee/{iqama_no}",
                                web::get().to(invoice::get_invoices_for_employee),
                            )
                            .route(
                                "/employee/{iqama_no}/{month_year}",
                                web::get().to(invoice::get_invoice),
                            )
                            .route(
                                "/employee/{iqama_no}/{month_year}",
                                web::delete().to(invoice::delete_invoice),
                            ),
                    )
                    .service(
                        web::scope("/fixed-salary")
                            .route("", web::get().to(fixed_salary::get_defaults))
                            .route("", web::put().to(fixed_salary::upsert_defaults))
                            .route("", web::delete().to(fixed_salary::delete_defaults)),
                    ),
            )
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

use actix_web::{get, post, web, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{audit::TracingAudit, auth::Admin, error::CoreError, generator, payroll as engine, settings::Defaults, store::DbStore, utils::Month};

use extractor::VisiblePayroll;

use super::context;

mod extractor;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(generate)
        .service(preview)
        .service(get_payroll)
        .service(get_history)
        .service(approve)
        .service(pay)
        .service(recalculate);
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Generate {
    pub(super) month: String,
}

/// Same entry point as the scheduled monthly run; safe to repeat
#[post("/generate")]
async fn generate(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, admin: Admin, payload: web::Json<Generate>) -> Result<impl Responder, CoreError> {
    let month = payload.month.parse::<Month>()?;
    let (store, settings) = context(&db, &defaults).await;

    let report = generator::generate_payrolls(&store, &TracingAudit, &settings, &admin, month).await?;

    Ok(web::Json(report))
}

#[get("/preview/{staff_id}/{month}")]
async fn preview(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, _admin: Admin, path: web::Path<(Uuid, String)>) -> Result<impl Responder, CoreError> {
    let (staff_id, month) = path.into_inner();
    let month = month.parse::<Month>()?;
    let (store, settings) = context(&db, &defaults).await;

    let summary = engine::preview(&store, &settings.rates, staff_id, month).await?;

    Ok(web::Json(summary))
}

#[get("/{payroll_id}")]
async fn get_payroll(payroll: VisiblePayroll) -> impl Responder {
    web::Json(payroll.0)
}

#[get("/{payroll_id}/history")]
async fn get_history(db: web::Data<DatabaseConnection>, payroll: VisiblePayroll) -> Result<impl Responder, CoreError> {
    let history = engine::history(&DbStore::new(db.get_ref()), payroll.id).await?;

    Ok(web::Json(history))
}

#[post("/{payroll_id}/approve")]
async fn approve(db: web::Data<DatabaseConnection>, admin: Admin, payroll_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let payroll = engine::approve(&DbStore::new(db.get_ref()), &TracingAudit, &admin, payroll_id.into_inner()).await?;

    Ok(web::Json(payroll))
}

#[post("/{payroll_id}/pay")]
async fn pay(db: web::Data<DatabaseConnection>, admin: Admin, payroll_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let payroll = engine::mark_paid(&DbStore::new(db.get_ref()), &TracingAudit, &admin, payroll_id.into_inner()).await?;

    Ok(web::Json(payroll))
}

#[post("/{payroll_id}/recalculate")]
async fn recalculate(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, admin: Admin, payroll_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;

    let payroll = engine::recalculate(&store, &TracingAudit, &settings.rates, &admin, payroll_id.into_inner()).await?;

    Ok(web::Json(payroll))
}

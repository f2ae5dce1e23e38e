use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::{Local, Timelike as _};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{attendance::clock::{self, Correction, ManualEntry}, audit::{Actor, TracingAudit}, auth::Admin, error::CoreError, settings::Defaults, store::DbStore};

use model::*;

use super::context;

mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(clock_in)
        .service(clock_out)
        .service(schedule)
        .service(mark_no_shows)
        .service(record_manual)
        .service(correct)
        .service(cancel)
        .service(penalties);
}

#[post("/clock-in")]
async fn clock_in(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, actor: Actor, payload: web::Json<ClockRequest>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;
    let now = Local::now().naive_local().with_nanosecond(0).unwrap_or_default();

    let record = clock::clock_in(&store, &TracingAudit, &settings, &actor, payload.into_inner().into_event(&actor, now)).await?;

    Ok(HttpResponse::Created().json(record))
}

#[post("/clock-out")]
async fn clock_out(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, actor: Actor, payload: web::Json<ClockRequest>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;
    let now = Local::now().naive_local().with_nanosecond(0).unwrap_or_default();

    let record = clock::clock_out(&store, &TracingAudit, &settings, &actor, payload.into_inner().into_event(&actor, now)).await?;

    Ok(web::Json(record))
}

#[post("/schedule")]
async fn schedule(db: web::Data<DatabaseConnection>, admin: Admin, payload: web::Json<ScheduleShift>) -> Result<impl Responder, CoreError> {
    let store = DbStore::new(db.get_ref());

    let record = clock::schedule(&store, &TracingAudit, &admin, payload.shift_id).await?;

    Ok(web::Json(record))
}

#[post("/no-show")]
async fn mark_no_shows(db: web::Data<DatabaseConnection>, admin: Admin, payload: web::Json<NoShowSweep>) -> Result<impl Responder, CoreError> {
    let store = DbStore::new(db.get_ref());

    let report = clock::mark_no_shows(&store, &TracingAudit, &admin, payload.date).await?;

    Ok(web::Json(report))
}

#[post("/manual")]
async fn record_manual(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, admin: Admin, payload: web::Json<ManualEntry>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;

    let record = clock::record_manual(&store, &TracingAudit, &settings, &admin, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(record))
}

#[put("/{record_id}")]
async fn correct(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, admin: Admin, record_id: web::Path<Uuid>, payload: web::Json<Correction>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;

    let record = clock::correct(&store, &TracingAudit, &settings, &admin, record_id.into_inner(), payload.into_inner()).await?;

    Ok(web::Json(record))
}

#[post("/{record_id}/cancel")]
async fn cancel(db: web::Data<DatabaseConnection>, admin: Admin, record_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let store = DbStore::new(db.get_ref());

    let record = clock::cancel(&store, &TracingAudit, &admin, record_id.into_inner()).await?;

    Ok(web::Json(record))
}

#[get("/{record_id}/penalties")]
async fn penalties(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, _actor: Actor, record_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let (store, settings) = context(&db, &defaults).await;

    let accrual = clock::accrual(&store, &settings, record_id.into_inner()).await?;

    Ok(web::Json(accrual))
}

use actix_web::{post, web, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{audit::TracingAudit, auth::Admin, child_payment, error::CoreError, generator, settings::Defaults, store::DbStore, utils::Month};

use super::context;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(generate)
        .service(pay);
}

#[derive(Debug, Serialize, Deserialize)]
struct Generate {
    month: String,
}

#[post("/generate")]
async fn generate(db: web::Data<DatabaseConnection>, defaults: web::Data<Defaults>, admin: Admin, payload: web::Json<Generate>) -> Result<impl Responder, CoreError> {
    let month = payload.month.parse::<Month>()?;
    let (store, settings) = context(&db, &defaults).await;

    let report = generator::generate_child_payments(&store, &TracingAudit, &settings, &admin, month).await?;

    Ok(web::Json(report))
}

#[post("/{payment_id}/pay")]
async fn pay(db: web::Data<DatabaseConnection>, admin: Admin, payment_id: web::Path<Uuid>) -> Result<impl Responder, CoreError> {
    let payment = child_payment::mark_paid(&DbStore::new(db.get_ref()), &TracingAudit, &admin, payment_id.into_inner()).await?;

    Ok(web::Json(payment))
}

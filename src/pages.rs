use actix_web::web;
use sea_orm::DatabaseConnection;

use crate::{settings::{self, Defaults, Settings}, store::DbStore};

mod auth;
mod attendance;
mod payroll;
mod child_payment;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/attendance")
            .configure(attendance::config))
        .service(web::scope("/payroll")
            .configure(payroll::config))
        .service(web::scope("/child-payments")
            .configure(child_payment::config));
}

/// Store and freshly resolved settings for a single request
async fn context<'a>(db: &'a web::Data<DatabaseConnection>, defaults: &web::Data<Defaults>) -> (DbStore<'a>, Settings) {
    let store = DbStore::new(db.get_ref());
    let settings = settings::load(&store, defaults.get_ref()).await;

    (store, settings)
}

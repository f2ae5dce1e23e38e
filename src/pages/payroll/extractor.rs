use std::{ops::Deref, str::FromStr};

use actix_web::{dev, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{audit::Actor, entity::{payroll, sea_orm_active_enums::RoleType}, payroll as engine, store::DbStore};

impl FromRequest for payroll::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(payroll_id) = req.match_info().get("payroll_id") else {
                return Err(actix_web::error::ErrorInternalServerError("extractor used outside of a `payroll_id` path"))
            };
            let Ok(payroll_id) = Uuid::from_str(payroll_id) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `payroll_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            Ok(engine::find(&DbStore::new(db.get_ref()), payroll_id).await?)
        })
    }
}

/// Payroll the signed-in actor may read: any payroll for admins, their own for staff
pub(super) struct VisiblePayroll(pub(super) payroll::Model);

impl Deref for VisiblePayroll {
    type Target = payroll::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for VisiblePayroll {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let actor = Actor::from_request(&req, &mut dev::Payload::None).await?;
            let payroll = payroll::Model::from_request(&req, &mut dev::Payload::None).await?;

            if actor.role != RoleType::Admin && actor.id != payroll.staff_id {
                return Err(actix_web::error::ErrorForbidden("forbidden"));
            }

            Ok(Self(payroll))
        })
    }
}

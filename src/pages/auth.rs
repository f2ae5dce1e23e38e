use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{audit::Actor, auth::Authority, entity::{prelude::*, staff}, error::CoreError, store::StoreError};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(login)
        .service(whoami);
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    username: String,
    password: String,
}

#[post("/login")]
async fn login(db: web::Data<DatabaseConnection>, authority: web::Data<Authority>, credentials: web::Json<Login>) -> actix_web::Result<impl Responder> {
    let hashed_password = &Sha256::digest(format!("{}:{}", credentials.password, credentials.username))[..];

    let Some(member) = Staff::find()
        .filter(staff::Column::Username.eq(&credentials.username))
        .filter(staff::Column::Password.eq(hashed_password))
        .filter(staff::Column::Active.eq(true))
        .one(db.get_ref()).await
        .map_err(|err| CoreError::from(StoreError::from(err)))?
    else {
        return Err(actix_web::error::ErrorForbidden("invalid credentials"));
    };

    Ok(authority.issue_for(&member)?)
}

#[get("")]
async fn whoami(actor: Actor) -> impl Responder {
    web::Json(actor)
}

#[cfg(test)]
mod tests {
    use actix_web::{body::MessageBody, http::{Method, StatusCode}, test, App};
    use chrono::Local;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::entity::sea_orm_active_enums::RoleType;

    use super::*;

    #[actix_web::test]
    async fn test_login() {
        let secret = b"secret";

        let password = "secret";
        let member = staff::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            username: "bob".to_string(),
            password: Sha256::digest(format!("{}:{}", password, "bob")).to_vec(),
            display_name: "Bob".to_string(),
            role: RoleType::Staff,
            salary: Some(1_000_000),
            active: true,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ ],
                vec![ member.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(login)
        ).await;

        {
            let forbidden_req = test::TestRequest::default()
                .uri("/login")
                .method(Method::POST)
                .set_json(Login {
                    username: "username".to_owned(),
                    password: "password".to_owned(),
                })
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        {
            let success_req = test::TestRequest::default()
                .uri("/login")
                .method(Method::POST)
                .set_json(Login {
                    username: member.username.clone(),
                    password: password.to_owned(),
                })
                .to_request();

            let response = test::call_service(&app, success_req).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().try_into_bytes().unwrap();
            let actor = Authority::new(secret).authorize(String::from_utf8_lossy(&body)).unwrap();
            assert_eq!(actor.id, member.id);
            assert_eq!(actor.username, member.username);
        }
    }

    #[actix_web::test]
    async fn test_login_storage_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_owned())]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(b"secret")))
                .app_data(web::Data::new(db.into_connection()))
                .service(login)
        ).await;

        let req = test::TestRequest::default()
            .uri("/login")
            .method(Method::POST)
            .set_json(Login {
                username: "bob".to_owned(),
                password: "secret".to_owned(),
            })
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use std::ops::Deref;

use actix_web::{body, dev, http::{self, header::ContentType, StatusCode}, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Local};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{audit::Actor, entity::{sea_orm_active_enums::RoleType, staff}};

/// Signs and verifies the bearer tokens carried by every request
pub struct Authority {
    jwt_key: (EncodingKey, DecodingKey),
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: (EncodingKey::from_secret(jwt_key), DecodingKey::from_secret(jwt_key))
        }
    }

    /// Issue a token for specified staff member with 1 week of expiration time
    pub fn issue_for(&self, member: &staff::Model) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (Local::now() + Duration::weeks(1)).timestamp(),
            data: Actor {
                id: member.id,
                username: member.username.clone(),
                display_name: member.display_name.clone(),
                role: member.role,
            },
        };

        Ok(encode(&Header::default(), &claims, &self.jwt_key.0)?)
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<Actor, AuthError> {
        let payload = decode::<Claims<Actor>>(token.as_ref(), &self.jwt_key.1, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authority error")]
    AuthorityError(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::error::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AuthError::AuthorityError(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Value after the space in `Authorization`, e.g. `JWT sometoken`
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(" "))
                )
            else {
                return Err(actix_web::error::ErrorUnauthorized("unauthorized"))
            };

            let Some(authority) = req.app_data::<web::Data<Authority>>() else {
                return Err(actix_web::error::ErrorInternalServerError("authority is not configured"))
            };
            let actor = authority.authorize(token)?;

            Ok(actor)
        })
    }
}

/// An [`Actor`] holding the admin role
pub struct Admin(pub Actor);

impl Deref for Admin {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Admin {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let actor = Actor::from_request(&req, &mut dev::Payload::None).await?;

            if actor.role != RoleType::Admin {
                return Err(actix_web::error::ErrorForbidden("forbidden"))
            }

            Ok(Self(actor))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use actix_web::{body::MessageBody, get, test, App, Responder};
    use uuid::Uuid;

    use super::*;

    pub(crate) fn member(role: RoleType) -> staff::Model {
        staff::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            username: "bob".to_string(),
            password: Vec::new(),
            display_name: "Bob".to_string(),
            role,
            salary: Some(1_000_000),
            active: true,
        }
    }

    #[actix_web::test]
    async fn test_authority() {
        let authority = Authority::new(b"secret");
        let member = member(RoleType::Staff);

        let token = authority.issue_for(&member).unwrap();

        let actor = authority.authorize(token).expect("Unable to authorize staff member from token");
        assert_eq!(actor.id, member.id);
        assert_eq!(actor.display_name, "Bob");
        assert_eq!(actor.role, RoleType::Staff);

        assert!(Authority::new(b"other").authorize(authority.issue_for(&member).unwrap()).is_err());
    }

    #[actix_web::test]
    async fn test_extractor() {
        let secret = b"secret";

        #[get("/")]
        async fn test_handler(actor: Actor) -> impl Responder {
            actor.id.to_string()
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(test_handler)
        ).await;

        {
            let forbidden_req = test::TestRequest::default()
                .uri("/")
                .insert_header(("Authorization", "JWT wrong"))
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        {
            let unauthorized_req = test::TestRequest::default()
                .uri("/")
                .to_request();

            let response = test::call_service(&app, unauthorized_req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        {
            let member = member(RoleType::Staff);
            let token = Authority::new(secret).issue_for(&member).unwrap();

            let authorized_req = test::TestRequest::default()
                .insert_header(("Authorization", format!("JWT {token}")))
                .to_request();

            let response = test::call_service(&app, authorized_req).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.into_body().try_into_bytes().unwrap(), member.id.to_string().as_bytes());
        }
    }

    #[actix_web::test]
    async fn test_admin_extractor() {
        let secret = b"secret";

        #[get("/")]
        async fn test_handler(admin: Admin) -> impl Responder {
            assert_eq!(admin.role, RoleType::Admin);

            ""
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(test_handler)
        ).await;

        for (role, status) in [(RoleType::Admin, StatusCode::OK), (RoleType::Staff, StatusCode::FORBIDDEN)] {
            let token = Authority::new(secret).issue_for(&member(role)).unwrap();

            let req = test::TestRequest::default()
                .insert_header(("Authorization", format!("JWT {token}")))
                .to_request();

            let response = test::call_service(&app, req).await;
            assert_eq!(response.status(), status);
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Data, PayloadConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use eventdesk_misc::api::event::{EVENT_DETAILS_PATH, EVENT_PATH, EVENT_REGISTRATIONS_PATH};
use eventdesk_misc::api::user::{GET_TOKEN_PATH, USER_PASSWORD_PATH, USER_PATH};
use eventdesk_misc::api::{Response, HEALTHZ_PATH};
use log::{info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use crate::context::ServerContext;
use crate::handlers::{event, healthz, registration, token, user};

pub struct RestfulServer {
    bind: String,
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<ServerContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    payload_limit_mib: u64,
}

impl RestfulServer {
    const DEFAULT_PAYLOAD_LIMIT_MIB: u64 = 2;

    pub fn new(bind: String, ctx: Arc<ServerContext>) -> Self {
        Self {
            bind,
            ssl: None,
            ctx,
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: Self::DEFAULT_PAYLOAD_LIMIT_MIB,
        }
    }

    pub fn set_ssl(&mut self, ssl: SslAcceptorBuilder) {
        self.ssl = Some(ssl);
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    pub fn set_payload_limit_mib(&mut self, payload_limit_mib: u64) {
        self.payload_limit_mib = payload_limit_mib;
    }

    pub async fn run(mut self) -> Result<()> {
        let ctx = Data::from(self.ctx.clone());
        let payload_limit = (self.payload_limit_mib * 1024 * 1024) as usize;
        let mut srv = HttpServer::new(move || {
            App::new()
                .app_data(ctx.clone())
                .app_data(PayloadConfig::new(payload_limit))
                .route(HEALTHZ_PATH, web::get().to(healthz::get_healthz_handler))
                .route(GET_TOKEN_PATH, web::post().to(token::get_token_handler))
                .service(
                    web::resource(USER_PATH)
                        .route(web::put().to(user::put_user_handler))
                        .route(web::get().to(user::get_user_handler))
                        .route(web::patch().to(user::patch_user_handler))
                        .route(web::delete().to(user::delete_user_handler)),
                )
                .route(
                    USER_PASSWORD_PATH,
                    web::patch().to(user::patch_password_handler),
                )
                .service(
                    web::resource(EVENT_PATH)
                        .route(web::put().to(event::put_event_handler))
                        .route(web::get().to(event::get_event_handler))
                        .route(web::patch().to(event::patch_event_handler))
                        .route(web::delete().to(event::delete_event_handler)),
                )
                .route(
                    EVENT_DETAILS_PATH,
                    web::patch().to(event::patch_event_details_handler),
                )
                .route(
                    EVENT_REGISTRATIONS_PATH,
                    web::get().to(registration::get_registrations_handler),
                )
                .default_service(web::route().to(Self::default_handler))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL). THIS IS DANGEROUS, DO NOT USE IN PRODUCTION");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting restful server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn default_handler(req: HttpRequest) -> HttpResponse {
        let message = format!("No route to {} {}", req.method(), req.uri().path());
        let resp: Response<()> = Response::not_found(message);
        HttpResponse::NotFound().json(resp)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, TestRequest};
    use eventdesk_misc::api::user::{Role, User};
    use eventdesk_misc::api::ListResponse;
    use eventdesk_misc::code;

    use crate::auth::tests::seed_users;

    use super::*;

    fn basic(email: &str, password: &str) -> String {
        format!("Basic {email}:{}", code::base64_encode(password))
    }

    #[actix_web::test]
    async fn test_routes() {
        let sc = Arc::new(ServerContext::new_test());
        seed_users(&sc);

        let app = test::init_service(
            App::new()
                .app_data(Data::from(sc.clone()))
                .service(
                    web::resource(USER_PATH)
                        .route(web::put().to(user::put_user_handler))
                        .route(web::get().to(user::get_user_handler)),
                )
                .route(
                    EVENT_REGISTRATIONS_PATH,
                    web::get().to(registration::get_registrations_handler),
                )
                .default_service(web::route().to(RestfulServer::default_handler)),
        )
        .await;

        let req = TestRequest::get()
            .uri("/v1/user?role=SOCIETY")
            .insert_header(("Authorization", basic("em@example.com", "em")))
            .to_request();
        let resp: Response<ListResponse<User>> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.data.unwrap().total, 2);

        let req = TestRequest::put()
            .uri("/v1/user")
            .insert_header(("Authorization", basic("music@example.com", "music")))
            .set_payload("username=x1&email=x1%40example.com&password=p&role=SOCIETY")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 403);

        let req = TestRequest::put()
            .uri("/v1/user")
            .insert_header(("Authorization", basic("em@example.com", "em")))
            .set_payload("username=x1&email=x1%40example.com&password=p&role=SOCIETY")
            .to_request();
        let resp: Response<User> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.data.unwrap().role, Role::Society);

        let req = TestRequest::get().uri("/v1/user").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);

        let req = TestRequest::get()
            .uri("/v1/event/registrations")
            .insert_header(("Authorization", basic("em@example.com", "em")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let req = TestRequest::get().uri("/v1/nothing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);
    }
}

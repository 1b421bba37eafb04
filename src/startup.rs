use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use actix_web::dev::Server;

use crate::auth::{AuthService, Clock, TokenCodec};
use crate::configuration::Settings;
use crate::error::AppError;
use crate::feed::{FeedService, PostEvents};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_post, delete_post, get_post, get_posts, get_status, health_check, log_in, log_out,
    refresh, sign_up, update_post, update_status,
};
use crate::store::{PostStore, UserStore};

/// Build the services over one store backend
pub fn build_services<S>(
    settings: &Settings,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
) -> (AuthService, FeedService)
where
    S: UserStore + PostStore + 'static,
{
    let codec = TokenCodec::new(&settings.jwt, clock);
    let auth = AuthService::new(store.clone(), codec, settings.auth.bcrypt_cost);
    let feed = FeedService::new(
        store.clone(),
        store,
        PostEvents::new(settings.feed.event_capacity),
        settings.feed.per_page,
    );
    (auth, feed)
}

pub fn run(
    listener: TcpListener,
    auth: AuthService,
    feed: FeedService,
) -> Result<Server, std::io::Error> {
    let codec = auth.codec().clone();
    let auth = web::Data::new(auth);
    let feed = web::Data::new(feed);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)
            .wrap(Logger::default())

            // Shared state
            .app_data(auth.clone())
            .app_data(feed.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(format!("Bad Request! {}", err)).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(format!("Bad Request! {}", err)).into()
            }))

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::put().to(sign_up))
            .route("/auth/login", web::post().to(log_in))
            .route("/auth/refresh-token", web::post().to(refresh))

            // Protected routes (require a valid access token)
            .service(
                web::resource("/auth/status")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route(web::get().to(get_status))
                    .route(web::patch().to(update_status)),
            )
            .service(
                web::resource("/auth/logout")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route(web::post().to(log_out)),
            )
            .service(
                web::scope("/feed")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route("/posts", web::get().to(get_posts))
                    .route("/post", web::post().to(create_post))
                    .service(
                        web::resource("/post/{post_id}")
                            .route(web::get().to(get_post))
                            .route(web::put().to(update_post))
                            .route(web::delete().to(delete_post)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

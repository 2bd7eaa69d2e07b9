use crate::{
    api::{attendance, forgot_timeout},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let attendance_limiter = Arc::new(build_limiter(config.rate_attendance_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // All routes sit behind the session middleware; token issuance is the
    // auth collaborator's problem.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance/time-in
                    .service(
                        web::resource("/time-in")
                            .wrap(attendance_limiter.clone())
                            .route(web::post().to(attendance::time_in)),
                    )
                    // /attendance/time-out
                    .service(
                        web::resource("/time-out")
                            .wrap(attendance_limiter.clone())
                            .route(web::put().to(attendance::time_out)),
                    )
                    // /attendance/check-location
                    .service(
                        web::resource("/check-location")
                            .route(web::get().to(attendance::check_location)),
                    )
                    // /attendance/blocks
                    .service(web::resource("/blocks").route(web::get().to(attendance::blocks)))
                    // /attendance/progress
                    .service(
                        web::resource("/progress").route(web::get().to(attendance::progress)),
                    ),
            )
            .service(
                web::scope("/forgot-timeout")
                    // /forgot-timeout
                    .service(
                        web::resource("")
                            .route(web::get().to(forgot_timeout::list))
                            .route(web::post().to(forgot_timeout::submit)),
                    )
                    // /forgot-timeout/{id}/resolve
                    .service(
                        web::resource("/{id}/resolve")
                            .route(web::put().to(forgot_timeout::resolve)),
                    ),
            ),
    );
}

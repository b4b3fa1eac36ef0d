use crate::{
    api::attendance,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    store::{AttendanceStore, EmployeeDirectory},
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst size");
    Governor::new(&cfg)
}

pub fn configure<S>(cfg: &mut web::ServiceConfig, config: Config)
where
    S: AttendanceStore + EmployeeDirectory + 'static,
{
    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    // /attendance/lateness?at=
                    .service(
                        web::resource("/lateness").route(web::get().to(attendance::lateness::<S>)),
                    )
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in::<S>)),
                    )
                    // /attendance/stats?date=
                    .service(web::resource("/stats").route(web::get().to(attendance::stats::<S>)))
                    // /attendance/{employee_id}/month?month=&year=
                    .service(
                        web::resource("/{employee_id}/month")
                            .route(web::get().to(attendance::month::<S>)),
                    )
                    // /attendance/{employee_id}/{date}
                    .service(
                        web::resource("/{employee_id}/{date}")
                            .route(web::get().to(attendance::day::<S>))
                            .route(web::put().to(attendance::mark::<S>)),
                    )
                    // /attendance/{employee_id}/{date}/correction
                    .service(
                        web::resource("/{employee_id}/{date}/correction")
                            .route(web::put().to(attendance::correct::<S>)),
                    ),
            ),
    );
}

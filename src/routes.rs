use crate::{
    api::{attendance, location, period, request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter settings, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimits {
    clock: LimiterConfig,
    protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            clock: build_limiter(config.rate_clock_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            .service(
                web::scope("/attendance")
                    // clocking has its own, tighter budget
                    .service(
                        web::resource("/clock-in")
                            .wrap(Governor::new(&limits.clock))
                            .route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out")
                            .wrap(Governor::new(&limits.clock))
                            .route(web::post().to(attendance::clock_out)),
                    )
                    .service(web::resource("/records").route(web::get().to(attendance::list_records)))
                    .service(web::resource("/status").route(web::get().to(attendance::status)))
                    .service(web::resource("/report").route(web::get().to(attendance::report))),
            )
            .service(
                web::scope("/locations")
                    // /locations
                    .service(
                        web::resource("")
                            .route(web::get().to(location::list_locations))
                            .route(web::post().to(location::create_location)),
                    )
                    // /locations/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(location::get_location))
                            .route(web::put().to(location::update_location))
                            .route(web::delete().to(location::delete_location)),
                    ),
            )
            .service(
                web::scope("/requests")
                    // /requests
                    .service(web::resource("").route(web::get().to(request::list_mine)))
                    .service(
                        web::resource("/corrections")
                            .route(web::post().to(request::create_correction)),
                    )
                    .service(web::resource("/leave").route(web::post().to(request::create_leave)))
                    .service(
                        web::resource("/overtime").route(web::post().to(request::create_overtime)),
                    )
                    // before /{id}
                    .service(web::resource("/inbox").route(web::get().to(request::inbox)))
                    .service(web::resource("/approvers").route(web::get().to(request::approvers)))
                    // /requests/{id}
                    .service(web::resource("/{id}").route(web::get().to(request::get_request)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(request::approve_request)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(request::reject_request)),
                    )
                    .service(
                        web::resource("/{id}/cancel").route(web::put().to(request::cancel_request)),
                    ),
            )
            .service(
                web::scope("/periods")
                    .service(web::resource("/containing").route(web::get().to(period::containing)))
                    .service(web::resource("/{year}/{month}").route(web::get().to(period::for_month)))
                    .service(web::resource("/{year}").route(web::get().to(period::for_year))),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_zero_and_large_budgets() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(30).is_ok());
        assert!(build_limiter(1_000_000).is_ok());
    }
}

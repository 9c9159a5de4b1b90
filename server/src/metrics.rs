//! Prometheus metrics & middleware helper.
//!
//! HTTP metrics come from the actix middleware at `/metrics`; matchmaking and
//! match counters live in their own registry, rendered at
//! `/api/metrics/matches`.

use actix_web::{get, web, HttpResponse, Responder};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Global Prometheus handle reused in tests.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics") // exposed URL
        .build()
        .expect("metrics builder")
});

pub static REGISTRY: Lazy<Registry> =
    Lazy::new(|| Registry::new_custom(Some("pong".into()), None).expect("pong registry"));

fn counter(name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("valid counter");
    if let Err(e) = REGISTRY.register(Box::new(c.clone())) {
        log::warn!("metric {name} not registered: {e}");
    }
    c
}

pub static MATCHES_CREATED: Lazy<IntCounter> =
    Lazy::new(|| counter("matches_created_total", "Matches created by pairing or challenges"));

pub static PAIRINGS_ABANDONED: Lazy<IntCounter> =
    Lazy::new(|| counter("pairings_abandoned_total", "Pairings skipped; players stay queued"));

pub static MATCHES_COMPLETED: Lazy<IntCounter> =
    Lazy::new(|| counter("matches_completed_total", "Matches finished by score or forfeit"));

#[get("/metrics/matches")]
pub async fn match_metrics() -> impl Responder {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buf) {
        log::warn!("metrics encode failed: {e}");
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buf)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(match_metrics);
}

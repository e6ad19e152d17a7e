//! One handler per row of the boundary request contract table: `POST
//! /api/ingest`, `GET /api/search`, `GET /api/histogram`, `GET /api/stats`,
//! `GET /api/context`.

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use engine::Context;
use ql::{Filter, Level, LogRow};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{map_engine_error, ApiError};
use crate::state::AppState;

fn now_ns() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_nanos() as i64
}

/// Checks only that an `Authorization` header is present, returning its
/// value (with a leading `Bearer ` stripped) to forward to peers. Validating
/// the credential is the session store's job, out of scope here.
fn auth_token(req: &HttpRequest) -> Result<String, ApiError> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer ").to_string())
        .ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Deserialize)]
struct IngestRow {
    #[serde(default)]
    timestamp: i64,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default = "default_service")]
    service: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(alias = "msg")]
    message: String,
    #[serde(default)]
    trace_id: Option<String>,
}

fn default_level() -> String {
    "INFO".to_string()
}

fn default_service() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngestBody {
    Single(IngestRow),
    Many(Vec<IngestRow>),
}

#[post("/api/ingest")]
async fn ingest(req: HttpRequest, body: web::Json<IngestBody>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth_token(&req)?;
    let engine = state.engine.as_ref().ok_or_else(|| ApiError::BadRequest("this node does not host an engine".to_string()))?;

    let rows = match body.into_inner() {
        IngestBody::Single(row) => vec![row],
        IngestBody::Many(rows) => rows,
    };
    let connection_host = req.peer_addr().map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string());

    let mut accepted = 0u64;
    for row in rows {
        let log_row = LogRow {
            timestamp: if row.timestamp == 0 { now_ns() } else { row.timestamp },
            level: Level::parse(&row.level),
            service: row.service,
            host: row.host.unwrap_or_else(|| connection_host.clone()),
            message: row.message,
            trace_id: row.trace_id,
        };
        engine.ingest(log_row).map_err(ApiError::Internal)?;
        accepted += 1;
    }
    engine.sync_wal().map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "ack": true, "accepted": accepted })))
}

fn min_time_default() -> i64 {
    i64::MIN
}

fn max_time_default() -> i64 {
    i64::MAX
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default = "min_time_default")]
    min_time: i64,
    #[serde(default = "max_time_default")]
    max_time: i64,
    level: Option<String>,
    service: Option<String>,
    host: Option<String>,
    query: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

impl SearchParams {
    fn into_filter(self) -> Filter {
        Filter {
            min_time: self.min_time,
            max_time: self.max_time,
            level: self.level.as_deref().map(Level::parse),
            service: self.service,
            host: self.host,
            query: self.query,
        }
    }
}

#[get("/api/search")]
async fn search(req: HttpRequest, params: web::Query<SearchParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = auth_token(&req)?;
    let params = params.into_inner();
    let limit = params.limit;
    let filter = params.into_filter();

    let rows = if let Some(engine) = &state.engine {
        engine.scan(&filter, limit).map_err(map_engine_error)?
    } else if let Some(aggregator) = &state.aggregator {
        aggregator.search(&filter, limit, Some(&token)).await
    } else {
        return Err(ApiError::BadRequest("node hosts neither an engine nor an aggregator".to_string()));
    };

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize)]
struct HistogramParams {
    start: i64,
    end: i64,
    interval: i64,
    level: Option<String>,
    service: Option<String>,
    host: Option<String>,
    query: Option<String>,
}

impl HistogramParams {
    fn into_filter(&self) -> Filter {
        Filter {
            min_time: self.start,
            max_time: self.end,
            level: self.level.as_deref().map(Level::parse),
            service: self.service.clone(),
            host: self.host.clone(),
            query: self.query.clone(),
        }
    }
}

#[get("/api/histogram")]
async fn histogram(req: HttpRequest, params: web::Query<HistogramParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = auth_token(&req)?;
    if params.interval <= 0 {
        return Err(ApiError::BadRequest("interval must be positive".to_string()));
    }
    let filter = params.into_filter();

    let buckets = if let Some(engine) = &state.engine {
        engine.histogram(params.start, params.end, params.interval, &filter).map_err(map_engine_error)?
    } else if let Some(aggregator) = &state.aggregator {
        aggregator.histogram(params.start, params.end, params.interval, &filter, Some(&token)).await
    } else {
        return Err(ApiError::BadRequest("node hosts neither an engine nor an aggregator".to_string()));
    };

    Ok(HttpResponse::Ok().json(buckets))
}

#[get("/api/stats")]
async fn stats(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = auth_token(&req)?;

    let stats = if let Some(engine) = &state.engine {
        engine.stats().map_err(ApiError::Internal)?
    } else if let Some(aggregator) = &state.aggregator {
        aggregator.stats(Some(&token)).await
    } else {
        return Err(ApiError::BadRequest("node hosts neither an engine nor an aggregator".to_string()));
    };

    Ok(HttpResponse::Ok().json(stats))
}

#[derive(Debug, Deserialize)]
struct ContextParams {
    ts: i64,
    service: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[get("/api/context")]
async fn context(req: HttpRequest, params: web::Query<ContextParams>, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    auth_token(&req)?;
    let engine = state.engine.as_ref().ok_or_else(|| ApiError::BadRequest("this node does not host an engine".to_string()))?;

    let ctx: Context = engine.context(params.ts, &params.service, params.limit).map_err(ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(ctx))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ingest).service(search).service(histogram).service(stats).service(context);
}

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::database::connection::DatabaseManager;
use crate::notifier::NotificationClass;
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub database: DatabaseHealth,
    pub subscribers: SubscriberStats,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub connection_pool_size: u32,
    pub response_time_ms: u64,
}

/// Chats subscribed to each notification class.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubscriberStats {
    pub fifteen_minutes: i64,
    pub one_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub start_time: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        let state = AppState {
            db,
            start_time: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check))
            .route("/health/live", get(liveness_check))
            .with_state(state);

        Self { router }
    }
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let start = std::time::Instant::now();

    // Test database connectivity
    let db_status = match test_database_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response_time_ms = start.elapsed().as_millis() as u64;
    let uptime = Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds() as u64;
    let subscribers = subscriber_counts(&state.db).await.unwrap_or_default();

    let health_response = HealthResponse {
        status: if db_status == "healthy" { "healthy".to_string() } else { "unhealthy".to_string() },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: db_status.to_string(),
            connection_pool_size: state.db.pool.size(),
            response_time_ms,
        },
        subscribers,
        uptime_seconds: uptime,
    };

    if health_response.status == "healthy" {
        Ok(Json(health_response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<&'static str>, StatusCode> {
    // Check if the service is ready to accept traffic
    match test_database_connection(&state.db).await {
        Ok(_) => Ok(Json("ready")),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn liveness_check() -> Json<&'static str> {
    // Simple liveness check - if this endpoint responds, the service is alive
    Json("alive")
}

async fn test_database_connection(db: &DatabaseManager) -> Result<(), sqlx::Error> {
    // Test database connectivity with a simple query
    sqlx::query("SELECT 1")
        .fetch_one(&db.pool)
        .await?;

    Ok(())
}

async fn subscriber_counts(db: &DatabaseManager) -> Result<SubscriberStats, sqlx::Error> {
    let fifteen_minutes = count_subscribed(db, NotificationClass::FifteenMinutes).await?;
    let one_minute = count_subscribed(db, NotificationClass::OneMinute).await?;
    Ok(SubscriberStats {
        fifteen_minutes,
        one_minute,
    })
}

async fn count_subscribed(
    db: &DatabaseManager,
    class: NotificationClass,
) -> Result<i64, sqlx::Error> {
    let query = match class {
        NotificationClass::FifteenMinutes => {
            "SELECT COUNT(*) FROM chats WHERE cl_notif_15m = 1 AND group_id IS NOT NULL"
        }
        NotificationClass::OneMinute => {
            "SELECT COUNT(*) FROM chats WHERE cl_notif_1m = 1 AND group_id IS NOT NULL"
        }
    };
    sqlx::query_scalar::<_, i64>(query).fetch_one(&db.pool).await
}

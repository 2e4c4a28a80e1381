use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;

use crate::entities::{district, order};
use crate::errors::ServiceError;
use crate::AppState;

use super::client_ip;

/// Every order is promised within a fixed 50-minute window.
const DELIVERY_OFFSET_MINUTES: i64 = 50;

/// Partial order body; `ip`, `order_time` and `expected_delivery_time` are
/// always assigned by the server.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub weight: f32,
    pub district_id: i32,
    #[serde(default)]
    pub delivery_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveredOrderQuery {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct OrdersByIpQuery {
    #[serde(rename = "distId")]
    pub dist_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct EarliestOrderQuery {
    #[serde(rename = "firstDeliveryDateTime")]
    pub first_delivery_date_time: DateTime<Utc>,
}

/// `GET /orders` — all orders, storage order.
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<order::Model>>, ServiceError> {
    let orders = order::Entity::find().all(state.db.as_ref()).await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<order::Model>, ServiceError> {
    let found = order::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order with id {} not found", id)))?;
    Ok(Json(found))
}

/// `POST /orders` — create an order; the origin IP and both timing fields are
/// stamped here, never taken from the body.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let now = Utc::now();
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let order = order::ActiveModel {
        weight: Set(request.weight),
        district_id: Set(request.district_id),
        order_time: Set(Some(now)),
        expected_delivery_time: Set(Some(now + Duration::minutes(DELIVERY_OFFSET_MINUTES))),
        delivery_time: Set(request.delivery_time),
        ip: Set(ip),
        ..Default::default()
    };

    let created = order.insert(state.db.as_ref()).await?;
    info!(
        order_id = created.order_id,
        district_id = created.district_id,
        weight = created.weight,
        "order created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/orders/{}", created.order_id))],
        Json(created),
    ))
}

/// `POST /delivered-order?id={id}` — complete a delivery. Any request body is
/// accepted and ignored.
pub async fn mark_delivered(
    State(state): State<AppState>,
    Query(query): Query<DeliveredOrderQuery>,
    _body: Option<Json<serde_json::Value>>,
) -> Result<StatusCode, ServiceError> {
    let db = state.db.as_ref();
    let delivered = order::Entity::find_by_id(query.id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order with id {} not found", query.id)))?;

    let mut active: order::ActiveModel = delivered.into();
    active.delivery_time = Set(Some(Utc::now()));
    let updated = active.update(db).await?;
    info!(
        order_id = updated.order_id,
        delivery_time = ?updated.delivery_time,
        "order delivered"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /orders/{id}`
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    let result = order::Entity::delete_by_id(id).exec(state.db.as_ref()).await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Order with id {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /deliver-Order/{ip}?distId={district_id}` — orders filtered by exact
/// IP and district. 404 when no order originates from the IP or the district
/// id is unknown.
pub async fn orders_by_ip(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Query(query): Query<OrdersByIpQuery>,
) -> Result<Json<Vec<order::Model>>, ServiceError> {
    let db = state.db.as_ref();

    order::Entity::find()
        .filter(order::Column::Ip.eq(ip.clone()))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No order originating from {}", ip)))?;

    district::Entity::find_by_id(query.dist_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("District with id {} not found", query.dist_id))
        })?;

    let orders = order::Entity::find()
        .filter(order::Column::DistrictId.eq(query.dist_id))
        .filter(order::Column::Ip.eq(ip))
        .all(db)
        .await?;
    info!(
        district_id = query.dist_id,
        count = orders.len(),
        "orders filtered by district and ip"
    );

    Ok(Json(orders))
}

/// `GET /delivery-Order/{districtId}?firstDeliveryDateTime={ts}` — the
/// earliest order matching a district id and an exact order time.
pub async fn earliest_order_for_district(
    State(state): State<AppState>,
    Path(district_id): Path<i32>,
    Query(query): Query<EarliestOrderQuery>,
) -> Result<Json<order::Model>, ServiceError> {
    let earliest = order::Entity::find()
        .filter(order::Column::DistrictId.eq(district_id))
        .filter(order::Column::OrderTime.eq(query.first_delivery_date_time))
        .order_by_asc(order::Column::OrderTime)
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No order in district {} at the requested time",
                district_id
            ))
        })?;
    info!(
        order_id = earliest.order_id,
        order_time = ?earliest.order_time,
        "earliest order for district"
    );

    Ok(Json(earliest))
}

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use tracing::info;

use crate::entities::district;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDistrictRequest {
    #[serde(default)]
    pub district_name: Option<String>,
}

/// Replacement body for `PUT /districts`; overwrites both fields of the
/// matching row, the id included.
#[derive(Debug, Deserialize)]
pub struct UpdateDistrictRequest {
    pub district_id: i32,
    #[serde(default)]
    pub district_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDistrictQuery {
    pub id: i32,
}

/// `GET /districts`
pub async fn list_districts(
    State(state): State<AppState>,
) -> Result<Json<Vec<district::Model>>, ServiceError> {
    let districts = district::Entity::find().all(state.db.as_ref()).await?;
    Ok(Json(districts))
}

/// `POST /districts`
pub async fn create_district(
    State(state): State<AppState>,
    Json(request): Json<CreateDistrictRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let district = district::ActiveModel {
        district_name: Set(request.district_name),
        ..Default::default()
    };

    let created = district.insert(state.db.as_ref()).await?;
    info!(
        district_id = created.district_id,
        district_name = ?created.district_name,
        "district created"
    );

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!("/districts/{}", created.district_id),
        )],
        Json(created),
    ))
}

/// `PUT /districts?id={id}` — overwrite id and name of the matching district.
pub async fn update_district(
    State(state): State<AppState>,
    Query(query): Query<UpdateDistrictQuery>,
    Json(update): Json<UpdateDistrictRequest>,
) -> Result<StatusCode, ServiceError> {
    let db = state.db.as_ref();

    district::Entity::find_by_id(query.id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("District with id {} not found", query.id)))?;

    // update_many so the primary key itself can be overwritten
    district::Entity::update_many()
        .col_expr(district::Column::DistrictId, Expr::value(update.district_id))
        .col_expr(
            district::Column::DistrictName,
            Expr::value(update.district_name),
        )
        .filter(district::Column::DistrictId.eq(query.id))
        .exec(db)
        .await?;
    info!(
        district_id = query.id,
        new_district_id = update.district_id,
        "district updated"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /districts/{id}`
pub async fn delete_district(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    let result = district::Entity::delete_by_id(id)
        .exec(state.db.as_ref())
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "District with id {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

use sqlx::PgPool;
use storage::{
    dto::sector::{CreateSectorRequest, SectorResponse},
    error::Result,
    services::catalog,
};

pub async fn list_sectors(pool: &PgPool) -> Result<Vec<SectorResponse>> {
    let sectors = catalog::list_sectors(pool).await?;
    Ok(sectors.into_iter().map(SectorResponse::from).collect())
}

pub async fn create_sector(pool: &PgPool, request: &CreateSectorRequest) -> Result<SectorResponse> {
    catalog::create_sector(pool, request).await.map(SectorResponse::from)
}

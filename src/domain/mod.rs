// Domain layer - Request-scoped values and pure query composition
pub mod cloud_mask;
pub mod expression;
pub mod geometry;
pub mod month;
pub mod raster_query;
pub mod responses;

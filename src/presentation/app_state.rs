// Application state for HTTP handlers
use crate::application::raster_service::RasterService;

#[derive(Clone)]
pub struct AppState {
    pub raster_service: RasterService,
}

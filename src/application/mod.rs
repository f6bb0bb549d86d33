// Application layer - Use cases and the seam to the imagery service
pub mod errors;
#[cfg(test)]
pub mod fake_client;
pub mod imagery_client;
pub mod raster_service;

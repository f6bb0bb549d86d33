// Use-case errors, independent of the HTTP layer
use crate::application::imagery_client::ImageryError;
use crate::domain::geometry::AoiError;
use crate::domain::month::DateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input is malformed; never retried
    #[error("{0}")]
    BadRequest(String),
    /// The imagery service failed the query; never retried
    #[error("Earth Engine error: {0}")]
    Upstream(#[from] ImageryError),
}

impl From<DateError> for ServiceError {
    fn from(err: DateError) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

impl From<AoiError> for ServiceError {
    fn from(err: AoiError) -> Self {
        ServiceError::BadRequest(format!("Invalid AOI format: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::AreaOfInterest;

    #[test]
    fn test_messages() {
        let err: ServiceError = DateError::InvalidFormat.into();
        assert_eq!(err.to_string(), "Dates must be in YYYY-MM format");

        let err: ServiceError = AreaOfInterest::parse("{").unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid AOI format: "));

        let err: ServiceError = ImageryError::Remote("User memory limit exceeded.".into()).into();
        assert_eq!(err.to_string(), "Earth Engine error: User memory limit exceeded.");
    }
}

//! Shared router state.

use crate::services::conversion_service::ConversionService;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub converter: ConversionService,

    /// Base URL advertised in the sitemap; derived from the request when unset.
    pub public_url: Option<String>,
}

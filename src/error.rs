use thiserror::Error;

/// Failures raised by the astronomy tool pipeline.
///
/// These surface to whichever agent invoked the tool; the gateway only
/// ever sees them folded into its internal-error response.
#[derive(Debug, Error)]
pub enum SunError {
    /// The geocoding search returned zero matches.
    #[error("could not find location '{0}'")]
    LocationNotFound(String),

    /// A downstream service failed, or its payload was missing the
    /// fields we need.
    #[error("upstream data unavailable: {0}")]
    Upstream(String),
}

//! Builders to construct an endpoint runtime from configuration.

use std::sync::Arc;

use crate::config::EndpointConfig;
use crate::core::EndpointError;
use crate::runtime::EndpointRuntime;
use crate::transport::PolicyTransport;

/// Validate `cfg`, then start a runtime on top of `transport`.
///
/// # Errors
///
/// `EndpointError::Config` for invalid configuration, otherwise whatever
/// [`EndpointRuntime::start`] reports.
pub fn build_runtime<T: PolicyTransport>(
    cfg: &EndpointConfig,
    transport: Arc<T>,
) -> Result<EndpointRuntime<T>, EndpointError> {
    cfg.validate().map_err(EndpointError::Config)?;
    EndpointRuntime::start(cfg, transport)
}

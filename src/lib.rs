use log::{debug, info};

use profile_api::{
    config::{Options, ParameterRegistry, ProfileConfig},
    error::{InternalError, ProfileError, ProfileResultExt, ReportError},
    graph::{ResourceGraph, ResourceGraphBuilder},
    rspec,
    validation::{self, ProfileParameters},
};

pub mod cli;
pub mod config;

pub const PROFILE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the parameters accepted with `options`.
pub fn parameters(options: &Options) -> Result<ParameterRegistry, ProfileError> {
    ParameterRegistry::for_options(options)
        .structured(InternalError::DeclareParameters)
        .message("Failed to declare profile parameters")
}

/// Binds and validates the parameters of `config`.
pub fn check(config: &ProfileConfig) -> Result<(Options, ProfileParameters), ProfileError> {
    let options = config
        .resolve_options()
        .message("Failed to resolve profile options")?;
    debug!("Using profile options: {options:?}");

    let set = parameters(&options)?
        .bind(&config.parameters)
        .map_err(|e| ProfileError::new(e))
        .message("Failed to bind profile parameters")?;

    let params = validation::validate(&set, &options)
        .map_err(|e| ProfileError::new(e))
        .message("Failed to validate profile parameters")?;

    Ok((options, params))
}

/// Builds and verifies the resource graph for `config`.
pub fn build(config: &ProfileConfig) -> Result<ResourceGraph, ProfileError> {
    let (options, params) = check(config)?;

    let graph = ResourceGraphBuilder::new(options).build(&params);
    graph
        .verify()
        .map_err(|e| ProfileError::new(InternalError::InvalidTopology(e)))
        .message("Built resource graph is inconsistent")?;

    Ok(graph)
}

/// Generates the request RSpec for `config`.
pub fn generate(config: &ProfileConfig) -> Result<String, ProfileError> {
    let graph = build(config)?;
    info!(
        "Generating request with {} node(s), {} LAN(s) and {} link(s)",
        graph.nodes.len() + graph.storage_devices.len(),
        graph.lans.len(),
        graph.links.len()
    );

    rspec::to_xml(&graph)
        .structured(InternalError::SerializeRspec)
        .message("Failed to generate request RSpec")
}

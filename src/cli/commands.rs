use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;

use crate::config::{load_config, AppConfig};
use crate::router::{normalize_path, Router};
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for inspecting a route configuration
#[derive(Parser, Debug)]
#[command(name = "edge-router")]
#[command(about = "Inspect and exercise an edge-router route table", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective retry policy, the error handlers and every route in declaration order
    Routes {
        /// Application configuration (YAML, JSON or TOML)
        #[arg(short, long, env = "EDGE_CONFIG")]
        config: PathBuf,
    },
    /// Resolve a path to its controller, action and arguments
    Resolve {
        #[arg(short, long, env = "EDGE_CONFIG")]
        config: PathBuf,

        /// HTTP method of the request
        #[arg(short, long, default_value = "GET", value_parser = parse_method)]
        method: Method,

        /// Request path, query string included
        path: String,
    },
    /// Build the URL that routes to a controller action
    Link {
        #[arg(short, long, env = "EDGE_CONFIG")]
        config: PathBuf,

        #[arg(long)]
        controller: String,

        #[arg(long)]
        action: String,

        #[arg(short, long, default_value = "GET", value_parser = parse_method)]
        method: Method,

        /// Named argument as `name=value`; repeatable. `anchor=#frag` is appended verbatim
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_uppercase().as_bytes()).map_err(|e| format!("invalid method `{s}`: {e}"))
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected `name=value`, got `{s}`"))
}

fn load_router(config: &Path) -> Result<(AppConfig, Router)> {
    let app = load_config(config)?;
    let router = Router::new(app.routes.clone())
        .with_context(|| format!("compiling routes of {}", config.display()))?;
    Ok((app, router))
}

/// Run a parsed command, writing its report to `out`.
///
/// Returns `Ok(false)` when the command ran but found nothing (unmapped path, no link).
pub fn run_cli(cli: Cli, out: &mut impl Write) -> Result<bool> {
    match cli.command {
        Commands::Routes { config } => {
            let (app, router) = load_router(&config)?;
            let retry = RuntimeConfig::from_env().apply(app.retry);
            writeln!(
                out,
                "# retry: max_attempts={} delay_us={}",
                retry.max_attempts, retry.delay_us
            )?;
            writeln!(
                out,
                "# handlers: not_found={}::{} server_error={}::{}",
                app.not_found.controller,
                app.not_found.action,
                app.server_error.controller,
                app.server_error.action
            )?;
            for (method, entries) in router.table().buckets() {
                for entry in entries {
                    write!(
                        out,
                        "{method:<7} {} -> {}::{}",
                        entry.pattern, entry.controller, entry.action
                    )?;
                    if let Some(acl) = &entry.acl {
                        write!(out, " [acl: {}]", acl.join(", "))?;
                    }
                    writeln!(out)?;
                }
            }
            Ok(true)
        }
        Commands::Resolve {
            config,
            method,
            path,
        } => {
            let (_, router) = load_router(&config)?;
            match router.resolve(&method, normalize_path(&path)) {
                Some(route) => {
                    writeln!(out, "Controller: {}", route.controller)?;
                    writeln!(out, "Action: {}", route.action)?;
                    writeln!(out, "Args: {:?}", route.args.as_slice())?;
                    writeln!(out, "Pattern: {}", route.pattern)?;
                    if let Some(acl) = &route.acl {
                        writeln!(out, "ACL: {}", acl.join(", "))?;
                    }
                    Ok(true)
                }
                None => {
                    writeln!(out, "{method} {path} is not mapped to any route")?;
                    Ok(false)
                }
            }
        }
        Commands::Link {
            config,
            controller,
            action,
            method,
            args,
        } => {
            let (_, router) = load_router(&config)?;
            let named: Vec<(&str, &str)> = args
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            match router.create_link(&controller, &action, &named, &method) {
                Some(url) => {
                    writeln!(out, "{url}")?;
                    Ok(true)
                }
                None => {
                    writeln!(out, "no {method} route targets {controller}::{action}")?;
                    Ok(false)
                }
            }
        }
    }
}

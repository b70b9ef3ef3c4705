//! API Explorer CLI - browse discovery documents and call API methods
//!
//! The service is read from a local discovery document (`--discovery`) or
//! fetched from the discovery service (`--api` and `--api-version`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use discovery::{bearer_header, ApiService, AuthState, DiscoveryParser, Schema};
use explorer_core::history::request_line;
use explorer_core::{
    ApiRequest, CompositionPolicy, Config, ConfigStore, Dispatcher, HistoryEntry,
    ValidationKind, ValidatorChain, API_KEY_PARAM, DEFAULT_BASE_URL,
};

/// API Explorer - construct and send calls to any method of a discovery-described API
#[derive(Parser, Debug)]
#[command(name = "api-explorer")]
#[command(version)]
#[command(about = "API Explorer - construct and send calls to discovery-described APIs")]
struct Args {
    /// Base URL requests are sent to
    #[arg(long, env = "API_EXPLORER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key appended to method requests as `key`
    #[arg(long, env = "API_EXPLORER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OAuth token used when fetching discovery documents
    #[arg(long, env = "API_EXPLORER_DISCOVERY_TOKEN", hide_env_values = true)]
    discovery_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Application name prefixed to the user agent
    #[arg(long)]
    app_name: Option<String>,

    /// Local discovery document
    #[arg(long)]
    discovery: Option<PathBuf>,

    /// API name to fetch from the discovery service
    #[arg(long)]
    api: Option<String>,

    /// API version to fetch from the discovery service
    #[arg(long = "api-version")]
    api_version: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List APIs known to the discovery service
    Apis,
    /// List the methods of the service
    Methods,
    /// Show a method's parameters and schemas
    Describe {
        /// Dotted method identifier (e.g. "url.get")
        method: String,
    },
    /// Print the URL a call would request, without sending it
    Path {
        method: String,
        /// Parameter as name=value; repeat for multiple values
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Call a method
    Call {
        method: String,
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Request body (JSON)
        #[arg(long)]
        body: Option<String>,
        /// OAuth access token for authorized calls
        #[arg(long, env = "API_EXPLORER_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
        /// Do not send the API key
        #[arg(long)]
        no_key: bool,
        /// Fill in declared default values for omitted parameters
        #[arg(long)]
        defaults: bool,
    },
    /// GET an explicit path relative to the base URL
    Get {
        /// Path including any query string
        path: String,
    },
}

fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got {}", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let store = ConfigStore::new(build_config(&args));
    let dispatcher = Dispatcher::new(store.clone())?;

    match &args.command {
        Command::Apis => list_apis(&store.snapshot()).await,
        Command::Get { path } => get_path(&dispatcher, path).await,
        Command::Methods => {
            let service = load_service(&args, &store.snapshot()).await?;
            list_methods(&service);
            Ok(())
        }
        Command::Describe { method } => {
            let service = load_service(&args, &store.snapshot()).await?;
            describe(&service, method)
        }
        Command::Path { method, params } => {
            let service = load_service(&args, &store.snapshot()).await?;
            let mut request = ApiRequest::new(service, method)?;
            for (name, value) in params {
                request.params.put(name.clone(), value.clone());
            }
            let config = store.snapshot();
            request.prepare(&config);
            println!("{}", request_line(&request, &config));
            Ok(())
        }
        Command::Call {
            method,
            params,
            body,
            access_token,
            no_key,
            defaults,
        } => {
            let service = load_service(&args, &store.snapshot()).await?;
            let mut request = ApiRequest::new(service.clone(), method)?;
            if *defaults {
                request.apply_defaults();
            }
            for (name, value) in params {
                request.params.put(name.clone(), value.clone());
            }
            if *no_key {
                request.set_use_api_key(false);
            }
            if let Some(token) = access_token {
                request
                    .headers
                    .insert("Authorization".to_string(), bearer_header(token));
            }
            request.body = body.clone();

            let state = AuthState::for_service(&service, access_token.is_some());
            info!("{}", state.description());

            report_validation(&request);
            call(&dispatcher, &mut request).await
        }
    }
}

fn build_config(args: &Args) -> Config {
    let mut config = Config {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        api_key: args.api_key.clone().unwrap_or_default(),
        discovery_auth_token: args.discovery_token.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    };
    if let Some(name) = &args.app_name {
        config.set_application_name(name);
    }
    config
}

async fn load_service(args: &Args, config: &Config) -> Result<Arc<ApiService>> {
    let service = if let Some(path) = &args.discovery {
        debug!("Reading discovery document from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        DiscoveryParser::parse(&content)?
    } else if let (Some(api), Some(version)) = (&args.api, &args.api_version) {
        let url = config.discovery_url(api, version);
        DiscoveryParser::fetch_and_parse(&url, config.discovery_auth_token.as_deref()).await?
    } else {
        bail!("Either --discovery or both --api and --api-version are required");
    };

    Ok(Arc::new(service))
}

async fn list_apis(config: &Config) -> Result<()> {
    let directory = DiscoveryParser::fetch_directory(
        &config.directory_url(),
        config.discovery_auth_token.as_deref(),
    )
    .await?;

    for item in &directory.items {
        let marker = if item.preferred { "*" } else { " " };
        println!(
            "{} {:<30} {:<10} {}",
            marker,
            item.name,
            item.version,
            item.title.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

fn list_methods(service: &ApiService) {
    for (id, method) in service.all_methods() {
        println!("{:<40} {:<7} {}", id, method.http_method, method.path);
    }
}

fn describe(service: &ApiService, identifier: &str) -> Result<()> {
    let method = match service.method(identifier) {
        Some(method) => method,
        None => bail!("Unknown method {}", identifier),
    };

    println!("{} {} {}", identifier, method.http_method, method.path);
    if let Some(description) = &method.description {
        println!("  {}", description);
    }

    println!("\nParameters:");
    for (name, param) in method.ordered_parameters() {
        let location = match param.location {
            Some(discovery::ParameterLocation::Path) => "path",
            _ => "query",
        };
        println!(
            "  {:<24} {:<8} {:<6} {}{}",
            name,
            param.param_type.as_deref().unwrap_or("string"),
            location,
            if param.required { "required " } else { "" },
            param
                .default
                .as_ref()
                .map(|d| format!("(default {})", d))
                .unwrap_or_default()
        );
    }

    if let Some(schema) = service.request_schema(method) {
        println!("\nRequest body:");
        print_schema(service, schema);
    }
    if let Some(schema) = service.response_schema(method) {
        println!("\nResponse body:");
        print_schema(service, schema);
    }
    if !method.scopes.is_empty() {
        println!("\nScopes:");
        for scope in &method.scopes {
            println!("  {}", scope);
        }
    }
    Ok(())
}

fn print_schema(service: &ApiService, schema: &Schema) {
    println!("  {}", schema.id.as_deref().unwrap_or("(anonymous)"));
    for (name, property, resolved) in service.resolver().property_schemas(schema) {
        let kind = match resolved {
            Some(target) => target.id.clone().unwrap_or_default(),
            None => property.property_type.clone().unwrap_or_default(),
        };
        println!("    {:<24} {}", name, kind);
    }
}

fn report_validation(request: &ApiRequest) {
    let method = match request.method() {
        Some(method) => method,
        None => return,
    };

    for (name, param) in method.ordered_parameters() {
        let chain = ValidatorChain::for_parameter(param, CompositionPolicy::CollectAll);
        for result in chain.validate(request.params.get(name)) {
            let message = result.message.unwrap_or_default();
            match result.kind {
                ValidationKind::Error => eprintln!("warning: {}: {}", name, message),
                ValidationKind::Info => eprintln!("note: {}: {}", name, message),
                ValidationKind::Valid => {}
            }
        }
    }

    for name in request.params.keys() {
        if name != API_KEY_PARAM && !method.parameters.contains_key(name) {
            eprintln!("note: {} is not a declared parameter", name);
        }
    }
}

async fn call(dispatcher: &Dispatcher, request: &mut ApiRequest) -> Result<()> {
    let started = Instant::now();
    let response = request.execute(dispatcher).await?;
    let entry = HistoryEntry::record(
        request,
        &dispatcher.config().snapshot(),
        response,
        started.elapsed(),
    );

    println!("{}", entry.request_text());
    if let Some(body) = &entry.request_body {
        println!("\n{}", body);
    }
    println!("\n{}  ({} ms)", entry.status_line(), entry.elapsed.as_millis());
    print!("{}", entry.response_headers_text());
    println!("\n{}", entry.response.body);

    if !entry.response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn get_path(dispatcher: &Dispatcher, path: &str) -> Result<()> {
    let mut request = ApiRequest::with_path(path)?;
    let response = request.execute(dispatcher).await?;

    println!("{}", response.status_line());
    println!("{}", response.body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("id=42").unwrap(),
            ("id".to_string(), "42".to_string())
        );
        assert_eq!(
            parse_param("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_param("flag=").unwrap().1, "");
        assert!(parse_param("noequals").is_err());
        assert!(parse_param("=value").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "api-explorer",
            "--discovery",
            "doc.json",
            "--api-key",
            "ABC",
            "call",
            "url.get",
            "-p",
            "shortUrl=http://goo.gl/x",
            "--no-key",
        ])
        .unwrap();

        let config = build_config(&args);
        assert_eq!(config.api_key, "ABC");
        match args.command {
            Command::Call { method, params, no_key, .. } => {
                assert_eq!(method, "url.get");
                assert_eq!(params[0].0, "shortUrl");
                assert!(no_key);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_config() {
        let args = Args::try_parse_from([
            "api-explorer",
            "--base-url",
            "https://example.com/",
            "--app-name",
            "demo",
            "--timeout-secs",
            "5",
            "methods",
        ])
        .unwrap();

        let config = build_config(&args);
        assert_eq!(config.base_url, "https://example.com");
        assert!(config.user_agent.starts_with("demo "));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}

use crate::config::Config;
use crate::executor::ScriptExecutor;
use bytes::Bytes;
use log::{error, info, trace, warn};
use std::collections::HashMap;
use std::convert::Infallible;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use warp::http::header::{HeaderValue, CONTENT_TYPE};
use warp::http::{Method, Response, StatusCode};
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

/// Every dispatch response, success or failure, is served as generic
/// markup regardless of what the script actually produced.
const DISPATCH_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("File not found")]
    MissingResource,
    #[error("File not executable")]
    PermissionDenied,
    #[error("Unsupported method")]
    UnsupportedMethod,
    #[error("CGI error: {0}")]
    Failed(#[from] anyhow::Error),
}

impl DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::MissingResource => StatusCode::NOT_FOUND,
            DispatchError::PermissionDenied => StatusCode::FORBIDDEN,
            DispatchError::UnsupportedMethod => StatusCode::NOT_IMPLEMENTED,
            DispatchError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct DispatchState {
    pub config: Config,
    pub executor: Arc<dyn ScriptExecutor>,
}

/// Builds the request routes: CGI-style dispatch under the reserved
/// prefix, static files from the document root everywhere else.
pub fn dispatch_routes(
    state: Arc<DispatchState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let document_root = state.config.document_root.clone();
    let state_filter = warp::any().map(move || state.clone());
    warp::path::full()
        .and(warp::method())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::bytes())
        .and(state_filter)
        .and_then(handle_dispatch)
        .or(warp::fs::dir(document_root))
}

/// Serves until the process is stopped. A failed dispatch never takes the
/// listener down with it.
pub async fn run_dispatch_server(config: Config, executor: Arc<dyn ScriptExecutor>) {
    info!(
        "run_dispatch_server - serving {} on port {}, dispatching under {}",
        config.document_root.display(),
        config.port,
        config.dispatch_prefix
    );
    let port = config.port;
    let state = Arc::new(DispatchState { config, executor });
    let routes = dispatch_routes(state).recover(handle_rejection);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

async fn handle_dispatch(
    path: FullPath,
    method: Method,
    content_type: Option<String>,
    body: Bytes,
    state: Arc<DispatchState>,
) -> Result<Response<Vec<u8>>, Rejection> {
    if !is_dispatch_path(path.as_str(), &state.config.dispatch_prefix) {
        return Err(warp::reject::reject());
    }
    trace!("handle_dispatch - {} {}", method, path.as_str());

    match dispatch_script(&state, path.as_str(), &method, content_type, body).await {
        Ok(response_body) => Ok(page(StatusCode::OK, response_body)),
        Err(e) => {
            warn!("handle_dispatch - {} {}: {}", method, path.as_str(), e);
            Ok(page(e.status_code(), e.to_string().into_bytes()))
        }
    }
}

async fn dispatch_script(
    state: &DispatchState,
    request_path: &str,
    method: &Method,
    content_type: Option<String>,
    body: Bytes,
) -> Result<Vec<u8>, DispatchError> {
    let script = resolve_request_path(&state.config.document_root, request_path)
        .ok_or(DispatchError::MissingResource)?;
    let metadata =
        std::fs::metadata(&script).map_err(|_| DispatchError::MissingResource)?;
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(DispatchError::PermissionDenied);
    }

    let mut env = HashMap::from([("REQUEST_METHOD".to_string(), method.to_string())]);
    let stdin = if *method == Method::GET {
        Vec::new()
    } else if *method == Method::POST {
        env.insert("CONTENT_LENGTH".to_string(), body.len().to_string());
        env.insert(
            "CONTENT_TYPE".to_string(),
            content_type.unwrap_or_default(),
        );
        body.to_vec()
    } else {
        return Err(DispatchError::UnsupportedMethod);
    };

    let output = state.executor.run(&script, env, stdin).await?;
    if let Some(code) = output.exit_code.filter(|code| *code != 0) {
        warn!(
            "dispatch_script - {} exited with status {}",
            script.display(),
            code
        );
    }

    let mut response_body = output.stdout;
    // POST responses carry stderr after stdout, matching the reference
    // harness; the executor keeps the streams separate.
    if *method == Method::POST && !output.stderr.is_empty() {
        response_body.extend_from_slice(&output.stderr);
    }
    Ok(response_body)
}

fn is_dispatch_path(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Maps the request path into the document root. Anything that would
/// escape the root resolves to nothing.
fn resolve_request_path(document_root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = document_root.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    if rejection
        .find::<warp::reject::MethodNotAllowed>()
        .is_some()
    {
        return Ok(page(
            StatusCode::NOT_IMPLEMENTED,
            b"Unsupported method".to_vec(),
        ));
    }
    if rejection.is_not_found() {
        return Ok(page(StatusCode::NOT_FOUND, b"File not found".to_vec()));
    }
    error!("handle_rejection - unhandled rejection: {:?}", rejection);
    Ok(page(
        StatusCode::INTERNAL_SERVER_ERROR,
        b"Internal server error".to_vec(),
    ))
}

fn page(status: StatusCode, body: Vec<u8>) -> Response<Vec<u8>> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(DISPATCH_CONTENT_TYPE));
    response
}

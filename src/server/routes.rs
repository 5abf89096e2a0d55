//! Request routing for the dashboard server.

use super::http::{Method, Request, Response};
use crate::models::ResultsDocument;
use crate::report::{assemble, read_results, render_dashboard, write_results, AssemblyOptions};
use crate::survey::SurveyStore;
use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Download file name offered by `/download/results`.
const DOWNLOAD_NAME: &str = "survey_results.json";

/// Everything a request handler needs, shared across connections.
#[derive(Debug)]
pub struct AppState {
    pub store: SurveyStore,
    /// Where the results document is read from and written to.
    pub results_path: PathBuf,
    pub options: AssemblyOptions,
    pub title: String,
}

impl AppState {
    /// Fresh document from the current snapshot.
    fn compute(&self) -> ResultsDocument {
        let table = self.store.snapshot();
        assemble(&table, &self.options, Utc::now())
    }

    /// Recompute and persist the document.
    fn refresh(&self) -> Result<ResultsDocument> {
        let doc = self.compute();
        write_results(&doc, &self.results_path)?;
        info!("Wrote {}", self.results_path.display());
        Ok(doc)
    }

    /// The persisted document, rebuilt when it is absent or unreadable.
    fn results(&self) -> Result<ResultsDocument> {
        match read_results(&self.results_path) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                debug!("recomputing results: {:#}", e);
                self.refresh()
            }
        }
    }
}

/// Route one request.
pub fn handle_request(state: &AppState, request: &Request) -> Response {
    debug!("{:?} {}", request.method, request.path);

    let method = match request.method {
        Method::Head => Method::Get,
        other => other,
    };

    match (method, request.path.as_str()) {
        (Method::Get, "/") => Response::html(render_dashboard(&state.compute(), &state.title)),
        (Method::Get, "/api/summary") => Response::json(&state.compute().summary),
        (Method::Get, "/api/results") => match state.results() {
            Ok(doc) => Response::json(&doc),
            Err(e) => failure(e),
        },
        (Method::Get, "/download/results") => match state.results() {
            Ok(doc) => Response::json(&doc).with_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", DOWNLOAD_NAME),
            ),
            Err(e) => failure(e),
        },
        (Method::Post, "/api/reload") => reload(state),
        (Method::Get | Method::Post, path) => {
            Response::error(404, &format!("no route for {}", path))
        }
        (_, path) => Response::error(405, &format!("method not allowed for {}", path)),
    }
}

fn reload(state: &AppState) -> Response {
    if let Err(e) = state.store.reload() {
        warn!("reload of {} failed: {}", state.store.input().display(), e);
        return Response::error(500, &e.to_string());
    }
    match state.refresh() {
        Ok(doc) => Response::json(&doc.meta),
        Err(e) => failure(e),
    }
}

fn failure(error: anyhow::Error) -> Response {
    warn!("request failed: {:#}", error);
    Response::error(500, &format!("{:#}", error))
}

//! Request/notification dispatch.
//!
//! Scoped down from a full language-server feature set to open/change/
//! close tracking with full-document sync, point-range diagnostics,
//! hover, and go-to-definition. No completion, rename, formatting, or
//! semantic tokens.

use anyhow::Result;
use lsp_server::{Notification, Request, RequestId, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, PublishDiagnostics,
};
use lsp_types::request::{GotoDefinition, HoverRequest};
use lsp_types::{PublishDiagnosticsParams, Uri};
use serde::{de::DeserializeOwned, Serialize};

use crate::document::DocumentManager;
use crate::providers::{definition, diagnostics, hover};

pub trait LspConnection {
    fn send_response(&self, response: Response) -> Result<()>;
    fn send_notification(&self, notification: Notification) -> Result<()>;
}

#[derive(Default)]
pub struct MessageHandler;

impl MessageHandler {
    pub fn new() -> Self {
        MessageHandler
    }

    pub fn handle_request<C: LspConnection>(&self, connection: &C, req: Request, workspace_root: &std::path::Path, documents: &DocumentManager) -> Result<()> {
        let req = match Self::cast_request::<HoverRequest>(req) {
            Ok((id, params)) => {
                let uri = &params.text_document_position_params.text_document.uri;
                let position = params.text_document_position_params.position;
                let result = documents.get(uri).and_then(|doc| hover::provide(workspace_root, uri, doc, position));
                connection.send_response(Response::new_ok(id, result))?;
                return Ok(());
            }
            Err(req) => req,
        };

        let req = match Self::cast_request::<GotoDefinition>(req) {
            Ok((id, params)) => {
                let uri = &params.text_document_position_params.text_document.uri;
                let position = params.text_document_position_params.position;
                let result = documents.get(uri).and_then(|doc| definition::provide(workspace_root, uri, doc, position));
                connection.send_response(Response::new_ok(id, result))?;
                return Ok(());
            }
            Err(req) => req,
        };

        let _ = req;
        Ok(())
    }

    pub fn handle_notification<C: LspConnection>(&self, connection: &C, not: Notification, workspace_root: &std::path::Path, documents: &mut DocumentManager) -> Result<()> {
        let not = match Self::cast_notification::<DidOpenTextDocument>(not) {
            Ok(params) => {
                let uri = params.text_document.uri.clone();
                documents.open(uri.clone(), params.text_document.text, params.text_document.version);
                self.publish_diagnostics(connection, workspace_root, &uri, documents)?;
                return Ok(());
            }
            Err(not) => not,
        };

        let not = match Self::cast_notification::<DidChangeTextDocument>(not) {
            Ok(params) => {
                let uri = params.text_document.uri.clone();
                documents.change(&uri, params.content_changes, params.text_document.version);
                self.publish_diagnostics(connection, workspace_root, &uri, documents)?;
                return Ok(());
            }
            Err(not) => not,
        };

        let _not = match Self::cast_notification::<DidCloseTextDocument>(not) {
            Ok(params) => {
                let uri = params.text_document.uri.clone();
                documents.close(&uri);
                Self::send_notification::<PublishDiagnostics>(
                    connection,
                    PublishDiagnosticsParams { uri, diagnostics: vec![], version: None },
                )?;
                return Ok(());
            }
            Err(not) => not,
        };

        Ok(())
    }

    fn publish_diagnostics<C: LspConnection>(&self, connection: &C, workspace_root: &std::path::Path, uri: &Uri, documents: &DocumentManager) -> Result<()> {
        if let Some(document) = documents.get(uri) {
            let diags = diagnostics::provide(workspace_root, uri, document);
            Self::send_notification::<PublishDiagnostics>(
                connection,
                PublishDiagnosticsParams { uri: uri.clone(), diagnostics: diags, version: None },
            )?;
        }
        Ok(())
    }

    fn cast_request<R>(req: Request) -> std::result::Result<(RequestId, R::Params), Request>
    where
        R: lsp_types::request::Request,
        R::Params: DeserializeOwned,
    {
        match req.extract(R::METHOD) {
            Ok(params) => Ok(params),
            Err(lsp_server::ExtractError::MethodMismatch(req)) => Err(req),
            Err(lsp_server::ExtractError::JsonError { method, error }) => {
                tracing::error!("failed to deserialize request {}: {}", method, error);
                Err(Request::new(RequestId::from(0), method.to_string(), serde_json::Value::Null))
            }
        }
    }

    fn cast_notification<N>(not: Notification) -> std::result::Result<N::Params, Notification>
    where
        N: lsp_types::notification::Notification,
        N::Params: DeserializeOwned,
    {
        match not.extract(N::METHOD) {
            Ok(params) => Ok(params),
            Err(lsp_server::ExtractError::MethodMismatch(not)) => Err(not),
            Err(lsp_server::ExtractError::JsonError { method, error }) => {
                tracing::error!("failed to deserialize notification {}: {}", method, error);
                Err(Notification::new(method.to_string(), serde_json::Value::Null))
            }
        }
    }

    fn send_notification<N>(connection: &impl LspConnection, params: N::Params) -> Result<()>
    where
        N: lsp_types::notification::Notification,
        N::Params: Serialize,
    {
        connection.send_notification(Notification::new(N::METHOD.to_string(), params))
    }
}

//! The Anchor editor-protocol server: a JSON-RPC server
//! over stdio that re-lexes, re-parses, and re-analyzes an open document
//! on every edit and reports diagnostics, hover, and go-to-definition.
//!
//! There is deliberately no incremental analysis state shared across
//! requests beyond the raw document text — see `analysis` for why.

#![allow(deprecated)]

pub mod analysis;
pub mod document;
pub mod message_handler;
pub mod providers;

use std::path::PathBuf;

use anyhow::Result;
use lsp_server::{Connection, Message, Notification, Response};
use lsp_types::{
    HoverProviderCapability, InitializeParams, OneOf, ServerCapabilities,
    TextDocumentSyncCapability, TextDocumentSyncKind,
};

use document::DocumentManager;
use message_handler::{LspConnection, MessageHandler};

struct ConnectionWrapper<'a>(&'a Connection);

impl LspConnection for ConnectionWrapper<'_> {
    fn send_response(&self, response: Response) -> Result<()> {
        self.0.sender.send(Message::Response(response))?;
        Ok(())
    }

    fn send_notification(&self, notification: Notification) -> Result<()> {
        self.0.sender.send(Message::Notification(notification))?;
        Ok(())
    }
}

/// Enters the stdio JSON-RPC loop, analyzing documents relative to
/// `workspace_root` until the client sends `shutdown`/`exit`.
pub fn run(workspace_root: PathBuf) -> Result<()> {
    let (connection, io_threads) = Connection::stdio();

    let capabilities = serde_json::to_value(ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        ..Default::default()
    })?;

    let initialization_params = connection.initialize(capabilities)?;
    let _params: InitializeParams = serde_json::from_value(initialization_params)?;

    main_loop(&connection, &workspace_root)?;
    io_threads.join()?;
    Ok(())
}

fn main_loop(connection: &Connection, workspace_root: &std::path::Path) -> Result<()> {
    let mut documents = DocumentManager::new();
    let handler = MessageHandler::new();
    let wrapper = ConnectionWrapper(connection);

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    return Ok(());
                }
                handler.handle_request(&wrapper, req, workspace_root, &documents)?;
            }
            Message::Notification(not) => {
                handler.handle_notification(&wrapper, not, workspace_root, &mut documents)?;
            }
            Message::Response(_) => {}
        }
    }
    Ok(())
}

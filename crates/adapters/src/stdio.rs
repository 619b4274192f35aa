// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directives written as JSON lines for a head running without a broker

use async_trait::async_trait;
use cm_core::{ChannelError, Directive, HeadChannel};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes one JSON directive per line.
///
/// Factories (or the operator) read the stream; the `channel` field of each
/// line tells which of them the directive is meant for.
pub struct StdoutHeadChannel<W = tokio::io::Stdout> {
    out: Mutex<W>,
}

impl StdoutHeadChannel {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutHeadChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StdoutHeadChannel<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> HeadChannel for StdoutHeadChannel<W> {
    async fn publish_directive(&self, directive: &Directive) -> Result<(), ChannelError> {
        let mut line = serde_json::to_vec(directive)?;
        line.push(b'\n');
        let failed = |e: std::io::Error| ChannelError::PublishFailed {
            channel: directive.channel.clone(),
            message: e.to_string(),
        };
        let mut out = self.out.lock().await;
        out.write_all(&line).await.map_err(failed)?;
        out.flush().await.map_err(failed)
    }
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

use crate::errors::Result;
use crate::report::Report;
use crate::xfer::{Publisher, encode_frame};

/// Frames a subscriber may fall behind by before the oldest are dropped.
const SUBSCRIBER_QUEUE_LEN: usize = 8;

/// Publishes reports to every app connected to a TCP listener.
///
/// Each report is encoded once and fanned out through a broadcast channel.
/// A subscriber that cannot keep up loses its oldest pending reports, and
/// one that stops reading altogether is still released by [`Publisher::close`].
pub struct TcpPublisher {
    local_addr: SocketAddr,
    frames: broadcast::Sender<Arc<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

impl TcpPublisher {
    /// Binds the listener and starts accepting subscribers. Must be called
    /// from within a tokio runtime.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (frames, _) = broadcast::channel(SUBSCRIBER_QUEUE_LEN);
        let (closed, _) = watch::channel(false);

        tokio::spawn(accept_loop(listener, frames.clone(), closed.subscribe()));
        info!("publishing reports on {local_addr}");

        Ok(Self {
            local_addr,
            frames,
            closed,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.frames.receiver_count()
    }
}

impl Publisher for TcpPublisher {
    fn publish(&self, report: Report) {
        if *self.closed.borrow() {
            debug!("publisher closed, dropping report");
            return;
        }

        let frame = match encode_frame(&report) {
            Ok(frame) => frame,
            Err(e) => {
                error!("dropping report: {e}");
                return;
            }
        };
        // Fails only when nobody is subscribed.
        if self.frames.send(Arc::new(frame)).is_err() {
            debug!("no subscribers, report dropped");
        }
    }

    fn close(&self) {
        if !self.closed.send_replace(true) {
            info!("publisher on {} closed", self.local_addr);
        }
    }
}

impl Drop for TcpPublisher {
    fn drop(&mut self) {
        self.close();
    }
}

async fn accept_loop(
    listener: TcpListener,
    frames: broadcast::Sender<Arc<Vec<u8>>>,
    mut closed: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = closed.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("subscriber {peer} connected");
                    tokio::spawn(serve_subscriber(stream, peer, frames.subscribe(), closed.clone()));
                }
                Err(e) => warn!("accept failed: {e}"),
            },
        }
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    peer: SocketAddr,
    mut frames: broadcast::Receiver<Arc<Vec<u8>>>,
    mut closed: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            _ = closed.changed() => break,
            frame = frames.recv() => frame,
        };
        match frame {
            Ok(frame) => {
                // A peer that stopped reading blocks the write, not close.
                let written = tokio::select! {
                    _ = closed.changed() => break,
                    written = stream.write_all(&frame) => written,
                };
                if let Err(e) = written {
                    info!("subscriber {peer} disconnected: {e}");
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("subscriber {peer} is too slow, dropped {skipped} oldest reports");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("stopped serving subscriber {peer}");
}

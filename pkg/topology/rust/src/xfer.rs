// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Moving reports from probes to apps.
//!
//! On the wire a report is a 4-byte big-endian length followed by the
//! report encoded as MessagePack with field names, so either side may add
//! fields without breaking the other.

pub mod collector;
pub mod publisher;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{Error, Result};
use crate::report::Report;

pub use collector::Collector;
pub use publisher::TcpPublisher;

pub const DEFAULT_PROBE_PORT: u16 = 4030;

/// Largest accepted frame body.
pub const MAX_FRAME_LEN: usize = 64 << 20;

/// Hands reports to whoever is listening. Neither call may block on a slow
/// consumer.
pub trait Publisher: Send + Sync {
    fn publish(&self, report: Report);

    /// Stops publishing. Calling it again has no effect.
    fn close(&self);
}

/// Encodes `report` as a complete frame, length prefix included.
pub fn encode_frame(report: &Report) -> Result<Vec<u8>> {
    let body = rmp_serde::to_vec_named(report)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decodes a frame body, as returned by [`read_frame`].
pub fn decode_report(body: &[u8]) -> Result<Report> {
    Ok(rmp_serde::from_slice(body)?)
}

/// Reads the next frame body. Returns `None` when the peer closed the
/// stream between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    if reader.read(&mut header[..1]).await? == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut header[1..]).await?;

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

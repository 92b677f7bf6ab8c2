use crate::common::{IntMatrix, WireResult};
use crate::config::OutboundFraming;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Mirror of the inbound matrix frame. Used by the planner side.
pub async fn write_matrix<W: AsyncWrite + Unpin>(writer: &mut W, matrix: &IntMatrix) -> WireResult<()> {
    let mut out = Vec::with_capacity(8 + matrix.as_slice().len() * 4);
    out.extend_from_slice(&(matrix.rows() as i32).to_le_bytes());
    out.extend_from_slice(&(matrix.cols() as i32).to_le_bytes());
    for value in matrix.as_slice() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_string_list<W: AsyncWrite + Unpin>(
    writer: &mut W,
    tokens: &[String],
) -> WireResult<()> {
    let text = tokens.join(",");
    let mut out = Vec::with_capacity(4 + text.len());
    out.extend_from_slice(&(text.len() as i32).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}

/// Comma-joined decimal integers, no spaces, no terminator.
pub fn int_csv(values: &[i32]) -> String {
    values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub async fn write_int_csv<W: AsyncWrite + Unpin>(
    writer: &mut W,
    values: &[i32],
    framing: OutboundFraming,
) -> WireResult<()> {
    let text = int_csv(values);
    let mut out = Vec::with_capacity(4 + text.len());
    if framing == OutboundFraming::LengthPrefixed {
        out.extend_from_slice(&(text.len() as i32).to_le_bytes());
    }
    out.extend_from_slice(text.as_bytes());
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}

/// Outbound side of the planner link.
pub struct FrameWriter<W> {
    inner: W,
    framing: OutboundFraming,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    pub fn new(inner: W, framing: OutboundFraming) -> Self {
        Self { inner, framing }
    }

    pub async fn send_durations(&mut self, encoded: &[i32]) -> WireResult<()> {
        tracing::debug!(payload = %int_csv(encoded), "sending durations");
        write_int_csv(&mut self.inner, encoded, self.framing).await
    }

    pub async fn send_ack(&mut self, iteration: u32) -> WireResult<()> {
        tracing::debug!(iteration, "sending ack");
        write_int_csv(&mut self.inner, &[iteration as i32], self.framing).await
    }

    pub async fn shutdown(&mut self) -> WireResult<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

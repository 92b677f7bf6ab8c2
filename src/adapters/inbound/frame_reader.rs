use crate::common::{IntMatrix, WireError, WireResult};
use crate::config::{OutboundFraming, ProtocolConfig};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

/// Largest single read for an unprefixed integer list.
const LEGACY_READ_CHUNK: usize = 4096;

/// Fills `buf` completely or reports how many bytes arrived before EOF.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> WireResult<()> {
    let mut received = 0;
    while received < buf.len() {
        let n = reader.read(&mut buf[received..]).await?;
        if n == 0 {
            return Err(WireError::TruncatedStream {
                expected: buf.len(),
                received,
            });
        }
        received += n;
    }
    Ok(())
}

async fn read_i32_le<R: AsyncRead + Unpin>(reader: &mut R) -> WireResult<i32> {
    let mut raw = [0u8; 4];
    read_full(reader, &mut raw).await?;
    Ok(i32::from_le_bytes(raw))
}

/// `int32 rows, int32 cols`, then `rows * cols` little-endian int32 values, row-major.
pub async fn read_matrix<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_elements: usize,
) -> WireResult<IntMatrix> {
    let mut header = [0u8; 8];
    read_full(reader, &mut header).await?;
    let rows = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let cols = i32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let (r, c) = match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(r), Ok(c)) => (r, c),
        _ => return Err(WireError::InvalidHeader { rows, cols }),
    };
    let elements = r
        .checked_mul(c)
        .ok_or(WireError::InvalidHeader { rows, cols })?;
    if elements > max_elements {
        return Err(WireError::FrameTooLarge {
            elements,
            limit: max_elements,
        });
    }

    let mut payload = vec![0u8; elements * 4];
    read_full(reader, &mut payload).await?;
    let data = payload
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    IntMatrix::new(r, c, data).ok_or(WireError::InvalidHeader { rows, cols })
}

async fn read_prefixed_text<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> WireResult<String> {
    let length = read_i32_le(reader).await?;
    let length = usize::try_from(length).map_err(|_| WireError::InvalidLength(length))?;
    if length > max_bytes {
        return Err(WireError::FrameTooLarge {
            elements: length,
            limit: max_bytes,
        });
    }
    let mut payload = vec![0u8; length];
    read_full(reader, &mut payload).await?;
    String::from_utf8(payload).map_err(|_| WireError::InvalidUtf8)
}

/// `int32 byteLength`, then UTF-8 text split on `,`. Empty segments are kept.
pub async fn read_string_list<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> WireResult<Vec<String>> {
    let text = read_prefixed_text(reader, max_bytes).await?;
    Ok(text.split(',').map(str::to_string).collect())
}

fn parse_int_csv(text: &str) -> WireResult<Vec<i32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|t| {
            t.trim()
                .parse::<i32>()
                .map_err(|_| WireError::InvalidInteger(t.to_string()))
        })
        .collect()
}

/// Reads a comma-joined integer list sent with the given framing.
///
/// Unprefixed lists carry no length, so whatever one read returns is taken as
/// the whole list. The exchange is strictly request/response, so nothing else
/// is in flight at that point.
pub async fn read_int_csv<R: AsyncRead + Unpin>(
    reader: &mut R,
    framing: OutboundFraming,
    max_bytes: usize,
) -> WireResult<Vec<i32>> {
    let text = match framing {
        OutboundFraming::LengthPrefixed => read_prefixed_text(reader, max_bytes).await?,
        OutboundFraming::LegacyCsv => {
            let mut buf = vec![0u8; LEGACY_READ_CHUNK.min(max_bytes.max(1))];
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Err(WireError::TruncatedStream {
                    expected: 1,
                    received: 0,
                });
            }
            buf.truncate(n);
            String::from_utf8(buf).map_err(|_| WireError::InvalidUtf8)?
        }
    };
    parse_int_csv(&text)
}

/// Timeout and cancellation around a single frame read.
async fn guarded<T>(
    frame: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
    read: impl Future<Output = WireResult<T>>,
) -> WireResult<T> {
    let bounded = async {
        match timeout {
            Some(after) => match tokio::time::timeout(after, read).await {
                Ok(result) => result,
                Err(_) => Err(WireError::Timeout {
                    frame: frame.to_string(),
                    after,
                }),
            },
            None => read.await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WireError::Cancelled { frame: frame.to_string() }),
        result = bounded => result,
    }
}

/// Inbound side of the planner link.
pub struct FrameReader<R> {
    inner: R,
    timeout: Option<Duration>,
    max_elements: usize,
    cancel: CancellationToken,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    pub fn new(inner: R, protocol: &ProtocolConfig, cancel: CancellationToken) -> Self {
        Self {
            inner,
            timeout: protocol.read_timeout(),
            max_elements: protocol.max_frame_elements,
            cancel,
        }
    }

    pub async fn receive_matrix(&mut self, frame: &str) -> WireResult<IntMatrix> {
        let read = read_matrix(&mut self.inner, self.max_elements);
        let matrix = guarded(frame, self.timeout, &self.cancel, read).await?;
        tracing::debug!(frame, rows = matrix.rows(), cols = matrix.cols(), "received\n{}", matrix);
        Ok(matrix)
    }

    pub async fn receive_string_list(&mut self, frame: &str) -> WireResult<Vec<String>> {
        let read = read_string_list(&mut self.inner, self.max_elements);
        let tokens = guarded(frame, self.timeout, &self.cancel, read).await?;
        tracing::debug!(frame, ?tokens, "received");
        Ok(tokens)
    }

    pub async fn receive_int_list(
        &mut self,
        frame: &str,
        framing: OutboundFraming,
    ) -> WireResult<Vec<i32>> {
        let read = read_int_csv(&mut self.inner, framing, self.max_elements);
        guarded(frame, self.timeout, &self.cancel, read).await
    }
}

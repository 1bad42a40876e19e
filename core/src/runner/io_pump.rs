use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

/// Optional mirror of child output to the parent terminal, one prefixed
/// line at a time so parallel checks do not interleave mid-line.
#[derive(Debug, Clone)]
pub struct Echo {
    pub prefix: String,
    /// Mirror child stdout onto our stderr, keeping our stdout clean for
    /// machine-readable output.
    pub stdout_to_stderr: bool,
}

pub fn pump_stdout<R>(rd: R, ring: Arc<RingBytes>, echo: Option<Echo>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    match echo {
        Some(e) if e.stdout_to_stderr => pump(rd, tokio::io::stderr(), ring, "stdout", Some(e)),
        echo => pump(rd, tokio::io::stdout(), ring, "stdout", echo),
    }
}

pub fn pump_stderr<R>(rd: R, ring: Arc<RingBytes>, echo: Option<Echo>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, tokio::io::stderr(), ring, "stderr", echo)
}

fn pump<R, W>(
    mut rd: R,
    mut wr: W,
    ring: Arc<RingBytes>,
    label: &'static str,
    echo: Option<Echo>,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }

            ring.push(&buf[..n]);
            total += n as u64;

            let Some(echo) = echo.as_ref() else {
                continue;
            };
            line_buf.extend_from_slice(&buf[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                write_prefixed(&mut wr, &echo.prefix, &one, label).await?;
            }
        }

        // EOF flush: deliver the last partial line if it doesn't end with '\n'.
        if let Some(echo) = echo.as_ref() {
            trim_newline(&mut line_buf);
            if !line_buf.is_empty() {
                write_prefixed(&mut wr, &echo.prefix, &line_buf, label).await?;
            }
        }

        Ok(total)
    })
}

async fn write_prefixed<W>(
    wr: &mut W,
    prefix: &str,
    line: &[u8],
    label: &'static str,
) -> Result<(), RunnerError>
where
    W: AsyncWrite + Unpin,
{
    let mut out = Vec::with_capacity(prefix.len() + line.len() + 4);
    out.push(b'[');
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(b"] ");
    out.extend_from_slice(line);
    out.push(b'\n');
    wr.write_all(&out).await.map_err(|e| RunnerError::StreamIo {
        stream: label,
        source: e,
    })?;
    wr.flush().await.map_err(|e| RunnerError::StreamIo {
        stream: label,
        source: e,
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

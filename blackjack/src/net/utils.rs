use std::time::Duration;

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};

use super::{
    errors::{ProtocolError, Result},
    messages::WireMessage,
};

/// Reads exactly one fixed-length record and decodes it.
///
/// A read that doesn't complete within `deadline` fails with
/// [`ProtocolError::Timeout`]. A peer hanging up mid-record fails with
/// [`ProtocolError::ConnectionClosed`].
pub async fn read_message<T, R>(reader: &mut R, deadline: Duration) -> Result<T>
where
    T: WireMessage,
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0; T::KIND.size()];
    read_exact_within(reader, &mut buf, deadline).await?;
    T::decode(&buf)
}

/// Encodes a record and writes it in one chunk.
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<()>
where
    T: WireMessage,
    W: AsyncWrite + Unpin,
{
    let buf = message.encode()?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Fills `buf` from `reader` or fails once `deadline` has elapsed.
pub async fn read_exact_within<R>(reader: &mut R, buf: &mut [u8], deadline: Duration) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match timeout(deadline, reader.read_exact(buf)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(error)) => Err(error.into()),
        Err(_) => Err(ProtocolError::Timeout(deadline)),
    }
}

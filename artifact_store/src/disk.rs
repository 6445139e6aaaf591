use std::io;

use async_compression::tokio::bufread::GzipDecoder;
use bytes::Bytes;
use futures::{
    stream::{self, BoxStream},
    StreamExt,
    TryStreamExt,
};
use tokio::{fs::File, io::BufReader};
use tokio_util::io::ReaderStream;
use tracing::error;

/// Size of the chunks read from disk and handed to the response body.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Streams the file's bytes unchanged.
pub fn raw_stream(file: File) -> ByteStream {
    ReaderStream::with_capacity(file, CHUNK_SIZE).boxed()
}

/// Streams the gzip-decompressed content of `file`.
///
/// The first chunk is decoded before this returns, so a file that is not gzip
/// data fails here rather than halfway through a response. Decoding happens
/// on the polling task; a slow reader only leaves the stream unpolled.
pub async fn inflate_stream(file: File) -> io::Result<ByteStream> {
    let mut decoder = GzipDecoder::new(BufReader::with_capacity(CHUNK_SIZE, file));
    decoder.multiple_members(true);
    let mut inflated = ReaderStream::with_capacity(decoder, CHUNK_SIZE);

    let first = match inflated.next().await {
        None => return Ok(stream::empty().boxed()),
        Some(first) => first?,
    };
    let rest = inflated.inspect_err(|e| error!("error decompressing artifact: {}", e));
    Ok(stream::once(async move { Ok(first) }).chain(rest).boxed())
}

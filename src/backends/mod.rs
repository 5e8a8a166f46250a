//! Backend invokers for the two completion providers

pub mod openai;
pub mod tromero;

use futures::Stream;
use futures::TryStreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_stream::wrappers::LinesStream;

/// Convert a streaming HTTP response body into a line stream
///
/// Buffering happens at line granularity, so a frame split across TCP reads
/// is reassembled before decoding. Dropping the returned stream drops the
/// response and releases the connection.
pub(crate) fn response_lines(
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, std::io::Error>> + Send {
    let byte_stream = response.bytes_stream().map_err(std::io::Error::other);
    let reader = tokio_util::io::StreamReader::new(byte_stream);
    let buf_reader = tokio::io::BufReader::new(reader);
    LinesStream::new(buf_reader.lines())
}

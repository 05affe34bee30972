// src/stream/sources.rs

//! Constructors for [`LineStream`].
//!
//! Each constructor states whether its source can be streamed again. A
//! restartable source is restarted by calling the constructor again with the
//! same input; an existing handle never rewinds.

use std::io;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::{LineStream, Source};

impl LineStream {
    /// A stream that is exhausted from the start.
    pub fn empty() -> Self {
        Self::from_source(Source::Empty)
    }

    /// Stream an in-memory list of lines, in order.
    ///
    /// Restartable: build another stream from the same list.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_source(Source::Memory(lines.into_iter().map(Into::into).collect()))
    }

    /// Split `text` into lines on `\n` (a preceding `\r` is dropped too).
    ///
    /// A trailing newline does not produce an extra empty line. Restartable
    /// by splitting the same text again.
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.lines())
    }

    /// Read lines lazily from any async reader (a pipe, socket, file...).
    ///
    /// Not restartable: bytes consumed from the reader are gone. A final line
    /// without a trailing newline is still produced.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let boxed: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self::from_source(Source::Reader(BufReader::new(boxed).lines()))
    }

    /// Open `path` and stream its lines.
    ///
    /// The file is read incrementally, never loaded whole. Restartable by
    /// opening the path again (subject to the file changing underneath).
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Ok(Self::from_reader(file))
    }

    /// Pull lines from a closure until it returns `None`.
    ///
    /// Suited to generated and infinite sources. Restartability is whatever
    /// the closure provides; returning `Some(Err(_))` ends the stream with
    /// that error.
    pub fn from_fn<F>(next: F) -> Self
    where
        F: FnMut() -> Option<io::Result<String>> + Send + 'static,
    {
        Self::from_source(Source::Generator(Box::new(next)))
    }

    /// Stream whatever arrives on `rx` until every sender is dropped.
    ///
    /// Not restartable. This is how process output is delivered.
    pub fn from_channel(rx: mpsc::Receiver<io::Result<String>>) -> Self {
        Self::from_source(Source::Channel(rx))
    }

    /// Bounded producer/consumer pair.
    ///
    /// Producers suspend once `capacity` lines are waiting, so a slow consumer
    /// applies backpressure instead of growing memory.
    pub fn channel(capacity: usize) -> (mpsc::Sender<io::Result<String>>, LineStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::from_channel(rx))
    }
}

impl From<Vec<String>> for LineStream {
    fn from(lines: Vec<String>) -> Self {
        Self::from_lines(lines)
    }
}

impl From<&str> for LineStream {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_stream_reports_nothing() -> io::Result<()> {
        let mut s = LineStream::empty();
        assert_eq!(s.next_line().await?, None);
        assert!(s.is_exhausted());
        assert_eq!(s.next_line().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn text_splits_without_trailing_empty_line() -> io::Result<()> {
        let lines = LineStream::from_text("one\r\ntwo\nthree\n").collect_lines().await?;
        assert_eq!(lines, vec!["one", "two", "three"]);
        Ok(())
    }

    #[tokio::test]
    async fn reader_keeps_unterminated_last_line() -> io::Result<()> {
        let bytes: &'static [u8] = b"alpha\nbeta";
        let lines = LineStream::from_reader(bytes).collect_lines().await?;
        assert_eq!(lines, vec!["alpha", "beta"]);
        Ok(())
    }

    #[tokio::test]
    async fn generator_error_exhausts_stream() {
        let mut n = 0;
        let mut s = LineStream::from_fn(move || {
            n += 1;
            if n < 3 {
                Some(Ok(format!("line {n}")))
            } else {
                Some(Err(io::Error::other("source broke")))
            }
        });

        assert_eq!(s.next_line().await.unwrap().as_deref(), Some("line 1"));
        assert_eq!(s.next_line().await.unwrap().as_deref(), Some("line 2"));
        assert!(s.next_line().await.is_err());
        assert!(s.is_exhausted());
        assert_eq!(s.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn channel_ends_when_senders_drop() -> io::Result<()> {
        let (tx, mut s) = LineStream::channel(1);
        tokio::spawn(async move {
            for i in 0..5 {
                if tx.send(Ok(i.to_string())).await.is_err() {
                    break;
                }
            }
        });

        let mut got = Vec::new();
        while let Some(line) = s.next_line().await? {
            got.push(line);
        }
        assert_eq!(got, vec!["0", "1", "2", "3", "4"]);
        Ok(())
    }
}

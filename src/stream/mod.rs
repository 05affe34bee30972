// src/stream/mod.rs

//! Lazy, single-consumer streams of text lines.
//!
//! A [`LineStream`] is what flows into a process's stdin and out of its
//! stdout/stderr. It is pull-based: each call to [`LineStream::next_line`]
//! produces at most one line, so infinite sources never need to be buffered
//! up front.
//!
//! Once a stream reports `None` (or an error) it stays exhausted. Whether the
//! same data can be streamed again is a property of the *source*, documented
//! on each constructor; the handle itself never rewinds.
//!
//! - [`sources`] holds the constructors (memory, text, readers, files,
//!   generators, channels).
//! - [`combinators`] holds `chain`, `take`, `map`, `filter` and collection.

pub mod combinators;
pub mod sources;

use std::collections::VecDeque;
use std::fmt;
use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;

type BoxedLines = Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>;
type Generator = Box<dyn FnMut() -> Option<io::Result<String>> + Send>;
type MapFn = Box<dyn FnMut(String) -> String + Send>;
type FilterFn = Box<dyn FnMut(&str) -> bool + Send>;

/// Lazy sequence of text lines with exactly one consumer.
///
/// Not `Clone`: pulling requires `&mut self`, and moving the stream into a
/// spawned process transfers the single consumer role with it.
pub struct LineStream {
    source: Source,
    exhausted: bool,
}

enum Source {
    Empty,
    Memory(VecDeque<String>),
    Reader(BoxedLines),
    Channel(mpsc::Receiver<io::Result<String>>),
    Generator(Generator),
    Chain(Box<LineStream>, Box<LineStream>),
    Take { inner: Box<LineStream>, remaining: usize },
    Map { inner: Box<LineStream>, f: MapFn },
    Filter { inner: Box<LineStream>, pred: FilterFn },
}

impl Source {
    fn kind(&self) -> &'static str {
        match self {
            Source::Empty => "empty",
            Source::Memory(_) => "memory",
            Source::Reader(_) => "reader",
            Source::Channel(_) => "channel",
            Source::Generator(_) => "generator",
            Source::Chain(..) => "chain",
            Source::Take { .. } => "take",
            Source::Map { .. } => "map",
            Source::Filter { .. } => "filter",
        }
    }
}

impl LineStream {
    fn from_source(source: Source) -> Self {
        Self {
            source,
            exhausted: false,
        }
    }

    /// Pull the next line.
    ///
    /// `Ok(Some(line))` advances the stream; `Ok(None)` means the source is
    /// exhausted and every later call returns `Ok(None)` again. An error also
    /// exhausts the stream.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        poll_fn(|cx| self.poll_next_line(cx)).await
    }

    /// Poll form of [`LineStream::next_line`].
    pub fn poll_next_line(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<Option<String>>> {
        if self.exhausted {
            return Poll::Ready(Ok(None));
        }

        let polled = match &mut self.source {
            Source::Empty => Poll::Ready(Ok(None)),
            Source::Memory(lines) => Poll::Ready(Ok(lines.pop_front())),
            Source::Reader(lines) => Pin::new(lines).poll_next_line(cx),
            Source::Channel(rx) => match rx.poll_recv(cx) {
                Poll::Ready(Some(item)) => Poll::Ready(item.map(Some)),
                Poll::Ready(None) => Poll::Ready(Ok(None)),
                Poll::Pending => Poll::Pending,
            },
            Source::Generator(next) => Poll::Ready(next().transpose()),
            Source::Chain(first, second) => match first.poll_next_line(cx) {
                Poll::Ready(Ok(None)) => second.poll_next_line(cx),
                other => other,
            },
            Source::Take { inner, remaining } => {
                if *remaining == 0 {
                    Poll::Ready(Ok(None))
                } else {
                    let polled = inner.poll_next_line(cx);
                    if let Poll::Ready(Ok(Some(_))) = &polled {
                        *remaining -= 1;
                    }
                    polled
                }
            }
            Source::Map { inner, f } => match inner.poll_next_line(cx) {
                Poll::Ready(Ok(Some(line))) => Poll::Ready(Ok(Some(f(line)))),
                other => other,
            },
            Source::Filter { inner, pred } => loop {
                match inner.poll_next_line(cx) {
                    Poll::Ready(Ok(Some(line))) => {
                        if pred(&line) {
                            break Poll::Ready(Ok(Some(line)));
                        }
                    }
                    other => break other,
                }
            },
        };

        match &polled {
            Poll::Ready(Ok(None)) | Poll::Ready(Err(_)) => {
                self.exhausted = true;
                // Drop the source now so pipes and files are released.
                self.source = Source::Empty;
            }
            Poll::Ready(Ok(Some(_))) => {
                // A satisfied `take` lets go of its upstream straight away.
                if let Source::Take { remaining: 0, .. } = self.source {
                    self.source = Source::Empty;
                }
            }
            Poll::Pending => {}
        }

        polled
    }

    /// Whether the stream has already reported its end.
    ///
    /// `false` does not promise another line; it only means the source has
    /// not been observed to end yet.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Default for LineStream {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream")
            .field("source", &self.source.kind())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

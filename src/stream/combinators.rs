// src/stream/combinators.rs

use std::io;

use super::{LineStream, Source};

impl LineStream {
    /// Yield every line of `self`, then every line of `next`.
    pub fn chain(self, next: LineStream) -> LineStream {
        Self::from_source(Source::Chain(Box::new(self), Box::new(next)))
    }

    /// Yield at most `n` lines.
    ///
    /// The upstream is dropped as soon as the `n`th line is handed out, which
    /// closes a process pipe feeding it.
    pub fn take(self, n: usize) -> LineStream {
        Self::from_source(Source::Take {
            inner: Box::new(self),
            remaining: n,
        })
    }

    pub fn map<F>(self, f: F) -> LineStream
    where
        F: FnMut(String) -> String + Send + 'static,
    {
        Self::from_source(Source::Map {
            inner: Box::new(self),
            f: Box::new(f),
        })
    }

    /// Keep only lines for which `pred` holds.
    ///
    /// Pulls from the upstream until a line matches, so filtering an infinite
    /// source that never matches never returns.
    pub fn filter<F>(self, pred: F) -> LineStream
    where
        F: FnMut(&str) -> bool + Send + 'static,
    {
        Self::from_source(Source::Filter {
            inner: Box::new(self),
            pred: Box::new(pred),
        })
    }

    /// Drain the stream into memory. Never call this on an infinite source.
    pub async fn collect_lines(mut self) -> io::Result<Vec<String>> {
        let mut out = Vec::new();
        while let Some(line) = self.next_line().await? {
            out.push(line);
        }
        Ok(out)
    }

    /// Drain the stream and join it back into text, one `\n` per line.
    pub async fn collect_text(self) -> io::Result<String> {
        let mut text = String::new();
        for line in self.collect_lines().await? {
            text.push_str(&line);
            text.push('\n');
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chain_then_take() -> io::Result<()> {
        let s = LineStream::from_lines(["a", "b"])
            .chain(LineStream::from_lines(["c", "d"]))
            .take(3);
        assert_eq!(s.collect_lines().await?, vec!["a", "b", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn take_bounds_an_infinite_source() -> io::Result<()> {
        let mut i = 0u64;
        let naturals = LineStream::from_fn(move || {
            i += 1;
            Some(Ok(i.to_string()))
        });
        let lines = naturals.take(4).collect_lines().await?;
        assert_eq!(lines, vec!["1", "2", "3", "4"]);
        Ok(())
    }

    #[tokio::test]
    async fn take_zero_is_empty() -> io::Result<()> {
        let lines = LineStream::from_lines(["x"]).take(0).collect_lines().await?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn map_and_filter() -> io::Result<()> {
        let s = LineStream::from_text("apple\nbanana\navocado\n")
            .filter(|l| l.starts_with('a'))
            .map(|l| l.to_uppercase());
        assert_eq!(s.collect_text().await?, "APPLE\nAVOCADO\n");
        Ok(())
    }
}

use shellpipe::LineStream;

/// `["line 0", "line 1", ...]`.
pub fn numbered_lines(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("line {i}")).collect()
}

/// `count` lines of exactly `width` bytes each, distinct per index.
///
/// Handy for pushing more than a pipe buffer's worth through a process.
pub fn payload_lines(count: usize, width: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let mut line = format!("{i:08}:");
            while line.len() < width {
                line.push('x');
            }
            line.truncate(width.max(9));
            line
        })
        .collect()
}

/// Generator stream producing `"n"` for n = 1, 2, ... without end.
pub fn endless_counter() -> LineStream {
    let mut n = 0u64;
    LineStream::from_fn(move || {
        n += 1;
        Some(Ok(n.to_string()))
    })
}

/// Stream that yields `good` lines and then fails.
pub fn failing_after(good: usize) -> LineStream {
    let mut produced = 0usize;
    LineStream::from_fn(move || {
        if produced < good {
            produced += 1;
            Some(Ok(format!("ok {produced}")))
        } else {
            Some(Err(std::io::Error::other("input source exploded")))
        }
    })
}

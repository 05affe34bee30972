#![cfg(unix)]

use proptest::prelude::*;
use shellpipe::{inshell, ExitStatus, LineStream};

fn run_cat(lines: Vec<String>) -> (Vec<String>, ExitStatus) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    rt.block_on(async move {
        let mut cat = inshell("cat", LineStream::from_lines(lines)).expect("spawn cat");
        let out = cat
            .take_stdout()
            .unwrap_or_default()
            .collect_lines()
            .await
            .expect("read stdout");
        let status = cat.wait().await.expect("wait for cat");
        (out, status)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cat_returns_its_input_unchanged(
        lines in proptest::collection::vec("[a-zA-Z0-9 ,.;:!?_\\-]{0,40}", 0..200)
    ) {
        let (out, status) = run_cat(lines.clone());
        prop_assert_eq!(status, ExitStatus::Succeeded);
        prop_assert_eq!(out, lines);
    }
}

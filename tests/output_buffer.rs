// tests/output_buffer.rs

use proptest::prelude::*;

use execbatch::exec::OutputBuffer;
use execbatch::exec::output_buffer::{MAX_BUFFER_BYTES, MAX_RETAINED_LINES};

/// Reference split used to check `last_lines` against the logical text.
fn expected_tail(text: &str, n: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    let lines: Vec<String> = body.split('\n').map(str::to_string).collect();
    let take = n.min(MAX_RETAINED_LINES).min(lines.len());
    lines[lines.len() - take..].to_vec()
}

#[test]
fn last_lines_joins_chunks_split_mid_line() {
    let mut buf = OutputBuffer::new();
    buf.push("one\ntwo\nthr");
    buf.push("ee\nfour\n");

    assert_eq!(buf.last_lines(2), vec!["three", "four"]);
    assert_eq!(buf.last_lines(10), vec!["one", "two", "three", "four"]);
}

#[test]
fn trailing_partial_line_is_included() {
    let mut buf = OutputBuffer::new();
    buf.push("a\nb");

    assert_eq!(buf.last_lines(5), vec!["a", "b"]);
}

#[test]
fn carriage_returns_are_stripped() {
    let mut buf = OutputBuffer::new();
    buf.push("x\r\ny\r\n");

    assert_eq!(buf.last_lines(5), vec!["x", "y"]);
}

#[test]
fn empty_buffer_has_no_lines() {
    let mut buf = OutputBuffer::new();
    buf.push("");

    assert!(buf.is_empty());
    assert!(buf.last_lines(3).is_empty());
    assert!(buf.last_lines(0).is_empty());
}

#[test]
fn push_invalidates_cached_view() {
    let mut buf = OutputBuffer::new();
    buf.push("a\n");
    assert_eq!(buf.last_lines(1), vec!["a"]);

    buf.push("b\n");
    assert_eq!(buf.last_lines(1), vec!["b"]);
}

#[test]
fn view_is_capped_even_when_more_is_requested() {
    let mut buf = OutputBuffer::new();
    for i in 0..200 {
        buf.push(&format!("line {i}\n"));
    }

    let lines = buf.last_lines(500);
    assert_eq!(lines.len(), MAX_RETAINED_LINES);
    assert_eq!(lines.first().map(String::as_str), Some("line 72"));
    assert_eq!(lines.last().map(String::as_str), Some("line 199"));
}

#[test]
fn two_megabytes_in_4k_chunks_stays_bounded() {
    // 64 lines of 64 bytes each = 4096 bytes per chunk; 512 chunks = 2 MiB.
    const CHUNK: usize = 4096;
    let mut buf = OutputBuffer::new();
    let mut line_no = 0usize;
    let mut compactions = 0;
    let mut previous = 0usize;

    for _ in 0..512 {
        let mut chunk = String::with_capacity(CHUNK);
        for _ in 0..64 {
            chunk.push_str(&format!("{:05}-{}\n", line_no, "x".repeat(57)));
            line_no += 1;
        }
        assert_eq!(chunk.len(), CHUNK);

        buf.push(&chunk);

        assert!(buf.retained_bytes() <= MAX_BUFFER_BYTES + CHUNK);
        if buf.retained_bytes() < previous {
            compactions += 1;
            let retained_lines = buf.contents().matches('\n').count();
            assert_eq!(retained_lines, MAX_RETAINED_LINES);
        }
        previous = buf.retained_bytes();

        let tail = buf.last_lines(8);
        assert_eq!(tail.len(), 8);
        assert!(tail.len() <= MAX_RETAINED_LINES);
    }

    assert!(compactions >= 1, "expected at least one compaction");

    let expected: Vec<String> = (line_no - 8..line_no)
        .map(|n| format!("{:05}-{}", n, "x".repeat(57)))
        .collect();
    assert_eq!(buf.last_lines(8), expected);
}

#[test]
fn compaction_keeps_trailing_partial_line() {
    let mut buf = OutputBuffer::new();
    let line = format!("{}\n", "y".repeat(1023));
    for _ in 0..1024 {
        buf.push(&line);
    }
    // Crosses the threshold together with a partial line.
    buf.push("partial");

    assert!(buf.retained_bytes() < MAX_BUFFER_BYTES);
    let tail = buf.last_lines(2);
    assert_eq!(tail, vec!["y".repeat(1023), "partial".to_string()]);
    assert_eq!(buf.contents().matches('\n').count(), MAX_RETAINED_LINES);
    assert!(buf.contents().ends_with("partial"));
}

proptest! {
    #[test]
    fn last_lines_matches_logical_concatenation(
        chunks in proptest::collection::vec("[a-z\n]{0,20}", 0..50),
        n in 0usize..12,
    ) {
        let mut buf = OutputBuffer::new();
        for c in &chunks {
            buf.push(c);
        }
        let text: String = chunks.concat();
        prop_assert_eq!(buf.last_lines(n), expected_tail(&text, n));
    }
}

#[test]
fn long_lines_do_not_compact_on_every_push() {
    let long_line = format!("{}\n", "z".repeat(16 * 1024 - 1));
    let mut buf = OutputBuffer::new();
    for _ in 0..MAX_RETAINED_LINES {
        buf.push(&long_line);
        assert!(buf.retained_bytes() <= 2 * MAX_BUFFER_BYTES);
    }

    // The tail kept by a compaction is itself large; small pushes after it
    // must not trigger a full rescan each time.
    let mut compactions = 0;
    let mut previous = buf.retained_bytes();
    for _ in 0..20_000 {
        buf.push("tick\n");
        let now = buf.retained_bytes();
        if now < previous {
            compactions += 1;
        }
        previous = now;
        assert!(now <= 2 * MAX_BUFFER_BYTES);
    }

    assert!(compactions <= 1, "compacted {compactions} times");
    assert_eq!(buf.last_lines(2), vec!["tick", "tick"]);
}

#[test]
fn carriage_return_only_output_stays_bounded() {
    const CHUNK: usize = 4096;
    let mut buf = OutputBuffer::new();
    let mut last = String::new();

    for i in 0..700 {
        last = format!("{:04}{}", i, "#".repeat(CHUNK - 5));
        buf.push(&format!("{last}\r"));
        assert!(
            buf.retained_bytes() <= 2 * MAX_BUFFER_BYTES,
            "retained {} bytes after {} chunks",
            buf.retained_bytes(),
            i + 1
        );
    }

    let tail = buf.last_lines(8);
    assert_eq!(tail.len(), 1);
    assert!(tail[0].len() <= 2 * MAX_BUFFER_BYTES);
    assert!(tail[0].ends_with(&last));
}

#[test]
fn oversized_partial_line_is_cut_at_a_char_boundary() {
    let mut buf = OutputBuffer::new();
    // Three-byte characters, so a plain byte cut would split one.
    let wide = "\u{2588}".repeat(MAX_BUFFER_BYTES / 3 + 1);
    buf.push(&wide);

    assert!(buf.retained_bytes() <= MAX_BUFFER_BYTES);
    assert_eq!(buf.retained_bytes() % 3, 0);
    assert!(buf.contents().chars().all(|c| c == '\u{2588}'));

    buf.push("end");
    let tail = buf.last_lines(1);
    assert_eq!(tail.len(), 1);
    assert!(tail[0].ends_with("\u{2588}end"));
}

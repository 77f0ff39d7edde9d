// Run locally (from the repo root):
//   cargo +nightly fuzz run fuzz_index_remap -- -runs=1000
#![no_main]

use std::sync::mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use quill_core::{LineIndex, TextEdit, TextRange, TextSize};
use quill_index::{EditTranslation, IndexBuilder, IndexedNode, Region};

mod utils;

const TIMEOUT: Duration = Duration::from_secs(1);

struct Word {
    region: Region,
}

impl IndexedNode for Word {
    fn node_type(&self) -> &str {
        "Identifier"
    }

    fn region(&self) -> Region {
        self.region
    }
}

fn words(text: &str) -> Vec<TextRange> {
    let mut out = Vec::new();
    let mut start = None;
    for (offset, ch) in text.char_indices().chain([(text.len(), ' ')]) {
        match (start, ch.is_alphanumeric() || ch == '_' || ch == '$') {
            (None, true) => start = Some(offset),
            (Some(s), false) => {
                out.push(TextRange::new(
                    TextSize::from(s as u32),
                    TextSize::from(offset as u32),
                ));
                start = None;
            }
            _ => {}
        }
    }
    out
}

fn run_one(text: &str) {
    let lines = LineIndex::new(text);
    let ranges = words(text);

    // Oracle: building, renaming and remapping never panic and keep both
    // facets in sync.
    let mut builder = IndexBuilder::new(text);
    for (i, range) in ranges.iter().enumerate() {
        let word = Word {
            region: Region {
                begin: lines.line_col(range.start()),
                end: lines.line_col(range.end()),
            },
        };
        let _ = builder.record_declaration(&word, i);
    }
    let index = builder.finish();
    index
        .check_consistency()
        .expect("freshly built index is consistent");

    let edits: Vec<_> = ranges
        .iter()
        .step_by(2)
        .map(|range| TextEdit::new(*range, "renamed"))
        .collect();
    let Ok(translation) = EditTranslation::new(text, &edits) else {
        return;
    };
    let remapped = index
        .remap_to(&translation)
        .expect("whole-token renames are translatable");
    remapped
        .check_consistency()
        .expect("remapped index is consistent");
    assert_eq!(remapped.len(), index.len());
}

type Job = (String, mpsc::SyncSender<()>);

/// A long-lived worker thread, so a hang shows up as a timeout instead of a
/// stuck fuzzer.
fn worker() -> &'static mpsc::SyncSender<Job> {
    static WORKER: OnceLock<mpsc::SyncSender<Job>> = OnceLock::new();
    WORKER.get_or_init(|| {
        let (jobs, queue) = mpsc::sync_channel::<Job>(0);
        std::thread::spawn(move || {
            for (text, done) in queue {
                run_one(&text);
                let _ = done.send(());
            }
        });
        jobs
    })
}

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let (done, finished) = mpsc::sync_channel(1);
    worker()
        .send((text.to_owned(), done))
        .expect("index worker exited");

    match finished.recv_timeout(TIMEOUT) {
        Ok(()) => {}
        Err(mpsc::RecvTimeoutError::Timeout) => panic!("index/remap run timed out"),
        Err(mpsc::RecvTimeoutError::Disconnected) => panic!("index worker panicked"),
    }
});

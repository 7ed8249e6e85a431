use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Why layout left a page before the story ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BreakReason {
    /// The frame had no height left for even the next flowable's gap.
    FrameExhausted,
    /// The flowable was split; its remainder continues on the next page.
    FlowableSplit,
    /// The flowable did not fit and could not be split.
    FrameOverflow,
}

impl BreakReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            BreakReason::FrameExhausted => "frame_exhausted",
            BreakReason::FlowableSplit => "flowable_split",
            BreakReason::FrameOverflow => "frame_overflow",
        }
    }
}

/// One JSON object on one line, built field by field.
struct Event(String);

impl Event {
    fn new(kind: &str) -> Self {
        let mut line = String::from("{\"type\":");
        push_json_string(&mut line, kind);
        Self(line)
    }

    fn text(mut self, key: &str, value: &str) -> Self {
        self.key(key);
        push_json_string(&mut self.0, value);
        self
    }

    fn count(mut self, key: &str, value: u64) -> Self {
        self.key(key);
        self.0.push_str(&value.to_string());
        self
    }

    fn object(mut self, key: &str, fields: &[(&str, u64)]) -> Self {
        self.key(key);
        self.0.push('{');
        for (idx, (name, value)) in fields.iter().enumerate() {
            if idx > 0 {
                self.0.push(',');
            }
            push_json_string(&mut self.0, name);
            self.0.push_str(&format!(":{value}"));
        }
        self.0.push('}');
        self
    }

    fn key(&mut self, key: &str) {
        self.0.push(',');
        push_json_string(&mut self.0, key);
        self.0.push(':');
    }

    fn into_line(mut self) -> String {
        self.0.push('}');
        self.0
    }
}

fn push_json_string(out: &mut String, raw: &str) {
    out.push('"');
    for ch in raw.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

struct Trace {
    out: BufWriter<File>,
    page_breaks: u64,
    pages_rendered: u64,
}

/// JSON-lines trace of one render: page breaks and captures from layout,
/// finalized pages and the written file from pass 2, then a summary with
/// the break and page tallies. Write errors never fail a render.
pub(crate) struct DebugLogger {
    trace: Mutex<Trace>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            trace: Mutex::new(Trace {
                out: BufWriter::new(file),
                page_breaks: 0,
                pages_rendered: 0,
            }),
        })
    }

    fn record(&self, event: Event, tally: impl FnOnce(&mut Trace)) {
        if let Ok(mut trace) = self.trace.lock() {
            tally(&mut *trace);
            let _ = writeln!(trace.out, "{}", event.into_line());
        }
    }

    pub fn page_break(&self, reason: BreakReason, from_page: usize, flowable: &str) {
        let event = Event::new("layout.page_break")
            .text("reason", reason.as_str())
            .count("from_page", from_page as u64)
            .count("to_page", from_page as u64 + 1)
            .text("flowable", flowable);
        self.record(event, |trace| trace.page_breaks += 1);
    }

    pub fn page_captured(&self, page: usize, commands: usize) {
        let event = Event::new("layout.page_captured")
            .count("page", page as u64)
            .count("commands", commands as u64);
        self.record(event, |_| {});
    }

    pub fn page_finalized(&self, page: usize, page_count: usize) {
        let event = Event::new("render.page_finalized")
            .count("page", page as u64)
            .count("page_count", page_count as u64);
        self.record(event, |trace| trace.pages_rendered += 1);
    }

    pub fn output(&self, path: &Path, bytes: usize) {
        let event = Event::new("render.output")
            .text("path", &path.display().to_string())
            .count("bytes", bytes as u64);
        self.record(event, |_| {});
    }

    /// Writes the tallies gathered since the last summary, resets them and
    /// flushes the file.
    pub fn summary(&self, context: &str) {
        if let Ok(mut trace) = self.trace.lock() {
            let line = Event::new("debug.summary")
                .text("context", context)
                .object(
                    "counts",
                    &[
                        ("layout.page_break.trigger", trace.page_breaks),
                        ("render.pages", trace.pages_rendered),
                    ],
                )
                .into_line();
            trace.page_breaks = 0;
            trace.pages_rendered = 0;
            let _ = writeln!(trace.out, "{line}");
            let _ = trace.out.flush();
        }
    }
}

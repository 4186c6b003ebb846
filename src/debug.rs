use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of layout decisions. Only the writer is shared; counters
/// belong to the render that produced them.
#[derive(Clone)]
pub(crate) struct RenderTrace {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

/// Event counts for a single document, reported by `emit_summary`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TraceCounters {
    counts: HashMap<String, u64>,
}

impl TraceCounters {
    pub fn increment(&mut self, key: &str, amount: u64) {
        let entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    fn to_json(&self) -> String {
        let mut counters: Vec<(&String, &u64)> = self.counts.iter().collect();
        counters.sort_by(|a, b| a.0.cmp(b.0));
        let mut out = String::from("{");
        for (idx, (key, value)) in counters.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&format!("\"{}\":{}", json_escape(key), value));
        }
        out.push('}');
        out
    }
}

impl RenderTrace {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn page_break(
        &self,
        counters: &mut TraceCounters,
        doc: &str,
        section: &str,
        page_index: usize,
    ) {
        let json = format!(
            "{{\"type\":\"layout.page_break\",\"doc\":\"{}\",\"section\":\"{}\",\"page_index\":{}}}",
            json_escape(doc),
            json_escape(section),
            page_index
        );
        self.write_line(&json, false);
        counters.increment("page_breaks", 1);
    }

    pub fn degraded(&self, counters: &mut TraceCounters, doc: &str, element: &str, reason: &str) {
        let json = format!(
            "{{\"type\":\"render.degraded\",\"doc\":\"{}\",\"element\":\"{}\",\"reason\":\"{}\"}}",
            json_escape(doc),
            json_escape(element),
            json_escape(reason)
        );
        self.write_line(&json, false);
        counters.increment(&format!("degraded.{element}"), 1);
    }

    pub fn emit_summary(&self, doc: &str, page_count: usize, counters: &TraceCounters) {
        let json = format!(
            "{{\"type\":\"render.summary\",\"doc\":\"{}\",\"pages\":{},\"counts\":{}}}",
            json_escape(doc),
            page_count,
            counters.to_json()
        );
        self.write_line(&json, true);
    }

    fn write_line(&self, json: &str, flush: bool) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{json}");
            if flush {
                let _ = writer.flush();
            }
        }
    }
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// Writer whose contents stay readable after being handed to a trace.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| serde_json::from_str(line).expect("trace line is json"))
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Ok(mut inner) = self.0.lock() {
                inner.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
impl TraceCounters {
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::*;

    #[test]
    fn summary_reports_only_its_own_counters() {
        let buffer = SharedBuffer::default();
        let trace = RenderTrace::from_writer(buffer.clone());
        let mut first = TraceCounters::default();
        let mut second = TraceCounters::default();
        trace.page_break(&mut first, "Notice-A.pdf", "body", 1);
        trace.page_break(&mut second, "Notice-B.pdf", "body", 1);
        trace.page_break(&mut first, "Notice-A.pdf", "schedule", 2);
        trace.degraded(&mut first, "Notice-A.pdf", "logo", "timed out");
        trace.emit_summary("Notice-A.pdf", 3, &first);
        trace.emit_summary("Notice-B.pdf", 2, &second);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0]["type"], "layout.page_break");
        assert_eq!(lines[2]["section"], "schedule");
        assert_eq!(lines[3]["element"], "logo");
        assert_eq!(lines[4]["counts"]["page_breaks"], 2);
        assert_eq!(lines[4]["counts"]["degraded.logo"], 1);
        assert_eq!(
            lines[5]["counts"],
            serde_json::json!({ "page_breaks": 1 })
        );
        assert_eq!(second.get("page_breaks"), 1);
        assert_eq!(TraceCounters::default().to_json(), "{}");
    }

    #[test]
    fn escapes_quotes_and_control_characters() {
        assert_eq!(json_escape("a\"b\\c\n\u{1}"), "a\\\"b\\\\c\\n\\u0001");
    }
}

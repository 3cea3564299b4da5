/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes are fed as they arrive; complete frames are handed out as the joined contents of their
/// `data:` lines. Only the `data` field is interpreted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Returns the next complete frame payload, or `None` until more bytes arrive.
    pub fn next_payload(&mut self) -> Option<String> {
        loop {
            let newline = self.buffer.iter().position(|byte| *byte == b'\n')?;
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if line.is_empty() {
                if self.data.is_empty() {
                    continue;
                }
                let payload = self.data.join("\n");
                self.data.clear();
                return Some(payload);
            }

            let line = String::from_utf8_lossy(&line);
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (&*line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }
    }

    /// True when bytes or data lines are buffered without a terminating blank line.
    pub fn has_partial_frame(&self) -> bool {
        !self.buffer.is_empty() || !self.data.is_empty()
    }
}

//! Append-only progress log shared by concurrent solver agents.

use std::sync::mpsc::{self, Receiver, Sender};

/// One progress line tagged with the agent that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub agent: String,
    pub message: String,
}

/// Receiving end, owned by the orchestrator.
pub struct LogSink {
    sender: Sender<LogLine>,
    receiver: Receiver<LogLine>,
}

/// Cloneable sending end handed to each agent.
#[derive(Debug, Clone)]
pub struct AgentLog {
    agent: String,
    sender: Sender<LogLine>,
}

impl LogSink {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn agent(&self, agent: &str) -> AgentLog {
        AgentLog {
            agent: agent.to_string(),
            sender: self.sender.clone(),
        }
    }

    /// Take every line sent so far without blocking.
    pub fn drain(&self) -> Vec<LogLine> {
        self.receiver.try_iter().collect()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentLog {
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Lines sent after the sink is dropped are discarded.
    pub fn line(&self, message: impl Into<String>) {
        let _ = self.sender.send(LogLine {
            agent: self.agent.clone(),
            message: message.into(),
        });
    }
}

/// `agent: message` per line, one block for multi-line messages.
pub fn render_lines(lines: &[LogLine]) -> String {
    let mut out = String::new();
    for line in lines {
        for text in line.message.lines() {
            out.push_str(&line.agent);
            out.push_str(": ");
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn lines_from_threads_are_collected() {
        let sink = LogSink::new();
        thread::scope(|scope| {
            for name in ["a", "b"] {
                let log = sink.agent(name);
                scope.spawn(move || log.line(format!("hello from {name}")));
            }
        });
        let mut lines = sink.drain();
        lines.sort_by(|x, y| x.agent.cmp(&y.agent));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "hello from a");
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn render_prefixes_each_line() {
        let lines = vec![LogLine {
            agent: "gpt".to_string(),
            message: "_ a\nb _".to_string(),
        }];
        assert_eq!(render_lines(&lines), "gpt: _ a\ngpt: b _\n");
    }
}

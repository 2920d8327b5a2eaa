//! JSON-lines output: one line per committed state or eligibility answer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tunnel_state_core::{EligibilityReport, StatusSink, TunnelState};

/// Sink that buffers commits until the driver writes them out.
#[derive(Debug, Default)]
pub struct CommitBuffer {
    pending: Vec<TunnelState>,
}

impl CommitBuffer {
    pub fn take(&mut self) -> Vec<TunnelState> {
        std::mem::take(&mut self.pending)
    }
}

impl StatusSink for CommitBuffer {
    fn on_status_changed(&mut self, state: &TunnelState) {
        self.pending.push(state.clone());
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutput<'a> {
    Commit {
        elapsed_ms: i64,
        state: &'a TunnelState,
    },
    Eligibility {
        elapsed_ms: i64,
        connect: bool,
        reconnect: bool,
        disconnect: bool,
    },
}

/// Writes session output, stamping each line relative to session start.
pub struct Emitter<'a, W> {
    out: &'a mut W,
    started: DateTime<Utc>,
}

impl<'a, W: AsyncWrite + Unpin> Emitter<'a, W> {
    pub fn new(out: &'a mut W, started: DateTime<Utc>) -> Self {
        Self { out, started }
    }

    fn elapsed_ms(&self, at: DateTime<Utc>) -> i64 {
        at.signed_duration_since(self.started).num_milliseconds()
    }

    pub async fn commits(&mut self, states: Vec<TunnelState>, at: DateTime<Utc>) -> anyhow::Result<()> {
        if states.is_empty() {
            return Ok(());
        }
        let elapsed_ms = self.elapsed_ms(at);
        for state in &states {
            tracing::info!(state = %state, elapsed_ms, "tunnel state committed");
            self.write_line(&SessionOutput::Commit { elapsed_ms, state })
                .await?;
        }
        self.out.flush().await?;
        Ok(())
    }

    pub async fn eligibility(
        &mut self,
        report: EligibilityReport,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let line = SessionOutput::Eligibility {
            elapsed_ms: self.elapsed_ms(at),
            connect: report.connect,
            reconnect: report.reconnect,
            disconnect: report.disconnect,
        };
        self.write_line(&line).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn write_line(&mut self, line: &SessionOutput<'_>) -> anyhow::Result<()> {
        let mut json = serde_json::to_vec(line)?;
        json.push(b'\n');
        self.out.write_all(&json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tunnel_state_core::DisconnectReason;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn buffer_take_drains() {
        let mut buffer = CommitBuffer::default();
        buffer.on_status_changed(&TunnelState::connected());
        assert_eq!(buffer.take(), vec![TunnelState::connected()]);
        assert!(buffer.take().is_empty());
    }

    #[tokio::test]
    async fn writes_one_json_line_per_commit() {
        let mut out = Vec::new();
        let mut emitter = Emitter::new(&mut out, t0());
        emitter
            .commits(
                vec![
                    TunnelState::connecting(),
                    TunnelState::disconnecting(DisconnectReason::Reconnect),
                ],
                t0() + TimeDelta::milliseconds(160),
            )
            .await
            .expect("write");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"type":"commit","elapsed_ms":160,"state":{"state":"connecting"}}"#,
                r#"{"type":"commit","elapsed_ms":160,"state":{"state":"disconnecting","reason":"reconnect"}}"#,
            ]
        );
    }

    #[tokio::test]
    async fn writes_eligibility_line() {
        let mut out = Vec::new();
        let mut emitter = Emitter::new(&mut out, t0());
        emitter
            .eligibility(
                EligibilityReport {
                    connect: true,
                    reconnect: false,
                    disconnect: false,
                },
                t0(),
            )
            .await
            .expect("write");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["type"], "eligibility");
        assert_eq!(value["connect"], true);
        assert_eq!(value["disconnect"], false);
    }
}

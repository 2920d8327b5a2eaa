//! Session driver: owns one reconciler, feeds it inputs and fires its timers.
//!
//! Live sessions select over the next input line, the next timer deadline and
//! a shutdown signal. Replayed sessions walk the recorded offsets against
//! virtual time and never sleep.

use std::future::Future;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tunnel_state_core::config::millis_to_delta;
use tunnel_state_core::{ReconcilerConfig, SessionInput, TimedInput, TunnelStateReconciler};

use crate::clock::SessionClock;
use crate::output::{CommitBuffer, Emitter};

type SessionReconciler = TunnelStateReconciler<CommitBuffer>;

#[derive(Debug, Default, Clone, Copy)]
pub struct LiveOptions {
    /// Keep firing timers after end of input instead of stopping at once.
    pub drain_on_eof: bool,
}

/// Run a live session until input ends or `shutdown` resolves.
pub async fn run_live<R, W, C, F>(
    input: R,
    output: &mut W,
    config: ReconcilerConfig,
    clock: &C,
    options: LiveOptions,
    shutdown: F,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: SessionClock,
    F: Future<Output = ()>,
{
    let started = clock.now();
    let mut reconciler = SessionReconciler::new(CommitBuffer::default(), config, started);
    let mut emitter = Emitter::new(output, started);
    let mut lines = input.lines();
    let mut input_open = true;
    let mut line_no = 0usize;
    tokio::pin!(shutdown);

    loop {
        let deadline = reconciler.next_deadline();
        if !input_open && deadline.is_none() {
            tracing::debug!("input closed and no timers pending");
            break;
        }

        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            () = sleep_until(clock, deadline) => {
                advance_to(&mut reconciler, clock.now(), &mut emitter).await?;
            }
            line = lines.next_line(), if input_open => {
                match line.context("failed to read session input")? {
                    Some(line) => {
                        line_no += 1;
                        let now = clock.now();
                        advance_to(&mut reconciler, now, &mut emitter).await?;
                        if let Some(input) = parse_input(&line, line_no) {
                            apply(&mut reconciler, input, now, &mut emitter).await?;
                        }
                    }
                    None if options.drain_on_eof => {
                        tracing::debug!("end of input, draining pending timers");
                        input_open = false;
                    }
                    None => {
                        tracing::debug!("end of input");
                        break;
                    }
                }
            }
        }
    }

    if reconciler.next_deadline().is_some() {
        tracing::debug!("cancelling pending timers");
    }
    reconciler.shutdown();
    Ok(())
}

/// Replay a recorded session file against virtual time.
pub async fn run_replay<W>(path: &Path, output: &mut W, config: ReconcilerConfig) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read replay file {}", path.display()))?;
    tracing::info!(path = %path.display(), "replaying session");
    replay(&text, output, config, Utc::now()).await
}

/// Replay newline-separated [`TimedInput`]s starting at `started`.
pub async fn replay<W>(
    text: &str,
    output: &mut W,
    config: ReconcilerConfig,
    started: DateTime<Utc>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut reconciler = SessionReconciler::new(CommitBuffer::default(), config, started);
    let mut emitter = Emitter::new(output, started);
    let mut now = started;

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let timed = match TimedInput::from_json(line) {
            Ok(timed) => timed,
            Err(e) => {
                tracing::warn!(line = idx + 1, "skipping replay input: {e}");
                continue;
            }
        };

        let Some(at) = millis_to_delta(timed.at_ms).and_then(|d| started.checked_add_signed(d))
        else {
            tracing::warn!(
                line = idx + 1,
                at_ms = timed.at_ms,
                "skipping replay input: offset out of range"
            );
            continue;
        };
        if at < now {
            tracing::warn!(
                line = idx + 1,
                at_ms = timed.at_ms,
                "replay input out of order, applying at previous offset"
            );
        } else {
            now = at;
        }

        advance_to(&mut reconciler, now, &mut emitter).await?;
        apply(&mut reconciler, timed.input, now, &mut emitter).await?;
    }

    while let Some(deadline) = reconciler.next_deadline() {
        advance_to(&mut reconciler, deadline, &mut emitter).await?;
    }
    Ok(())
}

async fn sleep_until<C: SessionClock>(clock: &C, deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(clock.instant_for(at)).await,
        None => std::future::pending().await,
    }
}

fn parse_input(line: &str, line_no: usize) -> Option<SessionInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match SessionInput::from_json(line) {
        Ok(input) => Some(input),
        Err(e) => {
            tracing::warn!(line = line_no, "skipping session input: {e}");
            None
        }
    }
}

/// Fire every timer due by `target`, writing commits stamped with the
/// deadline they fired at.
async fn advance_to<W: AsyncWrite + Unpin>(
    reconciler: &mut SessionReconciler,
    target: DateTime<Utc>,
    emitter: &mut Emitter<'_, W>,
) -> anyhow::Result<()> {
    while let Some(deadline) = reconciler.next_deadline().filter(|at| *at <= target) {
        reconciler.fire_due(deadline);
        emitter.commits(reconciler.sink_mut().take(), deadline).await?;
    }
    Ok(())
}

async fn apply<W: AsyncWrite + Unpin>(
    reconciler: &mut SessionReconciler,
    input: SessionInput,
    now: DateTime<Utc>,
    emitter: &mut Emitter<'_, W>,
) -> anyhow::Result<()> {
    let report = reconciler.apply(input, now);
    emitter.commits(reconciler.sink_mut().take(), now).await?;
    if let Some(report) = report {
        emitter.eligibility(report, now).await?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────

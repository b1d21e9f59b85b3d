use crate::tui::TuiMsg;
use crossterm::event::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use wayfinder_planner::SessionEvent;

const INPUT_POLL: Duration = Duration::from_millis(100);
const TICK: Duration = Duration::from_millis(80);

/// Start the tasks that feed the TUI loop: terminal input, the redraw
/// tick, and whatever the session worker emits. All of them stop on
/// `cancel`.
pub fn spawn_tui_feeders(
    tui: mpsc::Sender<TuiMsg>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
) {
    let tui_in = tui.clone();
    let cancel_input = cancel.clone();
    tokio::spawn(async move {
        loop {
            // Polling keeps the blocking read short so cancellation is noticed.
            let read = tokio::task::spawn_blocking(|| -> std::io::Result<Option<Event>> {
                if crossterm::event::poll(INPUT_POLL)? {
                    crossterm::event::read().map(Some)
                } else {
                    Ok(None)
                }
            });
            tokio::select! {
                _ = cancel_input.cancelled() => break,
                ev = read => {
                    match ev {
                        Ok(Ok(Some(e))) => {
                            if tui_in.send(TuiMsg::InputEvent(e)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => {
                            let _ = tui_in.send(TuiMsg::OpError(format!("input: {e}"))).await;
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    });

    let tui_tick = tui.clone();
    let cancel_tick = cancel.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = cancel_tick.cancelled() => break,
                _ = interval.tick() => {
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                ev = events.recv() => {
                    let Some(ev) = ev else { break };
                    if tui.send(TuiMsg::Session(ev)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}

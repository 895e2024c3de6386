use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::commands::Command;
use super::session::{Flow, Session};
use crate::config::RuntimeConfig;
use crate::connection::{ConnectionManager, Event, Phase, Transport, WsTransport};
use crate::dashboard::Dashboard;

/// How long shutdown waits for the backend to acknowledge the close.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Interactive dashboard: connects at start-up, then serves stdin commands,
/// socket events and periodic repaints from one loop until quit, end of
/// input or Ctrl-C.
pub async fn run_interactive(config: &RuntimeConfig) -> Result<()> {
    let (mut manager, mut events) = ConnectionManager::new(
        WsTransport,
        config.backend.url.clone(),
        config.backend.reconnect_delay(),
    );
    let mut session = Session::new(config);

    let (line_tx, mut lines) = mpsc::unbounded_channel();
    spawn_line_reader(line_tx);

    let mut repaint = tokio::time::interval(config.display.render_interval());
    repaint.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!("Type 'help' for commands.");
    manager.handle(Event::ConnectRequested, &mut session);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                manager.handle(event, &mut session);
            }
            line = lines.recv() => match line {
                Some(line) => match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if session.execute(command, &mut manager, &mut stdout)? == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                },
                None => {
                    info!("End of input");
                    break;
                }
            },
            _ = repaint.tick() => {
                if session.take_dirty() {
                    print!("\n{}", session.dashboard);
                    stdout.flush()?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    close_and_wait(&mut manager, &mut events, &mut session).await;
    Ok(())
}

/// Connects, sends the parameters on open, waits for `count` metrics
/// messages and closes cleanly. Returns the dashboard as it stood after the
/// last message.
pub async fn run_quote(config: &RuntimeConfig, session: Session, count: u64) -> Result<Dashboard> {
    run_quote_with(WsTransport, config, session, count).await
}

async fn run_quote_with<T: Transport>(
    transport: T,
    config: &RuntimeConfig,
    mut session: Session,
    count: u64,
) -> Result<Dashboard> {
    let (mut manager, mut events) = ConnectionManager::new(
        transport,
        config.backend.url.clone(),
        config.backend.reconnect_delay(),
    );

    manager.handle(Event::ConnectRequested, &mut session);

    while session.dashboard.messages_received < count {
        match manager.phase() {
            Phase::ConstructionFailed => {
                return Err(anyhow!("could not create a socket for {}", manager.url()));
            }
            Phase::Closed { clean: true } => {
                return Err(anyhow!(
                    "backend closed the connection: {}",
                    session.dashboard.status.text
                ));
            }
            _ => {}
        }

        tokio::select! {
            event = events.recv() => match event {
                Some(event) => manager.handle(event, &mut session),
                None => return Err(anyhow!("event queue closed")),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    close_and_wait(&mut manager, &mut events, &mut session).await;
    Ok(session.dashboard)
}

/// Requests a normal close and keeps dispatching until the transport
/// confirms it or the grace period runs out.
async fn close_and_wait<T: Transport>(
    manager: &mut ConnectionManager<T>,
    events: &mut mpsc::UnboundedReceiver<Event>,
    session: &mut Session,
) {
    manager.handle(Event::DisconnectRequested, session);

    let deadline = tokio::time::Instant::now() + CLOSE_GRACE;
    while manager.has_socket() {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(event)) => manager.handle(event, session),
            Ok(None) => break,
            Err(_) => {
                warn!("Backend did not acknowledge the close in time");
                break;
            }
        }
    }
}

/// Stdin is read on a detached thread; a pending read must not hold up
/// runtime shutdown.
fn spawn_line_reader(tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
}

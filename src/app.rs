use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::api::BackendClient;
use crate::config::Config;
use crate::ui::chat::{ChatAction, ChatView};

/// Run the chat screen until the user exits, restoring the terminal on the
/// way out.
pub async fn run(config: Config) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main loop of the application.
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<()> {
    let client = BackendClient::new(&config);
    let mut chat = ChatView::new(client, config.expand_chunks);

    // Terminal input is polled off the UI task and fed through a channel.
    let (input_tx, mut input_rx) = mpsc::channel::<CEvent>(100);
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(ev) = event::read() {
                    if input_tx.send(ev).await.is_err() {
                        return;
                    }
                }
            } else if input_tx.is_closed() {
                return;
            }
        }
    });

    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        // Finished exchanges land in the transcript before every draw.
        chat.poll_replies();
        terminal.draw(|f| chat.render(f, f.size()))?;

        tokio::select! {
            Some(ev) = input_rx.recv() => {
                if let CEvent::Key(key) = ev {
                    if chat.handle_key(key) == ChatAction::Exit {
                        log::info!("exit requested");
                        break;
                    }
                }
            }
            _ = tick.tick() => chat.tick(),
        }
    }

    Ok(())
}

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{Event, KeyEventKind};
use ratatui::DefaultTerminal;
use scrollbox::{App, AppConfig, AppEvent, Args, ConfigManager, APP_NAME};
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(&mut *app, frame.area()))?;
    // a settle pass may scroll or start a load, which needs one more frame
    if app.after_render() {
        terminal.draw(|frame| frame.render_widget(&mut *app, frame.area()))?;
    }
    Ok(())
}

async fn run(mut terminal: DefaultTerminal, config: &AppConfig) -> Result<()> {
    let (tx, mut rx) = unbounded_channel::<AppEvent>();
    let mut app = App::from_config(tx.clone(), config)?;

    let mut ticker = tokio::time::interval(Duration::from_millis(
        config.performance.event_poll_interval_ms,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    render(&mut terminal, &mut app)?;

    loop {
        while crossterm::event::poll(Duration::ZERO)? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => tx.send(AppEvent::Key(key))?,
                Event::Resize(cols, rows) => tx.send(AppEvent::Resize(cols, rows))?,
                _ => {}
            }
        }

        let updated = tokio::select! {
            Some(event) = rx.recv() => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            _ = ticker.tick() => app.tick(),
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config = ConfigManager::new(APP_NAME)?;
        match config.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error generating config: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let (mut config, ignored) = AppConfig::load(APP_NAME)?;
    config.apply_args(&args);
    let log_path = scrollbox::logging::init(&config.debug, APP_NAME)?;
    info!(log = %log_path.display(), finish = %config.scroll.finish_threshold, "starting");
    if let Some(e) = ignored {
        warn!(error = %e, "ignoring user config");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let terminal = ratatui::init();
    let result = runtime.block_on(run(terminal, &config));
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

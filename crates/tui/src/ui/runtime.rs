//! Runtime: event loop and input routing for the form.
//!
//! - Owns the terminal lifecycle (raw mode, alternate screen, mouse capture,
//!   bracketed paste).
//! - A dedicated input task reads crossterm events and forwards them over a
//!   channel.
//! - Keys, mouse and paste events are routed through [`MainView`]; the
//!   returned [`Effect`]s are drained after each event, and background work
//!   reports back through `pending_execs`.
//! - The loop ends when the form hands off a key source, is closed, or
//!   Ctrl+C is pressed.
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, KeyCode, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use keysource_types::{Effect, ExecOutcome, KeySource, Msg};
use rat_focus::FocusBuilder;
use ratatui::{Terminal, prelude::*};
use tokio::{
    signal,
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::app::{App, FormOptions};
use crate::cmd;
use crate::ui::components::component::Component;
use crate::ui::main_component::MainView;

type Backend = CrosstermBackend<std::io::Stdout>;

/// Spawn the input task. It polls with a short timeout so it notices a
/// closed channel, and throttles mouse-move events to one per 16 ms.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    let mut last_mouse_move = Instant::now();

    tokio::task::spawn_blocking(move || {
        let sixteen_ms = Duration::from_millis(16);
        loop {
            match event::poll(sixteen_ms) {
                Ok(true) => {}
                Ok(false) => {
                    if sender.is_closed() {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Failed to poll events: {}", e);
                    break;
                }
            }
            match event::read() {
                Ok(event) => {
                    let is_mouse_move = event.as_mouse_event().is_some_and(|e| e.kind == MouseEventKind::Moved);
                    if is_mouse_move {
                        if last_mouse_move.elapsed() < sixteen_ms {
                            continue;
                        }
                        last_mouse_move = Instant::now();
                    }
                    if let Err(e) = sender.blocking_send(event) {
                        debug!("Input channel closed: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read event: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste).context("enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture, DisableBracketedPaste)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    // Rebuild focus just before rendering so enabled/disabled controls are reflected
    let old_focus = std::mem::take(&mut app.focus);
    app.focus = FocusBuilder::rebuild_for(app, Some(old_focus));
    if app.focus.focused().is_none() {
        main_view.restore_focus(app);
    }
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Resize(width, height) => main_view.handle_message(app, Msg::Resize(width, height)),
        Event::Paste(text) => main_view.handle_message(app, Msg::Paste(text)),
        Event::FocusGained | Event::FocusLost => Vec::new(),
    }
}

/// Runs the form until it hands off a key source (`Some`) or is closed (`None`).
pub async fn run_app(options: FormOptions) -> Result<Option<KeySource>> {
    let mut app = App::new(options);
    let mut main_view = MainView::default();
    let mut terminal = setup_terminal()?;

    let result = event_loop(&mut terminal, &mut app, &mut main_view).await;
    // Restore the terminal even when the loop failed.
    let cleanup = cleanup_terminal(&mut terminal);
    result?;
    cleanup?;
    Ok(app.outcome.take())
}

async fn event_loop(terminal: &mut Terminal<Backend>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    let mut pending_execs: FuturesUnordered<JoinHandle<ExecOutcome>> = FuturesUnordered::new();
    let mut effects: Vec<Effect> = Vec::with_capacity(5);

    // Ticking strategy: fast while effects or background work are pending, slow when idle.
    let fast_interval = Duration::from_millis(100);
    let idle_interval = Duration::from_millis(5000);
    let mut current_interval = idle_interval;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(terminal, app, main_view)?;

    // Some terminals drop resize notifications; compare sizes each turn.
    let mut last_size: Option<(u16, u16)> = crossterm::terminal::size().ok();

    while !app.should_quit {
        let busy = !effects.is_empty() || !pending_execs.is_empty();
        let target_interval = if busy { fast_interval } else { idle_interval };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut needs_render = false;
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break;
                };
                if let Event::Key(key_event) = event
                    && key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }
                effects.extend(handle_input_event(app, main_view, event));
                needs_render = true;
            }

            _ = ticker.tick() => {
                effects.extend(main_view.handle_message(app, Msg::Tick));
                needs_render = busy;
            }

            Some(joined) = pending_execs.next(), if !pending_execs.is_empty() => {
                let outcome = joined.unwrap_or_else(|error| ExecOutcome::Log(format!("Background task failed: {error}")));
                effects.extend(main_view.handle_message(app, Msg::ExecCompleted(Box::new(outcome))));
                needs_render = true;
            }

            _ = signal::ctrl_c() => { break; }
        }

        // Effects are drained after every event so the form never lags a keypress.
        while !effects.is_empty() {
            // move effects out of their Vec to avoid processing new effects while processing current ones
            let mut effects_to_process = std::mem::take(&mut effects);
            handle_navigation_effects(app, main_view, &mut effects_to_process, &mut effects);
            process_effects(app, main_view, effects_to_process, &mut pending_execs, &mut effects);
            needs_render = true;
            if app.should_quit {
                break;
            }
        }

        if let Ok((w, h)) = crossterm::terminal::size()
            && last_size != Some((w, h))
        {
            last_size = Some((w, h));
            let _ = app.update(&Msg::Resize(w, h));
            needs_render = true;
        }

        if needs_render && !app.should_quit {
            render(terminal, app, main_view)?;
        }
    }

    for handle in pending_execs.iter() {
        handle.abort();
    }
    Ok(())
}

/// Opens and closes modals, running their route hooks.
fn handle_navigation_effects(app: &mut App, main_view: &mut MainView, effects: &mut Vec<Effect>, queued_effects: &mut Vec<Effect>) {
    let navigation_effects = effects
        .extract_if(0.., |effect| matches!(effect, Effect::ShowModal(_) | Effect::CloseModal))
        .collect::<Vec<Effect>>();

    for effect in navigation_effects {
        match effect {
            Effect::ShowModal(modal) => {
                if let Some((mut view, _)) = main_view.modal_view.take() {
                    queued_effects.extend(view.on_route_exit(app));
                }
                main_view.set_open_modal_kind(app, Some(modal));
                if let Some((view, _)) = main_view.modal_view.as_mut() {
                    queued_effects.extend(view.on_route_enter(app));
                }
            }
            Effect::CloseModal => {
                if let Some((mut view, _)) = main_view.modal_view.take() {
                    queued_effects.extend(view.on_route_exit(app));
                }
                main_view.set_open_modal_kind(app, None);
            }
            _ => {}
        }
    }
}

fn process_effects(
    app: &mut App,
    main_view: &mut MainView,
    effects: Vec<Effect>,
    pending_execs: &mut FuturesUnordered<JoinHandle<ExecOutcome>>,
    effects_out: &mut Vec<Effect>,
) {
    if effects.is_empty() {
        return;
    }

    let command_batch = cmd::run_from_effects(app, effects);
    pending_execs.extend(command_batch.pending);

    for outcome in command_batch.immediate {
        match outcome {
            ExecOutcome::Message(msg) => effects_out.extend(main_view.handle_message(app, msg)),
            other => effects_out.extend(main_view.handle_message(app, Msg::ExecCompleted(Box::new(other)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysource_types::Modal;
    use std::path::PathBuf;

    fn picker_modal() -> Modal {
        Modal::FilePicker {
            extensions: vec!["pem"],
            start_dir: Some(std::env::temp_dir()),
        }
    }

    #[tokio::test]
    async fn picked_file_reaches_the_form_after_modal_closes() {
        let mut app = App::new(FormOptions::default());
        let mut main_view = MainView::default();
        let mut pending = FuturesUnordered::new();
        let mut queued = Vec::new();

        let mut effects = vec![Effect::ShowModal(picker_modal())];
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);
        assert!(app.file_picker.is_some());
        assert!(matches!(queued.as_slice(), [Effect::ListDirectoryContents(_)]));

        let picked = PathBuf::from("/keys/id.pem");
        let mut effects = vec![Effect::CloseModal, Effect::FilePicked(picked.clone())];
        let mut queued = Vec::new();
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);
        assert!(main_view.modal_view.is_none());
        process_effects(&mut app, &mut main_view, effects, &mut pending, &mut queued);

        assert_eq!(app.key_source.selection().file_path(), Some(picked.as_path()));
        assert!(app.key_source.can_proceed());
    }

    #[tokio::test]
    async fn cancelled_picker_leaves_form_unchanged() {
        let mut app = App::new(FormOptions::default());
        let mut main_view = MainView::default();
        let mut pending = FuturesUnordered::new();
        let mut queued = Vec::new();

        let mut effects = vec![Effect::ShowModal(picker_modal())];
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);

        let mut effects = vec![Effect::CloseModal, Effect::FilePickerCancelled];
        handle_navigation_effects(&mut app, &mut main_view, &mut effects, &mut queued);
        process_effects(&mut app, &mut main_view, effects, &mut pending, &mut queued);

        assert_eq!(app.key_source.selection().file_path(), None);
        assert!(!app.key_source.can_proceed());
        assert!(app.open_modal_kind.is_none());
    }
}

//! Interactive session: each line typed is a search-field submission, while
//! connectivity changes and the notification banner arrive in the background.

use std::{io::IsTerminal, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
};
use weather_core::{
    AppController, Connectivity, SubmitOutcome,
    connectivity::{ProbeTarget, spawn_probe_loop},
    controller::QUEUED_ALERT,
    location::{ConfiguredLocation, Geolocator},
    notify::{NotificationBanner, PermissionPrompt},
};

use crate::{prompt::TerminalPermissionPrompt, render};

const HELP: &str = "\
Type a city name and press Enter.
  :c          toggle °C / °F
  :r <n>      search recent entry n
  :queue      list queued lookups
  :online     mark the network as available
  :offline    mark the network as unavailable
  :help       this text
  :q          quit";

pub struct SessionOptions {
    pub geolocator: Option<ConfiguredLocation>,
    /// `None` disables background probing (e.g. with `--offline`).
    pub probe: Option<ProbeTarget>,
    pub probe_interval: Duration,
}

enum Action {
    Quit,
    Continue,
}

pub async fn run(mut ctrl: AppController, options: SessionOptions) -> anyhow::Result<()> {
    println!("Weather App ({})", ctrl.connectivity());
    println!("{HELP}");

    let interactive = std::io::stdin().is_terminal();
    let terminal_prompt = TerminalPermissionPrompt;
    let prompt: Option<&dyn PermissionPrompt> =
        if interactive { Some(&terminal_prompt) } else { None };
    let geolocator = options.geolocator.as_ref().map(|g| g as &dyn Geolocator);

    // Timers start at launch; the watch receivers hold their state until the
    // loop below reads it.
    let banner = NotificationBanner::default();
    let (mut banner_rx, banner_handle) = banner.spawn();
    let mut banner_live = true;

    // Held so the channel stays open when probing is disabled.
    let (_conn_tx, mut conn_rx) = watch::channel(ctrl.connectivity());
    let mut conn_live = true;
    let mut probe_handle = None;
    if let Some(target) = options.probe {
        let (rx, handle) = spawn_probe_loop(target, ctrl.connectivity(), options.probe_interval);
        conn_rx = rx;
        probe_handle = Some(handle);
    }

    ctrl.startup(geolocator, prompt).await;
    print_view(&ctrl);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Action::Quit = handle_line(&mut ctrl, line.trim()).await {
                    break;
                }
            }
            changed = conn_rx.changed(), if conn_live => {
                if changed.is_err() {
                    conn_live = false;
                    continue;
                }
                let state = *conn_rx.borrow_and_update();
                apply_connectivity(&mut ctrl, state).await;
            }
            changed = banner_rx.changed(), if banner_live => {
                if changed.is_err() {
                    banner_live = false;
                    continue;
                }
                let visible = *banner_rx.borrow_and_update();
                ctrl.set_notification_visible(visible);
                if visible {
                    println!("{}", render::banner(&banner.message));
                }
            }
        }
    }

    banner_handle.abort();
    if let Some(handle) = probe_handle {
        handle.abort();
    }
    Ok(())
}

async fn handle_line(ctrl: &mut AppController, line: &str) -> Action {
    match line {
        ":q" | ":quit" => return Action::Quit,
        ":help" => println!("{HELP}"),
        ":c" | ":unit" => {
            ctrl.toggle_unit();
            print_view(ctrl);
        }
        ":queue" => match ctrl.queue().pending() {
            Ok(pending) => print!("{}", render::queue_list(&pending)),
            Err(err) => eprintln!("Could not read offline queue: {err}"),
        },
        ":online" => apply_connectivity(ctrl, Connectivity::Online).await,
        ":offline" => apply_connectivity(ctrl, Connectivity::Offline).await,
        cmd if cmd == ":r" || cmd.starts_with(":r ") => {
            let index = cmd[2..].trim().parse::<usize>().ok().filter(|n| *n > 0);
            match index {
                Some(n) => {
                    let outcome = ctrl.select_recent(n - 1).await;
                    report_submit(ctrl, outcome);
                }
                None => println!("Usage: :r <n>"),
            }
        }
        cmd if cmd.starts_with(':') => println!("Unknown command {cmd}. Type :help."),
        city => {
            ctrl.set_input(city);
            if ctrl.connectivity().is_online() {
                println!("Loading...");
            }
            let outcome = ctrl.submit().await;
            report_submit(ctrl, outcome);
        }
    }
    Action::Continue
}

fn report_submit(ctrl: &AppController, outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Queued(_) => println!("{QUEUED_ALERT}"),
        SubmitOutcome::Ignored => println!("No such recent search."),
        SubmitOutcome::Fetched | SubmitOutcome::Failed | SubmitOutcome::QueueFailed => {
            print_view(ctrl)
        }
    }
}

async fn apply_connectivity(ctrl: &mut AppController, state: Connectivity) {
    let before = ctrl.connectivity();
    match ctrl.on_connectivity(state).await {
        Some(Ok(report)) => {
            println!("Back online.");
            print!("{}", render::drain_report(&report));
            if !report.is_empty() {
                print_view(ctrl);
            }
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "offline queue could not be drained");
            eprintln!("Back online, but the offline queue could not be read: {err}");
        }
        None if before != state => println!("You are offline. Searches will be queued."),
        None => {}
    }
}

fn print_view(ctrl: &AppController) {
    print!("{}", render::view(ctrl.view(), ctrl.temperature_display().as_deref()));
}

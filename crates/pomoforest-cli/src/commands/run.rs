use std::io::Write;

use clap::Args;
use pomoforest_core::driver;
use pomoforest_core::{
    AudioBackend, AudioController, Command, CommandPlayer, Config, Database, Event,
    FocusController, HistoryStore, KvStore, MemoryStore, SilentPlayer, Snapshot, SoundType,
    TokioClock,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

const HELP: &str = "commands: start (s) | pause (p) | give-up (g) | reset (r) | sound (t) | mute (m) | status | help | quit (q)";

#[derive(Args)]
pub struct RunArgs {
    /// Keep the forest in memory only; nothing is saved
    #[arg(long)]
    ephemeral: bool,
    /// Ambient sound for this run (rain or fire)
    #[arg(long)]
    sound: Option<SoundType>,
    /// Start with ambient sound muted
    #[arg(long)]
    muted: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let store: Box<dyn KvStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(Database::open()?)
    };
    let history = HistoryStore::load_with_key(store, config.storage.history_key.clone());

    let backend: Box<dyn AudioBackend> = if config.audio.player.is_empty() {
        Box::new(SilentPlayer::new())
    } else {
        Box::new(CommandPlayer::new(config.audio.player.clone()))
    };
    let sound = args.sound.unwrap_or(config.audio.sound);
    let muted = args.muted || config.audio.muted;
    let audio = AudioController::new(backend, config.assets_dir()?, sound, muted);
    let poll = config.poll_interval();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut controller =
            FocusController::new(history, audio, TokioClock::new()).with_celebration(celebrate);
        info!(trees = controller.history().len(), "session ready");

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(read_commands(tx));

        println!("{HELP}");
        println!("{}", status_line(&controller.snapshot()));
        driver::run(&mut controller, rx, render, poll).await;
    });

    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();
    Ok(())
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let input = line.trim();
        if input == "help" || input == "?" {
            println!("{HELP}");
            continue;
        }
        match parse_command(input) {
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if tx.send(command).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
}

fn parse_command(input: &str) -> Result<Option<Command>, String> {
    let command = match input.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "start" | "s" | "resume" => Command::Start,
        "pause" | "p" => Command::Pause,
        "give-up" | "giveup" | "g" => Command::GiveUp,
        "reset" | "r" => Command::Reset,
        "sound" | "t" => Command::ToggleSound,
        "rain" => Command::SetSound(SoundType::Rain),
        "fire" => Command::SetSound(SoundType::Fire),
        "mute" | "m" => Command::ToggleMute,
        "status" => Command::Refresh,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (type 'help')")),
    };
    Ok(Some(command))
}

fn status_line(snap: &Snapshot) -> String {
    let tree = snap.tree.as_deref().unwrap_or("  ");
    let mut line = format!(
        "{tree} {}  {:<9} {}",
        snap.formatted_time, snap.status, snap.message
    );
    if snap.audible {
        line.push_str(&format!("  {} {}", snap.sound.icon(), snap.sound_label));
    } else if snap.muted {
        line.push_str("  🔇");
    }
    line
}

fn render(event: &Event, snap: &Snapshot) {
    let line = status_line(snap);
    match event {
        Event::Countdown { .. } => {
            print!("\r{line:<72}");
            let _ = std::io::stdout().flush();
        }
        Event::SessionCompleted { forest_size, .. } => {
            println!("\r{line:<72}");
            println!("A new tree joins your forest ({forest_size} in total).");
        }
        _ => println!("\r{line:<72}"),
    }
}

fn celebrate() {
    print!("\x07");
    println!("\n🎉 Focus session complete! 🎉");
}

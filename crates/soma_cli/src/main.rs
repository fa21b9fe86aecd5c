use anyhow::Context;
use clap::Parser;
use soma_core::grammar::parse_input;
use soma_core::SomaConfig;
use soma_expression::Response;
use soma_limbic::AffectiveEngine;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Enter a stimulus as one of:
  kind@zone key=value ...      e.g. breath@neck_front_left airflow=10 humidity=0.9 temp=35
  {\"zone\": ..., \"stimulus\": {\"kind\": ...}}
  plain prose                  e.g. gently stroke my neck
Commands: state, reset, help, quit";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SOMA_CONFIG", default_value = "soma.toml")]
    config: PathBuf,

    /// Session file: loaded at start if it exists, written on exit
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Print each response as a JSON object
    #[arg(long)]
    json: bool,

    /// Print the state trace after each step
    #[arg(long)]
    trace: bool,
}

fn print_response(response: &Response, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(response)?);
    } else {
        println!("{}", response.render());
    }
    Ok(())
}

fn print_error(message: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "error": message }));
    } else {
        println!("error: {}", message);
    }
}

fn handle_line(engine: &mut AffectiveEngine, line: &str, args: &Args) -> anyhow::Result<()> {
    let directive = match parse_input(line, engine.physiology().body()) {
        Ok(Some(d)) => d,
        Ok(None) => {
            print_error("no body zone recognised", args.json);
            return Ok(());
        }
        Err(e) => {
            print_error(&e.to_string(), args.json);
            return Ok(());
        }
    };

    match engine.apply(&directive) {
        Ok(response) => {
            print_response(&response, args.json)?;
            if args.trace {
                println!("{}", engine.trace(3));
            }
        }
        Err(e) => print_error(&e.to_string(), args.json),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let config = SomaConfig::load_or_default(&args.config)?;
    let mut engine = AffectiveEngine::new(config).context("Invalid configuration")?;
    info!(zones = engine.physiology().body().len(), "engine ready");

    if let Some(path) = &args.session {
        if path.exists() {
            engine.load_session(path)?;
            info!("Resumed session from {}", path.display());
        }
    }

    let interactive = io::stdin().is_terminal();
    if interactive {
        println!("Soma online. Type 'help' for input forms, 'quit' to exit.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();

        match trimmed {
            "" => continue,
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "state" => println!("{}", engine.trace(5)),
            "reset" => {
                engine.reset();
                println!("session reset");
            }
            _ => handle_line(&mut engine, trimmed, &args)?,
        }
    }

    if let Some(path) = &args.session {
        engine.save_session(path)?;
        info!("Saved session to {}", path.display());
    }
    Ok(())
}

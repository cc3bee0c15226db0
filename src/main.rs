use std::io::{IsTerminal, Read, Write};

use clap::Parser;
use push_shell::{LineOutcome, Shell, ShellOptions};

#[derive(Parser)]
#[command(name = "push")]
#[command(about = "A tiny bytecode-compiled interactive shell core")]
#[command(version)]
struct Cli {
    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Report success/failure as JSON instead of plain text
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        Some(s)
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Error: cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else if !std::io::stdin().is_terminal() {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        Some(buf)
    } else {
        None
    };

    let mut shell = Shell::new(ShellOptions::default());

    match script {
        Some(script) => run_script(&mut shell, &script, cli.json).await,
        None => repl(&mut shell).await,
    }
}

async fn run_script(shell: &mut Shell, script: &str, json: bool) {
    let mut had_error = false;
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        shell.poll_jobs(200).await;
        match shell.run_line(line).await {
            LineOutcome::CompileFailed(err) => {
                eprintln!("Compile error: {}", err);
                had_error = true;
            }
            LineOutcome::RuntimeFailed(err) => {
                eprintln!("Error: {}", err);
                had_error = true;
            }
            LineOutcome::Backgrounded { job_id } => {
                println!("[{}] started {}", job_id, line);
            }
            LineOutcome::Compiled => {}
        }
    }

    if json {
        println!("{}", serde_json::json!({ "ok": !had_error }));
    }
    if had_error {
        std::process::exit(1);
    }
}

async fn repl(shell: &mut Shell) {
    println!("PUSH VM {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help'. Use 'exit' to quit.");
    println!("Background: add '&' at end. Job control: jobs/kill/fg.");

    loop {
        shell.poll_jobs(200).await;

        print!("push> ");
        if std::io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        match shell.run_line(line).await {
            LineOutcome::CompileFailed(err) => println!("Compile error: {}", err),
            LineOutcome::RuntimeFailed(err) => println!("Error: {}", err),
            LineOutcome::Backgrounded { job_id } => println!("[{}] started {}", job_id, line),
            LineOutcome::Compiled => {}
        }
    }
}

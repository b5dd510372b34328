use std::io::Read;

use clap::Parser;

use sandsh::{Session, SessionOptions};

#[derive(Parser)]
#[command(name = "sandsh")]
#[command(about = "A sandboxed shell emulator with an in-memory filesystem")]
#[command(version)]
struct Cli {
    /// Execute the script given on the command line
    #[arg(short = 'c')]
    script: Option<String>,

    /// Working directory inside the sandbox
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Print the result as JSON (stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute (read from the host, run in the sandbox)
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let script = if let Some(script) = cli.script {
        script
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("sandsh: cannot read {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("sandsh: no script; use -c 'script', a file argument, or pipe via stdin");
            std::process::exit(2);
        }
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer).unwrap_or_default();
        buffer
    };

    let mut session = Session::new(SessionOptions { cwd: cli.cwd, ..Default::default() });
    let result = session.exec(&script);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.stdout,
                "stderr": result.stderr,
                "exitCode": result.exit_code,
            })
        );
    } else {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
    }
    std::process::exit(result.exit_code);
}

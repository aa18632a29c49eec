use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the crime scene")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests, deny, then the asset smoke run
    Check,
    Fmt,
    Clippy,
    Test,
    Deny,
    Doc,
    Build,
    /// Validate the shipped scene config against the room and run it headless
    Smoke,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            deny()?;
            smoke()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Deny => deny()?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Smoke => smoke()?,
    }

    Ok(())
}

/// Run `cargo <args>` and fail with `step` in the message if it exits non-zero.
fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("fmt check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("tests", &["test", "--workspace"])
}

fn deny() -> Result<()> {
    cargo("deny", &["deny", "check", "licenses", "bans", "sources"])
}

fn smoke() -> Result<()> {
    let run_cli = |step: &str, extra: &[&str]| {
        let mut args = vec!["run", "-q", "-p", "crimescene-cli", "--"];
        args.extend_from_slice(extra);
        cargo(step, &args)
    };
    run_cli("validate", &["validate"])?;
    run_cli("simulate", &["simulate", "--steps", "120", "--hold", "w"])
}

//! Shell-completion generation for the CLI, via `clap_complete`.

use crate::Cli;
use anyhow::{anyhow, Result};
use clap::CommandFactory;
use clap_complete::{
    generate,
    shells::{Bash, Fish, PowerShell, Zsh},
};

pub fn print_to_stdout(shell: &str) -> Result<()> {
    let mut cmd = Cli::command();
    let name = "vanity-forge";
    match shell {
        "bash" => generate(Bash, &mut cmd, name, &mut std::io::stdout()),
        "zsh" => generate(Zsh, &mut cmd, name, &mut std::io::stdout()),
        "fish" => generate(Fish, &mut cmd, name, &mut std::io::stdout()),
        "powershell" | "pwsh" => generate(PowerShell, &mut cmd, name, &mut std::io::stdout()),
        s => return Err(anyhow!("unsupported shell: {}", s)),
    };
    Ok(())
}

//! `gyre completions` — generate shell completion scripts.

use std::io;

use clap_complete::Shell;

/// Write the completion script for `shell` to stdout.
pub fn run_completions(shell: Shell, command: &mut clap::Command) {
    clap_complete::generate(shell, command, "gyre", &mut io::stdout());
}

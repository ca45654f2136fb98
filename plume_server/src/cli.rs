//! The `plume_server` binary takes no arguments. Passing any at all prints the help text and the current `PLUME_*`
//! settings instead of starting the server.

use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty. Returns true if help was printed.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "PLUME_HOST",
        "PLUME_PORT",
        "PLUME_MAX_REQUEST_BODY_SIZE",
        "PLUME_MIN_USERNAME_LENGTH",
        "PLUME_MAX_USERNAME_LENGTH",
        "PLUME_MIN_PASSWORD_LENGTH",
        "PLUME_MAX_PASSWORD_LENGTH",
        "PLUME_TOKEN_TIMEOUT",
        "PLUME_USERS_PATH",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

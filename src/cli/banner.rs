//! ASCII art banner for interactive mode.

use std::io::IsTerminal;

/// ANSI true-color escape sequences for the banner palette.
struct Colors {
    bracket: &'static str,
    arrow: &'static str,
    title: &'static str,
    subtitle: &'static str,
    reset: &'static str,
}

const COLOR: Colors = Colors {
    bracket: "\x1b[38;2;90;120;140m",
    arrow: "\x1b[38;2;120;200;160m",
    title: "\x1b[1;38;2;220;165;120m",
    subtitle: "\x1b[38;2;100;100;120m",
    reset: "\x1b[0m",
};

const PLAIN: Colors = Colors {
    bracket: "",
    arrow: "",
    title: "",
    subtitle: "",
    reset: "",
};

/// Prints the latchpoint banner to stdout.
///
/// Renders ANSI true-color when stdout is a terminal, falls back to plain
/// text otherwise.
pub fn print_banner() {
    let c = if std::io::stdout().is_terminal() { &COLOR } else { &PLAIN };
    println!(
        "{}[{}>>{}{}]{} {}latchpoint{}",
        c.bracket, c.arrow, c.reset, c.bracket, c.reset, c.title, c.reset
    );
    println!("{}  latency-arbitrage for binary-outcome prediction markets{}", c.subtitle, c.reset);
    println!();
}

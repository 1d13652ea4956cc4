mod session;
mod sim;

use std::env;
use std::io::{self, Write};
use std::process;

use session::{BenchProfile, Session};

fn main() -> io::Result<()> {
    let profile = parse_profile().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: emulator [--profile <flight|wraparound>] | emulator <flight|wraparound>");
        process::exit(2);
    });

    let stdin = io::stdin();
    let reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    writeln!(
        writer,
        "Para-Ceres avionics bench ready. Type `help` for commands or `exit` to quit."
    )?;

    Session::new(profile).run(reader, writer)
}

fn parse_profile() -> Result<BenchProfile, String> {
    let mut args = env::args().skip(1);
    if let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--profile=") {
            BenchProfile::from_tag(value)
        } else if arg == "--profile" {
            if let Some(value) = args.next() {
                BenchProfile::from_tag(&value)
            } else {
                Err("Expected value after --profile".to_string())
            }
        } else {
            BenchProfile::from_tag(&arg)
        }
    } else {
        Ok(BenchProfile::Flight)
    }
}

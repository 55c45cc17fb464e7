use clap::Parser;
use gym_ants::env::{AntsEnv, Environment, RenderMode};
use gym_ants::options::Options;
use gym_ants::Order;
use std::io::{stdin, BufRead};
use std::process::ExitCode;
use tracing::Level;

/// Plays the environment from the terminal, one `row col direction` line per step.
fn main() -> ExitCode {
    let options = Options::parse();
    let level = match options.logging.verbose {
        true => Level::DEBUG,
        false => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut env = match AntsEnv::from_args(std::env::args_os()) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut total = 0.0;
    let mut steps = 0;
    print_board(&env);

    for line in stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        let line = line.trim();
        if line == "q" {
            break;
        }

        let order: Order = match line.parse() {
            Ok(order) => order,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let result = env.step(order);
        total += result.reward;
        steps += 1;
        println!("reward = {}, turn = {}", result.reward, result.info.turn);
        if let Some(reason) = result.info.rejected {
            println!("rejected: {reason}");
        }
        print_board(&env);

        if result.done {
            break;
        }
    }

    println!("Steps: {steps}, Total reward: {total}");
    ExitCode::SUCCESS
}

fn print_board(env: &AntsEnv) {
    if let Ok(Some(board)) = env.render(RenderMode::Ansi) {
        println!("{board}\n");
    }
}

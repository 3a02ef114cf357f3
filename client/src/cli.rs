use std::{
    io::{self, Write},
    path::Path,
    process::exit,
    sync::{Arc, RwLock},
};

use anyhow::{Context, bail};
use colored::Colorize;

use crate::{
    settings::CellColor,
    state::{State, read_state, write_state},
};

const MAX_STEPS_PER_COMMAND: usize = 10_000;

const HELP: &str = "\
commands:
  step [n]                         advance n generations (default 1, max 10000) even if paused
  pause | run | stop               toggle, start or stop the simulation
  toggle <x> <y>                   flip one cell (x = column, y = row)
  reset | clear                    randomize or empty the grid
  resize <rows> <columns> [random] replace the grid with a new size
  interval <ms>                    time between generations
  configure <rows> <columns> <ms>  resize randomly, set interval and persist
  color live|dead <name>           set and persist a cell color
  size <1-3>                       set and persist the cell display size
  save <path> | load <path>        write or read a pattern file
  quicksave | quickload            timestamped save / newest pattern
  export | import <text>           pattern as base64 text
  show | status | help | exit";

pub fn run_cli(state_arc: Arc<RwLock<State>>) {
    for line_res in io::stdin().lines() {
        let line = match line_res {
            Ok(line) => line,
            Err(e) => {
                log::error!("Couldn't read console input: {e}");
                return;
            }
        };

        let mut args = line.split_whitespace().peekable();
        if args.peek().is_none() {
            continue;
        }

        let mut stdout = io::stdout().lock();
        match handle_cmd(&state_arc, args, &mut stdout) {
            Ok(()) => {
                let _ = writeln!(stdout, "{}", "OK".green());
            }
            Err(e) => eprintln!("{} {e:#}", "!".red()),
        }
    }
}

fn handle_cmd<'a, I, W>(
    state_lock: &RwLock<State>,
    mut args: I,
    out: &mut W,
) -> anyhow::Result<()>
where
    I: Iterator<Item = &'a str>,
    W: Write,
{
    let command = args.next().context("No command")?;

    // Read-only commands only take the read lock so the window keeps drawing.
    match command {
        "show" => {
            let state = read_state(state_lock);
            writeln!(out, "{}", state.render_text())?;
            return Ok(());
        }
        "status" => {
            let state = read_state(state_lock);
            writeln!(out, "{}", state.status_line())?;
            return Ok(());
        }
        "export" => {
            let state = read_state(state_lock);
            writeln!(out, "{}", state.simulation.export_text()?)?;
            return Ok(());
        }
        "save" => {
            let path = args.next().context("missing path")?;
            read_state(state_lock).save_pattern(Path::new(path))?;
            return Ok(());
        }
        "quicksave" => {
            let path = read_state(state_lock).quick_save()?;
            writeln!(out, "saved {}", path.display())?;
            return Ok(());
        }
        "help" => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        "step" => {
            let times = args.next().unwrap_or("1").parse::<usize>()?;
            if times > MAX_STEPS_PER_COMMAND {
                bail!("At most {MAX_STEPS_PER_COMMAND} steps per command");
            }

            // Locked per step so the window and ticker keep running in between.
            for _ in 0..times {
                write_state(state_lock).simulation.step_once();
            }
            return Ok(());
        }
        "exit" => exit(0),
        _ => {}
    }

    let mut state = write_state(state_lock);

    match command {
        "pause" => {
            state.simulation.toggle_pause();
        }

        "run" => {
            if state.simulation.is_paused() {
                state.simulation.toggle_pause();
            }
        }

        "stop" => {
            state.simulation.pause();
        }

        "toggle" => {
            let x = args.next().context("missing x")?.parse::<usize>()?;
            let y = args.next().context("missing y")?.parse::<usize>()?;

            let tile = state.simulation.toggle_cell(x, y)?;
            writeln!(out, "({x}, {y}) is now {tile:?}")?;
        }

        "reset" => {
            state.simulation.reset(true);
        }

        "clear" => {
            state.simulation.clear();
        }

        "resize" => {
            let rows = args.next().context("missing rows")?.parse::<usize>()?;
            let columns = args.next().context("missing columns")?.parse::<usize>()?;
            let randomize = match args.next() {
                None => false,
                Some("random") => true,
                Some(other) => bail!("Expected `random`, got `{other}`"),
            };

            state.simulation.resize(rows, columns, randomize)?;
        }

        "interval" => {
            let interval_ms = args.next().context("missing interval")?.parse::<u64>()?;
            state.simulation.set_interval(interval_ms)?;
        }

        "configure" => {
            let rows = args.next().context("missing rows")?.parse::<usize>()?;
            let columns = args.next().context("missing columns")?.parse::<usize>()?;
            let interval_ms = args.next().context("missing interval")?.parse::<u64>()?;

            state.configure(rows, columns, interval_ms)?;
        }

        "color" => {
            let target = args.next().context("missing live|dead")?;
            let color = args
                .next()
                .context("missing color name")?
                .parse::<CellColor>()
                .context("Unknown color")?;

            match target {
                "live" => state.update_settings(|settings| settings.live_color = color)?,
                "dead" => state.update_settings(|settings| settings.dead_color = color)?,
                other => bail!("Expected `live` or `dead`, got `{other}`"),
            }
        }

        "size" => {
            let cell_size = args.next().context("missing size")?.parse::<u8>()?;
            state.update_settings(|settings| settings.cell_size = cell_size)?;
        }

        "load" => {
            let path = args.next().context("missing path")?;
            state.load_pattern(Path::new(path))?;
        }

        "quickload" => {
            let path = state.load_latest()?;
            writeln!(out, "loaded {}", path.display())?;
        }

        "import" => {
            let text = args.next().context("missing pattern text")?;
            state.simulation.import_text(text)?;
        }

        _ => bail!("Unknown command, try `help`"),
    }

    Ok(())
}

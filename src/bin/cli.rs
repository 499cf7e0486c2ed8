//! Dispenser panel command line interface.

use std::{
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::{crate_authors, crate_description, crate_name, crate_version, App, AppSettings::*, Arg};
use console::style;
use log::{debug, error, trace, LevelFilter};
use simplelog::*;

use dispenser_panel::{
    self as dp,
    surface::{
        keyboard::{poll_key, Key},
        Intent, TerminalSurface,
    },
    transport::{Connector, FakeDevice, SerialConnector},
    ControlPanel,
};

const SIMULATED_PORT: &str = "sim0";

fn main() {
    println!("dispenser-panel v{}", crate_version!());

    let quit = Arc::new(AtomicBool::new(false));
    let quit_handler = Arc::clone(&quit);
    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        quit_handler.store(true, Ordering::SeqCst);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Control panel for the envelope dispenser. It connects to the \
            dispenser board over its serial port (9600 baud), shows the state \
            the board reports and lets the operator dispense an envelope, \
            request the status or reset the machine.\n\
            \n\
            The dispense action is only available while the board reports it \
            is ready, and is locked after each dispense until the board \
            reports its new state.\n\
            \n\
            Keys:\n\
               \tc  connect / disconnect\n\
               \tp  pick the port among the detected ones\n\
               \tl  list serial ports\n\
               \td  dispense an envelope\n\
               \ts  request the status\n\
               \tr  reset the dispenser\n\
               \th  show the keys\n\
               \tq  quit (also Esc or Ctrl+C)\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the serial port of the dispenser")
                .long_help(
                    "the serial port of the dispenser, e.g. COM5 or \
                     /dev/ttyACM0; another one can be picked while the \
                     panel is running.",
                )
                .short("-t")
                .long("--tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("NO_CONNECT")
                .help("do not connect automatically at start-up")
                .long("--no-connect"),
        )
        .arg(
            Arg::with_name("SIMULATE")
                .help("talk to a simulated dispenser instead of a serial port")
                .long("--simulate")
                .conflicts_with("DEVICE_TTY"),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'dispenser-panel -v -v -v' or 'dispenser-panel -vvv' vs
    // 'dispenser-panel -v'
    let log_level = match matches.occurrences_of("v") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    let simulate = matches.is_present("SIMULATE");
    let mut builder = dp::SettingsBuilder::default().auto_connect(!matches.is_present("NO_CONNECT"));
    if simulate {
        builder = builder.path(SIMULATED_PORT);
    } else if let Some(path) = matches.value_of("DEVICE_TTY") {
        builder = builder.path(path);
    }
    let settings = builder.finalize();

    let connector: Box<dyn Connector> = if simulate {
        Box::new(FakeDevice::dispenser(SIMULATED_PORT).connector())
    } else {
        Box::new(SerialConnector)
    };

    // Run the panel ===========================================================

    let mut panel = ControlPanel::new(settings, connector, TerminalSurface::new());
    print_keys();
    if panel.settings().auto_connect {
        let path = panel.settings().path.clone();
        if let Err(err) = with_spinner(&mut panel, &path, |panel| panel.start()) {
            debug!("start-up connection failed: {}", err);
        }
    }

    let exit_code = run(&mut panel, &quit);
    debug!("exit code: {}", exit_code);
    process::exit(exit_code);
}

/// The panel event loop: drain received lines, then wait for a key for at
/// most one poll interval.
fn run(panel: &mut ControlPanel<TerminalSurface>, quit: &AtomicBool) -> i32 {
    let tick = panel.settings().poll_interval;
    let mut port = panel.settings().path.clone();

    while !quit.load(Ordering::SeqCst) {
        panel.poll();

        let key = match poll_key(tick) {
            Ok(Some(key)) => key,
            Ok(None) => continue,
            Err(err) => {
                error!("terminal error: {}", err);
                panel.disconnect();
                return 1;
            }
        };

        let intent = match key {
            Key::Interrupt | Key::Escape | Key::Char('q') => break,
            Key::Char('h') => {
                print_keys();
                continue;
            }
            Key::Char('p') => {
                if let Some(picked) = pick_port(panel) {
                    port = picked;
                    println!("Port set to {}", style(&port).cyan());
                }
                continue;
            }
            Key::Char('c') if panel.is_connected() => Intent::Disconnect,
            Key::Char('c') => Intent::Connect(port.clone()),
            Key::Char('l') => Intent::ListPorts,
            Key::Char('d') => Intent::Dispense,
            Key::Char('s') => Intent::Status,
            Key::Char('r') => Intent::Reset,
            Key::Char(other) => {
                trace!("ignored key {:?}", other);
                continue;
            }
        };

        // Failures were already reported on the surface.
        let result = match intent {
            Intent::Connect(port) => with_spinner(panel, &port, |panel| panel.connect(&port)),
            intent => panel.handle(intent),
        };
        if let Err(err) = result {
            debug!("{}", err);
        }
    }

    panel.disconnect();
    0
}

/// Run a connection attempt with a spinner covering the settle time.
fn with_spinner<F>(panel: &mut ControlPanel<TerminalSurface>, port: &str, connect: F) -> dp::Result<()>
where
    F: FnOnce(&mut ControlPanel<TerminalSurface>) -> dp::Result<()>,
{
    panel
        .surface_mut()
        .start_spinner(format!("⏳ Waiting for {} to be ready...", style(port).cyan()));
    let result = connect(panel);
    panel.surface_mut().stop_spinner();
    result
}

fn pick_port(panel: &mut ControlPanel<TerminalSurface>) -> Option<String> {
    let ports = panel.list_ports().ok()?;
    if ports.is_empty() {
        return None;
    }
    match panel.surface_mut().pick_port(&ports) {
        Ok(selection) => selection,
        Err(err) => {
            error!("port selection failed: {}", err);
            None
        }
    }
}

fn print_keys() {
    println!(
        "{}",
        style("[c] connect/disconnect  [p] pick port  [l] list ports  [d] dispense  [s] status  [r] reset  [h] help  [q] quit")
            .dim()
    );
}

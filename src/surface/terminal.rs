//! A surface printing to the terminal.

use chrono::Local;
use console::{style, StyledObject, Term};
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::{ProgressBar, ProgressStyle};

use super::Surface;
use crate::protocol::{Field, FieldValue, SystemState, Tone};
use crate::transport::PortInfo;

// =============================================================================
// Public Interface
// =============================================================================

/// Renders the panel as a timestamped log on stdout, with the state, fields
/// and connection status printed as they change.
#[derive(Default)]
pub struct TerminalSurface {
    spinner: Option<ProgressBar>,
}
impl TerminalSurface {
    pub fn new() -> Self {
        TerminalSurface { spinner: None }
    }

    /// Show a spinner until [`stop_spinner`](Self::stop_spinner) is called.
    /// Log lines printed meanwhile go above it.
    pub fn start_spinner(&mut self, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(120);
        pb.set_style(
            ProgressStyle::default_spinner()
                // For more spinners check out the cli-spinners project:
                // https://github.com/sindresorhus/cli-spinners/blob/master/spinners.json
                .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
                .template("{spinner:.blue} {msg}"),
        );
        pb.set_message(message);
        self.spinner = Some(pb);
    }

    pub fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Let the operator pick one of `ports`. Returns `None` if the selection
    /// was cancelled with `Esc`.
    pub fn pick_port(&mut self, ports: &[PortInfo]) -> std::io::Result<Option<String>> {
        let term = Term::buffered_stderr();
        let theme = ColorfulTheme::default();

        let mut select = Select::with_theme(&theme);
        select.with_prompt("Select the dispenser port");
        for port in ports {
            select.item(port.to_string());
        }
        let selection = select.default(0).interact_on_opt(&term)?;
        Ok(selection.and_then(|index| ports.get(index)).map(|p| p.name.clone()))
    }

    fn print(&self, line: String) {
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}
impl Surface for TerminalSurface {
    fn log(&mut self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.print(format!("{} {}", style(format!("[{}]", timestamp)).dim(), message));
    }

    fn field_update(&mut self, field: Field, value: Option<FieldValue>) {
        let shown = match value {
            Some(value) => toned(value.to_string(), value.tone()),
            None => style("---".to_string()).dim(),
        };
        self.print(format!("           {:>9}: {}", field.to_string(), shown));
    }

    fn state_update(&mut self, state: SystemState, dispense_enabled: bool) {
        let dispense = if dispense_enabled {
            style("dispense enabled").green()
        } else {
            style("dispense disabled").dim()
        };
        self.print(format!(
            "           {:>9}: {} ({})",
            "State",
            toned(state.to_string(), state.tone()).bold(),
            dispense
        ));
    }

    fn connection_update(&mut self, connected: bool) {
        let status = if connected {
            style("● Connected").green()
        } else {
            style("● Disconnected").red()
        };
        self.print(format!("           {}", status));
    }

    fn notify_error(&mut self, title: &str, message: &str) {
        self.stop_spinner();
        eprintln!("{} {}", style("💥").red(), style(title).red().bold());
        for line in message.lines() {
            eprintln!("   {}", line);
        }
    }

    fn show_ports(&mut self, ports: &[PortInfo]) {
        if ports.is_empty() {
            self.print(style("No serial port found!").yellow().to_string());
            return;
        }
        self.print("Available ports:".into());
        for port in ports {
            self.print(format!("   {}", style(port).cyan()));
        }
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn toned(text: String, tone: Tone) -> StyledObject<String> {
    let styled = style(text);
    match tone {
        Tone::Good => styled.green(),
        Tone::Warning => styled.yellow(),
        Tone::Error => styled.red(),
        Tone::Busy => styled.blue(),
    }
}

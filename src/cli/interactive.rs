use std::io::{BufRead, Write};

use anyhow::Result;

use crate::core::{ReportKind, Severity};
use crate::engine::Engine;
use crate::error::ReportError;
use crate::ui::UiConfig;
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuChoice {
    Register,
    ById,
    BySeverity,
    SinceDate,
    ListIds,
    Export,
    Quit,
}

pub(crate) fn parse_menu_choice(input: &str) -> Option<MenuChoice> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "add" | "register" => Some(MenuChoice::Register),
        "2" | "id" => Some(MenuChoice::ById),
        "3" | "severity" => Some(MenuChoice::BySeverity),
        "4" | "date" | "since" => Some(MenuChoice::SinceDate),
        "5" | "ids" => Some(MenuChoice::ListIds),
        "6" | "export" => Some(MenuChoice::Export),
        "7" | "q" | "quit" | "exit" => Some(MenuChoice::Quit),
        _ => None,
    }
}

/// Menu numbers 1-3 or a severity name.
pub(crate) fn parse_severity_choice(input: &str) -> Result<Severity, ReportError> {
    match input.trim() {
        "1" => Ok(Severity::High),
        "2" => Ok(Severity::Medium),
        "3" => Ok(Severity::Low),
        other => validate::parse_severity(other),
    }
}

struct Menu<'a, R, W> {
    engine: &'a mut Engine,
    input: R,
    out: W,
    ui: &'a UiConfig,
}

/// Runs until the user quits or input ends. Bad input and failed saves are
/// reported and the menu comes back; only broken console I/O ends the loop
/// with an error.
pub(crate) fn run_menu<R: BufRead, W: Write>(
    engine: &mut Engine,
    input: R,
    out: W,
    ui: &UiConfig,
) -> Result<()> {
    let mut menu = Menu {
        engine,
        input,
        out,
        ui,
    };
    writeln!(menu.out, "Equipment fault reports")?;

    loop {
        menu.print_main_menu()?;
        let Some(line) = menu.ask("Choose an option: ")? else {
            break;
        };
        let Some(choice) = parse_menu_choice(&line) else {
            writeln!(menu.out, "Unknown option. Try again.")?;
            continue;
        };
        let keep_going = match choice {
            MenuChoice::Register => menu.register()?,
            MenuChoice::ById => menu.by_id()?,
            MenuChoice::BySeverity => menu.by_severity()?,
            MenuChoice::SinceDate => menu.since_date()?,
            MenuChoice::ListIds => menu.list_ids()?,
            MenuChoice::Export => menu.export()?,
            MenuChoice::Quit => false,
        };
        if !keep_going {
            break;
        }
    }

    writeln!(menu.out, "Bye.")?;
    menu.out.flush()?;
    Ok(())
}

impl<R: BufRead, W: Write> Menu<'_, R, W> {
    fn print_main_menu(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "----- MAIN MENU -----")?;
        writeln!(self.out, "1. Register a new report")?;
        writeln!(self.out, "2. Reports by equipment id")?;
        writeln!(self.out, "3. Reports by severity")?;
        writeln!(self.out, "4. Reports since a date")?;
        writeln!(self.out, "5. List equipment ids")?;
        writeln!(self.out, "6. Export reports")?;
        writeln!(self.out, "7. Exit")?;
        Ok(())
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask_kind(&mut self, title: &str) -> Result<Option<Option<ReportKind>>> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "1. Hardware")?;
        writeln!(self.out, "2. Software")?;
        Ok(self.ask("Choose an option: ")?.map(|s| validate::parse_kind(&s)))
    }

    fn register(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- REGISTER REPORT -----")?;
        let Some(kind) = self.ask_kind("Report type:")? else {
            return Ok(false);
        };
        let Some(kind) = kind else {
            writeln!(self.out, "Invalid report type.")?;
            return Ok(true);
        };

        let Some(answers) = self.collect(&[
            "Equipment id: ",
            "Description: ",
            "Severity (HIGH, MEDIUM, LOW): ",
            "Report date (YYYY/MM/DD): ",
        ])?
        else {
            return Ok(false);
        };
        let header = match validate::header(&answers[0], &answers[1], &answers[2], &answers[3]) {
            Ok(header) => header,
            Err(err) => return self.rejected(&err),
        };

        let report = match kind {
            ReportKind::Hardware => {
                let Some(a) = self.collect(&[
                    "Component type: ",
                    "Component serial number: ",
                    "Does the component need replacing? (y/n): ",
                ])?
                else {
                    return Ok(false);
                };
                validate::hardware_report(header, &a[0], &a[1], validate::parse_yes_no(&a[2]))
            }
            ReportKind::Software => {
                let Some(a) = self.collect(&[
                    "Operating system: ",
                    "Software name: ",
                    "Software version (A.B.C): ",
                ])?
                else {
                    return Ok(false);
                };
                validate::software_report(header, &a[0], &a[1], &a[2])
            }
        };
        let report = match report {
            Ok(report) => report,
            Err(err) => return self.rejected(&err),
        };

        match self.engine.add_report(report) {
            Ok(()) => writeln!(self.out, "Report recorded.")?,
            Err(err) => writeln!(
                self.out,
                "Report recorded for this session but NOT saved: {err:#}"
            )?,
        }
        Ok(true)
    }

    fn collect(&mut self, prompts: &[&str]) -> Result<Option<Vec<String>>> {
        let mut answers = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            answers.push(answer);
        }
        Ok(Some(answers))
    }

    fn rejected(&mut self, err: &ReportError) -> Result<bool> {
        writeln!(self.out, "Could not register the report: {err}")?;
        Ok(true)
    }

    fn by_id(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- REPORTS BY EQUIPMENT ID -----")?;
        if self.engine.store().is_empty() {
            writeln!(self.out, "No reports recorded yet.")?;
            return Ok(true);
        }
        writeln!(self.out, "Known equipment:")?;
        crate::ui::print_id_overview(&mut self.out, self.engine.store(), self.ui);

        let Some(id) = self.ask("\nEquipment id to look up: ")? else {
            return Ok(false);
        };
        let found = self.engine.store().find_by_equipment_id(id.trim());
        crate::ui::print_reports(&mut self.out, &found, self.ui);
        Ok(true)
    }

    fn by_severity(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- REPORTS BY SEVERITY -----")?;
        for (idx, severity) in Severity::ALL.iter().enumerate() {
            writeln!(self.out, "{}. {severity}", idx + 1)?;
        }
        let Some(raw) = self.ask("Choose a severity: ")? else {
            return Ok(false);
        };
        match parse_severity_choice(&raw) {
            Ok(severity) => {
                let found = self.engine.store().find_by_severity(severity);
                crate::ui::print_reports(&mut self.out, &found, self.ui);
            }
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(true)
    }

    fn since_date(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- REPORTS SINCE A DATE -----")?;
        let Some(range) = self.engine.store().date_range() else {
            writeln!(self.out, "No reports recorded yet.")?;
            return Ok(true);
        };
        crate::ui::print_date_range(&mut self.out, Some(range));

        let Some(raw) = self.ask("Show reports since (YYYY/MM/DD): ")? else {
            return Ok(false);
        };
        match validate::parse_date(&raw) {
            Ok(date) => {
                let found = self.engine.store().find_since(date);
                crate::ui::print_reports(&mut self.out, &found, self.ui);
            }
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(true)
    }

    fn list_ids(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- EQUIPMENT IDS -----")?;
        crate::ui::print_id_overview(&mut self.out, self.engine.store(), self.ui);
        crate::ui::print_date_range(&mut self.out, self.engine.store().date_range());
        Ok(true)
    }

    fn export(&mut self) -> Result<bool> {
        writeln!(self.out, "\n----- EXPORT REPORTS -----")?;
        let Some(kind) = self.ask_kind("Export type:")? else {
            return Ok(false);
        };
        let Some(kind) = kind else {
            writeln!(self.out, "Invalid option.")?;
            return Ok(true);
        };
        match self.engine.export(kind) {
            Ok(run) => writeln!(
                self.out,
                "{} report written to {} ({} entries)",
                kind.label(),
                run.outcome.path.display(),
                run.outcome.matched
            )?,
            Err(err) => writeln!(self.out, "Export failed: {err:#}")?,
        }
        Ok(true)
    }
}

//! Line-oriented prompter over any reader and writer

use colored::Colorize;
use confwiz_core::prompt::{parse_choice, parse_confirm, parse_multi};
use confwiz_core::{Aborted, FieldDescriptor, InputCheck, InputError, Prompter, ABORT_ANSWER};
use confwiz_schema::{FieldError, FieldPath, StructureDef};
use std::fmt;
use std::io::{BufRead, Write};

/// Interactive prompter; end of input cancels the run
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    /// Prompter reading answers from `input` and writing prompts to `output`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Recover the writer
    pub fn into_output(self) -> W {
        self.output
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) -> Result<(), Aborted> {
        self.output.write_fmt(args).and_then(|()| self.output.flush()).map_err(|_| Aborted)
    }

    fn read_line(&mut self) -> Result<String, Aborted> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Err(Aborted),
            Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn ask<T>(
        &mut self,
        message: &str,
        hint: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> Result<T, Aborted> {
        loop {
            if hint.is_empty() {
                self.emit(format_args!("{} {} ", "?".green().bold(), message.bold()))?;
            } else {
                self.emit(format_args!("{} {} {} ", "?".green().bold(), message.bold(), hint.dimmed()))?;
            }
            let answer = self.read_line()?;
            if answer.trim() == ABORT_ANSWER {
                return Err(Aborted);
            }
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => self.emit(format_args!("  {} {}\n", ">>".red(), err.0.red()))?,
            }
        }
    }

    fn list_choices(&mut self, choices: &[String], marked: impl Fn(usize) -> bool, mark: &str) -> Result<(), Aborted> {
        for (i, choice) in choices.iter().enumerate() {
            let marker = if marked(i) { mark } else { " " };
            self.emit(format_args!("  {marker} {}) {choice}\n", i + 1))?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, Aborted> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        self.ask(message, hint, |a| parse_confirm(a, default))
    }

    fn text(&mut self, message: &str, default: &str, check: InputCheck<'_>) -> Result<String, Aborted> {
        let hint = if default.is_empty() { String::new() } else { format!("[{default}]") };
        self.ask(message, &hint, |a| {
            let resolved = if a.is_empty() { default } else { a };
            check(resolved).map(|()| resolved.to_string())
        })
    }

    fn select(&mut self, message: &str, choices: &[String], default: Option<usize>) -> Result<usize, Aborted> {
        self.list_choices(choices, |i| Some(i) == default, ">")?;
        self.ask(message, "(name or number)", |a| parse_choice(a, choices, default))
    }

    fn multi_select(&mut self, message: &str, choices: &[String], checked: &[bool]) -> Result<Vec<usize>, Aborted> {
        self.list_choices(choices, |i| checked.get(i).copied().unwrap_or(false), "*")?;
        self.ask(message, "(comma separated, - for none)", |a| parse_multi(a, choices, checked))
    }

    fn structure_header(&mut self, structure: &StructureDef, path: &FieldPath) {
        let title = if path.is_empty() { structure.name().to_string() } else { path.breadcrumb() };
        let header = format!("--- {title} ({}) ---", structure.name());
        let _ = writeln!(self.output, "\n{}", header.cyan().bold());
    }

    fn field_header(&mut self, field: &FieldDescriptor, path: &FieldPath) {
        let _ = writeln!(self.output, "{} {}", path.breadcrumb().cyan(), field.shape().to_string().bold());
        if let Some(description) = field.description() {
            let _ = writeln!(self.output, "  {}", description.dimmed());
        }
        let constraints = field.constraints().entries();
        if !constraints.is_empty() {
            let parts: Vec<String> = constraints.iter().map(|(k, v)| format!("{k}={v}")).collect();
            let _ = writeln!(self.output, "  {}", format!("Constraints: {}", parts.join(", ")).dimmed());
        }
    }

    fn show_errors(&mut self, errors: &[FieldError]) {
        let _ = crate::display::validation_errors(&mut self.output, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confwiz_core::prompt::accept_any;
    use std::io::Cursor;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        colored::control::set_override(false);
        TerminalPrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn reprompts_until_answer_parses() {
        let mut p = prompter("maybe\nyes\n");
        assert!(p.confirm("Continue?", false).unwrap());
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("? Continue? (y/N)"));
        assert!(out.contains(">> Please answer yes or no"));
    }

    #[test]
    fn empty_line_takes_default_text() {
        let mut p = prompter("\n");
        assert_eq!(p.text("Host:", "localhost", &accept_any).unwrap(), "localhost");
    }

    #[test]
    fn select_lists_numbered_choices() {
        let choices = vec!["a".to_string(), "b".to_string()];
        let mut p = prompter("2\n");
        assert_eq!(p.select("Pick:", &choices, Some(0)).unwrap(), 1);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("  > 1) a\n    2) b\n"));
    }

    #[test]
    fn end_of_input_aborts() {
        let mut p = prompter("");
        assert_eq!(p.confirm("Continue?", true), Err(Aborted));
        let mut p = prompter("!abort\n");
        assert_eq!(p.text("Name:", "", &accept_any), Err(Aborted));
    }
}

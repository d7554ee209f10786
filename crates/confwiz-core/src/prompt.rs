//! Prompt port
//!
//! Strategies never touch the terminal directly; they go through a
//! [`Prompter`]. Every prompt either returns an answer or [`Aborted`].
//! Input that fails a shape-local check is re-asked inside the prompter and
//! never reaches the caller.

use crate::descriptor::FieldDescriptor;
use crate::error::{Aborted, InputError};
use confwiz_schema::{FieldError, FieldPath, StructureDef};
use std::collections::VecDeque;

/// In-prompt check run on the resolved answer text
pub type InputCheck<'f> = &'f dyn Fn(&str) -> Result<(), InputError>;

/// Answer that cancels a scripted session
pub const ABORT_ANSWER: &str = "!abort";

/// Interactive prompt widgets plus display hooks
pub trait Prompter {
    /// Yes/no question
    ///
    /// # Errors
    /// [`Aborted`] if the operator cancels.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, Aborted>;

    /// Free text; empty input means `default`, and `check` runs on the
    /// resolved text until it passes
    ///
    /// # Errors
    /// [`Aborted`] if the operator cancels.
    fn text(&mut self, message: &str, default: &str, check: InputCheck<'_>) -> Result<String, Aborted>;

    /// Single choice, returning the chosen index
    ///
    /// # Errors
    /// [`Aborted`] if the operator cancels.
    fn select(&mut self, message: &str, choices: &[String], default: Option<usize>) -> Result<usize, Aborted>;

    /// Multiple choice, returning chosen indices in ascending order
    ///
    /// # Errors
    /// [`Aborted`] if the operator cancels.
    fn multi_select(&mut self, message: &str, choices: &[String], checked: &[bool]) -> Result<Vec<usize>, Aborted>;

    /// Called when acquisition enters a structure
    fn structure_header(&mut self, _structure: &StructureDef, _path: &FieldPath) {}

    /// Called before each top-level field of a structure
    fn field_header(&mut self, _field: &FieldDescriptor, _path: &FieldPath) {}

    /// Called with validation errors before asking to repair them
    fn show_errors(&mut self, _errors: &[FieldError]) {}
}

/// Accept text as-is
pub fn accept_any(_: &str) -> Result<(), InputError> {
    Ok(())
}

/// Interpret a yes/no answer
///
/// # Errors
/// Rejects anything but yes/no spellings.
pub fn parse_confirm(input: &str, default: bool) -> Result<bool, InputError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" | "true" => Ok(true),
        "n" | "no" | "false" => Ok(false),
        _ => Err(InputError::new("Please answer yes or no")),
    }
}

/// Interpret a single-choice answer given by label or 1-based number
///
/// # Errors
/// Rejects unknown labels, out-of-range numbers and empty input without
/// default.
pub fn parse_choice(input: &str, choices: &[String], default: Option<usize>) -> Result<usize, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return default
            .filter(|&i| i < choices.len())
            .ok_or_else(|| InputError::new("Please choose an option"));
    }
    find_choice(input, choices)
}

/// Interpret a multi-choice answer: comma-separated labels or numbers,
/// `-` for none, empty for the pre-checked items
///
/// # Errors
/// Rejects unknown entries.
pub fn parse_multi(input: &str, choices: &[String], checked: &[bool]) -> Result<Vec<usize>, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok((0..choices.len())
            .filter(|&i| checked.get(i).copied().unwrap_or(false))
            .collect());
    }
    if input == "-" {
        return Ok(Vec::new());
    }
    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index = find_choice(part, choices)?;
        if !picked.contains(&index) {
            picked.push(index);
        }
    }
    picked.sort_unstable();
    Ok(picked)
}

fn find_choice(input: &str, choices: &[String]) -> Result<usize, InputError> {
    if let Some(i) = choices.iter().position(|c| c == input) {
        return Ok(i);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => Ok(n - 1),
        _ => Err(InputError::new(format!(
            "Please choose one of: {}",
            choices.join(", ")
        ))),
    }
}

/// Prompter replaying a fixed list of textual answers
///
/// Confirm answers use yes/no, choices use labels or 1-based numbers and
/// multi-choices use comma-separated lists. An empty answer takes the
/// default. A rejected answer is recorded and the next one is tried.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    transcript: Vec<String>,
    rejections: Vec<(String, String)>,
}

impl ScriptedPrompter {
    /// Create from answers in prompt order
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// One answer per line
    #[must_use]
    pub fn from_script(script: &str) -> Self {
        Self::new(script.lines())
    }

    /// Prompt messages seen so far
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Rejected answers with their error messages
    #[inline]
    #[must_use]
    pub fn rejections(&self) -> &[(String, String)] {
        &self.rejections
    }

    /// Answers not yet consumed
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self) -> Result<String, Aborted> {
        match self.answers.pop_front() {
            Some(answer) if answer.trim() != ABORT_ANSWER => Ok(answer),
            _ => Err(Aborted),
        }
    }

    fn ask<T>(&mut self, message: &str, parse: impl Fn(&str) -> Result<T, InputError>) -> Result<T, Aborted> {
        self.transcript.push(message.to_string());
        loop {
            let answer = self.next_answer()?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::debug!(%message, %answer, error = %err, "scripted answer rejected");
                    self.rejections.push((answer, err.0));
                }
            }
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, Aborted> {
        self.ask(message, |a| parse_confirm(a, default))
    }

    fn text(&mut self, message: &str, default: &str, check: InputCheck<'_>) -> Result<String, Aborted> {
        self.ask(message, |a| {
            let resolved = if a.is_empty() { default } else { a };
            check(resolved).map(|()| resolved.to_string())
        })
    }

    fn select(&mut self, message: &str, choices: &[String], default: Option<usize>) -> Result<usize, Aborted> {
        self.ask(message, |a| parse_choice(a, choices, default))
    }

    fn multi_select(&mut self, message: &str, choices: &[String], checked: &[bool]) -> Result<Vec<usize>, Aborted> {
        self.ask(message, |a| parse_multi(a, choices, checked))
    }
}

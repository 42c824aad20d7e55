use std::fmt;

use colored::Colorize;
use dialoguer::{console::Term, theme::ColorfulTheme, Input, Select};
use error_stack::{IntoReport, Result, ResultExt};

#[derive(Debug)]
pub struct DialoguerError;

impl fmt::Display for DialoguerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dialoguer error")
    }
}

impl std::error::Error for DialoguerError {}

pub type DialoguerResult<T> = error_stack::Result<T, DialoguerError>;

#[derive(Debug, Clone)]
pub struct Dialoguer;

impl Dialoguer {
    pub fn select<T>(
        prompt_text: String,
        items: Vec<T>,
        default: Option<usize>,
    ) -> Result<usize, DialoguerError>
    where
        T: ToString + Clone,
    {
        let colorful_theme = &ColorfulTheme::default();
        let mut select = Select::with_theme(colorful_theme);
        let dialog = select
            .with_prompt(&prompt_text)
            .items(&items)
            .default(default.unwrap_or(0));

        Ok(dialog
            .interact_on_opt(&Term::stderr())
            .into_report()
            .change_context(DialoguerError)?
            .ok_or(DialoguerError)
            .into_report()
            .attach_printable("Selection aborted")?)
    }

    pub fn select_yes_or_no(prompt_text: String) -> Result<bool, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut select = Select::with_theme(colorful_theme);
        let dialog = select
            .with_prompt(&prompt_text)
            .item("yes")
            .item("no")
            .default(0);
        let opt = dialog
            .interact_on_opt(&Term::stderr())
            .into_report()
            .change_context(DialoguerError)?
            .ok_or(DialoguerError)
            .into_report()?;

        Ok(opt == 0)
    }

    /// Asks until `accept` returns true, printing `rejection` for every refused answer.
    pub fn input_until<F>(
        prompt_text: String,
        rejection: &str,
        accept: F,
    ) -> Result<String, DialoguerError>
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let answer = Self::input(prompt_text.clone())?;
            let answer = answer.trim().to_string();
            if accept(&answer) {
                return Ok(answer);
            }
            println!("{}", rejection.red());
        }
    }

    pub fn input(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::with_theme(colorful_theme);
        let dialog: String = input
            .with_prompt(&prompt_text)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }

    pub fn input_allow_empty(prompt_text: String) -> Result<String, DialoguerError> {
        let colorful_theme = &ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(colorful_theme);
        let dialog = input
            .with_prompt(&prompt_text)
            .allow_empty(true)
            .interact_text()
            .into_report()
            .change_context(DialoguerError)?;

        Ok(dialog)
    }
}
